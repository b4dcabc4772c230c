//! Static competency catalogs.
//!
//! Two independent tables: the profile catalog (workshop topic weights and CV synonyms)
//! and the job-requirements keyword map. Both are deployment data; editing them does
//! not touch scoring code.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::inference::normalizer::{normalize, token_text};

/// Workshop topic → (competency, weight).
const TOPIC_COMPETENCIES: &[(&str, &[(&str, f64)])] = &[
    ("excel", &[("Analítica de Datos", 1.0)]),
    ("python", &[("Programación", 1.0), ("Analítica de Datos", 0.8)]),
    ("sql", &[("Analítica de Datos", 1.0)]),
    ("power bi", &[("Analítica de Datos", 0.9)]),
    ("tableau", &[("Analítica de Datos", 0.9)]),
    ("programación", &[("Programación", 1.0)]),
    ("comunicación", &[("Comunicación", 1.0)]),
    ("oratoria", &[("Comunicación", 0.9)]),
    ("liderazgo", &[("Liderazgo", 1.0)]),
    ("gestión de equipos", &[("Liderazgo", 0.9), ("Comunicación", 0.4)]),
];

/// Competency → terms counted in free text.
const COMPETENCY_SYNONYMS: &[(&str, &[&str])] = &[
    (
        "Programación",
        &["programación", "python", "desarrollo", "algoritmos", "scripts"],
    ),
    (
        "Analítica de Datos",
        &[
            "excel",
            "sql",
            "reportes",
            "power bi",
            "tableau",
            "dashboards",
            "etl",
            "analítica",
        ],
    ),
    (
        "Comunicación",
        &["presentaciones", "comunicación", "oratoria", "storytelling", "escritura"],
    ),
    (
        "Liderazgo",
        &[
            "liderazgo",
            "gestión de equipos",
            "coaching",
            "mentoría",
            "resolución de conflictos",
        ],
    ),
];

/// Job-description phrase → competency (small-business oriented).
const JOB_KEYWORDS: &[(&str, &str)] = &[
    ("atención al cliente", "Atención al Cliente"),
    ("caja", "Atención al Cliente"),
    ("reclamos", "Atención al Cliente"),
    ("postventa", "Postventa"),
    ("ventas", "Ventas"),
    ("comercial", "Ventas"),
    ("prospección", "Ventas"),
    ("negociación", "Negociación"),
    ("cotizaciones", "Compras"),
    ("proveedores", "Compras"),
    ("orden de compra", "Compras"),
    ("inventario", "Logística"),
    ("almacén", "Logística"),
    ("despacho", "Logística"),
    ("ruteo", "Logística"),
    ("excel", "Ofimática"),
    ("tablas dinámicas", "Ofimática"),
    ("ofimática", "Ofimática"),
    ("power bi", "Analítica de Datos"),
    ("contabilidad", "Contabilidad"),
    ("conciliaciones", "Contabilidad"),
    ("facturación", "Contabilidad"),
    ("flujo de caja", "Finanzas"),
    ("presupuesto", "Finanzas"),
    ("rrhh", "RRHH"),
    ("reclutamiento", "RRHH"),
    ("inducción", "RRHH"),
    ("planilla de sueldos", "RRHH"),
    ("calidad", "Calidad"),
    ("no conformidades", "Calidad"),
    ("5s", "Calidad"),
    ("mantenimiento", "Mantenimiento"),
    ("correctivo", "Mantenimiento"),
    ("preventivo", "Mantenimiento"),
    ("producción", "Producción"),
    ("scrap", "Producción"),
    ("seguridad e higiene", "Seguridad e Higiene"),
    ("epi", "Seguridad e Higiene"),
    ("comercio exterior", "Comercio Exterior"),
    ("despachante", "Comercio Exterior"),
    ("diseño", "Diseño"),
    ("canva", "Diseño"),
    ("marketing", "Marketing"),
    ("redes sociales", "Marketing"),
    ("community", "Marketing"),
    ("soporte", "Soporte Técnico"),
    ("administración", "Administración"),
    ("documentación", "Administración"),
    ("proyectos", "Gestion de Proyectos"),
    ("cronograma", "Gestion de Proyectos"),
];

static BUILTIN_RULES: LazyLock<RuleCatalog> = LazyLock::new(|| {
    RuleCatalog::new(
        TOPIC_COMPETENCIES
            .iter()
            .map(|(topic, comps)| (*topic, comps.to_vec())),
        COMPETENCY_SYNONYMS
            .iter()
            .map(|(comp, terms)| (*comp, terms.to_vec())),
    )
});

static BUILTIN_KEYWORDS: LazyLock<KeywordCatalog> =
    LazyLock::new(|| KeywordCatalog::new(JOB_KEYWORDS.iter().copied()));

/// Catalog used by the rule-based profile scorer.
#[derive(Debug, Clone, Default)]
pub struct RuleCatalog {
    /// Keys are normalized topics.
    topics: HashMap<String, Vec<(String, f64)>>,
    /// Declaration order is kept so scoring is deterministic.
    synonyms: Vec<(String, Vec<String>)>,
}

impl RuleCatalog {
    pub fn new<'a, T, S>(topics: T, synonyms: S) -> Self
    where
        T: IntoIterator<Item = (&'a str, Vec<(&'a str, f64)>)>,
        S: IntoIterator<Item = (&'a str, Vec<&'a str>)>,
    {
        let topics = topics
            .into_iter()
            .map(|(topic, comps)| {
                let comps = comps
                    .into_iter()
                    .map(|(name, weight)| (name.to_string(), weight))
                    .collect();
                (normalize(topic), comps)
            })
            .collect();
        let synonyms = synonyms
            .into_iter()
            .map(|(name, terms)| {
                let terms = terms
                    .into_iter()
                    .map(normalize)
                    .filter(|t| !t.is_empty())
                    .collect();
                (name.to_string(), terms)
            })
            .collect();
        Self { topics, synonyms }
    }

    pub fn builtin() -> &'static RuleCatalog {
        &BUILTIN_RULES
    }

    /// Looks up an already-normalized topic.
    pub fn competencies_for_topic(&self, topic: &str) -> Option<&[(String, f64)]> {
        self.topics.get(topic).map(Vec::as_slice)
    }

    pub fn synonyms(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.synonyms
            .iter()
            .map(|(name, terms)| (name.as_str(), terms.as_slice()))
    }
}

/// Phrase → competency map used by the job-requirements keyword scorer.
#[derive(Debug, Clone, Default)]
pub struct KeywordCatalog {
    phrases: Vec<(String, String)>,
}

impl KeywordCatalog {
    /// Phrases go through the same token mapping as the text they are matched against.
    pub fn new<'a>(phrases: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            phrases: phrases
                .into_iter()
                .map(|(phrase, comp)| (token_text(phrase), comp.to_string()))
                .filter(|(phrase, _)| !phrase.is_empty())
                .collect(),
        }
    }

    pub fn builtin() -> &'static KeywordCatalog {
        &BUILTIN_KEYWORDS
    }

    pub fn phrases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.phrases
            .iter()
            .map(|(phrase, comp)| (phrase.as_str(), comp.as_str()))
    }
}
