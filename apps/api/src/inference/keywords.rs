use std::collections::HashMap;

use crate::inference::catalog::KeywordCatalog;
use crate::inference::normalizer::padded_tokens;
use crate::models::competency::{sort_by_level_desc, CompetencyScore, Source};

const KEYWORD_CONFIDENCE: f64 = 0.6;
const BASE_LEVEL: f64 = 0.35;
const LEVEL_PER_HIT: f64 = 0.2;
const MAX_LEVEL: f64 = 0.75;

/// Keyword fallback for job descriptions.
///
/// A phrase hits when it appears as whole tokens; each distinct phrase counts once.
/// Level is `min(0.75, 0.35 + 0.2 × hits) × 100`. `top_k == 0` means no truncation.
pub fn predict_keywords(text: &str, top_k: usize, catalog: &KeywordCatalog) -> Vec<CompetencyScore> {
    let haystack = padded_tokens(text);
    if haystack.trim().is_empty() {
        return Vec::new();
    }

    // Competencies in first-hit order, so equal levels come out in catalog order.
    let mut order: Vec<&str> = Vec::new();
    let mut hits: HashMap<&str, u32> = HashMap::new();
    for (phrase, competency) in catalog.phrases() {
        if !haystack.contains(&format!(" {phrase} ")) {
            continue;
        }
        let count = hits.entry(competency).or_insert(0);
        if *count == 0 {
            order.push(competency);
        }
        *count += 1;
    }

    let mut results: Vec<CompetencyScore> = order
        .into_iter()
        .map(|competency| {
            let hit_count = f64::from(hits[competency]);
            let level = (BASE_LEVEL + LEVEL_PER_HIT * hit_count).min(MAX_LEVEL) * 100.0;
            CompetencyScore::new(competency, level, KEYWORD_CONFIDENCE, &[Source::Keywords])
        })
        .collect();

    sort_by_level_desc(&mut results);
    if top_k > 0 {
        results.truncate(top_k);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sales_catalog() -> KeywordCatalog {
        KeywordCatalog::new([
            ("ventas", "Ventas"),
            ("atención al cliente", "Atención al Cliente"),
        ])
    }

    #[test]
    fn test_single_hits_score_55() {
        let text = "Busco a alguien que diga: tengo experiencia en ventas y atención al cliente...";
        let results = predict_keywords(text, 0, &sales_catalog());
        assert_eq!(results.len(), 2);
        for r in &results {
            assert_eq!(r.level, 55.0);
            assert_eq!(r.confidence, 0.6);
            assert!(r.sources.contains(&Source::Keywords));
        }
    }

    #[test]
    fn test_partial_words_do_not_match() {
        let catalog = KeywordCatalog::new([("caja", "Atención al Cliente"), ("epi", "Seguridad e Higiene")]);
        let results = predict_keywords("manejo de cajas y recepción episódica", 0, &catalog);
        assert!(results.is_empty());
    }

    #[test]
    fn test_punctuated_phrase_matches() {
        let catalog = KeywordCatalog::new([("e-commerce", "Ventas Online")]);
        let results = predict_keywords("Experiencia en E-Commerce y marketing digital", 0, &catalog);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Ventas Online");

        assert!(predict_keywords("commerce a secas", 0, &catalog).is_empty());
    }

    #[test]
    fn test_level_capped_at_75() {
        let text = "comercial de ventas con prospección y más ventas";
        let results = predict_keywords(text, 0, KeywordCatalog::builtin());
        let ventas = results.iter().find(|r| r.name == "Ventas").unwrap();
        // three distinct phrases: 0.35 + 0.6 capped to 0.75
        assert_eq!(ventas.level, 75.0);
    }

    #[test]
    fn test_two_hits_score_75_and_sorted_first() {
        let text = "control de inventario en almacén y excel";
        let results = predict_keywords(text, 0, KeywordCatalog::builtin());
        assert_eq!(results[0].name, "Logística");
        assert_eq!(results[0].level, 75.0);
        assert_eq!(results[1].name, "Ofimática");
        assert_eq!(results[1].level, 55.0);
    }

    #[test]
    fn test_top_k_truncates() {
        let text = "ventas, inventario, contabilidad, marketing";
        assert_eq!(predict_keywords(text, 2, KeywordCatalog::builtin()).len(), 2);
        assert_eq!(predict_keywords(text, 0, KeywordCatalog::builtin()).len(), 4);
    }

    #[test]
    fn test_empty_text() {
        assert!(predict_keywords("", 6, KeywordCatalog::builtin()).is_empty());
        assert!(predict_keywords("   ", 6, KeywordCatalog::builtin()).is_empty());
    }
}
