use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Where a competency score came from. Serialized with the names downstream
/// consumers already expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Ml,
    /// Accepted on the wire; the rule scorer reports its inputs (`talleres`, `cv`) instead.
    #[allow(dead_code)]
    Rules,
    #[serde(rename = "talleres")]
    Workshops,
    Cv,
    Keywords,
}

/// A single competency prediction.
///
/// `level` is always within 0 – 100 and `confidence` within 0 – 1; `sources` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetencyScore {
    pub name: String,
    pub level: f64,
    pub confidence: f64,
    pub sources: BTreeSet<Source>,
}

impl CompetencyScore {
    pub fn new(name: impl Into<String>, level: f64, confidence: f64, sources: &[Source]) -> Self {
        Self {
            name: name.into(),
            level: round1(level.clamp(0.0, 100.0)),
            confidence: confidence.clamp(0.0, 1.0),
            sources: sources.iter().copied().collect(),
        }
    }
}

/// Training attendance record. Both field spellings are accepted on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkshopRecord {
    #[serde(default, alias = "tema")]
    pub topic: String,
    #[serde(default, alias = "asistencia_pct")]
    pub attendance_fraction: f64,
}

impl WorkshopRecord {
    pub fn new(topic: impl Into<String>, attendance_fraction: f64) -> Self {
        Self {
            topic: topic.into(),
            attendance_fraction,
        }
    }
}

/// Rounds to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Sorts by level, highest first. Stable, so equal levels keep their input order.
pub fn sort_by_level_desc(scores: &mut [CompetencyScore]) {
    scores.sort_by(|a, b| b.level.total_cmp(&a.level));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clamps_level_and_confidence() {
        let score = CompetencyScore::new("Ventas", 140.0, 1.4, &[Source::Ml]);
        assert_eq!(score.level, 100.0);
        assert_eq!(score.confidence, 1.0);

        let score = CompetencyScore::new("Ventas", -3.0, -0.2, &[Source::Ml]);
        assert_eq!(score.level, 0.0);
        assert_eq!(score.confidence, 0.0);
    }

    #[test]
    fn test_source_wire_names() {
        let json = serde_json::to_string(&[Source::Workshops, Source::Cv, Source::Ml]).unwrap();
        assert_eq!(json, r#"["talleres","cv","ml"]"#);
    }

    #[test]
    fn test_rules_source_round_trips_from_wire() {
        let sources: BTreeSet<Source> = serde_json::from_str(r#"["rules","keywords"]"#).unwrap();
        assert_eq!(sources, BTreeSet::from([Source::Rules, Source::Keywords]));
    }

    #[test]
    fn test_workshop_record_accepts_spanish_field_names() {
        let rec: WorkshopRecord =
            serde_json::from_str(r#"{"tema": "Excel", "asistencia_pct": 0.8}"#).unwrap();
        assert_eq!(rec, WorkshopRecord::new("Excel", 0.8));
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let mut scores = vec![
            CompetencyScore::new("B", 50.0, 0.6, &[Source::Keywords]),
            CompetencyScore::new("A", 70.0, 0.6, &[Source::Keywords]),
            CompetencyScore::new("C", 50.0, 0.6, &[Source::Keywords]),
        ];
        sort_by_level_desc(&mut scores);
        let names: Vec<_> = scores.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }
}
