use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Number of statistic categories shown on the chart.
pub const CATEGORY_COUNT: usize = 5;

/// Statistic categories, in chart order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    AisLight,
    AisDark,
    ShipToShip,
    Spoofing,
    Detections,
}

impl Category {
    pub const ALL: [Category; CATEGORY_COUNT] = [
        Category::AisLight,
        Category::AisDark,
        Category::ShipToShip,
        Category::Spoofing,
        Category::Detections,
    ];

    /// Short name used in bar labels.
    pub fn label(self) -> &'static str {
        match self {
            Category::AisLight => "Light",
            Category::AisDark => "Dark",
            Category::ShipToShip => "STS",
            Category::Spoofing => "Spoofing",
            Category::Detections => "Detections",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Five-category numeric vector, indexed by [`Category::index`].
pub type CategoryVector = [f64; CATEGORY_COUNT];

/// Counts for one region, as authored in the statistics file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RegionStats {
    pub location: String,
    #[serde(default)]
    pub light: f64,
    #[serde(default)]
    pub dark: f64,
    #[serde(default)]
    pub sts: f64,
    #[serde(default)]
    pub spoofing: f64,
    #[serde(default)]
    pub detections: f64,
}

impl RegionStats {
    pub fn values(&self) -> CategoryVector {
        [
            self.light,
            self.dark,
            self.sts,
            self.spoofing,
            self.detections,
        ]
    }
}

/// Static per-chapter statistics, keyed by chapter id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct StatsTable {
    regions: BTreeMap<String, RegionStats>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatsError {
    Parse(String),
    NegativeValue { chapter: String },
}

impl std::fmt::Display for StatsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsError::Parse(e) => write!(f, "statistics JSON parse error: {e}"),
            StatsError::NegativeValue { chapter } => {
                write!(f, "negative or non-finite count for {chapter}")
            }
        }
    }
}

impl std::error::Error for StatsError {}

impl StatsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(payload: &str) -> Result<Self, StatsError> {
        let table: StatsTable =
            serde_json::from_str(payload).map_err(|e| StatsError::Parse(e.to_string()))?;
        for (chapter, stats) in &table.regions {
            if stats.values().iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(StatsError::NegativeValue {
                    chapter: chapter.clone(),
                });
            }
        }
        Ok(table)
    }

    pub fn insert(&mut self, chapter: impl Into<String>, stats: RegionStats) {
        self.regions.insert(chapter.into(), stats);
    }

    pub fn get(&self, chapter: &str) -> Option<&RegionStats> {
        self.regions.get(chapter)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Category, StatsError, StatsTable};

    #[test]
    fn parses_table_and_orders_vector() {
        let payload = r#"{
            "chapter1": { "location": "Strait of Hormuz", "light": 100, "detections": 200 },
            "chapter2": { "location": "Gulf of Oman", "dark": 12, "sts": 3, "spoofing": 1 }
        }"#;
        let table = StatsTable::from_json_str(payload).expect("parse");
        assert_eq!(table.len(), 2);
        let c1 = table.get("chapter1").expect("chapter1");
        assert_eq!(c1.location, "Strait of Hormuz");
        assert_eq!(c1.values(), [100.0, 0.0, 0.0, 0.0, 200.0]);
        assert_eq!(table.get("chapter2").map(|s| s.values()[Category::ShipToShip.index()]), Some(3.0));
        assert!(table.get("intro").is_none());
    }

    #[test]
    fn rejects_negative_counts() {
        let payload = r#"{ "c": { "location": "x", "light": -1 } }"#;
        assert_eq!(
            StatsTable::from_json_str(payload),
            Err(StatsError::NegativeValue { chapter: "c".to_string() })
        );
    }

    #[test]
    fn category_labels_follow_chart_order() {
        let labels: Vec<_> = Category::ALL.iter().map(|c| c.label()).collect();
        assert_eq!(labels, vec!["Light", "Dark", "STS", "Spoofing", "Detections"]);
    }
}
