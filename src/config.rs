//! Pipeline configuration: compiled-in defaults, optionally overridden by a TOML file.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::bucket::SimilarityThresholds;
use crate::calendar::Granularity;
use crate::collection::{CollectionRange, UnmatchedPolicy};
use crate::display::LevelColors;
use crate::error::PipelineError;
use crate::promote::ListCaps;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub thresholds: SimilarityThresholds,
    pub level_colors: LevelColors,
    pub concepts_per_bucket: usize,
    pub examples_per_bucket: usize,
    pub max_distance: MaxDistance,
    /// Bubble views to emit.
    pub granularities: Vec<Granularity>,
    /// Dream set name -> calendar year of its `MM-DD` dates.
    pub dream_set_years: BTreeMap<String, i32>,
    pub collections: Vec<CollectionRange>,
    pub unmatched: UnmatchedPolicies,
    /// Use a record's `reference2020` date as its news date when present.
    pub use_reference_2020: bool,
}

/// Largest `|dreamIndex - newsIndex|` kept per granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaxDistance {
    pub day: i64,
    pub week: i64,
    pub month: i64,
    pub year: i64,
}

impl Default for MaxDistance {
    fn default() -> Self {
        Self {
            day: 14,
            week: 6,
            month: 6,
            year: 1,
        }
    }
}

impl MaxDistance {
    pub fn get(&self, granularity: Granularity) -> i64 {
        match granularity {
            Granularity::Day => self.day,
            Granularity::Week => self.week,
            Granularity::Month => self.month,
            Granularity::Year => self.year,
        }
    }
}

/// Per-view policy for records outside every collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnmatchedPolicies {
    pub difference: UnmatchedPolicy,
    pub comparison: UnmatchedPolicy,
}

impl Default for UnmatchedPolicies {
    fn default() -> Self {
        Self {
            difference: UnmatchedPolicy::Skip,
            comparison: UnmatchedPolicy::Fail,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();
        Self {
            thresholds: SimilarityThresholds::default(),
            level_colors: LevelColors::default(),
            concepts_per_bucket: 10,
            examples_per_bucket: 5,
            max_distance: MaxDistance::default(),
            granularities: vec![Granularity::Day, Granularity::Week, Granularity::Month],
            dream_set_years: BTreeMap::from([
                ("dreams2020".to_string(), 2020),
                ("control".to_string(), 2019),
            ]),
            collections: vec![
                CollectionRange {
                    key: "dreams2020".into(),
                    label: "2020 Dreams".into(),
                    color: "#e45756".into(),
                    from: date(2020, 1, 1),
                    to: date(2020, 12, 31),
                },
                CollectionRange {
                    key: "control".into(),
                    label: "Pre-2020 Control".into(),
                    color: "#4c78a8".into(),
                    from: date(2000, 1, 1),
                    to: date(2019, 12, 31),
                },
            ],
            unmatched: UnmatchedPolicies::default(),
            use_reference_2020: false,
        }
    }
}

impl PipelineConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| PipelineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        let t = &self.thresholds;
        if !t.medium.is_finite() || !t.high.is_finite() {
            return Err(PipelineError::Config("similarity cutoffs must be finite".into()));
        }
        if t.medium >= t.high {
            return Err(PipelineError::Config(format!(
                "medium cutoff {} must be below high cutoff {}",
                t.medium, t.high
            )));
        }
        let d = &self.max_distance;
        if let Some((name, v)) = [("day", d.day), ("week", d.week), ("month", d.month), ("year", d.year)]
            .into_iter()
            .find(|&(_, v)| v < 0)
        {
            return Err(PipelineError::Config(format!(
                "max_distance.{name} must not be negative, got {v}"
            )));
        }
        if self.collections.is_empty() {
            return Err(PipelineError::Config("at least one collection is required".into()));
        }
        if let Some(c) = self.collections.iter().find(|c| c.from > c.to) {
            return Err(PipelineError::Config(format!(
                "collection {:?} ends ({}) before it starts ({})",
                c.key, c.to, c.from
            )));
        }
        Ok(())
    }

    pub fn caps(&self) -> ListCaps {
        ListCaps {
            concepts: self.concepts_per_bucket,
            examples: self.examples_per_bucket,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PipelineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.max_distance.get(Granularity::Month), 6);
        assert_eq!(config.unmatched.comparison, UnmatchedPolicy::Fail);
        assert_eq!(config.dream_set_years["control"], 2019);
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config = PipelineConfig::from_toml(
            r#"
            examples_per_bucket = 3
            granularities = ["week", "year"]

            [thresholds]
            medium = 0.1
            high = 0.25

            [max_distance]
            week = 3

            [unmatched]
            comparison = "skip"
            "#,
        )
        .unwrap();
        assert_eq!(config.examples_per_bucket, 3);
        assert_eq!(config.concepts_per_bucket, 10);
        assert_eq!(config.granularities, vec![Granularity::Week, Granularity::Year]);
        assert_eq!(config.thresholds.high, 0.25);
        assert_eq!(config.max_distance.week, 3);
        assert_eq!(config.max_distance.month, 6);
        assert_eq!(config.unmatched.comparison, UnmatchedPolicy::Skip);
        assert_eq!(config.unmatched.difference, UnmatchedPolicy::Skip);
    }

    #[test]
    fn collections_and_year_table_from_toml() {
        let config = PipelineConfig::from_toml(
            r##"
            [dream_set_years]
            covid = 2020

            [[collections]]
            key = "covid"
            label = "COVID Dreams"
            color = "#ff0000"
            from = "2020-03-01"
            to = "2020-06-30"
            "##,
        )
        .unwrap();
        assert_eq!(config.dream_set_years.len(), 1);
        assert_eq!(config.collections.len(), 1);
        assert_eq!(
            config.collections[0].from,
            NaiveDate::from_ymd_opt(2020, 3, 1).unwrap()
        );
    }

    #[test]
    fn inverted_cutoffs_are_rejected() {
        let err = PipelineConfig::from_toml("[thresholds]\nmedium = 0.5\nhigh = 0.5\n").unwrap_err();
        assert!(err.to_string().contains("medium cutoff"));
    }

    #[test]
    fn negative_max_distance_is_rejected() {
        let err = PipelineConfig::from_toml("[max_distance]\nweek = -1\n").unwrap_err();
        assert!(err.to_string().contains("max_distance.week"));

        let mut config = PipelineConfig::default();
        config.max_distance.year = 0;
        config.validate().unwrap();
    }

    #[test]
    fn backwards_collection_is_rejected() {
        let mut config = PipelineConfig::default();
        config.collections[0].to = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn empty_collections_are_rejected() {
        let mut config = PipelineConfig::default();
        config.collections.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = PipelineConfig::from_toml("granularities = [\"fortnight\"]").unwrap_err();
        assert!(err.downcast_ref::<PipelineError>().is_some());
    }
}
