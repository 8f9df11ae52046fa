// src/display.rs
//! 1-D "difference" views: buckets keyed by how far a dream sits from the news.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::bucket::{BucketAggregate, SimilarityLevel, SimilarityThresholds};
use crate::collection::BucketGroup;
use crate::consolidate::{consolidate_concepts, consolidate_examples};
use crate::models::{ConceptScore, Example};
use crate::promote::{widen, Extent, ListCaps};

/// Unit a difference view is bucketed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DifferenceUnit {
    Days,
    Weeks,
}

impl DifferenceUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            DifferenceUnit::Days => "days",
            DifferenceUnit::Weeks => "weeks",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelColors {
    pub low: String,
    pub medium: String,
    pub high: String,
}

impl Default for LevelColors {
    fn default() -> Self {
        Self {
            low: "#c6dbef".into(),
            medium: "#6baed6".into(),
            high: "#08519c".into(),
        }
    }
}

impl LevelColors {
    fn get(&self, level: SimilarityLevel) -> &str {
        match level {
            SimilarityLevel::Low => &self.low,
            SimilarityLevel::Medium => &self.medium,
            SimilarityLevel::High => &self.high,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelDisplay {
    pub percent: f64,
    pub count: u64,
    pub threshold: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelBreakdown {
    pub low: LevelDisplay,
    pub medium: LevelDisplay,
    pub high: LevelDisplay,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DifferenceDisplayRecordWithExamples {
    pub difference: i64,
    pub record_count: u64,
    pub average_similarity: f64,
    pub average_word_count: f64,
    pub top_concepts: Vec<ConceptScore>,
    pub examples: Vec<Example>,
    pub levels: LevelBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DifferenceCollection {
    pub unit: DifferenceUnit,
    pub max_similarity: Option<f64>,
    pub min_similarity: Option<f64>,
    pub groups: Vec<BucketGroup<Vec<DifferenceDisplayRecordWithExamples>>>,
}

/// Turns one finalized bucket into its display record.
pub fn display_record(
    difference: i64,
    bucket: &BucketAggregate,
    thresholds: &SimilarityThresholds,
    colors: &LevelColors,
    caps: ListCaps,
) -> DifferenceDisplayRecordWithExamples {
    let level = |l: SimilarityLevel| LevelDisplay {
        percent: bucket.level_percent(l),
        count: bucket.levels.get(l),
        threshold: thresholds.lower_bound(l),
        color: colors.get(l).to_string(),
    };

    DifferenceDisplayRecordWithExamples {
        difference,
        record_count: bucket.record_count,
        average_similarity: bucket.average_similarity(),
        average_word_count: bucket.average_word_count(),
        top_concepts: consolidate_concepts(bucket.concepts.as_slice(), caps.concepts),
        examples: consolidate_examples(&bucket.examples, caps.examples),
        levels: LevelBreakdown {
            low: level(SimilarityLevel::Low),
            medium: level(SimilarityLevel::Medium),
            high: level(SimilarityLevel::High),
        },
    }
}

/// Finalize every group's difference buckets, ordered by difference, and
/// compute the view-wide average-similarity range.
pub fn build_difference_collection(
    unit: DifferenceUnit,
    groups: Vec<BucketGroup<BTreeMap<i64, BucketAggregate>>>,
    thresholds: &SimilarityThresholds,
    colors: &LevelColors,
    caps: ListCaps,
) -> DifferenceCollection {
    let mut range: Option<Extent<f64>> = None;
    let groups = groups
        .into_iter()
        .map(|group| {
            let records: Vec<_> = group
                .buckets
                .iter()
                .map(|(&diff, bucket)| display_record(diff, bucket, thresholds, colors, caps))
                .collect();
            range = records
                .iter()
                .map(|r| r.average_similarity)
                .fold(range, widen);
            BucketGroup {
                key: group.key,
                label: group.label,
                color: group.color,
                buckets: records,
            }
        })
        .collect();

    DifferenceCollection {
        unit,
        max_similarity: range.map(|e| e.max),
        min_similarity: range.map(|e| e.min),
        groups,
    }
}
