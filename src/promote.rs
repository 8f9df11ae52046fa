// src/promote.rs
//! Re-bucketing day-level dream/news comparisons into coarser granularities.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::calendar::{period_bounds, Granularity, Period};
use crate::collection::BucketGroup;
use crate::consolidate::{consolidate_concepts, consolidate_examples};
use crate::models::{ConceptScore, Example};

/// One (dream day, news day) cell after day-level accumulation.
#[derive(Debug, Clone, PartialEq)]
pub struct DayComparison {
    pub dream_date: NaiveDate,
    pub news_date: NaiveDate,
    pub score: f64, // average similarity of the day cell
    pub word_count: u64,
    pub record_count: u64,
    pub concepts: Vec<ConceptScore>,
    pub examples: Vec<Example>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PromotionKey {
    pub granularity: Granularity,
    pub dream_index: i32,
    pub news_index: i32,
}

impl PromotionKey {
    pub fn distance(&self) -> i64 {
        (i64::from(self.dream_index) - i64::from(self.news_index)).abs()
    }
}

/// How many concepts and examples survive consolidation per bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListCaps {
    pub concepts: usize,
    pub examples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotedBucket {
    pub dream_index: i32,
    pub news_index: i32,
    pub dream_period: Option<Period>,
    pub news_period: Option<Period>,
    /// Sum of the merged day scores, not an average.
    pub score: f64,
    pub word_count: u64,
    pub record_count: u64,
    pub comparison_count: u64,
    pub average_similarity: f64,
    pub top_concepts: Vec<ConceptScore>,
    pub examples: Vec<Example>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GranularityComparisonCollection {
    pub granularity: Granularity,
    pub max_similarity: Option<f64>,
    pub min_similarity: Option<f64>,
    pub max_word_count: Option<u64>,
    pub min_word_count: Option<u64>,
    pub groups: Vec<BucketGroup<Vec<PromotedBucket>>>,
}

/// Inclusive min/max of the values seen so far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> Extent<T> {
    pub fn of(value: T) -> Self {
        Self { min: value, max: value }
    }

    pub fn include(self, value: T) -> Self {
        Self {
            min: if value < self.min { value } else { self.min },
            max: if value > self.max { value } else { self.max },
        }
    }
}

/// Threads an optional extent through a fold.
pub fn widen<T: PartialOrd + Copy>(extent: Option<Extent<T>>, value: T) -> Option<Extent<T>> {
    Some(match extent {
        Some(e) => e.include(value),
        None => Extent::of(value),
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct CollectionStats {
    score: Option<Extent<f64>>,
    word_count: Option<Extent<u64>>,
}

impl CollectionStats {
    fn observe(self, bucket: &MergedBucket) -> Self {
        Self {
            score: widen(self.score, bucket.score),
            word_count: widen(self.word_count, bucket.word_count),
        }
    }
}

#[derive(Debug, Clone)]
struct MergedBucket {
    dream_year: i32,
    news_year: i32,
    score: f64,
    word_count: u64,
    record_count: u64,
    comparison_count: u64,
    concepts: Vec<ConceptScore>,
    examples: Vec<Example>,
}

impl MergedBucket {
    fn start(day: &DayComparison) -> Self {
        Self {
            dream_year: day.dream_date.year(),
            news_year: day.news_date.year(),
            score: 0.0,
            word_count: 0,
            record_count: 0,
            comparison_count: 0,
            concepts: Vec::new(),
            examples: Vec::new(),
        }
    }

    fn absorb(&mut self, day: &DayComparison) {
        self.score += day.score;
        self.word_count += day.word_count;
        self.record_count += day.record_count;
        self.comparison_count += 1;
        self.concepts.extend(day.concepts.iter().cloned());
        self.examples.extend(day.examples.iter().cloned());
    }

    fn finish(self, key: PromotionKey, caps: ListCaps) -> PromotedBucket {
        // Year buckets carry the year in the index itself.
        PromotedBucket {
            dream_index: key.dream_index,
            news_index: key.news_index,
            dream_period: period_bounds(key.granularity, key.dream_index, self.dream_year),
            news_period: period_bounds(key.granularity, key.news_index, self.news_year),
            score: self.score,
            word_count: self.word_count,
            record_count: self.record_count,
            comparison_count: self.comparison_count,
            average_similarity: self.score / self.comparison_count as f64,
            top_concepts: consolidate_concepts(&self.concepts, caps.concepts),
            examples: consolidate_examples(&self.examples, caps.examples),
        }
    }
}

/// Re-key every group's day comparisons by `(granularity, index_fn(dream), index_fn(news))`,
/// merge colliding keys, drop keys further apart than `max_distance`, and consolidate lists.
///
/// Global min/max cover only buckets that survive the distance filter.
pub fn promote<F>(
    granularity: Granularity,
    index_fn: F,
    groups: &[BucketGroup<Vec<DayComparison>>],
    max_distance: i64,
    caps: ListCaps,
) -> GranularityComparisonCollection
where
    F: Fn(NaiveDate) -> i32,
{
    let mut stats = CollectionStats::default();
    let mut discarded = 0usize;
    let mut out_groups = Vec::with_capacity(groups.len());

    for group in groups {
        let mut merged: BTreeMap<PromotionKey, MergedBucket> = BTreeMap::new();
        for day in &group.buckets {
            let key = PromotionKey {
                granularity,
                dream_index: index_fn(day.dream_date),
                news_index: index_fn(day.news_date),
            };
            merged
                .entry(key)
                .or_insert_with(|| MergedBucket::start(day))
                .absorb(day);
        }

        let before = merged.len();
        merged.retain(|key, _| key.distance() <= max_distance);
        discarded += before - merged.len();

        stats = merged.values().fold(stats, CollectionStats::observe);

        let buckets = merged
            .into_iter()
            .map(|(key, bucket)| bucket.finish(key, caps))
            .collect();
        out_groups.push(BucketGroup {
            key: group.key.clone(),
            label: group.label.clone(),
            color: group.color.clone(),
            buckets,
        });
    }

    debug!(
        "Promotion - granularity={}, groups={}, discarded_by_distance={}, max_distance={}",
        granularity.as_str(),
        out_groups.len(),
        discarded,
        max_distance
    );

    GranularityComparisonCollection {
        granularity,
        max_similarity: stats.score.map(|e| e.max),
        min_similarity: stats.score.map(|e| e.min),
        max_word_count: stats.word_count.map(|e| e.max),
        min_word_count: stats.word_count.map(|e| e.min),
        groups: out_groups,
    }
}
