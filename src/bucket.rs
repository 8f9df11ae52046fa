// src/bucket.rs
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use crate::models::{ConceptScore, Example, RawComparisonRecord};

/// Cutoffs splitting a similarity score into low / medium / high.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityThresholds {
    pub medium: f64,
    pub high: f64,
}

impl Default for SimilarityThresholds {
    fn default() -> Self {
        Self {
            medium: 0.2,
            high: 0.4,
        }
    }
}

impl SimilarityThresholds {
    /// Half-open bands: `[.., medium)`, `[medium, high)`, `[high, ..]`.
    pub fn classify(&self, score: f64) -> SimilarityLevel {
        if score >= self.high {
            SimilarityLevel::High
        } else if score >= self.medium {
            SimilarityLevel::Medium
        } else {
            SimilarityLevel::Low
        }
    }

    /// Lower bound of a level's band.
    pub fn lower_bound(&self, level: SimilarityLevel) -> f64 {
        match level {
            SimilarityLevel::Low => 0.0,
            SimilarityLevel::Medium => self.medium,
            SimilarityLevel::High => self.high,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimilarityLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelCounts {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
}

impl LevelCounts {
    pub fn get(&self, level: SimilarityLevel) -> u64 {
        match level {
            SimilarityLevel::Low => self.low,
            SimilarityLevel::Medium => self.medium,
            SimilarityLevel::High => self.high,
        }
    }

    fn bump(&mut self, level: SimilarityLevel) {
        match level {
            SimilarityLevel::Low => self.low += 1,
            SimilarityLevel::Medium => self.medium += 1,
            SimilarityLevel::High => self.high += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.low + self.medium + self.high
    }
}

/// Concept name -> accumulated score, remembering first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConceptTally {
    entries: Vec<ConceptScore>,
    slots: HashMap<String, usize>,
}

impl ConceptTally {
    pub fn add(&mut self, name: &str, score: f64) {
        match self.slots.get(name) {
            Some(&i) => self.entries[i].score += score,
            None => {
                self.slots.insert(name.to_string(), self.entries.len());
                self.entries.push(ConceptScore::new(name, score));
            }
        }
    }

    pub fn as_slice(&self) -> &[ConceptScore] {
        &self.entries
    }
}

/// Running totals for every record that mapped to one bucket key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BucketAggregate {
    pub record_count: u64,
    pub total_similarity: f64,
    pub total_word_count: u64,
    pub levels: LevelCounts,
    pub concepts: ConceptTally,
    pub examples: Vec<Example>,
}

impl BucketAggregate {
    pub fn merge_record(&mut self, record: &RawComparisonRecord, thresholds: &SimilarityThresholds) {
        self.record_count += 1;
        self.total_similarity += record.similarity_score;
        self.total_word_count += record.word_count;
        self.levels.bump(thresholds.classify(record.similarity_score));

        for concept in record.top_concepts.iter().flatten() {
            self.concepts.add(&concept.concept_name, concept.score);
        }
        self.examples.extend(record.examples.iter().cloned());
        debug_assert_eq!(self.levels.total(), self.record_count);
    }

    /// Buckets only exist once a record has landed, so `record_count > 0`.
    pub fn average_similarity(&self) -> f64 {
        self.total_similarity / self.record_count as f64
    }

    pub fn average_word_count(&self) -> f64 {
        self.total_word_count as f64 / self.record_count as f64
    }

    pub fn level_percent(&self, level: SimilarityLevel) -> f64 {
        100.0 * self.levels.get(level) as f64 / self.record_count as f64
    }
}

/// Folds records into per-key aggregates, remembering the order keys first arrived.
#[derive(Debug, Clone)]
pub struct Accumulator<K> {
    thresholds: SimilarityThresholds,
    buckets: Vec<(K, BucketAggregate)>,
    slots: HashMap<K, usize>,
}

impl<K: Hash + Eq + Clone> Accumulator<K> {
    pub fn new(thresholds: SimilarityThresholds) -> Self {
        Self {
            thresholds,
            buckets: Vec::new(),
            slots: HashMap::new(),
        }
    }

    pub fn add(&mut self, key: K, record: &RawComparisonRecord) {
        let i = match self.slots.get(&key) {
            Some(&i) => i,
            None => {
                self.slots.insert(key.clone(), self.buckets.len());
                self.buckets.push((key, BucketAggregate::default()));
                self.buckets.len() - 1
            }
        };
        self.buckets[i].1.merge_record(record, &self.thresholds);
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Buckets in first-seen key order.
    pub fn into_buckets(self) -> Vec<(K, BucketAggregate)> {
        self.buckets
    }

    /// Buckets keyed and iterated in sorted key order.
    pub fn into_sorted(self) -> BTreeMap<K, BucketAggregate>
    where
        K: Ord,
    {
        self.buckets.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn record(score: f64, words: u64, concepts: &[(&str, f64)]) -> RawComparisonRecord {
        let date = NaiveDate::from_ymd_opt(2020, 4, 1).unwrap();
        RawComparisonRecord {
            source: "test.json".into(),
            dream_set: "dreams2020".into(),
            dream_date: date,
            news_date: date,
            similarity_score: score,
            word_count: words,
            top_concepts: concepts
                .iter()
                .map(|(n, s)| Some(ConceptScore::new(*n, *s)))
                .collect(),
            examples: vec![Example {
                dream_text: format!("dream {score}"),
                news_text: "news".into(),
                score,
                concepts: vec![],
            }],
        }
    }

    #[test]
    fn classification_bands_are_half_open() {
        let t = SimilarityThresholds { medium: 0.2, high: 0.4 };
        assert_eq!(t.classify(0.0), SimilarityLevel::Low);
        assert_eq!(t.classify(0.1999), SimilarityLevel::Low);
        assert_eq!(t.classify(0.2), SimilarityLevel::Medium);
        assert_eq!(t.classify(0.3999), SimilarityLevel::Medium);
        assert_eq!(t.classify(0.4), SimilarityLevel::High);
        assert_eq!(t.classify(1.0), SimilarityLevel::High);
    }

    #[test]
    fn merge_order_does_not_change_totals() {
        let t = SimilarityThresholds::default();
        let a = record(0.13, 120, &[("virus", 0.5)]);
        let b = record(0.47, 80, &[("virus", 0.25), ("mask", 1.0)]);

        let mut ab = BucketAggregate::default();
        ab.merge_record(&a, &t);
        ab.merge_record(&b, &t);
        let mut ba = BucketAggregate::default();
        ba.merge_record(&b, &t);
        ba.merge_record(&a, &t);

        assert_eq!(ab.record_count, ba.record_count);
        assert_eq!(ab.total_similarity, ba.total_similarity);
        assert_eq!(ab.total_word_count, ba.total_word_count);
        assert_eq!(ab.levels, ba.levels);
        let virus = |b: &BucketAggregate| b.concepts.as_slice().iter().find(|c| c.concept_name == "virus").map(|c| c.score);
        assert_eq!(virus(&ab), virus(&ba));
        assert_eq!(virus(&ab), Some(0.75));
    }

    #[test]
    fn level_counts_always_cover_every_record() {
        let t = SimilarityThresholds { medium: 0.3, high: 0.6 };
        let mut bucket = BucketAggregate::default();
        for (i, score) in [0.0, 0.29, 0.3, 0.59, 0.6, 0.95, 0.1].into_iter().enumerate() {
            bucket.merge_record(&record(score, 10, &[]), &t);
            assert_eq!(bucket.levels.total(), bucket.record_count);
            assert_eq!(bucket.record_count, i as u64 + 1);
        }
        assert_eq!(bucket.levels, LevelCounts { low: 3, medium: 2, high: 2 });
    }

    #[test]
    fn concepts_accumulate_and_missing_entries_are_skipped() {
        let t = SimilarityThresholds::default();
        let mut r = record(0.3, 10, &[("fire", 1.5), ("flood", 0.5)]);
        r.top_concepts.push(None);
        let mut bucket = BucketAggregate::default();
        bucket.merge_record(&r, &t);
        bucket.merge_record(&record(0.1, 5, &[("fire", 2.0)]), &t);

        let concepts = bucket.concepts.as_slice();
        assert_eq!(concepts.len(), 2);
        assert_eq!(concepts[0].concept_name, "fire");
        assert_relative_eq!(concepts[0].score, 3.5);
        assert_eq!(concepts[1].concept_name, "flood");
        assert_eq!(bucket.examples.len(), 2);
    }

    #[test]
    fn averages_and_percentages() {
        let t = SimilarityThresholds { medium: 0.2, high: 0.4 };
        let mut bucket = BucketAggregate::default();
        for score in [0.1, 0.3, 0.5, 0.7] {
            bucket.merge_record(&record(score, 100, &[]), &t);
        }
        assert_relative_eq!(bucket.average_similarity(), 0.4, epsilon = 1e-12);
        assert_relative_eq!(bucket.average_word_count(), 100.0);
        assert_relative_eq!(bucket.level_percent(SimilarityLevel::Low), 25.0);
        assert_relative_eq!(bucket.level_percent(SimilarityLevel::Medium), 25.0);
        assert_relative_eq!(bucket.level_percent(SimilarityLevel::High), 50.0);
    }

    #[test]
    fn accumulator_creates_one_bucket_per_key() {
        let mut acc = Accumulator::new(SimilarityThresholds::default());
        acc.add(-1i64, &record(0.1, 1, &[]));
        acc.add(3, &record(0.2, 1, &[]));
        acc.add(-1, &record(0.3, 1, &[]));
        assert_eq!(acc.len(), 2);
        let buckets = acc.into_sorted();
        assert_eq!(buckets[&-1].record_count, 2);
        let keys: Vec<i64> = buckets.into_keys().collect();
        assert_eq!(keys, vec![-1, 3]);
    }

    #[test]
    fn accumulator_keeps_first_seen_key_order() {
        let mut acc = Accumulator::new(SimilarityThresholds::default());
        acc.add(7i64, &record(0.1, 1, &[]));
        acc.add(-2, &record(0.2, 1, &[]));
        acc.add(7, &record(0.3, 1, &[]));
        acc.add(0, &record(0.4, 1, &[]));
        let keys: Vec<i64> = acc.into_buckets().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![7, -2, 0]);
    }
}
