use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::models::RawComparisonRecord;

/// Named, colored date interval that groups dream records into a cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionRange {
    pub key: String,
    pub label: String,
    pub color: String,
    pub from: NaiveDate, // inclusive
    pub to: NaiveDate,   // inclusive
}

impl CollectionRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// One collection's worth of buckets, carrying the collection's label and color.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketGroup<T> {
    pub key: String,
    pub label: String,
    pub color: String,
    pub buckets: T,
}

impl<T> BucketGroup<T> {
    pub fn for_range(range: &CollectionRange, buckets: T) -> Self {
        Self {
            key: range.key.clone(),
            label: range.label.clone(),
            color: range.color.clone(),
            buckets,
        }
    }
}

/// What a view does with a record whose dream date falls in no collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmatchedPolicy {
    Fail,
    Skip,
}

/// First range, in configured order, containing `date`.
pub fn classify(date: NaiveDate, ranges: &[CollectionRange]) -> Option<&CollectionRange> {
    ranges.iter().find(|r| r.contains(date))
}

/// Position of the collection a record belongs to, classified by its dream date.
///
/// `Ok(None)` means the record was dropped under `UnmatchedPolicy::Skip`.
pub fn assign(
    record: &RawComparisonRecord,
    ranges: &[CollectionRange],
    policy: UnmatchedPolicy,
) -> Result<Option<usize>, PipelineError> {
    match ranges.iter().position(|r| r.contains(record.dream_date)) {
        Some(i) => Ok(Some(i)),
        None => match policy {
            UnmatchedPolicy::Skip => Ok(None),
            UnmatchedPolicy::Fail => Err(PipelineError::UnmatchedCollection {
                file: record.source.clone(),
                date: record.dream_date,
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ranges() -> Vec<CollectionRange> {
        vec![
            CollectionRange {
                key: "dreams2020".into(),
                label: "2020 Dreams".into(),
                color: "#e45756".into(),
                from: ymd(2020, 1, 1),
                to: ymd(2020, 12, 31),
            },
            CollectionRange {
                key: "control".into(),
                label: "Pre-2020 Control".into(),
                color: "#4c78a8".into(),
                from: ymd(2010, 1, 1),
                to: ymd(2019, 12, 31),
            },
            CollectionRange {
                key: "spring2020".into(),
                label: "Spring 2020".into(),
                color: "#54a24b".into(),
                from: ymd(2020, 3, 1),
                to: ymd(2020, 5, 31),
            },
        ]
    }

    fn record_on(date: NaiveDate) -> RawComparisonRecord {
        RawComparisonRecord {
            source: "03-15.json".into(),
            dream_set: "dreams2020".into(),
            dream_date: date,
            news_date: date,
            similarity_score: 0.5,
            word_count: 1,
            top_concepts: vec![],
            examples: vec![],
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        let r = ranges();
        assert_eq!(classify(ymd(2020, 1, 1), &r).unwrap().key, "dreams2020");
        assert_eq!(classify(ymd(2020, 12, 31), &r).unwrap().key, "dreams2020");
        assert_eq!(classify(ymd(2019, 12, 31), &r).unwrap().key, "control");
    }

    #[test]
    fn first_matching_range_wins() {
        let r = ranges();
        assert_eq!(classify(ymd(2020, 4, 1), &r).unwrap().key, "dreams2020");
    }

    #[test]
    fn no_match_returns_none() {
        assert!(classify(ymd(2009, 6, 1), &ranges()).is_none());
        assert!(classify(ymd(2021, 1, 1), &ranges()).is_none());
    }

    #[test]
    fn assign_follows_policy() {
        let r = ranges();
        let inside = record_on(ymd(2015, 7, 4));
        assert_eq!(assign(&inside, &r, UnmatchedPolicy::Fail).unwrap(), Some(1));

        let outside = record_on(ymd(2021, 2, 2));
        assert_eq!(assign(&outside, &r, UnmatchedPolicy::Skip).unwrap(), None);
        match assign(&outside, &r, UnmatchedPolicy::Fail) {
            Err(PipelineError::UnmatchedCollection { file, date }) => {
                assert_eq!(file, "03-15.json");
                assert_eq!(date, ymd(2021, 2, 2));
            }
            other => panic!("expected UnmatchedCollection, got {other:?}"),
        }
    }
}
