// src/pipeline.rs
use anyhow::{bail, Result};
use chrono::NaiveDate;
use itertools::Itertools;
use std::collections::BTreeMap;
use std::hash::Hash;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::bucket::{Accumulator, BucketAggregate};
use crate::collection::{assign, classify, BucketGroup, UnmatchedPolicy};
use crate::config::PipelineConfig;
use crate::difference::{day_difference, week_difference};
use crate::display::{build_difference_collection, DifferenceCollection, DifferenceUnit};
use crate::error::PipelineError;
use crate::export::{write_all, Views};
use crate::load::load_records;
use crate::models::RawComparisonRecord;
use crate::promote::{promote, DayComparison};

/// Fold records into one accumulator per configured collection.
///
/// Records outside every collection follow `policy`. Buckets keep the order their
/// keys first arrived in.
fn accumulate_by_collection<K, F>(
    records: &[RawComparisonRecord],
    config: &PipelineConfig,
    policy: UnmatchedPolicy,
    key_of: F,
) -> Result<Vec<BucketGroup<Vec<(K, BucketAggregate)>>>, PipelineError>
where
    K: Hash + Eq + Clone,
    F: Fn(&RawComparisonRecord) -> K,
{
    let mut accumulators: Vec<Accumulator<K>> = config
        .collections
        .iter()
        .map(|_| Accumulator::new(config.thresholds))
        .collect();

    let mut skipped = 0usize;
    for record in records {
        match assign(record, &config.collections, policy)? {
            Some(i) => accumulators[i].add(key_of(record), record),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!("Records outside every collection skipped - count={}", skipped);
    }
    for (range, acc) in config.collections.iter().zip(&accumulators) {
        debug!("Accumulated - collection={}, buckets={}", range.key, acc.len());
    }

    Ok(config
        .collections
        .iter()
        .zip(accumulators)
        .map(|(range, acc)| BucketGroup::for_range(range, acc.into_buckets()))
        .collect())
}

/// Bar (days) or column (weeks) view: buckets keyed by `difference(news, dream)`.
pub fn build_difference_view(
    records: &[RawComparisonRecord],
    config: &PipelineConfig,
    unit: DifferenceUnit,
) -> Result<DifferenceCollection, PipelineError> {
    let groups = accumulate_by_collection(records, config, config.unmatched.difference, |r| match unit {
        DifferenceUnit::Days => day_difference(r.news_date, r.dream_date),
        DifferenceUnit::Weeks => week_difference(r.news_date, r.dream_date),
    })?;
    debug!("Difference view - unit={}, groups={}", unit.as_str(), groups.len());
    let groups = groups
        .into_iter()
        .map(|group| BucketGroup {
            key: group.key,
            label: group.label,
            color: group.color,
            buckets: group.buckets.into_iter().collect::<BTreeMap<_, _>>(),
        })
        .collect();
    Ok(build_difference_collection(
        unit,
        groups,
        &config.thresholds,
        &config.level_colors,
        config.caps(),
    ))
}

/// Day-level (dream date, news date) cells per collection, the input to promotion.
/// Cells stay in arrival order so promotion merges lists first-encountered first.
pub fn build_day_comparisons(
    records: &[RawComparisonRecord],
    config: &PipelineConfig,
) -> Result<Vec<BucketGroup<Vec<DayComparison>>>, PipelineError> {
    let groups = accumulate_by_collection(records, config, config.unmatched.comparison, |r| {
        (r.dream_date, r.news_date)
    })?;

    Ok(groups
        .into_iter()
        .map(|group| BucketGroup {
            key: group.key,
            label: group.label,
            color: group.color,
            buckets: group
                .buckets
                .into_iter()
                .map(|((dream_date, news_date), bucket)| day_comparison(dream_date, news_date, bucket))
                .collect(),
        })
        .collect())
}

fn day_comparison(dream_date: NaiveDate, news_date: NaiveDate, bucket: BucketAggregate) -> DayComparison {
    DayComparison {
        dream_date,
        news_date,
        score: bucket.average_similarity(),
        word_count: bucket.total_word_count,
        record_count: bucket.record_count,
        concepts: bucket.concepts.as_slice().to_vec(),
        examples: bucket.examples,
    }
}

/// All chart views for an already-loaded record set.
pub fn build_views(records: &[RawComparisonRecord], config: &PipelineConfig) -> Result<Views> {
    let start = std::time::Instant::now();

    let bar = build_difference_view(records, config, DifferenceUnit::Days)?;
    let column = build_difference_view(records, config, DifferenceUnit::Weeks)?;
    debug!(
        "Difference views built - bar_groups={}, column_groups={}",
        bar.groups.len(),
        column.groups.len()
    );

    let days = build_day_comparisons(records, config)?;
    let caps = config.caps();
    let bubbles = config
        .granularities
        .iter()
        .map(|&g| promote(g, |d| g.index(d), &days, config.max_distance.get(g), caps))
        .collect_vec();

    info!(
        "Aggregation completed - duration={:.2}s, day_cells={}, granularities={}",
        start.elapsed().as_secs_f32(),
        days.iter().map(|g| g.buckets.len()).sum::<usize>(),
        bubbles.iter().map(|b| b.granularity.as_str()).join(",")
    );

    Ok(Views { bar, column, bubbles })
}

pub fn run(config: &PipelineConfig, input_dir: &Path, output_dir: &Path) -> Result<()> {
    let pipeline_start = std::time::Instant::now();
    info!(
        "Pipeline started - input_dir={}, output_dir={}",
        input_dir.display(),
        output_dir.display()
    );

    let records = load_records(input_dir, config)?;
    if records.is_empty() {
        bail!("No comparison records found in {}", input_dir.display());
    }

    let sets = records.iter().map(|r| r.dream_set.as_str()).unique().join(",");
    let per_collection = records
        .iter()
        .filter_map(|r| classify(r.dream_date, &config.collections))
        .map(|c| c.key.as_str())
        .counts();
    debug!("Dream sets - {}", sets);
    for range in &config.collections {
        debug!(
            "Collection - key={}, records={}",
            range.key,
            per_collection.get(range.key.as_str()).copied().unwrap_or(0)
        );
    }

    let views = build_views(&records, config)?;
    let files = write_all(output_dir, &views, records.len())?;

    info!(
        "Pipeline completed successfully - total_duration={:.2}s, records={}, files={}",
        pipeline_start.elapsed().as_secs_f32(),
        records.len(),
        files.len()
    );
    Ok(())
}
