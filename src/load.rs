// src/load.rs
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::models::{DayFile, RawComparisonRecord, RawConcept};

static MONTH_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{1,2})[-/](\d{1,2})\s*$").expect("static pattern"));

/// `*.json` files directly inside `dir`, sorted by file name.
pub fn list_day_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Parse every non-empty day file. Results keep file-name order.
pub fn read_day_files(paths: &[PathBuf]) -> Result<Vec<(String, DayFile)>> {
    let parsed: Vec<Option<(String, DayFile)>> = paths
        .par_iter()
        .map(|path| -> Result<Option<(String, DayFile)>> {
            let name = file_label(path);
            let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            if raw.trim().is_empty() {
                warn!("Skipping empty file - {}", name);
                return Ok(None);
            }
            let day: DayFile =
                serde_json::from_str(&raw).with_context(|| format!("decoding JSON in {}", name))?;
            Ok(Some((name, day)))
        })
        .collect::<Result<_>>()?;

    Ok(parsed.into_iter().flatten().collect())
}

/// Resolve one day file's dates and flatten it into comparison records.
pub fn normalize_day_file(
    file: &str,
    day: DayFile,
    years: &BTreeMap<String, i32>,
    use_reference_2020: bool,
) -> Result<Vec<RawComparisonRecord>, PipelineError> {
    let year = *years
        .get(&day.dream_set_name)
        .ok_or_else(|| PipelineError::UnknownDreamSet {
            file: file.to_string(),
            name: day.dream_set_name.clone(),
        })?;
    let dream_date = parse_month_day(&day.dream_set_date, year)
        .ok_or_else(|| bad_date(file, &day.dream_set_date))?;

    debug!(
        "Day file - file={}, set={}, dream_date={}, set_size={}, news_records={}",
        file,
        day.dream_set_name,
        dream_date,
        day.dream_set_size,
        day.news_records.len()
    );

    day.news_records
        .into_iter()
        .map(|news| -> Result<RawComparisonRecord, PipelineError> {
            let news_field = match news.reference_2020 {
                Some(reference) if use_reference_2020 => reference,
                _ => news.date,
            };
            let news_date = parse_date(&news_field).ok_or_else(|| bad_date(file, &news_field))?;
            Ok(RawComparisonRecord {
                source: file.to_string(),
                dream_set: day.dream_set_name.clone(),
                dream_date,
                news_date,
                similarity_score: news.similarity,
                word_count: news.word_count,
                top_concepts: news
                    .top_concepts
                    .into_iter()
                    .map(|c| c.and_then(RawConcept::into_concept))
                    .collect(),
                examples: news.examples,
            })
        })
        .collect()
}

/// Read and normalize the whole input directory.
pub fn load_records(dir: &Path, config: &PipelineConfig) -> Result<Vec<RawComparisonRecord>> {
    let start = std::time::Instant::now();
    let paths = list_day_files(dir)?;
    let days = read_day_files(&paths)?;

    let mut records = Vec::new();
    for (name, day) in days.into_iter() {
        records.extend(normalize_day_file(
            &name,
            day,
            &config.dream_set_years,
            config.use_reference_2020,
        )?);
    }

    info!(
        "Input load completed - duration={:.2}s, files={}, records={}",
        start.elapsed().as_secs_f32(),
        paths.len(),
        records.len()
    );
    Ok(records)
}

/// `MM-DD`, `M-D` or `MM/DD` in the given year.
pub fn parse_month_day(s: &str, year: i32) -> Option<NaiveDate> {
    let caps = MONTH_DAY.captures(s)?;
    let month = caps.get(1)?.as_str().parse().ok()?;
    let day = caps.get(2)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// `YYYY-MM-DD`, or the date part of an RFC 3339 timestamp.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

fn bad_date(file: &str, value: &str) -> PipelineError {
    PipelineError::BadDate {
        file: file.to_string(),
        value: value.to_string(),
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
