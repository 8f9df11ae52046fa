// src/export.rs
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use std::{fs, path::Path};

use crate::display::DifferenceCollection;
use crate::promote::GranularityComparisonCollection;

/// Everything one run produces, ready to serialize.
#[derive(Debug, Clone)]
pub struct Views {
    pub bar: DifferenceCollection,
    pub column: DifferenceCollection,
    pub bubbles: Vec<GranularityComparisonCollection>,
}

pub fn bar_file() -> &'static str {
    "bar.days.json"
}

pub fn column_file() -> &'static str {
    "column.weeks.json"
}

pub fn bubble_file(c: &GranularityComparisonCollection) -> String {
    format!("bubble.{}.json", c.granularity.as_str())
}

/// Write every chart JSON plus `index.json` into `out_dir`; returns the files written.
pub fn write_all(out_dir: &Path, views: &Views, record_count: usize) -> Result<Vec<String>> {
    fs::create_dir_all(out_dir).with_context(|| format!("create {:?}", out_dir))?;

    let mut files = Vec::new();

    write_json(out_dir.join(bar_file()), &views.bar)?;
    files.push(bar_file().to_string());

    write_json(out_dir.join(column_file()), &views.column)?;
    files.push(column_file().to_string());

    for bubble in &views.bubbles {
        let name = bubble_file(bubble);
        write_json(out_dir.join(&name), bubble)?;
        files.push(name);
    }

    let counts = json!({
        "records": record_count,
        "barBuckets": views.bar.groups.iter().map(|g| g.buckets.len()).sum::<usize>(),
        "columnBuckets": views.column.groups.iter().map(|g| g.buckets.len()).sum::<usize>(),
        "bubbleBuckets": views
            .bubbles
            .iter()
            .map(|b| json!({
                "granularity": b.granularity,
                "buckets": b.groups.iter().map(|g| g.buckets.len()).sum::<usize>(),
            }))
            .collect::<Vec<_>>(),
    });
    let idx = json!({
        "version": 1,
        "generatedAt": chrono::Utc::now().to_rfc3339(),
        "counts": counts,
        "files": files,
    });
    write_json(out_dir.join("index.json"), &idx)?;

    Ok(files)
}

fn write_json<P: AsRef<Path>, T: ?Sized + Serialize>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, serde_json::to_vec_pretty(value)?)
        .with_context(|| format!("writing {}", path.display()))
}
