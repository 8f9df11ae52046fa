use chrono::NaiveDate;
use thiserror::Error;

/// Fatal conditions that abort a run. Each names the source file it came from.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{file}: no year mapping for dream set {name:?}")]
    UnknownDreamSet { file: String, name: String },
    #[error("{file}: unparseable date {value:?}")]
    BadDate { file: String, value: String },
    #[error("{file}: dream date {date} matches no configured collection")]
    UnmatchedCollection { file: String, date: NaiveDate },
    #[error("invalid configuration: {0}")]
    Config(String),
}
