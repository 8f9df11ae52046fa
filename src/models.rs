use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptScore {
    pub concept_name: String,
    pub score: f64,
}

impl ConceptScore {
    pub fn new(concept_name: impl Into<String>, score: f64) -> Self {
        Self {
            concept_name: concept_name.into(),
            score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Example {
    pub dream_text: String,
    pub news_text: String,
    pub score: f64,
    #[serde(default)]
    pub concepts: Vec<ConceptScore>,
}

/* Input documents: one file per dream-set day */

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayFile {
    pub dream_set_name: String,
    pub dream_set_date: String, // "MM-DD", year comes from the set name
    #[serde(default)]
    pub dream_set_size: u64,
    #[serde(default)]
    pub news_records: Vec<NewsRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsRecord {
    pub date: String,
    pub similarity: f64,
    #[serde(default)]
    pub word_count: u64,
    #[serde(default)]
    pub top_concepts: Vec<Option<RawConcept>>,
    #[serde(default)]
    pub examples: Vec<Example>,
    #[serde(default, rename = "reference2020")]
    pub reference_2020: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConcept {
    #[serde(default)]
    pub concept_name: Option<String>,
    #[serde(default)]
    pub score: f64,
}

impl RawConcept {
    /// `None` when the entry carries no usable concept name.
    pub fn into_concept(self) -> Option<ConceptScore> {
        match self.concept_name {
            Some(name) if !name.trim().is_empty() => Some(ConceptScore {
                concept_name: name,
                score: self.score,
            }),
            _ => None,
        }
    }
}

/// One dream-set day compared against one news day, after date resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct RawComparisonRecord {
    pub source: String, // file the record was read from
    pub dream_set: String,
    pub dream_date: NaiveDate,
    pub news_date: NaiveDate,
    pub similarity_score: f64,
    pub word_count: u64,
    pub top_concepts: Vec<Option<ConceptScore>>, // missing entries are kept as None and skipped downstream
    pub examples: Vec<Example>,
}
