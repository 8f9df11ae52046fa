use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::{ConceptScore, Example};

/// Merge duplicate concept names by summing their scores, then keep the
/// `limit` highest. Ties keep the order in which names were first seen.
pub fn consolidate_concepts(list: &[ConceptScore], limit: usize) -> Vec<ConceptScore> {
    let mut merged: Vec<ConceptScore> = Vec::with_capacity(list.len());
    let mut slots: HashMap<&str, usize> = HashMap::new();

    for c in list {
        match slots.get(c.concept_name.as_str()) {
            Some(&i) => merged[i].score += c.score,
            None => {
                slots.insert(c.concept_name.as_str(), merged.len());
                merged.push(c.clone());
            }
        }
    }

    // stable: equal scores stay in first-seen order
    merged.sort_by(|a, b| descending(a.score, b.score));
    merged.truncate(limit);
    merged
}

/// Keep the `limit` highest-scoring examples. No de-duplication; ties keep input order.
pub fn consolidate_examples(list: &[Example], limit: usize) -> Vec<Example> {
    let mut ranked = list.to_vec();
    ranked.sort_by(|a, b| descending(a.score, b.score));
    ranked.truncate(limit);
    ranked
}

/// Highest score first. Adding `0.0` folds `-0.0` into `0.0` so the two tie.
fn descending(a: f64, b: f64) -> Ordering {
    (b + 0.0).total_cmp(&(a + 0.0))
}
