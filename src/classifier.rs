use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;

use crate::schema::Event;

const SUBSTRING_CAP: usize = 5;
const FUZZY_CAP: usize = 3;
const FUZZY_THRESHOLD: f64 = 0.5;

// Case-fold, strip non-breaking spaces, collapse runs of whitespace.
pub fn normalize_name(raw: &str) -> String {
    raw.replace('\u{a0}', " ")
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Classification {
    Valid,
    FalsePositive,
    Unknown { suggestions: Vec<String> },
}

impl Classification {
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Valid => "Valid",
            Classification::FalsePositive => "False Positive",
            Classification::Unknown { .. } => "Unknown",
        }
    }
}

pub struct Classifier {
    reference: Vec<String>,
    normalized: Vec<String>,
    false_positives: HashSet<String>,
}

impl Classifier {
    pub fn new(reference: Vec<String>, false_positives: HashSet<String>) -> Self {
        let normalized = reference.iter().map(|n| normalize_name(n)).collect();
        Classifier { reference, normalized, false_positives }
    }

    pub fn classify(&self, candidate: &str) -> Classification {
        let norm = normalize_name(candidate);
        if self.normalized.iter().any(|n| *n == norm) {
            if self.false_positives.contains(&norm) {
                Classification::FalsePositive
            } else {
                Classification::Valid
            }
        } else {
            Classification::Unknown { suggestions: self.suggest(&norm) }
        }
    }

    // Substring hits in reference order win outright; only when there are
    // none does the fuzzy ranking run.
    fn suggest(&self, norm: &str) -> Vec<String> {
        if norm.is_empty() {
            return vec![];
        }
        let by_substring: Vec<String> = self
            .reference
            .iter()
            .zip(&self.normalized)
            .filter(|(_, n)| n.contains(norm))
            .map(|(r, _)| r.clone())
            .take(SUBSTRING_CAP)
            .collect();
        if !by_substring.is_empty() {
            return by_substring;
        }
        let mut scored: Vec<(f64, &String)> = self
            .reference
            .iter()
            .zip(&self.normalized)
            .map(|(r, n)| (strsim::normalized_levenshtein(norm, n), r))
            .filter(|(score, _)| *score >= FUZZY_THRESHOLD)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        scored.into_iter().take(FUZZY_CAP).map(|(_, r)| r.clone()).collect()
    }
}

pub fn load_false_positives(path: &Path) -> HashSet<String> {
    let data = match std::fs::read_to_string(path) {
        Ok(d) => d,
        Err(e) => {
            log::warn!("False-positive list {} unavailable: {}", path.display(), e);
            return HashSet::new();
        }
    };
    data.strip_prefix('\u{feff}')
        .unwrap_or(&data)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(normalize_name)
        .collect()
}

// Occurrence counts keyed by event name, first-seen order preserved.
pub fn count_by_name(events: &[&Event]) -> Vec<(String, usize)> {
    let mut out: Vec<(String, usize)> = vec![];
    for e in events {
        if let Some(slot) = out.iter_mut().find(|(n, _)| *n == e.event_name) {
            slot.1 += 1;
        } else {
            out.push((e.event_name.clone(), 1));
        }
    }
    out
}
