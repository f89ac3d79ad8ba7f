//! FAQ Knowledge Store
//!
//! Immutable in-memory collection of question/answer entries with lexical
//! relevance scoring. Loaded once per process lifetime; all reads are pure.
//!
//! Scoring favors precision over recall: only terms of 3+ characters count,
//! question matches weigh double, and zero-score entries are never returned.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Weight applied to query terms found in an entry's question text
const QUESTION_WEIGHT: u32 = 2;
/// Weight applied to query terms found in an entry's answer text
const ANSWER_WEIGHT: u32 = 1;
/// Tokens shorter than this never count as search terms
const MIN_TERM_LEN: usize = 3;

/// A single stored FAQ entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub category: String,
}

/// A search result: an entry plus its relevance score (always > 0)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub entry: KnowledgeEntry,
    pub score: u32,
}

/// Read-only FAQ store
pub struct KnowledgeStore {
    entries: Vec<KnowledgeEntry>,
}

impl KnowledgeStore {
    /// Load entries from a JSON file.
    ///
    /// A missing or unreadable file is not fatal: the store starts empty
    /// and a warning is logged, matching the ticket log recovery policy.
    pub fn load(path: &Path) -> Self {
        let entries = match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Vec<KnowledgeEntry>>(&contents) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "FAQ file is corrupt, starting with empty knowledge base"
                    );
                    Vec::new()
                }
            },
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "FAQ file not found, starting with empty knowledge base"
                );
                Vec::new()
            }
        };

        Self { entries }
    }

    /// Build a store directly from entries (used by tests and embedding callers)
    pub fn from_entries(entries: Vec<KnowledgeEntry>) -> Self {
        Self { entries }
    }

    /// Keyword search ranked by relevance score.
    ///
    /// Returns at most `top_k` hits, sorted descending by score. Ties keep
    /// load order (stable sort). Entries scoring zero are excluded.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<SearchHit> {
        if top_k == 0 {
            return Vec::new();
        }

        let terms = query_terms(query);
        if terms.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let score = relevance_score(&terms, entry);
                (score > 0).then(|| SearchHit {
                    entry: entry.clone(),
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.cmp(&a.score));
        hits.truncate(top_k);
        hits
    }

    /// Retrieve a specific entry by id
    pub fn get_by_id(&self, id: &str) -> Option<&KnowledgeEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// All entries in a category, insertion order preserved
    pub fn get_by_category(&self, category: &str) -> Vec<&KnowledgeEntry> {
        self.entries.iter().filter(|e| e.category == category).collect()
    }

    /// Distinct categories present in the store
    pub fn get_categories(&self) -> BTreeSet<String> {
        self.entries.iter().map(|e| e.category.clone()).collect()
    }

    /// All entries in load order
    pub fn get_all(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Split a query into search terms: lowercased whitespace tokens, edge
/// punctuation stripped, shorter than 3 characters discarded, deduplicated.
fn query_terms(query: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    query
        .split_whitespace()
        .map(normalize_token)
        .filter(|t| t.len() >= MIN_TERM_LEN)
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Lowercase a token and strip leading/trailing punctuation
fn normalize_token(token: &str) -> String {
    token
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

/// Weighted term-overlap score for one entry
fn relevance_score(terms: &[String], entry: &KnowledgeEntry) -> u32 {
    let question = entry.question.to_lowercase();
    let answer = entry.answer.to_lowercase();

    let mut score = 0;
    for term in terms {
        if question.contains(term.as_str()) {
            score += QUESTION_WEIGHT;
        }
        if answer.contains(term.as_str()) {
            score += ANSWER_WEIGHT;
        }
    }
    score
}
