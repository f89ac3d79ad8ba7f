//! Query Classifier
//!
//! Fast pre-LLM signal extraction: derives intent signals from raw text
//! before any store lookup or reasoner call. All trigger lists ship as
//! named constants so tests (and product) can enumerate them.

use serde::{Deserialize, Serialize};

// ============================================================================
// Trigger Lists
// ============================================================================

/// Words that open an interrogative sentence
pub const INTERROGATIVE_WORDS: &[&str] = &[
    "how", "what", "why", "when", "where", "who", "can", "is", "does",
];

/// Greeting phrases; must appear within the first few tokens to count
pub const GREETING_WORDS: &[&str] = &[
    "hello",
    "hi",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
    "greetings",
];

/// Negative-sentiment phrases that mark a complaint
pub const COMPLAINT_TERMS: &[&str] = &[
    "broken",
    "doesn't work",
    "does not work",
    "not working",
    "error",
    "failed",
    "frustrated",
    "terrible",
    "awful",
    "unacceptable",
    "crash",
];

pub const BILLING_KEYWORDS: &[&str] = &[
    "billing", "bill", "invoice", "payment", "charge", "charged", "refund", "subscription", "price",
];

pub const ACCOUNT_KEYWORDS: &[&str] = &[
    "account", "login", "log in", "password", "username", "email", "profile", "sign in", "signup",
];

pub const TECHNICAL_KEYWORDS: &[&str] = &[
    "error", "bug", "crash", "broken", "slow", "install", "update", "sync", "connection", "loading",
];

/// How many leading tokens are scanned for a greeting
const GREETING_WINDOW: usize = 4;

// ============================================================================
// Signals
// ============================================================================

/// Derived per-query intent signals. Ephemeral, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySignals {
    pub original_query: String,
    /// Whitespace-normalized query text
    pub cleaned_query: String,
    pub user_id: String,
    pub word_count: usize,
    pub is_question: bool,
    pub is_greeting: bool,
    pub is_complaint: bool,
    pub mentions_billing: bool,
    pub mentions_account: bool,
    pub mentions_technical: bool,
}

/// Structured validation failure. Returned as a value, never panics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidQuery {
    #[error("Query is empty")]
    Empty,

    #[error("Query is too long ({length} characters, max {max})")]
    TooLong { length: usize, max: usize },
}

// ============================================================================
// Classifier
// ============================================================================

/// Derives `QuerySignals` from raw text
pub struct QueryClassifier {
    max_query_len: usize,
}

impl QueryClassifier {
    pub fn new(max_query_len: usize) -> Self {
        Self { max_query_len }
    }

    /// Parse raw input into intent signals.
    pub fn parse(&self, raw_text: &str, user_id: &str) -> QuerySignals {
        let cleaned_query = raw_text.split_whitespace().collect::<Vec<_>>().join(" ");
        let lowered = cleaned_query.to_lowercase();
        let tokens: Vec<&str> = lowered.split_whitespace().collect();
        let word_count = tokens.len();

        let is_question = cleaned_query.ends_with('?')
            || tokens
                .first()
                .map(|first| INTERROGATIVE_WORDS.contains(first))
                .unwrap_or(false);

        // Single-word greetings match whole tokens only; "hi" must not fire
        // inside "this". Multi-word phrases match against the joined window.
        let window_tokens: Vec<String> = tokens
            .iter()
            .take(GREETING_WINDOW)
            .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
            .collect();
        let window_text = window_tokens.join(" ");
        let is_greeting = GREETING_WORDS.iter().any(|g| {
            if g.contains(' ') {
                window_text.contains(g)
            } else {
                window_tokens.iter().any(|t| t == g)
            }
        });

        QuerySignals {
            original_query: raw_text.to_string(),
            cleaned_query,
            user_id: user_id.to_string(),
            word_count,
            is_question,
            is_greeting,
            is_complaint: contains_any(&lowered, COMPLAINT_TERMS),
            mentions_billing: contains_any(&lowered, BILLING_KEYWORDS),
            mentions_account: contains_any(&lowered, ACCOUNT_KEYWORDS),
            mentions_technical: contains_any(&lowered, TECHNICAL_KEYWORDS),
        }
    }

    /// Validate parsed signals against input limits.
    pub fn validate(&self, signals: &QuerySignals) -> Result<(), InvalidQuery> {
        if signals.cleaned_query.is_empty() {
            return Err(InvalidQuery::Empty);
        }

        let length = signals.cleaned_query.chars().count();
        if length > self.max_query_len {
            return Err(InvalidQuery::TooLong {
                length,
                max: self.max_query_len,
            });
        }

        Ok(())
    }
}

fn contains_any(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| text.contains(t))
}
