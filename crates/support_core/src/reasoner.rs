//! External Reasoner Client
//!
//! Narrow synchronous boundary to the remote text-completion service used
//! for escalation. Real backend is any OpenAI-compatible chat endpoint;
//! tests use the scripted fake. Every call is time-bounded, and every
//! failure degrades to the policy fallback instead of propagating.

use crate::config::ReasonerConfig;
use anyhow::Result;
use std::time::Duration;

/// System prompt sent with every escalated query
const SYSTEM_PROMPT: &str =
    "You are a helpful support assistant for SupportMax Pro. Answer the user's question concisely.";
/// Completion cap per escalation
const MAX_TOKENS: u32 = 150;

/// A successful completion from the reasoner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonerReply {
    pub answer: String,
    pub token_count: u32,
    pub model: String,
}

/// Typed reasoner failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum ReasonerError {
    #[error("External reasoner is disabled in configuration")]
    Disabled,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Malformed response: {0}")]
    InvalidResponse(String),

    #[error("Reasoner returned an empty completion")]
    Empty,
}

/// Generic reasoner interface
pub trait ExternalReasoner: Send + Sync {
    /// Complete one escalated query
    fn complete(&self, query: &str) -> Result<ReasonerReply, ReasonerError>;
}

/// HTTP reasoner against an OpenAI-compatible chat-completions endpoint
pub struct HttpReasoner {
    config: ReasonerConfig,
    client: reqwest::blocking::Client,
}

impl HttpReasoner {
    pub fn new(config: &ReasonerConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            config: config.clone(),
            client,
        })
    }
}

impl ExternalReasoner for HttpReasoner {
    fn complete(&self, query: &str) -> Result<ReasonerReply, ReasonerError> {
        if !self.config.enabled {
            return Err(ReasonerError::Disabled);
        }

        let url = format!("{}/v1/chat/completions", self.config.endpoint);
        let request_body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": query},
            ],
            "max_tokens": MAX_TOKENS,
        });

        let mut request = self.client.post(&url).json(&request_body);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                ReasonerError::Timeout(self.config.timeout_secs)
            } else {
                ReasonerError::Http(format!("Request failed: {}", e))
            }
        })?;

        if !response.status().is_success() {
            return Err(ReasonerError::Http(format!(
                "HTTP {} from reasoner backend",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .map_err(|e| ReasonerError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let answer = body
            .get("choices")
            .and_then(|v| v.get(0))
            .and_then(|v| v.get("message"))
            .and_then(|v| v.get("content"))
            .and_then(|v| v.as_str())
            .ok_or(ReasonerError::Empty)?
            .trim()
            .to_string();

        if answer.is_empty() {
            return Err(ReasonerError::Empty);
        }

        let token_count = body
            .get("usage")
            .and_then(|v| v.get("total_tokens"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32;

        let model = body
            .get("model")
            .and_then(|v| v.as_str())
            .unwrap_or(&self.config.model)
            .to_string();

        Ok(ReasonerReply {
            answer,
            token_count,
            model,
        })
    }
}

/// Scripted reasoner for tests
pub struct FakeReasoner {
    replies: std::sync::Mutex<Vec<Result<ReasonerReply, ReasonerError>>>,
    call_count: std::sync::Mutex<usize>,
}

impl FakeReasoner {
    /// Fake with a queue of scripted results; the last one repeats
    pub fn new(replies: Vec<Result<ReasonerReply, ReasonerError>>) -> Self {
        Self {
            replies: std::sync::Mutex::new(replies),
            call_count: std::sync::Mutex::new(0),
        }
    }

    /// Fake that always answers with the given text
    pub fn always_answers(answer: &str) -> Self {
        Self::new(vec![Ok(ReasonerReply {
            answer: answer.to_string(),
            token_count: 42,
            model: "fake-model".to_string(),
        })])
    }

    /// Fake that always fails with the given error
    pub fn always_fails(error: ReasonerError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl ExternalReasoner for FakeReasoner {
    fn complete(&self, _query: &str) -> Result<ReasonerReply, ReasonerError> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;

        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Err(ReasonerError::Empty);
        }

        if replies.len() == 1 {
            replies[0].clone()
        } else {
            replies.remove(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_always_answers() {
        let reasoner = FakeReasoner::always_answers("The roadmap is on our blog.");

        let reply = reasoner.complete("what is the roadmap?").unwrap();
        assert_eq!(reply.answer, "The roadmap is on our blog.");
        assert_eq!(reply.model, "fake-model");
        assert_eq!(reasoner.call_count(), 1);

        // Single reply repeats
        assert!(reasoner.complete("again?").is_ok());
        assert_eq!(reasoner.call_count(), 2);
    }

    #[test]
    fn test_fake_always_fails() {
        let reasoner = FakeReasoner::always_fails(ReasonerError::Timeout(5));
        let err = reasoner.complete("anything").unwrap_err();
        assert!(matches!(err, ReasonerError::Timeout(5)));
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_fake_scripted_sequence() {
        let reasoner = FakeReasoner::new(vec![
            Ok(ReasonerReply {
                answer: "first".to_string(),
                token_count: 1,
                model: "fake-model".to_string(),
            }),
            Err(ReasonerError::Http("boom".to_string())),
        ]);

        assert_eq!(reasoner.complete("q").unwrap().answer, "first");
        assert!(reasoner.complete("q").is_err());
        assert_eq!(reasoner.call_count(), 2);
    }

    #[test]
    fn test_disabled_config_rejects_calls() {
        let config = ReasonerConfig {
            enabled: false,
            ..ReasonerConfig::default()
        };
        let reasoner = HttpReasoner::new(&config).unwrap();
        assert!(matches!(reasoner.complete("q"), Err(ReasonerError::Disabled)));
    }
}
