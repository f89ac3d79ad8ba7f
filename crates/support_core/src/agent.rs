//! Support Agent
//!
//! The caller-facing composition: Classify → Retrieve → Decide →
//! (TicketLog | ExternalReasoner) → formatted response. One bounded
//! synchronous computation per query; safe to share across request
//! threads. Only a persistence failure on the ticket path propagates as
//! an error — everything else is a structured response.

use crate::classifier::QueryClassifier;
use crate::config::SupportConfig;
use crate::knowledge::KnowledgeStore;
use crate::policy::{ActionType, DecisionPolicy, DecisionSource, FALLBACK_RESPONSE};
use crate::reasoner::{ExternalReasoner, HttpReasoner};
use crate::ticket_log::{PersistError, TicketLog, TicketPriority};
use crate::tools::{ToolOutcome, ToolRequest, ToolRunner};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Instant;

/// Canned greeting reply
const GREETING_RESPONSE: &str = "Hello! How can I help you today?";

/// Structured result of one query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    pub response_text: String,
    pub action_taken: ActionType,
    /// Open mapping for dashboards and clients: source, confidence,
    /// latency_ms, plus action-specific keys (ticket_id, relevance_score,
    /// tokens_used, model)
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Operational counters, one set per agent instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentMetrics {
    pub total_queries: u64,
    pub greetings: u64,
    pub answered_from_knowledge: u64,
    pub tickets_created: u64,
    pub escalations: u64,
    pub rejected: u64,
    /// Tokens reported by the external reasoner across all escalations
    pub reasoner_tokens: u64,
}

/// The composed support agent
pub struct SupportAgent {
    classifier: QueryClassifier,
    knowledge: KnowledgeStore,
    tickets: TicketLog,
    policy: DecisionPolicy,
    reasoner: Box<dyn ExternalReasoner>,
    max_results: usize,
    metrics: Mutex<AgentMetrics>,
}

impl SupportAgent {
    /// Build an agent from configuration with the real HTTP reasoner.
    pub fn from_config(config: &SupportConfig) -> Result<Self> {
        let reasoner = HttpReasoner::new(&config.reasoner)?;
        Ok(Self::new(
            config,
            KnowledgeStore::load(&config.knowledge.path),
            TicketLog::open(&config.tickets.path),
            Box::new(reasoner),
        ))
    }

    /// Build an agent from pre-constructed parts (tests inject stores and
    /// a fake reasoner here).
    pub fn new(
        config: &SupportConfig,
        knowledge: KnowledgeStore,
        tickets: TicketLog,
        reasoner: Box<dyn ExternalReasoner>,
    ) -> Self {
        Self {
            classifier: QueryClassifier::new(config.limits.max_query_len),
            knowledge,
            tickets,
            policy: DecisionPolicy::new(config.limits.min_score),
            reasoner,
            max_results: config.limits.max_results,
            metrics: Mutex::new(AgentMetrics::default()),
        }
    }

    /// Handle one query end to end.
    pub fn handle_query(&self, raw_text: &str, user_id: &str) -> Result<AgentResponse, PersistError> {
        let started = Instant::now();

        let signals = self.classifier.parse(raw_text, user_id);
        let validation = self.classifier.validate(&signals);
        let hits = self.knowledge.search(&signals.cleaned_query, self.max_results);
        let decision = self.policy.decide(&signals, &validation, &hits);

        let mut metadata = serde_json::Map::new();
        metadata.insert("confidence".to_string(), serde_json::json!(decision.confidence));

        let mut source = decision.source;
        let response_text = match decision.action {
            ActionType::RejectInvalid => decision
                .content
                .unwrap_or_else(|| "Invalid query".to_string()),

            ActionType::Greet => GREETING_RESPONSE.to_string(),

            ActionType::AnswerFromKnowledge => {
                if let Some(top) = hits.first() {
                    metadata.insert("faq_id".to_string(), serde_json::json!(top.entry.id));
                    metadata.insert("relevance_score".to_string(), serde_json::json!(top.score));
                }
                decision.content.unwrap_or_default()
            }

            ActionType::CreateTicket => {
                let category = decision
                    .category
                    .map(|c| c.as_str().to_string())
                    .unwrap_or_else(|| "general".to_string());
                let priority = decision.priority.unwrap_or(TicketPriority::Normal);

                let runner = ToolRunner::new(&self.knowledge, &self.tickets);
                let outcome = runner.run(ToolRequest::CreateTicket {
                    query: signals.cleaned_query.clone(),
                    user_id: user_id.to_string(),
                    category: category.clone(),
                    priority,
                })?;
                let ToolOutcome::TicketCreated(ticket) = outcome else {
                    unreachable!("CreateTicket request always yields TicketCreated");
                };

                metadata.insert("ticket_id".to_string(), serde_json::json!(ticket.id));
                metadata.insert("category".to_string(), serde_json::json!(category));
                metadata.insert("priority".to_string(), serde_json::json!(priority.as_str()));

                format!(
                    "I've created support ticket {} for you. Our team will follow up shortly.",
                    ticket.id
                )
            }

            ActionType::EscalateToExternalReasoner => match self.reasoner.complete(&signals.cleaned_query) {
                Ok(reply) => {
                    source = DecisionSource::ExternalReasoner;
                    metadata.insert("tokens_used".to_string(), serde_json::json!(reply.token_count));
                    metadata.insert("model".to_string(), serde_json::json!(reply.model));
                    self.metrics.lock().unwrap().reasoner_tokens += reply.token_count as u64;
                    reply.answer
                }
                Err(e) => {
                    tracing::warn!(error = %e, "External reasoner failed, using fallback response");
                    FALLBACK_RESPONSE.to_string()
                }
            },
        };

        metadata.insert("source".to_string(), serde_json::json!(source.as_str()));
        metadata.insert(
            "latency_ms".to_string(),
            serde_json::json!(started.elapsed().as_millis() as u64),
        );

        {
            let mut metrics = self.metrics.lock().unwrap();
            metrics.total_queries += 1;
            match decision.action {
                ActionType::RejectInvalid => metrics.rejected += 1,
                ActionType::Greet => metrics.greetings += 1,
                ActionType::AnswerFromKnowledge => metrics.answered_from_knowledge += 1,
                ActionType::CreateTicket => metrics.tickets_created += 1,
                ActionType::EscalateToExternalReasoner => metrics.escalations += 1,
            }
        }

        Ok(AgentResponse {
            response_text,
            action_taken: decision.action,
            metadata,
        })
    }

    /// Read-only access for dashboards and the CLI
    pub fn knowledge(&self) -> &KnowledgeStore {
        &self.knowledge
    }

    pub fn tickets(&self) -> &TicketLog {
        &self.tickets
    }

    /// Snapshot of the operational counters
    pub fn get_metrics(&self) -> AgentMetrics {
        self.metrics.lock().unwrap().clone()
    }

    pub fn reset_metrics(&self) {
        *self.metrics.lock().unwrap() = AgentMetrics::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::KnowledgeEntry;
    use crate::reasoner::{FakeReasoner, ReasonerError};

    fn test_agent(reasoner: FakeReasoner) -> (tempfile::TempDir, SupportAgent) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SupportConfig::default();
        config.tickets.path = dir.path().join("tickets.json");

        let knowledge = KnowledgeStore::from_entries(vec![KnowledgeEntry {
            id: "faq_001".to_string(),
            question: "How do I reset my password?".to_string(),
            answer: "Go to settings > reset password.".to_string(),
            category: "account".to_string(),
        }]);
        let tickets = TicketLog::open(&config.tickets.path);

        let agent = SupportAgent::new(&config, knowledge, tickets, Box::new(reasoner));
        (dir, agent)
    }

    #[test]
    fn test_metrics_start_at_zero() {
        let (_dir, agent) = test_agent(FakeReasoner::always_answers("x"));
        assert_eq!(agent.get_metrics(), AgentMetrics::default());
    }

    #[test]
    fn test_greeting_path() {
        let (_dir, agent) = test_agent(FakeReasoner::always_answers("x"));

        let response = agent.handle_query("Hello", "user123").unwrap();
        assert_eq!(response.action_taken, ActionType::Greet);
        assert!(response.response_text.contains("help"));
        assert_eq!(response.metadata["source"], "heuristic");

        let metrics = agent.get_metrics();
        assert_eq!(metrics.total_queries, 1);
        assert_eq!(metrics.greetings, 1);
    }

    #[test]
    fn test_knowledge_answer_path() {
        let (_dir, agent) = test_agent(FakeReasoner::always_answers("x"));

        let response = agent.handle_query("How do I reset my password?", "user123").unwrap();
        assert_eq!(response.action_taken, ActionType::AnswerFromKnowledge);
        assert!(response.response_text.contains("reset password"));
        assert_eq!(response.metadata["source"], "knowledge_base");
        assert_eq!(response.metadata["faq_id"], "faq_001");
        assert!(response.metadata["relevance_score"].as_u64().unwrap() > 0);
        assert_eq!(agent.get_metrics().answered_from_knowledge, 1);
    }

    #[test]
    fn test_ticket_path_persists_and_reports_id() {
        let (_dir, agent) = test_agent(FakeReasoner::always_answers("x"));

        let response = agent
            .handle_query("My sync is broken and this is urgent", "user123")
            .unwrap();
        assert_eq!(response.action_taken, ActionType::CreateTicket);

        let ticket_id = response.metadata["ticket_id"].as_str().unwrap();
        assert!(response.response_text.contains(ticket_id));
        assert_eq!(response.metadata["category"], "technical");
        assert_eq!(response.metadata["priority"], "urgent");

        let ticket = agent.tickets().get_ticket(ticket_id).unwrap();
        assert_eq!(ticket.user_id, "user123");
        assert_eq!(agent.get_metrics().tickets_created, 1);
    }

    #[test]
    fn test_escalation_success() {
        let (_dir, agent) = test_agent(FakeReasoner::always_answers("The roadmap is public."));

        let response = agent.handle_query("Tell me about your roadmap", "user123").unwrap();
        assert_eq!(response.action_taken, ActionType::EscalateToExternalReasoner);
        assert_eq!(response.response_text, "The roadmap is public.");
        assert_eq!(response.metadata["source"], "external_reasoner");
        assert_eq!(response.metadata["tokens_used"], 42);

        let metrics = agent.get_metrics();
        assert_eq!(metrics.escalations, 1);
        assert_eq!(metrics.reasoner_tokens, 42);
    }

    #[test]
    fn test_escalation_failure_degrades_to_fallback() {
        let (_dir, agent) = test_agent(FakeReasoner::always_fails(ReasonerError::Timeout(5)));

        let response = agent.handle_query("Tell me about your roadmap", "user123").unwrap();
        assert_eq!(response.action_taken, ActionType::EscalateToExternalReasoner);
        assert_eq!(response.response_text, FALLBACK_RESPONSE);
        // Fallback content is heuristic, not reasoner output
        assert_eq!(response.metadata["source"], "heuristic");
    }

    #[test]
    fn test_reject_paths() {
        let (_dir, agent) = test_agent(FakeReasoner::always_answers("x"));

        let response = agent.handle_query("", "user123").unwrap();
        assert_eq!(response.action_taken, ActionType::RejectInvalid);
        assert!(response.response_text.to_lowercase().contains("empty"));

        let response = agent.handle_query(&"a".repeat(1001), "user123").unwrap();
        assert_eq!(response.action_taken, ActionType::RejectInvalid);
        assert!(response.response_text.to_lowercase().contains("too long"));

        assert_eq!(agent.get_metrics().rejected, 2);
    }

    #[test]
    fn test_reset_metrics() {
        let (_dir, agent) = test_agent(FakeReasoner::always_answers("x"));
        agent.handle_query("Hello", "user123").unwrap();
        assert_ne!(agent.get_metrics(), AgentMetrics::default());

        agent.reset_metrics();
        assert_eq!(agent.get_metrics(), AgentMetrics::default());
    }

    #[test]
    fn test_latency_recorded() {
        let (_dir, agent) = test_agent(FakeReasoner::always_answers("x"));
        let response = agent.handle_query("Hello", "user123").unwrap();
        assert!(response.metadata.contains_key("latency_ms"));
    }
}
