//! Decision Policy
//!
//! Turns classifier signals plus knowledge-store results into exactly one
//! of five actions. The evaluation order is a deliberate precedence policy:
//! reject → greet → answer from knowledge → create ticket → escalate.

use crate::classifier::{InvalidQuery, QuerySignals};
use crate::knowledge::SearchHit;
use crate::ticket_log::TicketPriority;
use serde::{Deserialize, Serialize};

/// Phrases that bump a ticket straight to urgent priority
pub const URGENCY_KEYWORDS: &[&str] = &["urgent", "asap", "emergency", "immediately", "critical"];

/// Canned reply when escalation is unavailable or the reasoner fails
pub const FALLBACK_RESPONSE: &str =
    "I'm not sure about that. Would you like to create a support ticket?";

/// Confidence attached to the ticket-creation heuristic
const TICKET_CONFIDENCE: f32 = 0.8;
/// Confidence attached to an escalation decision
const ESCALATION_CONFIDENCE: f32 = 0.7;
/// Smoothing constant for scaling relevance scores into [0, 1)
const CONFIDENCE_SMOOTHING: f32 = 2.0;

/// The five possible outcomes of a decision cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    AnswerFromKnowledge,
    EscalateToExternalReasoner,
    CreateTicket,
    Greet,
    RejectInvalid,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AnswerFromKnowledge => "answer_from_knowledge",
            Self::EscalateToExternalReasoner => "escalate_to_external_reasoner",
            Self::CreateTicket => "create_ticket",
            Self::Greet => "greet",
            Self::RejectInvalid => "reject_invalid",
        }
    }
}

/// Where the decision content came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    KnowledgeBase,
    ExternalReasoner,
    Heuristic,
}

impl DecisionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KnowledgeBase => "knowledge_base",
            Self::ExternalReasoner => "external_reasoner",
            Self::Heuristic => "heuristic",
        }
    }
}

/// Ticket category derived from signals, fixed precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketCategory {
    Billing,
    Account,
    Technical,
    General,
}

impl TicketCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Billing => "billing",
            Self::Account => "account",
            Self::Technical => "technical",
            Self::General => "general",
        }
    }
}

/// One decision per query. Ephemeral; content stays `None` on the
/// escalation path until the reasoner has actually answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: ActionType,
    pub content: Option<String>,
    /// In [0, 1]
    pub confidence: f32,
    pub source: DecisionSource,
    /// Set only for ticket actions
    pub category: Option<TicketCategory>,
    /// Set only for ticket actions
    pub priority: Option<TicketPriority>,
}

impl Decision {
    fn new(action: ActionType, confidence: f32, source: DecisionSource) -> Self {
        Self {
            action,
            content: None,
            confidence,
            source,
            category: None,
            priority: None,
        }
    }
}

/// Decision engine. Holds only the knowledge-answer threshold; everything
/// else is fixed precedence.
pub struct DecisionPolicy {
    min_score: u32,
}

impl DecisionPolicy {
    pub fn new(min_score: u32) -> Self {
        Self { min_score }
    }

    /// Decide the action for one query. First match wins.
    pub fn decide(
        &self,
        signals: &QuerySignals,
        validation: &Result<(), InvalidQuery>,
        hits: &[SearchHit],
    ) -> Decision {
        // 1. Invalid input is rejected before anything else
        if let Err(reason) = validation {
            let mut decision = Decision::new(ActionType::RejectInvalid, 0.0, DecisionSource::Heuristic);
            decision.content = Some(reason.to_string());
            return decision;
        }

        // 2. Pure greetings short-circuit the pipeline
        if signals.is_greeting && !signals.is_question {
            return Decision::new(ActionType::Greet, 1.0, DecisionSource::Heuristic);
        }

        // 3. A confident knowledge match answers directly
        if let Some(top) = hits.first() {
            if top.score >= self.min_score {
                let mut decision = Decision::new(
                    ActionType::AnswerFromKnowledge,
                    scale_confidence(top.score),
                    DecisionSource::KnowledgeBase,
                );
                decision.content = Some(top.entry.answer.clone());
                return decision;
            }
        }

        // 4. Technical issues and complaints become tickets
        if signals.mentions_technical || signals.is_complaint {
            let mut decision =
                Decision::new(ActionType::CreateTicket, TICKET_CONFIDENCE, DecisionSource::Heuristic);
            decision.category = Some(determine_category(signals));
            decision.priority = Some(determine_priority(signals));
            return decision;
        }

        // 5. Everything else goes to the external reasoner
        Decision::new(
            ActionType::EscalateToExternalReasoner,
            ESCALATION_CONFIDENCE,
            DecisionSource::Heuristic,
        )
    }
}

/// Map a relevance score into [0, 1), monotonic in the score
fn scale_confidence(score: u32) -> f32 {
    let score = score as f32;
    score / (score + CONFIDENCE_SMOOTHING)
}

/// Ticket category from signals. Billing is checked before account before
/// technical; a query matching several always resolves to the first.
pub fn determine_category(signals: &QuerySignals) -> TicketCategory {
    if signals.mentions_billing {
        TicketCategory::Billing
    } else if signals.mentions_account {
        TicketCategory::Account
    } else if signals.mentions_technical {
        TicketCategory::Technical
    } else {
        TicketCategory::General
    }
}

/// Ticket priority from signals. Urgency keywords win over complaints.
pub fn determine_priority(signals: &QuerySignals) -> TicketPriority {
    let lowered = signals.cleaned_query.to_lowercase();
    if URGENCY_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        TicketPriority::Urgent
    } else if signals.is_complaint {
        TicketPriority::High
    } else {
        TicketPriority::Normal
    }
}
