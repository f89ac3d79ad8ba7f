//! Support Tools
//!
//! Explicit tool dispatch: one variant per tool, executed through a tagged
//! union so tool behavior is statically known and testable without any
//! orchestration framework.

use crate::knowledge::{KnowledgeStore, SearchHit};
use crate::ticket_log::{PersistError, Ticket, TicketLog, TicketPriority};

/// A tool invocation request
#[derive(Debug, Clone, PartialEq)]
pub enum ToolRequest {
    /// Search the FAQ store
    SearchKnowledge { query: String, top_k: usize },
    /// Open a support ticket
    CreateTicket {
        query: String,
        user_id: String,
        category: String,
        priority: TicketPriority,
    },
    /// Look up a ticket by id (or free text containing the id)
    CheckTicketStatus { reference: String },
}

/// Typed tool result
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Faqs(Vec<SearchHit>),
    TicketCreated(Ticket),
    TicketStatus {
        reference: String,
        ticket: Option<Ticket>,
    },
}

impl ToolOutcome {
    /// Human-readable summary suitable for a chat response
    pub fn summary(&self) -> String {
        match self {
            Self::Faqs(hits) => {
                if hits.is_empty() {
                    return "No relevant FAQ found.".to_string();
                }
                let mut out = "Found the following FAQs:\n".to_string();
                for hit in hits {
                    out.push_str(&format!("- Q: {}\n  A: {}\n", hit.entry.question, hit.entry.answer));
                }
                out
            }
            Self::TicketCreated(ticket) => format!(
                "Ticket created successfully. ID: {}. Priority: {}.",
                ticket.id,
                ticket.priority.as_str()
            ),
            Self::TicketStatus { reference, ticket } => match ticket {
                Some(t) => format!(
                    "Ticket Details:\nID: {}\nStatus: {}\nPriority: {}\nQuery: {}",
                    t.id,
                    t.status.as_str(),
                    t.priority.as_str(),
                    t.query
                ),
                None => format!("Ticket ID '{}' not found. Please double check the ID.", reference),
            },
        }
    }
}

/// Executes tool requests against the shared stores
pub struct ToolRunner<'a> {
    knowledge: &'a KnowledgeStore,
    tickets: &'a TicketLog,
}

impl<'a> ToolRunner<'a> {
    pub fn new(knowledge: &'a KnowledgeStore, tickets: &'a TicketLog) -> Self {
        Self { knowledge, tickets }
    }

    /// Run one tool request. Only ticket creation can fail (persistence).
    pub fn run(&self, request: ToolRequest) -> Result<ToolOutcome, PersistError> {
        match request {
            ToolRequest::SearchKnowledge { query, top_k } => {
                Ok(ToolOutcome::Faqs(self.knowledge.search(&query, top_k)))
            }
            ToolRequest::CreateTicket {
                query,
                user_id,
                category,
                priority,
            } => {
                let ticket = self.tickets.create(&query, &user_id, &category, priority, None)?;
                Ok(ToolOutcome::TicketCreated(ticket))
            }
            ToolRequest::CheckTicketStatus { reference } => {
                let id = extract_ticket_id(&reference);
                Ok(ToolOutcome::TicketStatus {
                    ticket: self.tickets.get_ticket(&id),
                    reference,
                })
            }
        }
    }
}

/// Pull a ticket id out of free text. Prefers an explicit `TKT-` token,
/// otherwise falls back to the last word.
fn extract_ticket_id(reference: &str) -> String {
    let trimmed = reference.trim();
    trimmed
        .split_whitespace()
        .find(|w| w.starts_with("TKT-"))
        .or_else(|| trimmed.split_whitespace().last())
        .unwrap_or(trimmed)
        .to_string()
}
