//! SupportMax Core - decision and retrieval engine for the support agent
//!
//! Composes four synchronous components: the query classifier, the FAQ
//! knowledge store, the decision policy, and the ticket log, plus a narrow
//! client boundary to the external reasoner used for escalation.
//! The HTTP surface and chat UI live elsewhere; this crate is the part
//! with invariants worth testing.

pub mod agent;
pub mod classifier;
pub mod config;
pub mod knowledge;
pub mod policy;
pub mod reasoner;
pub mod ticket_log;
pub mod tools;

pub use agent::{AgentMetrics, AgentResponse, SupportAgent};
pub use classifier::{InvalidQuery, QueryClassifier, QuerySignals};
pub use config::SupportConfig;
pub use knowledge::{KnowledgeEntry, KnowledgeStore, SearchHit};
pub use policy::{ActionType, Decision, DecisionPolicy, DecisionSource, TicketCategory};
pub use reasoner::{ExternalReasoner, FakeReasoner, HttpReasoner, ReasonerError, ReasonerReply};
pub use ticket_log::{
    PersistError, Ticket, TicketLog, TicketPriority, TicketStats, TicketStatus, TicketUpdate,
};
pub use tools::{ToolOutcome, ToolRequest, ToolRunner};
