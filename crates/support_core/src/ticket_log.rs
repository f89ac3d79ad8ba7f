//! Support Ticket Log
//!
//! Append-only ticket collection with JSON persistence. Every mutation
//! rewrites the backing file atomically (temp file + rename) before
//! returning, so a ticket returned by `create` is durable immediately.
//!
//! The in-memory vec plus the backing file is the only shared mutable
//! state in the core; a single mutex per log instance guards both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Ticket priority levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    Low,
    Normal,
    High,
    Urgent,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

/// Ticket lifecycle status. Closed tickets may be reopened by an explicit
/// update; there are no hidden transition restrictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Open,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

/// A durable support-request record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Generated identifier, assigned at creation and never reused
    pub id: String,
    /// Original user query text
    pub query: String,
    pub user_id: String,
    pub category: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    /// Set only when a ticket is resolved/closed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

/// Partial field set for `TicketLog::update`. Unset fields are untouched;
/// the identifier and created_at are immutable post-creation.
#[derive(Debug, Clone, Default)]
pub struct TicketUpdate {
    pub query: Option<String>,
    pub user_id: Option<String>,
    pub category: Option<String>,
    pub priority: Option<TicketPriority>,
    pub status: Option<TicketStatus>,
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    pub resolution: Option<String>,
}

/// Aggregate ticket statistics, computed fresh on every call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketStats {
    pub total_tickets: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_priority: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
}

/// Persistence failure on create/update. Never recovered silently:
/// dropping a ticket write is a correctness violation.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("Failed to serialize ticket log: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write ticket log {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Durable ticket collection backed by a JSON file
pub struct TicketLog {
    path: PathBuf,
    tickets: Mutex<Vec<Ticket>>,
}

impl TicketLog {
    /// Open a ticket log, loading any previously persisted tickets.
    ///
    /// A missing or corrupt file is not fatal: the log starts empty and a
    /// warning is logged.
    pub fn open(path: &Path) -> Self {
        let tickets = match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Vec<Ticket>>(&contents) {
                Ok(tickets) => tickets,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Ticket log is corrupt, starting with empty collection"
                    );
                    Vec::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Cannot read ticket log, starting with empty collection"
                );
                Vec::new()
            }
        };

        Self {
            path: path.to_path_buf(),
            tickets: Mutex::new(tickets),
        }
    }

    /// Create a new ticket, persist it, and return the stored record.
    pub fn create(
        &self,
        query: &str,
        user_id: &str,
        category: &str,
        priority: TicketPriority,
        metadata: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> Result<Ticket, PersistError> {
        let mut tickets = self.tickets.lock().unwrap();

        let now = Utc::now();
        let ticket = Ticket {
            id: generate_ticket_id(&tickets),
            query: query.to_string(),
            user_id: user_id.to_string(),
            category: category.to_string(),
            priority,
            status: TicketStatus::Open,
            created_at: now,
            updated_at: now,
            metadata,
            resolution: None,
        };

        tickets.push(ticket.clone());
        if let Err(e) = self.persist(&tickets) {
            // Roll back the in-memory append so memory and disk stay in sync
            tickets.pop();
            return Err(e);
        }

        tracing::info!(ticket_id = %ticket.id, category = %ticket.category, "Ticket created");
        Ok(ticket)
    }

    /// Merge the given fields into a stored ticket and persist.
    ///
    /// Returns `Ok(None)` for an unknown id.
    pub fn update(&self, id: &str, update: TicketUpdate) -> Result<Option<Ticket>, PersistError> {
        let mut tickets = self.tickets.lock().unwrap();

        let Some(index) = tickets.iter().position(|t| t.id == id) else {
            return Ok(None);
        };

        let previous = tickets[index].clone();
        let ticket = &mut tickets[index];
        if let Some(query) = update.query {
            ticket.query = query;
        }
        if let Some(user_id) = update.user_id {
            ticket.user_id = user_id;
        }
        if let Some(category) = update.category {
            ticket.category = category;
        }
        if let Some(priority) = update.priority {
            ticket.priority = priority;
        }
        if let Some(status) = update.status {
            ticket.status = status;
        }
        if let Some(metadata) = update.metadata {
            ticket.metadata = Some(metadata);
        }
        if let Some(resolution) = update.resolution {
            ticket.resolution = Some(resolution);
        }
        ticket.updated_at = Utc::now();

        let updated = ticket.clone();
        if let Err(e) = self.persist(&tickets) {
            tickets[index] = previous;
            return Err(e);
        }

        Ok(Some(updated))
    }

    /// Look up a ticket by id. Unknown ids are not an error.
    pub fn get_ticket(&self, id: &str) -> Option<Ticket> {
        let tickets = self.tickets.lock().unwrap();
        tickets.iter().find(|t| t.id == id).cloned()
    }

    /// All tickets in creation order
    pub fn get_all(&self) -> Vec<Ticket> {
        self.tickets.lock().unwrap().clone()
    }

    pub fn get_tickets_by_user(&self, user_id: &str) -> Vec<Ticket> {
        let tickets = self.tickets.lock().unwrap();
        tickets.iter().filter(|t| t.user_id == user_id).cloned().collect()
    }

    pub fn get_tickets_by_status(&self, status: TicketStatus) -> Vec<Ticket> {
        let tickets = self.tickets.lock().unwrap();
        tickets.iter().filter(|t| t.status == status).cloned().collect()
    }

    pub fn count_tickets(&self) -> usize {
        self.tickets.lock().unwrap().len()
    }

    /// Aggregate counts, recomputed from the full collection on every call.
    /// The collection is small by design, so a full scan is cheap.
    pub fn get_stats(&self) -> TicketStats {
        let tickets = self.tickets.lock().unwrap();

        let mut by_category = BTreeMap::new();
        let mut by_priority = BTreeMap::new();
        let mut by_status = BTreeMap::new();

        for ticket in tickets.iter() {
            *by_category.entry(ticket.category.clone()).or_insert(0) += 1;
            *by_priority
                .entry(ticket.priority.as_str().to_string())
                .or_insert(0) += 1;
            *by_status
                .entry(ticket.status.as_str().to_string())
                .or_insert(0) += 1;
        }

        TicketStats {
            total_tickets: tickets.len(),
            by_category,
            by_priority,
            by_status,
        }
    }

    /// Rewrite the full collection atomically: write a temp file next to
    /// the target, then rename over it.
    fn persist(&self, tickets: &[Ticket]) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| PersistError::Write {
                    path: self.path.clone(),
                    source: e,
                })?;
            }
        }

        let json = serde_json::to_string_pretty(tickets)?;

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, json).map_err(|e| PersistError::Write {
            path: temp_path.clone(),
            source: e,
        })?;
        fs::rename(&temp_path, &self.path).map_err(|e| PersistError::Write {
            path: self.path.clone(),
            source: e,
        })?;

        Ok(())
    }
}

/// Generate a fresh ticket id: `TKT-` + 64 random bits as lowercase hex.
/// Re-draws on the (negligible) chance of a collision with a loaded id.
fn generate_ticket_id(existing: &[Ticket]) -> String {
    loop {
        let id = format!("TKT-{}", hex::encode(rand::random::<u64>().to_be_bytes()));
        if !existing.iter().any(|t| t.id == id) {
            return id;
        }
    }
}
