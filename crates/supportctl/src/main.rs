//! SupportMax Control - CLI for the support agent core
//!
//! Runs the agent locally against the configured stores: ask one-shot
//! questions, inspect FAQs and tickets, and read operational stats.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use support_core::{
    SupportAgent, SupportConfig, TicketStatus, ToolRequest, ToolRunner,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "supportctl")]
#[command(about = "SupportMax - support agent control tool", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = "support.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the agent one question
    Ask {
        /// The question text
        query: String,

        /// User identifier attached to the query
        #[arg(long, default_value = "cli")]
        user: String,
    },

    /// Search the FAQ store directly
    Search {
        /// Search query
        query: String,

        /// Maximum results
        #[arg(long, default_value_t = 3)]
        top: usize,
    },

    /// Show ticket statistics
    Stats,

    /// List tickets
    Tickets {
        /// Only tickets from this user
        #[arg(long)]
        user: Option<String>,

        /// Only tickets with this status (open/closed)
        #[arg(long)]
        status: Option<String>,
    },

    /// Show one ticket by id
    Ticket {
        /// Ticket id (TKT-...)
        id: String,
    },

    /// List knowledge base categories
    Categories,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = SupportConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    let agent = SupportAgent::from_config(&config)?;

    match cli.command {
        Commands::Ask { query, user } => {
            let response = agent
                .handle_query(&query, &user)
                .context("Query handling failed")?;

            println!("{}", response.response_text);
            println!();
            println!(
                "{} {}",
                "action:".dimmed(),
                response.action_taken.as_str().cyan()
            );
            for key in ["source", "confidence", "ticket_id", "latency_ms"] {
                if let Some(value) = response.metadata.get(key) {
                    println!("{} {}", format!("{key}:").dimmed(), value);
                }
            }
        }

        Commands::Search { query, top } => {
            let runner = ToolRunner::new(agent.knowledge(), agent.tickets());
            let outcome = runner.run(ToolRequest::SearchKnowledge { query, top_k: top })?;
            println!("{}", outcome.summary());
        }

        Commands::Stats => {
            let stats = agent.tickets().get_stats();
            println!("{} {}", "Total tickets:".bold(), stats.total_tickets);
            print_counts("By category", &stats.by_category);
            print_counts("By priority", &stats.by_priority);
            print_counts("By status", &stats.by_status);
        }

        Commands::Tickets { user, status } => {
            let tickets = match (user, status) {
                (Some(user), _) => agent.tickets().get_tickets_by_user(&user),
                (None, Some(status)) => {
                    let status = parse_status(&status)?;
                    agent.tickets().get_tickets_by_status(status)
                }
                (None, None) => agent.tickets().get_all(),
            };

            if tickets.is_empty() {
                println!("No tickets found.");
            }
            for ticket in tickets {
                println!(
                    "{}  {}  {}  {}  {}",
                    ticket.id.cyan(),
                    ticket.status.as_str(),
                    ticket.priority.as_str(),
                    ticket.category,
                    ticket.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }

        Commands::Ticket { id } => {
            let runner = ToolRunner::new(agent.knowledge(), agent.tickets());
            let outcome = runner.run(ToolRequest::CheckTicketStatus { reference: id })?;
            println!("{}", outcome.summary());
        }

        Commands::Categories => {
            for category in agent.knowledge().get_categories() {
                println!("{category}");
            }
        }
    }

    Ok(())
}

fn print_counts(label: &str, counts: &std::collections::BTreeMap<String, usize>) {
    println!("{}", format!("{label}:").bold());
    for (key, count) in counts {
        println!("  {key}: {count}");
    }
}

fn parse_status(s: &str) -> Result<TicketStatus> {
    match s.to_lowercase().as_str() {
        "open" => Ok(TicketStatus::Open),
        "closed" => Ok(TicketStatus::Closed),
        other => anyhow::bail!("Unknown status '{other}' (expected open or closed)"),
    }
}
