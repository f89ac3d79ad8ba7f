//! End-to-end flows through the composed agent: precedence between the
//! five actions, persistence across restarts, and reasoner degradation.

use support_core::{
    ActionType, AgentMetrics, FakeReasoner, KnowledgeEntry, KnowledgeStore, ReasonerError,
    SupportAgent, SupportConfig, TicketLog, TicketStatus,
};

fn sample_entries() -> Vec<KnowledgeEntry> {
    vec![
        KnowledgeEntry {
            id: "faq_001".to_string(),
            question: "How do I reset my password?".to_string(),
            answer: "Go to settings > reset password.".to_string(),
            category: "account".to_string(),
        },
        KnowledgeEntry {
            id: "faq_002".to_string(),
            question: "How do I update my billing information?".to_string(),
            answer: "Open the billing page and edit your payment method.".to_string(),
            category: "billing".to_string(),
        },
        KnowledgeEntry {
            id: "faq_003".to_string(),
            question: "What are your support hours?".to_string(),
            answer: "Support is available 24/7.".to_string(),
            category: "general".to_string(),
        },
    ]
}

fn agent_with(
    dir: &tempfile::TempDir,
    entries: Vec<KnowledgeEntry>,
    reasoner: FakeReasoner,
) -> SupportAgent {
    let mut config = SupportConfig::default();
    config.tickets.path = dir.path().join("tickets.json");

    SupportAgent::new(
        &config,
        KnowledgeStore::from_entries(entries),
        TicketLog::open(&config.tickets.path),
        Box::new(reasoner),
    )
}

#[test]
fn every_query_yields_exactly_one_of_five_actions() {
    let dir = tempfile::tempdir().unwrap();
    let agent = agent_with(&dir, sample_entries(), FakeReasoner::always_answers("ok"));

    let cases = [
        "",
        "Hello there",
        "How do I reset my password?",
        "The app is broken",
        "Tell me something else entirely",
        "¿?",
        "hello hello hello",
    ];

    for query in cases {
        let response = agent.handle_query(query, "user1").unwrap();
        assert!(matches!(
            response.action_taken,
            ActionType::RejectInvalid
                | ActionType::Greet
                | ActionType::AnswerFromKnowledge
                | ActionType::CreateTicket
                | ActionType::EscalateToExternalReasoner
        ));
    }
}

#[test]
fn precedence_reject_beats_greeting() {
    let dir = tempfile::tempdir().unwrap();
    let agent = agent_with(&dir, sample_entries(), FakeReasoner::always_answers("ok"));

    // A greeting stretched past the length limit must still be rejected
    let long_greeting = format!("Hello {}", "a ".repeat(600));
    let response = agent.handle_query(&long_greeting, "user1").unwrap();
    assert_eq!(response.action_taken, ActionType::RejectInvalid);
    assert!(response.response_text.to_lowercase().contains("too long"));
}

#[test]
fn precedence_knowledge_beats_ticket() {
    let dir = tempfile::tempdir().unwrap();
    let agent = agent_with(&dir, sample_entries(), FakeReasoner::always_answers("ok"));

    // Mentions a technical term but matches the FAQ strongly; the
    // knowledge answer wins over ticket creation
    let response = agent
        .handle_query("How do I reset my password after an error?", "user1")
        .unwrap();
    assert_eq!(response.action_taken, ActionType::AnswerFromKnowledge);
    assert_eq!(agent.tickets().count_tickets(), 0);
}

#[test]
fn multi_category_complaint_creates_billing_urgent_ticket() {
    let dir = tempfile::tempdir().unwrap();
    // Empty knowledge store: nothing to answer from
    let agent = agent_with(&dir, Vec::new(), FakeReasoner::always_answers("ok"));

    let response = agent
        .handle_query("My account is broken and billing is wrong, URGENT!!", "user42")
        .unwrap();

    assert_eq!(response.action_taken, ActionType::CreateTicket);
    assert_eq!(response.metadata["category"], "billing");
    assert_eq!(response.metadata["priority"], "urgent");

    let stats = agent.tickets().get_stats();
    assert_eq!(stats.total_tickets, 1);
    assert_eq!(stats.by_category["billing"], 1);
    assert_eq!(stats.by_priority["urgent"], 1);
    assert_eq!(stats.by_status["open"], 1);
}

#[test]
fn tickets_survive_agent_restart() {
    let dir = tempfile::tempdir().unwrap();
    let ticket_id = {
        let agent = agent_with(&dir, Vec::new(), FakeReasoner::always_answers("ok"));
        let response = agent.handle_query("Everything is broken", "user1").unwrap();
        assert_eq!(response.action_taken, ActionType::CreateTicket);
        response.metadata["ticket_id"].as_str().unwrap().to_string()
    };

    // A fresh agent over the same ticket file sees the ticket
    let agent = agent_with(&dir, Vec::new(), FakeReasoner::always_answers("ok"));
    let ticket = agent.tickets().get_ticket(&ticket_id).unwrap();
    assert_eq!(ticket.status, TicketStatus::Open);
    assert_eq!(ticket.user_id, "user1");
}

#[test]
fn reasoner_outage_never_reaches_the_user() {
    let dir = tempfile::tempdir().unwrap();
    let agent = agent_with(
        &dir,
        sample_entries(),
        FakeReasoner::always_fails(ReasonerError::Http("connection refused".to_string())),
    );

    let response = agent.handle_query("Do you integrate with calendars", "user1").unwrap();
    assert_eq!(response.action_taken, ActionType::EscalateToExternalReasoner);
    assert!(response.response_text.contains("support ticket"));
    assert_eq!(response.metadata["source"], "heuristic");
}

#[test]
fn scripted_reasoner_sequence_degrades_midway() {
    let dir = tempfile::tempdir().unwrap();
    let reasoner = FakeReasoner::new(vec![
        Ok(support_core::ReasonerReply {
            answer: "Yes, via the integrations page.".to_string(),
            token_count: 17,
            model: "fake-model".to_string(),
        }),
        Err(ReasonerError::Timeout(5)),
    ]);
    let agent = agent_with(&dir, Vec::new(), reasoner);

    let first = agent.handle_query("Do you integrate with calendars", "user1").unwrap();
    assert_eq!(first.response_text, "Yes, via the integrations page.");
    assert_eq!(first.metadata["source"], "external_reasoner");

    let second = agent.handle_query("And with spreadsheets", "user1").unwrap();
    assert_eq!(second.metadata["source"], "heuristic");

    let metrics = agent.get_metrics();
    assert_eq!(metrics.escalations, 2);
    assert_eq!(metrics.reasoner_tokens, 17);
}

#[test]
fn metrics_accumulate_across_mixed_traffic() {
    let dir = tempfile::tempdir().unwrap();
    let agent = agent_with(&dir, sample_entries(), FakeReasoner::always_answers("ok"));

    agent.handle_query("Hello", "u1").unwrap();
    agent.handle_query("How do I reset my password?", "u1").unwrap();
    agent.handle_query("The sync feature is broken", "u2").unwrap();
    agent.handle_query("", "u3").unwrap();

    let metrics = agent.get_metrics();
    assert_eq!(
        metrics,
        AgentMetrics {
            total_queries: 4,
            greetings: 1,
            answered_from_knowledge: 1,
            tickets_created: 1,
            escalations: 0,
            rejected: 1,
            reasoner_tokens: 0,
        }
    );
}
