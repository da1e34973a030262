//! End-to-end console and agent provisioning tests against a fake agent host

mod common;

use common::*;
use oilfield_incident_intel::agent::{
    default_agents, AgentBuilderClient, AgentError, AgentRole, AgentSettings, PublishOutcome,
};
use oilfield_incident_intel::console::render::describe_error;
use oilfield_incident_intel::console::{ConsoleSession, SessionEvent};
use std::sync::Arc;
use std::time::Duration;

fn agent_client(host: &FakeAgentHost, api_key: &str) -> AgentBuilderClient {
    AgentBuilderClient::new(host.base_url.clone(), api_key, Duration::from_secs(5))
        .expect("client builds")
}

fn session(host: &FakeAgentHost) -> ConsoleSession {
    ConsoleSession::new(
        Arc::new(agent_client(host, TEST_API_KEY)),
        AgentSettings::default(),
    )
}

#[tokio::test]
async fn test_text_is_forwarded_exactly_as_typed() {
    let host = FakeAgentHost::spawn().await;
    let mut session = session(&host);

    let line = "  Pump P-12: vibration 145 Hz, temp 92°C, \"critical\"?  ";
    let event = session.handle_line(line).await;

    match event {
        SessionEvent::Reply(reply) => {
            assert_eq!(reply.message, format!("echo: {}", line));
            assert_eq!(reply.tool_calls, vec!["platform.core.search"]);
        }
        other => panic!("expected a reply, got {:?}", other),
    }

    let requests = host.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["input"], line);
    assert_eq!(requests[0]["agent_id"], "oilfield-triage");
    assert!(requests[0].get("conversation_id").is_none());
}

#[tokio::test]
async fn test_conversation_continues_until_reset() {
    let host = FakeAgentHost::spawn().await;
    let mut session = session(&host);

    session.handle_line("first question").await;
    assert_eq!(session.conversation_id(), Some("conv-1"));
    session.handle_line("follow-up").await;

    assert!(matches!(
        session.handle_line("/new").await,
        SessionEvent::Reset
    ));
    session.handle_line("fresh start").await;

    let requests = host.requests();
    assert_eq!(requests[1]["conversation_id"], "conv-1");
    assert!(requests[2].get("conversation_id").is_none());
    assert_eq!(session.conversation_id(), Some("conv-2"));
}

#[tokio::test]
async fn test_switching_agent_targets_the_other_agent() {
    let host = FakeAgentHost::spawn().await;
    let mut session = session(&host);

    session.handle_line("triage this").await;
    assert!(matches!(
        session.handle_line("/agent analytics").await,
        SessionEvent::Switched(AgentRole::Analytics)
    ));
    session.handle_line("cost by location").await;

    let requests = host.requests();
    assert_eq!(requests[1]["agent_id"], "oilfield-analytics");
    assert!(requests[1].get("conversation_id").is_none());
    assert_eq!(session.active_role(), AgentRole::Analytics);
}

#[tokio::test]
async fn test_host_errors_are_reported_and_session_continues() {
    let host = FakeAgentHost::spawn().await;
    let mut session = session(&host);

    host.fail_with(502);
    match session.handle_line("anything").await {
        SessionEvent::Failed(AgentError::Api { status, .. }) => assert_eq!(status, 502),
        other => panic!("expected an API failure, got {:?}", other),
    }

    host.recover();
    assert!(matches!(
        session.handle_line("again").await,
        SessionEvent::Reply(_)
    ));
    assert_eq!(host.requests().len(), 2);
}

#[tokio::test]
async fn test_bad_key_is_explained() {
    let host = FakeAgentHost::spawn().await;
    let mut session = ConsoleSession::new(
        Arc::new(agent_client(&host, WRONG_API_KEY)),
        AgentSettings::default(),
    );

    match session.handle_line("hello").await {
        SessionEvent::Failed(err) => {
            assert!(matches!(err, AgentError::Unauthorized { status: 401, .. }));
            assert!(describe_error(&err).contains("ELASTIC_AGENT_API_KEY"));
        }
        other => panic!("expected an auth failure, got {:?}", other),
    }
    assert!(host.requests().is_empty());
}

#[tokio::test]
async fn test_unknown_session_command_never_reaches_agent() {
    let host = FakeAgentHost::spawn().await;
    let mut session = session(&host);

    assert!(matches!(
        session.handle_line("/agent drilling").await,
        SessionEvent::Invalid(_)
    ));
    assert!(matches!(session.handle_line("/exit").await, SessionEvent::Exit));
    assert!(host.requests().is_empty());
}

#[tokio::test]
async fn test_publish_creates_then_updates_agents() {
    let host = FakeAgentHost::spawn().await;
    let client = agent_client(&host, TEST_API_KEY);
    let agents = default_agents(&AgentSettings::default());

    for agent in &agents {
        assert_eq!(
            client.upsert_agent(agent).await.unwrap(),
            PublishOutcome::Created
        );
    }
    for agent in &agents {
        assert_eq!(
            client.upsert_agent(agent).await.unwrap(),
            PublishOutcome::Updated
        );
    }

    let triage = host.agent("oilfield-triage").unwrap();
    assert_eq!(
        triage["configuration"]["tools"][0]["tool_ids"],
        serde_json::json!(agents[0].tool_ids())
    );
    assert!(host.agent("oilfield-analytics").is_some());
    assert!(client.get_agent("missing").await.unwrap().is_none());
}
