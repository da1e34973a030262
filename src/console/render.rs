use crate::agent::{AgentError, AgentRole, ConverseReply};
use crate::cli_style::{
    box_chars, colors, print_error, print_help, print_info, print_list_item_styled, print_warning,
    CommandHelp,
};
use crossterm::style::Stylize;

pub const SESSION_COMMANDS: &[CommandHelp] = &[
    CommandHelp {
        name: "/agent",
        args: "<triage|analytics>",
        description: "Switch agent and start a new conversation",
    },
    CommandHelp {
        name: "/new",
        args: "",
        description: "Start a new conversation with the current agent",
    },
    CommandHelp {
        name: "/help",
        args: "",
        description: "Show this help",
    },
    CommandHelp {
        name: "/exit",
        args: "",
        description: "Leave the console (also /quit)",
    },
];

/// Summary of the hosted tools the agent called, if any.
pub fn tool_call_summary(tool_calls: &[String]) -> Option<String> {
    if tool_calls.is_empty() {
        return None;
    }
    Some(format!("tools: {}", tool_calls.join(" → ")))
}

/// User-facing text for a failed agent call.
pub fn describe_error(err: &AgentError) -> String {
    match err {
        AgentError::Unauthorized { status, .. } => format!(
            "The agent host rejected the credentials (HTTP {}). Check ELASTIC_AGENT_API_KEY.",
            status
        ),
        AgentError::Timeout => {
            "The agent did not answer in time. Try again or raise agents.timeout_secs.".to_string()
        }
        AgentError::RateLimited => "The agent host is rate limiting requests.".to_string(),
        AgentError::Api { status: 404, .. } => {
            "Agent not found. Publish it first with `incident-agents publish`.".to_string()
        }
        other => other.to_string(),
    }
}

pub fn print_reply(role: AgentRole, reply: &ConverseReply) {
    println!();
    if let Some(summary) = tool_call_summary(&reply.tool_calls) {
        print_list_item_styled(&summary, colors::DIM, 1);
    }
    println!(
        "  {} {}",
        box_chars::DIAMOND.with(colors::AMBER),
        role.as_str().with(colors::AMBER).bold()
    );
    if reply.message.is_empty() {
        print_warning("The agent returned an empty reply.");
    } else {
        for line in reply.message.lines() {
            println!("    {}", line);
        }
    }
    println!();
}

pub fn print_agent_error(err: &AgentError) {
    print_error(&describe_error(err));
}

pub fn print_switched(role: AgentRole, agent_id: &str) {
    print_info(&format!("Now talking to the {} agent ({}).", role, agent_id));
}

pub fn print_session_help() {
    print_help(SESSION_COMMANDS);
}
