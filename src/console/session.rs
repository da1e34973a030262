//! A conversational session with one hosted agent at a time.
//!
//! User text is forwarded exactly as typed. Only lines starting with `/` are
//! interpreted locally, as session commands.

use crate::agent::{
    AgentEndpoint, AgentError, AgentRole, AgentSettings, ConverseReply, ConverseRequest,
};
use crate::cli_style::get_styles;
use clap::{CommandFactory, Parser, Subcommand};
use std::sync::Arc;
use tracing::debug;

pub const COMMAND_PREFIX: char = '/';

#[derive(Parser, Debug)]
#[command(styles=get_styles(), name = "", disable_help_subcommand = true)]
struct InnerCli {
    #[command(subcommand)]
    command: SessionCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Switch to another agent. Starts a new conversation.
    Agent {
        #[arg(value_enum)]
        role: AgentRole,
    },

    /// Forget the current conversation and start a new one.
    New,

    /// Show the available session commands.
    Help,

    /// Leave the console.
    #[command(alias = "quit")]
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Empty,
    Query(String),
    Command(SessionCommand),
}

/// Classify one input line. Anything not starting with `/` is a query and is
/// returned untouched, surrounding whitespace included.
pub fn parse_line(line: &str) -> Result<ConsoleInput, clap::Error> {
    if line.trim().is_empty() {
        return Ok(ConsoleInput::Empty);
    }
    let Some(command) = line.trim_start().strip_prefix(COMMAND_PREFIX) else {
        return Ok(ConsoleInput::Query(line.to_string()));
    };

    let args = shlex::split(command)
        .unwrap_or_else(|| command.split_whitespace().map(String::from).collect());
    let cli = InnerCli::try_parse_from(std::iter::once(" ").chain(args.iter().map(String::as_str)))?;
    Ok(ConsoleInput::Command(cli.command))
}

/// Session command names with their prefix, for completion.
pub fn command_names() -> Vec<String> {
    InnerCli::command()
        .get_subcommands()
        .map(|sc| format!("{}{}", COMMAND_PREFIX, sc.get_name()))
        .collect()
}

/// What happened as a result of one input line.
#[derive(Debug)]
pub enum SessionEvent {
    Nothing,
    Reply(ConverseReply),
    /// The agent call failed. The session stays usable.
    Failed(AgentError),
    Switched(AgentRole),
    Reset,
    Help,
    Exit,
    /// The line looked like a command but did not parse.
    Invalid(String),
}

pub struct ConsoleSession {
    endpoint: Arc<dyn AgentEndpoint>,
    agents: AgentSettings,
    active: AgentRole,
    conversation_id: Option<String>,
}

impl ConsoleSession {
    pub fn new(endpoint: Arc<dyn AgentEndpoint>, agents: AgentSettings) -> Self {
        Self {
            endpoint,
            agents,
            active: AgentRole::Triage,
            conversation_id: None,
        }
    }

    pub fn with_role(mut self, role: AgentRole) -> Self {
        self.active = role;
        self
    }

    pub fn active_role(&self) -> AgentRole {
        self.active
    }

    pub fn active_agent_id(&self) -> &str {
        self.agents.agent_id(self.active)
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    /// Send `text` to the active agent, continuing the current conversation.
    pub async fn ask(&mut self, text: &str) -> Result<ConverseReply, AgentError> {
        let request = ConverseRequest {
            input: text.to_string(),
            agent_id: self.active_agent_id().to_string(),
            conversation_id: self.conversation_id.clone(),
        };
        let reply = self.endpoint.converse(&request).await?;
        if let Some(id) = &reply.conversation_id {
            self.conversation_id = Some(id.clone());
        }
        Ok(reply)
    }

    pub fn switch_agent(&mut self, role: AgentRole) {
        debug!(from = %self.active, to = %role, "Switching agent");
        self.active = role;
        self.conversation_id = None;
    }

    pub fn reset(&mut self) {
        self.conversation_id = None;
    }

    pub async fn handle_line(&mut self, line: &str) -> SessionEvent {
        let input = match parse_line(line) {
            Ok(input) => input,
            Err(err) => return SessionEvent::Invalid(err.render().to_string()),
        };

        match input {
            ConsoleInput::Empty => SessionEvent::Nothing,
            ConsoleInput::Query(text) => match self.ask(&text).await {
                Ok(reply) => SessionEvent::Reply(reply),
                Err(err) => SessionEvent::Failed(err),
            },
            ConsoleInput::Command(SessionCommand::Agent { role }) => {
                self.switch_agent(role);
                SessionEvent::Switched(role)
            }
            ConsoleInput::Command(SessionCommand::New) => {
                self.reset();
                SessionEvent::Reset
            }
            ConsoleInput::Command(SessionCommand::Help) => SessionEvent::Help,
            ConsoleInput::Command(SessionCommand::Exit) => SessionEvent::Exit,
        }
    }
}
