use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use oilfield_incident_intel::agent::{AgentBuilderClient, AgentRole};
use oilfield_incident_intel::cli_style::{
    flush, get_prompt, get_styles, print_error, print_goodbye, print_info, print_welcome,
};
use oilfield_incident_intel::config::{AppConfig, EnvConfig, FileConfig};
use oilfield_incident_intel::console::{
    command_names,
    render::{print_agent_error, print_reply, print_session_help, print_switched},
    ConsoleSession, SessionEvent, COMMAND_PREFIX,
};

use rustyline::{
    completion::Completer, highlight::Highlighter, history::FileHistory, validate::Validator,
    CompletionType, Config, Editor, Helper,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

/// Talk to the hosted triage and analytics agents.
///
/// Needs KIBANA_URL (or an ELASTIC_CLOUD_ID carrying a Kibana host) and an
/// API key in the environment.
#[derive(Parser, Debug)]
#[command(styles=get_styles(), version)]
struct CliArgs {
    /// Optional TOML file with index and agent settings.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Agent to start with.
    #[clap(long, value_enum, default_value_t = AgentRole::Triage)]
    pub agent: AgentRole,
}

#[derive(rustyline_derive::Hinter)]
struct ConsoleHelper {
    commands_names: Vec<String>,
}

impl ConsoleHelper {
    pub fn new() -> Self {
        ConsoleHelper {
            commands_names: command_names(),
        }
    }
}

impl Completer for ConsoleHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        // Only session commands complete; free text is the user's own.
        if !line.starts_with(COMMAND_PREFIX) || line.contains(' ') {
            return Ok((0, Vec::with_capacity(0)));
        }
        let matches = self
            .commands_names
            .iter()
            .filter(|c| c.starts_with(line))
            .map(|c| c.to_string())
            .collect::<Vec<_>>();

        Ok((0, matches))
    }
}

impl Highlighter for ConsoleHelper {}
impl Validator for ConsoleHelper {}
impl Helper for ConsoleHelper {}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let config = AppConfig::resolve(&EnvConfig::from_env(), file_config)?;
    let agent_url = config.agent_url()?.to_string();

    let client = AgentBuilderClient::new(
        agent_url.clone(),
        config.agent_api_key.clone(),
        config.local.agent_timeout,
    )?;
    let mut session =
        ConsoleSession::new(Arc::new(client), config.agent_settings()).with_role(cli_args.agent);

    let agent_label = format!("{} ({})", session.active_role(), session.active_agent_id());
    print_welcome(
        "INCIDENT CONSOLE",
        "Ask about incidents, equipment and failure patterns.",
        &[
            ("Agent host", agent_url.as_str()),
            ("Agent", agent_label.as_str()),
            ("Index", config.local.index.as_str()),
            ("Version", env!("CARGO_PKG_VERSION")),
        ],
        "Type /help for session commands, /exit to leave.",
    );

    let rl_config = Config::builder()
        .completion_type(CompletionType::List)
        .build();

    let mut rl = Editor::<ConsoleHelper, FileHistory>::with_config(rl_config)?;
    rl.set_helper(Some(ConsoleHelper::new()));

    loop {
        let readline = rl.readline(&get_prompt(session.active_role().as_str()));

        match readline {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                let role = session.active_role();
                match session.handle_line(&line).await {
                    SessionEvent::Nothing => {}
                    SessionEvent::Reply(reply) => print_reply(role, &reply),
                    SessionEvent::Failed(err) => print_agent_error(&err),
                    SessionEvent::Switched(role) => {
                        print_switched(role, session.active_agent_id())
                    }
                    SessionEvent::Reset => print_info("Started a new conversation."),
                    SessionEvent::Help => print_session_help(),
                    SessionEvent::Invalid(message) => print_error(message.trim_end()),
                    SessionEvent::Exit => break,
                }
                flush();
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                break;
            }
            Err(e) => {
                print_error(&format!("Error: {:?}", e));
                break;
            }
        }
    }

    print_goodbye();
    Ok(())
}
