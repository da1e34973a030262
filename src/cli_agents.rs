use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use oilfield_incident_intel::agent::{
    default_agents, AgentBuilderClient, AgentDefinition, AgentRole, PublishOutcome,
};
use oilfield_incident_intel::analytics::{run_report, ReportSection, SectionResult};
use oilfield_incident_intel::cli_style::{
    get_styles, print_banner, print_empty_list, print_error, print_key_value,
    print_key_value_highlight, print_list_item, print_section_footer, print_section_header,
    print_success, print_warning, TableBuilder,
};
use oilfield_incident_intel::config::{AppConfig, EnvConfig, FileConfig, LocalConfig};
use oilfield_incident_intel::elastic::{cell_text, ElasticClient};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

/// Inspect, validate and publish the hosted agent definitions, and print
/// the fixed incident analytics report.
#[derive(Parser, Debug)]
#[command(styles=get_styles(), version)]
struct CliArgs {
    /// Optional TOML file with index and agent settings.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    command: AgentsCommand,
}

#[derive(Subcommand, Debug)]
enum AgentsCommand {
    /// Print agent definitions and their tool bindings.
    Show {
        /// Only this agent.
        #[arg(value_enum)]
        role: Option<AgentRole>,

        /// Print the payload sent to the agent host.
        #[clap(long)]
        json: bool,
    },

    /// Check every definition without contacting the agent host.
    Validate,

    /// Create or update the agents on the agent host.
    Publish {
        /// Only this agent.
        #[arg(value_enum)]
        role: Option<AgentRole>,
    },

    /// Run the fixed ES|QL analytics against the incident index.
    Report {
        /// Sections to print, in order. All of them when omitted.
        #[arg(value_enum)]
        sections: Vec<ReportSection>,
    },
}

fn selected(agents: Vec<AgentDefinition>, role: Option<AgentRole>) -> Vec<AgentDefinition> {
    agents
        .into_iter()
        .filter(|a| role.map_or(true, |r| a.role == r))
        .collect()
}

fn print_definition(agent: &AgentDefinition, as_json: bool) -> Result<()> {
    print_section_header(&agent.name);
    print_key_value_highlight("Id", &agent.id);
    print_key_value("Role", agent.role.as_str());
    print_key_value("Description", &agent.description);
    print_key_value("Labels", &agent.labels.join(", "));

    let mut tools = TableBuilder::new(vec!["Tool", "Purpose"]);
    for tool in &agent.tools {
        tools.add_row(vec![tool.tool_id.clone(), tool.purpose.clone()]);
    }
    tools.print();

    if as_json {
        println!("{}", serde_json::to_string_pretty(&agent.to_payload())?);
    }
    print_section_footer();
    Ok(())
}

fn validate_all(agents: &[AgentDefinition]) -> bool {
    let mut ok = true;
    for agent in agents {
        let problems = agent.problems();
        if problems.is_empty() {
            print_success(&format!("{} is valid", agent.id));
        } else {
            ok = false;
            print_error(&format!("{} has {} problem(s)", agent.id, problems.len()));
            for problem in problems {
                print_list_item(&problem.to_string(), 1);
            }
        }
    }
    ok
}

async fn publish(config: &AppConfig, agents: &[AgentDefinition]) -> Result<()> {
    let client = AgentBuilderClient::new(
        config.agent_url()?,
        config.agent_api_key.clone(),
        config.local.agent_timeout,
    )?;
    for agent in agents {
        match client.upsert_agent(agent).await? {
            PublishOutcome::Created => {
                print_success(&format!("Created {} on {}", agent.id, client.base_url()))
            }
            PublishOutcome::Updated => {
                print_success(&format!("Updated {} on {}", agent.id, client.base_url()))
            }
        }
    }
    Ok(())
}

fn print_section(result: &SectionResult) {
    print_section_header(result.section.title());
    match &result.table {
        Err(err) => print_error(&err.to_string()),
        Ok(table) if table.is_empty() => print_empty_list("No incidents match"),
        // A single-row summary reads better as key-value lines.
        Ok(table) if result.section == ReportSection::Summary => {
            for (column, value) in table.columns.iter().zip(&table.values[0]) {
                print_key_value(&column.name, &cell_text(value));
            }
        }
        Ok(table) => {
            let mut rows = TableBuilder::new(table.column_names());
            for row in table.text_rows() {
                rows.add_row(row);
            }
            rows.print();
        }
    }
    print_section_footer();
}

async fn report(config: &AppConfig, sections: Vec<ReportSection>) -> Result<bool> {
    let sections = if sections.is_empty() {
        ReportSection::ALL.to_vec()
    } else {
        sections
    };
    let client = ElasticClient::new(
        config.elasticsearch_url.clone(),
        config.api_key.clone(),
        config.local.index.clone(),
        config.local.request_timeout,
    )?;

    let results = run_report(&client, &config.local.index, &sections).await?;
    for result in &results {
        print_section(result);
    }
    let failed = results.iter().filter(|r| r.table.is_err()).count();
    if failed > 0 {
        print_warning(&format!("{} of {} sections failed", failed, results.len()));
    }
    Ok(failed == 0)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
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

    match cli_args.command {
        AgentsCommand::Show { role, json } => {
            let local = LocalConfig::resolve(&EnvConfig::from_env(), file_config)?;
            let agents = selected(default_agents(&local.agent_settings()), role);
            for agent in &agents {
                print_definition(agent, json)?;
            }
        }
        AgentsCommand::Validate => {
            let local = LocalConfig::resolve(&EnvConfig::from_env(), file_config)?;
            let agents = default_agents(&local.agent_settings());
            if !validate_all(&agents) {
                return Ok(ExitCode::FAILURE);
            }
        }
        AgentsCommand::Publish { role } => {
            print_banner("AGENT PROVISIONING");
            let config = AppConfig::resolve(&EnvConfig::from_env(), file_config)?;
            let agents = selected(default_agents(&config.agent_settings()), role);
            if !validate_all(&agents) {
                bail!("Refusing to publish invalid agent definitions");
            }
            publish(&config, &agents).await?;
        }
        AgentsCommand::Report { sections } => {
            print_banner("INCIDENT ANALYTICS");
            let config = AppConfig::resolve(&EnvConfig::from_env(), file_config)?;
            if !report(&config, sections).await? {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
