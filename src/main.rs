use anyhow::{bail, Context, Result};
use clap::Parser;
use dotenv::dotenv;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use oilfield_incident_intel::cli_style::{
    get_styles, print_banner, print_empty_list, print_error, print_key_value,
    print_key_value_highlight, print_list_item, print_section_footer, print_section_header,
    print_success, print_warning, TableBuilder,
};
use oilfield_incident_intel::config::{AppConfig, EnvConfig, FileConfig, LocalConfig};
use oilfield_incident_intel::elastic::{ElasticClient, IncidentIndex, IndexStats, MemoryIndex};
use oilfield_incident_intel::incident::{
    generate_dataset, save_dataset, IncidentRecord, Severity, DEFAULT_DATASET_SIZE, DEFAULT_SEED,
};
use oilfield_incident_intel::ingest::{
    load_raw_records, DocumentOutcome, IngestReport, IngestionLoader, LoaderSettings, RawEntry,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

/// Load oilfield incidents into the search index.
///
/// Credentials come from the environment (or a `.env` file):
/// ELASTIC_CLOUD_ID or ELASTICSEARCH_URL, and ELASTICSEARCH_API_KEY.
#[derive(Parser, Debug)]
#[command(styles=get_styles(), version)]
struct CliArgs {
    /// Optional TOML file with index, batching and agent settings.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Read incidents from a JSON array or NDJSON file instead of
    /// generating a synthetic dataset.
    #[clap(long, value_parser = parse_path)]
    pub input: Option<PathBuf>,

    /// Number of synthetic incidents to generate.
    #[clap(long, default_value_t = DEFAULT_DATASET_SIZE)]
    pub count: usize,

    /// Seed for the synthetic dataset.
    #[clap(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Also write the generated dataset to this JSON file.
    #[clap(long, value_parser = parse_path)]
    pub save_dataset: Option<PathBuf>,

    /// Documents per bulk request. Overrides the config file.
    #[clap(long)]
    pub batch_size: Option<usize>,

    /// Ingest into an in-memory index. No credentials or network needed.
    #[clap(long)]
    pub dry_run: bool,

    /// Fetch and print one incident after ingestion.
    #[clap(long)]
    pub show: Option<String>,
}

fn read_input(cli_args: &CliArgs) -> Result<Vec<RawEntry>> {
    if let Some(path) = &cli_args.input {
        if cli_args.save_dataset.is_some() {
            warn!("--save-dataset is ignored when --input is given");
        }
        info!("Reading incidents from {:?}", path);
        return Ok(load_raw_records(path)?);
    }

    info!(
        "Generating {} synthetic incidents (seed {})",
        cli_args.count, cli_args.seed
    );
    let records = generate_dataset(cli_args.count, cli_args.seed);
    if let Some(path) = &cli_args.save_dataset {
        save_dataset(path, &records)
            .with_context(|| format!("Failed to save dataset to {:?}", path))?;
        print_success(&format!("Dataset written to {}", path.display()));
    }
    Ok(records.iter().map(|r| Ok(r.to_document())).collect())
}

fn open_index(
    cli_args: &CliArgs,
    file_config: Option<FileConfig>,
) -> Result<(Arc<dyn IncidentIndex>, LoaderSettings)> {
    let env = EnvConfig::from_env();
    if cli_args.dry_run {
        let local = LocalConfig::resolve(&env, file_config)?;
        print_warning("Dry run: documents go to an in-memory index.");
        return Ok((
            Arc::new(MemoryIndex::new(local.index.clone())),
            local.loader_settings(),
        ));
    }

    let config = AppConfig::resolve(&env, file_config)?;
    info!(
        "Using index {} at {}",
        config.local.index, config.elasticsearch_url
    );
    let client = ElasticClient::new(
        config.elasticsearch_url.clone(),
        config.api_key.clone(),
        config.local.index.clone(),
        config.local.request_timeout,
    )?;
    Ok((Arc::new(client), config.loader_settings()))
}

fn describe_outcome(outcome: &DocumentOutcome) -> String {
    match outcome {
        DocumentOutcome::Created => "created".to_string(),
        DocumentOutcome::Updated => "updated".to_string(),
        DocumentOutcome::Rejected(rejection) => format!("rejected: {}", rejection),
        DocumentOutcome::Failed(reason) => format!("failed: {}", reason),
    }
}

fn print_report(report: &IngestReport) {
    print_section_header("Ingestion Report");
    print_key_value("Index", &report.index);
    print_key_value(
        "Index created",
        if report.index_created { "yes" } else { "no" },
    );
    print_key_value("Records read", &report.total().to_string());
    print_key_value_highlight("Indexed", &report.indexed().to_string());
    print_key_value("  created", &report.created().to_string());
    print_key_value("  updated", &report.updated().to_string());
    print_key_value("Rejected", &report.rejected().to_string());
    print_key_value("Failed", &report.failed().to_string());
    print_key_value(
        "Elapsed",
        &format!("{} ms", report.elapsed().num_milliseconds()),
    );
    if report.unsearchable > 0 {
        print_warning(&format!(
            "{} records have no description and are invisible to semantic search",
            report.unsearchable
        ));
    }
    if !report.duplicate_ids.is_empty() {
        print_warning(&format!(
            "Duplicate incident ids in input, last occurrence kept: {}",
            report.duplicate_ids.join(", ")
        ));
    }
    print_section_footer();

    if report.has_mapping_conflicts() {
        print_section_header("Mapping Conflicts");
        for conflict in &report.mapping_conflicts {
            print_list_item(&format!("{}: {}", conflict.field, conflict.detail), 0);
        }
        print_section_footer();
    }

    let mut problems = TableBuilder::new(vec!["#", "Incident", "Outcome"]);
    for doc in report.problems() {
        problems.add_row(vec![
            doc.position.to_string(),
            doc.incident_id.clone().unwrap_or_else(|| "-".to_string()),
            describe_outcome(&doc.outcome),
        ]);
    }
    if !problems.is_empty() {
        print_section_header("Records Not Indexed");
        problems.print();
        print_section_footer();
    }
}

fn print_stats(stats: &IndexStats) {
    print_section_header("Index Summary");
    print_key_value_highlight("Documents", &stats.total_documents.to_string());
    print_key_value("Total cost", &format!("${:.2}", stats.total_cost_usd));
    print_key_value(
        "Total downtime",
        &format!("{:.1} h", stats.total_downtime_hours),
    );
    if let Some(avg) = stats.avg_downtime_hours {
        print_key_value("Average downtime", &format!("{:.1} h", avg));
    }

    if stats.by_severity.is_empty() {
        print_empty_list("No incidents indexed");
    } else {
        let mut table = TableBuilder::new(vec!["Severity", "Count", "Respond within", "Escalate"]);
        for (name, count) in &stats.by_severity {
            let profile = Severity::parse(name).map(|s| s.profile());
            table.add_row(vec![
                name.clone(),
                count.to_string(),
                profile
                    .map(|p| format!("{} h", p.response_time_hours))
                    .unwrap_or_default(),
                profile
                    .map(|p| if p.escalation_required { "yes" } else { "no" })
                    .unwrap_or_default()
                    .to_string(),
            ]);
        }
        table.print();
    }

    if !stats.by_type.is_empty() {
        let mut table = TableBuilder::new(vec!["Incident type", "Count"]);
        for (name, count) in &stats.by_type {
            table.add_row(vec![name.clone(), count.to_string()]);
        }
        table.print();
    }
    print_section_footer();
}

fn print_incident(record: &IncidentRecord) {
    print_section_header(&record.incident_id);
    let document = record.to_document();
    if let Some(fields) = document.as_object() {
        for (key, value) in fields {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            print_key_value(key, &text);
        }
    }
    if let Some(severity) = record.severity {
        print_key_value_highlight("Guidance", severity.profile().description);
    }
    print_section_footer();
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

    print_banner("INCIDENT INGESTION");

    // Configuration problems are fatal before anything touches the network.
    let mut file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    if let Some(batch_size) = cli_args.batch_size {
        if batch_size == 0 {
            bail!("--batch-size must be at least 1");
        }
        file_config.get_or_insert_with(FileConfig::default).batch_size = Some(batch_size);
    }
    let (index, settings) = open_index(&cli_args, file_config)?;
    let raw = read_input(&cli_args)?;

    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::with_template("  {spinner} [{bar:40.yellow/red}] {pos}/{len} documents")?
            .progress_chars("=> "),
    );
    let loader = IngestionLoader::new(index.clone(), settings).with_progress(progress);

    let report = match loader.run_entries(raw).await {
        Ok(report) => report,
        Err(err) => {
            print_error(&err.to_string());
            return Ok(ExitCode::FAILURE);
        }
    };
    print_report(&report);

    match index.stats().await {
        Ok(stats) => print_stats(&stats),
        Err(err) => print_warning(&format!("Could not read index summary: {}", err)),
    }

    if let Some(id) = &cli_args.show {
        match index.get_incident(id).await? {
            Some(record) => print_incident(&record),
            None => print_warning(&format!("Incident {} not found", id)),
        }
    }

    if report.has_mapping_conflicts() {
        print_error("The index mapping conflicts with the incident schema.");
        return Ok(ExitCode::FAILURE);
    }
    if report.is_clean() {
        print_success("All records indexed.");
    } else {
        print_warning("Some records were not indexed; see the report above.");
    }
    Ok(ExitCode::SUCCESS)
}
