use std::path::Path;

use anyhow::{anyhow, bail, Context};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use colored::Colorize;
use job_client::{Config, Job};
use serde_json::Value;
use workflow_system::{
    render_definition, FilePayload, SubmissionRequest, SubmissionState, Workflow, WorkflowEvent,
    WorkflowService,
};

#[derive(Parser)]
#[command(name = "workflow-cli")]
#[command(about = "Browse workflow definitions and submit jobs")]
#[command(version)]
struct Cli {
    /// WebDAV server, e.g. http://localhost:8989
    #[arg(long, env = "WEBDAV_URL")]
    store_url: Option<String>,

    /// Job API collection URL
    #[arg(long, env = "JOBS_API_URL")]
    jobs_api: Option<String>,

    #[arg(long, short, env = "WEBDAV_USER")]
    user: Option<String>,

    #[arg(long, env = "WEBDAV_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Enable debug mode
    #[arg(long, short, default_value = "false")]
    debug: bool,

    /// Log level (overrides debug flag)
    #[arg(long, env = "RUST_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the workflow catalog
    Workflows,
    /// Show one workflow's inputs
    Show {
        /// Filename or name of the workflow
        workflow: String,
        /// Print the normalized definition instead
        #[arg(long)]
        yaml: bool,
    },
    /// Submit a job
    Submit {
        /// Filename or name of the workflow
        workflow: String,
        /// Job name, also its upload directory
        #[arg(long)]
        name: String,
        /// Input value as ID=VALUE; VALUE is read as JSON when it parses
        #[arg(long = "set", value_name = "ID=VALUE")]
        values: Vec<String>,
        /// File input as ID=PATH
        #[arg(long = "file", value_name = "ID=PATH")]
        files: Vec<String>,
    },
    /// List jobs
    Jobs,
    /// Show one job
    Job { id: String },
    /// Cancel a job
    Cancel { id: String },
    /// Delete a job
    Delete { id: String },
}

fn init_logging(debug: bool) {
    let level = if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.log_level.is_some() {
        env_logger::init();
    } else {
        init_logging(cli.debug);
    }

    let mut config = Config::new();
    if let Some(store_url) = cli.store_url {
        config.store_url = store_url;
    }
    if let Some(jobs_api) = cli.jobs_api {
        config.jobs_api = jobs_api;
    }
    if cli.user.is_some() {
        config.username = cli.user;
    }
    if cli.password.is_some() {
        config.password = cli.password;
    }
    log::debug!("Store: {} Jobs: {}", config.catalog_url(), config.jobs_api);

    let service = WorkflowService::new(&config);

    match cli.command {
        Commands::Workflows => list_workflows(&service).await,
        Commands::Show { workflow, yaml } => show_workflow(&service, &workflow, yaml).await,
        Commands::Submit {
            workflow,
            name,
            values,
            files,
        } => submit(&service, &workflow, name, &values, &files).await,
        Commands::Jobs => {
            let jobs = service.jobs.list_jobs().await?;
            if jobs.is_empty() {
                println!("{}", "No jobs".dimmed());
            }
            for job in &jobs {
                print_job(job);
            }
            Ok(())
        }
        Commands::Job { id } => {
            let job = service.jobs.get_job(&id).await?;
            println!("{}", serde_json::to_string_pretty(&job)?);
            Ok(())
        }
        Commands::Cancel { id } => {
            service.jobs.cancel_job(&id).await?;
            println!("{}", format!("Cancelled {id}").yellow());
            Ok(())
        }
        Commands::Delete { id } => {
            service.jobs.delete_job(&id).await?;
            println!("{}", format!("Deleted {id}").yellow());
            Ok(())
        }
    }
}

async fn list_workflows(service: &WorkflowService) -> anyhow::Result<()> {
    let workflows = service.catalog.refresh().await?;
    if workflows.is_empty() {
        println!("{}", "No workflows found".dimmed());
    }
    for workflow in &workflows {
        println!(
            "{}  {}",
            workflow.display_name().bold(),
            workflow.filename.dimmed()
        );
        if !workflow.description.is_empty() {
            println!("    {}", workflow.description);
        }
    }
    Ok(())
}

async fn find_workflow(service: &WorkflowService, key: &str) -> anyhow::Result<Workflow> {
    service.catalog.refresh().await?;
    service
        .catalog
        .find(key)
        .ok_or_else(|| anyhow!("no workflow named {key}"))
}

async fn show_workflow(service: &WorkflowService, key: &str, yaml: bool) -> anyhow::Result<()> {
    let workflow = find_workflow(service, key).await?;
    if yaml {
        print!("{}", render_definition(&workflow)?);
        return Ok(());
    }

    println!("{}", workflow.display_name().bold());
    for input in &workflow.inputs {
        let marker = if input.optional { "?" } else { "" };
        print!("  {}{}: {}", input.id.cyan(), marker, input.input_type);
        if let Some(symbols) = input.symbols() {
            print!(" [{}]", symbols.join(", "));
        }
        if !input.default.is_null() {
            print!(" = {}", input.default);
        }
        println!();
        if input.name != input.id {
            println!("      {}", input.name.dimmed());
        }
    }
    Ok(())
}

async fn submit(
    service: &WorkflowService,
    key: &str,
    name: String,
    values: &[String],
    files: &[String],
) -> anyhow::Result<()> {
    let workflow = find_workflow(service, key).await?;
    let mut request = SubmissionRequest::new(name);

    for entry in values {
        let (id, raw) = split_assignment(entry)?;
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        request = request.with_value(id, value);
    }
    for entry in files {
        let (id, path) = split_assignment(entry)?;
        request = request.with_file(id, read_payload(Path::new(path)).await?);
    }

    let mut events = service.events().subscribe();
    let progress = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let WorkflowEvent::SubmissionProgress { state, .. } = event {
                let done = state.is_terminal();
                if !matches!(state, SubmissionState::Failed(_)) {
                    eprintln!("{}", format!("  {state:?}").dimmed());
                }
                if done {
                    break;
                }
            }
        }
    });

    let result = service.submitter.submit(&workflow, &request).await;
    let _ = progress.await;

    let job = result?;
    println!("{}", format!("Submitted {}", request.name).green());
    print_job(&job);
    Ok(())
}

fn split_assignment(entry: &str) -> anyhow::Result<(&str, &str)> {
    match entry.split_once('=') {
        Some((id, value)) if !id.is_empty() => Ok((id, value)),
        _ => bail!("expected ID=VALUE, got {entry:?}"),
    }
}

async fn read_payload(path: &Path) -> anyhow::Result<FilePayload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("{} has no file name", path.display()))?;
    Ok(FilePayload::new(file_name, Bytes::from(bytes)))
}

fn print_job(job: &Job) {
    let state = job.state.as_deref().unwrap_or("unknown");
    let state = match state.to_lowercase().as_str() {
        "success" | "succeeded" | "complete" | "completed" => state.green(),
        "failed" | "error" | "cancelled" | "canceled" => state.red(),
        _ => state.yellow(),
    };
    println!(
        "{}  {}  {}",
        job.id.bold(),
        job.name.as_deref().unwrap_or_default(),
        state
    );
}
