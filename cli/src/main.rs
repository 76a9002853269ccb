//! CLI entrypoint for taskforce
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use taskforce_application::{
    DirectMessageUseCase, EndpointClient, NoTranscriptLogger, RunTaskUseCase, SessionStore,
    TranscriptLogger,
};
use taskforce_domain::{AgentIdentity, TaskResult};
use taskforce_infrastructure::{ConfigLoader, FileConfig, HttpEndpointClient, JsonlTranscriptLogger};
use taskforce_server::{AppState, AuthConfig, serve};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "taskforce", about = "PM/worker agent orchestrator")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Explicit configuration file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip config files and use built-in defaults
    #[arg(long)]
    no_config: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP orchestrator service
    Serve,
    /// Run one task end-to-end: decomposition plus worker dispatch
    Run {
        /// Task description handed to the PM
        task: String,
    },
    /// Send one message straight to a worker (A, B or C)
    Send {
        /// Worker identity
        target: String,
        /// Message content
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Starting taskforce");

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow::anyhow!(e))
            .context("failed to load configuration")?
    };

    // === Dependency Injection ===
    let endpoints = config
        .endpoint_table()
        .context("failed to resolve agent endpoints")?;
    let client: Arc<dyn EndpointClient> =
        Arc::new(HttpEndpointClient::new(endpoints, config.retry.clone()));
    let sessions = Arc::new(SessionStore::new(config.system_prompts()));
    let transcript = transcript_logger(&config);
    let carry = config
        .carry
        .carry_mode()
        .context("invalid carry configuration")?;

    let run_task = Arc::new(RunTaskUseCase::new(
        client.clone(),
        sessions.clone(),
        transcript.clone(),
        carry,
    ));
    let direct = Arc::new(DirectMessageUseCase::new(
        client.clone(),
        sessions,
        transcript,
    ));

    match cli.command {
        Command::Serve => {
            let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
                .parse()
                .context("invalid server address")?;
            let state = AppState {
                run_task,
                direct,
                client,
                auth: config.server.auth_token_env.clone().map(AuthConfig::new),
            };
            serve(state, addr).await.context("server error")?;
        }
        Command::Run { task } => {
            let result = run_task.execute(&task, None).await;
            print_result(&result)?;
        }
        Command::Send { target, message } => {
            let target: AgentIdentity = target
                .parse()
                .map_err(|e| anyhow::anyhow!("{}", e))
                .context("invalid target")?;
            let result = direct.execute(target, &message, None).await;
            print_result(&result)?;
        }
    }

    Ok(())
}

fn transcript_logger(config: &FileConfig) -> Arc<dyn TranscriptLogger> {
    match &config.log.transcript_path {
        Some(path) => match JsonlTranscriptLogger::new(path) {
            Some(logger) => Arc::new(logger),
            None => Arc::new(NoTranscriptLogger),
        },
        None => Arc::new(NoTranscriptLogger),
    }
}

fn print_result(result: &TaskResult) -> Result<()> {
    for record in &result.outputs {
        println!("[{}] {}:", record.ordinal, record.agent);
        println!("{}", record.output);
        println!();
    }
    if let Some(failure) = result.failure() {
        match failure.ordinal {
            Some(ordinal) => bail!(
                "task {} failed at subtask {} ({}): {}",
                result.id,
                ordinal,
                failure.kind,
                failure.message
            ),
            None => bail!(
                "task {} failed ({}): {}",
                result.id,
                failure.kind,
                failure.message
            ),
        }
    }
    Ok(())
}
