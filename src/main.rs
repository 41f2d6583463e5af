//! # Leadflow — lead outreach automation engine
//!
//! Drives staged email sequences for CRM leads: per-stage templates with
//! variable substitution, per-user SMTP delivery with bounded retry, and a
//! periodic runner that advances each lead through the seven-touch
//! sequence.
//!
//! Usage:
//!   leadflow serve                    # Runner + HTTP gateway
//!   leadflow tick                     # One processing pass, then exit
//!   leadflow init-config              # Write a default config file

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use leadflow_automation::{AutomationController, AutomationSettings};
use leadflow_core::LeadflowConfig;
use leadflow_gateway::AppState;
use leadflow_mailer::SmtpMailer;
use leadflow_store::SqliteStore;
use leadflow_templates::TemplateStore;

#[derive(Parser)]
#[command(name = "leadflow", version, about = "📮 Leadflow — lead outreach automation engine")]
struct Cli {
    /// Path to config file (default: ~/.leadflow/config.toml)
    #[arg(long)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the periodic processor and the HTTP gateway
    Serve {
        /// Gateway port override
        #[arg(short, long)]
        port: Option<u16>,

        /// SQLite database path override
        #[arg(long)]
        db_path: Option<String>,

        /// Seconds between due-lead scans
        #[arg(long)]
        interval_secs: Option<u64>,
    },
    /// Process all currently-due leads once and exit (external-cron mode)
    Tick {
        /// SQLite database path override
        #[arg(long)]
        db_path: Option<String>,
    },
    /// Write a default config file and exit
    InitConfig,
}

fn expand_path(p: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(p).to_string())
}

fn load_config(cli_path: Option<&str>) -> Result<LeadflowConfig> {
    match cli_path {
        Some(path) => Ok(LeadflowConfig::load_from(&expand_path(path))?),
        None => Ok(LeadflowConfig::load()?),
    }
}

fn build_controller(
    config: &LeadflowConfig,
    db_override: Option<&str>,
) -> Result<(Arc<AutomationController>, Arc<SqliteStore>, TemplateStore)> {
    let db_path = expand_path(db_override.unwrap_or(&config.database.path));
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = Arc::new(SqliteStore::open(&db_path)?);
    tracing::info!("💾 Store opened: {}", db_path.display());

    let templates = TemplateStore::new(store.clone());
    let settings = AutomationSettings {
        retry_cap: config.automation.retry_cap,
        failure_backoff: chrono::Duration::minutes(config.automation.failure_backoff_mins),
        default_sender_name: config.sender.name.clone(),
        default_sender_email: config.sender.email.clone(),
    };
    let controller = Arc::new(AutomationController::new(
        store.clone(),
        templates.clone(),
        Arc::new(SmtpMailer::default()),
        store.clone(),
        settings,
    ));
    Ok((controller, store, templates))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "leadflow=debug,tower_http=debug"
    } else {
        "leadflow=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Command::Serve {
            port,
            db_path,
            interval_secs,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(port) = port {
                config.gateway.port = port;
            }
            let interval = interval_secs.unwrap_or(config.automation.tick_interval_secs);

            let (controller, store, templates) =
                build_controller(&config, db_path.as_deref())?;

            let runner_controller = controller.clone();
            tokio::spawn(async move {
                leadflow_automation::spawn_automation_loop(runner_controller, interval).await;
            });

            let state = AppState {
                controller,
                store,
                templates,
                start_time: std::time::Instant::now(),
            };
            leadflow_gateway::start(state, &config.gateway).await?;
        }
        Command::Tick { db_path } => {
            let config = load_config(cli.config.as_deref())?;
            let (controller, _store, _templates) =
                build_controller(&config, db_path.as_deref())?;
            let attempted = leadflow_automation::run_once(&controller).await;
            tracing::info!("Tick complete: {attempted} send(s) attempted");
        }
        Command::InitConfig => {
            let config = LeadflowConfig::default();
            config.save()?;
            println!("Wrote {}", LeadflowConfig::default_path().display());
        }
    }

    Ok(())
}
