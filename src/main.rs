//! # SQLCourier
//!
//! Drop a `.sql` file with `-- CRON:` and `-- EMAIL:` directives into the
//! watched folder; its query runs on schedule and the rows land in the
//! recipient's inbox.
//!
//! Usage:
//!   sqlcourier                                # watch ./sql with ./credentials.json
//!   sqlcourier --tasks-dir /srv/reports/sql   # custom folder
//!   sqlcourier -v                             # debug logging

mod pipeline;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use sqlcourier_core::CredentialProvider;
use sqlcourier_db::QueryClient;
use sqlcourier_mail::Mailer;
use sqlcourier_scheduler::{RegistrationWorker, SchedulerCore, TaskWatcher, scan_existing};
use tracing_subscriber::EnvFilter;

use crate::pipeline::ExecutionPipeline;

#[derive(Parser)]
#[command(
    name = "sqlcourier",
    version,
    about = "📬 SQLCourier — cron-scheduled SQL reports by email"
)]
struct Cli {
    /// Folder to watch for .sql task files
    #[arg(short, long, default_value = "./sql")]
    tasks_dir: PathBuf,

    /// Credentials file (database + SMTP settings)
    #[arg(short, long, default_value = "./credentials.json")]
    credentials: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "sqlcourier=debug,sqlcourier_scheduler=debug,sqlcourier_db=debug,sqlcourier_mail=debug"
    } else {
        "sqlcourier=info,sqlcourier_scheduler=info,sqlcourier_db=info,sqlcourier_mail=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    if !cli.tasks_dir.is_dir() {
        anyhow::bail!("tasks folder {} does not exist", cli.tasks_dir.display());
    }
    if !cli.credentials.exists() {
        tracing::warn!(
            "⚠️ Credentials file {} not found yet, executions will fail until it appears",
            cli.credentials.display()
        );
    }

    println!("📬 SQLCourier v{}", env!("CARGO_PKG_VERSION"));
    println!("   📂 Task folder: {}", cli.tasks_dir.display());
    println!("   🔑 Credentials: {}", cli.credentials.display());
    println!();

    let pipeline = ExecutionPipeline::new(
        CredentialProvider::new(&cli.credentials),
        Arc::new(QueryClient::new()),
        Arc::new(Mailer::new()),
    );
    let core = Arc::new(SchedulerCore::new(Arc::new(pipeline)));

    // Watch first, then scan, both into one queue: a file arriving between
    // the two steps cannot be missed, and a double sighting collapses in
    // the worker's known-set.
    let (queue_tx, queue_rx) = tokio::sync::mpsc::unbounded_channel();
    let _watcher = TaskWatcher::start(&cli.tasks_dir, queue_tx.clone())?;
    scan_existing(&cli.tasks_dir, &queue_tx)?;
    drop(queue_tx);

    // The watcher callback holds the last sender, so the worker runs until
    // the process is terminated.
    RegistrationWorker::new(core).run(queue_rx).await;
    Ok(())
}
