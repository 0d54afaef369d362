//! progress-admin: inspect and reconcile a cached progress session.
//!
//! Operates on the same session slot an app instance would use, stored as a
//! JSON file under `--state-dir`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use progress_sync::{
    ControllerDeps, FileSessionStore, HttpAuthService, HttpProgressService, ProgressApi,
    SessionController, StaticCatalog, StaticDirectory, StorageSignal, SyncConfig, SyncOutcome,
    User,
};
use progress_telemetry::{gather_metrics, init_telemetry, TelemetryConfig};

/// Progress admin CLI
#[derive(Parser, Debug)]
#[command(name = "progress-admin")]
#[command(about = "Inspect and reconcile a cached progress session")]
struct Args {
    /// Remote progress service base URL (defaults to PX_REMOTE_URL or http://localhost:3001)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Directory holding the session slot file
    #[arg(short, long, default_value = ".progress")]
    state_dir: PathBuf,

    /// Module catalog JSON file (`[{"id", "xpReward", "title"}]`)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Print Prometheus metrics after the command
    #[arg(long)]
    metrics: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Sign in and cache the session
    Login { email: String, password: String },
    /// Print the cached user
    Show,
    /// Raise cached XP to the completed-task total
    SyncTasks,
    /// Raise cached XP to the completed-module total
    SyncModules,
    /// Credit XP earned from `source`
    Gain {
        #[arg(allow_hyphen_values = true)]
        amount: i64,
        source: String,
    },
    /// Clear the cached session
    Logout,
}

fn build_controller(args: &Args) -> Result<SessionController> {
    let mut config = SyncConfig::from_env();
    if let Some(endpoint) = &args.endpoint {
        config.remote_base_url = endpoint.clone();
    }
    config.start_sync_delay_ms = 0;

    let catalog = match &args.catalog {
        Some(path) => StaticCatalog::from_json_file(path)
            .with_context(|| format!("loading catalog {}", path.display()))?,
        None => StaticCatalog::default(),
    };
    let progress = HttpProgressService::new(&config.remote_base_url, config.request_timeout())
        .context("creating progress client")?;
    let auth = HttpAuthService::new(&config.remote_base_url, config.request_timeout())
        .context("creating auth client")?;

    Ok(SessionController::create(
        config,
        ControllerDeps {
            store: Arc::new(FileSessionStore::new(&args.state_dir)),
            signal: StorageSignal::default(),
            progress: Arc::new(progress),
            catalog: Arc::new(catalog),
            auth: Arc::new(auth),
            directory: Arc::new(StaticDirectory::with_seed_users()),
        },
    ))
}

async fn require_session(controller: &SessionController, state_dir: &Path) -> Result<()> {
    if !controller.hydrate().await? {
        bail!(
            "no cached session in {}; run `progress-admin login` first",
            state_dir.display()
        );
    }
    Ok(())
}

fn describe(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Raised {
            feed,
            gained,
            new_xp,
            new_level,
            persisted,
        } => {
            let mut line = format!("{feed}: +{gained} XP -> {new_xp} XP, level {new_level}");
            if !persisted {
                line.push_str(" (not saved)");
            }
            line
        }
        SyncOutcome::UpToDate {
            feed,
            cached,
            authoritative,
        } => format!("{feed}: up to date (cached {cached}, feed {authoritative})"),
        SyncOutcome::Skipped => "skipped: session changed".to_string(),
        SyncOutcome::Aborted { feed } => format!("{feed}: feed unavailable, nothing changed"),
    }
}

fn report_sync(outcome: SyncOutcome) -> Result<()> {
    println!("{}", describe(&outcome));
    if let SyncOutcome::Raised {
        persisted: false, ..
    } = outcome
    {
        bail!("session slot write failed; the raise was not saved");
    }
    Ok(())
}

fn print_user(user: Option<&User>) -> Result<()> {
    match user {
        Some(user) => println!("{}", serde_json::to_string_pretty(user)?),
        None => println!("(no session)"),
    }
    Ok(())
}

async fn run(args: &Args, controller: &SessionController) -> Result<()> {
    match &args.command {
        Command::Login { email, password } => {
            let user = controller.login(email, password).await?;
            info!(user_id = %user.id, "[progress] Logged in");
            print_user(Some(&user))?;
        }
        Command::Show => {
            require_session(controller, &args.state_dir).await?;
            controller.wait_idle().await;
            print_user(controller.current_user().await.as_ref())?;
        }
        Command::SyncTasks => {
            require_session(controller, &args.state_dir).await?;
            report_sync(controller.sync_completed_tasks_xp().await)?;
        }
        Command::SyncModules => {
            require_session(controller, &args.state_dir).await?;
            report_sync(controller.sync_completed_modules_xp().await)?;
        }
        Command::Gain { amount, source } => {
            require_session(controller, &args.state_dir).await?;
            let user = controller.gain(*amount, source).await?;
            print_user(user.as_ref())?;
        }
        Command::Logout => {
            controller.logout().await?;
            println!("logged out");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut telemetry = TelemetryConfig::for_cli(args.verbose);
    telemetry.metrics_enabled = args.metrics;
    init_telemetry(&telemetry)?;

    let controller = build_controller(&args)?;
    let result = run(&args, &controller).await;

    // Let detached remote pushes finish before exiting
    controller.dispose().await;

    if args.metrics {
        print!("{}", gather_metrics()?);
    }
    result
}
