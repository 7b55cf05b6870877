//! RGS server binary.
//!
//! Loads configuration, starts the integrity watchdog, and serves the game
//! lifecycle and PRNG endpoints until shutdown.

use clap::{Parser, Subcommand};
use rgs::api::handlers::AppState;
use rgs::api::ApiServer;
use rgs::config::ConfigLoader;
use rgs::integrity::{spawn_watchdog, IntegrityVerifier, SystemLock};
use rgs::prng::PrngService;
use rgs::store::{MemoryGameCatalog, MemorySessionStore, Session};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "rgs")]
#[command(about = "Remote Game Server", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Force development mode regardless of configuration
    #[arg(long)]
    dev: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the combined hash of the configured protected files, for
    /// recording as the trusted baseline at deployment
    Baseline,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(ref path) = args.config {
        loader = loader.with_path(path);
    }

    if let Some(Command::Baseline) = args.command {
        // No baseline exists yet at this point, so skip full validation.
        let config = loader.load_lenient()?;
        let verifier = IntegrityVerifier::from_config(&config.security);
        println!("{}", verifier.compute_combined_hash()?);
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rgs=info,tower_http=info".into()),
        )
        .init();

    let mut config = loader.load()?;
    if args.dev {
        config.dev = true;
    }
    let config = Arc::new(config);

    if config.dev {
        warn!("Development mode: game availability is forced and emulators are preferred");
    }

    let lock = SystemLock::from_config(&config.security);
    if lock.is_locked() {
        warn!(
            marker = %config.security.lock_marker,
            "lock marker present at startup: all requests will be rejected until it is removed"
        );
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    if !config.security.disable_hash_verification {
        let verifier = IntegrityVerifier::from_config(&config.security);
        spawn_watchdog(
            verifier,
            lock.clone(),
            Duration::from_secs(config.security.verify_interval_secs),
            shutdown_rx,
        );
    } else {
        warn!("Integrity verification disabled by configuration");
    }

    // In-memory collaborators back development mode; production deployments
    // wire their own SessionStore/GameCatalog here.
    let sessions = Arc::new(MemorySessionStore::new());
    let catalog = Arc::new(MemoryGameCatalog::new());

    if config.dev {
        sessions.insert(Session {
            id: "dev-session".to_string(),
            game: "hilo".to_string(),
            basegame: None,
            variant: Some("96".to_string()),
            site: None,
        });
        info!("Seeded development session 'dev-session' for game 'hilo'");
    }

    let state = Arc::new(AppState {
        config: Arc::clone(&config),
        lock,
        sessions,
        catalog,
        registry: Arc::new(rgs::default_registry()),
        prng: PrngService::new(),
    });

    ApiServer::new(config, state).run(shutdown_tx).await
}
