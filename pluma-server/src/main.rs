// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Pluma: plugin registry and authorized-lookup engine
//
//  Registry:  PluginService over a snapshot-backed MemoryStore
//  Events:    crossbeam fan-out to the in-process PluginCache
//  Admin API: axum on the tokio runtime
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use clap::Parser;
use pluma_admin::server::AdminState;
use pluma_core::auth::StaticDomainAuthority;
use pluma_core::config::{LogConfig, PlumaConfig};
use pluma_registry::{ChangeNotifier, PluginService};
use pluma_store::{MemoryStore, PluginCache};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "pluma", version, about = "Pluma plugin registry")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "/etc/pluma/pluma.yaml")]
    config: PathBuf,

    /// Log level (overrides `log.level`; `RUST_LOG` overrides both)
    #[arg(long)]
    log_level: Option<String>,

    /// JSON snapshot file for plugin records (overrides `store.state_file`)
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    dump_config: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Config ──
    let config_found = cli.config.exists();
    let mut config = if config_found {
        PlumaConfig::load(&cli.config)?
    } else {
        PlumaConfig::default()
    };
    if let Some(level) = &cli.log_level {
        config.log.level = level.clone();
    }
    if let Some(path) = &cli.state_file {
        config.store.state_file = Some(path.clone());
    }

    if cli.dump_config {
        print!("{}", serde_yaml::to_string(&config)?);
        return Ok(());
    }

    init_tracing(&config.log);
    info!(version = env!("CARGO_PKG_VERSION"), "Pluma starting");
    if config_found {
        info!(path = %cli.config.display(), "Loaded config file");
    } else {
        info!(path = %cli.config.display(), "No config file found, using defaults");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("pluma-rt")
        .build()?;
    runtime.block_on(run(config))?;

    info!("Pluma stopped");
    Ok(())
}

fn init_tracing(log: &LogConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(config: PlumaConfig) -> anyhow::Result<()> {
    // ── Record store ──
    let store = match &config.store.state_file {
        Some(path) => MemoryStore::with_state_file(path),
        None => {
            info!("No state file configured, plugins are kept in memory only");
            MemoryStore::new()
        }
    };

    // ── Registry ──
    let notifier = Arc::new(ChangeNotifier::new());
    let authority = StaticDomainAuthority::new(
        config.auth.domain_admins.clone(),
        config.auth.super_admins.clone(),
    );
    let service = Arc::new(PluginService::new(
        Arc::new(store),
        notifier.clone(),
        Arc::new(authority),
    ));

    // ── Cache: subscribe before priming so no event is missed ──
    let cache = PluginCache::new();
    let events = notifier.subscribe();
    cache.prime(service.list().await?);
    cache.spawn_listener(events)?;
    info!(cache = %cache.stats(), "Plugin cache ready");

    // ── Admin API ──
    let admin_state = Arc::new(AdminState {
        service,
        cache,
        api_key: config.admin.api_key.clone(),
        state_file: config.store.state_file.clone(),
    });

    let admin_config = config.admin.clone();
    let mut admin = tokio::spawn(pluma_admin::server::start_admin(admin_config, admin_state));

    info!(admin_addr = %config.admin.addr, "Pluma is ready");

    // ── Graceful shutdown: wait for SIGTERM/SIGINT ──
    tokio::select! {
        _ = shutdown_signal() => {}
        result = &mut admin => match result {
            // admin API disabled; keep the registry up until signalled
            Ok(Ok(())) => shutdown_signal().await,
            Ok(Err(e)) => return Err(e),
            Err(e) => return Err(e.into()),
        },
    }
    info!("Shutdown signal received, stopping...");
    admin.abort();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
