//! GEOS-CF query server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use cf_dataset::DatasetReader;
use cfapi::config::{ServiceConfig, DEFAULT_CONFIG_PATH};
use cfapi::state::AppState;

/// GEOS-CF query server
#[derive(Parser, Debug)]
#[command(name = "cfapi")]
#[command(about = "Catalog-validated queries over GEOS-CF NetCDF files")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8000", env = "CFAPI_LISTEN_ADDR")]
    listen: String,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Number of worker threads
    #[arg(long, env = "CFAPI_WORKER_THREADS")]
    worker_threads: Option<usize>,

    /// Service configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, env = "CFAPI_CONFIG")]
    config: PathBuf,

    /// Dataset directory, overriding the config file
    #[arg(long, env = "CFAPI_DATASET_DIR")]
    dataset_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    info!("Starting GEOS-CF query server");

    let prometheus = cfapi::metrics::install_recorder()?;

    let mut config = ServiceConfig::load(&args.config)?;
    if let Some(dir) = args.dataset_dir {
        config.dataset_dir = dir;
    }
    if !config.dataset_dir.is_dir() {
        tracing::warn!(
            "Dataset directory {} does not exist, every query will return DatasetNotFound",
            config.dataset_dir.display()
        );
    }

    let reader = build_reader()?;
    info!(reader = reader.name(), dataset_dir = %config.dataset_dir.display(), "Dataset reader ready");

    let state = Arc::new(
        AppState::new(config, reader)
            .context("Failed to initialize application state")?
            .with_prometheus(prometheus),
    );
    let app = cfapi::router(state);

    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", args.listen))?;

    info!("GEOS-CF query server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}

#[cfg(feature = "netcdf")]
fn build_reader() -> Result<Arc<dyn DatasetReader>> {
    Ok(Arc::new(cf_dataset::NetCdfReader::new()))
}

#[cfg(not(feature = "netcdf"))]
fn build_reader() -> Result<Arc<dyn DatasetReader>> {
    anyhow::bail!("cfapi was built without NetCDF support; rebuild with `--features netcdf`")
}
