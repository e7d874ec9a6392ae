mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use porthole_adapters::http::HttpPortholeApi;
use porthole_core::api::PortholeApi;
use porthole_core::config::{ClientConfig, ConfigError, FileConfigStore};

#[derive(Parser, Debug)]
#[command(name = "porthole", version, about = "Terminal client for a porthole query server")]
struct Args {
    /// Server base URL, e.g. http://127.0.0.1:5000
    #[arg(long)]
    server_root: Option<String>,
    /// Client config file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,
    /// tracing filter directives; RUST_LOG still takes precedence
    #[arg(long)]
    log_filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolvedConfig {
    config: ClientConfig,
    log_file: PathBuf,
}

fn resolve_config(args: &Args) -> Result<ResolvedConfig, ConfigError> {
    let store = match &args.config {
        Some(path) => FileConfigStore::load_from_path(path.clone())?,
        None => FileConfigStore::load_default()?,
    };
    let log_file = store.log_file();

    let mut config = store.into_config();
    if let Some(server_root) = &args.server_root {
        config.server_root.clone_from(server_root);
    }
    if let Some(log_filter) = &args.log_filter {
        config.log_filter.clone_from(log_filter);
    }

    Ok(ResolvedConfig { config, log_file })
}

fn run_app(
    config: &ClientConfig,
    run_tui: impl FnOnce(Arc<dyn PortholeApi>, &str) -> Result<(), porthole_tui::TuiError>,
) -> Result<(), Box<dyn std::error::Error>> {
    let api = HttpPortholeApi::new(config.server_root.clone(), config.request_timeout())?;
    tracing::info!(server_root = %api.root(), "starting porthole");
    run_tui(Arc::new(api), &config.server_root)?;
    tracing::info!("porthole exited");
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let resolved = resolve_config(&args)?;
    let _log_guard = logging::init(&resolved.config.log_filter, &resolved.log_file)?;
    run_app(&resolved.config, porthole_tui::run)
}
