use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use vitrine::ShowcaseConfig;

const DEFAULT_CONFIG: &str = "vitrine.toml";

fn main() -> anyhow::Result<()> {
    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

    // Parse before tracing is up so the configured level applies from the start.
    let config = ShowcaseConfig::load_or_default(&path);
    let level = config
        .as_ref()
        .map(|c| c.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());

    // RUST_LOG wins over the config file.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = config.with_context(|| format!("loading {}", path.display()))?;
    tracing::info!(
        config = %path.display(),
        found = path.exists(),
        model = %config.model.path.display(),
        "Starting vitrine"
    );
    vitrine::run(config).context("showcase terminated")?;
    Ok(())
}
