use super::CliError;
use spaxel_core::common::SpaxelConfig;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Installs the stderr subscriber. `RUST_LOG` wins over the default level.
pub(super) fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // a subscriber may already be installed when running in-process
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub(super) fn load_config(path: Option<&Path>) -> Result<SpaxelConfig, CliError> {
    match path {
        Some(path) => SpaxelConfig::load(path).map_err(|error| CliError::Compute(error.into())),
        None => Ok(SpaxelConfig::default()),
    }
}
