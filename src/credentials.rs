// WHY: the API key may come from a flag, the environment or a dotfile; the lookup
// order is fixed so runs are reproducible

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::debug;

pub const API_KEY_ENV: &str = "JPDB_API_KEY";
pub const API_KEY_FILE: &str = ".jpdb_api_key";

/// `~/.jpdb_api_key`, if a home directory is known
pub fn default_key_file() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(API_KEY_FILE))
}

/// The `.env` load failure worth reporting; a missing file is normal
pub fn dotenv_problem<T>(loaded: Result<T, dotenvy::Error>) -> Option<dotenvy::Error> {
    loaded.err().filter(|e| !e.not_found())
}

/// Resolve the API key: `--api-key`, then `JPDB_API_KEY`, then `~/.jpdb_api_key`
pub fn resolve_api_key(cli_key: Option<String>) -> Result<String> {
    let env_key = std::env::var(API_KEY_ENV).ok();
    resolve_api_key_from(cli_key, env_key, default_key_file().as_deref())
}

/// Same lookup with every source passed in explicitly
pub fn resolve_api_key_from(
    cli_key: Option<String>,
    env_key: Option<String>,
    key_file: Option<&Path>,
) -> Result<String> {
    if let Some(key) = non_empty(cli_key) {
        debug!("Using API key from command line");
        return Ok(key);
    }

    if let Some(key) = non_empty(env_key) {
        debug!("Using API key from {}", API_KEY_ENV);
        return Ok(key);
    }

    if let Some(path) = key_file.filter(|p| p.exists()) {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading API key file {}", path.display()))?;
        if let Some(key) = non_empty(Some(content)) {
            debug!("Using API key from {}", path.display());
            return Ok(key);
        }
    }

    bail!("No API key provided. Provide via --api-key, {API_KEY_ENV} env var, or ~/{API_KEY_FILE}")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
