use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub const CONFIG_PATH_ENV: &str = "SHOKO_WATCHED_SYNC_CONFIG";

pub fn config_file_path() -> Result<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_PATH_ENV).filter(|path| !path.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let base = dirs::config_dir().context("unable to resolve config directory")?;
    Ok(base.join("shoko-watched-sync").join("config.toml"))
}
