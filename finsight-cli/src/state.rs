use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$FINSIGHT_HOME`, else `~/.finsight`.
pub fn finsight_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("FINSIGHT_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".finsight"))
}

pub fn ensure_finsight_home() -> Result<PathBuf> {
    let dir = finsight_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn session_path() -> Result<PathBuf> {
    Ok(ensure_finsight_home()?.join("session.json"))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_finsight_home()?.join("config.toml"))
}
