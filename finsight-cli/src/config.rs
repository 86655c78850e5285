use anyhow::{bail, Context, Result};
use finsight_client::{ApiConfig, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::state::config_path;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub dashboard: DashboardSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSection {
    pub base_url: String,

    /// Per-request timeout. Unset means requests run until the transport gives up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSection {
    /// "mock" or "remote"
    pub source: String,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: None,
        }
    }
}

impl Default for DashboardSection {
    fn default() -> Self {
        Self {
            source: "mock".to_string(),
        }
    }
}

impl Config {
    /// `FINSIGHT_API_URL` wins over the file.
    pub fn api_config(&self) -> ApiConfig {
        let base_url = std::env::var("FINSIGHT_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.api.base_url.clone());
        let cfg = ApiConfig::new(base_url);
        match self.api.request_timeout_secs {
            Some(secs) if secs > 0 => cfg.with_timeout(Duration::from_secs(secs)),
            _ => cfg,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Mock,
    Remote,
}

pub fn parse_source(raw: &str) -> Result<SourceKind> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "mock" => Ok(SourceKind::Mock),
        "remote" => Ok(SourceKind::Remote),
        other => bail!("unknown dashboard source '{other}' (expected mock or remote)"),
    }
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config_to(p: &Path, cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config_to(&p, &Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}
