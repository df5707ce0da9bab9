// src/config.rs
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const ENV_CONFIG_PATH: &str = "DASHBOARD_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config/dashboard.toml";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Runtime configuration. Environment variables win over the optional TOML
/// file; the store URL and key are mandatory.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub bind_addr: String,
}

#[derive(Debug, Default, serde::Deserialize)]
struct FileConfig {
    supabase_url: Option<String>,
    supabase_anon_key: Option<String>,
    bind_addr: Option<String>,
}

/// Load configuration:
/// 1) optional TOML file ($DASHBOARD_CONFIG_PATH, else config/dashboard.toml)
/// 2) env vars SUPABASE_URL / SUPABASE_ANON_KEY / BIND_ADDR override the file
pub fn load() -> Result<AppConfig> {
    let file = load_file()?;

    let supabase_url = std::env::var("SUPABASE_URL")
        .ok()
        .or(file.supabase_url)
        .context("SUPABASE_URL not set (env or config file)")?;
    let supabase_anon_key = std::env::var("SUPABASE_ANON_KEY")
        .ok()
        .or(file.supabase_anon_key)
        .context("SUPABASE_ANON_KEY not set (env or config file)")?;
    let bind_addr = std::env::var("BIND_ADDR")
        .ok()
        .or(file.bind_addr)
        .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

    Ok(AppConfig {
        supabase_url,
        supabase_anon_key,
        bind_addr,
    })
}

fn load_file() -> Result<FileConfig> {
    let path = match std::env::var(ENV_CONFIG_PATH) {
        Ok(p) => {
            let pb = PathBuf::from(p);
            anyhow::ensure!(
                pb.exists(),
                "DASHBOARD_CONFIG_PATH points to non-existent path"
            );
            pb
        }
        Err(_) => {
            let pb = PathBuf::from(DEFAULT_CONFIG_PATH);
            if !pb.exists() {
                return Ok(FileConfig::default());
            }
            pb
        }
    };
    parse_file(&path)
}

fn parse_file(path: &Path) -> Result<FileConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
}
