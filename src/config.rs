use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub mirror: MirrorConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    7000
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.bind_address, self.port);
        addr.parse::<SocketAddr>()
            .or_else(|_| format!("[{}]:{}", self.bind_address, self.port).parse::<SocketAddr>())
            .with_context(|| format!("Invalid listen address: {}", addr))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_root")]
    pub root: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            root: default_catalog_root(),
        }
    }
}

fn default_catalog_root() -> PathBuf {
    PathBuf::from("cmds")
}

#[derive(Debug, Deserialize, Clone)]
pub struct MirrorConfig {
    /// Remote to mirror. The mirror is disabled when unset.
    #[serde(default)]
    pub repo_url: Option<String>,
    #[serde(default = "default_mirror_path")]
    pub path: PathBuf,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_git_timeout_secs")]
    pub git_timeout_secs: u64,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            repo_url: None,
            path: default_mirror_path(),
            branch: default_branch(),
            poll_interval_secs: default_poll_interval_secs(),
            git_timeout_secs: default_git_timeout_secs(),
        }
    }
}

fn default_mirror_path() -> PathBuf {
    PathBuf::from(".")
}
fn default_branch() -> String {
    "main".to_string()
}
fn default_poll_interval_secs() -> u64 {
    300
}
fn default_git_timeout_secs() -> u64 {
    120
}

impl MirrorConfig {
    pub fn is_enabled(&self) -> bool {
        self.repo_url.as_deref().is_some_and(|url| !url.is_empty())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.git_timeout_secs)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;

    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        bail!("server.port must be > 0");
    }
    config.server.socket_addr()?;

    if config.mirror.poll_interval_secs == 0 {
        bail!("mirror.poll_interval_secs must be > 0");
    }
    if config.mirror.git_timeout_secs == 0 {
        bail!("mirror.git_timeout_secs must be > 0");
    }
    if config.mirror.branch.trim().is_empty() {
        bail!("mirror.branch must not be empty");
    }

    Ok(())
}
