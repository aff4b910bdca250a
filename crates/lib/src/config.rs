//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.bconsole-bridge/config.json`) and environment.
//! The `console` section locates the console binary and its config files; `gateway`
//! controls the HTTP surface.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Console program location, config paths, and execution settings.
    #[serde(default)]
    pub console: ConsoleConfig,

    /// Gateway server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// When true, every console invocation and its normalized result is logged under `bridge::execute`.
    #[serde(default)]
    pub debug: bool,
}

/// How the composed invocation is executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecMode {
    /// `sh -c` with the heredoc line; reproduces the historical invocation exactly.
    #[default]
    Shell,
    /// Spawn the argv directly and write the payload to the child's stdin. No shell involved.
    Direct,
}

/// Console program settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleConfig {
    /// Console binary (default "/usr/sbin/bconsole").
    #[serde(default = "default_bin_path")]
    pub bin_path: String,

    /// Primary console config file (default "/etc/bacula/bconsole.conf").
    #[serde(default = "default_cfg_path")]
    pub cfg_path: String,

    /// Per-user config template containing `{user}`, e.g. "/etc/bacula/bconsole-{user}.conf".
    /// Used instead of `cfg_path` when a request names an acting user.
    #[serde(default)]
    pub cfg_custom_path: Option<String>,

    /// Prefix invocations with `sudo`.
    #[serde(default)]
    pub use_sudo: bool,

    /// Kill the console process group after this many seconds (default 60). 0 disables the limit.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub exec_mode: ExecMode,
}

pub const DEFAULT_BIN_PATH: &str = "/usr/sbin/bconsole";
pub const DEFAULT_CFG_PATH: &str = "/etc/bacula/bconsole.conf";
pub const DEFAULT_CFG_CUSTOM_PATH: &str = "/etc/bacula/bconsole-{user}.conf";

fn default_bin_path() -> String {
    DEFAULT_BIN_PATH.to_string()
}

fn default_cfg_path() -> String {
    DEFAULT_CFG_PATH.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            bin_path: default_bin_path(),
            cfg_path: default_cfg_path(),
            cfg_custom_path: None,
            use_sudo: false,
            timeout_secs: default_timeout_secs(),
            exec_mode: ExecMode::default(),
        }
    }
}

impl ConsoleConfig {
    /// Process timeout, or None when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Gateway bind, port, and auth settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for HTTP (default 9096).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,

    /// Auth settings. When absent, defaults to no auth for loopback bind.
    #[serde(default)]
    pub auth: GatewayAuthConfig,
}

/// Gateway auth: token or none (loopback-only when none).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayAuthConfig {
    /// "none" = no shared secret (only safe when bind is loopback). "token" = require a bearer token.
    #[serde(default)]
    pub mode: GatewayAuthMode,

    /// Shared secret for HTTP requests. Overridden by BRIDGE_GATEWAY_TOKEN env.
    pub token: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayAuthMode {
    /// No auth; allow only when bind is loopback.
    #[default]
    None,

    /// Require `Authorization: Bearer <token>` to match the configured token.
    Token,
}

fn default_gateway_port() -> u16 {
    9096
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
            auth: GatewayAuthConfig::default(),
        }
    }
}

/// Resolve the gateway token: env BRIDGE_GATEWAY_TOKEN overrides config.
pub fn resolve_gateway_token(config: &Config) -> Option<String> {
    std::env::var("BRIDGE_GATEWAY_TOKEN")
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            config
                .gateway
                .auth
                .token
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// True if the bind address is loopback (127.0.0.1, ::1, etc.).
pub fn is_loopback_bind(bind: &str) -> bool {
    let b = bind.trim();
    b == "127.0.0.1" || b == "::1" || b == "localhost"
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("BRIDGE_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".bconsole-bridge").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, or the default path (or BRIDGE_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
