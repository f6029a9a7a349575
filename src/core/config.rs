//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.loupe/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::actions::DEFAULT_MAX_ITEMS_LISTED;
use crate::core::backoff::{DEFAULT_MAX_INTERVAL, DEFAULT_MIN_INTERVAL, PollState};
use crate::core::bridge::{BridgeSettings, DEFAULT_MAX_ITEMS, DEFAULT_PULL_WAIT, DEFAULT_QUEUE_PAGES};
use crate::core::keys::KeyBindings;
use crate::core::navigation::{DEFAULT_ITEMS_REFRESH, DEFAULT_LIVENESS, NavConfig};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoupeConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub follow: FollowConfig,
    #[serde(default)]
    pub tui: TuiConfig,
    #[serde(default)]
    pub keys: KeyBindings,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServiceConfig {
    pub endpoint: Option<String>,
    pub token: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FetchConfig {
    pub queue_pages: Option<usize>,
    pub max_entries: Option<usize>,
    pub pull_wait_ms: Option<u64>,
    pub max_items: Option<usize>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FollowConfig {
    pub min_interval_ms: Option<u64>,
    pub max_interval_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TuiConfig {
    pub items_refresh_secs: Option<u64>,
    pub liveness_secs: Option<u64>,
    pub wrap: Option<bool>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/api";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub endpoint: String,
    pub token: Option<String>,
    pub request_timeout: Duration,
    pub bridge: BridgeSettings,
    pub max_items_listed: usize,
    pub follow_min_interval: Duration,
    pub follow_max_interval: Duration,
    pub nav: NavConfig,
}

impl ResolvedConfig {
    /// Fresh poll state for one followed stream.
    pub fn follow_poll_state(&self) -> PollState {
        PollState::new(self.follow_min_interval, self.follow_max_interval)
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.loupe/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".loupe").join("config.toml"))
}

/// Load config from `~/.loupe/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `LoupeConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<LoupeConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(LoupeConfig::default());
        }
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<LoupeConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(LoupeConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: LoupeConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

const DEFAULT_CONFIG_CONTENT: &str = r#"# Loupe Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [service]
# endpoint = "http://localhost:8080/api"   # Or set LOUPE_ENDPOINT / --endpoint
# token = "..."                            # Or set LOUPE_TOKEN
# request_timeout_secs = 30

# [fetch]
# queue_pages = 100        # Pages buffered between fetch worker and viewer
# max_entries = 20000      # Events loaded when opening a stream
# pull_wait_ms = 50        # How long one pull waits before yielding
# max_items = 1000         # Streams listed per group

# [follow]
# min_interval_ms = 1000
# max_interval_ms = 16000

# [tui]
# items_refresh_secs = 30
# liveness_secs = 5
# wrap = false

# [keys]
# quit = "ctrl+c"
# back = "esc"
# select = "enter"
# scroll_top = "home"
# scroll_bottom = "end"
# filter = "/"
# toggle_wrap = "w"
"#;

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, DEFAULT_CONFIG_CONTENT) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
///
/// `cli_endpoint` is the `--endpoint` flag (None = not specified).
pub fn resolve(config: &LoupeConfig, cli_endpoint: Option<&str>) -> ResolvedConfig {
    resolve_with_env(config, cli_endpoint, |name| std::env::var(name).ok())
}

fn resolve_with_env(
    config: &LoupeConfig,
    cli_endpoint: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Endpoint: CLI → env → config → default
    let endpoint = cli_endpoint
        .map(|s| s.to_string())
        .or_else(|| env("LOUPE_ENDPOINT"))
        .or_else(|| config.service.endpoint.clone())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

    // Token: env → config
    let token = env("LOUPE_TOKEN")
        .or_else(|| config.service.token.clone())
        .filter(|t| !t.trim().is_empty());

    let fetch = &config.fetch;
    let bridge = BridgeSettings {
        queue_pages: fetch.queue_pages.unwrap_or(DEFAULT_QUEUE_PAGES),
        max_items: fetch.max_entries.unwrap_or(DEFAULT_MAX_ITEMS),
        pull_wait: fetch
            .pull_wait_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_PULL_WAIT),
    };

    let tui = &config.tui;
    let liveness = tui
        .liveness_secs
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_LIVENESS);
    let nav = NavConfig {
        keys: config.keys.clone(),
        items_refresh: tui
            .items_refresh_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_ITEMS_REFRESH),
        liveness,
        liveness_max: DEFAULT_MAX_INTERVAL.max(liveness),
        wrap: tui.wrap.unwrap_or(false),
    };

    ResolvedConfig {
        endpoint,
        token,
        request_timeout: config
            .service
            .request_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT),
        bridge,
        max_items_listed: fetch.max_items.unwrap_or(DEFAULT_MAX_ITEMS_LISTED),
        follow_min_interval: config
            .follow
            .min_interval_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_MIN_INTERVAL),
        follow_max_interval: config
            .follow
            .max_interval_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_MAX_INTERVAL),
        nav,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::keys::{Command, Key};

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved = resolve_with_env(&LoupeConfig::default(), None, no_env);
        assert_eq!(resolved.endpoint, DEFAULT_ENDPOINT);
        assert!(resolved.token.is_none());
        assert_eq!(resolved.request_timeout, Duration::from_secs(30));
        assert_eq!(resolved.bridge, BridgeSettings::default());
        assert_eq!(resolved.max_items_listed, 1000);
        assert_eq!(resolved.nav, NavConfig::default());
        let poll = resolved.follow_poll_state();
        assert_eq!(poll.min_interval, Duration::from_secs(1));
        assert_eq!(poll.max_interval, Duration::from_secs(16));
    }

    #[test]
    fn test_endpoint_precedence() {
        let config = LoupeConfig {
            service: ServiceConfig {
                endpoint: Some("http://from-file".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let env = |name: &str| (name == "LOUPE_ENDPOINT").then(|| "http://from-env".to_string());

        assert_eq!(resolve_with_env(&config, None, no_env).endpoint, "http://from-file");
        assert_eq!(resolve_with_env(&config, None, env).endpoint, "http://from-env");
        assert_eq!(
            resolve_with_env(&config, Some("http://from-cli"), env).endpoint,
            "http://from-cli"
        );
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let env = |name: &str| (name == "LOUPE_TOKEN").then(|| "  ".to_string());
        assert!(resolve_with_env(&LoupeConfig::default(), None, env).token.is_none());
    }

    #[test]
    fn test_toml_round_trip() {
        let toml_str = r#"
[service]
endpoint = "https://logs.internal/api"
token = "secret"
request_timeout_secs = 10

[fetch]
max_entries = 500
pull_wait_ms = 20

[follow]
min_interval_ms = 250
max_interval_ms = 4000

[tui]
liveness_secs = 2
wrap = true

[keys]
quit = "q"
"#;
        let config: LoupeConfig = toml::from_str(toml_str).unwrap();
        let resolved = resolve_with_env(&config, None, no_env);
        assert_eq!(resolved.endpoint, "https://logs.internal/api");
        assert_eq!(resolved.token.as_deref(), Some("secret"));
        assert_eq!(resolved.request_timeout, Duration::from_secs(10));
        assert_eq!(resolved.bridge.max_items, 500);
        assert_eq!(resolved.bridge.queue_pages, DEFAULT_QUEUE_PAGES);
        assert_eq!(resolved.bridge.pull_wait, Duration::from_millis(20));
        assert_eq!(resolved.follow_min_interval, Duration::from_millis(250));
        assert_eq!(resolved.follow_max_interval, Duration::from_secs(4));
        assert_eq!(resolved.nav.liveness, Duration::from_secs(2));
        assert!(resolved.nav.wrap);
        assert!(resolved.nav.keys.is(&Key::Char('q'), Command::Quit));
        assert!(resolved.nav.keys.is(&Key::Esc, Command::Back));
    }

    #[test]
    fn test_generated_default_is_all_comments() {
        let config: LoupeConfig = toml::from_str(DEFAULT_CONFIG_CONTENT).unwrap();
        assert!(config.service.endpoint.is_none());
        assert_eq!(config.keys, KeyBindings::default());
    }

    #[test]
    fn test_missing_file_is_generated() {
        let dir = std::env::temp_dir().join(format!("loupe-config-{}", std::process::id()));
        let path = dir.join("config.toml");
        let _ = fs::remove_dir_all(&dir);

        let config = load_config_from(&path).unwrap();
        assert!(config.service.endpoint.is_none());
        assert!(path.exists());
        // Second load parses the generated file.
        assert!(load_config_from(&path).is_ok());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = std::env::temp_dir().join(format!("loupe-bad-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(&path, "[service\nendpoint = ").unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse(_))));
        let _ = fs::remove_dir_all(&dir);
    }
}
