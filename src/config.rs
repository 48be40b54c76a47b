//! Application configuration management.
//!
//! Configuration is layered with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML configuration file
//! 3. The selected `[profile.<name>]` table from that file
//! 4. `MEMFS_*` environment variables
//! 5. CLI flags (see [`Config::merge_cli`])
//!
//! A configuration that fails to parse is reported and replaced by the
//! defaults, so a broken file never stops a load.
//!
//! # Example
//!
//! ```toml
//! pool = "web"
//! backend = "sqlite"
//! max_body_bytes = 52428800
//! database = "/var/cache/memfs/web.db"
//!
//! [profile.templates]
//! pool = "templates"
//! open_marker = "{%"
//! close_marker = "%}"
//! ```

use anyhow::Result;
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::{Cli, StoreBackend};
use crate::source::{
    Markers, DEFAULT_CLOSE_MARKER, DEFAULT_MAX_BODY_BYTES, DEFAULT_OPEN_MARKER,
};

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "MEMFS_";

/// Default cache pool name.
pub const DEFAULT_POOL: &str = "memfs";

/// Keys accepted at the top level and inside profiles.
const KNOWN_KEYS: &[&str] = &[
    "pool",
    "backend",
    "database",
    "open_marker",
    "close_marker",
    "http_timeout_secs",
    "max_body_bytes",
    "required",
];

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cache pool name.
    pub pool: String,
    /// Cache backend.
    pub backend: StoreBackend,
    /// Database file for the sqlite backend. Platform cache dir when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
    /// Marker that valid content must contain.
    pub open_marker: String,
    /// Marker stored content must end on.
    pub close_marker: String,
    /// Whole-request timeout for remote resources, in seconds.
    pub http_timeout_secs: u64,
    /// Largest remote response body accepted, in bytes.
    pub max_body_bytes: u64,
    /// Treat every load as required.
    pub required: bool,
    /// Named overrides selectable with `--profile`.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub profile: HashMap<String, ProfileConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pool: DEFAULT_POOL.to_string(),
            backend: StoreBackend::default(),
            database: None,
            open_marker: DEFAULT_OPEN_MARKER.to_string(),
            close_marker: DEFAULT_CLOSE_MARKER.to_string(),
            http_timeout_secs: 30,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            required: false,
            profile: HashMap::new(),
        }
    }
}

/// Profile overrides. Unset fields keep the base value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<StoreBackend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_marker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_marker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_body_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

impl Config {
    /// Load configuration from `path`, or from the platform default location.
    ///
    /// # Priority
    ///
    /// Later layers override earlier ones:
    ///
    /// 1. Built-in defaults
    /// 2. The TOML file
    /// 3. The selected `[profile.<name>]` table
    /// 4. `MEMFS_*` environment variables
    ///
    /// CLI flags are applied afterwards by [`Config::merge_cli`].
    ///
    /// # Arguments
    ///
    /// * `path` - Explicit config file (`--config` / `MEMFS_CONFIG`); `None`
    ///   uses the platform config directory
    /// * `profile` - Profile table to apply, if any
    ///
    /// Never fails: an unreadable or invalid file is logged and defaults are
    /// used instead.
    pub fn load(path: Option<&Path>, profile: Option<&str>) -> Self {
        match path.map(Path::to_path_buf).or_else(Self::default_config_path) {
            Some(path) => Self::load_from_path(path, profile),
            None => Self::extract_or_default(Self::base_figment(None), profile),
        }
    }

    /// Load configuration from a specific file, applying an optional profile.
    ///
    /// A missing file is not an error. An unknown profile is reported and ignored.
    /// Unrecognized keys are warned about, with a suggestion when one is close.
    pub fn load_from_path(path: PathBuf, profile: Option<&str>) -> Self {
        if path.exists() {
            warn_unknown_keys(&path);
        } else {
            log::debug!("Config file not found, using defaults: {}", path.display());
        }
        Self::extract_or_default(Self::base_figment(Some(&path)), profile)
    }

    fn base_figment(path: Option<&Path>) -> Figment {
        let figment = Figment::from(Serialized::defaults(Config::default()));
        match path {
            Some(path) => figment.merge(Toml::file(path)),
            None => figment,
        }
    }

    fn extract_or_default(base: Figment, profile: Option<&str>) -> Self {
        match Self::extract(base, profile) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Invalid configuration, using defaults: {}", e);
                Self::default()
            }
        }
    }

    fn extract(base: Figment, profile: Option<&str>) -> Result<Self> {
        let mut figment = base;

        if let Some(name) = profile {
            let profiles: HashMap<String, ProfileConfig> =
                figment.extract_inner("profile").unwrap_or_default();
            match profiles.get(name) {
                Some(overrides) => {
                    log::debug!("Applying config profile: {}", name);
                    figment = figment.merge(Serialized::defaults(overrides.clone()));
                }
                None => log::warn!("Config profile not found: {}", name),
            }
        }

        let figment = figment.merge(
            Env::prefixed(ENV_PREFIX)
                .ignore(&["config", "profile"])
                .split("__"),
        );
        Ok(figment.extract()?)
    }

    /// Apply global CLI overrides.
    pub fn merge_cli(&mut self, cli: &Cli) {
        if let Some(pool) = &cli.pool {
            self.pool.clone_from(pool);
        }
        if let Some(backend) = cli.backend {
            self.backend = backend;
        }
        if let Some(database) = &cli.database {
            self.database = Some(database.clone());
        }
    }

    /// Content markers, validated.
    pub fn markers(&self) -> Result<Markers> {
        Markers::new(self.open_marker.as_str(), self.close_marker.as_str())
            .ok_or_else(|| anyhow::anyhow!("Content markers must not be empty"))
    }

    /// Remote request timeout.
    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Database file for the sqlite backend.
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.database {
            return Ok(path.clone());
        }
        let project_dirs = project_dirs()?;
        Ok(project_dirs.cache_dir().join("memfs.db"))
    }

    /// Get the default platform-specific configuration path.
    fn default_config_path() -> Option<PathBuf> {
        project_dirs()
            .ok()
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "memfs", "memfs")
        .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))
}

/// Warn about keys in the config file that will be ignored.
fn warn_unknown_keys(path: &Path) {
    let Ok(content) = std::fs::read_to_string(path) else {
        return;
    };
    let Ok(table) = content.parse::<toml::Table>() else {
        // Reported by figment on extraction
        return;
    };

    for (key, value) in &table {
        if key == "profile" {
            if let Some(profiles) = value.as_table() {
                for (name, profile) in profiles {
                    if let Some(profile) = profile.as_table() {
                        for key in profile.keys() {
                            check_key(key, Some(name));
                        }
                    }
                }
            }
            continue;
        }
        check_key(key, None);
    }
}

fn check_key(key: &str, profile: Option<&str>) {
    if KNOWN_KEYS.contains(&key) {
        return;
    }
    let location = profile.map_or_else(String::new, |name| format!(" in profile '{name}'"));
    match suggest_key(key) {
        Some(suggestion) => log::warn!(
            "Unknown config key '{}'{}, did you mean '{}'?",
            key,
            location,
            suggestion
        ),
        None => log::warn!("Unknown config key '{}'{}", key, location),
    }
}

/// Closest known key, if any is reasonably close.
pub fn suggest_key(key: &str) -> Option<&'static str> {
    KNOWN_KEYS
        .iter()
        .map(|known| (*known, strsim::jaro_winkler(key, known)))
        .filter(|(_, score)| *score >= 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(known, _)| known)
}
