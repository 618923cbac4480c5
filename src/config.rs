//! Layered application configuration.
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. User config file (`<platform config dir>/collcheck/config.toml`)
//! 3. Project file `./collcheck.toml`, or the file given with `--config`
//! 4. `COLLCHECK_*` environment variables
//! 5. Command-line flags ([`Config::apply_cli`])
//!
//! Unknown keys in a config file are reported with a "did you mean"
//! suggestion but do not stop the run; invalid values do.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::annotate::{Annotator, DEFAULT_CHECKED_KEY, DEFAULT_DIGEST_KEY};
use crate::audit::{default_jobs, AuditConfig, DEFAULT_CACHE_PATH};
use crate::cli::{Cli, OutputFormat};
use crate::progress::ProgressCallback;
use crate::scanner::WalkerConfig;

/// Prefix for configuration environment variables.
pub const ENV_PREFIX: &str = "COLLCHECK_";

/// Project configuration file looked up in the invocation directory.
pub const PROJECT_CONFIG_FILE: &str = "collcheck.toml";

/// Every key a config file may set.
pub const KNOWN_KEYS: &[&str] = &[
    "cache_path",
    "jobs",
    "annotate",
    "digest_key",
    "checked_key",
    "skip_hidden",
    "ignore_patterns",
    "output",
    "progress",
];

/// Errors raised while building the configuration or validating inputs.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration source could not be parsed.
    #[error("Invalid configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// A configuration file named on the command line does not exist.
    #[error("Config file not found: {0}")]
    MissingFile(PathBuf),

    /// A key holds a value outside its domain.
    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue {
        /// Offending key
        key: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// The local root is missing or not a directory.
    #[error("Invalid local directory {path}: {reason}")]
    InvalidRoot {
        /// Path as given
        path: PathBuf,
        /// What is wrong with it
        reason: String,
    },
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Digest cache document, relative to the invocation directory.
    pub cache_path: PathBuf,
    /// Hashing worker count.
    pub jobs: usize,
    /// Write verification attributes after reconciling.
    pub annotate: bool,
    /// Attribute name for the verified digest.
    pub digest_key: String,
    /// Attribute name for the last-checked timestamp.
    pub checked_key: String,
    /// Exclude dot-files and dot-directories from the local scan.
    pub skip_hidden: bool,
    /// Gitignore-style patterns excluded from the local scan.
    pub ignore_patterns: Vec<String>,
    /// Report format.
    pub output: OutputFormat,
    /// Show a progress bar while hashing.
    pub progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            jobs: default_jobs(),
            annotate: false,
            digest_key: DEFAULT_DIGEST_KEY.to_string(),
            checked_key: DEFAULT_CHECKED_KEY.to_string(),
            skip_hidden: false,
            ignore_patterns: Vec::new(),
            output: OutputFormat::Text,
            progress: true,
        }
    }
}

impl Config {
    /// Load the configuration from every layer below the command line.
    ///
    /// `explicit` replaces the project file `./collcheck.toml` and must exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a source cannot be parsed, the explicit
    /// file is missing, or a value is invalid.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut files = Vec::new();
        if let Some(user) = Self::user_config_path() {
            files.push(user);
        }
        match explicit {
            Some(path) if !path.is_file() => {
                return Err(ConfigError::MissingFile(path.to_path_buf()))
            }
            Some(path) => files.push(path.to_path_buf()),
            None => files.push(PathBuf::from(PROJECT_CONFIG_FILE)),
        }

        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        for file in &files {
            if file.is_file() {
                log::debug!("Reading config file {}", file.display());
                warn_unknown_keys(file);
            }
            figment = figment.merge(Toml::file(file));
        }
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Extract and validate a configuration from a prepared figment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on parse or validation failure.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Config = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Path of the per-user config file, if the platform defines one.
    #[must_use]
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "collcheck", "collcheck")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Overlay command-line flags. Flags that were not given leave the
    /// loaded value in place.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the result fails validation.
    pub fn apply_cli(&mut self, cli: &Cli) -> Result<(), ConfigError> {
        if let Some(jobs) = cli.jobs {
            self.jobs = jobs;
        }
        if let Some(ref cache) = cli.cache {
            self.cache_path = cache.clone();
        }
        if let Some(output) = cli.output {
            self.output = output;
        }
        self.annotate |= cli.annotate;
        self.skip_hidden |= cli.skip_hidden;
        self.ignore_patterns
            .extend(cli.ignore_patterns.iter().cloned());
        if cli.no_progress || cli.quiet {
            self.progress = false;
        }
        self.validate()
    }

    /// Check value domains.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jobs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "jobs",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.cache_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "cache_path",
                reason: "must not be empty".to_string(),
            });
        }
        for (key, value) in [
            ("digest_key", &self.digest_key),
            ("checked_key", &self.checked_key),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key,
                    reason: "must not be empty".to_string(),
                });
            }
        }
        if self.digest_key == self.checked_key {
            return Err(ConfigError::InvalidValue {
                key: "checked_key",
                reason: "must differ from digest_key".to_string(),
            });
        }
        Ok(())
    }

    /// Build the pipeline configuration.
    #[must_use]
    pub fn audit_config(&self, progress: Option<Arc<dyn ProgressCallback>>) -> AuditConfig {
        let config = AuditConfig::default()
            .with_jobs(self.jobs)
            .with_cache_path(&self.cache_path)
            .with_annotate(self.annotate)
            .with_annotator(Annotator::new(&self.digest_key, &self.checked_key))
            .with_walker_config(WalkerConfig::new(
                self.skip_hidden,
                self.ignore_patterns.clone(),
            ));
        match progress {
            Some(callback) => config.with_progress_callback(callback),
            None => config,
        }
    }
}

/// Keys in `content` that are not configuration keys, with the closest
/// known key when one is similar enough.
#[must_use]
pub fn unknown_keys(content: &str) -> Vec<(String, Option<&'static str>)> {
    let Ok(table) = content.parse::<toml::Table>() else {
        return Vec::new();
    };
    let mut unknown: Vec<_> = table
        .keys()
        .filter(|key| !KNOWN_KEYS.contains(&key.as_str()))
        .map(|key| (key.clone(), suggest_key(key)))
        .collect();
    unknown.sort();
    unknown
}

/// Closest known key to `key`, if any is reasonably similar.
#[must_use]
pub fn suggest_key(key: &str) -> Option<&'static str> {
    KNOWN_KEYS
        .iter()
        .map(|known| (*known, strsim::jaro_winkler(key, known)))
        .filter(|(_, score)| *score > 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(known, _)| known)
}

fn warn_unknown_keys(path: &Path) {
    let Ok(content) = std::fs::read_to_string(path) else {
        return;
    };
    for (key, suggestion) in unknown_keys(&content) {
        match suggestion {
            Some(known) => log::warn!(
                "Unknown key '{}' in {} (did you mean '{}'?)",
                key,
                path.display(),
                known
            ),
            None => log::warn!("Unknown key '{}' in {}", key, path.display()),
        }
    }
}
