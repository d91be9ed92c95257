//! Configuration types for the FastDL mirror.
//!
//! Values come from three layers: built-in defaults, an optional TOML file and
//! CLI/environment overrides applied by the binary. Every field of the file is
//! optional.
//!
//! ```toml
//! port = 3003
//! sources_root = "/srv/games"
//! output_root = "/srv/fastdl"
//! projects = ["bhop", "surf"]
//! categories = ["materials", "sound"]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::SyncError;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3003;

/// Minimum interval between accepted runs.
pub const DEFAULT_COOLDOWN_SECS: u64 = 60;

/// Paths the HTTP server uses for its own routes; a project mounted there
/// would collide with them.
pub const RESERVED_PROJECT_NAMES: &[&str] = &["health", "ws"];

/// Top-level mirror configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FastDlConfig {
    /// Port the HTTP server listens on.
    pub port: u16,
    /// Directory holding one folder per project (the game server installs).
    pub sources_root: PathBuf,
    /// Directory the public download tree is written to.
    pub output_root: PathBuf,
    /// Game content folder inside each project, e.g. `cstrike`.
    pub game_dir: String,
    /// Projects to mirror, in processing order.
    pub projects: Vec<String>,
    /// Asset categories mirrored for every project, in processing order.
    pub categories: Vec<String>,
    /// File extension that is never copied (map files).
    pub excluded_extension: String,
    /// Seconds between accepted runs.
    pub cooldown_secs: u64,
    /// Compression program invoked once per file.
    pub compressor: String,
    /// Suffix the compressor appends to its output.
    pub compressed_suffix: String,
}

impl Default for FastDlConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            sources_root: PathBuf::from(".."),
            output_root: PathBuf::from("."),
            game_dir: "cstrike".to_string(),
            projects: vec!["bhop".to_string(), "surf".to_string()],
            categories: vec!["materials".to_string(), "sound".to_string()],
            excluded_extension: "bsp".to_string(),
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            compressor: "bzip2".to_string(),
            compressed_suffix: "bz2".to_string(),
        }
    }
}

/// A source/destination pair of directory trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    pub source_root: PathBuf,
    pub dest_root: PathBuf,
}

impl FastDlConfig {
    /// Parses a configuration from TOML text and validates it.
    pub fn from_toml_str(content: &str) -> Result<Self, SyncError> {
        let mut config: FastDlConfig = toml::from_str(content)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Loads the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        info!(config_path = %path.display(), "Loading configuration file");
        let content =
            std::fs::read_to_string(path).map_err(|e| SyncError::io("read config", path, e))?;
        let config = Self::from_toml_str(&content)?;
        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    /// Loads `path` if given, otherwise the default config file if it exists,
    /// otherwise the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, SyncError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn normalize(&mut self) {
        if let Some(stripped) = self.excluded_extension.strip_prefix('.') {
            self.excluded_extension = stripped.to_string();
        }
        if let Some(stripped) = self.compressed_suffix.strip_prefix('.') {
            self.compressed_suffix = stripped.to_string();
        }
    }

    /// Checks that the configuration can drive a run.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.projects.is_empty() {
            return Err(SyncError::Config("no projects configured".to_string()));
        }
        if self.categories.is_empty() {
            return Err(SyncError::Config("no asset categories configured".to_string()));
        }
        for name in self.projects.iter().chain(&self.categories) {
            if !is_plain_name(name) {
                return Err(SyncError::Config(format!(
                    "'{}' is not a plain directory name",
                    name
                )));
            }
        }
        if let Some(name) = self
            .projects
            .iter()
            .find(|name| RESERVED_PROJECT_NAMES.contains(&name.as_str()))
        {
            return Err(SyncError::Config(format!(
                "project name '{}' is reserved for a server route",
                name
            )));
        }
        if self.excluded_extension.is_empty() {
            return Err(SyncError::Config("excluded_extension is empty".to_string()));
        }
        if self.compressor.trim().is_empty() {
            return Err(SyncError::Config("compressor is empty".to_string()));
        }
        Ok(())
    }

    /// Projects in processing order, with their resolved roots.
    pub fn projects(&self) -> Vec<Project> {
        self.projects
            .iter()
            .map(|name| Project {
                name: name.clone(),
                source_root: self.sources_root.join(name).join(&self.game_dir),
                dest_root: self.output_root.join(name),
            })
            .collect()
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// Default config file location: `<config dir>/fastdl/fastdl.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("fastdl").join("fastdl.toml"))
}
