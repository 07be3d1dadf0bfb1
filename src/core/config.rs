//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::PathBuf;

use crate::core::project::{Project, PROJECT_DIR};

/// Log filter used when nothing else is configured
pub const DEFAULT_LOG: &str = "warn";

/// mouth configuration with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite store path, relative paths resolve against the project root
    pub database: Option<PathBuf>,

    /// User that changes are attributed to
    pub actor: Option<String>,

    /// tracing filter directive
    pub log: Option<String>,

    /// Default output format
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/mouth/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Project config (.mouth/config.yaml)
        if let Ok(project) = Project::discover() {
            if let Some(project_config) = Self::read_file(&project.config_path()) {
                config.merge(project_config);
            }
        }

        // 4. Environment variables
        config.merge(Self::from_env());

        config
    }

    /// Parse a config document
    pub fn from_yaml(contents: &str) -> Result<Self, serde_yml::Error> {
        serde_yml::from_str(contents)
    }

    fn read_file(path: &std::path::Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match Self::from_yaml(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                // Logging is not set up yet when config loads
                eprintln!("warning: ignoring {}: {}", path.display(), e);
                None
            }
        }
    }

    fn from_env() -> Self {
        Config {
            database: std::env::var_os("MOUTH_DATABASE").map(PathBuf::from),
            actor: std::env::var("MOUTH_ACTOR").ok(),
            log: std::env::var("MOUTH_LOG").ok(),
            default_format: None,
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "mouth")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.actor.is_some() {
            self.actor = other.actor;
        }
        if other.log.is_some() {
            self.log = other.log;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    /// Get the actor changes are attributed to, falling back to the username
    pub fn actor(&self) -> String {
        if let Some(ref actor) = self.actor {
            return actor.clone();
        }

        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }

    /// Get the log filter directive
    pub fn log_filter(&self) -> &str {
        self.log.as_deref().unwrap_or(DEFAULT_LOG)
    }

    /// Resolve the store location
    ///
    /// A configured path is taken relative to the project root (or the
    /// current directory outside a project).
    pub fn database_path(&self, project: Option<&Project>) -> PathBuf {
        match (&self.database, project) {
            (Some(path), _) if path.is_absolute() => path.clone(),
            (Some(path), Some(project)) => project.root().join(path),
            (Some(path), None) => path.clone(),
            (None, Some(project)) => project.default_database(),
            (None, None) => PathBuf::from(PROJECT_DIR).join("mouth.db"),
        }
    }
}
