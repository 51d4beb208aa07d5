// Configuration management for classnav

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".classnav.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub resolution: ResolutionConfig,
    pub indexing: IndexingConfig,
    pub logging: LoggingConfig,
}

/// Where member owners are looked up
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Consult the runtime library before the archive
    pub runtime_types: bool,
    /// JDK whose classes make up the runtime library
    pub java_home: Option<PathBuf>,
    /// Look for a JDK through `JAVA_HOME` and `PATH` when `java_home` is unset
    pub detect_jdk: bool,
    pub archive_extensions: Vec<String>,
    pub skip_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    pub workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            runtime_types: true,
            java_home: None,
            detect_jdk: true,
            archive_extensions: vec!["jar".to_string(), "zip".to_string()],
            skip_prefixes: vec!["META-INF/".to_string()],
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self { workers: 4 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl ResolutionConfig {
    /// Check if an archive entry should be read as a class file
    pub fn should_scan_entry(&self, entry_name: &str) -> bool {
        if !entry_name.ends_with(".class") {
            return false;
        }
        let name = entry_name.trim_start_matches('/');
        if name == "module-info.class" || name.ends_with("/module-info.class") {
            return false;
        }
        !self
            .skip_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
    }

    /// Check if a path names a zip-format archive
    pub fn is_archive(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.archive_extensions
                    .iter()
                    .any(|candidate| candidate.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from project directory
    /// Looks for .classnav.toml in the project root
    pub fn from_project_dir<P: AsRef<Path>>(project_dir: P) -> Self {
        let config_path = project_dir.as_ref().join(CONFIG_FILE_NAME);

        match Self::from_file(&config_path) {
            Ok(config) => {
                tracing::info!("Loaded configuration from {}", config_path.display());
                config
            }
            Err(e) => {
                tracing::debug!("Could not load config from {}: {}", config_path.display(), e);
                Self::default()
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.resolution.archive_extensions.is_empty() {
            return Err(anyhow::anyhow!("At least one archive extension is required"));
        }
        if let Some(ext) = self
            .resolution
            .archive_extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.starts_with('.'))
        {
            return Err(anyhow::anyhow!("Invalid archive extension: {:?}", ext));
        }

        if let Some(home) = &self.resolution.java_home {
            if !home.is_dir() {
                return Err(anyhow::anyhow!("java_home is not a directory: {}", home.display()));
            }
        }

        if self.indexing.workers == 0 {
            return Err(anyhow::anyhow!("Worker count must be greater than 0"));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!("Invalid log level: {}", self.logging.level));
        }
        let valid_formats = ["compact", "pretty"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!("Invalid log format: {}", self.logging.format));
        }

        Ok(())
    }
}

/// Load configuration for a project
pub fn load_config(project_dir: &str) -> Config {
    Config::from_project_dir(project_dir)
}
