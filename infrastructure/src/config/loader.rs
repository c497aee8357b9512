//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// Project-level config file name
pub const PROJECT_CONFIG_FILE: &str = "toolgate.toml";

/// Environment variable prefix; nested keys are separated by `__`
pub const ENV_PREFIX: &str = "TOOLGATE_";

/// Errors raised while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `TOOLGATE_*` environment variables (`TOOLGATE_REGISTRY__MAX_PARALLEL=4`)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./toolgate.toml`
    /// 4. XDG config: `$XDG_CONFIG_HOME/toolgate/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, ConfigError> {
        if let Some(path) = config_path
            && !path.exists()
        {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(project_path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(&project_path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        figment.extract().map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Load one file over the defaults, ignoring every other source
    pub fn load_file(path: &Path) -> Result<FileConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        Figment::new()
            .merge(Serialized::defaults(FileConfig::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Load only default configuration
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// `$XDG_CONFIG_HOME/toolgate/config.toml` (or the platform equivalent)
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("toolgate").join("config.toml"))
    }

    /// The project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        let path = PathBuf::from(PROJECT_CONFIG_FILE);
        path.exists().then_some(path)
    }

    /// Describe the config file locations being used, highest priority first
    pub fn config_sources(explicit: Option<&Path>) -> Vec<(String, PathBuf, bool)> {
        let mut sources = Vec::new();
        if let Some(path) = explicit {
            sources.push(("Explicit".to_string(), path.to_path_buf(), path.exists()));
        }
        let project = PathBuf::from(PROJECT_CONFIG_FILE);
        let found = project.exists();
        sources.push(("Project".to_string(), project, found));
        if let Some(global) = Self::global_config_path() {
            let found = global.exists();
            sources.push(("Global".to_string(), global, found));
        }
        sources
    }
}
