//! Configuration file loading for toolgate
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `TOOLGATE_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./toolgate.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/toolgate/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    BACKEND_PROVIDERS, DEFAULT_SHELL_COMMANDS, FileAgentConfig, FileBackendConfig, FileConfig,
    FileLoggingConfig, FileOrchestratorConfig, FileRegistryConfig, FileRemoteToolConfig,
    FileRetryConfig, FileShellConfig, FileToolParameter,
};
pub use loader::{ConfigError, ConfigLoader, ENV_PREFIX, PROJECT_CONFIG_FILE};
