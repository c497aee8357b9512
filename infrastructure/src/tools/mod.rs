//! Tool handler implementations
//!
//! The four handler variants behind the `ToolHandler` port:
//!
//! | Handler | Kind | Source |
//! |---------|------|--------|
//! | [`FunctionHandler`] | `function` | async closure (all built-ins) |
//! | [`ShellHandler`] | `shell` | `[shell]` config |
//! | [`BrowserActionHandler`] | `browser` | a `BrowserDriver` adapter |
//! | `RemoteToolHandler` | `external` | `[[remote_tools]]` config (`http-tools` feature) |

pub mod browser;
pub mod builtin;
pub mod function;
#[cfg(feature = "http-tools")]
pub mod remote;
pub mod shell;

pub use browser::BrowserActionHandler;
pub use builtin::builtin_tools;
pub use function::FunctionHandler;
#[cfg(feature = "http-tools")]
pub use remote::RemoteToolHandler;
pub use shell::ShellHandler;

use crate::config::FileConfig;
use std::sync::Arc;
use toolgate_application::{RegistryError, ToolHandler, ToolRegistry};
use tracing::{debug, warn};

/// Every handler the configuration asks for: built-ins, the shell tool
/// (unless disabled), and remote tools with an endpoint.
pub fn configured_tools(config: &FileConfig) -> Vec<Arc<dyn ToolHandler>> {
    let mut tools = builtin_tools();

    if config.shell.enabled {
        tools.push(Arc::new(ShellHandler::from_config(&config.shell)));
    }

    #[cfg(feature = "http-tools")]
    {
        let client = reqwest::Client::new();
        for remote in &config.remote_tools {
            if remote.endpoint.trim().is_empty() {
                warn!(tool = %remote.name, "Skipping remote tool without an endpoint");
                continue;
            }
            tools.push(Arc::new(RemoteToolHandler::from_config(remote, client.clone())));
        }
    }
    #[cfg(not(feature = "http-tools"))]
    if !config.remote_tools.is_empty() {
        warn!(
            count = config.remote_tools.len(),
            "Remote tools are configured but the http-tools feature is disabled"
        );
    }

    tools
}

/// Register [`configured_tools`] into `registry`, returning how many were added.
///
/// Duplicate names follow the registry's `allow_overwrite` setting.
pub fn register_configured_tools(
    registry: &ToolRegistry,
    config: &FileConfig,
) -> Result<usize, RegistryError> {
    let tools = configured_tools(config);
    let count = tools.len();
    registry.register_all(tools)?;
    debug!(count, "Registered configured tools");
    Ok(count)
}


#[cfg(test)]
mod tests {
    use super::*;
    use toolgate_application::RegistryParams;
    use toolgate_domain::ToolKind;

    #[test]
    fn test_configured_tools_include_shell_by_default() {
        let tools = configured_tools(&FileConfig::default());
        let names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
        assert!(names.contains(&"echo"));
        assert!(names.contains(&"calculate"));
        assert!(names.contains(&"shell"));
        assert!(tools.iter().any(|t| t.spec().kind == ToolKind::Shell));
    }

    #[test]
    fn test_disabled_shell_is_skipped() {
        let mut config = FileConfig::default();
        config.shell.enabled = false;
        let tools = configured_tools(&config);
        assert!(tools.iter().all(|t| t.name() != "shell"));
    }

    #[test]
    fn test_register_configured_tools() {
        let registry = ToolRegistry::new(RegistryParams::default());
        let count = register_configured_tools(&registry, &FileConfig::default()).unwrap();
        assert_eq!(registry.len(), count);

        // registering the same set again collides
        let err = register_configured_tools(&registry, &FileConfig::default()).unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyRegistered(_)));
    }
}
