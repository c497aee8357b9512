//! CLI entrypoint for toolgate
//!
//! This is the main binary that wires together all layers using
//! dependency injection: one `Arc<ToolRegistry>` and one
//! `Arc<ToolOrchestrator>` per process, passed to whatever needs them.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use toolgate_application::{
    ApprovalHandler, AutoApproveHandler, SelectOptions, ToolOrchestrator, ToolRegistry,
};
use toolgate_domain::{Arguments, InvocationContext, has_errors};
use toolgate_infrastructure::{
    ConfigLoader, FileConfig, JsonlExecutionLogger, register_configured_tools,
};
use toolgate_presentation::{
    Cli, Command, ConsoleFormatter, ConsoleToolObserver, InteractiveApprovalHandler,
};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let _log_guard = init_logging(&cli, &config)?;
    info!("Starting toolgate");

    let issues = config.validate();
    if let Command::Config = cli.command {
        show_config(&cli, &config, &issues)?;
        return Ok(ExitCode::SUCCESS);
    }
    if !issues.is_empty() {
        eprint!("{}", ConsoleFormatter::format_issues(&issues));
    }
    if has_errors(&issues) {
        bail!("Configuration has errors; run `toolgate config` for details");
    }

    // === Dependency Injection ===
    let registry = Arc::new(ToolRegistry::new(config.to_registry_params()));
    let count = register_configured_tools(&registry, &config).context("Failed to register tools")?;
    debug!(count, "Tool catalog ready");

    let mut orchestrator = ToolOrchestrator::new(registry.clone(), config.to_orchestrator_params());
    if let Some(path) = &config.logging.execution_log {
        match JsonlExecutionLogger::new(path) {
            Some(logger) => orchestrator = orchestrator.with_logger(Arc::new(logger)),
            None => warn!("Execution log disabled: could not open {}", path.display()),
        }
    }
    let orchestrator = Arc::new(orchestrator);

    let result = dispatch(cli, &config, &registry, &orchestrator).await;
    registry.shutdown();
    result
}

async fn dispatch(
    cli: Cli,
    config: &FileConfig,
    registry: &Arc<ToolRegistry>,
    orchestrator: &Arc<ToolOrchestrator>,
) -> Result<ExitCode> {
    match cli.command {
        Command::Tools { category, json } => {
            let specs: Vec<_> = registry
                .specs()
                .into_iter()
                .filter(|s| category.as_ref().is_none_or(|c| s.category.eq_ignore_ascii_case(c)))
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&specs)?);
            } else {
                print!("{}", ConsoleFormatter::format_tools(&specs));
            }
        }

        Command::Discover {
            query,
            limit,
            category,
        } => {
            let mut options = SelectOptions::default().with_limit(limit);
            if let Some(category) = category {
                options = options.with_category(category);
            }
            let ranked = registry.select_tools(&query, &options);
            print!("{}", ConsoleFormatter::format_ranked(&query, &ranked));
        }

        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&registry.export_schemas())?);
        }

        Command::Run {
            tool,
            args,
            user,
            session,
            yes,
            json,
        } => {
            let arguments = parse_arguments(&args)?;
            let mut context = InvocationContext::new();
            if let Some(user) = user {
                context = context.with_user(user);
            }
            if let Some(session) = session {
                context = context.with_session(session);
            }

            registry.subscribe(Arc::new(if json {
                ConsoleToolObserver::quiet()
            } else {
                ConsoleToolObserver::new()
            }));
            orchestrator.add_approval_handler(approval_handler(yes));

            let output = orchestrator.run(&tool, arguments, context).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print!("{}", ConsoleFormatter::format_output(&tool, &output));
            }
            if !output.success {
                return Ok(ExitCode::FAILURE);
            }
        }

        Command::Agent {
            message,
            max_turns,
            yes,
        } => {
            registry.subscribe(Arc::new(ConsoleToolObserver::new()));
            orchestrator.add_approval_handler(approval_handler(yes));
            run_agent(config, orchestrator, message, max_turns, cli.verbose > 0).await?;
        }

        // handled before the runtime is built
        Command::Config => {}
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(feature = "http-tools")]
async fn run_agent(
    config: &FileConfig,
    orchestrator: &Arc<ToolOrchestrator>,
    message: String,
    max_turns: Option<usize>,
    show_stats: bool,
) -> Result<()> {
    use tokio_util::sync::CancellationToken;
    use toolgate_application::{RunAgentInput, RunAgentUseCase};
    use toolgate_infrastructure::OpenAiBackend;
    use toolgate_presentation::AgentProgressReporter;

    let backend = Arc::new(
        OpenAiBackend::from_config(&config.backend).context("Failed to configure backend")?,
    );
    let mut params = config.to_agent_params();
    if let Some(max) = max_turns {
        params = params.with_max_turns(max);
    }

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let use_case = RunAgentUseCase::new(backend, orchestrator.clone(), params)
        .with_progress(Arc::new(AgentProgressReporter))
        .with_cancellation(cancel);

    let output = use_case
        .execute(RunAgentInput::new(message))
        .await
        .context("Agent run failed")?;
    print!("{}", ConsoleFormatter::format_agent_output(&output));
    if show_stats {
        eprint!(
            "{}",
            ConsoleFormatter::format_stats(&orchestrator.registry().stats(), &orchestrator.stats())
        );
    }
    Ok(())
}

#[cfg(not(feature = "http-tools"))]
async fn run_agent(
    _config: &FileConfig,
    _orchestrator: &Arc<ToolOrchestrator>,
    _message: String,
    _max_turns: Option<usize>,
    _show_stats: bool,
) -> Result<()> {
    bail!("The agent command needs a build with the `http-tools` feature")
}

fn approval_handler(yes: bool) -> Arc<dyn ApprovalHandler> {
    if yes {
        Arc::new(AutoApproveHandler)
    } else {
        Arc::new(InteractiveApprovalHandler::new())
    }
}

fn parse_arguments(raw: &str) -> Result<Arguments> {
    let value: serde_json::Value =
        serde_json::from_str(raw).with_context(|| format!("--args is not valid JSON: {}", raw))?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        _ => bail!("--args must be a JSON object"),
    }
}

fn show_config(
    cli: &Cli,
    config: &FileConfig,
    issues: &[toolgate_domain::ConfigIssue],
) -> Result<()> {
    println!("Config sources (highest priority first):");
    for (label, path, found) in ConfigLoader::config_sources(cli.config.as_deref()) {
        let status = if found { "found" } else { "missing" };
        println!("  {:<8} {} ({})", label, path.display(), status);
    }
    println!();
    println!("{}", toml::to_string_pretty(config).context("Failed to render configuration")?);

    if issues.is_empty() {
        println!("No configuration issues.");
    } else {
        print!("{}", ConsoleFormatter::format_issues(issues));
    }
    Ok(())
}

/// `-v` picks the default level, `logging.level` applies when no `-v` is
/// given, and `RUST_LOG` overrides both.
fn init_logging(cli: &Cli, config: &FileConfig) -> Result<Option<WorkerGuard>> {
    let default_level = match (&config.logging.level, cli.verbose) {
        (Some(level), 0) => level.as_str(),
        _ => cli.log_level(),
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let Some(path) = &config.logging.file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let file_name = path
        .file_name()
        .with_context(|| format!("logging.file has no file name: {}", path.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(Some(guard))
}
