//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for toolgate
#[derive(Parser, Debug)]
#[command(name = "toolgate")]
#[command(author, version, about = "Tool runtime with approval gating, retries, and an agent loop")]
#[command(long_about = r#"
toolgate registers tools, runs them through an approval gate with retry and
timeout policy, and drives an AI agent that calls tools from ```tool blocks.

Configuration files are loaded from (in priority order):
1. TOOLGATE_* environment variables (TOOLGATE_REGISTRY__MAX_PARALLEL=4)
2. --config <path>     Explicit config file
3. ./toolgate.toml     Project-level config
4. ~/.config/toolgate/config.toml   Global config

Example:
  toolgate tools
  toolgate discover "arithmetic"
  toolgate run calculate --args '{"expression": "2 ^ 10"}'
  toolgate run shell --args '{"command": "ls -la"}'
  toolgate agent "What is 17 * 23?"
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List registered tools
    Tools {
        /// Only show tools in this category
        #[arg(long)]
        category: Option<String>,

        /// Print specs as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rank tools by relevance to a query
    Discover {
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value_t = 5)]
        limit: usize,

        /// Restrict to one category
        #[arg(long)]
        category: Option<String>,
    },

    /// Run one tool through the approval gate
    Run {
        /// Tool name
        tool: String,

        /// Arguments as a JSON object
        #[arg(short, long, value_name = "JSON", default_value = "{}")]
        args: String,

        /// User id attached to the invocation
        #[arg(long)]
        user: Option<String>,

        /// Session id attached to the invocation
        #[arg(long)]
        session: Option<String>,

        /// Approve every request without prompting
        #[arg(short, long)]
        yes: bool,

        /// Print the output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print function-calling schemas for every tool
    Schema,

    /// Run the agent loop against the configured backend
    Agent {
        message: String,

        /// Override agent.max_turns
        #[arg(long)]
        max_turns: Option<usize>,

        /// Approve every request without prompting
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the resolved configuration and its validation issues
    Config,
}

impl Cli {
    /// Default tracing filter for the `-v` count
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
