//! CLI module for Switchboard
//!
//! # Commands
//!
//! - `serve` - Start the routing server
//! - `route` - Classify text and show the routing decision (not recorded)
//! - `workers` - List configured workers
//! - `stats` - Performance summary from persisted telemetry
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! switchboard serve -c switchboard.toml
//! switchboard route "translate this to French" --workers llama,coder
//! switchboard completions bash > ~/.bash_completion.d/switchboard
//! ```

pub mod completions;
pub mod config;
pub mod output;
pub mod route;
pub mod serve;
pub mod stats;
pub mod workers;

pub use completions::handle_completions;
pub use config::handle_config_init;

use crate::config::SwitchboardConfig;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = "switchboard.toml";

/// Switchboard - self-tuning task router
#[derive(Parser, Debug)]
#[command(
    name = "switchboard",
    version,
    about = "Self-tuning task router for heterogeneous inference workers"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the routing server
    Serve(ServeArgs),
    /// Show where a request would be routed
    Route(RouteArgs),
    /// List configured workers
    Workers(WorkersArgs),
    /// Show the performance summary from persisted telemetry
    Stats(StatsArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Override server port
    #[arg(short, long, env = "SWITCHBOARD_PORT")]
    pub port: Option<u16>,

    /// Override server host
    #[arg(short = 'H', long, env = "SWITCHBOARD_HOST")]
    pub host: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SWITCHBOARD_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Directory for persisted telemetry and policy (enables persistence)
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Disable the background optimizer
    #[arg(long)]
    pub no_optimizer: bool,
}

#[derive(Args, Debug)]
pub struct RouteArgs {
    /// Request text to classify and route
    pub text: String,

    /// Candidate worker ids (default: every configured worker)
    #[arg(short, long, value_delimiter = ',')]
    pub workers: Option<Vec<String>>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct WorkersArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Directory holding persisted telemetry (default: from config)
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

/// Load the config file if it exists (defaults otherwise), apply env
/// overrides, and validate.
pub fn load_config(path: &Path) -> Result<SwitchboardConfig, Box<dyn std::error::Error>> {
    let config = if path.exists() {
        SwitchboardConfig::load(Some(path))?
    } else {
        tracing::debug!(path = %path.display(), "Config file not found, using defaults");
        SwitchboardConfig::default()
    };
    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_serve_defaults() {
        let cli = Cli::try_parse_from(["switchboard", "serve"]).unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.config, PathBuf::from("switchboard.toml"));
                assert!(args.data_dir.is_none());
                assert!(!args.no_optimizer);
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn parse_serve_with_port() {
        let cli = Cli::try_parse_from(["switchboard", "serve", "-p", "9000"]).unwrap();
        match cli.command {
            Commands::Serve(args) => assert_eq!(args.port, Some(9000)),
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn parse_route_with_worker_list() {
        let cli = Cli::try_parse_from([
            "switchboard",
            "route",
            "hello there",
            "--workers",
            "a,b",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Route(args) => {
                assert_eq!(args.text, "hello there");
                assert_eq!(args.workers, Some(vec!["a".to_string(), "b".to_string()]));
                assert!(args.json);
            }
            _ => panic!("Expected Route command"),
        }
    }

    #[test]
    fn parse_stats_data_dir() {
        let cli = Cli::try_parse_from(["switchboard", "stats", "-d", "/tmp/sb"]).unwrap();
        match cli.command {
            Commands::Stats(args) => assert_eq!(args.data_dir, Some(PathBuf::from("/tmp/sb"))),
            _ => panic!("Expected Stats command"),
        }
    }

    #[test]
    fn load_config_missing_file_uses_defaults() {
        let config = load_config(Path::new("definitely-missing.toml")).unwrap();
        assert_eq!(config.server.port, 8700);
    }
}
