//! gwtestctl
//!
//! Test client and fake server for the gateway dataplane config service.
//!
//! # Commands
//!
//! - `get-config` (`get`) - Print the current config as YAML
//! - `get-config-gen` (`gen`) - Print the current config generation
//! - `update-config` (`set`) - Replace the config with a YAML file
//! - `fake-server` (`server`) - Run an in-memory config server

mod commands;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = "\
Run fake server:
  gwtestctl server -t unix://@/tmp/gateway.sock  # abstract unix socket, as clients dial it
  gwtestctl server -t unix:///tmp/gateway.sock   # filesystem unix socket
  gwtestctl server -t tcp://localhost:5123       # tcp socket
  gwtestctl server -t tcp://:5123                # tcp socket on all interfaces
  gwtestctl server -t tcp://:0                   # all interfaces, random port

And run client:
  gwtestctl get-config -t unix:///tmp/gateway.sock           # read current config (abstract namespace)
  gwtestctl get-config -t tcp://:5123 > config.yaml          # save current config
  gwtestctl update-config -t tcp://:5123 -f config.yaml      # update config
  gwtestctl get-config-gen -t tcp://:5123                    # read current generation";

/// Simple gateway dataplane config client and fake server for testing.
#[derive(Parser)]
#[command(name = "gwtestctl")]
#[command(author, version, about, long_about = None, after_help = AFTER_HELP)]
struct Cli {
    /// Verbose output (includes debug)
    #[arg(global = true, short, long, conflicts_with = "brief")]
    verbose: bool,

    /// Brief output (only warn and error)
    #[arg(global = true, short, long)]
    brief: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct TargetArgs {
    /// Target: unix:///name (abstract namespace), tcp://host:port or tcp://:0 for a random port
    #[arg(short, long)]
    target: String,

    /// Wait for the server to become ready instead of failing after 5s
    #[arg(short, long)]
    wait: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Get config
    #[command(visible_alias = "get")]
    GetConfig {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Get config generation
    #[command(visible_alias = "gen")]
    GetConfigGen {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Update config from file
    #[command(visible_alias = "set")]
    UpdateConfig {
        #[command(flatten)]
        target: TargetArgs,

        /// Path to config file
        #[arg(short = 'f', long)]
        config_file: PathBuf,
    },

    /// Run fake server
    #[command(visible_alias = "server")]
    FakeServer {
        /// Listen target: unix:///path/to/socket, unix://@name or tcp://host:port
        #[arg(short, long)]
        target: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "debug"
    } else if cli.brief {
        "warn"
    } else {
        "info"
    };
    let stderr = std::io::stderr();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_ansi(stderr.is_terminal())
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Gateway dataplane test client");

    match cli.command {
        Commands::GetConfig { target } => {
            commands::get_config::run(&target.target, target.wait).await?;
        }
        Commands::GetConfigGen { target } => {
            commands::get_config_generation::run(&target.target, target.wait).await?;
        }
        Commands::UpdateConfig {
            target,
            config_file,
        } => {
            commands::update_config::run(&target.target, &config_file, target.wait).await?;
        }
        Commands::FakeServer { target } => {
            commands::fake_server::run(&target).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn aliases_and_flags_parse() {
        let cli = Cli::try_parse_from(["gwtestctl", "set", "-t", "tcp://:1", "-f", "gw.yaml", "-w"])
            .unwrap();
        match cli.command {
            Commands::UpdateConfig {
                target,
                config_file,
            } => {
                assert_eq!(target.target, "tcp://:1");
                assert!(target.wait);
                assert_eq!(config_file, PathBuf::from("gw.yaml"));
            }
            _ => panic!("expected update-config"),
        }
    }

    #[test]
    fn verbose_and_brief_conflict() {
        assert!(Cli::try_parse_from(["gwtestctl", "-v", "-b", "gen", "-t", "tcp://:1"]).is_err());
    }

    #[test]
    fn target_is_required() {
        assert!(Cli::try_parse_from(["gwtestctl", "get"]).is_err());
        assert!(Cli::try_parse_from(["gwtestctl", "set", "-t", "tcp://:1"]).is_err());
    }
}
