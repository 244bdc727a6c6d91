//! Home Lab Daemon
//!
//! Serves the dashboard API: host metrics and a sandboxed file browser.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use daemon::auth::SecretVerifier;
use daemon::config::{default_config_path, Config};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Home Lab Daemon - host metrics and a sandboxed file browser.
#[derive(Parser, Debug)]
#[command(name = "homelab-daemon")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for the daemon.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the HTTP server
    Start {
        /// Port to listen on (overrides config and PORT)
        #[arg(long, short)]
        port: Option<u16>,

        /// Address to bind to (overrides config)
        #[arg(long, short)]
        bind: Option<String>,
    },

    /// Inspect or create the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Check whether a system pass would be accepted
    CheckAuth {
        /// The pass to check. Accepts a `Bearer ` prefix.
        secret: String,
    },
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Print the effective configuration with the system pass masked
    Show,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);

    // Load configuration
    let mut config = Config::load(&config_path)?;

    // Apply environment variable overrides; they can change the log level
    let overrides = config.apply_env_overrides();

    init_tracing(cli.verbose, &config.server.log_level);
    tracing::debug!("Using config file: {:?}", config_path);
    for env_override in &overrides {
        env_override.log();
    }

    match cli.command {
        Commands::Start { port, bind } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            config.validate()?;

            if config.uses_default_system_pass() {
                tracing::warn!(
                    "The default system pass is in use; set SYSTEM_PASS or access.system_pass"
                );
            }
            if config.access.allow_full_system_access {
                tracing::warn!("Full system access is granted to every request");
            }

            tracing::info!("Home lab daemon starting...");

            let shutdown = CancellationToken::new();
            let signal_token = shutdown.clone();
            tokio::spawn(async move {
                if let Err(e) = wait_for_shutdown_signal().await {
                    tracing::error!("Failed to listen for shutdown signals: {}", e);
                    return;
                }
                signal_token.cancel();
            });

            daemon::server::run(&config, shutdown).await?;
            tracing::info!("Home lab daemon stopped");
        }
        Commands::Config(ConfigCommands::Show) => {
            println!("# {}", config_path.display());
            print!("{}", config.redacted().to_toml()?);
        }
        Commands::Config(ConfigCommands::Init { force }) => {
            if config_path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {} (use --force to overwrite)",
                    config_path.display()
                );
            }
            Config::default().save(&config_path)?;
            println!("Wrote default configuration to {}", config_path.display());
        }
        Commands::CheckAuth { secret } => {
            config.validate()?;
            let verifier = SecretVerifier::new(config.access.system_pass.clone());
            if verifier.verify(Some(&secret)) {
                println!("authenticated");
            } else {
                println!("not authenticated");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Install the fmt subscriber.
///
/// `--verbose` forces `debug`; otherwise `RUST_LOG` wins over the configured
/// level.
fn init_tracing(verbose: bool, log_level: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Wait for SIGTERM or SIGINT.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM");
        }
        _ = sigint.recv() => {
            tracing::info!("Received SIGINT");
        }
    }

    Ok(())
}

/// Wait for Ctrl-C.
#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!("Received Ctrl-C");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_debug_assert() {
        // Verify the CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_start_command() {
        let cli = Cli::try_parse_from(["homelab-daemon", "start"]).unwrap();
        match cli.command {
            Commands::Start { port, bind } => {
                assert_eq!(port, None);
                assert_eq!(bind, None);
            }
            _ => panic!("Expected Start command"),
        }
    }

    #[test]
    fn test_start_with_overrides() {
        let cli = Cli::try_parse_from([
            "homelab-daemon",
            "start",
            "--port",
            "8080",
            "--bind",
            "127.0.0.1",
        ])
        .unwrap();
        match cli.command {
            Commands::Start { port, bind } => {
                assert_eq!(port, Some(8080));
                assert_eq!(bind.as_deref(), Some("127.0.0.1"));
            }
            _ => panic!("Expected Start command"),
        }
    }

    #[test]
    fn test_start_rejects_bad_port() {
        assert!(Cli::try_parse_from(["homelab-daemon", "start", "--port", "70000"]).is_err());
    }

    #[test]
    fn test_config_show() {
        let cli = Cli::try_parse_from(["homelab-daemon", "config", "show"]).unwrap();
        assert!(matches!(cli.command, Commands::Config(ConfigCommands::Show)));
    }

    #[test]
    fn test_config_init_force() {
        let cli = Cli::try_parse_from(["homelab-daemon", "config", "init", "--force"]).unwrap();
        match cli.command {
            Commands::Config(ConfigCommands::Init { force }) => assert!(force),
            _ => panic!("Expected Config Init command"),
        }
    }

    #[test]
    fn test_check_auth() {
        let cli = Cli::try_parse_from(["homelab-daemon", "check-auth", "hunter2"]).unwrap();
        match cli.command {
            Commands::CheckAuth { secret } => assert_eq!(secret, "hunter2"),
            _ => panic!("Expected CheckAuth command"),
        }
    }

    #[test]
    fn test_check_auth_requires_secret() {
        assert!(Cli::try_parse_from(["homelab-daemon", "check-auth"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "homelab-daemon",
            "--config",
            "/tmp/test.toml",
            "--verbose",
            "start",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/test.toml")));
        assert!(cli.verbose);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["homelab-daemon", "config", "show", "-v"]).unwrap();
        assert!(cli.verbose);
    }
}
