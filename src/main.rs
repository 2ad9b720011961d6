use acksrv::config::{Config, ConfigSource};
use acksrv::{ClientApp, Sender, ShutdownCoordinator, logging, server};
use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Result, WrapErr, eyre};
use std::path::{Path, PathBuf};
use tokio::io::BufReader;
use tracing::{info, warn};

/// TCP acknowledgment server and retrying client
#[derive(Parser, Debug)]
#[command(name = "acksrv", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the acknowledgment server until SIGINT/SIGTERM
    Server {
        /// Path to TOML configuration file
        #[arg(short, long, default_value = "server_config.toml")]
        config: PathBuf,

        /// Host to bind to, overrides the config file
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to, overrides the config file
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run the client application
    Client {
        /// Path to TOML configuration file
        #[arg(short, long, default_value = "client_config.toml")]
        config: PathBuf,

        #[arg(value_enum, default_value_t = Mode::Automated)]
        mode: Mode,
    },
    /// Send a single message with retry
    Send {
        /// Path to TOML configuration file
        #[arg(short, long, default_value = "client_config.toml")]
        config: PathBuf,

        message: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    /// Read messages and commands from stdin
    Interactive,
    /// Send a fixed greeting, system info and completion sequence
    Automated,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    match Cli::parse().command {
        Command::Server { config, host, port } => run_server(&config, host, port).await,
        Command::Client { config, mode } => run_client(&config, mode).await,
        Command::Send { config, message } => run_send(&config, &message).await,
    }
}

/// Loads configuration, then starts logging with the configured sinks
fn load_config(path: &Path, default_log_file: &str) -> Result<Config> {
    let (config, source) = Config::load(path).wrap_err("Failed to load configuration")?;
    logging::init(&config.logging, Path::new(default_log_file))
        .wrap_err("Failed to initialize logging")?;

    match source {
        ConfigSource::File(path) => info!(path = %path.display(), "Configuration loaded"),
        ConfigSource::Defaults(path) => warn!(
            path = %path.display(),
            "Configuration file not found. Using default values."
        ),
    }
    Ok(config)
}

async fn run_server(path: &Path, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = load_config(path, "server.log")?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let shutdown = ShutdownCoordinator::new();
    shutdown.install_signal_handlers();

    info!(address = %config.server.endpoint(), "Starting acknowledgment server");
    server::serve(config.server, shutdown)
        .await
        .wrap_err("Failed to run acknowledgment server")?;
    Ok(())
}

async fn run_client(path: &Path, mode: Mode) -> Result<()> {
    let config = load_config(path, "client.log")?;
    let app = ClientApp::new(Sender::new(&config.client));

    match mode {
        Mode::Automated => app.run_automated().await,
        Mode::Interactive => {
            let input = BufReader::new(tokio::io::stdin());
            tokio::select! {
                result = app.run_interactive(input, tokio::io::stdout()) => {
                    result.wrap_err("Interactive mode failed")?;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted by user");
                    // A pending stdin read would otherwise hold the runtime open
                    std::process::exit(0);
                }
            }
        }
    }
    Ok(())
}

async fn run_send(path: &Path, message: &str) -> Result<()> {
    let config = load_config(path, "client.log")?;
    if Sender::new(&config.client).send_data(message).await {
        Ok(())
    } else {
        Err(eyre!("Failed to send message to {}", config.client.endpoint()))
    }
}
