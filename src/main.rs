use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use taskhub::server::{ServerConfig, start_server};

#[derive(Parser)]
#[command(name = "taskhub")]
#[command(version, about = "Task-management backend with real-time assignment notifications")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP/WebSocket server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "8731")]
        port: u16,

        /// Bind all interfaces and allow permissive CORS
        #[arg(long)]
        dev: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "taskhub=debug" } else { "taskhub=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    match cli.command {
        Commands::Serve { host, port, dev } => {
            let host = if dev { "0.0.0.0".to_string() } else { host };
            start_server(ServerConfig {
                host,
                port,
                dev_mode: dev,
            })
            .await?;
        }
    }

    Ok(())
}
