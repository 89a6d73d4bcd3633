mod config_cmd;
mod describe_cmd;
mod serve_cmd;
mod status_cmd;
mod terminal_output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "picscribe")]
#[command(about = "Picscribe: short AI descriptions for uploaded images")]
#[command(version)]
struct Cli {
    /// Config file to use instead of ~/.picscribe/config.yaml
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server and browser UI
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
        /// Address to bind the HTTP server to
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Describe image files once and print the resulting table
    Describe {
        /// Image files to describe
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Prompt to send with every image
        #[arg(long)]
        prompt: Option<String>,
        /// Print the table as JSON
        #[arg(long)]
        json: bool,
    },
    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Query a running server's health endpoint
    Status {
        /// Server base URL; defaults to the configured bind address and port
        #[arg(long)]
        url: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective config with secrets masked
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file (the old one is kept as a backup)
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = config_cmd::resolve_path(cli.config);

    match cli.command {
        Commands::Serve { port, bind } => serve_cmd::run(&config_path, port, bind).await,
        Commands::Describe {
            files,
            prompt,
            json,
        } => describe_cmd::run(&config_path, files, prompt, json).await,
        Commands::Config { action } => match action {
            ConfigAction::Show => config_cmd::show(&config_path).await,
            ConfigAction::Init { force } => config_cmd::init(&config_path, force).await,
        },
        Commands::Status { url } => status_cmd::run(&config_path, url).await,
    }
}
