mod chat_client;
mod commands;
mod render;
mod store;
mod utils;
mod webhook;

use agenda_core::Mode;
use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "agenda")]
#[command(about = "Schedule meetings by describing them in Portuguese")]
struct Cli {
    /// More log output (-v info, -vv debug). RUST_LOG overrides this.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Describe a meeting in a conversation until it can be scheduled
    Chat {
        /// Use only the local extractor
        #[arg(long, conflicts_with = "remote")]
        local: bool,

        /// Use the remote chat model (falls back to local on failure)
        #[arg(long)]
        remote: bool,

        /// Do not send confirmed meetings anywhere
        #[arg(long)]
        dry_run: bool,
    },
    /// Extract a meeting from text once, without a conversation
    Parse {
        #[arg(required = true)]
        text: Vec<String>,

        /// Reference date for relative expressions (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List people you have scheduled with
    Contacts {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Show paths and settings
    Config {
        /// Change the default chat mode ("local" or "remote")
        #[arg(long, value_parser = parse_mode)]
        mode: Option<Mode>,
    },
    /// Delete the saved conversation and known contacts
    Forget {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Chat {
            local,
            remote,
            dry_run,
        } => {
            let mode = match (local, remote) {
                (true, _) => Some(Mode::Local),
                (_, true) => Some(Mode::Remote),
                _ => None,
            };
            commands::chat::run(mode, dry_run).await
        }
        Commands::Parse { text, today, json } => commands::parse::run(text.join(" "), today, json),
        Commands::Contacts { limit } => commands::contacts::run(limit),
        Commands::Config { mode } => commands::config::run(mode),
        Commands::Forget { yes } => commands::forget::run(yes),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn parse_mode(s: &str) -> Result<Mode, String> {
    match s.trim().to_lowercase().as_str() {
        "local" => Ok(Mode::Local),
        "remote" | "remoto" => Ok(Mode::Remote),
        other => Err(format!("unknown mode '{}', expected local or remote", other)),
    }
}
