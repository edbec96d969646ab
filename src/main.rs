//! viewtrack - Example host for the client-side view tracker
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use viewtrack::{init_config_dir, load_settings};
use viewtrack_core::prelude::*;

/// Correlate API calls with client-side page views
#[derive(Parser, Debug)]
#[command(name = "viewtrack")]
#[command(about = "Example contacts app with client-side view tracking", long_about = None)]
struct Args {
    /// Directory containing `.viewtrack/config.toml`
    #[arg(long, value_name = "PATH")]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the contacts API and collector until Ctrl-C
    Serve {
        /// Override the configured bind address
        #[arg(long)]
        bind: Option<String>,
    },
    /// Run a scripted session on loopback and print views and calls as JSON
    Demo,
    /// Write a default `.viewtrack/config.toml`
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install().map_err(|e| Error::config(e.to_string()))?;
    let args = Args::parse();

    let project = args
        .project
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    match args.command {
        Command::Serve { bind } => {
            viewtrack_core::logging::init_console();
            let mut settings = load_settings(&project);
            if let Some(bind) = bind {
                settings.server.bind = bind;
            }
            viewtrack::serve(&settings).await
        }
        Command::Demo => {
            match viewtrack_core::logging::init() {
                Ok(()) => {
                    if let Ok(path) = viewtrack_core::logging::get_current_log_file() {
                        eprintln!("Logging to {}", path.display());
                    }
                }
                Err(e) => eprintln!("File logging unavailable: {e}"),
            }
            let settings = load_settings(&project);
            let report = viewtrack::run_demo(&settings).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Init => {
            let path = init_config_dir(&project)?;
            eprintln!("Config at {}", path.display());
            Ok(())
        }
    }
}
