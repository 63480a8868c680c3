pub mod catalog;
pub mod cli;
pub mod config;
pub mod mirror;
pub mod server;
pub mod status;
pub mod types;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::cli::{Client, DEFAULT_SERVER_URL};
use crate::config::{MirrorArgs, ServeArgs};
use crate::mirror::{Mirror, Refresh, open_repository, resolve_head, short_sha};
use crate::status::StatusTracker;

#[derive(Parser)]
#[command(
    name = "wallsync",
    about = "Wallpaper mirror - serve random wallpapers from a git repository"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),

    /// Clone or pull the mirror once and exit
    Sync(MirrorArgs),

    /// Show the status of a running server
    Status {
        /// Base URL of the server
        #[arg(long, default_value = DEFAULT_SERVER_URL)]
        url: String,
    },

    /// Check dependencies
    Doctor(ServeArgs),
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(args) => cmd_serve(args),
        Commands::Sync(args) => cmd_sync(args),
        Commands::Status { url } => cmd_status(&url),
        Commands::Doctor(args) => cmd_doctor(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        if e.to_string().contains("not running") {
            eprintln!();
            eprintln!("Hint: Start the server with: wallsync serve");
        }
        std::process::exit(1);
    }
}

fn cmd_serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.into_config();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(server::run(config))?;

    Ok(())
}

fn cmd_sync(args: MirrorArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.into_config();
    let mirror = Mirror::from_config(&config, Arc::new(StatusTracker::new()));

    println!("Syncing {}...", config.repo_url);
    let refresh = mirror.ensure_fresh()?;

    let repo = open_repository(mirror.path())?;
    let (branch, commit) = resolve_head(&repo)?;

    println!(
        "{}",
        match refresh {
            Refresh::Cloned => "Cloned successfully",
            Refresh::Pulled => "Updated successfully",
        }
    );
    println!("  Path:   {}", mirror.path().display());
    println!("  Branch: {}", branch);
    println!("  Commit: {}", short_sha(&commit));

    Ok(())
}

fn cmd_status(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = Client::new(url);
    cli::print_status(&client)?;
    Ok(())
}

fn cmd_doctor(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.into_config();
    if !cli::print_doctor(&config) {
        std::process::exit(1);
    }
    Ok(())
}
