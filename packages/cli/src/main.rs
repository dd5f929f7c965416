#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the color world driver.
//!
//! Uses `indicatif-log-bridge` (via [`color_world_cli_utils::init_logger`])
//! so dataset loading bars and log lines share the terminal.

use clap::{Parser, Subcommand};
use color_world_cli::RunOptions;
use color_world_session::AppConfig;

#[derive(Parser)]
#[command(name = "color_world", about = "Headless color world driver")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted session (explore, collect, play back) and print the
    /// collected palette
    Run {
        /// Number of frames to run
        #[arg(long, default_value = "600")]
        frames: u64,
        /// Script frame rate
        #[arg(long, default_value = "60")]
        fps: f64,
        /// Start city (overrides the configured `start_city`)
        #[arg(long)]
        city: Option<String>,
        /// Sample from the local image cache instead of the image service
        #[arg(long)]
        offline: bool,
        /// Show raw cached colors instead of the per-street synthesis
        #[arg(long)]
        no_synthesis: bool,
        /// Navigate with the pointer instead of the hand
        #[arg(long)]
        pointer: bool,
        /// Pace frames at the frame rate instead of running them back to back
        #[arg(long)]
        realtime: bool,
    },
    /// Show the points visible around a city
    Inspect {
        /// City to inspect (defaults to the configured start city)
        city: Option<String>,
        /// Maximum number of points to list
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// List the cities a session can start in
    Cities,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = color_world_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        let app = AppConfig::load()?;
        return color_world_cli::interactive::run(&app, &multi).await;
    };

    match command {
        Commands::Cities => color_world_cli::list_cities(),
        Commands::Inspect { city, limit } => {
            let app = AppConfig::load()?;
            color_world_cli::inspect(&app, city.as_deref(), limit, &multi)?;
        }
        Commands::Run {
            frames,
            fps,
            city,
            offline,
            no_synthesis,
            pointer,
            realtime,
        } => {
            let app = AppConfig::load()?;
            let options = RunOptions {
                frames,
                fps,
                city,
                offline,
                synthesis: !no_synthesis,
                pointer,
                realtime,
            };
            let report = color_world_cli::run(&app, &options, &multi).await?;
            println!();
            print!("{report}");
        }
    }

    Ok(())
}
