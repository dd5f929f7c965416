#![allow(clippy::module_name_repetitions)]

//! Interactive menu for the color world driver.
//!
//! Offered when the binary is started without a subcommand.

use color_world_cli_utils::MultiProgress;
use color_world_geo_index::cities;
use color_world_session::AppConfig;
use dialoguer::{Confirm, Input, Select};

use crate::RunOptions;

/// Top-level actions available in the menu.
enum Action {
    Run,
    Inspect,
    ListCities,
}

impl Action {
    const ALL: &[Self] = &[Self::Run, Self::Inspect, Self::ListCities];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Run => "Run a scripted session",
            Self::Inspect => "Inspect a city",
            Self::ListCities => "List cities",
        }
    }
}

/// Runs the menu once.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected operation fails.
pub async fn run(app: &AppConfig, multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::Run => {
            let city = prompt_city()?;

            let frames_str: String = Input::new()
                .with_prompt("Frames")
                .default("600".to_string())
                .interact_text()?;
            let frames: u64 = frames_str.parse().unwrap_or(600);

            let offline = Confirm::new()
                .with_prompt("Sample from the local image cache (offline)?")
                .default(false)
                .interact()?;

            let synthesis = Confirm::new()
                .with_prompt("Tint map points with street synthesis?")
                .default(true)
                .interact()?;

            let options = RunOptions {
                frames,
                city,
                offline,
                synthesis,
                ..RunOptions::default()
            };
            let report = crate::run(app, &options, multi).await?;
            println!();
            print!("{report}");
        }
        Action::Inspect => {
            let city = prompt_city()?;
            crate::inspect(app, city.as_deref(), 20, multi)?;
        }
        Action::ListCities => crate::list_cities(),
    }

    Ok(())
}

/// Asks for a city; `None` keeps the configured start city.
fn prompt_city() -> Result<Option<String>, Box<dyn std::error::Error>> {
    let all = cities::all_cities();
    let mut labels = vec!["Configured start city".to_string()];
    labels.extend(all.iter().map(|city| city.name.clone()));

    let idx = Select::new()
        .with_prompt("City")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(idx.checked_sub(1).map(|i| all[i].name.clone()))
}
