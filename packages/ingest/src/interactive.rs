#![allow(clippy::module_name_repetitions)]

//! Interactive menu for the traffic-signal geocoding tool.
//!
//! Provides a menu-driven interface using `dialoguer` for running the
//! pipeline and browsing a snapshot without memorizing CLI flags.

use std::path::PathBuf;

use dialoguer::{Input, Select};
use signal_map_cli_utils::{IndicatifProgress, MultiProgress};
use signal_map_signal::aggregate::aggregate_intersections;
use signal_map_signal::light::classify_snapshot;
use signal_map_signal::query::{ALL_REGIONS, LightFilter, region_counts};
use signal_map_signal_models::{ClassifiedLight, Priority};

use crate::{PipelineOptions, default_service, geocoder_for, load_snapshot, run_pipeline};

/// Top-level actions available in the interactive menu.
enum MenuAction {
    Geocode,
    BrowseLights,
    BrowseIntersections,
    ListServices,
}

impl MenuAction {
    const ALL: &[Self] = &[
        Self::Geocode,
        Self::BrowseLights,
        Self::BrowseIntersections,
        Self::ListServices,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Geocode => "Geocode a raw facility export",
            Self::BrowseLights => "Browse lights in a snapshot",
            Self::BrowseIntersections => "Browse intersections in a snapshot",
            Self::ListServices => "List geocoding services",
        }
    }
}

/// Runs the interactive menu, prompting the user to select and configure
/// one operation.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected operation fails.
pub async fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let labels: Vec<&str> = MenuAction::ALL.iter().map(MenuAction::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match MenuAction::ALL[idx] {
        MenuAction::Geocode => geocode(multi).await?,
        MenuAction::BrowseLights => browse_lights()?,
        MenuAction::BrowseIntersections => browse_intersections()?,
        MenuAction::ListServices => list_services(),
    }

    Ok(())
}

async fn geocode(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let service = default_service()?;
    let geocoder = geocoder_for(&service)?;

    let input = prompt_path("Raw facility export (JSON)", None)?;
    let output = prompt_path("Output snapshot", Some("processed.json"))?;
    let limit = prompt_optional_usize("Record limit (empty for no limit)")?;

    let options = PipelineOptions {
        rate_limit: service.rate_limit(),
        limit,
        ..PipelineOptions::default()
    };

    let progress = IndicatifProgress::addresses_bar(multi, "Geocoding addresses");
    run_pipeline(&input, &output, &geocoder, &options, progress).await?;
    Ok(())
}

fn browse_lights() -> Result<(), Box<dyn std::error::Error>> {
    let lights = load_lights()?;
    let filter = prompt_filter(&lights)?;
    let matched = filter.apply(&lights);

    println!("{} of {} lights match", matched.len(), lights.len());
    for light in &matched {
        println!(
            "  [{}] {} ({}) {}",
            light.priority.value(),
            light.name,
            light.region,
            light.address
        );
    }
    Ok(())
}

fn browse_intersections() -> Result<(), Box<dyn std::error::Error>> {
    let lights = load_lights()?;
    let filter = prompt_filter(&lights)?;
    let intersections = aggregate_intersections(&filter.apply(&lights));

    println!("{} intersections", intersections.len());
    for intersection in &intersections {
        let location = intersection.location.map_or_else(
            || "no location".to_string(),
            |c| format!("{:.5}, {:.5}", c.lat, c.lng),
        );
        println!(
            "  {} ({} lights, {location})",
            intersection.name, intersection.total_count
        );
    }
    Ok(())
}

fn list_services() {
    for service in &signal_map_geocoder::service_registry::all_services() {
        let state = if service.enabled { "enabled" } else { "disabled" };
        println!("{} ({}) {state}", service.id, service.name);
    }
}

fn load_lights() -> Result<Vec<ClassifiedLight>, Box<dyn std::error::Error>> {
    let path = prompt_path("Processed snapshot", Some("processed.json"))?;
    Ok(classify_snapshot(&load_snapshot(&path)?))
}

/// Prompts for region (picked from the regions present), priority, and a
/// free-text query.
fn prompt_filter(lights: &[ClassifiedLight]) -> Result<LightFilter, Box<dyn std::error::Error>> {
    let regions = region_counts(lights);
    let mut region_labels = vec![format!("{ALL_REGIONS} ({})", lights.len())];
    region_labels.extend(regions.iter().map(|(r, n)| format!("{r} ({n})")));

    let region_idx = Select::new()
        .with_prompt("Region")
        .items(&region_labels)
        .default(0)
        .max_length(20)
        .interact()?;
    let region = region_idx.checked_sub(1).map(|i| regions[i].0.clone());

    let mut priority_labels = vec!["any".to_string()];
    priority_labels.extend(
        Priority::ALL
            .iter()
            .map(|p| format!("{} ({})", p.value(), p.color())),
    );
    let priority_idx = Select::new()
        .with_prompt("Priority")
        .items(&priority_labels)
        .default(0)
        .interact()?;
    let priority = priority_idx
        .checked_sub(1)
        .map(|i| Priority::ALL[i].value());

    let query: String = Input::new()
        .with_prompt("Search (empty for none)")
        .allow_empty(true)
        .interact_text()?;

    Ok(LightFilter {
        region,
        priority,
        query: Some(query).filter(|q| !q.trim().is_empty()),
    })
}

fn prompt_path(prompt: &str, default: Option<&str>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut input = Input::<String>::new().with_prompt(prompt);
    if let Some(default) = default {
        input = input.default(default.to_string());
    }
    Ok(PathBuf::from(input.interact_text()?.trim()))
}

fn prompt_optional_usize(prompt: &str) -> Result<Option<usize>, Box<dyn std::error::Error>> {
    let input: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;

    if input.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(input.trim().parse()?))
    }
}
