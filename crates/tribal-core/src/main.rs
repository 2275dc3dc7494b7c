//! Tribal Council Season Runner
//!
//! Plays a seeded season: camp life between councils, immunity, votes, ties
//! and rocks, until the final survivors remain or the player is voted out.
//! The human player is on autopilot.

use bevy_ecs::prelude::*;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use tribal_core::config::Config;
use tribal_core::events::EventLogger;
use tribal_core::host::GameHost;
use tribal_core::output::{build_summary, write_summary, DEFAULT_SUMMARY_PATH};
use tribal_core::season::Season;
use tribal_core::setup;
use tribal_core::systems::{camp_day_system, run_council_system};
use tribal_core::SimRng;

/// Command line arguments for the season runner
#[derive(Parser, Debug)]
#[command(name = "tribal_council")]
#[command(about = "A seeded survivor-style tribal council simulation")]
struct Args {
    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Tuning file (defaults to ./tuning.toml, or built-in values)
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSONL event log output
    #[arg(long, default_value = "output/council_events.jsonl")]
    events: PathBuf,

    /// Season summary output
    #[arg(long, default_value = DEFAULT_SUMMARY_PATH)]
    summary: PathBuf,

    /// Stop after this many days even if the season is not over
    #[arg(long, default_value_t = 60)]
    max_days: u32,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: could not load {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Config::load_or_default(),
    };

    println!("Tribal Council");
    println!("==============");
    println!("Seed: {}", args.seed);
    println!("Cast: {} survivors in {} tribes", config.season.cast_size, config.season.tribe_count);
    println!();

    let mut rng = SimRng::seeded(args.seed);
    let cast = match setup::create_season(&config, &mut rng.0) {
        Ok(cast) => cast,
        Err(e) => {
            eprintln!("Error: could not set up the season: {}", e);
            std::process::exit(1);
        }
    };

    for tribe in cast.season.tribes() {
        let names: Vec<&str> = tribe
            .members()
            .iter()
            .filter_map(|id| cast.season.agent(*id).map(|a| a.name.as_str()))
            .collect();
        println!("  {}: {}", tribe.name, names.join(", "));
    }
    if let Some(player) = cast.season.player_agent() {
        println!("  You are playing as {} ({})", player.name, player.id);
    }
    println!("  {} alliances formed on day one", cast.alliances.len());
    println!();

    let mut logger = open_logger(&args.events);
    for change in &cast.seeded {
        if let Err(e) = logger.log(0, 0, change.to_event_kind()) {
            tracing::warn!("Failed to log alliance change: {}", e);
        }
    }

    // Initialize the ECS world
    let mut world = World::new();
    world.insert_resource(config);
    world.insert_resource(cast.season);
    world.insert_resource(cast.graph);
    world.insert_resource(cast.alliances);
    world.insert_resource(rng);
    world.insert_resource(logger);

    // Camp life first, then council on council days
    let mut schedule = Schedule::default();
    schedule.add_systems((camp_day_system, run_council_system).chain());

    let mut narrated = 0;
    for _ in 0..args.max_days {
        schedule.run(&mut world);

        let season = world.resource::<Season>();
        for record in &season.eliminations()[narrated..] {
            let how = if record.by_rocks {
                "by drawing the purple rock".to_string()
            } else {
                format!("with {} votes", record.votes_against)
            };
            println!(
                "[Day {:>3}] {} ({}) is voted out of {} {}{}",
                record.day,
                record.name,
                record.agent,
                record.tribe,
                how,
                if record.joins_jury { ", joining the jury" } else { "" }
            );
        }
        narrated = season.eliminations().len();

        let final_size = world.resource::<Config>().season.final_size;
        if season.is_finished(final_size) {
            break;
        }
    }

    if let Err(e) = world.resource_mut::<EventLogger>().flush() {
        eprintln!("Warning: Could not flush event log: {}", e);
    }

    let season = world.resource::<Season>();
    println!();
    if season.is_game_over() {
        println!("You were voted out on day {}.", season.day);
    } else {
        let finalists: Vec<&str> = season
            .remaining()
            .iter()
            .filter_map(|id| season.agent(*id).map(|a| a.name.as_str()))
            .collect();
        println!("Day {}: {} survivors remain: {}", season.day, finalists.len(), finalists.join(", "));
    }
    println!(
        "{} councils held, {} eliminations, jury of {}.",
        season.councils_held,
        season.eliminations().len(),
        season.jury().len()
    );

    let summary = build_summary(season, args.seed);
    match write_summary(&summary, &args.summary) {
        Ok(()) => println!("Wrote summary to {}", args.summary.display()),
        Err(e) => eprintln!("Warning: Could not write summary: {}", e),
    }
}

/// Open the JSONL log, falling back to discarding events
fn open_logger(path: &Path) -> EventLogger {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).unwrap_or_else(|e| {
                eprintln!("Warning: Could not create {}: {}", parent.display(), e);
            });
        }
    }
    EventLogger::new(path).unwrap_or_else(|e| {
        eprintln!("Warning: Could not open event log {}: {}", path.display(), e);
        EventLogger::null()
    })
}
