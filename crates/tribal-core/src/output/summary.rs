//! Season Summary Output
//!
//! Builds the `SeasonSummary` written at the end of a run.

use std::fs;
use std::path::Path;
use tribal_events::SeasonSummary;

use crate::season::Season;

/// Default summary output path
pub const DEFAULT_SUMMARY_PATH: &str = "output/season_summary.json";

/// Summarize the season as it stands
pub fn build_summary(season: &Season, seed: u64) -> SeasonSummary {
    SeasonSummary {
        seed,
        days_played: season.day,
        councils_held: season.councils_held,
        eliminations: season.eliminations().to_vec(),
        jury: season.jury().to_vec(),
        remaining: season.remaining(),
        player_eliminated: season.is_game_over(),
    }
}

/// Write the summary as pretty JSON, creating parent directories as needed
pub fn write_summary(summary: &SeasonSummary, path: impl AsRef<Path>) -> std::io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(summary)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    fs::write(path, json)
}
