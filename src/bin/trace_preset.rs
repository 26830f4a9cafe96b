use chrono::Utc;
use rayon::prelude::*;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use territory_map::flag::AllianceId;
use territory_map::map_config::MapConfig;
use territory_map::outline::{trace_outlines, BoundaryLoop};

struct Args {
    preset_file: Option<PathBuf>,
}

// Parse command line arguments to get the preset path
lazy_static::lazy_static! {
    static ref ARGS: Args = {
        let args: Vec<String> = std::env::args().collect();

        // Format: cargo run --bin trace_preset [preset.json]
        Args {
            preset_file: args.get(1).map(PathBuf::from),
        }
    };
}

fn main() {
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    let config = match &ARGS.preset_file {
        Some(path) => match MapConfig::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{}", e);
                process::exit(1);
            }
        },
        None => MapConfig::load_from_env(),
    };

    let start = Instant::now();
    let (map, placed) = config.to_map(Utc::now());
    log::info!(
        "placed {} of {} flags in {:?}",
        placed.len(),
        config.flags.len(),
        start.elapsed()
    );

    let start = Instant::now();
    let alliance_ids: Vec<AllianceId> = map.alliance_ids().collect();
    let outlines: Vec<BoundaryLoop> = alliance_ids
        .par_iter()
        .flat_map_iter(|&alliance_id| trace_outlines(&map, alliance_id))
        .collect();
    log::info!(
        "traced {} outlines for {} alliances in {:?}",
        outlines.len(),
        alliance_ids.len(),
        start.elapsed()
    );

    match serde_json::to_string_pretty(&outlines) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("failed to encode outlines: {}", e);
            process::exit(1);
        }
    }
}
