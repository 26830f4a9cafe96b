// map_config.rs
use crate::error::MapConfigError;
use crate::flag::{AllianceId, FlagId};
use crate::geometry::FLAG_SIDE;
use crate::map::Map;
use chrono::{DateTime, Duration, Utc};
use lazy_static::lazy_static;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const PRESET_PATH_ENV: &str = "TERRITORY_PRESET_PATH";

lazy_static! {
    pub static ref DEFAULT_PRESET: MapConfig = serde_json::from_str(include_str!("preset.json"))
        .expect("builtin map preset should parse");
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapConfig {
    pub flags: Vec<FlagConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlagConfig {
    pub alliance_id: AllianceId,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub is_fortress: bool,
    /// Seconds after the map epoch the flag was planted; defaults to its position in the list.
    #[serde(default)]
    pub placed_after_secs: Option<i64>,
}

impl MapConfig {
    pub fn to_map(&self, epoch: DateTime<Utc>) -> (Map, Vec<FlagId>) {
        let mut map = Map::new();
        let mut placed = Vec::new();

        for (i, flag) in self.flags.iter().enumerate() {
            let offset = flag.placed_after_secs.unwrap_or(i as i64);
            match map.add_flag(
                flag.x,
                flag.y,
                flag.alliance_id,
                flag.is_fortress,
                epoch + Duration::seconds(offset),
            ) {
                Ok(id) => placed.push(id),
                Err(err) => log::warn!("skipping preset flag at ({}, {}): {}", flag.x, flag.y, err),
            }
        }

        (map, placed)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, MapConfigError> {
        let data = fs::read_to_string(path).map_err(|source| MapConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: MapConfig = serde_json::from_str(&data)?;
        Ok(config)
    }

    /// Reads the preset named by `TERRITORY_PRESET_PATH`, falling back to the builtin one.
    pub fn load_from_env() -> Self {
        let Some(path) = env::var(PRESET_PATH_ENV).ok().map(PathBuf::from) else {
            return DEFAULT_PRESET.clone();
        };

        match Self::load_from_file(&path) {
            Ok(config) => {
                log::info!("loaded map preset from {}", path.display());
                config
            }
            Err(err) => {
                log::warn!("{}; using the builtin preset", err);
                DEFAULT_PRESET.clone()
            }
        }
    }

    /// A fortress per alliance followed by a random walk of flags close enough to connect.
    pub fn random(num_alliances: usize, flags_per_alliance: usize) -> Self {
        let mut rng = thread_rng();
        let mut flags = Vec::new();
        let step = FLAG_SIDE - 1;

        for alliance_id in 1..=num_alliances as AllianceId {
            let (mut x, mut y) = (rng.gen_range(0..200), rng.gen_range(0..200));
            flags.push(FlagConfig {
                alliance_id,
                x,
                y,
                is_fortress: true,
                placed_after_secs: None,
            });

            for _ in 1..flags_per_alliance {
                x += rng.gen_range(-step..=step);
                y += rng.gen_range(-step..=step);
                flags.push(FlagConfig {
                    alliance_id,
                    x,
                    y,
                    is_fortress: false,
                    placed_after_secs: None,
                });
            }
        }

        Self { flags }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_preset_parses() {
        assert_eq!(DEFAULT_PRESET.flags.len(), 17);
        assert!(DEFAULT_PRESET.flags[0].is_fortress);
        assert!(!DEFAULT_PRESET.flags[2].is_fortress);
        assert_eq!(DEFAULT_PRESET.flags[2].placed_after_secs, None);
    }

    #[test]
    fn builtin_preset_builds_two_alliances() {
        let (map, placed) = DEFAULT_PRESET.to_map(Utc::now());
        assert!(!placed.is_empty());
        assert_eq!(map.alliance_ids().collect::<Vec<_>>(), vec![1, 2]);
        assert!(map.tile(25, 25).unwrap().is_valid());
    }

    #[test]
    fn explicit_offsets_order_flags() {
        let config: MapConfig = serde_json::from_str(
            r#"{"flags": [
                {"alliance_id": 4, "x": 0, "y": 0, "is_fortress": true, "placed_after_secs": 30},
                {"alliance_id": 4, "x": 15, "y": 0, "placed_after_secs": 10}
            ]}"#,
        )
        .unwrap();
        let epoch = Utc::now();
        let (map, placed) = config.to_map(epoch);
        assert_eq!(placed.len(), 2);
        let second = map.flag(placed[1]).unwrap();
        assert_eq!(second.mtime, epoch + Duration::seconds(10));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = MapConfig::load_from_file(Path::new("/nonexistent/preset.json")).unwrap_err();
        assert!(matches!(err, MapConfigError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/preset.json"));
    }

    #[test]
    fn random_preset_starts_each_alliance_with_a_fortress() {
        let config = MapConfig::random(3, 4);
        assert_eq!(config.flags.len(), 12);
        for chunk in config.flags.chunks(4) {
            assert!(chunk[0].is_fortress);
            assert!(chunk[1..].iter().all(|flag| !flag.is_fortress));
            assert!(chunk.iter().all(|flag| flag.alliance_id == chunk[0].alliance_id));
        }
    }
}
