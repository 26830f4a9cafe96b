// state.rs
use crate::flag::{AllianceId, FlagId};
use crate::map::Map;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::Serialize;

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct MapState {
    pub flags: Vec<FlagState>,
    pub alliances: Vec<AllianceState>,
    pub tile_count: usize,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct FlagState {
    pub id: FlagId,
    pub alliance_id: AllianceId,
    pub x: i32,
    pub y: i32,
    pub is_fortress: bool,
    pub is_valid: bool,
    pub mtime: DateTime<Utc>,
    pub tile_count: usize,
    pub vertex_count: usize,
    pub neighbors: Vec<FlagId>,
    pub overlaps: Vec<FlagId>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct AllianceState {
    pub alliance_id: AllianceId,
    pub flag_count: usize,
    pub fortress_count: usize,
    pub valid_tiles: usize,
    pub invalid_tiles: usize,
}

impl Map {
    pub fn get_map_state(&self) -> MapState {
        let flags = self
            .flags()
            .sorted_by_key(|flag| flag.id)
            .map(|flag| FlagState {
                id: flag.id,
                alliance_id: flag.alliance_id,
                x: flag.anchor.x,
                y: flag.anchor.y,
                is_fortress: flag.is_fortress,
                is_valid: flag.is_valid,
                mtime: flag.mtime,
                tile_count: flag.tile_count(),
                vertex_count: flag.vertexes().len(),
                neighbors: flag.neighbors().iter().copied().collect(),
                overlaps: flag.overlaps().iter().copied().collect(),
            })
            .collect();

        let tile_validity = self
            .tiles()
            .map(|tile| (tile.alliance_id(), tile.is_valid()))
            .into_group_map();

        let alliances = self
            .alliance_ids()
            .map(|alliance_id| {
                let validity = tile_validity.get(&alliance_id);
                let valid_tiles = validity.map_or(0, |tiles| tiles.iter().filter(|v| **v).count());
                let total_tiles = validity.map_or(0, Vec::len);
                let alliance = self.alliance(alliance_id);
                AllianceState {
                    alliance_id,
                    flag_count: alliance.map_or(0, |a| a.flags.len()),
                    fortress_count: alliance.map_or(0, |a| a.fortresses.len()),
                    valid_tiles,
                    invalid_tiles: total_tiles - valid_tiles,
                }
            })
            .collect();

        MapState {
            flags,
            alliances,
            tile_count: self.tile_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::map::Map;
    use chrono::{Duration, Utc};

    #[test]
    fn state_counts_valid_and_invalid_tiles() {
        let mut map = Map::new();
        let now = Utc::now();
        map.add_flag(0, 0, 1, true, now).unwrap();
        let bridge = map.add_flag(15, 0, 1, false, now + Duration::seconds(1)).unwrap();
        map.add_flag(30, 0, 1, false, now + Duration::seconds(2)).unwrap();
        map.add_flag(0, 40, 2, true, now + Duration::seconds(3)).unwrap();
        map.remove_flag(bridge);

        let state = map.get_map_state();
        assert_eq!(state.flags.len(), 3);
        assert_eq!(state.tile_count, 3 * 225);

        let red = &state.alliances[0];
        assert_eq!(red.alliance_id, 1);
        assert_eq!(red.flag_count, 2);
        assert_eq!(red.fortress_count, 1);
        assert_eq!(red.valid_tiles, 225);
        assert_eq!(red.invalid_tiles, 225);

        let blue = &state.alliances[1];
        assert_eq!(blue.valid_tiles, 225);
        assert_eq!(blue.invalid_tiles, 0);
    }

    #[test]
    fn state_serializes_to_json() {
        let mut map = Map::new();
        map.add_flag(3, 4, 7, true, Utc::now()).unwrap();
        let json = serde_json::to_value(map.get_map_state()).unwrap();
        assert_eq!(json["flags"][0]["x"], 3);
        assert_eq!(json["flags"][0]["alliance_id"], 7);
        assert_eq!(json["alliances"][0]["valid_tiles"], 225);
    }
}
