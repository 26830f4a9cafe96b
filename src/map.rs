// map.rs
use crate::error::FlagError;
use crate::flag::{AllianceId, Flag, FlagId};
use crate::geometry::{ClaimSquare, Vector2, AXIS_ORIENTATIONS, ORIENTATIONS};
use crate::tile::{Tile, TileRef};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllianceFlags {
    pub flags: BTreeSet<FlagId>,
    pub fortresses: BTreeSet<FlagId>,
}

#[derive(Debug, Clone, Default)]
pub struct Map {
    tiles: HashMap<Vector2, Tile>,
    flags: HashMap<FlagId, Flag>,
    pub(crate) alliances: BTreeMap<AllianceId, AllianceFlags>,
    next_flag_id: u32,
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tile(&self, x: i32, y: i32) -> Option<TileRef<'_>> {
        self.tiles
            .get(&Vector2::new(x, y))
            .map(|tile| TileRef::new(tile, self))
    }

    /// Returns the tile at `(x, y)`, inserting an unclaimed one if needed, and whether it existed.
    /// Callers claim the tile before returning control.
    pub(crate) fn get_or_create_tile(&mut self, x: i32, y: i32) -> (&mut Tile, bool) {
        let pos = Vector2::new(x, y);
        let existed = self.tiles.contains_key(&pos);
        let tile = self.tiles.entry(pos).or_insert_with(|| Tile::new(pos));
        (tile, existed)
    }

    pub fn tiles(&self) -> impl Iterator<Item = TileRef<'_>> {
        self.tiles.values().map(move |tile| TileRef::new(tile, self))
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn flag(&self, id: FlagId) -> Option<&Flag> {
        self.flags.get(&id)
    }

    pub(crate) fn flag_mut(&mut self, id: FlagId) -> Option<&mut Flag> {
        self.flags.get_mut(&id)
    }

    pub fn flags(&self) -> impl Iterator<Item = &Flag> {
        self.flags.values()
    }

    pub fn alliance_ids(&self) -> impl Iterator<Item = AllianceId> + '_ {
        self.alliances.keys().copied()
    }

    pub fn alliance(&self, alliance_id: AllianceId) -> Option<&AllianceFlags> {
        self.alliances.get(&alliance_id)
    }

    pub fn flags_of(&self, alliance_id: AllianceId) -> impl Iterator<Item = &Flag> {
        self.alliances
            .get(&alliance_id)
            .into_iter()
            .flat_map(|alliance| alliance.flags.iter())
            .filter_map(move |id| self.flags.get(id))
    }

    pub fn add_flag(
        &mut self,
        x: i32,
        y: i32,
        alliance_id: AllianceId,
        is_fortress: bool,
        mtime: DateTime<Utc>,
    ) -> Result<FlagId, FlagError> {
        if alliance_id == 0 {
            return Err(FlagError::ReservedAlliance);
        }

        let anchor = Vector2::new(x, y);
        if !ClaimSquare::fits(anchor) {
            return Err(FlagError::OutOfBounds { x, y });
        }

        let mut previous_owner = None;
        if let Some(tile) = self.tile(x, y) {
            if let Some(owner) = tile.owner() {
                if tile.alliance_id() != alliance_id {
                    return Err(FlagError::NotYours {
                        x,
                        y,
                        owner: tile.alliance_id(),
                    });
                }
                if tile.is_anchor() {
                    return Err(FlagError::Occupied { x, y });
                }
                previous_owner = Some(owner);
            }
        }

        if !is_fortress && !self.check_flag_settable(anchor, alliance_id) {
            return Err(FlagError::Unreachable { x, y, alliance_id });
        }

        let id = FlagId(self.next_flag_id);
        self.next_flag_id += 1;

        let mut flag = Flag::new(id, alliance_id, anchor, is_fortress, mtime);
        flag.set_tile_bit(anchor);
        self.flags.insert(id, flag);
        self.get_or_create_tile(x, y).0.set_owner(id, alliance_id);

        // The anchor may sit on territory another flag of the alliance already holds.
        if let Some(owner) = previous_owner {
            if let Some(previous) = self.flags.get_mut(&owner) {
                previous.clear_tile_bit(anchor);
            }
            self.link_overlap(id, owner);
            self.link_neighbor(id, owner);
        }

        let alliance = self.alliances.entry(alliance_id).or_default();
        alliance.flags.insert(id);
        if is_fortress {
            alliance.fortresses.insert(id);
        }

        let mut changed = self.scan_flag_area(id);
        changed.push(anchor);

        let mut dirty: BTreeSet<FlagId> = self.owners_around(&changed);
        dirty.insert(id);
        if let Some(flag) = self.flags.get(&id) {
            dirty.extend(flag.neighbors.iter().copied());
        }
        for flag_id in dirty {
            self.refresh_vertexes(flag_id);
        }

        self.validate_alliance(alliance_id);

        log::debug!(
            "flag {} placed at ({}, {}) for alliance {}{}, {} tiles claimed",
            id,
            x,
            y,
            alliance_id,
            if is_fortress { " as fortress" } else { "" },
            changed.len()
        );

        Ok(id)
    }

    /// Removes a flag, lets the flags it overlapped reclaim the vacated tiles and re-validates.
    pub fn remove_flag(&mut self, id: FlagId) -> Option<Flag> {
        let flag = self.flags.remove(&id)?;

        if let Some(alliance) = self.alliances.get_mut(&flag.alliance_id) {
            alliance.flags.remove(&id);
            alliance.fortresses.remove(&id);
            if alliance.flags.is_empty() {
                self.alliances.remove(&flag.alliance_id);
            }
        }

        let mut released = Vec::new();
        for pos in flag.owned_tiles() {
            if self.tiles.get(&pos).and_then(Tile::owner) == Some(id) {
                self.tiles.remove(&pos);
                released.push(pos);
            }
        }

        let mut dirty = BTreeSet::new();
        for neighbor in &flag.neighbors {
            if let Some(other) = self.flags.get_mut(neighbor) {
                other.neighbors.remove(&id);
                dirty.insert(*neighbor);
            }
        }

        let mut alliance_ids = BTreeSet::from([flag.alliance_id]);
        let mut changed = released;

        // Oldest claims get the first chance at the vacated tiles.
        let overlaps: Vec<FlagId> = flag
            .overlaps
            .iter()
            .filter_map(|other| self.flags.get(other))
            .sorted_by_key(|other| (other.mtime, other.id))
            .map(|other| other.id)
            .collect();

        for overlap in overlaps {
            let Some(other) = self.flags.get_mut(&overlap) else {
                continue;
            };
            other.overlaps.remove(&id);
            other.neighbors.remove(&id);
            alliance_ids.insert(other.alliance_id);
            dirty.insert(overlap);

            changed.extend(self.scan_flag_area(overlap));
        }

        dirty.extend(self.owners_around(&changed));
        for flag_id in dirty {
            self.refresh_vertexes(flag_id);
        }

        for alliance_id in alliance_ids {
            self.validate_alliance(alliance_id);
        }

        log::debug!(
            "flag {} removed from ({}, {}), {} tiles changed hands",
            id,
            flag.anchor.x,
            flag.anchor.y,
            changed.len()
        );

        Some(flag)
    }

    /// Whether territory of `alliance_id` can be reached from `anchor` through unclaimed tiles
    /// of the anchor's claim square.
    fn check_flag_settable(&self, anchor: Vector2, alliance_id: AllianceId) -> bool {
        let square = ClaimSquare::around(anchor);
        let mut marked = HashSet::from([anchor]);
        let mut queue = VecDeque::from([anchor]);

        while let Some(pos) = queue.pop_front() {
            for orientation in AXIS_ORIENTATIONS {
                let next = pos + orientation.vector();
                let tile = self.tiles.get(&next);
                if tile.map_or(false, |tile| tile.alliance_id() == alliance_id) {
                    return true;
                }

                let unclaimed = tile.map_or(true, |tile| !tile.is_claimed());
                if marked.insert(next) && unclaimed && square.contains(next) {
                    queue.push_back(next);
                }
            }
        }

        false
    }

    /// Flood fills the flag's claim square from its anchor. Unclaimed tiles are claimed, owners
    /// of claimed tiles become overlaps, and same-alliance owners become neighbors as well.
    /// Returns the positions claimed by this pass.
    pub(crate) fn scan_flag_area(&mut self, id: FlagId) -> Vec<Vector2> {
        let Some(flag) = self.flags.get(&id) else {
            return Vec::new();
        };
        let (anchor, alliance_id) = (flag.anchor, flag.alliance_id);
        let square = ClaimSquare::around(anchor);

        let mut claimed = Vec::new();
        let mut overlaps = BTreeSet::new();
        let mut neighbors = BTreeSet::new();
        let mut marked = HashSet::from([anchor]);
        let mut queue = VecDeque::from([anchor]);

        while let Some(pos) = queue.pop_front() {
            for orientation in AXIS_ORIENTATIONS {
                let next = pos + orientation.vector();

                if !square.contains(next) {
                    // Tiles just outside the square only count for adjacency.
                    if let Some(tile) = self.tiles.get(&next) {
                        if let Some(owner) = tile.owner() {
                            if owner != id && tile.alliance_id() == alliance_id {
                                neighbors.insert(owner);
                            }
                        }
                    }
                    continue;
                }

                if !marked.insert(next) {
                    continue;
                }

                let (tile, _) = self.get_or_create_tile(next.x, next.y);
                match tile.owner() {
                    Some(owner) => {
                        if owner != id {
                            overlaps.insert(owner);
                        }
                        if tile.alliance_id() != alliance_id {
                            continue;
                        }
                        if owner != id {
                            neighbors.insert(owner);
                        }
                    }
                    None => {
                        tile.set_owner(id, alliance_id);
                        claimed.push(next);
                    }
                }

                queue.push_back(next);
            }
        }

        if let Some(flag) = self.flags.get_mut(&id) {
            for pos in &claimed {
                flag.set_tile_bit(*pos);
            }
        }
        for other in overlaps {
            self.link_overlap(id, other);
        }
        for other in neighbors {
            self.link_overlap(id, other);
            self.link_neighbor(id, other);
        }

        claimed
    }

    fn link_overlap(&mut self, a: FlagId, b: FlagId) {
        if a == b || !self.flags.contains_key(&a) || !self.flags.contains_key(&b) {
            return;
        }
        if let Some(flag) = self.flags.get_mut(&a) {
            flag.overlaps.insert(b);
        }
        if let Some(flag) = self.flags.get_mut(&b) {
            flag.overlaps.insert(a);
        }
    }

    fn link_neighbor(&mut self, a: FlagId, b: FlagId) {
        if a == b || !self.flags.contains_key(&a) || !self.flags.contains_key(&b) {
            return;
        }
        if let Some(flag) = self.flags.get_mut(&a) {
            flag.neighbors.insert(b);
        }
        if let Some(flag) = self.flags.get_mut(&b) {
            flag.neighbors.insert(a);
        }
    }

    fn owners_around(&self, positions: &[Vector2]) -> BTreeSet<FlagId> {
        positions
            .iter()
            .flat_map(|pos| {
                std::iter::once(*pos).chain(ORIENTATIONS.into_iter().map(move |o| *pos + o.vector()))
            })
            .filter_map(|pos| self.tiles.get(&pos).and_then(Tile::owner))
            .collect()
    }
}
