// tile.rs
use crate::flag::{AllianceId, FlagId};
use crate::geometry::Vector2;
use crate::map::Map;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub pos: Vector2,
    owner: Option<FlagId>,
    alliance_id: AllianceId,
}

impl Tile {
    pub fn new(pos: Vector2) -> Self {
        Self {
            pos,
            owner: None,
            alliance_id: 0,
        }
    }

    pub fn owner(&self) -> Option<FlagId> {
        self.owner
    }

    /// Alliance of the owning flag, 0 when unclaimed.
    pub fn alliance_id(&self) -> AllianceId {
        self.alliance_id
    }

    pub fn is_claimed(&self) -> bool {
        self.owner.is_some()
    }

    pub(crate) fn set_owner(&mut self, flag: FlagId, alliance_id: AllianceId) {
        self.owner = Some(flag);
        self.alliance_id = alliance_id;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TileRef<'a> {
    tile: &'a Tile,
    map: &'a Map,
}

impl<'a> TileRef<'a> {
    pub(crate) fn new(tile: &'a Tile, map: &'a Map) -> Self {
        Self { tile, map }
    }

    pub fn pos(&self) -> Vector2 {
        self.tile.pos
    }

    pub fn owner(&self) -> Option<FlagId> {
        self.tile.owner
    }

    pub fn alliance_id(&self) -> AllianceId {
        self.tile.alliance_id
    }

    pub fn is_valid(&self) -> bool {
        self.tile
            .owner
            .and_then(|id| self.map.flag(id))
            .map_or(false, |flag| flag.is_valid)
    }

    pub fn is_anchor(&self) -> bool {
        self.tile
            .owner
            .and_then(|id| self.map.flag(id))
            .map_or(false, |flag| flag.anchor == self.tile.pos)
    }

    pub fn state(&self) -> TileState {
        TileState {
            x: self.tile.pos.x,
            y: self.tile.pos.y,
            owner: self.owner(),
            alliance_id: self.alliance_id(),
            is_valid: self.is_valid(),
            is_anchor: self.is_anchor(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TileState {
    pub x: i32,
    pub y: i32,
    pub owner: Option<FlagId>,
    pub alliance_id: AllianceId,
    pub is_valid: bool,
    pub is_anchor: bool,
}
