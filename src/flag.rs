// flag.rs
use crate::geometry::{ClaimSquare, Vector2, FLAG_HALF_LENGTH, FLAG_SIDE};
use crate::vertex::VertexCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

pub type AllianceId = i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlagId(pub u32);

impl fmt::Display for FlagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Flag {
    pub id: FlagId,
    pub alliance_id: AllianceId,
    pub anchor: Vector2,
    pub is_fortress: bool,
    pub is_valid: bool,
    pub mtime: DateTime<Utc>,
    /// One row per y offset of the claim square, bit `i` set when column offset `i` is owned.
    bitmap: [u16; FLAG_SIDE as usize],
    pub(crate) neighbors: BTreeSet<FlagId>,
    pub(crate) overlaps: BTreeSet<FlagId>,
    pub(crate) vertexes: HashMap<Vector2, VertexCode>,
}

impl Flag {
    pub fn new(
        id: FlagId,
        alliance_id: AllianceId,
        anchor: Vector2,
        is_fortress: bool,
        mtime: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            alliance_id,
            anchor,
            is_fortress,
            is_valid: is_fortress,
            mtime,
            bitmap: [0; FLAG_SIDE as usize],
            neighbors: BTreeSet::new(),
            overlaps: BTreeSet::new(),
            vertexes: HashMap::new(),
        }
    }

    pub fn claim_square(&self) -> ClaimSquare {
        ClaimSquare::around(self.anchor)
    }

    fn offset(&self, pos: Vector2) -> Option<(usize, u32)> {
        let row = pos.y as i64 - self.anchor.y as i64 + FLAG_HALF_LENGTH as i64;
        let col = pos.x as i64 - self.anchor.x as i64 + FLAG_HALF_LENGTH as i64;
        let side = 0..FLAG_SIDE as i64;
        if side.contains(&row) && side.contains(&col) {
            Some((row as usize, col as u32))
        } else {
            None
        }
    }

    pub(crate) fn set_tile_bit(&mut self, pos: Vector2) {
        if let Some((row, col)) = self.offset(pos) {
            self.bitmap[row] |= 1 << col;
        }
    }

    pub(crate) fn clear_tile_bit(&mut self, pos: Vector2) {
        if let Some((row, col)) = self.offset(pos) {
            self.bitmap[row] &= !(1 << col);
        }
    }

    pub fn owns(&self, pos: Vector2) -> bool {
        self.offset(pos)
            .map_or(false, |(row, col)| (self.bitmap[row] >> col) & 1 == 1)
    }

    pub fn owned_tiles(&self) -> impl Iterator<Item = Vector2> + '_ {
        let origin = Vector2::new(self.anchor.x - FLAG_HALF_LENGTH, self.anchor.y - FLAG_HALF_LENGTH);
        self.bitmap
            .iter()
            .enumerate()
            .filter(|(_, bits)| **bits != 0)
            .flat_map(move |(row, bits)| {
                (0..FLAG_SIDE)
                    .filter(move |col| (bits >> col) & 1 == 1)
                    .map(move |col| Vector2::new(origin.x + col, origin.y + row as i32))
            })
    }

    pub fn tile_count(&self) -> usize {
        self.bitmap.iter().map(|bits| bits.count_ones() as usize).sum()
    }

    pub fn neighbors(&self) -> &BTreeSet<FlagId> {
        &self.neighbors
    }

    pub fn overlaps(&self) -> &BTreeSet<FlagId> {
        &self.overlaps
    }

    pub fn vertexes(&self) -> &HashMap<Vector2, VertexCode> {
        &self.vertexes
    }

    pub fn vertex_code(&self, pos: Vector2) -> Option<VertexCode> {
        self.vertexes.get(&pos).copied()
    }
}
