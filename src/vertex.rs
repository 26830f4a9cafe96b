// vertex.rs
use crate::flag::FlagId;
use crate::geometry::{Orientation, Vector2, ORIENTATIONS};
use crate::map::Map;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VertexCode: u8 {
        const OUTER_NW = 1;
        const OUTER_NE = 1 << 1;
        const OUTER_SE = 1 << 2;
        const OUTER_SW = 1 << 3;
        const INNER_NW = 1 << 4;
        const INNER_NE = 1 << 5;
        const INNER_SE = 1 << 6;
        const INNER_SW = 1 << 7;
    }
}

impl VertexCode {
    pub fn lowest_kind(self) -> Option<VertexKind> {
        if self.is_empty() {
            return None;
        }
        VertexKind::from_index(self.bits().trailing_zeros() as usize)
    }

    pub fn kinds(self) -> impl Iterator<Item = VertexKind> {
        VERTEX_KINDS.into_iter().filter(move |kind| self.contains(kind.code()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VertexKind {
    OuterNW = 0,
    OuterNE = 1,
    OuterSE = 2,
    OuterSW = 3,
    InnerNW = 4,
    InnerNE = 5,
    InnerSE = 6,
    InnerSW = 7,
}

pub const VERTEX_KINDS: [VertexKind; 8] = [
    VertexKind::OuterNW,
    VertexKind::OuterNE,
    VertexKind::OuterSE,
    VertexKind::OuterSW,
    VertexKind::InnerNW,
    VertexKind::InnerNE,
    VertexKind::InnerSE,
    VertexKind::InnerSW,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexType {
    pub kind: VertexKind,
    /// Corner of the tile the vertex sits on, in tile units.
    pub pos: Vector2,
    /// Direction the outline leaves this vertex in.
    pub orientation: Orientation,
    pub is_outer: bool,
    /// Types allowed to follow this one along the outline.
    pub expected: VertexCode,
}

pub static VERTEX_TYPES: [VertexType; 8] = [
    VertexType {
        kind: VertexKind::OuterNW,
        pos: Vector2::new(0, 0),
        orientation: Orientation::E,
        is_outer: true,
        expected: VertexCode::OUTER_NE.union(VertexCode::INNER_NW),
    },
    VertexType {
        kind: VertexKind::OuterNE,
        pos: Vector2::new(1, 0),
        orientation: Orientation::S,
        is_outer: true,
        expected: VertexCode::OUTER_SE.union(VertexCode::INNER_NE),
    },
    VertexType {
        kind: VertexKind::OuterSE,
        pos: Vector2::new(1, 1),
        orientation: Orientation::W,
        is_outer: true,
        expected: VertexCode::OUTER_SW.union(VertexCode::INNER_SE),
    },
    VertexType {
        kind: VertexKind::OuterSW,
        pos: Vector2::new(0, 1),
        orientation: Orientation::N,
        is_outer: true,
        expected: VertexCode::OUTER_NW.union(VertexCode::INNER_SW),
    },
    VertexType {
        kind: VertexKind::InnerNW,
        pos: Vector2::new(0, 0),
        orientation: Orientation::N,
        is_outer: false,
        expected: VertexCode::OUTER_NW.union(VertexCode::INNER_SW),
    },
    VertexType {
        kind: VertexKind::InnerNE,
        pos: Vector2::new(1, 0),
        orientation: Orientation::E,
        is_outer: false,
        expected: VertexCode::OUTER_NE.union(VertexCode::INNER_NW),
    },
    VertexType {
        kind: VertexKind::InnerSE,
        pos: Vector2::new(1, 1),
        orientation: Orientation::S,
        is_outer: false,
        expected: VertexCode::OUTER_SE.union(VertexCode::INNER_NE),
    },
    VertexType {
        kind: VertexKind::InnerSW,
        pos: Vector2::new(0, 1),
        orientation: Orientation::W,
        is_outer: false,
        expected: VertexCode::OUTER_SW.union(VertexCode::INNER_SE),
    },
];

impl VertexKind {
    pub fn from_index(index: usize) -> Option<VertexKind> {
        VERTEX_KINDS.get(index).copied()
    }

    pub fn code(self) -> VertexCode {
        VertexCode::from_bits_retain(1 << self as u8)
    }

    pub fn info(self) -> &'static VertexType {
        &VERTEX_TYPES[self as usize]
    }

    pub fn is_outer(self) -> bool {
        self.info().is_outer
    }
}

/// A corner on an outline: the tile it belongs to and which corner of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vertex {
    pub x: i32,
    pub y: i32,
    pub kind: VertexKind,
}

impl Vertex {
    pub fn new(pos: Vector2, kind: VertexKind) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            kind,
        }
    }

    pub fn pos(&self) -> Vector2 {
        Vector2::new(self.x, self.y)
    }

    pub fn vertex_type(&self) -> &'static VertexType {
        self.kind.info()
    }

    /// Lattice point of the corner, in tile units.
    pub fn point(&self) -> Vector2 {
        self.pos() + self.kind.info().pos
    }
}

impl Map {
    pub fn calc_vertex_code(&self, pos: Vector2) -> VertexCode {
        let alliance_id = self.tile(pos.x, pos.y).map_or(0, |tile| tile.alliance_id());

        let mut surround = [false; 8];
        for orientation in ORIENTATIONS {
            let next = pos + orientation.vector();
            surround[orientation.index()] = self
                .tile(next.x, next.y)
                .map_or(false, |tile| tile.alliance_id() == alliance_id);
        }

        let mut code = VertexCode::empty();
        for vertex_type in VERTEX_TYPES.iter() {
            let o = vertex_type.orientation;
            let present = if vertex_type.is_outer {
                !surround[o.back().index()] && !surround[o.left().index()]
            } else {
                surround[o.index()]
                    && !surround[o.rotate(-1).index()]
                    && surround[o.rotate(-2).index()]
            };
            if present {
                code |= vertex_type.kind.code();
            }
        }

        code
    }

    pub(crate) fn refresh_vertexes(&mut self, id: FlagId) {
        let vertexes: HashMap<Vector2, VertexCode> = match self.flag(id) {
            Some(flag) => flag
                .owned_tiles()
                .filter_map(|pos| {
                    let code = self.calc_vertex_code(pos);
                    (!code.is_empty()).then_some((pos, code))
                })
                .collect(),
            None => return,
        };

        if let Some(flag) = self.flag_mut(id) {
            flag.vertexes = vertexes;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn kinds_map_to_single_bits() {
        for (i, kind) in VERTEX_KINDS.iter().enumerate() {
            assert_eq!(kind.code().bits(), 1 << i);
            assert_eq!(kind.info().kind, *kind);
            assert_eq!(kind.code().lowest_kind(), Some(*kind));
        }
        assert_eq!(VertexCode::empty().lowest_kind(), None);
    }

    #[test]
    fn expected_codes_follow_clockwise_walk() {
        // Every outer corner hands over either to the next outer corner or to an inner corner.
        assert_eq!(
            VertexKind::OuterNW.info().expected,
            VertexCode::OUTER_NE | VertexCode::INNER_NW
        );
        assert_eq!(
            VertexKind::InnerSW.info().expected,
            VertexCode::OUTER_SW | VertexCode::INNER_SE
        );
        let outer = VERTEX_KINDS.iter().filter(|kind| kind.is_outer()).count();
        assert_eq!(outer, 4);
    }

    #[test]
    fn lowest_kind_prefers_outer() {
        let code = VertexCode::INNER_SE | VertexCode::OUTER_SW;
        assert_eq!(code.lowest_kind(), Some(VertexKind::OuterSW));
        let kinds: Vec<VertexKind> = code.kinds().collect();
        assert_eq!(kinds, vec![VertexKind::OuterSW, VertexKind::InnerSE]);
    }

    #[test]
    fn vertex_point_adds_corner_offset() {
        let vertex = Vertex::new(Vector2::new(4, 9), VertexKind::OuterSE);
        assert_eq!(vertex.point(), Vector2::new(5, 10));
        assert_eq!(vertex.vertex_type().orientation, Orientation::W);
    }

    #[test]
    fn isolated_tile_has_only_outer_corners() {
        let mut map = Map::new();
        map.add_flag(0, 0, 1, true, Utc::now()).unwrap();

        // A claim square surrounded by nothing has its four outer corners.
        let corner = map.calc_vertex_code(Vector2::new(-7, -7));
        assert_eq!(corner, VertexCode::OUTER_NW);
        let code = map.calc_vertex_code(Vector2::new(100, 100));
        assert_eq!(
            code,
            VertexCode::OUTER_NW | VertexCode::OUTER_NE | VertexCode::OUTER_SE | VertexCode::OUTER_SW
        );
    }

    #[test]
    fn classification_is_idempotent() {
        let mut map = Map::new();
        let fortress = map.add_flag(0, 0, 1, true, Utc::now()).unwrap();
        map.add_flag(12, 5, 1, false, Utc::now()).unwrap();

        // The second square meets the fortress' right edge, leaving a notch above (8, -3).
        let pos = Vector2::new(7, -2);
        let first = map.calc_vertex_code(pos);
        let second = map.calc_vertex_code(pos);
        assert_eq!(first, second);
        assert_eq!(first, VertexCode::INNER_NE);
        assert_eq!(
            map.flag(fortress).unwrap().vertex_code(pos),
            Some(VertexCode::INNER_NE)
        );
    }
}
