// geometry.rs
use serde::{Deserialize, Serialize};
use std::ops::Add;

/// Half the side length of a flag's claim square, not counting the anchor row/column.
pub const FLAG_HALF_LENGTH: i32 = 7;
pub const FLAG_SIDE: i32 = FLAG_HALF_LENGTH * 2 + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: i32,
    pub y: i32,
}

impl Vector2 {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Vector2 {
    type Output = Vector2;

    fn add(self, other: Vector2) -> Vector2 {
        Vector2::new(self.x + other.x, self.y + other.y)
    }
}

//   |              |
// 0 |      N       | 1
//---|--------------|---
//   | NW        NE |
//   |              |
// W |     TILE     | E
//   |              |
//   | SW        SE |
//---+--------------+---
// 3 |      S       | 2
//   |              |
//
// The y axis grows downwards, so clockwise order is E, SE, S, SW, W, NW, N, NE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    E = 0,
    SE = 1,
    S = 2,
    SW = 3,
    W = 4,
    NW = 5,
    N = 6,
    NE = 7,
}

pub const ORIENTATIONS: [Orientation; 8] = [
    Orientation::E,
    Orientation::SE,
    Orientation::S,
    Orientation::SW,
    Orientation::W,
    Orientation::NW,
    Orientation::N,
    Orientation::NE,
];

/// The four directions the area scans step through.
pub const AXIS_ORIENTATIONS: [Orientation; 4] = [
    Orientation::W,
    Orientation::E,
    Orientation::N,
    Orientation::S,
];

impl Orientation {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn vector(self) -> Vector2 {
        match self {
            Orientation::E => Vector2::new(1, 0),
            Orientation::SE => Vector2::new(1, 1),
            Orientation::S => Vector2::new(0, 1),
            Orientation::SW => Vector2::new(-1, 1),
            Orientation::W => Vector2::new(-1, 0),
            Orientation::NW => Vector2::new(-1, -1),
            Orientation::N => Vector2::new(0, -1),
            Orientation::NE => Vector2::new(1, -1),
        }
    }

    /// Rotates clockwise in 45 degree steps; negative `times` rotates counter-clockwise.
    pub fn rotate(self, times: i32) -> Orientation {
        ORIENTATIONS[(self as i32 + times).rem_euclid(8) as usize]
    }

    pub fn right(self) -> Orientation {
        self.rotate(2)
    }

    pub fn back(self) -> Orientation {
        self.rotate(4)
    }

    pub fn left(self) -> Orientation {
        self.rotate(-2)
    }

    pub fn is_horizontal(self) -> bool {
        self.vector().x != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimSquare {
    pub min: Vector2,
    pub max: Vector2,
}

impl ClaimSquare {
    pub fn around(anchor: Vector2) -> Self {
        Self {
            min: Vector2::new(anchor.x - FLAG_HALF_LENGTH, anchor.y - FLAG_HALF_LENGTH),
            max: Vector2::new(anchor.x + FLAG_HALF_LENGTH, anchor.y + FLAG_HALF_LENGTH),
        }
    }

    /// Whether the square around `anchor`, plus the ring of tiles touching it, fits in `i32`.
    pub fn fits(anchor: Vector2) -> bool {
        let margin = FLAG_HALF_LENGTH + 2;
        [anchor.x, anchor.y]
            .into_iter()
            .all(|v| v.checked_sub(margin).is_some() && v.checked_add(margin).is_some())
    }

    pub fn contains(&self, pos: Vector2) -> bool {
        pos.x >= self.min.x && pos.x <= self.max.x && pos.y >= self.min.y && pos.y <= self.max.y
    }

    pub fn positions(&self) -> impl Iterator<Item = Vector2> {
        let (min, max) = (self.min, self.max);
        (min.y..=max.y).flat_map(move |y| (min.x..=max.x).map(move |x| Vector2::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_wraps_in_both_directions() {
        assert_eq!(Orientation::E.rotate(-1), Orientation::NE);
        assert_eq!(Orientation::NE.rotate(1), Orientation::E);
        assert_eq!(Orientation::N.rotate(-2), Orientation::W);
        assert_eq!(Orientation::S.rotate(-10), Orientation::E);
        assert_eq!(Orientation::W.back(), Orientation::E);
        assert_eq!(Orientation::S.left(), Orientation::E);
        assert_eq!(Orientation::S.right(), Orientation::W);
    }

    #[test]
    fn orientation_table_matches_indices() {
        for (i, orientation) in ORIENTATIONS.iter().enumerate() {
            assert_eq!(orientation.index(), i);
        }
        assert!(Orientation::W.is_horizontal());
        assert!(!Orientation::N.is_horizontal());
    }

    #[test]
    fn claim_square_bounds() {
        let square = ClaimSquare::around(Vector2::new(10, -3));
        assert!(square.contains(Vector2::new(3, -10)));
        assert!(square.contains(Vector2::new(17, 4)));
        assert!(!square.contains(Vector2::new(18, 0)));
        assert!(!square.contains(Vector2::new(10, -11)));
        assert_eq!(square.positions().count(), (FLAG_SIDE * FLAG_SIDE) as usize);

        assert!(ClaimSquare::fits(Vector2::new(i32::MAX - 9, i32::MIN + 9)));
        assert!(!ClaimSquare::fits(Vector2::new(i32::MAX - 8, 0)));
        assert!(!ClaimSquare::fits(Vector2::new(0, i32::MIN + 8)));
    }

    #[test]
    fn vectors_are_ordered_by_x_then_y() {
        let mut coords = vec![Vector2::new(2, 0), Vector2::new(1, 5), Vector2::new(1, -1)];
        coords.sort();
        assert_eq!(
            coords,
            vec![Vector2::new(1, -1), Vector2::new(1, 5), Vector2::new(2, 0)]
        );
    }
}
