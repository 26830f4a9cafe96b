// outline.rs
use crate::boundary_seeker::BoundarySeeker;
use crate::flag::AllianceId;
use crate::geometry::Vector2;
use crate::map::Map;
use crate::vertex::Vertex;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BoundaryLoop {
    pub alliance_id: AllianceId,
    /// Emitted vertices; the last one repeats the first.
    pub vertices: Vec<Vertex>,
    /// Lattice corners of the vertices, in tile units.
    pub points: Vec<Vector2>,
    pub is_hole: bool,
    pub is_valid: bool,
}

impl BoundaryLoop {
    fn new(map: &Map, alliance_id: AllianceId, vertices: Vec<Vertex>) -> Self {
        let points: Vec<Vector2> = vertices.iter().map(Vertex::point).collect();
        let is_valid = vertices
            .first()
            .and_then(|head| map.tile(head.x, head.y))
            .map_or(false, |tile| tile.is_valid());
        let is_hole = signed_area(&points) < 0;

        Self {
            alliance_id,
            vertices,
            points,
            is_hole,
            is_valid,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.vertices.len() > 1 && self.vertices.first() == self.vertices.last()
    }

    /// Enclosed area in tiles, negative for holes.
    pub fn area(&self) -> i64 {
        signed_area(&self.points) / 2
    }
}

/// Twice the shoelace area. Positive for clockwise rings in y-down space.
fn signed_area(points: &[Vector2]) -> i64 {
    let doubled: i128 = points
        .windows(2)
        .map(|pair| {
            let (a, b) = (pair[0], pair[1]);
            a.x as i128 * b.y as i128 - b.x as i128 * a.y as i128
        })
        .sum();
    doubled as i64
}

pub fn trace_outlines(map: &Map, alliance_id: AllianceId) -> Vec<BoundaryLoop> {
    let mut seeker = BoundarySeeker::new(map, alliance_id);
    let mut loops = Vec::new();
    let mut current = Vec::new();

    while let Some(vertex) = seeker.next() {
        current.push(vertex);
        if seeker.is_tail() || seeker.finished() {
            loops.push(BoundaryLoop::new(map, alliance_id, std::mem::take(&mut current)));
        }
    }

    if !current.is_empty() {
        log::warn!(
            "alliance {}: outline ended with {} unclosed vertices",
            alliance_id,
            current.len()
        );
    }

    loops
}

pub fn trace_all_outlines(map: &Map) -> Vec<BoundaryLoop> {
    map.alliance_ids()
        .flat_map(|alliance_id| trace_outlines(map, alliance_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn single_fortress_outline_is_its_square() {
        let mut map = Map::new();
        map.add_flag(0, 0, 1, true, Utc::now()).unwrap();

        let loops = trace_outlines(&map, 1);
        assert_eq!(loops.len(), 1);
        let outline = &loops[0];
        assert!(outline.is_closed());
        assert!(!outline.is_hole);
        assert!(outline.is_valid);
        assert_eq!(
            outline.points,
            vec![
                Vector2::new(-7, -7),
                Vector2::new(8, -7),
                Vector2::new(8, 8),
                Vector2::new(-7, 8),
                Vector2::new(-7, -7),
            ]
        );
        assert_eq!(outline.area(), 225);
    }

    #[test]
    fn disconnected_fortresses_give_separate_loops() {
        let mut map = Map::new();
        let now = Utc::now();
        map.add_flag(0, 0, 1, true, now).unwrap();
        map.add_flag(40, 0, 1, true, now + Duration::seconds(1)).unwrap();
        map.add_flag(0, 40, 2, true, now + Duration::seconds(2)).unwrap();

        assert_eq!(trace_outlines(&map, 1).len(), 2);
        assert_eq!(trace_outlines(&map, 2).len(), 1);
        assert_eq!(trace_all_outlines(&map).len(), 3);
        assert!(trace_outlines(&map, 9).is_empty());
    }

    #[test]
    fn invalid_territory_is_flagged() {
        let mut map = Map::new();
        let now = Utc::now();
        map.add_flag(0, 0, 1, true, now).unwrap();
        let bridge = map.add_flag(15, 0, 1, false, now + Duration::seconds(1)).unwrap();
        map.add_flag(30, 0, 1, false, now + Duration::seconds(2)).unwrap();
        map.remove_flag(bridge);

        let loops = trace_outlines(&map, 1);
        assert_eq!(loops.len(), 2);
        assert_eq!(loops.iter().filter(|outline| outline.is_valid).count(), 1);
    }

    #[test]
    fn shoelace_sign_follows_winding() {
        let clockwise = [
            Vector2::new(0, 0),
            Vector2::new(2, 0),
            Vector2::new(2, 2),
            Vector2::new(0, 2),
            Vector2::new(0, 0),
        ];
        assert_eq!(signed_area(&clockwise), 8);
        let mut counter = clockwise;
        counter.reverse();
        assert_eq!(signed_area(&counter), -8);
    }
}
