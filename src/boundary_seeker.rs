// boundary_seeker.rs
use crate::flag::AllianceId;
use crate::geometry::Vector2;
use crate::map::Map;
use crate::vertex::{Vertex, VertexCode};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Walks the classified corners of one alliance and emits them as closed outline loops.
///
/// Each call to [`BoundarySeeker::next`] yields one vertex. A loop ends by repeating its first
/// vertex, after which [`BoundarySeeker::is_tail`] is true until the next loop starts.
/// Consumed corner bits are removed, so every corner is emitted exactly once.
#[derive(Debug, Clone, Default)]
pub struct BoundarySeeker {
    codes: HashMap<Vector2, VertexCode>,
    /// x => sorted y of every coordinate with bits left.
    columns: BTreeMap<i32, BTreeSet<i32>>,
    /// y => sorted x of every coordinate with bits left.
    rows: BTreeMap<i32, BTreeSet<i32>>,
    head: Option<Vertex>,
    current: Option<Vertex>,
}

impl BoundarySeeker {
    pub fn new(map: &Map, alliance_id: AllianceId) -> Self {
        let mut seeker = Self::default();
        for flag in map.flags_of(alliance_id) {
            for (pos, code) in flag.vertexes() {
                seeker.insert(*pos, *code);
            }
        }
        seeker
    }

    fn insert(&mut self, pos: Vector2, code: VertexCode) {
        if code.is_empty() {
            return;
        }
        self.codes.insert(pos, code);
        self.columns.entry(pos.x).or_default().insert(pos.y);
        self.rows.entry(pos.y).or_default().insert(pos.x);
    }

    fn remove(&mut self, pos: Vector2) {
        self.codes.remove(&pos);
        if let Some(ys) = self.columns.get_mut(&pos.x) {
            ys.remove(&pos.y);
            if ys.is_empty() {
                self.columns.remove(&pos.x);
            }
        }
        if let Some(xs) = self.rows.get_mut(&pos.y) {
            xs.remove(&pos.x);
            if xs.is_empty() {
                self.rows.remove(&pos.y);
            }
        }
    }

    fn code_at(&self, pos: Vector2) -> VertexCode {
        self.codes.get(&pos).copied().unwrap_or_default()
    }

    pub fn current_code(&self) -> VertexCode {
        self.current.map_or(VertexCode::empty(), |vertex| self.code_at(vertex.pos()))
    }

    pub fn remaining(&self) -> usize {
        self.codes.len()
    }

    pub fn next(&mut self) -> Option<Vertex> {
        if self.codes.is_empty() {
            let head = self.head.take();
            self.current = None;
            return head;
        }

        let next = match (self.head, self.current) {
            (Some(head), Some(current)) => match self.pick_next(head, current) {
                Some(next) => next,
                None => {
                    // Nothing continues the outline: close it on its head.
                    self.head = None;
                    self.current = Some(head);
                    return Some(head);
                }
            },
            _ => {
                let head = self.pick_head()?;
                self.head = Some(head);
                head
            }
        };

        self.consume(next);
        self.current = Some(next);
        Some(next)
    }

    pub fn is_head(&self) -> bool {
        self.head.is_none() && self.current.is_none()
    }

    pub fn is_tail(&self) -> bool {
        self.head.is_none() && self.current.is_some()
    }

    pub fn finished(&self) -> bool {
        self.codes.is_empty() && self.current.is_none()
    }

    fn consume(&mut self, vertex: Vertex) {
        let pos = vertex.pos();
        let Some(code) = self.codes.get_mut(&pos) else {
            return;
        };
        *code ^= vertex.kind.code();
        if code.is_empty() {
            self.remove(pos);
        }
    }

    /// Starts a loop at the smallest remaining coordinate, ordered by x then y.
    fn pick_head(&self) -> Option<Vertex> {
        let (x, ys) = self.columns.iter().next()?;
        let y = *ys.iter().next()?;
        let pos = Vector2::new(*x, y);
        let kind = self.code_at(pos).lowest_kind()?;
        Some(Vertex::new(pos, kind))
    }

    fn pick_next(&self, head: Vertex, current: Vertex) -> Option<Vertex> {
        let vertex_type = current.vertex_type();
        if vertex_type.is_outer {
            if let Some(next) = self.pick_self(current) {
                return Some(next);
            }
        }

        self.pick_along(head, current, vertex_type.orientation.is_horizontal())
    }

    /// Two outer corners can share a tile; turn in place when the next one is here.
    fn pick_self(&self, current: Vertex) -> Option<Vertex> {
        let matched = current.vertex_type().expected & self.code_at(current.pos());
        let kind = matched.lowest_kind()?;
        kind.is_outer().then(|| Vertex::new(current.pos(), kind))
    }

    fn pick_along(&self, head: Vertex, current: Vertex, horizontal: bool) -> Option<Vertex> {
        // (coordinate along the walk, coordinate fixed by it)
        let split = |pos: Vector2| if horizontal { (pos.x, pos.y) } else { (pos.y, pos.x) };
        let join = |along: i32, fixed: i32| {
            if horizontal {
                Vector2::new(along, fixed)
            } else {
                Vector2::new(fixed, along)
            }
        };

        let (start, fixed) = split(current.pos());
        let (head_along, head_fixed) = split(head.pos());
        let line = if horizontal {
            self.rows.get(&fixed)?
        } else {
            self.columns.get(&fixed)?
        };

        let vertex_type = current.vertex_type();
        let expected = vertex_type.expected;
        let forward = split(vertex_type.orientation.vector()).0 > 0;
        let likely_closed = fixed == head_fixed && expected.contains(head.kind.code());

        let candidates: Box<dyn Iterator<Item = &i32>> = if forward {
            Box::new(line.range(start + 1..))
        } else {
            Box::new(line.range(..start).rev())
        };

        for &along in candidates {
            if likely_closed && passes(start, along, head_along) {
                return None;
            }
            let pos = join(along, fixed);
            if let Some(kind) = (expected & self.code_at(pos)).lowest_kind() {
                return Some(Vertex::new(pos, kind));
            }
        }

        None
    }
}

/// Whether stepping from `from` to `to` jumps over `head` without landing on it.
fn passes(from: i32, to: i32, head: i32) -> bool {
    (from < head && to > head) || (from > head && to < head)
}
