// validity.rs
use crate::flag::{AllianceId, FlagId};
use crate::map::Map;
use std::collections::{HashSet, VecDeque};

impl Map {
    /// Marks every flag of the alliance valid iff a fortress reaches it through neighbor links.
    pub fn validate_alliance(&mut self, alliance_id: AllianceId) {
        let reached = self.reachable_from_fortresses(alliance_id);

        let Some(alliance) = self.alliances.get(&alliance_id) else {
            return;
        };
        let members: Vec<FlagId> = alliance.flags.iter().copied().collect();

        let mut invalid = 0;
        for id in members {
            if let Some(flag) = self.flag_mut(id) {
                flag.is_valid = reached.contains(&id);
                if !flag.is_valid {
                    invalid += 1;
                }
            }
        }

        if invalid > 0 {
            log::debug!(
                "alliance {}: {} flags cut off from every fortress",
                alliance_id,
                invalid
            );
        }
    }

    pub fn reachable_from_fortresses(&self, alliance_id: AllianceId) -> HashSet<FlagId> {
        let mut visited = HashSet::new();
        let Some(alliance) = self.alliance(alliance_id) else {
            return visited;
        };

        let mut queue: VecDeque<FlagId> = alliance.fortresses.iter().copied().collect();
        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            let Some(flag) = self.flag(id) else {
                continue;
            };
            for neighbor in flag.neighbors() {
                if !visited.contains(neighbor) {
                    queue.push_back(*neighbor);
                }
            }
        }

        visited
    }

    pub fn are_tiles_connected(&self, from: (i32, i32), to: (i32, i32)) -> bool {
        let (Some(from), Some(to)) = (self.tile(from.0, from.1), self.tile(to.0, to.1)) else {
            return false;
        };
        let (Some(start), Some(goal)) = (from.owner(), to.owner()) else {
            return false;
        };
        if from.alliance_id() != to.alliance_id() {
            return false;
        }

        let mut visited = HashSet::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if id == goal {
                return true;
            }
            if !visited.insert(id) {
                continue;
            }
            if let Some(flag) = self.flag(id) {
                stack.extend(flag.neighbors().iter().copied());
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use crate::map::Map;
    use chrono::{Duration, Utc};

    #[test]
    fn chain_from_fortress_is_valid() {
        let mut map = Map::new();
        let now = Utc::now();
        let mut ids = vec![map.add_flag(0, 0, 1, true, now).unwrap()];
        for i in 1..5 {
            ids.push(
                map.add_flag(i * 15, 0, 1, false, now + Duration::seconds(i as i64))
                    .unwrap(),
            );
        }

        for id in &ids {
            assert!(map.flag(*id).unwrap().is_valid);
        }
        assert_eq!(map.reachable_from_fortresses(1).len(), 5);
        assert!(map.are_tiles_connected((0, 0), (60, 0)));
    }

    #[test]
    fn removing_the_middle_cuts_the_tail() {
        let mut map = Map::new();
        let now = Utc::now();
        let a = map.add_flag(0, 0, 1, true, now).unwrap();
        let b = map.add_flag(15, 0, 1, false, now + Duration::seconds(1)).unwrap();
        let c = map.add_flag(30, 0, 1, false, now + Duration::seconds(2)).unwrap();
        let d = map.add_flag(45, 0, 1, false, now + Duration::seconds(3)).unwrap();

        map.remove_flag(b);

        assert!(map.flag(a).unwrap().is_valid);
        assert!(!map.flag(c).unwrap().is_valid);
        assert!(!map.flag(d).unwrap().is_valid);
        assert!(map.tile(0, 0).unwrap().is_valid());
        assert!(!map.tile(30, 0).unwrap().is_valid());
        assert!(!map.are_tiles_connected((0, 0), (30, 0)));
        assert!(map.are_tiles_connected((30, 0), (45, 0)));
    }

    #[test]
    fn second_fortress_keeps_its_side_valid() {
        let mut map = Map::new();
        let now = Utc::now();
        map.add_flag(0, 0, 1, true, now).unwrap();
        let b = map.add_flag(15, 0, 1, false, now + Duration::seconds(1)).unwrap();
        let c = map.add_flag(30, 0, 1, true, now + Duration::seconds(2)).unwrap();
        let d = map.add_flag(45, 0, 1, false, now + Duration::seconds(3)).unwrap();

        map.remove_flag(b);

        assert!(map.flag(c).unwrap().is_valid);
        assert!(map.flag(d).unwrap().is_valid);
    }
}
