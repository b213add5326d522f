//! Directed adjacency view over the valid rooms of a room file.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::exits::{Direction, Exit, Exits};
use crate::room::RoomRecord;

/// A directed exit `from --direction--> to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Link {
    pub from: u16,
    pub direction: Direction,
    pub to: u16,
}

/// A valid room plus the exits it had before any repair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DungeonRoom {
    pub record: RoomRecord,
    original: Exits,
}

impl DungeonRoom {
    fn new(record: RoomRecord) -> Self {
        let original = record.exits.as_original();
        Self { record, original }
    }

    #[must_use]
    pub const fn number(&self) -> u16 {
        self.record.number
    }

    #[must_use]
    pub const fn exits(&self) -> &Exits {
        &self.record.exits
    }

    /// Exits as loaded, including any later overwritten by the repairer.
    #[must_use]
    pub const fn original_exits(&self) -> &Exits {
        &self.original
    }

    pub fn reconstructed_exits(&self) -> impl Iterator<Item = (Direction, Exit)> + '_ {
        self.record.exits.iter().filter(|(_, exit)| exit.synthesized)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DungeonGraph {
    rooms: BTreeMap<u16, DungeonRoom>,
}

impl DungeonGraph {
    /// Build a graph from decoded records; invalid records are left out.
    #[must_use]
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = RoomRecord>,
    {
        let mut skipped = 0usize;
        let mut rooms = BTreeMap::new();
        for record in records {
            if record.valid && record.number > 0 {
                rooms.insert(record.number, DungeonRoom::new(record));
            } else {
                skipped += 1;
            }
        }
        debug!("graph built from {} valid rooms, {skipped} skipped", rooms.len());
        Self { rooms }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    #[must_use]
    pub fn contains(&self, room: u16) -> bool {
        self.rooms.contains_key(&room)
    }

    #[must_use]
    pub fn room(&self, room: u16) -> Option<&DungeonRoom> {
        self.rooms.get(&room)
    }

    pub fn rooms(&self) -> impl Iterator<Item = &DungeonRoom> + '_ {
        self.rooms.values()
    }

    pub fn room_numbers(&self) -> impl Iterator<Item = u16> + '_ {
        self.rooms.keys().copied()
    }

    /// Every exit with a non-zero destination, valid or not, in room then
    /// slot order.
    #[must_use]
    pub fn links(&self) -> Vec<Link> {
        self.rooms
            .values()
            .flat_map(|room| {
                room.exits()
                    .iter()
                    .filter(|(_, exit)| !exit.is_terminal())
                    .map(move |(direction, exit)| Link {
                        from: room.number(),
                        direction,
                        to: exit.destination,
                    })
            })
            .collect()
    }

    /// Exits of `room` that lead to another valid room.
    pub fn useful_exits(&self, room: u16) -> impl Iterator<Item = (Direction, u16)> + '_ {
        self.rooms
            .get(&room)
            .into_iter()
            .flat_map(|r| r.exits().iter())
            .filter(|(_, exit)| !exit.is_terminal() && self.contains(exit.destination))
            .map(|(direction, exit)| (direction, exit.destination))
    }

    /// Breadth-first search from `start`. Empty when `start` is not a room.
    #[must_use]
    pub fn reachable_from(&self, start: u16) -> BTreeSet<u16> {
        let mut reachable = BTreeSet::new();
        self.extend_reachable(&mut reachable, start);
        reachable
    }

    /// Grow `reachable` with everything reachable from `start`, returning the
    /// rooms that were added in visit order.
    pub fn extend_reachable(&self, reachable: &mut BTreeSet<u16>, start: u16) -> Vec<u16> {
        let mut added = Vec::new();
        if !self.contains(start) || !reachable.insert(start) {
            return added;
        }
        added.push(start);
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for (_, next) in self.useful_exits(current) {
                if reachable.insert(next) {
                    added.push(next);
                    queue.push_back(next);
                }
            }
        }
        added
    }

    /// Weakly connected components, each sorted, ordered by lowest room.
    #[must_use]
    pub fn clusters(&self) -> Vec<Vec<u16>> {
        let mut neighbours: BTreeMap<u16, Vec<u16>> = BTreeMap::new();
        for room in self.room_numbers() {
            for (_, next) in self.useful_exits(room) {
                neighbours.entry(room).or_default().push(next);
                neighbours.entry(next).or_default().push(room);
            }
        }

        let mut seen = BTreeSet::new();
        let mut clusters = Vec::new();
        for room in self.room_numbers() {
            if !seen.insert(room) {
                continue;
            }
            let mut cluster = vec![room];
            let mut queue = VecDeque::from([room]);
            while let Some(current) = queue.pop_front() {
                for &next in neighbours.get(&current).into_iter().flatten() {
                    if seen.insert(next) {
                        cluster.push(next);
                        queue.push_back(next);
                    }
                }
            }
            cluster.sort_unstable();
            clusters.push(cluster);
        }
        clusters
    }

    /// Write a synthesized exit. Returns false when `room` is not in the graph.
    ///
    /// No occupancy check is made here; the repairer decides which slots may
    /// be written.
    pub fn add_exit(&mut self, room: u16, direction: Direction, destination: u16) -> bool {
        let Some(entry) = self.rooms.get_mut(&room) else {
            return false;
        };
        entry
            .record
            .exits
            .set(direction, Exit::synthesized(destination));
        true
    }
}
