//! Read-only connectivity diagnostics.

use serde::{Deserialize, Serialize};

use crate::graph::{DungeonGraph, Link};

/// Answers structural questions about a graph without mutating it.
#[derive(Debug, Clone, Copy)]
pub struct ConnectivityAnalyzer<'a> {
    graph: &'a DungeonGraph,
}

impl<'a> ConnectivityAnalyzer<'a> {
    #[must_use]
    pub const fn new(graph: &'a DungeonGraph) -> Self {
        Self { graph }
    }

    fn rooms_with_useful_exits(&self, count: usize) -> Vec<u16> {
        self.graph
            .room_numbers()
            .filter(|&room| self.graph.useful_exits(room).count() == count)
            .collect()
    }

    /// Rooms with exactly one exit to another valid room.
    #[must_use]
    pub fn dead_ends(&self) -> Vec<u16> {
        self.rooms_with_useful_exits(1)
    }

    /// Rooms with no exit to a valid room.
    #[must_use]
    pub fn no_exits(&self) -> Vec<u16> {
        self.rooms_with_useful_exits(0)
    }

    /// Links to a valid room that has no exit back the opposite way.
    #[must_use]
    pub fn one_way_links(&self) -> Vec<Link> {
        self.graph
            .links()
            .into_iter()
            .filter(|link| {
                self.graph.room(link.to).is_some_and(|target| {
                    target.exits().destination(link.direction.opposite()) != Some(link.from)
                })
            })
            .collect()
    }

    /// Links whose destination is not a valid room.
    #[must_use]
    pub fn broken_exits(&self) -> Vec<Link> {
        self.graph
            .links()
            .into_iter()
            .filter(|link| !self.graph.contains(link.to))
            .collect()
    }

    #[must_use]
    pub fn report(&self, start: u16) -> ConnectivityReport {
        let reachable: Vec<u16> = self.graph.reachable_from(start).into_iter().collect();
        let unreachable = self
            .graph
            .room_numbers()
            .filter(|room| reachable.binary_search(room).is_err())
            .collect();
        ConnectivityReport {
            start_room: start,
            start_exists: self.graph.contains(start),
            total_rooms: self.graph.len(),
            reachable,
            unreachable,
            dead_ends: self.dead_ends(),
            no_exits: self.no_exits(),
            one_way: self.one_way_links(),
            broken: self.broken_exits(),
            clusters: self.graph.clusters().len(),
        }
    }
}

/// Snapshot of a graph's connectivity from one start room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityReport {
    pub start_room: u16,
    pub start_exists: bool,
    pub total_rooms: usize,
    pub reachable: Vec<u16>,
    pub unreachable: Vec<u16>,
    pub dead_ends: Vec<u16>,
    pub no_exits: Vec<u16>,
    pub one_way: Vec<Link>,
    pub broken: Vec<Link>,
    pub clusters: usize,
}

impl ConnectivityReport {
    /// True when every valid room is reachable from the start room.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.start_exists && self.unreachable.is_empty()
    }

    /// Rooms worth a closer look, most severe first and without repeats.
    #[must_use]
    pub fn problem_rooms(&self) -> Vec<u16> {
        let mut rooms = Vec::new();
        let sources = self
            .no_exits
            .iter()
            .copied()
            .chain(self.broken.iter().map(|link| link.from))
            .chain(self.unreachable.iter().copied())
            .chain(self.dead_ends.iter().copied());
        for room in sources {
            if !rooms.contains(&room) {
                rooms.push(room);
            }
        }
        rooms
    }
}

/// Convenience wrapper for [`ConnectivityAnalyzer::report`].
#[must_use]
pub fn analyze(graph: &DungeonGraph, start: u16) -> ConnectivityReport {
    ConnectivityAnalyzer::new(graph).report(start)
}
