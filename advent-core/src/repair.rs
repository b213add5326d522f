//! Three-phase connectivity repair.
//!
//! 1. Bidirectional completion gives every one-way link a return exit where
//!    the destination room has room for it.
//! 2. Frontier expansion attaches each unreachable room to the reachable
//!    region, pass after pass, until nothing changes.
//! 3. Verification recomputes reachability and reports what is left over.
//!
//! Repair only ever writes into empty slots or slots holding an original
//! terminal exit, so existing links are never removed and reachability from
//! the start room can only grow.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::constants::REPAIR_PASS_SLACK;
use crate::exits::Direction;
use crate::graph::DungeonGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairKind {
    Bidirectional,
    ChainConnection,
}

/// One synthesized exit: `room.direction -> destination`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairAction {
    #[serde(rename = "type")]
    pub kind: RepairKind,
    pub room: u16,
    pub direction: Direction,
    pub destination: u16,
    pub reason: String,
}

/// Output of a single phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseOutcome {
    pub actions: Vec<RepairAction>,
    pub conflicts: usize,
    pub passes: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairReport {
    pub start_room: u16,
    pub actions: Vec<RepairAction>,
    pub reachable_before: usize,
    pub reachable_after: usize,
    /// Return exits that could not be written because the slot was taken.
    pub conflicts: usize,
    pub passes: usize,
    pub still_unreachable: Vec<u16>,
}

impl RepairReport {
    #[must_use]
    pub fn count(&self, kind: RepairKind) -> usize {
        self.actions.iter().filter(|action| action.kind == kind).count()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.still_unreachable.is_empty()
    }
}

/// A slot the repairer may write: empty, or an original terminal exit.
fn is_free(graph: &DungeonGraph, room: u16, direction: Direction) -> bool {
    graph.room(room).is_some_and(|r| match r.exits().get(direction) {
        None => true,
        Some(exit) => exit.is_terminal() && !exit.synthesized,
    })
}

fn free_slots(graph: &DungeonGraph, room: u16) -> Vec<Direction> {
    Direction::ALL
        .into_iter()
        .filter(|&direction| is_free(graph, room, direction))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityRepairer {
    start: u16,
}

impl ConnectivityRepairer {
    #[must_use]
    pub const fn new(start: u16) -> Self {
        Self { start }
    }

    #[must_use]
    pub const fn start(&self) -> u16 {
        self.start
    }

    /// Run all three phases.
    pub fn repair(&self, graph: &mut DungeonGraph) -> RepairReport {
        let reachable_before = graph.reachable_from(self.start).len();
        info!(
            "repairing {} rooms from start room {} ({reachable_before} reachable)",
            graph.len(),
            self.start
        );

        let completion = self.complete_bidirectional(graph);
        let closure = self.connect_unreachable(graph);
        let still_unreachable = self.verify(graph);

        let mut actions = completion.actions;
        actions.extend(closure.actions);
        RepairReport {
            start_room: self.start,
            reachable_after: graph.len() - still_unreachable.len(),
            reachable_before,
            actions,
            conflicts: completion.conflicts,
            passes: closure.passes,
            still_unreachable,
        }
    }

    /// Phase 1: add the missing return exit of every one-way link.
    ///
    /// Links are taken from a snapshot at phase start, in room then slot
    /// order. An occupied return slot is counted as a conflict and left alone.
    pub fn complete_bidirectional(&self, graph: &mut DungeonGraph) -> PhaseOutcome {
        let mut outcome = PhaseOutcome::default();
        for link in graph.links() {
            let back = link.direction.opposite();
            let Some(target) = graph.room(link.to) else {
                continue;
            };
            if target.exits().destination(back) == Some(link.from) {
                continue;
            }
            if !is_free(graph, link.to, back) {
                debug!(
                    "room {}: {back} slot taken, no return exit to {}",
                    link.to, link.from
                );
                outcome.conflicts += 1;
                continue;
            }
            graph.add_exit(link.to, back, link.from);
            debug!("room {}: added {back} -> {}", link.to, link.from);
            outcome.actions.push(RepairAction {
                kind: RepairKind::Bidirectional,
                room: link.to,
                direction: back,
                destination: link.from,
                reason: format!(
                    "return path for room {} exit {} -> {}",
                    link.from, link.direction, link.to
                ),
            });
        }
        info!(
            "bidirectional completion: {} exits added, {} conflicts",
            outcome.actions.len(),
            outcome.conflicts
        );
        outcome
    }

    /// Phase 2: grow the reachable region until no unreachable room can be
    /// attached.
    pub fn connect_unreachable(&self, graph: &mut DungeonGraph) -> PhaseOutcome {
        let mut outcome = PhaseOutcome::default();
        if !graph.contains(self.start) {
            warn!("start room {} is not a valid room; nothing to expand from", self.start);
            return outcome;
        }

        let mut reachable = graph.reachable_from(self.start);
        let mut frontier: Vec<u16> = reachable.iter().copied().collect();
        let max_passes = graph.len() + REPAIR_PASS_SLACK;

        while outcome.passes < max_passes {
            let pending: Vec<u16> = graph
                .room_numbers()
                .filter(|room| !reachable.contains(room))
                .collect();
            if pending.is_empty() {
                break;
            }
            outcome.passes += 1;

            let mut progressed = false;
            for target in pending {
                if reachable.contains(&target) {
                    continue;
                }
                let Some(actions) = attach(graph, &frontier, target) else {
                    continue;
                };
                outcome.actions.extend(actions);
                frontier.extend(graph.extend_reachable(&mut reachable, target));
                progressed = true;
            }
            if !progressed {
                break;
            }
        }

        info!(
            "frontier expansion: {} exits added over {} passes",
            outcome.actions.len(),
            outcome.passes
        );
        outcome
    }

    /// Phase 3: rooms still unreachable from the start room, ascending.
    #[must_use]
    pub fn verify(&self, graph: &DungeonGraph) -> Vec<u16> {
        let reachable = graph.reachable_from(self.start);
        let missing: Vec<u16> = graph
            .room_numbers()
            .filter(|room| !reachable.contains(room))
            .collect();
        if missing.is_empty() {
            info!("all {} rooms reachable from room {}", graph.len(), self.start);
        } else {
            warn!(
                "{} rooms still unreachable from room {}: {:?}",
                missing.len(),
                self.start,
                missing
            );
        }
        missing
    }
}

/// Connect `target` to the first frontier room with a usable slot pair.
///
/// A target without any free slot gets a one-way entrance instead.
fn attach(graph: &mut DungeonGraph, frontier: &[u16], target: u16) -> Option<Vec<RepairAction>> {
    let target_free = free_slots(graph, target);

    if target_free.is_empty() {
        let (source, direction) = frontier
            .iter()
            .find_map(|&source| free_slots(graph, source).first().map(|&d| (source, d)))?;
        graph.add_exit(source, direction, target);
        debug!("room {source}: added one-way {direction} -> {target}");
        return Some(vec![RepairAction {
            kind: RepairKind::ChainConnection,
            room: source,
            direction,
            destination: target,
            reason: format!("one-way entrance to room {target}, which has no free exit slot"),
        }]);
    }

    let (source, direction) = frontier.iter().find_map(|&source| {
        Direction::ALL
            .into_iter()
            .find(|&d| target_free.contains(&d.opposite()) && is_free(graph, source, d))
            .map(|d| (source, d))
    })?;
    let back = direction.opposite();
    graph.add_exit(source, direction, target);
    graph.add_exit(target, back, source);
    debug!("rooms {source} <-> {target}: added {direction}/{back}");
    Some(vec![
        RepairAction {
            kind: RepairKind::ChainConnection,
            room: source,
            direction,
            destination: target,
            reason: format!("connect unreachable room {target} to reachable room {source}"),
        },
        RepairAction {
            kind: RepairKind::ChainConnection,
            room: target,
            direction: back,
            destination: source,
            reason: format!("return path from room {target} to room {source}"),
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exits::{Exit, Exits};
    use crate::room::RoomRecord;
    use Direction::{East, North, South, West};

    fn room(number: u16, exits: &[(Direction, u16)]) -> RoomRecord {
        RoomRecord::new(number).with_exits(Exits::from_pairs(exits.iter().copied()))
    }

    #[test]
    fn one_way_link_gets_return_exit() {
        let mut graph = DungeonGraph::from_records([room(1, &[]), room(2, &[(West, 1)])]);
        let outcome = ConnectivityRepairer::new(2).complete_bidirectional(&mut graph);
        assert_eq!(
            outcome.actions,
            vec![RepairAction {
                kind: RepairKind::Bidirectional,
                room: 1,
                direction: East,
                destination: 2,
                reason: "return path for room 2 exit W -> 1".to_string(),
            }]
        );
        assert_eq!(
            graph.room(1).and_then(|r| r.exits().get(East)),
            Some(Exit::synthesized(2))
        );
    }

    #[test]
    fn completion_is_idempotent() {
        let mut graph = DungeonGraph::from_records([
            room(1, &[(North, 2), (East, 3)]),
            room(2, &[]),
            room(3, &[(West, 4)]),
            room(4, &[]),
        ]);
        let repairer = ConnectivityRepairer::new(1);
        let first = repairer.complete_bidirectional(&mut graph);
        assert_eq!(first.actions.len(), 2);
        assert_eq!(first.conflicts, 1);
        let snapshot = graph.clone();
        let second = repairer.complete_bidirectional(&mut graph);
        assert!(second.actions.is_empty());
        assert_eq!(graph, snapshot);
    }

    #[test]
    fn occupied_slots_are_never_clobbered() {
        let mut graph = DungeonGraph::from_records([
            room(1, &[(North, 2)]),
            room(2, &[(South, 3)]),
            room(3, &[(North, 2)]),
        ]);
        let report = ConnectivityRepairer::new(1).repair(&mut graph);
        assert_eq!(graph.room(2).and_then(|r| r.exits().destination(South)), Some(3));
        assert!(report.conflicts >= 1);
        for original in [1, 2, 3] {
            let room = graph.room(original).unwrap();
            for (direction, exit) in room.original_exits().iter() {
                assert_eq!(room.exits().get(direction), Some(exit));
            }
        }
    }

    #[test]
    fn isolated_rooms_chain_onto_start() {
        let mut graph = DungeonGraph::from_records([
            room(2, &[]),
            room(5, &[]),
            room(9, &[]),
            room(13, &[]),
        ]);
        let report = ConnectivityRepairer::new(2).repair(&mut graph);
        assert!(report.is_complete());
        assert_eq!(report.reachable_before, 1);
        assert_eq!(report.reachable_after, 4);
        assert_eq!(report.count(RepairKind::ChainConnection), 6);
        assert_eq!(report.count(RepairKind::Bidirectional), 0);

        let start = graph.room(2).unwrap();
        assert_eq!(start.exits().destination(North), Some(5));
        assert_eq!(start.exits().destination(East), Some(9));
        assert_eq!(start.exits().destination(South), Some(13));
        assert_eq!(graph.room(13).unwrap().exits().destination(North), Some(2));
    }

    #[test]
    fn terminal_exits_count_as_free() {
        let mut graph = DungeonGraph::from_records([
            room(2, &[(North, 0), (East, 0), (South, 0), (West, 0)]),
            room(3, &[(South, 0)]),
        ]);
        let report = ConnectivityRepairer::new(2).repair(&mut graph);
        assert!(report.is_complete());
        assert_eq!(graph.room(2).unwrap().exits().destination(North), Some(3));
        assert_eq!(graph.room(3).unwrap().exits().destination(South), Some(2));
    }

    #[test]
    fn full_target_is_entered_one_way() {
        let mut graph = DungeonGraph::from_records([
            room(2, &[]),
            room(7, &[(North, 8), (East, 8), (South, 8), (West, 8)]),
            room(8, &[(North, 7), (East, 7), (South, 7), (West, 7)]),
        ]);
        let report = ConnectivityRepairer::new(2).repair(&mut graph);
        assert!(report.is_complete());
        assert_eq!(report.count(RepairKind::ChainConnection), 1);
        assert_eq!(graph.room(2).unwrap().exits().destination(North), Some(7));
    }

    #[test]
    fn saturated_frontier_leaves_rooms_unreachable() {
        let mut graph = DungeonGraph::from_records([
            room(2, &[(North, 3), (East, 3), (South, 3), (West, 3)]),
            room(3, &[(North, 2), (East, 2), (South, 2), (West, 2)]),
            room(4, &[]),
        ]);
        let report = ConnectivityRepairer::new(2).repair(&mut graph);
        assert_eq!(report.still_unreachable, vec![4]);
        assert!(report.actions.is_empty());
        assert_eq!(report.passes, 1);
    }

    #[test]
    fn missing_start_changes_nothing_in_phase_two() {
        let mut graph = DungeonGraph::from_records([room(5, &[]), room(6, &[])]);
        let report = ConnectivityRepairer::new(2).repair(&mut graph);
        assert!(report.actions.is_empty());
        assert_eq!(report.still_unreachable, vec![5, 6]);
        assert_eq!(report.reachable_after, 0);
    }

    #[test]
    fn actions_serialise_with_type_tag() {
        let action = RepairAction {
            kind: RepairKind::ChainConnection,
            room: 2,
            direction: North,
            destination: 5,
            reason: "x".to_string(),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "chain_connection");
        assert_eq!(json["direction"], "N");
    }
}
