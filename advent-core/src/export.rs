//! JSON map of a (possibly repaired) dungeon for external viewers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analysis::ConnectivityReport;
use crate::exits::{Direction, Exits};
use crate::graph::{DungeonGraph, DungeonRoom};
use crate::repair::RepairAction;
use crate::text::normalize_whitespace;

pub const GENERATOR: &str = concat!("advent ", env!("CARGO_PKG_VERSION"));

const NPC_MARKERS: [char; 2] = ['*', '#'];

pub type ExitMap = BTreeMap<Direction, u16>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapMetadata {
    pub total_rooms: usize,
    pub total_changes: usize,
    pub generated_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapRoom {
    pub number: u16,
    pub description: String,
    pub original_exits: ExitMap,
    pub reconstructed_exits: ExitMap,
    pub all_exits: ExitMap,
    pub reachable: bool,
    pub has_objects: bool,
    pub has_npcs: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapConnection {
    pub from: u16,
    pub to: u16,
    pub direction: Direction,
    pub bidirectional: bool,
    /// Either direction of the pair was added by repair.
    pub reconstructed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DungeonMap {
    pub metadata: MapMetadata,
    pub start_room: u16,
    pub rooms: BTreeMap<u16, MapRoom>,
    pub connections: Vec<MapConnection>,
    pub reconstruction_log: Vec<RepairAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues: Option<ConnectivityReport>,
}

fn exit_map(exits: &Exits) -> ExitMap {
    exits
        .iter()
        .map(|(direction, exit)| (direction, exit.destination))
        .collect()
}

fn map_room(room: &DungeonRoom, reachable: bool) -> MapRoom {
    let record = &room.record;
    MapRoom {
        number: room.number(),
        description: normalize_whitespace(&record.description),
        original_exits: exit_map(room.original_exits()),
        reconstructed_exits: room
            .reconstructed_exits()
            .map(|(direction, exit)| (direction, exit.destination))
            .collect(),
        all_exits: exit_map(room.exits()),
        reachable,
        has_objects: !record.objects.trim().is_empty(),
        has_npcs: record.monsters.trim_start().starts_with(NPC_MARKERS),
    }
}

fn connections(graph: &DungeonGraph) -> Vec<MapConnection> {
    graph
        .links()
        .into_iter()
        .filter_map(|link| {
            let back = link.direction.opposite();
            let forward = graph
                .room(link.from)
                .and_then(|room| room.exits().get(link.direction));
            let reverse = graph.room(link.to).and_then(|room| room.exits().get(back));
            let bidirectional = reverse.is_some_and(|exit| exit.destination == link.from);
            if bidirectional && link.from > link.to {
                return None;
            }
            let reconstructed = forward.is_some_and(|exit| exit.synthesized)
                || (bidirectional && reverse.is_some_and(|exit| exit.synthesized));
            Some(MapConnection {
                from: link.from,
                to: link.to,
                direction: link.direction,
                bidirectional,
                reconstructed,
            })
        })
        .collect()
}

impl DungeonMap {
    #[must_use]
    pub fn build(
        graph: &DungeonGraph,
        start: u16,
        log: &[RepairAction],
        issues: Option<ConnectivityReport>,
    ) -> Self {
        let reachable = graph.reachable_from(start);
        let rooms = graph
            .rooms()
            .map(|room| (room.number(), map_room(room, reachable.contains(&room.number()))))
            .collect();
        Self {
            metadata: MapMetadata {
                total_rooms: graph.len(),
                total_changes: log.len(),
                generated_by: GENERATOR.to_string(),
            },
            start_room: start,
            rooms,
            connections: connections(graph),
            reconstruction_log: log.to_vec(),
            issues,
        }
    }

    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::repair::ConnectivityRepairer;
    use crate::room::RoomRecord;
    use Direction::{East, North, South, West};

    fn room(number: u16, exits: &[(Direction, u16)]) -> RoomRecord {
        RoomRecord::new(number).with_exits(Exits::from_pairs(exits.iter().copied()))
    }

    #[test]
    fn bidirectional_pairs_emit_once_from_lower_room() {
        let graph = DungeonGraph::from_records([
            room(1, &[(East, 2)]),
            room(2, &[(West, 1), (North, 1)]),
        ]);
        let map = DungeonMap::build(&graph, 1, &[], None);
        assert_eq!(
            map.connections,
            vec![
                MapConnection {
                    from: 1,
                    to: 2,
                    direction: East,
                    bidirectional: true,
                    reconstructed: false,
                },
                MapConnection {
                    from: 2,
                    to: 1,
                    direction: North,
                    bidirectional: false,
                    reconstructed: false,
                },
            ]
        );
    }

    #[test]
    fn repaired_exits_are_split_out() {
        let mut graph = DungeonGraph::from_records([room(2, &[]), room(5, &[(South, 0)])]);
        let report = ConnectivityRepairer::new(2).repair(&mut graph);
        let map = DungeonMap::build(&graph, 2, &report.actions, None);

        assert_eq!(map.metadata.total_rooms, 2);
        assert_eq!(map.metadata.total_changes, 2);
        let five = &map.rooms[&5];
        assert!(five.reachable);
        assert_eq!(five.original_exits, ExitMap::from([(South, 0)]));
        assert_eq!(five.reconstructed_exits, ExitMap::from([(South, 2)]));
        assert_eq!(five.all_exits, ExitMap::from([(South, 2)]));
        assert_eq!(map.connections.len(), 1);
        assert!(map.connections[0].reconstructed);
    }

    #[test]
    fn flags_and_description_are_derived() {
        let mut record = room(3, &[]);
        record.description = "A  long\thall\u{7}.".to_string();
        record.objects = "A lamp$5".to_string();
        record.monsters = "*A troll/".to_string();
        let graph = DungeonGraph::from_records([record]);
        let map = DungeonMap::build(&graph, 2, &[], None);
        let hall = &map.rooms[&3];
        assert_eq!(hall.description, "A long hall.");
        assert!(hall.has_objects);
        assert!(hall.has_npcs);
        assert!(!hall.reachable);
    }

    #[test]
    fn json_shape() {
        let mut graph = DungeonGraph::from_records([room(2, &[]), room(4, &[])]);
        let report = ConnectivityRepairer::new(2).repair(&mut graph);
        let issues = analyze(&graph, 2);
        let map = DungeonMap::build(&graph, 2, &report.actions, Some(issues));
        let json: serde_json::Value =
            serde_json::from_str(&map.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["start_room"], 2);
        assert_eq!(json["rooms"]["4"]["all_exits"]["S"], 2);
        assert_eq!(json["reconstruction_log"][0]["type"], "chain_connection");
        assert_eq!(json["metadata"]["generated_by"], GENERATOR);
        assert!(json["issues"]["unreachable"].as_array().unwrap().is_empty());

        let bare = DungeonMap::build(&graph, 2, &[], None);
        let json = serde_json::to_value(&bare).unwrap();
        assert!(json.get("issues").is_none());
    }
}
