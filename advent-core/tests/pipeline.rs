use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use advent_core::constants::{MONSTER_FILE_SIZE, MONSTER_RECORD_SIZE, ROOM_FILE_SIZE};
use advent_core::{
    DirectoryLoader, DirectoryStorage, Direction, MigrationEngine, PipelineConfig, RepairKind,
    decode_monster_file, decode_room_file,
};
use serde_json::Value;

const ROOM_DUMP: &[u8] = b"pip roomut.fil\r\n\
2,N5\r\n\
*A sleepy guard\r\n\
A lamp$10\r\n\
You stand at the entrance of a cave.\r\n\
/T1/\r\n\
5,\r\n\
A narrow passage.\r\n\
9,e13\r\n\
A flooded chamber.\r\n\
13,\r\n\
A caf\xe9 carved into the rock.\r\n";

const CONTROL: &[u8] = b"; refresh table\r\n\
M,5,50,bat,1,1,3,1,,2\r\n\
M,9,25,eel,2,1,6,2,SHOCK,4\r\n\
M,9,bad,eel,2,1,6,2,,4\r\n";

fn temp_path(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("advent-pipeline-{label}-{nanos}"))
}

struct Workspace {
    salvage: PathBuf,
    output: PathBuf,
}

impl Workspace {
    fn new(label: &str) -> Self {
        let root = temp_path(label);
        let salvage = root.join("salvage");
        let output = root.join("data");
        fs::create_dir_all(&salvage).unwrap();
        fs::write(salvage.join("roomfil.fil"), ROOM_DUMP).unwrap();
        fs::write(salvage.join("REFRSH.CTL"), CONTROL).unwrap();
        Self { salvage, output }
    }

    fn engine(&self) -> MigrationEngine<DirectoryLoader, DirectoryStorage> {
        MigrationEngine::new(
            DirectoryLoader::new(&self.salvage),
            DirectoryStorage::new(&self.output),
            PipelineConfig::default(),
        )
        .unwrap()
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(root) = self.salvage.parent() {
            let _ = fs::remove_dir_all(root);
        }
    }
}

#[test]
fn migration_writes_engine_files() {
    let workspace = Workspace::new("migrate");
    let summary = workspace.engine().migrate(None).unwrap();

    assert_eq!(summary.rooms_parsed, 4);
    assert_eq!(summary.monsters_placed, 2);
    assert_eq!(summary.control_issues.len(), 1);

    let rooms = fs::read(workspace.output.join("ADVENT.DTA")).unwrap();
    assert_eq!(rooms.len(), ROOM_FILE_SIZE);
    let decoded = decode_room_file(&rooms);
    let entrance = &decoded[1];
    assert!(entrance.valid);
    assert_eq!(entrance.monsters, "*A sleepy guard/");
    assert_eq!(entrance.objects, "A lamp$10");
    assert_eq!(entrance.special.as_deref(), Some("/T1/"));
    assert_eq!(decoded[12].description, "A caf? carved into the rock.");
    assert_eq!(decoded[8].exits.destination(Direction::East), Some(13));

    let monsters = fs::read(workspace.output.join("ADVENT.MON")).unwrap();
    assert_eq!(monsters.len(), MONSTER_FILE_SIZE);
    assert_eq!(monsters[9 * MONSTER_RECORD_SIZE], 2);
    let spawns = decode_monster_file(&monsters);
    assert_eq!(spawns[&9].special, "SHOCK");
    assert_eq!(spawns[&5].hp, 3);

    for name in ["ADVENT.CHR", "BOARD.NTC", "MESSAG.NPC"] {
        let data = fs::read(workspace.output.join(name)).unwrap();
        assert!(!data.is_empty());
        assert!(data.iter().all(|&b| b == 0), "{name} should be blank");
    }
}

#[test]
fn reconstruction_heals_the_dungeon() {
    let workspace = Workspace::new("reconstruct");
    let engine = workspace.engine();
    engine.migrate(None).unwrap();

    let input = Path::new("ADVENT.DTA");
    let output = Path::new("ADVENT.FIX");
    let result = engine.reconstruct(input, Some(output), 2, false).unwrap();

    assert_eq!(result.before.reachable, vec![2, 5]);
    assert_eq!(result.before.unreachable, vec![9, 13]);
    assert!(result.report.is_complete());
    assert_eq!(result.report.reachable_after, 4);
    assert!(result.report.count(RepairKind::Bidirectional) >= 2);
    assert!(result.report.count(RepairKind::ChainConnection) >= 2);

    let original = fs::read(workspace.output.join(input)).unwrap();
    let repaired = fs::read(workspace.output.join(output)).unwrap();
    assert_eq!(original.len(), repaired.len());
    assert_ne!(original, repaired);

    let analysis = engine.analyze(output, 2).unwrap();
    assert!(analysis.report.is_connected());
    assert!(analysis.report.one_way.is_empty());
}

#[test]
fn map_json_has_the_viewer_shape() {
    let workspace = Workspace::new("map");
    let engine = workspace.engine();
    engine.migrate(None).unwrap();
    let result = engine
        .reconstruct(Path::new("ADVENT.DTA"), None, 2, true)
        .unwrap();
    let json: Value = serde_json::from_str(&result.map.to_json_pretty().unwrap()).unwrap();

    assert_eq!(json["start_room"], 2);
    assert_eq!(json["metadata"]["total_rooms"], 4);
    assert_eq!(
        json["metadata"]["total_changes"].as_u64().unwrap() as usize,
        result.report.actions.len()
    );
    let entrance = &json["rooms"]["2"];
    assert_eq!(entrance["original_exits"]["N"], 5);
    assert_eq!(entrance["has_npcs"], true);
    assert_eq!(entrance["has_objects"], true);
    assert_eq!(json["rooms"]["13"]["reachable"], true);

    let log = json["reconstruction_log"].as_array().unwrap();
    assert!(log.iter().all(|entry| {
        matches!(entry["type"].as_str(), Some("bidirectional" | "chain_connection"))
    }));
    for connection in json["connections"].as_array().unwrap() {
        if connection["bidirectional"] == true {
            assert!(connection["from"].as_u64() < connection["to"].as_u64());
        }
    }
    assert!(json.get("issues").is_none());
}

#[test]
fn missing_room_file_is_an_error() {
    let workspace = Workspace::new("missing");
    let err = workspace
        .engine()
        .analyze(Path::new("ADVENT.DTA"), 2)
        .unwrap_err();
    assert!(err.to_string().contains("data files"));
}
