//! Salvage text to the five binary files the engine opens at start-up.

use log::{info, warn};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::PipelineConfig;
use crate::constants::{
    BOARD_RECORD_SIZE, CHARACTER_RECORD_SIZE, MESSAGE_RECORD_SIZE, ROOM_COUNT,
};
use crate::control::{ControlIssue, parse_monster_table};
use crate::monster::encode_monster_file;
use crate::room::{RoomRecord, encode_room_file};
use crate::salvage::{SalvageIssue, parse_room_dump};

/// Decoded salvage inputs. Only the room dump is required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalvageInput {
    pub room_dump: String,
    pub monster_table: Option<String>,
    /// A surviving notice board, copied byte for byte.
    pub board: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub name: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationSummary {
    pub rooms_parsed: usize,
    pub rooms_written: usize,
    pub monsters_placed: usize,
    pub board_copied: bool,
    pub salvage_issues: Vec<SalvageIssue>,
    pub control_issues: Vec<ControlIssue>,
    /// `(file name, byte length)` in write order.
    pub files: Vec<(String, usize)>,
}

impl MigrationSummary {
    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.salvage_issues.len() + self.control_issues.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub files: Vec<OutputFile>,
    pub summary: MigrationSummary,
}

/// The engine only lists monster entries that end in `/`.
#[must_use]
pub fn engine_monsters(monsters: &str) -> String {
    let trimmed = monsters.trim();
    if trimmed.is_empty() || trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    }
}

fn zeroed(name: &str, records: usize, width: usize) -> OutputFile {
    OutputFile {
        name: name.to_string(),
        data: vec![0u8; records * width],
    }
}

/// Build every output file in memory.
#[must_use]
pub fn migrate(input: &SalvageInput, config: &PipelineConfig) -> Migration {
    let salvage = parse_room_dump(&input.room_dump);
    let rooms_parsed = salvage.rooms.len();
    let records: BTreeMap<u16, RoomRecord> = salvage
        .rooms
        .into_values()
        .map(|descriptor| {
            let mut record = descriptor.into_record();
            record.monsters = engine_monsters(&record.monsters);
            (record.number, record)
        })
        .collect();
    let rooms_written = records.range(1..=ROOM_COUNT).count();
    info!("parsed {rooms_parsed} rooms, {rooms_written} within the room file");

    let control = input
        .monster_table
        .as_deref()
        .map(parse_monster_table)
        .unwrap_or_default();
    if input.monster_table.is_none() {
        warn!("no monster table supplied; the monster file will be empty");
    }
    let monsters = control.records();
    info!("placed {} monster spawns", monsters.len());

    let board = match &input.board {
        Some(bytes) => {
            let expected = config.board_records * BOARD_RECORD_SIZE;
            if bytes.len() != expected {
                warn!(
                    "notice board is {} bytes, expected {expected}; copying as is",
                    bytes.len()
                );
            }
            OutputFile {
                name: config.board_file.clone(),
                data: bytes.clone(),
            }
        }
        None => zeroed(&config.board_file, config.board_records, BOARD_RECORD_SIZE),
    };

    let files = vec![
        OutputFile {
            name: config.room_file.clone(),
            data: encode_room_file(&records),
        },
        OutputFile {
            name: config.monster_file.clone(),
            data: encode_monster_file(&monsters),
        },
        zeroed(
            &config.character_file,
            config.character_records,
            CHARACTER_RECORD_SIZE,
        ),
        board,
        zeroed(
            &config.message_file,
            config.message_records,
            MESSAGE_RECORD_SIZE,
        ),
    ];

    let summary = MigrationSummary {
        rooms_parsed,
        rooms_written,
        monsters_placed: monsters.len(),
        board_copied: input.board.is_some(),
        salvage_issues: salvage.issues,
        control_issues: control.issues,
        files: files
            .iter()
            .map(|file| (file.name.clone(), file.data.len()))
            .collect(),
    };
    Migration { files, summary }
}
