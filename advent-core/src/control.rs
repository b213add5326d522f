//! Parser for the monster refresh control file (`REFRSH.CTL`).
//!
//! Only spawn lines are read:
//!
//! ```text
//! ; room chance name atk def hp dmg special xp
//! M,84,50,pig,3,2,10,2,,5
//! ```
//!
//! Every other line is ignored. A malformed spawn line is dropped on its own;
//! the rest of the file still loads.

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::constants::MONSTER_SLOTS;
use crate::monster::MonsterRecord;
use crate::text::split_lines;

const SPAWN_PREFIX: &str = "M,";
const COMMENT_PREFIX: char = ';';
const SPAWN_FIELDS: usize = 10;

/// One spawn line, before it is reduced to a binary record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterSpawn {
    pub room: u16,
    /// Percent chance the engine rolls when refreshing the room.
    pub chance: u16,
    pub name: String,
    pub record: MonsterRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ControlIssue {
    #[error("line {line}: expected {} fields, found {found}", SPAWN_FIELDS)]
    FieldCount { line: usize, found: usize },
    #[error("line {line}: field `{field}` is not a number: `{value}`")]
    NotNumeric {
        line: usize,
        field: &'static str,
        value: String,
    },
    #[error("line {line}: room {room} is beyond the {} monster slots", MONSTER_SLOTS)]
    RoomOutOfRange { line: usize, room: u16 },
    #[error("line {line}: spawn for room {room} replaces an earlier one")]
    Overwritten { line: usize, room: u16 },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlParse {
    pub spawns: BTreeMap<u16, MonsterSpawn>,
    pub issues: Vec<ControlIssue>,
}

impl ControlParse {
    /// The binary records keyed by room, ready for the monster file.
    #[must_use]
    pub fn records(&self) -> BTreeMap<u16, MonsterRecord> {
        self.spawns
            .iter()
            .map(|(&room, spawn)| (room, spawn.record.clone()))
            .collect()
    }
}

fn number<T: std::str::FromStr>(
    line: usize,
    field: &'static str,
    value: &str,
) -> Result<T, ControlIssue> {
    value.trim().parse().map_err(|_| ControlIssue::NotNumeric {
        line,
        field,
        value: value.to_string(),
    })
}

/// Parse one `M,` line.
///
/// # Errors
///
/// Returns the reason the line cannot be used.
pub fn parse_spawn_line(line_no: usize, line: &str) -> Result<MonsterSpawn, ControlIssue> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != SPAWN_FIELDS {
        return Err(ControlIssue::FieldCount {
            line: line_no,
            found: fields.len(),
        });
    }
    let room: u16 = number(line_no, "room", fields[1])?;
    if room >= MONSTER_SLOTS {
        return Err(ControlIssue::RoomOutOfRange {
            line: line_no,
            room,
        });
    }
    Ok(MonsterSpawn {
        room,
        chance: number(line_no, "chance", fields[2])?,
        name: fields[3].trim().to_string(),
        record: MonsterRecord {
            attack: number(line_no, "attack", fields[4])?,
            defense: number(line_no, "defense", fields[5])?,
            hp: number(line_no, "hp", fields[6])?,
            damage: number(line_no, "damage", fields[7])?,
            special: fields[8].trim().to_string(),
            xp: number(line_no, "xp", fields[9])?,
            flags: 0,
            reserved: 0,
        },
    })
}

/// Parse the whole control file. The last spawn for a room wins.
#[must_use]
pub fn parse_monster_table(text: &str) -> ControlParse {
    let mut parse = ControlParse::default();
    for (index, raw) in split_lines(text).into_iter().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.starts_with(COMMENT_PREFIX) || !line.starts_with(SPAWN_PREFIX) {
            continue;
        }
        match parse_spawn_line(line_no, line) {
            Ok(spawn) => {
                let room = spawn.room;
                if parse.spawns.insert(room, spawn).is_some() {
                    warn!("line {line_no}: room {room} already had a spawn; keeping this one");
                    parse.issues.push(ControlIssue::Overwritten {
                        line: line_no,
                        room,
                    });
                }
            }
            Err(issue) => {
                warn!("{issue}");
                parse.issues.push(issue);
            }
        }
    }
    parse
}
