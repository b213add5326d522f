//! Parser for the salvaged room dump (`roomfil.fil`).
//!
//! The dump is a sequence of blocks:
//!
//! ```text
//! 21,W20E601
//! *A cave lizard/!corpse
//! A chest~50/A dagger$5
//! You are in a damp cave. Water drips
//! from the ceiling.
//! /T3/
//! ```
//!
//! A header line `<room>,<exits>` opens each block. Parsing never fails; units
//! that cannot be understood are skipped and reported as [`SalvageIssue`]s.

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::constants::ROOM_COUNT;
use crate::exits::{Direction, Exit, Exits};
use crate::room::RoomRecord;
use crate::text::split_lines;

static HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+),(.*)$").expect("valid pattern"));
static EXIT_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([NESW])(\d+)").expect("valid pattern"));

const MONSTER_PREFIXES: [char; 3] = ['!', '*', '#'];
const PRICE_MARKERS: [char; 2] = ['$', '~'];

/// A room as recovered from the salvage text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoomDescriptor {
    pub number: u16,
    pub exits: Exits,
    pub monsters: String,
    pub objects: String,
    pub description: String,
    pub special: Option<String>,
}

impl RoomDescriptor {
    #[must_use]
    pub fn into_record(self) -> RoomRecord {
        RoomRecord {
            number: self.number,
            valid: true,
            exits: self.exits,
            monsters: self.monsters,
            objects: self.objects,
            description: self.description,
            special: self.special,
        }
    }
}

/// A unit of the dump that was skipped or overridden.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum SalvageIssue {
    #[error("line {line}: room number `{text}` does not fit a room id; block skipped")]
    RoomNumberOverflow { line: usize, text: String },
    #[error("line {line}: room {room} is outside 1..={max}; block skipped")]
    RoomOutOfRange { line: usize, room: u16, max: u16 },
    #[error("line {line}: room {room} repeated; earlier block replaced")]
    DuplicateRoom { line: usize, room: u16 },
    #[error("line {line}: exit token `{token}` does not fit a room id; ignored")]
    ExitTokenOverflow { line: usize, token: String },
}

/// Result of parsing a dump: the rooms plus everything that was skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalvageParse {
    pub rooms: BTreeMap<u16, RoomDescriptor>,
    pub issues: Vec<SalvageIssue>,
}

/// Parse an exit spec such as `N740W700`.
///
/// Returns the exits and the tokens whose number overflowed. Characters that
/// do not form a token are ignored.
#[must_use]
pub fn parse_exit_spec(spec: &str) -> (Exits, Vec<String>) {
    let mut exits = Exits::new();
    let mut rejected = Vec::new();
    for caps in EXIT_TOKEN.captures_iter(spec) {
        let letter = caps[1].as_bytes()[0];
        let Some(direction) = Direction::from_letter(letter) else {
            continue;
        };
        match caps[2].parse::<u16>() {
            Ok(destination) => exits.set(direction, Exit::original(destination)),
            Err(_) => rejected.push(caps[0].to_string()),
        }
    }
    (exits, rejected)
}

fn parse_header(line: &str) -> Option<(&str, &str)> {
    let caps = HEADER.captures(line)?;
    let number = caps.get(1)?.as_str();
    let exits = caps.get(2)?.as_str();
    Some((number, exits))
}

#[derive(Default)]
struct BlockBuilder {
    line: usize,
    room: RoomDescriptor,
    description: Vec<String>,
    special: Vec<String>,
}

impl BlockBuilder {
    fn push_line(&mut self, line: &str) {
        if !self.special.is_empty() || line.starts_with('/') {
            self.special.push(line.to_string());
            return;
        }
        if line.starts_with("./") || line.trim().is_empty() {
            return;
        }
        if self.description.is_empty() && line.starts_with(MONSTER_PREFIXES) {
            if !self.room.monsters.is_empty() {
                self.room.monsters.push(' ');
            }
            self.room.monsters.push_str(line.trim_end());
            return;
        }
        if self.description.is_empty()
            && self.room.objects.is_empty()
            && line.contains(PRICE_MARKERS)
        {
            self.room.objects = line.trim().to_string();
            return;
        }
        self.description.push(line.trim().to_string());
    }

    fn finish(mut self) -> (usize, RoomDescriptor) {
        self.room.description = self.description.join(" ");
        self.room.special = (!self.special.is_empty()).then(|| self.special.join("\n"));
        (self.line, self.room)
    }
}

/// Parse the whole dump. Lines before the first header are ignored.
#[must_use]
pub fn parse_room_dump(text: &str) -> SalvageParse {
    let mut parse = SalvageParse::default();
    let mut current: Option<BlockBuilder> = None;
    let mut skipping = false;

    for (index, line) in split_lines(text).into_iter().enumerate() {
        let line_no = index + 1;
        let Some((number_text, exit_text)) = parse_header(line) else {
            if let Some(block) = current.as_mut() {
                block.push_line(line);
            } else if skipping {
                debug!("line {line_no}: skipped inside rejected block");
            }
            continue;
        };

        if let Some(block) = current.take() {
            commit(&mut parse, block.finish());
        }

        let Ok(number) = number_text.parse::<u16>() else {
            warn!("line {line_no}: room number {number_text} out of range");
            parse.issues.push(SalvageIssue::RoomNumberOverflow {
                line: line_no,
                text: number_text.to_string(),
            });
            skipping = true;
            continue;
        };
        if !(1..=ROOM_COUNT).contains(&number) {
            warn!("line {line_no}: room {number} is outside the room file");
            parse.issues.push(SalvageIssue::RoomOutOfRange {
                line: line_no,
                room: number,
                max: ROOM_COUNT,
            });
            skipping = true;
            continue;
        }
        skipping = false;

        let (exits, rejected) = parse_exit_spec(exit_text.trim());
        for token in rejected {
            warn!("line {line_no}: exit token {token} out of range");
            parse.issues.push(SalvageIssue::ExitTokenOverflow {
                line: line_no,
                token,
            });
        }
        let mut block = BlockBuilder {
            line: line_no,
            ..BlockBuilder::default()
        };
        block.room.number = number;
        block.room.exits = exits;
        current = Some(block);
    }

    if let Some(block) = current.take() {
        commit(&mut parse, block.finish());
    }
    parse
}

fn commit(parse: &mut SalvageParse, (line, room): (usize, RoomDescriptor)) {
    if parse.rooms.contains_key(&room.number) {
        warn!("room {} appears more than once; keeping the later block", room.number);
        parse.issues.push(SalvageIssue::DuplicateRoom {
            line,
            room: room.number,
        });
    }
    parse.rooms.insert(room.number, room);
}
