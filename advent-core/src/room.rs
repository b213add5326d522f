//! Fixed 512-byte room records and the 2000-record room file.
//!
//! Layout, all offsets in bytes:
//!
//! | range      | field                                                  |
//! |------------|--------------------------------------------------------|
//! | `0`        | validation byte, `(number - 1) mod 256`                |
//! | `1..17`    | exit slots N, E, S, W: letter, dest lo, dest hi, 0     |
//! | `17..100`  | monsters, NUL padded                                   |
//! | `100..200` | objects, NUL padded                                    |
//! | `200..512` | description, `$`, special codes, NUL padded            |
//!
//! Encoding is total. Unmappable characters become `?` and over-long fields
//! are cut at their width.

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::{
    DESCRIPTION_FIELD_SIZE, DESCRIPTION_OFFSET, DESCRIPTION_SENTINEL, EMPTY_SLOT_LETTER,
    EXIT_SLOT_SIZE, EXITS_OFFSET, EXITS_SIZE, MONSTERS_FIELD_SIZE, MONSTERS_OFFSET,
    OBJECTS_FIELD_SIZE, OBJECTS_OFFSET, PLACEHOLDER, ROOM_COUNT, ROOM_FILE_SIZE, ROOM_RECORD_SIZE,
    VALIDATION_OFFSET,
};
use crate::exits::{Direction, Exit, Exits};
use crate::text::{decode_latin1, read_field, to_engine_bytes, write_field};

/// One decoded (or about-to-be-encoded) room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub number: u16,
    pub valid: bool,
    pub exits: Exits,
    pub monsters: String,
    pub objects: String,
    pub description: String,
    /// Engine special codes stored after the `$` sentinel, kept verbatim.
    pub special: Option<String>,
}

impl RoomRecord {
    /// An empty, valid room.
    #[must_use]
    pub fn new(number: u16) -> Self {
        Self {
            number,
            valid: true,
            exits: Exits::new(),
            monsters: String::new(),
            objects: String::new(),
            description: String::new(),
            special: None,
        }
    }

    #[must_use]
    pub fn with_exits(mut self, exits: Exits) -> Self {
        self.exits = exits;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Expected validation byte for a room number.
    #[must_use]
    pub const fn validation_byte(number: u16) -> u8 {
        (number.wrapping_sub(1) % 256) as u8
    }

    /// Encode into the engine's 512-byte layout. Never fails.
    #[must_use]
    pub fn encode(&self) -> [u8; ROOM_RECORD_SIZE] {
        let mut record = [0u8; ROOM_RECORD_SIZE];
        record[VALIDATION_OFFSET] = Self::validation_byte(self.number);
        encode_exits(
            &self.exits,
            &mut record[EXITS_OFFSET..EXITS_OFFSET + EXITS_SIZE],
        );
        write_field(
            &mut record[MONSTERS_OFFSET..MONSTERS_OFFSET + MONSTERS_FIELD_SIZE],
            &to_engine_bytes(&self.monsters),
        );
        write_field(
            &mut record[OBJECTS_OFFSET..OBJECTS_OFFSET + OBJECTS_FIELD_SIZE],
            &to_engine_bytes(&self.objects),
        );
        write_field(
            &mut record[DESCRIPTION_OFFSET..DESCRIPTION_OFFSET + DESCRIPTION_FIELD_SIZE],
            &self.description_bytes(),
        );
        record
    }

    fn description_bytes(&self) -> Vec<u8> {
        let mut bytes: Vec<u8> = to_engine_bytes(&self.description)
            .into_iter()
            .map(|b| if b == DESCRIPTION_SENTINEL { PLACEHOLDER } else { b })
            .collect();
        bytes.push(DESCRIPTION_SENTINEL);
        if let Some(special) = &self.special {
            bytes.extend(to_engine_bytes(special));
        }
        bytes
    }

    /// Decode a record stored at room `number`'s position.
    ///
    /// A record whose validation byte does not match, or which is entirely
    /// zero (an unallocated slot), decodes with `valid == false`. Field
    /// contents are still decoded so callers can inspect them.
    #[must_use]
    pub fn decode(number: u16, record: &[u8; ROOM_RECORD_SIZE]) -> Self {
        let allocated = record.iter().any(|&b| b != 0);
        let valid = allocated && record[VALIDATION_OFFSET] == Self::validation_byte(number);
        let (description, special) = split_description(
            &record[DESCRIPTION_OFFSET..DESCRIPTION_OFFSET + DESCRIPTION_FIELD_SIZE],
        );
        Self {
            number,
            valid,
            exits: decode_exits(&record[EXITS_OFFSET..EXITS_OFFSET + EXITS_SIZE]),
            monsters: read_field(&record[MONSTERS_OFFSET..MONSTERS_OFFSET + MONSTERS_FIELD_SIZE]),
            objects: read_field(&record[OBJECTS_OFFSET..OBJECTS_OFFSET + OBJECTS_FIELD_SIZE]),
            description,
            special,
        }
    }
}

fn encode_exits(exits: &Exits, slots: &mut [u8]) {
    for direction in Direction::ALL {
        let at = direction.index() * EXIT_SLOT_SIZE;
        let slot = &mut slots[at..at + EXIT_SLOT_SIZE];
        match exits.get(direction) {
            Some(exit) => {
                let [lo, hi] = exit.destination.to_le_bytes();
                slot.copy_from_slice(&[direction.letter(), lo, hi, 0]);
            }
            None => slot.copy_from_slice(&[EMPTY_SLOT_LETTER, 0, 0, 0]),
        }
    }
}

fn decode_exits(slots: &[u8]) -> Exits {
    let mut exits = Exits::new();
    for direction in Direction::ALL {
        let at = direction.index() * EXIT_SLOT_SIZE;
        if slots[at] == direction.letter() {
            let destination = u16::from_le_bytes([slots[at + 1], slots[at + 2]]);
            exits.set(direction, Exit::original(destination));
        }
    }
    exits
}

fn split_description(field: &[u8]) -> (String, Option<String>) {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    let content = &field[..end];
    match content.iter().position(|&b| b == DESCRIPTION_SENTINEL) {
        Some(at) => {
            let special = &content[at + 1..];
            let special = (!special.is_empty()).then(|| decode_latin1(special));
            (decode_latin1(&content[..at]), special)
        }
        None => (decode_latin1(content), None),
    }
}

/// Encode a whole room file: `ROOM_COUNT` records, room N at `(N - 1) * 512`.
///
/// Rooms outside `1..=ROOM_COUNT` are skipped; absent rooms stay zeroed.
#[must_use]
pub fn encode_room_file(rooms: &BTreeMap<u16, RoomRecord>) -> Vec<u8> {
    let mut data = vec![0u8; ROOM_FILE_SIZE];
    for (&number, room) in rooms {
        if !(1..=ROOM_COUNT).contains(&number) {
            warn!("room {number} is outside 1..={ROOM_COUNT}; not written");
            continue;
        }
        let offset = usize::from(number - 1) * ROOM_RECORD_SIZE;
        data[offset..offset + ROOM_RECORD_SIZE].copy_from_slice(&room.encode());
    }
    data
}

/// Decode every complete record in a room file, valid or not.
#[must_use]
pub fn decode_room_file(data: &[u8]) -> Vec<RoomRecord> {
    let chunks = data.chunks_exact(ROOM_RECORD_SIZE);
    if !chunks.remainder().is_empty() {
        warn!(
            "room file has {} trailing bytes after the last full record",
            chunks.remainder().len()
        );
    }
    chunks
        .zip(1..=u16::MAX)
        .filter_map(|(chunk, number)| {
            <&[u8; ROOM_RECORD_SIZE]>::try_from(chunk)
                .ok()
                .map(|record| RoomRecord::decode(number, record))
        })
        .collect()
}

/// Overwrite one exit slot of room `number` in a room file image with
/// `letter, lo, hi, 0`. Every other byte is left as it was.
///
/// Returns false when the room's record is not inside `data`.
pub fn patch_exit_slot(
    data: &mut [u8],
    number: u16,
    direction: Direction,
    destination: u16,
) -> bool {
    if number == 0 {
        return false;
    }
    let at = usize::from(number - 1) * ROOM_RECORD_SIZE
        + EXITS_OFFSET
        + direction.index() * EXIT_SLOT_SIZE;
    let Some(slot) = data.get_mut(at..at + EXIT_SLOT_SIZE) else {
        return false;
    };
    let [lo, hi] = destination.to_le_bytes();
    slot.copy_from_slice(&[direction.letter(), lo, hi, 0]);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_room() -> RoomRecord {
        RoomRecord {
            number: 21,
            valid: true,
            exits: Exits::from_pairs([(Direction::West, 20), (Direction::East, 601)]),
            monsters: "*A cave lizard/".to_string(),
            objects: "A chest~50/A dagger$5".to_string(),
            description: "You are in a damp cave.".to_string(),
            special: Some("/T3/".to_string()),
        }
    }

    #[test]
    fn layout_places_fields_at_fixed_offsets() {
        let bytes = sample_room().encode();
        assert_eq!(bytes[0], 20);
        // N empty, E -> 601, S empty, W -> 20
        assert_eq!(&bytes[1..5], &[b' ', 0, 0, 0]);
        assert_eq!(&bytes[5..9], &[b'E', 0x59, 0x02, 0]);
        assert_eq!(&bytes[9..13], &[b' ', 0, 0, 0]);
        assert_eq!(&bytes[13..17], &[b'W', 20, 0, 0]);
        assert_eq!(&bytes[17..32], b"*A cave lizard/");
        assert_eq!(bytes[32], 0);
        assert_eq!(&bytes[100..105], b"A che");
        assert_eq!(&bytes[200..224], b"You are in a damp cave.$");
        assert_eq!(&bytes[224..228], b"/T3/");
    }

    #[test]
    fn decode_inverts_encode() {
        let room = sample_room();
        assert_eq!(RoomRecord::decode(21, &room.encode()), room);
    }

    #[test]
    fn terminal_exits_keep_their_letter() {
        let room = RoomRecord::new(5).with_exits(Exits::from_pairs([(Direction::South, 0)]));
        let bytes = room.encode();
        assert_eq!(&bytes[9..13], &[b'S', 0, 0, 0]);
        let decoded = RoomRecord::decode(5, &bytes);
        assert_eq!(decoded.exits.destination(Direction::South), Some(0));
    }

    #[test]
    fn mismatched_validation_byte_is_invalid() {
        let mut bytes = RoomRecord::new(300).encode();
        assert_eq!(bytes[0], 43);
        bytes[0] = 44;
        assert!(!RoomRecord::decode(300, &bytes).valid);
    }

    #[test]
    fn zeroed_slot_is_unallocated_even_when_byte_matches() {
        let zero = [0u8; ROOM_RECORD_SIZE];
        assert_eq!(RoomRecord::validation_byte(257), 0);
        assert!(!RoomRecord::decode(257, &zero).valid);
        assert!(RoomRecord::decode(257, &RoomRecord::new(257).encode()).valid);
    }

    #[test]
    fn oversized_and_unmappable_fields_are_coerced() {
        let mut room = RoomRecord::new(9);
        room.monsters = "m".repeat(200);
        room.objects = "\u{e9}t\u{e9}".to_string();
        room.description = "costs $5".to_string();
        let decoded = RoomRecord::decode(9, &room.encode());
        assert_eq!(decoded.monsters.len(), MONSTERS_FIELD_SIZE);
        assert_eq!(decoded.objects, "?t?");
        assert_eq!(decoded.description, "costs ?5");
        assert_eq!(decoded.special, None);
    }

    #[test]
    fn description_without_sentinel_decodes_whole_field() {
        let mut room = RoomRecord::new(4);
        room.description = "x".repeat(400);
        let decoded = RoomRecord::decode(4, &room.encode());
        assert_eq!(decoded.description.len(), DESCRIPTION_FIELD_SIZE);
        assert_eq!(decoded.special, None);
    }

    #[test]
    fn room_file_places_rooms_by_number() {
        let mut rooms = BTreeMap::new();
        rooms.insert(1, RoomRecord::new(1).with_description("first"));
        rooms.insert(2000, RoomRecord::new(2000).with_description("last"));
        let data = encode_room_file(&rooms);
        assert_eq!(data.len(), ROOM_FILE_SIZE);
        assert_eq!(data[200], b'f');
        assert_eq!(data[1999 * ROOM_RECORD_SIZE], RoomRecord::validation_byte(2000));

        let decoded = decode_room_file(&data);
        assert_eq!(decoded.len(), usize::from(ROOM_COUNT));
        let valid: Vec<u16> = decoded.iter().filter(|r| r.valid).map(|r| r.number).collect();
        assert_eq!(valid, vec![1, 2000]);
    }

    #[test]
    fn exit_patch_touches_only_the_slot() {
        let mut rooms = BTreeMap::new();
        rooms.insert(3, RoomRecord::new(3).with_description("old"));
        rooms.insert(4, RoomRecord::new(4).with_description("keep"));
        let mut data = encode_room_file(&rooms);
        // engine codes after the sentinel are not ASCII
        let tail = 2 * ROOM_RECORD_SIZE + DESCRIPTION_OFFSET + 4;
        data[tail..tail + 2].copy_from_slice(&[0xC1, 0x05]);
        let before = data.clone();

        assert!(patch_exit_slot(&mut data, 3, Direction::South, 601));
        let slot = 2 * ROOM_RECORD_SIZE + 9;
        assert_eq!(&data[slot..slot + 4], &[b'S', 0x59, 0x02, 0]);
        let changed: Vec<usize> = (0..data.len()).filter(|&i| data[i] != before[i]).collect();
        assert_eq!(changed, vec![slot, slot + 1, slot + 2]);

        assert!(!patch_exit_slot(&mut data, 0, Direction::North, 1));
        assert!(!patch_exit_slot(&mut data, 2001, Direction::North, 1));
    }
}
