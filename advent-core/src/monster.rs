//! Fixed 20-byte monster spawn records and the 10000-slot monster file.
//!
//! Every integer is little-endian; the special tag is six NUL-padded bytes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::{
    MONSTER_FILE_SIZE, MONSTER_RECORD_SIZE, MONSTER_SLOTS, MONSTER_SPECIAL_SIZE,
};
use crate::text::{read_field, to_engine_bytes, write_field};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MonsterRecord {
    pub attack: i16,
    pub defense: i16,
    pub hp: i16,
    pub damage: i16,
    /// Special-ability tag, at most six ASCII bytes.
    pub special: String,
    pub xp: i16,
    pub flags: u16,
    pub reserved: u16,
}

impl MonsterRecord {
    /// Encode into the engine layout. Never fails: the tag is sanitised and cut
    /// to six bytes.
    #[must_use]
    pub fn encode(&self) -> [u8; MONSTER_RECORD_SIZE] {
        let mut record = [0u8; MONSTER_RECORD_SIZE];
        record[0..2].copy_from_slice(&self.attack.to_le_bytes());
        record[2..4].copy_from_slice(&self.defense.to_le_bytes());
        record[4..6].copy_from_slice(&self.hp.to_le_bytes());
        record[6..8].copy_from_slice(&self.damage.to_le_bytes());
        write_field(
            &mut record[8..8 + MONSTER_SPECIAL_SIZE],
            &to_engine_bytes(&self.special),
        );
        record[14..16].copy_from_slice(&self.xp.to_le_bytes());
        record[16..18].copy_from_slice(&self.flags.to_le_bytes());
        record[18..20].copy_from_slice(&self.reserved.to_le_bytes());
        record
    }

    #[must_use]
    pub fn decode(record: &[u8; MONSTER_RECORD_SIZE]) -> Self {
        let i16_at = |at: usize| i16::from_le_bytes([record[at], record[at + 1]]);
        let u16_at = |at: usize| u16::from_le_bytes([record[at], record[at + 1]]);
        Self {
            attack: i16_at(0),
            defense: i16_at(2),
            hp: i16_at(4),
            damage: i16_at(6),
            special: read_field(&record[8..8 + MONSTER_SPECIAL_SIZE]),
            xp: i16_at(14),
            flags: u16_at(16),
            reserved: u16_at(18),
        }
    }

    /// True for the all-zero record written into unused slots.
    #[must_use]
    pub fn is_empty_slot(record: &[u8; MONSTER_RECORD_SIZE]) -> bool {
        record.iter().all(|&b| b == 0)
    }
}

/// Encode the whole monster file: room N's spawn at byte `N * 20`.
///
/// Slots at or beyond `MONSTER_SLOTS` are ignored; the control parser already
/// rejects them.
#[must_use]
pub fn encode_monster_file(spawns: &BTreeMap<u16, MonsterRecord>) -> Vec<u8> {
    let mut data = vec![0u8; MONSTER_FILE_SIZE];
    for (&room, record) in spawns.range(..MONSTER_SLOTS) {
        let offset = usize::from(room) * MONSTER_RECORD_SIZE;
        data[offset..offset + MONSTER_RECORD_SIZE].copy_from_slice(&record.encode());
    }
    data
}

/// Decode the occupied slots of a monster file.
#[must_use]
pub fn decode_monster_file(data: &[u8]) -> BTreeMap<u16, MonsterRecord> {
    data.chunks_exact(MONSTER_RECORD_SIZE)
        .zip(0..MONSTER_SLOTS)
        .filter_map(|(chunk, room)| {
            let record = <&[u8; MONSTER_RECORD_SIZE]>::try_from(chunk).ok()?;
            (!MonsterRecord::is_empty_slot(record)).then(|| (room, MonsterRecord::decode(record)))
        })
        .collect()
}
