//! Fixed record geometry for the Advent data files.
//!
//! These values are dictated by the legacy engine's `FIELD` statements and
//! file sizes. They are constants rather than configuration because any change
//! produces files the engine cannot read.

// Room file (ADVENT.DTA) ----------------------------------------------------
pub const ROOM_COUNT: u16 = 2000;
pub const ROOM_RECORD_SIZE: usize = 512;
pub const ROOM_FILE_SIZE: usize = ROOM_COUNT as usize * ROOM_RECORD_SIZE;

pub(crate) const VALIDATION_OFFSET: usize = 0;
pub(crate) const EXITS_OFFSET: usize = 1;
pub(crate) const EXIT_SLOT_SIZE: usize = 4;
pub(crate) const EXITS_SIZE: usize = EXIT_SLOT_SIZE * 4;
pub(crate) const MONSTERS_OFFSET: usize = EXITS_OFFSET + EXITS_SIZE;
pub const MONSTERS_FIELD_SIZE: usize = 83;
pub(crate) const OBJECTS_OFFSET: usize = MONSTERS_OFFSET + MONSTERS_FIELD_SIZE;
pub const OBJECTS_FIELD_SIZE: usize = 100;
pub(crate) const DESCRIPTION_OFFSET: usize = OBJECTS_OFFSET + OBJECTS_FIELD_SIZE;
pub const DESCRIPTION_FIELD_SIZE: usize = ROOM_RECORD_SIZE - DESCRIPTION_OFFSET;

/// Byte separating the readable description from engine special codes.
pub const DESCRIPTION_SENTINEL: u8 = b'$';
/// Letter byte written into an exit slot that holds no exit.
pub(crate) const EMPTY_SLOT_LETTER: u8 = b' ';
/// Replacement for bytes the engine cannot represent.
pub const PLACEHOLDER: u8 = b'?';

// Monster file (ADVENT.MON) -------------------------------------------------
pub const MONSTER_SLOTS: u16 = 10_000;
pub const MONSTER_RECORD_SIZE: usize = 20;
pub const MONSTER_FILE_SIZE: usize = MONSTER_SLOTS as usize * MONSTER_RECORD_SIZE;
pub const MONSTER_SPECIAL_SIZE: usize = 6;

// Auxiliary files, zero-initialised -----------------------------------------
pub const CHARACTER_RECORD_SIZE: usize = 512;
pub const BOARD_RECORD_SIZE: usize = 512;
pub const MESSAGE_RECORD_SIZE: usize = 60;

// Repair -----------------------------------------------------------------------
pub const DEFAULT_START_ROOM: u16 = 2;
/// Passes allowed beyond the room count before frontier expansion gives up.
pub(crate) const REPAIR_PASS_SLACK: usize = 10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_fields_fill_the_record_exactly() {
        assert_eq!(MONSTERS_OFFSET, 17);
        assert_eq!(OBJECTS_OFFSET, 100);
        assert_eq!(DESCRIPTION_OFFSET, 200);
        assert_eq!(DESCRIPTION_FIELD_SIZE, 312);
        assert_eq!(ROOM_FILE_SIZE, 1_024_000);
    }

    #[test]
    fn monster_file_geometry() {
        assert_eq!(MONSTER_FILE_SIZE, 200_000);
        assert_eq!(8 + MONSTER_SPECIAL_SIZE + 6, MONSTER_RECORD_SIZE);
    }
}
