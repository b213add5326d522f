//! Pipeline configuration: file names, start room, auxiliary file sizes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_START_ROOM, ROOM_COUNT};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("start_room must be between 1 and {max} (got {value})")]
    StartRoomOutOfRange { value: u16, max: u16 },
    #[error("{field} must name a file")]
    EmptyFileName { field: &'static str },
    #[error("{field} must be at least 1")]
    ZeroRecords { field: &'static str },
}

/// Settings shared by every subcommand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "PipelineConfig::default_start_room")]
    pub start_room: u16,
    #[serde(default = "PipelineConfig::default_room_dump")]
    pub room_dump: String,
    #[serde(default = "PipelineConfig::default_monster_table")]
    pub monster_table: String,
    #[serde(default = "PipelineConfig::default_room_file")]
    pub room_file: String,
    #[serde(default = "PipelineConfig::default_monster_file")]
    pub monster_file: String,
    #[serde(default = "PipelineConfig::default_character_file")]
    pub character_file: String,
    #[serde(default = "PipelineConfig::default_board_file")]
    pub board_file: String,
    #[serde(default = "PipelineConfig::default_message_file")]
    pub message_file: String,
    #[serde(default = "PipelineConfig::default_character_records")]
    pub character_records: usize,
    #[serde(default = "PipelineConfig::default_board_records")]
    pub board_records: usize,
    #[serde(default = "PipelineConfig::default_message_records")]
    pub message_records: usize,
}

impl PipelineConfig {
    #[must_use]
    pub const fn default_start_room() -> u16 {
        DEFAULT_START_ROOM
    }

    fn default_room_dump() -> String {
        "roomfil.fil".to_string()
    }

    fn default_monster_table() -> String {
        "REFRSH.CTL".to_string()
    }

    fn default_room_file() -> String {
        "ADVENT.DTA".to_string()
    }

    fn default_monster_file() -> String {
        "ADVENT.MON".to_string()
    }

    fn default_character_file() -> String {
        "ADVENT.CHR".to_string()
    }

    fn default_board_file() -> String {
        "BOARD.NTC".to_string()
    }

    fn default_message_file() -> String {
        "MESSAG.NPC".to_string()
    }

    const fn default_character_records() -> usize {
        100
    }

    const fn default_board_records() -> usize {
        512
    }

    const fn default_message_records() -> usize {
        1000
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the JSON is malformed or a value is out of
    /// bounds.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ConfigError` for the first field that violates its bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=ROOM_COUNT).contains(&self.start_room) {
            return Err(ConfigError::StartRoomOutOfRange {
                value: self.start_room,
                max: ROOM_COUNT,
            });
        }
        let names = [
            ("room_dump", &self.room_dump),
            ("monster_table", &self.monster_table),
            ("room_file", &self.room_file),
            ("monster_file", &self.monster_file),
            ("character_file", &self.character_file),
            ("board_file", &self.board_file),
            ("message_file", &self.message_file),
        ];
        if let Some((field, _)) = names.iter().find(|(_, name)| name.trim().is_empty()) {
            return Err(ConfigError::EmptyFileName { field: *field });
        }
        let counts = [
            ("character_records", self.character_records),
            ("board_records", self.board_records),
            ("message_records", self.message_records),
        ];
        if let Some((field, _)) = counts.iter().find(|(_, count)| *count == 0) {
            return Err(ConfigError::ZeroRecords { field: *field });
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            start_room: Self::default_start_room(),
            room_dump: Self::default_room_dump(),
            monster_table: Self::default_monster_table(),
            room_file: Self::default_room_file(),
            monster_file: Self::default_monster_file(),
            character_file: Self::default_character_file(),
            board_file: Self::default_board_file(),
            message_file: Self::default_message_file(),
            character_records: Self::default_character_records(),
            board_records: Self::default_board_records(),
            message_records: Self::default_message_records(),
        }
    }
}
