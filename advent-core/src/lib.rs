//! Advent Data Pipeline
//!
//! Rebuilds the Advent MUD dungeon from salvaged text: parses the room dump and
//! monster control file, writes the fixed-size binary files the engine reads,
//! and repairs the room graph so every room is reachable from the start room.
//! File access goes through [`SalvageLoader`] and [`DataStorage`] so the
//! pipeline can run against directories or in-memory fixtures.

pub mod analysis;
pub mod config;
pub mod constants;
pub mod control;
pub mod exits;
pub mod export;
pub mod files;
pub mod graph;
pub mod migrate;
pub mod monster;
pub mod repair;
pub mod room;
pub mod salvage;
pub mod text;

use log::{debug, info};
use std::path::{Path, PathBuf};
use thiserror::Error;

// Re-export commonly used types
pub use analysis::{ConnectivityAnalyzer, ConnectivityReport, analyze};
pub use config::{ConfigError, PipelineConfig};
pub use control::{ControlIssue, ControlParse, MonsterSpawn, parse_monster_table};
pub use exits::{Direction, Exit, Exits};
pub use export::{DungeonMap, MapConnection, MapMetadata, MapRoom};
pub use files::{DirectoryLoader, DirectoryStorage, StoreError};
pub use graph::{DungeonGraph, DungeonRoom, Link};
pub use migrate::{Migration, MigrationSummary, OutputFile, SalvageInput, migrate};
pub use monster::{MonsterRecord, decode_monster_file, encode_monster_file};
pub use repair::{ConnectivityRepairer, RepairAction, RepairKind, RepairReport};
pub use room::{RoomRecord, decode_room_file, encode_room_file, patch_exit_slot};
pub use salvage::{RoomDescriptor, SalvageIssue, SalvageParse, parse_exit_spec, parse_room_dump};

type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Source of salvaged input files.
pub trait SalvageLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load a file's raw bytes, or `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    fn load_bytes(&self, name: &Path) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Load a Latin-1 text file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    fn load_text(&self, name: &Path) -> Result<Option<String>, Self::Error> {
        Ok(self
            .load_bytes(name)?
            .map(|bytes| text::decode_latin1(&bytes)))
    }
}

/// Destination for binary engine files.
pub trait DataStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    fn read(&self, name: &Path) -> Result<Vec<u8>, Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn write(&self, name: &Path, data: &[u8]) -> Result<(), Self::Error>;
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("room dump {} not found in the salvage input", .0.display())]
    MissingRoomDump(PathBuf),
    #[error("failed to load salvage input")]
    Load(#[source] BoxedError),
    #[error("failed to access data files")]
    Storage(#[source] BoxedError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl MigrationError {
    fn load(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Load(Box::new(err))
    }

    fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Box::new(err))
    }
}

/// Result of repairing a room file.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub before: ConnectivityReport,
    pub report: RepairReport,
    pub map: DungeonMap,
    /// Where the repaired file went; `None` on a dry run.
    pub written: Option<PathBuf>,
}

/// Read-only diagnostics for a room file.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub graph: DungeonGraph,
    pub report: ConnectivityReport,
    pub map: DungeonMap,
}

/// Runs the pipeline stages against a loader and a storage backend.
pub struct MigrationEngine<L, S>
where
    L: SalvageLoader,
    S: DataStorage,
{
    loader: L,
    storage: S,
    config: PipelineConfig,
}

impl<L, S> MigrationEngine<L, S>
where
    L: SalvageLoader,
    S: DataStorage,
{
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn new(loader: L, storage: S, config: PipelineConfig) -> Result<Self, MigrationError> {
        config.validate()?;
        Ok(Self {
            loader,
            storage,
            config,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Convert the salvage input into every engine file.
    ///
    /// `board` overrides the notice board found in the salvage input.
    ///
    /// # Errors
    ///
    /// Returns an error if the room dump is missing or a file cannot be read
    /// or written.
    pub fn migrate(&self, board: Option<Vec<u8>>) -> Result<MigrationSummary, MigrationError> {
        let dump_name = Path::new(&self.config.room_dump);
        let room_dump = self
            .loader
            .load_text(dump_name)
            .map_err(MigrationError::load)?
            .ok_or_else(|| MigrationError::MissingRoomDump(dump_name.to_path_buf()))?;
        let monster_table = self
            .loader
            .load_text(Path::new(&self.config.monster_table))
            .map_err(MigrationError::load)?;
        let board = match board {
            Some(bytes) => Some(bytes),
            None => self
                .loader
                .load_bytes(Path::new(&self.config.board_file))
                .map_err(MigrationError::load)?,
        };

        let input = SalvageInput {
            room_dump,
            monster_table,
            board,
        };
        let Migration { files, summary } = migrate(&input, &self.config);
        for file in &files {
            self.storage
                .write(Path::new(&file.name), &file.data)
                .map_err(MigrationError::storage)?;
        }
        info!(
            "migration wrote {} files ({} issues)",
            files.len(),
            summary.issue_count()
        );
        Ok(summary)
    }

    fn load_graph(&self, input: &Path) -> Result<(Vec<u8>, DungeonGraph), MigrationError> {
        let data = self.storage.read(input).map_err(MigrationError::storage)?;
        let graph = DungeonGraph::from_records(decode_room_file(&data));
        info!("loaded {} valid rooms from {}", graph.len(), input.display());
        Ok((data, graph))
    }

    /// Repair a room file so every valid room is reachable from `start`.
    ///
    /// Only the exit slots the repairer filled are written; every other byte
    /// of the input is kept.
    /// `output` defaults to overwriting `input`.
    ///
    /// # Errors
    ///
    /// Returns an error if the room file cannot be read or written.
    pub fn reconstruct(
        &self,
        input: &Path,
        output: Option<&Path>,
        start: u16,
        dry_run: bool,
    ) -> Result<Reconstruction, MigrationError> {
        let (mut data, mut graph) = self.load_graph(input)?;
        let before = analyze(&graph, start);
        let report = ConnectivityRepairer::new(start).repair(&mut graph);
        let map = DungeonMap::build(&graph, start, &report.actions, None);

        let written = if dry_run {
            info!("dry run; {} left untouched", input.display());
            None
        } else {
            let target = output.unwrap_or(input);
            let mut patched = 0usize;
            for room in graph.rooms() {
                for (direction, exit) in room.reconstructed_exits() {
                    if patch_exit_slot(&mut data, room.number(), direction, exit.destination) {
                        patched += 1;
                    }
                }
            }
            debug!("patched {patched} exit slots");
            self.storage
                .write(target, &data)
                .map_err(MigrationError::storage)?;
            Some(target.to_path_buf())
        };

        Ok(Reconstruction {
            before,
            report,
            map,
            written,
        })
    }

    /// # Errors
    ///
    /// Returns an error if the room file cannot be read.
    pub fn analyze(&self, input: &Path, start: u16) -> Result<Analysis, MigrationError> {
        let (_, graph) = self.load_graph(input)?;
        let report = analyze(&graph, start);
        let map = DungeonMap::build(&graph, start, &[], Some(report.clone()));
        Ok(Analysis { graph, report, map })
    }
}
