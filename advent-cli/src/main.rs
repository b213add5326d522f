mod reports;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::info;
use std::fs::{self, File};
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};

use advent_core::{DirectoryLoader, DirectoryStorage, MigrationEngine, PipelineConfig};

#[derive(Debug, Parser)]
#[command(name = "advent", version)]
#[command(about = "Rebuild and repair Advent MUD dungeon data from salvaged text")]
struct Args {
    /// Optional path to write the summary instead of stdout
    #[arg(long, global = true)]
    report: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert the salvage directory into the engine's binary files
    Migrate {
        /// Directory holding roomfil.fil and REFRSH.CTL
        salvage_dir: PathBuf,
        /// Directory to write ADVENT.DTA and friends into
        output_dir: PathBuf,
        /// Notice board to copy instead of the salvage one
        #[arg(long)]
        board: Option<PathBuf>,
        /// JSON pipeline configuration
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Repair a room file so every room is reachable from the start room
    Reconstruct {
        #[arg(long)]
        input: PathBuf,
        /// Defaults to overwriting the input
        #[arg(long)]
        output: Option<PathBuf>,
        /// Write the dungeon map as JSON
        #[arg(long)]
        map_json: Option<PathBuf>,
        #[arg(long)]
        start: Option<u16>,
        /// Report what would change without writing the room file
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Report connectivity problems without changing anything
    Analyze {
        room_file: PathBuf,
        /// Write the map and issues as JSON
        #[arg(long)]
        json: Option<PathBuf>,
        #[arg(long)]
        start: Option<u16>,
        /// Print details for up to 10 problem rooms
        #[arg(short, long)]
        verbose: bool,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut output_target = OutputTarget::new(args.report.clone())?;
    announce_banner(output_target.writer())?;
    run(args.command, output_target.writer())?;
    output_target.flush_inner()?;
    Ok(())
}

fn announce_banner(out: &mut dyn Write) -> Result<()> {
    writeln!(out, "{}", "🏰 Advent Dungeon Pipeline".bright_cyan().bold())?;
    writeln!(out, "{}", "==========================".cyan())?;
    Ok(())
}

fn run(command: Command, out: &mut dyn Write) -> Result<()> {
    match command {
        Command::Migrate {
            salvage_dir,
            output_dir,
            board,
            config,
        } => {
            let config = load_config(config.as_deref(), None)?;
            let board = board
                .map(|path| {
                    fs::read(&path)
                        .with_context(|| format!("failed to read board {}", path.display()))
                })
                .transpose()?;
            let engine = MigrationEngine::new(
                DirectoryLoader::new(&salvage_dir),
                DirectoryStorage::new(&output_dir),
                config,
            )?;
            let summary = engine.migrate(board).with_context(|| {
                format!(
                    "migration from {} to {} failed",
                    salvage_dir.display(),
                    output_dir.display()
                )
            })?;
            reports::write_migration_summary(out, &summary, &output_dir)?;
        }
        Command::Reconstruct {
            input,
            output,
            map_json,
            start,
            dry_run,
            config,
        } => {
            let config = load_config(config.as_deref(), start)?;
            let start = config.start_room;
            let engine = path_engine(config)?;
            let result = engine
                .reconstruct(&input, output.as_deref(), start, dry_run)
                .with_context(|| format!("failed to reconstruct {}", input.display()))?;
            if let Some(path) = map_json.filter(|_| !dry_run) {
                write_json(&path, &result.map.to_json_pretty()?)?;
            }
            reports::write_repair_summary(out, &result)?;
        }
        Command::Analyze {
            room_file,
            json,
            start,
            verbose,
            config,
        } => {
            let config = load_config(config.as_deref(), start)?;
            let start = config.start_room;
            let engine = path_engine(config)?;
            let analysis = engine
                .analyze(&room_file, start)
                .with_context(|| format!("failed to analyze {}", room_file.display()))?;
            if let Some(path) = json {
                write_json(&path, &analysis.map.to_json_pretty()?)?;
            }
            reports::write_analysis(out, &analysis, verbose)?;
        }
    }
    Ok(())
}

/// Engine whose storage resolves paths as given on the command line.
fn path_engine(
    config: PipelineConfig,
) -> Result<MigrationEngine<DirectoryLoader, DirectoryStorage>> {
    Ok(MigrationEngine::new(
        DirectoryLoader::new(PathBuf::new()),
        DirectoryStorage::new(PathBuf::new()),
        config,
    )?)
}

fn load_config(path: Option<&Path>, start: Option<u16>) -> Result<PipelineConfig> {
    let mut config = match path {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            PipelineConfig::from_json(&json)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => PipelineConfig::default(),
    };
    if let Some(start) = start {
        config.start_room = start;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn write_json(path: &Path, json: &str) -> Result<()> {
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    info!("map written to {}", path.display());
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_line_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn reconstruct_flags_parse() {
        let args = Args::try_parse_from([
            "advent",
            "reconstruct",
            "--input",
            "ADVENT.DTA",
            "--map-json",
            "map.json",
            "--start",
            "7",
            "--dry-run",
        ])
        .unwrap();
        match args.command {
            Command::Reconstruct {
                input,
                map_json,
                start,
                dry_run,
                output,
                ..
            } => {
                assert_eq!(input, PathBuf::from("ADVENT.DTA"));
                assert_eq!(map_json, Some(PathBuf::from("map.json")));
                assert_eq!(start, Some(7));
                assert!(dry_run);
                assert!(output.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn start_flag_overrides_config() {
        let config = load_config(None, Some(40)).unwrap();
        assert_eq!(config.start_room, 40);
        assert!(load_config(None, Some(0)).is_err());
    }

    #[test]
    fn missing_config_file_is_reported() {
        let err = load_config(Some(Path::new("/nonexistent/advent.json")), None).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read config"));
    }

    #[test]
    fn output_target_writes_to_file() {
        let path = std::env::temp_dir().join(format!(
            "advent-report-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        let mut target = OutputTarget::new(Some(path.clone())).unwrap();
        writeln!(target, "hello").unwrap();
        target.flush().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
        fs::remove_file(path).unwrap();
    }
}
