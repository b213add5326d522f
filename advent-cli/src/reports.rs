use colored::Colorize;
use std::io::{self, Write};
use std::path::Path;

use advent_core::{Analysis, DungeonGraph, MigrationSummary, Reconstruction, RepairKind};

const DETAIL_LIMIT: usize = 10;
const PREVIEW_CHARS: usize = 100;

fn heading(out: &mut dyn Write, title: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", title.bright_cyan().bold())?;
    writeln!(out, "{}", "=".repeat(title.chars().count()).cyan())
}

fn room_list(rooms: &[u16]) -> String {
    let shown: Vec<String> = rooms.iter().take(20).map(u16::to_string).collect();
    if rooms.len() > shown.len() {
        format!("{} ... (+{} more)", shown.join(", "), rooms.len() - shown.len())
    } else {
        shown.join(", ")
    }
}

pub fn write_migration_summary(
    out: &mut dyn Write,
    summary: &MigrationSummary,
    output_dir: &Path,
) -> io::Result<()> {
    heading(out, "Migration Summary")?;
    writeln!(out, "Rooms parsed: {}", summary.rooms_parsed.to_string().green())?;
    writeln!(out, "Rooms written: {}", summary.rooms_written.to_string().green())?;
    writeln!(
        out,
        "Monsters placed: {}",
        summary.monsters_placed.to_string().green()
    )?;
    let issues = summary.issue_count();
    let issues = if issues == 0 {
        issues.to_string().green()
    } else {
        issues.to_string().yellow()
    };
    writeln!(out, "Input issues: {issues}")?;
    for issue in &summary.salvage_issues {
        writeln!(out, "   • {}", issue.to_string().yellow())?;
    }
    for issue in &summary.control_issues {
        writeln!(out, "   • {}", issue.to_string().yellow())?;
    }
    if summary.board_copied {
        writeln!(out, "Notice board: copied from salvage")?;
    }
    writeln!(out)?;
    writeln!(out, "Files in {}:", output_dir.display())?;
    for (name, len) in &summary.files {
        writeln!(out, "   {name:12} {len:>10} bytes")?;
    }
    Ok(())
}

pub fn write_repair_summary(out: &mut dyn Write, result: &Reconstruction) -> io::Result<()> {
    let report = &result.report;
    heading(out, "Reconstruction Summary")?;
    writeln!(out, "Start room: {}", report.start_room)?;
    writeln!(
        out,
        "Reachable: {} -> {}",
        report.reachable_before,
        report.reachable_after.to_string().green()
    )?;
    writeln!(
        out,
        "Return exits added: {}",
        report.count(RepairKind::Bidirectional)
    )?;
    writeln!(
        out,
        "Chain connections added: {}",
        report.count(RepairKind::ChainConnection)
    )?;
    writeln!(out, "Slot conflicts: {}", report.conflicts)?;
    writeln!(out, "Expansion passes: {}", report.passes)?;
    if report.is_complete() {
        writeln!(out, "{}", "✅ Every room is reachable".green())?;
    } else {
        writeln!(
            out,
            "{} {}",
            "⚠️  Still unreachable:".yellow(),
            room_list(&report.still_unreachable)
        )?;
    }
    match &result.written {
        Some(path) => writeln!(out, "Wrote {}", path.display())?,
        None => {
            writeln!(out, "Dry run: no files written")?;
            let metadata = serde_json::to_string_pretty(&result.map.metadata)
                .map_err(io::Error::other)?;
            writeln!(out, "{metadata}")?;
        }
    }
    Ok(())
}

fn write_room_details(out: &mut dyn Write, graph: &DungeonGraph, rooms: &[u16]) -> io::Result<()> {
    for &number in rooms.iter().take(DETAIL_LIMIT) {
        let Some(room) = graph.room(number) else {
            continue;
        };
        writeln!(out, "{}", format!("Room {number}").bold())?;
        let exits: Vec<String> = room
            .exits()
            .iter()
            .map(|(direction, exit)| format!("{direction}{}", exit.destination))
            .collect();
        writeln!(out, "   Exits: {}", exits.join(" "))?;
        let description: String = room.record.description.chars().take(PREVIEW_CHARS).collect();
        writeln!(out, "   {description}")?;
    }
    Ok(())
}

pub fn write_analysis(out: &mut dyn Write, analysis: &Analysis, verbose: bool) -> io::Result<()> {
    let report = &analysis.report;
    heading(out, "Connectivity Analysis")?;
    writeln!(out, "Valid rooms: {}", report.total_rooms)?;
    if !report.start_exists {
        writeln!(
            out,
            "{}",
            format!("❌ Start room {} is not a valid room", report.start_room).red()
        )?;
    }
    writeln!(
        out,
        "Reachable from {}: {}",
        report.start_room,
        report.reachable.len().to_string().green()
    )?;
    writeln!(
        out,
        "Unreachable: {}",
        report.unreachable.len().to_string().yellow()
    )?;
    writeln!(out, "Clusters: {}", report.clusters)?;
    writeln!(out, "Dead ends: {}", report.dead_ends.len())?;
    writeln!(out, "Rooms without exits: {}", report.no_exits.len())?;
    writeln!(out, "One-way links: {}", report.one_way.len())?;
    writeln!(out, "Broken exits: {}", report.broken.len())?;
    if !report.unreachable.is_empty() {
        writeln!(out, "Unreachable rooms: {}", room_list(&report.unreachable))?;
    }
    if verbose {
        heading(out, "Problem Rooms")?;
        write_room_details(out, &analysis.graph, &report.problem_rooms())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_room_lists_are_elided() {
        let rooms: Vec<u16> = (1..=25).collect();
        let text = room_list(&rooms);
        assert!(text.starts_with("1, 2, 3"));
        assert!(text.ends_with("(+5 more)"));
        assert_eq!(room_list(&[4, 9]), "4, 9");
    }

    #[test]
    fn migration_summary_lists_files() {
        let summary = MigrationSummary {
            rooms_parsed: 3,
            rooms_written: 3,
            monsters_placed: 1,
            files: vec![("ADVENT.DTA".to_string(), 1_024_000)],
            ..MigrationSummary::default()
        };
        let mut buffer = Vec::new();
        write_migration_summary(&mut buffer, &summary, Path::new("data")).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("Migration Summary"));
        assert!(text.contains("ADVENT.DTA"));
        assert!(text.contains("1024000 bytes"));
    }
}
