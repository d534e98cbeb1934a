//! Status command - show review progress for a hotel file.

use std::path::PathBuf;

use colored::Colorize;
use serde::Serialize;
use vetted::{BatchStats, LearningStore, LearningStatus, PipelineConfig, ReviewStatus};

use super::load_checkpoint;

#[derive(Serialize)]
struct StatusReport {
    file: Option<String>,
    checkpoint: String,
    output: String,
    saved_at: String,
    stats: BatchStats,
    stored_rows: usize,
    learning: LearningStatus,
    is_complete: bool,
}

pub fn run(
    file: PathBuf,
    json_output: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (persistence, checkpoint) = load_checkpoint(&file)?;

    let stats = BatchStats::from_items(
        &checkpoint.items,
        checkpoint.completed_reviews,
        &PipelineConfig::default(),
    );
    let mut store = LearningStore::default();
    store.restore(
        checkpoint.learning_history.clone(),
        checkpoint.learning_state.clone(),
        checkpoint.learning_rebuilds,
    );
    let learning = store.status();
    let stored_rows = persistence.load_rows()?.len();

    if json_output {
        let report = StatusReport {
            file: checkpoint.source.as_ref().map(|s| s.file.clone()),
            checkpoint: persistence.checkpoint_path().display().to_string(),
            output: persistence.output_path().display().to_string(),
            saved_at: checkpoint.saved_at.to_rfc3339(),
            is_complete: stats.is_complete(),
            stats,
            stored_rows,
            learning,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let name = checkpoint
        .source
        .as_ref()
        .map(|s| s.file.clone())
        .unwrap_or_else(|| file.display().to_string());
    println!("{} {}", "Review status for".cyan().bold(), name.white());
    println!(
        "{}",
        format!("Last saved {}", checkpoint.saved_at.format("%Y-%m-%d %H:%M:%S UTC")).dimmed()
    );
    println!();

    // Progress bar
    let progress = stats.progress_percent() / 100.0;
    let bar_width = 30;
    let filled = (progress * bar_width as f64).round() as usize;
    let bar: String = "█".repeat(filled) + &"░".repeat(bar_width - filled);

    println!(
        "Progress: {} {}/{} ({:.0}%)",
        bar.cyan(),
        stats.finished().to_string().white().bold(),
        stats.total,
        stats.progress_percent()
    );
    println!();

    println!("{}", "Reviews:".yellow().bold());
    let open = stats.pending + stats.in_progress + stats.awaiting_human;
    println!("  Pending:  {}", open.to_string().white());
    println!("  Accepted: {}", stats.accepted.to_string().green());
    println!("  Edited:   {}", stats.edited.to_string().blue());
    println!("  Rejected: {}", stats.rejected.to_string().red());
    println!("  Stored:   {}", stored_rows.to_string().magenta());
    if stats.accepted + stats.edited + stats.rejected > 0 {
        println!(
            "Approval rate {:.0}%, edit rate {:.0}%",
            stats.approval_rate(),
            stats.edit_rate()
        );
    }
    println!();

    if verbose {
        let flagged: Vec<_> = checkpoint
            .items
            .iter()
            .filter(|i| i.status == ReviewStatus::Rejected)
            .filter(|i| i.critique_flags.iter().any(|f| !f.is_advisory()))
            .collect();
        if !flagged.is_empty() {
            println!("{}", "Rejected by the pipeline:".yellow().bold());
            for item in flagged {
                println!("  {:20} {}", item.record.id, item.critique_notes.join("; ").dimmed());
            }
            println!();
        }
    }

    if learning.active {
        println!(
            "Learning: active, built from {} reviews ({} exemplars, {} error patterns)",
            learning.built_from, learning.exemplars, learning.error_patterns
        );
    } else {
        println!("Learning: {}", "not yet active".dimmed());
    }
    println!();

    if stats.is_complete() {
        println!("{}", "All hotels have been reviewed!".green().bold());
        println!(
            "Stored summaries are in {}",
            persistence.output_path().display().to_string().white()
        );
    } else {
        println!(
            "Run {} to continue reviewing.",
            format!("vetted review {}", file.display()).cyan().bold()
        );
    }

    Ok(())
}
