//! Learning command - show the learned style guide, exemplars and patterns.

use std::path::PathBuf;

use colored::Colorize;
use vetted::LearningStore;
use vetted::learning::EditAction;

use super::load_checkpoint;

pub fn run(
    file: PathBuf,
    json_output: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (_, checkpoint) = load_checkpoint(&file)?;
    let state = &checkpoint.learning_state;

    if json_output {
        println!("{}", serde_json::to_string_pretty(state)?);
        return Ok(());
    }

    let mut store = LearningStore::default();
    store.restore(
        checkpoint.learning_history.clone(),
        state.clone(),
        checkpoint.learning_rebuilds,
    );
    let status = store.status();

    println!(
        "{} {} recorded reviews ({} accepted, {} edited, {} rejected)",
        "Learning from".cyan().bold(),
        status.history_len.to_string().white().bold(),
        status.accepted.to_string().green(),
        status.edited.to_string().blue(),
        status.rejected.to_string().red()
    );

    if state.is_empty() {
        println!();
        println!(
            "{}",
            "Nothing learned yet. Hints are rebuilt after every few completed reviews.".dimmed()
        );
        return Ok(());
    }

    println!(
        "{}",
        format!("Rebuilt {} times by the {} analyzer", status.rebuilds, status.analyzer).dimmed()
    );

    if status.unlearned() > 0 {
        println!(
            "{}",
            format!(
                "Built from the first {} reviews; {} more since the last update.",
                state.built_from,
                status.unlearned()
            )
            .dimmed()
        );
    }
    println!();

    println!("{}", "Style guide:".yellow().bold());
    match state.style_guide.to_prompt_section() {
        Some(section) => {
            for line in section.lines() {
                println!("  {}", line);
            }
        }
        None => println!("  {}", "No approved summaries yet.".dimmed()),
    }
    println!();

    if !state.exemplars.is_empty() {
        println!("{}", "Exemplars:".yellow().bold());
        for exemplar in &state.exemplars {
            println!(
                "  {} {}",
                exemplar.hotel_name.white().bold(),
                format!("({} flags)", exemplar.flag_count).dimmed()
            );
            if verbose {
                println!("    {}", exemplar.summary);
            }
        }
        println!();
    }

    if !state.error_patterns.is_empty() {
        println!("{}", "Rejection patterns:".yellow().bold());
        for (category, pattern) in &state.error_patterns {
            println!(
                "  {:28} {:>3}  {:.0}%",
                category,
                pattern.count,
                pattern.share * 100.0
            );
            if verbose {
                if let Some(example) = &pattern.example {
                    println!("    {}", format!("e.g. {}", example).dimmed());
                }
            }
        }
        println!();
    }

    if !state.edit_rules.is_empty() {
        println!("{}", "Editing habits:".yellow().bold());
        for rule in &state.edit_rules {
            let word = match rule.action {
                EditAction::Prefer => format!("+ {}", rule.word).green(),
                EditAction::Avoid => format!("- {}", rule.word).red(),
            };
            println!("  {:20} {}", word, format!("x{}", rule.occurrences).dimmed());
        }
        println!();
    }

    let guidance = state.guidance();
    if !guidance.is_empty() {
        println!("{}", "Prompt guidance:".yellow().bold());
        for line in guidance {
            println!("  - {}", line);
        }
    }

    Ok(())
}
