//! Reset command - discard review progress for a hotel file.

use std::io::{self, Write};
use std::path::PathBuf;

use colored::Colorize;
use vetted::FilePersistence;

pub fn run(file: PathBuf, yes: bool) -> Result<(), Box<dyn std::error::Error>> {
    let persistence = FilePersistence::for_data_file(&file);
    let targets: Vec<_> = [persistence.checkpoint_path(), persistence.output_path()]
        .into_iter()
        .filter(|p| p.exists())
        .collect();

    if targets.is_empty() {
        println!("Nothing to reset for {}", file.display());
        return Ok(());
    }

    if !yes {
        println!("This will delete:");
        for path in &targets {
            println!("  {}", path.display().to_string().white());
        }
        print!("Continue? [y/N] ");
        io::stdout().flush()?;

        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("Aborted.");
            return Ok(());
        }
    }

    persistence.reset()?;
    println!("{} {}", "Reset".green().bold(), file.display());
    Ok(())
}
