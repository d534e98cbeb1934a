//! Review command - draft summaries and collect decisions in the terminal.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use colored::Colorize;
use tracing::info;
use vetted::input::ReaderConfig;
use vetted::{
    AnthropicProvider, BatchStats, Decision, FilePersistence, LlmConfig, MockGenerator,
    OllamaProvider, OpenAIProvider, PipelineConfig, RecordReader, ReviewItem, ReviewPipeline,
    Reviewer, ReviewerAction, SessionOutcome, SummaryGenerator, VettedError, run_session,
};

use crate::cli::LlmProviderChoice;

pub fn run(
    file: PathBuf,
    llm: LlmProviderChoice,
    model: Option<String>,
    learning_interval: usize,
    max_rows: Option<usize>,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let reader = RecordReader::with_config(ReaderConfig {
        max_rows,
        ..ReaderConfig::default()
    });
    let batch = reader.read_file(&file)?;

    let generator = build_generator(&llm, model)?;
    println!(
        "{} {} {}",
        "Reviewing".cyan().bold(),
        file.display().to_string().white(),
        format!("(drafting with {}, model {})", generator.name(), generator.config().model).dimmed()
    );

    let persistence = FilePersistence::for_data_file(&file);
    let output = persistence.output_path().to_path_buf();
    let config = PipelineConfig::default().with_learning_interval(learning_interval);
    let mut pipeline = ReviewPipeline::new(generator, persistence).with_config(config);

    if pipeline.restore(batch.source.as_ref())? {
        let stats = pipeline.stats();
        println!(
            "Resuming: {} of {} hotels already reviewed",
            stats.finished().to_string().white().bold(),
            stats.total
        );
    } else {
        let count = pipeline.ingest(batch)?;
        println!("Loaded {} hotels", count.to_string().white().bold());
    }
    println!();

    // Every suspension is checkpointed, so an interrupt loses nothing.
    ctrlc::set_handler(|| {
        eprintln!();
        eprintln!("{}", "Interrupted. Progress is saved; run the same command to resume.".yellow());
        std::process::exit(130);
    })?;

    let stdin = io::stdin();
    let mut reviewer = TerminalReviewer::new(stdin.lock(), io::stdout(), verbose);
    let outcome = run_session(&mut pipeline, &mut reviewer)?;

    println!();
    match outcome {
        SessionOutcome::Completed(stats) => {
            println!("{}", "All hotels reviewed!".green().bold());
            print_summary(&stats, &output);
        }
        SessionOutcome::Paused(stats) => {
            println!(
                "{} {} hotels left.",
                "Paused.".yellow().bold(),
                stats.remaining()
            );
            print_summary(&stats, &output);
            println!(
                "Run {} to continue.",
                format!("vetted review {}", file.display()).cyan().bold()
            );
        }
    }

    Ok(())
}

/// Build the generator for the chosen provider.
fn build_generator(
    choice: &LlmProviderChoice,
    model: Option<String>,
) -> Result<Box<dyn SummaryGenerator>, Box<dyn std::error::Error>> {
    let generator: Box<dyn SummaryGenerator> = match (choice, model) {
        (LlmProviderChoice::Mock, _) => Box::new(MockGenerator::new()),
        (LlmProviderChoice::Anthropic, None) => Box::new(AnthropicProvider::from_env()?),
        (LlmProviderChoice::Anthropic, Some(model)) => Box::new(AnthropicProvider::with_config(
            api_key("ANTHROPIC_API_KEY")?,
            LlmConfig::default().with_model(model),
        )?),
        (LlmProviderChoice::OpenAI, None) => Box::new(OpenAIProvider::from_env()?),
        (LlmProviderChoice::OpenAI, Some(model)) => Box::new(OpenAIProvider::with_config(
            api_key("OPENAI_API_KEY")?,
            LlmConfig::default().with_model(model),
        )?),
        (LlmProviderChoice::Ollama, None) => Box::new(OllamaProvider::new()?),
        (LlmProviderChoice::Ollama, Some(model)) => Box::new(OllamaProvider::with_model(model)?),
    };

    info!(provider = %choice, model = %generator.config().model, "Using generator");
    Ok(generator)
}

fn api_key(var: &str) -> Result<String, VettedError> {
    std::env::var(var)
        .map_err(|_| VettedError::Config(format!("{} environment variable not set", var)))
}

fn print_summary(stats: &BatchStats, output: &Path) {
    println!("  Accepted: {}", stats.accepted.to_string().green());
    println!("  Edited:   {}", stats.edited.to_string().blue());
    println!("  Rejected: {}", stats.rejected.to_string().red());
    if stats.stored > 0 {
        println!(
            "Stored summaries written to {}",
            output.display().to_string().white()
        );
    }
}

/// Prompts for decisions on a terminal.
pub struct TerminalReviewer<R, W> {
    input: R,
    output: W,
    verbose: bool,
}

impl<R: BufRead, W: Write> TerminalReviewer<R, W> {
    pub fn new(input: R, output: W, verbose: bool) -> Self {
        Self {
            input,
            output,
            verbose,
        }
    }

    /// Read one trimmed line. `None` at end of input.
    fn read_line(&mut self) -> vetted::Result<Option<String>> {
        let mut line = String::new();
        let read = self.input.read_line(&mut line).map_err(stdin_error)?;
        if read == 0 {
            Ok(None)
        } else {
            Ok(Some(line.trim().to_string()))
        }
    }

    fn prompt(&mut self, text: &str) -> vetted::Result<Option<String>> {
        write!(self.output, "{}", text).map_err(stdout_error)?;
        self.output.flush().map_err(stdout_error)?;
        self.read_line()
    }

    fn show(&mut self, item: &ReviewItem, stats: &BatchStats) -> io::Result<()> {
        let record = &item.record;
        let out = &mut self.output;

        writeln!(
            out,
            "{} {}",
            format!("[{}/{}]", stats.finished() + 1, stats.total).dimmed(),
            record.name.white().bold()
        )?;

        let mut details = Vec::new();
        if let Some(location) = &record.location {
            details.push(location.display());
        }
        if let Some(rating) = record.star_rating {
            details.push(format!("{} stars", rating));
        }
        let scores: Vec<String> = record
            .scores
            .ranked()
            .iter()
            .map(|(attr, score)| format!("{} {:.1}", attr, score))
            .collect();
        if !scores.is_empty() {
            details.push(scores.join(", "));
        }
        writeln!(out, "{}", details.join(" | ").dimmed())?;
        writeln!(out)?;

        if let Some(draft) = &item.draft_summary {
            writeln!(out, "{}", draft)?;
            writeln!(
                out,
                "{}",
                format!("({} words)", draft.split_whitespace().count()).dimmed()
            )?;
        }
        writeln!(out)?;

        if item.critique_notes.is_empty() {
            writeln!(out, "{}", "No critique flags.".green())?;
        } else {
            writeln!(out, "{}", "Critique:".yellow().bold())?;
            for note in &item.critique_notes {
                writeln!(out, "  - {}", note.yellow())?;
            }
        }

        if self.verbose {
            if let Some(until) = stats.reviews_until_learning {
                writeln!(
                    out,
                    "{}",
                    format!("{} reviews until the next learning update", until).dimmed()
                )?;
            }
        }
        writeln!(out)
    }
}

impl<R: BufRead, W: Write> Reviewer for TerminalReviewer<R, W> {
    fn review(&mut self, item: &ReviewItem, stats: &BatchStats) -> vetted::Result<ReviewerAction> {
        self.show(item, stats).map_err(stdout_error)?;

        loop {
            let Some(choice) = self.prompt("[a]ccept, [e]dit, [r]eject, [q]uit: ")? else {
                return Ok(ReviewerAction::Stop);
            };

            match choice.to_lowercase().as_str() {
                "a" | "accept" => return Ok(ReviewerAction::Decide(Decision::Accept)),
                "e" | "edit" => {
                    let Some(text) = self.prompt("Edited summary (one line): ")? else {
                        return Ok(ReviewerAction::Stop);
                    };
                    return Ok(ReviewerAction::Decide(Decision::edit(text)));
                }
                "r" | "reject" => {
                    let reason = self.prompt("Reason (optional): ")?.unwrap_or_default();
                    let decision = if reason.is_empty() {
                        Decision::reject_silently()
                    } else {
                        Decision::reject(reason)
                    };
                    return Ok(ReviewerAction::Decide(decision));
                }
                "q" | "quit" => return Ok(ReviewerAction::Stop),
                other => {
                    writeln!(self.output, "{}", format!("Unknown choice '{}'", other).red())
                        .map_err(stdout_error)?;
                }
            }
        }
    }

    fn decision_refused(&mut self, _item: &ReviewItem, error: &VettedError) {
        let _ = writeln!(self.output, "{}", error.to_string().red());
    }

    fn decision_applied(&mut self, item: &ReviewItem) {
        let label = item
            .outcome
            .map(|o| o.label())
            .unwrap_or_else(|| item.status.label());
        let _ = writeln!(self.output, "{} {}\n", "→".green(), label);
    }
}

fn stdin_error(e: io::Error) -> VettedError {
    VettedError::Io {
        path: PathBuf::from("<stdin>"),
        source: e,
    }
}

fn stdout_error(e: io::Error) -> VettedError {
    VettedError::Io {
        path: PathBuf::from("<stdout>"),
        source: e,
    }
}
