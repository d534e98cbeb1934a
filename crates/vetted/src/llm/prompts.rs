//! Prompt templates for summary generation.

use crate::input::HotelRecord;

use super::provider::PromptHints;

/// Build the user prompt for one hotel.
pub fn summary_prompt(record: &HotelRecord, hints: &PromptHints<'_>) -> String {
    let mut sections = vec![
        r#"Write a concise, factual summary of this hotel.

## Requirements
- Length: 60-100 words, single paragraph
- Mention the location (city, country) and the star rating
- Reference 2-4 of the scored attributes below, by name or by score
- Use concrete, data-grounded statements
- No vague superlatives or marketing copy
- No facts that are not in the data"#
            .to_string(),
    ];

    if let Some(style) = hints.style_guide.to_prompt_section() {
        sections.push(format!("## Learned Style Preferences\n{}", style));
    }

    if !hints.guidance.is_empty() {
        let lines: Vec<String> = hints.guidance.iter().map(|g| format!("- {}", g)).collect();
        sections.push(format!("## Reviewer Feedback\n{}", lines.join("\n")));
    }

    if !hints.exemplars.is_empty() {
        let examples: Vec<String> = hints
            .exemplars
            .iter()
            .map(|e| format!("- {}", e.summary))
            .collect();
        sections.push(format!("## Approved Examples\n{}", examples.join("\n")));
    }

    sections.push(format!("## Hotel Data\n{}", hotel_data(record)));
    sections.push("Write the summary paragraph (60-100 words), with no heading or preamble:".to_string());

    sections.join("\n\n")
}

fn hotel_data(record: &HotelRecord) -> String {
    let location = record
        .location
        .as_ref()
        .map(|l| l.display())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    let rating = record
        .star_rating
        .map(|r| format!("{} stars", r))
        .unwrap_or_else(|| "unknown".to_string());

    let scores: Vec<String> = record
        .scores
        .ranked()
        .into_iter()
        .map(|(attr, score)| format!("{} {:.1}", attr, score))
        .collect();
    let scores = if scores.is_empty() {
        "none".to_string()
    } else {
        scores.join(", ")
    };

    format!(
        "- Name: {}\n- Location: {}\n- Star rating: {}\n- Scores (out of 10, highest first): {}",
        record.name, location, rating, scores
    )
}

/// System prompt shared by all providers.
pub fn system_prompt() -> &'static str {
    r#"You write short hotel summaries for a travel catalogue. Every summary is checked by a human editor before publication.

Guidelines:
- State only what the structured data supports
- Prefer specific numbers over adjectives
- Keep a neutral, informative tone
- Follow any learned style preferences and reviewer feedback you are given
- Respond with the summary text only"#
}
