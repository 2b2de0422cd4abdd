//! Segment summary synthesis.

use crate::models::Segment;

const MAX_EXCERPTS: usize = 3;
const EXCERPT_CHARS: usize = 60;

/// Truncate to `max_chars` characters, appending "..." when cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}

pub fn format_duration(ms: i64) -> String {
    let minutes = ms.max(0) / 60_000;
    match minutes {
        0 => "under a minute".to_string(),
        1 => "1 minute".to_string(),
        m if m < 120 => format!("{} minutes", m),
        m => format!("{} hours", m / 60),
    }
}

/// One-sentence summary of a segment ending at `ended_at`.
pub fn summarize_segment(segment: &Segment, topic: &str, ended_at: i64) -> String {
    let excerpts: Vec<String> = segment
        .user_messages()
        .take(MAX_EXCERPTS)
        .map(|m| format!("\"{}\"", truncate(&m.content, EXCERPT_CHARS)))
        .collect();

    let mut summary = format!(
        "Conversation about {} ({} messages over {})",
        topic,
        segment.messages.len(),
        format_duration(ended_at - segment.started_at)
    );
    if !excerpts.is_empty() {
        summary.push_str(": ");
        summary.push_str(&excerpts.join("; "));
    }
    summary
}
