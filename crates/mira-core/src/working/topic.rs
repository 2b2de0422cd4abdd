//! Keyword-based topic inference.

use regex::Regex;
use std::sync::LazyLock;

pub const GENERAL_TOPIC: &str = "general";

static TOPIC_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("coffee", r"coffee|espresso|latte|cappuccino|americano|mocha|barista|cafe|brew"),
        ("food", r"food|eat|lunch|dinner|breakfast|restaurant|recipe|cook|meal|hungry|snack"),
        ("weather", r"weather|rain|sunny|forecast|temperature|snow|wind|cloudy|storm"),
        ("shopping", r"shop|buy|bought|purchase|order|price|cart|store|deal"),
        ("travel", r"travel|trip|flight|hotel|vacation|airport|train|journey|passport"),
        ("work", r"work|meeting|project|deadline|office|boss|colleague|job|task"),
        ("alerts", r"alert|remind|notify|notification|alarm|schedule"),
    ]
    .into_iter()
    .map(|(topic, words)| {
        let regex = Regex::new(&format!(r"(?i)\b(?:{})\w*", words)).expect("invalid topic regex");
        (topic, regex)
    })
    .collect()
});

/// First matching topic category in a fixed order, else `general`.
pub fn infer_topic(text: &str) -> &'static str {
    TOPIC_PATTERNS
        .iter()
        .find(|(_, regex)| regex.is_match(text))
        .map(|(topic, _)| *topic)
        .unwrap_or(GENERAL_TOPIC)
}
