use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::TextStatsView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTransform {
    Uppercase,
    Lowercase,
    Normalize,
}

impl TextTransform {
    pub fn apply(&self, text: &str) -> String {
        match self {
            TextTransform::Uppercase => text.to_uppercase(),
            TextTransform::Lowercase => text.to_lowercase(),
            TextTransform::Normalize => normalize_whitespace(text),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TextTransform::Uppercase => "uppercase",
            TextTransform::Lowercase => "lowercase",
            TextTransform::Normalize => "normalize",
        }
    }
}

impl fmt::Display for TextTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextTransform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uppercase" | "upper" => Ok(TextTransform::Uppercase),
            "lowercase" | "lower" => Ok(TextTransform::Lowercase),
            "normalize" | "clean" => Ok(TextTransform::Normalize),
            other => Err(format!(
                "Unknown transform '{}' (expected uppercase, lowercase or normalize)",
                other
            )),
        }
    }
}

/// Trims every line and drops the ones left empty.
pub fn normalize_whitespace(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

pub fn line_count(text: &str) -> usize {
    text.split('\n').count().max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextStats {
    pub words: usize,
    pub characters: usize,
    pub lines: usize,
}

impl TextStats {
    pub fn of(text: &str) -> Self {
        Self {
            words: word_count(text),
            characters: char_count(text),
            lines: line_count(text),
        }
    }
}

impl From<TextStats> for TextStatsView {
    fn from(stats: TextStats) -> Self {
        TextStatsView {
            words: stats.words,
            characters: stats.characters,
            lines: stats.lines,
        }
    }
}
