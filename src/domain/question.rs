/// Question data model and schema validation.
///
/// A question is immutable once accepted: the engine swaps whole
/// questions in and out, never edits one. Validation runs at the
/// provider boundary so the engine can trust every field.

use serde::Deserialize;

pub const OPTION_COUNT: usize = 4;

/// Difficulty band, derived from the level (1-5 easy, 6-10 medium,
/// 11-15 hard). Informational: passed to providers and shown in the
/// HUD, never enforced by the engine.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Easy,
    Medium,
    Hard,
}

impl Band {
    pub fn label(self) -> &'static str {
        match self {
            Band::Easy => "EASY",
            Band::Medium => "MEDIUM",
            Band::Hard => "HARD",
        }
    }
}

/// A single multiple-choice question.
#[derive(Clone, Debug, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub explanation: String,
    /// Level this question was served for (1-15). Assigned by the
    /// provider at fetch time, not part of pack files.
    #[serde(default)]
    pub level: u8,
}

/// A question that fails its schema contract.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum QuestionDefect {
    #[error("expected {OPTION_COUNT} options, got {0}")]
    OptionCount(usize),
    #[error("correct_index {0} is out of range")]
    CorrectIndexOutOfRange(usize),
    #[error("empty prompt text")]
    EmptyPrompt,
    #[error("option {0} is empty")]
    EmptyOption(usize),
}

impl Question {
    /// Schema check: exactly four non-empty options, index in range,
    /// non-empty prompt. Run on every question entering the game.
    pub fn validate(&self) -> Result<(), QuestionDefect> {
        if self.options.len() != OPTION_COUNT {
            return Err(QuestionDefect::OptionCount(self.options.len()));
        }
        if self.correct_index >= OPTION_COUNT {
            return Err(QuestionDefect::CorrectIndexOutOfRange(self.correct_index));
        }
        if self.prompt.trim().is_empty() {
            return Err(QuestionDefect::EmptyPrompt);
        }
        for (i, opt) in self.options.iter().enumerate() {
            if opt.trim().is_empty() {
                return Err(QuestionDefect::EmptyOption(i));
            }
        }
        Ok(())
    }
}
