/// Question acquisition.
///
/// A `QuestionSource` produces questions and friend advice. The
/// bundled sources are the Gemini API (feature `gemini`) and a local
/// bank of embedded and pack-file questions. `loader::Fetcher` runs
/// either one off the render thread.

use std::sync::Arc;

use crate::domain::question::{Question, QuestionDefect};

pub mod bank;
#[cfg(feature = "gemini")]
pub mod gemini;
pub mod loader;

pub trait QuestionSource: Send + Sync {
    /// Produce a question for `level`. Failures surface to the player
    /// as a retryable error screen.
    fn fetch_question(&self, level: u8) -> Result<Question, ProviderError>;

    /// One short line of friend advice for `question`. Callers route
    /// this through `advice_or_fallback`, so the player always hears
    /// something.
    fn advice(&self, question: &Question) -> Result<String, ProviderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[cfg(feature = "gemini")]
    #[error("transport failure: {0}")]
    Transport(#[from] ureq::Error),
    #[cfg(feature = "gemini")]
    #[error("unusable payload: {0}")]
    BadPayload(#[from] serde_json::Error),
    #[error("failed reading the response body: {0}")]
    Body(#[from] std::io::Error),
    #[error("provider returned no content")]
    EmptyResponse,
    #[error("rejected question: {0}")]
    BadQuestion(#[from] QuestionDefect),
    #[error("question bank has no entries for this difficulty")]
    EmptyBank,
}

/// What the friend says when the real advice cannot be had.
pub const FALLBACK_ADVICE: &str =
    "Hard to say from here... but my gut leans toward the second option.";

/// Collapse an advice result into text. The friend never goes silent.
pub fn advice_or_fallback(result: Result<String, ProviderError>) -> String {
    match result {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            log::warn!("advice came back empty, using the canned line");
            FALLBACK_ADVICE.to_string()
        }
        Err(err) => {
            log::warn!("advice fetch failed ({err}), using the canned line");
            FALLBACK_ADVICE.to_string()
        }
    }
}

/// A finished fetch, as handed to the engine.
#[derive(Debug)]
pub enum FetchOutcome {
    Question(Result<Question, ProviderError>),
    Advice(String),
}

/// Pick the source the config asks for. `auto` takes Gemini when the
/// build has it and the key is present, otherwise the local bank.
pub fn select_source(cfg: &crate::config::ProviderConfig) -> Arc<dyn QuestionSource> {
    match cfg.source.as_str() {
        "bank" => Arc::new(bank::BankSource::load(&cfg.packs_dir)),
        #[cfg(feature = "gemini")]
        "gemini" | "auto" => match std::env::var(&cfg.api_key_env) {
            Ok(key) if !key.trim().is_empty() => {
                log::info!("question source: gemini ({})", cfg.model);
                Arc::new(gemini::GeminiSource::new(
                    key,
                    cfg.model.clone(),
                    cfg.timeout_secs,
                ))
            }
            _ => {
                if cfg.source == "gemini" {
                    log::warn!(
                        "{} is not set, falling back to the question bank",
                        cfg.api_key_env
                    );
                }
                Arc::new(bank::BankSource::load(&cfg.packs_dir))
            }
        },
        #[cfg(not(feature = "gemini"))]
        "gemini" | "auto" => {
            if cfg.source == "gemini" {
                log::warn!("built without gemini support, using the question bank");
            }
            Arc::new(bank::BankSource::load(&cfg.packs_dir))
        }
        other => {
            log::warn!("unknown question source '{other}', using the question bank");
            Arc::new(bank::BankSource::load(&cfg.packs_dir))
        }
    }
}
