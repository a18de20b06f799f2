/// Gemini-backed question source. One HTTP round trip per question
/// and one per advice line, both through `generateContent` with the
/// question call pinned to a JSON response schema.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::domain::question::{Band, Question};
use crate::domain::rules;

use super::{ProviderError, QuestionSource};

const ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiSource {
    agent: ureq::Agent,
    api_key: String,
    model: String,
    serial: AtomicU64,
}

/// The shape the response schema pins the model to.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireQuestion {
    text: String,
    options: Vec<String>,
    correct_index: usize,
    #[serde(default)]
    explanation: String,
}

impl GeminiSource {
    pub fn new(api_key: String, model: String, timeout_secs: u64) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(timeout_secs))
            .build();
        Self {
            agent,
            api_key,
            model,
            serial: AtomicU64::new(0),
        }
    }

    /// POST one `generateContent` call and pull out the reply text.
    fn generate(&self, body: serde_json::Value) -> Result<String, ProviderError> {
        let url = format!("{ENDPOINT}/{}:generateContent", self.model);
        let response = self
            .agent
            .post(&url)
            .set("x-goog-api-key", &self.api_key)
            .send_json(body)?;
        let payload: serde_json::Value = response.into_json()?;
        let text = payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or(ProviderError::EmptyResponse)?;
        Ok(text.to_string())
    }
}

impl QuestionSource for GeminiSource {
    fn fetch_question(&self, level: u8) -> Result<Question, ProviderError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": question_prompt(level) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": question_schema(),
                "temperature": 0.8,
            },
        });
        let wire = parse_payload(&self.generate(body)?)?;
        let serial = self.serial.fetch_add(1, Ordering::Relaxed);
        question_from_wire(wire, level, serial)
    }

    fn advice(&self, question: &Question) -> Result<String, ProviderError> {
        let options = question
            .options
            .iter()
            .enumerate()
            .map(|(i, o)| format!("{}. {o}", (b'A' + i as u8) as char))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "A friend phones you from a quiz show and reads out this question:\n\n\
             {}\n\n{options}\n\n\
             Reply in one or two spoken sentences, as the friend on the phone. \
             Name your best pick and say how sure you are. No markup.",
            question.prompt
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": 0.9 },
        });
        Ok(self.generate(body)?.trim().to_string())
    }
}

fn parse_payload(text: &str) -> Result<WireQuestion, ProviderError> {
    Ok(serde_json::from_str(text)?)
}

fn question_from_wire(wire: WireQuestion, level: u8, serial: u64) -> Result<Question, ProviderError> {
    let question = Question {
        id: format!("gemini-{level}-{serial}"),
        prompt: wire.text,
        options: wire.options,
        correct_index: wire.correct_index,
        explanation: wire.explanation,
        level,
    };
    question.validate()?;
    Ok(question)
}

fn question_prompt(level: u8) -> String {
    let difficulty = match rules::band_for_level(level) {
        Band::Easy => "easy, something most people would know",
        Band::Medium => "moderately difficult",
        Band::Hard => "difficult, the kind only an enthusiast would know",
    };
    format!(
        "You write questions for a fifteen-level quiz show. Produce one \
         general-knowledge multiple-choice question for level {level} of 15. \
         Difficulty: {difficulty}. Exactly four options, one correct. \
         Vary the topic. Keep the explanation to one sentence."
    )
}

fn question_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "text": { "type": "STRING" },
            "options": { "type": "ARRAY", "items": { "type": "STRING" } },
            "correctIndex": { "type": "INTEGER" },
            "explanation": { "type": "STRING" },
        },
        "required": ["text", "options", "correctIndex", "explanation"],
    })
}
