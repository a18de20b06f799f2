/// The local question bank: an embedded set that always ships, plus
/// any TOML packs found in the configured directory. Draws are random
/// within the difficulty band and avoid repeats until a band runs dry.
///
/// Pack format:
///
/// ```toml
/// title = "Pub night"
///
/// [[questions]]
/// band = "medium"
/// prompt = "..."
/// options = ["...", "...", "...", "..."]
/// correct_index = 2
/// explanation = "..."
/// ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;

use crate::domain::question::{Band, Question};
use crate::domain::rules;

use super::{ProviderError, QuestionSource};

pub struct BankEntry {
    pub band: Band,
    pub question: Question,
}

struct BankState {
    used: HashSet<String>,
    rng: StdRng,
}

pub struct BankSource {
    entries: Vec<BankEntry>,
    state: Mutex<BankState>,
}

#[derive(Deserialize)]
struct PackFile {
    #[serde(default)]
    title: String,
    #[serde(default)]
    questions: Vec<PackEntry>,
}

#[derive(Deserialize)]
struct PackEntry {
    band: Band,
    prompt: String,
    options: Vec<String>,
    correct_index: usize,
    #[serde(default)]
    explanation: String,
}

impl BankSource {
    /// Embedded questions plus every readable pack under `packs_dir`.
    /// A missing directory or a broken pack never stops the game.
    pub fn load(packs_dir: &Path) -> Self {
        let mut entries = embedded_questions();
        match fs::read_dir(packs_dir) {
            Ok(dir) => {
                let mut paths: Vec<_> = dir
                    .filter_map(|e| e.ok())
                    .map(|e| e.path())
                    .filter(|p| p.extension().map(|x| x == "toml").unwrap_or(false))
                    .collect();
                paths.sort();
                for path in paths {
                    match fs::read_to_string(&path) {
                        Ok(raw) => {
                            let stem = path
                                .file_stem()
                                .and_then(|s| s.to_str())
                                .unwrap_or("pack");
                            match parse_pack(stem, &raw) {
                                Ok(mut pack) => {
                                    log::info!(
                                        "loaded {} questions from {}",
                                        pack.len(),
                                        path.display()
                                    );
                                    entries.append(&mut pack);
                                }
                                Err(err) => {
                                    log::warn!("skipping pack {}: {err}", path.display())
                                }
                            }
                        }
                        Err(err) => log::warn!("skipping pack {}: {err}", path.display()),
                    }
                }
            }
            Err(_) => log::debug!("no question pack directory at {}", packs_dir.display()),
        }
        Self::from_entries(entries)
    }

    fn from_entries(mut entries: Vec<BankEntry>) -> Self {
        for (i, entry) in entries.iter_mut().enumerate() {
            if entry.question.id.is_empty() {
                entry.question.id = format!("bank-{i:03}");
            }
        }
        Self {
            entries,
            state: Mutex::new(BankState {
                used: HashSet::new(),
                rng: StdRng::from_entropy(),
            }),
        }
    }
}

impl QuestionSource for BankSource {
    fn fetch_question(&self, level: u8) -> Result<Question, ProviderError> {
        let band = rules::band_for_level(level);
        let pool: Vec<&BankEntry> = self.entries.iter().filter(|e| e.band == band).collect();
        if pool.is_empty() {
            return Err(ProviderError::EmptyBank);
        }

        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let fresh: Vec<&BankEntry> = pool
            .iter()
            .copied()
            .filter(|e| !state.used.contains(&e.question.id))
            .collect();
        let entry = if fresh.is_empty() {
            // Band exhausted: forget its history and start over.
            for e in &pool {
                state.used.remove(&e.question.id);
            }
            pool.choose(&mut state.rng)
        } else {
            fresh.choose(&mut state.rng)
        };
        let entry = match entry {
            Some(e) => *e,
            None => return Err(ProviderError::EmptyBank),
        };
        state.used.insert(entry.question.id.clone());

        let mut question = entry.question.clone();
        question.level = level;
        question.validate()?;
        Ok(question)
    }

    fn advice(&self, question: &Question) -> Result<String, ProviderError> {
        let pick = question
            .options
            .get(question.correct_index)
            .map(String::as_str)
            .unwrap_or("the first one");
        Ok(format!("I'm not certain, but I'd go with \"{pick}\"."))
    }
}

fn parse_pack(stem: &str, raw: &str) -> Result<Vec<BankEntry>, toml::de::Error> {
    let pack: PackFile = toml::from_str(raw)?;
    if !pack.title.is_empty() {
        log::info!("pack '{}'", pack.title);
    }
    let mut out = Vec::new();
    for (i, entry) in pack.questions.into_iter().enumerate() {
        let question = Question {
            id: format!("{stem}-{i}"),
            prompt: entry.prompt,
            options: entry.options,
            correct_index: entry.correct_index,
            explanation: entry.explanation,
            level: 0,
        };
        if let Err(defect) = question.validate() {
            log::warn!("pack '{stem}': question {i} rejected: {defect}");
            continue;
        }
        out.push(BankEntry {
            band: entry.band,
            question,
        });
    }
    Ok(out)
}

fn entry(
    band: Band,
    prompt: &str,
    options: [&str; 4],
    correct_index: usize,
    explanation: &str,
) -> BankEntry {
    BankEntry {
        band,
        question: Question {
            id: String::new(),
            prompt: prompt.to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
            correct_index,
            explanation: explanation.to_string(),
            level: 0,
        },
    }
}

/// Six questions per band. Enough for a full run with the swap
/// lifeline; packs extend the pool.
fn embedded_questions() -> Vec<BankEntry> {
    vec![
        entry(
            Band::Easy,
            "Which planet is known as the Red Planet?",
            ["Venus", "Mars", "Jupiter", "Mercury"],
            1,
            "Iron oxide dust gives Mars its rusty colour.",
        ),
        entry(
            Band::Easy,
            "How many continents are there on Earth?",
            ["Five", "Six", "Seven", "Eight"],
            2,
            "The usual count runs from Africa through to Antarctica.",
        ),
        entry(
            Band::Easy,
            "What is the chemical formula for water?",
            ["H2O", "CO2", "NaCl", "O2"],
            0,
            "Two hydrogen atoms bonded to one oxygen atom.",
        ),
        entry(
            Band::Easy,
            "Which is the largest ocean?",
            ["The Atlantic", "The Indian", "The Arctic", "The Pacific"],
            3,
            "The Pacific covers about a third of the planet's surface.",
        ),
        entry(
            Band::Easy,
            "How many minutes are there in a day?",
            ["720", "1,440", "2,400", "3,600"],
            1,
            "24 hours of 60 minutes each.",
        ),
        entry(
            Band::Easy,
            "What is the tallest living land animal?",
            ["The elephant", "The ostrich", "The giraffe", "The camel"],
            2,
            "Adult giraffes stand up to about five and a half metres.",
        ),
        entry(
            Band::Medium,
            "Which element has atomic number 1?",
            ["Helium", "Oxygen", "Hydrogen", "Carbon"],
            2,
            "A single proton puts hydrogen first in the periodic table.",
        ),
        entry(
            Band::Medium,
            "In which year did the Berlin Wall fall?",
            ["1985", "1989", "1991", "1993"],
            1,
            "The border opened on 9 November 1989.",
        ),
        entry(
            Band::Medium,
            "Which symphony contains the 'Ode to Joy'?",
            [
                "Mozart's Fortieth",
                "Brahms' First",
                "Beethoven's Ninth",
                "Beethoven's Fifth",
            ],
            2,
            "The choral finale of the Ninth sets Schiller's poem.",
        ),
        entry(
            Band::Medium,
            "What is the capital of Canada?",
            ["Toronto", "Vancouver", "Montreal", "Ottawa"],
            3,
            "Ottawa has been the capital since 1857.",
        ),
        entry(
            Band::Medium,
            "Which gas makes up most of Earth's atmosphere?",
            ["Oxygen", "Nitrogen", "Carbon dioxide", "Argon"],
            1,
            "Nitrogen accounts for roughly 78 percent.",
        ),
        entry(
            Band::Medium,
            "Who painted The Starry Night?",
            [
                "Claude Monet",
                "Pablo Picasso",
                "Salvador Dali",
                "Vincent van Gogh",
            ],
            3,
            "Van Gogh painted it in 1889 at Saint-Remy.",
        ),
        entry(
            Band::Hard,
            "What is the smallest prime number greater than 100?",
            ["101", "103", "107", "111"],
            0,
            "101 has no divisors other than 1 and itself.",
        ),
        entry(
            Band::Hard,
            "In which year did Heisenberg publish the uncertainty principle?",
            ["1905", "1915", "1927", "1939"],
            2,
            "The 1927 paper bounds how precisely position and momentum can both be known.",
        ),
        entry(
            Band::Hard,
            "The Strait of Malacca connects the Indian Ocean to which sea?",
            [
                "The South China Sea",
                "The Coral Sea",
                "The Sea of Japan",
                "The Arabian Sea",
            ],
            0,
            "It is the main shipping lane between the Indian and Pacific Oceans.",
        ),
        entry(
            Band::Hard,
            "In which modern country stood the Mausoleum at Halicarnassus?",
            ["Greece", "Turkey", "Egypt", "Iran"],
            1,
            "Halicarnassus is present-day Bodrum on the Turkish coast.",
        ),
        entry(
            Band::Hard,
            "In computing, what does the I in RAID stand for?",
            ["Integrated", "Independent", "Indexed", "Internal"],
            1,
            "RAID reads Redundant Array of Independent Disks.",
        ),
        entry(
            Band::Hard,
            "Which country was first to grant women the national vote?",
            ["Finland", "Norway", "New Zealand", "The United States"],
            2,
            "New Zealand extended the franchise in 1893.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn easy_only(n: usize) -> BankSource {
        let entries = (0..n)
            .map(|i| {
                entry(
                    Band::Easy,
                    "Pick the first option?",
                    ["Yes", "No", "Maybe", "Never"],
                    0,
                    "",
                )
                .with_id(format!("e{i}"))
            })
            .collect();
        BankSource::from_entries(entries)
    }

    impl BankEntry {
        fn with_id(mut self, id: String) -> Self {
            self.question.id = id;
            self
        }
    }

    #[test]
    fn embedded_bank_covers_every_band() {
        let bank = BankSource::load(Path::new("/nonexistent"));
        for level in [1u8, 6, 11] {
            let q = bank.fetch_question(level).unwrap();
            assert_eq!(q.level, level);
            assert!(q.validate().is_ok());
        }
    }

    #[test]
    fn levels_draw_from_their_own_band() {
        let entries = vec![
            entry(Band::Easy, "E?", ["a", "b", "c", "d"], 0, "").with_id("easy".into()),
            entry(Band::Medium, "M?", ["a", "b", "c", "d"], 0, "").with_id("medium".into()),
            entry(Band::Hard, "H?", ["a", "b", "c", "d"], 0, "").with_id("hard".into()),
        ];
        let bank = BankSource::from_entries(entries);
        assert_eq!(bank.fetch_question(3).unwrap().id, "easy");
        assert_eq!(bank.fetch_question(12).unwrap().id, "hard");
    }

    #[test]
    fn draws_avoid_repeats_until_the_band_runs_dry() {
        let bank = easy_only(3);
        let mut seen = HashSet::new();
        for _ in 0..3 {
            let q = bank.fetch_question(1).unwrap();
            assert!(seen.insert(q.id), "repeat before exhaustion");
        }
        // Fourth draw starts over instead of failing.
        let q = bank.fetch_question(1).unwrap();
        assert!(seen.contains(&q.id));
    }

    #[test]
    fn an_empty_band_is_an_error() {
        let bank = easy_only(2);
        assert!(matches!(
            bank.fetch_question(11),
            Err(ProviderError::EmptyBank)
        ));
    }

    #[test]
    fn advice_names_the_right_option() {
        let bank = easy_only(1);
        let q = bank.fetch_question(1).unwrap();
        let advice = bank.advice(&q).unwrap();
        assert!(advice.contains("Yes"));
    }

    #[test]
    fn packs_parse_and_reject_bad_questions() {
        let raw = r#"
            title = "Test pack"

            [[questions]]
            band = "medium"
            prompt = "Largest moon of Saturn?"
            options = ["Titan", "Rhea", "Iapetus", "Dione"]
            correct_index = 0
            explanation = "Titan is bigger than Mercury."

            [[questions]]
            band = "easy"
            prompt = "Broken one"
            options = ["only", "three", "options"]
            correct_index = 0
        "#;
        let entries = parse_pack("test", raw).unwrap();
        assert_eq!(entries.len(), 1, "the three-option question is dropped");
        assert_eq!(entries[0].question.id, "test-0");
        assert_eq!(entries[0].band, Band::Medium);
    }

    #[test]
    fn malformed_packs_are_an_error() {
        assert!(parse_pack("bad", "this is not toml [[").is_err());
    }
}
