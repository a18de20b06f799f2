/// Background fetching. One worker thread per request reports back
/// over a channel; a generation counter lets a reset strand any
/// result that is still in flight.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use crate::domain::question::Question;

use super::{advice_or_fallback, FetchOutcome, QuestionSource};

struct Delivery {
    generation: u64,
    outcome: FetchOutcome,
}

pub struct Fetcher {
    source: Arc<dyn QuestionSource>,
    tx: mpsc::Sender<Delivery>,
    rx: mpsc::Receiver<Delivery>,
    generation: u64,
}

impl Fetcher {
    pub fn new(source: Arc<dyn QuestionSource>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            tx,
            rx,
            generation: 0,
        }
    }

    /// Strand everything requested so far. `poll` will drop it.
    pub fn invalidate(&mut self) {
        self.generation += 1;
    }

    pub fn request_question(&self, level: u8) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let generation = self.generation;
        log::debug!("fetching a question for level {level}");
        thread::spawn(move || {
            let outcome = FetchOutcome::Question(source.fetch_question(level));
            let _ = tx.send(Delivery {
                generation,
                outcome,
            });
        });
    }

    /// Fetch one advice line. Provider failures become the canned
    /// line in the worker, so advice always arrives.
    pub fn request_advice(&self, question: &Question) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let generation = self.generation;
        let question = question.clone();
        log::debug!("fetching advice for question {}", question.id);
        thread::spawn(move || {
            let advice = advice_or_fallback(source.advice(&question));
            let _ = tx.send(Delivery {
                generation,
                outcome: FetchOutcome::Advice(advice),
            });
        });
    }

    /// The oldest landed result of the current generation, if any.
    pub fn poll(&self) -> Option<FetchOutcome> {
        while let Ok(delivery) = self.rx.try_recv() {
            if delivery.generation == self.generation {
                return Some(delivery.outcome);
            }
            log::debug!("dropping a result from a superseded request");
        }
        None
    }
}
