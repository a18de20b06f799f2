/// The game session: one container holding everything the engine
/// mutates and the renderer reads. Construction gives the title-screen
/// state; `reset_run` returns to it without touching timing or rng.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::TimingConfig;
use crate::domain::question::Question;
use crate::domain::rules::ActionView;

/// Top-level mode of the session. Overlays (the swap prompt, the
/// friend panel) are flags on the session, not phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Title screen, no run in progress.
    Title,
    /// First question of a run is being fetched.
    Loading,
    Playing,
    Lost,
    Won,
}

/// Where an answer stands. The holds count down in engine ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnswerState {
    Idle,
    /// Locked in, verdict pending.
    Checking { ticks_left: u32 },
    /// Verdict shown, advance pending.
    Correct { ticks_left: u32 },
    /// Verdict shown, loss pending.
    Wrong { ticks_left: u32 },
}

impl AnswerState {
    pub fn is_idle(&self) -> bool {
        matches!(self, AnswerState::Idle)
    }
}

/// What an in-flight fetch will deliver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadKind {
    Question,
    Advice,
}

/// Used-flags for the lifelines. `false` means still available.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Lifelines {
    pub fifty_fifty: bool,
    pub call_friend: bool,
    pub change_question: bool,
}

pub struct GameSession {
    // ── Run ──
    pub level: u8,
    pub question: Option<Question>,
    pub selected: Option<usize>,
    pub answer: AnswerState,
    pub lifelines: Lifelines,
    pub hidden: Vec<usize>,

    // ── Overlays ──
    pub confirm_swap: bool,
    pub friend_message: Option<String>,

    // ── Acquisition ──
    pub loading: Option<LoadKind>,
    pub load_error: Option<String>,

    // ── Meta ──
    pub phase: Phase,
    pub timing: TimingConfig,
    /// Frame counter driving the hold countdowns and all animation.
    pub tick: u64,
    pub rng: StdRng,
}

impl GameSession {
    pub fn new(timing: TimingConfig) -> Self {
        Self::with_rng(timing, StdRng::from_entropy())
    }

    /// Seeded constructor, used by tests for a reproducible fifty-fifty.
    pub fn with_rng(timing: TimingConfig, rng: StdRng) -> Self {
        Self {
            level: 1,
            question: None,
            selected: None,
            answer: AnswerState::Idle,
            lifelines: Lifelines::default(),
            hidden: Vec::new(),
            confirm_swap: false,
            friend_message: None,
            loading: None,
            load_error: None,
            phase: Phase::Title,
            timing,
            tick: 0,
            rng,
        }
    }

    /// Back to the title-screen state. Timing, rng and the tick
    /// counter survive so animation does not stutter across resets.
    pub fn reset_run(&mut self) {
        self.level = 1;
        self.question = None;
        self.selected = None;
        self.answer = AnswerState::Idle;
        self.lifelines = Lifelines::default();
        self.hidden.clear();
        self.confirm_swap = false;
        self.friend_message = None;
        self.loading = None;
        self.load_error = None;
        self.phase = Phase::Title;
    }

    pub fn has_won(&self) -> bool {
        self.phase == Phase::Won
    }

    pub fn is_option_hidden(&self, index: usize) -> bool {
        self.hidden.contains(&index)
    }

    /// The guard view over the current state. The swap prompt is the
    /// only modal overlay; the friend panel does not block actions.
    pub fn action_view(&self) -> ActionView<'_> {
        ActionView {
            has_question: self.question.is_some(),
            answer_idle: self.answer.is_idle(),
            loading: self.loading.is_some(),
            load_failed: self.load_error.is_some(),
            prompt_open: self.confirm_swap,
            hidden: &self.hidden,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> GameSession {
        GameSession::with_rng(TimingConfig::default(), StdRng::seed_from_u64(1))
    }

    #[test]
    fn new_session_sits_on_the_title_screen() {
        let s = fresh();
        assert_eq!(s.phase, Phase::Title);
        assert_eq!(s.level, 1);
        assert!(s.question.is_none());
        assert!(s.answer.is_idle());
        assert_eq!(s.lifelines, Lifelines::default());
        assert!(s.hidden.is_empty());
        assert!(s.loading.is_none());
        assert!(!s.has_won());
    }

    #[test]
    fn reset_run_restores_the_title_state() {
        let mut s = fresh();
        s.level = 9;
        s.selected = Some(2);
        s.answer = AnswerState::Checking { ticks_left: 5 };
        s.lifelines.fifty_fifty = true;
        s.hidden = vec![0, 3];
        s.confirm_swap = true;
        s.friend_message = Some("go with B".into());
        s.loading = Some(LoadKind::Advice);
        s.load_error = Some("boom".into());
        s.phase = Phase::Playing;
        s.tick = 400;

        s.reset_run();

        assert_eq!(s.phase, Phase::Title);
        assert_eq!(s.level, 1);
        assert!(s.selected.is_none());
        assert!(s.answer.is_idle());
        assert_eq!(s.lifelines, Lifelines::default());
        assert!(s.hidden.is_empty());
        assert!(!s.confirm_swap);
        assert!(s.friend_message.is_none());
        assert!(s.loading.is_none());
        assert!(s.load_error.is_none());
        assert_eq!(s.tick, 400, "tick counter survives a reset");
    }

    #[test]
    fn hidden_lookup() {
        let mut s = fresh();
        s.hidden = vec![1, 3];
        assert!(!s.is_option_hidden(0));
        assert!(s.is_option_hidden(1));
        assert!(!s.is_option_hidden(2));
        assert!(s.is_option_hidden(3));
    }
}
