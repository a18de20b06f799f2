/// State transitions for the quiz session.
///
/// Every operation takes `&mut GameSession` plus its input and returns
/// the events it produced. A request that is not legal in the current
/// state mutates nothing and returns no events, so callers never need
/// to pre-validate.
///
/// The engine never performs I/O. Fetches are requested through
/// `QuestionRequested` / `AdviceRequested` events and their results
/// come back through `apply_fetch`; the session's `loading` field is
/// the gate that keeps at most one fetch meaningful at a time.

use crate::domain::{ladder, rules};
use crate::provider::FetchOutcome;

use super::event::{GameEvent, Lifeline};
use super::session::{AnswerState, GameSession, LoadKind, Phase};

/// Start a run from the title screen or an end screen.
pub fn begin_game(s: &mut GameSession) -> Vec<GameEvent> {
    match s.phase {
        Phase::Title | Phase::Lost | Phase::Won => {}
        _ => return vec![],
    }
    s.reset_run();
    s.phase = Phase::Loading;
    s.loading = Some(LoadKind::Question);
    vec![
        GameEvent::GameStarted,
        GameEvent::QuestionRequested { level: s.level },
    ]
}

/// Abandon the run and return to the title screen. The caller must
/// also invalidate the fetcher so an in-flight result cannot land in
/// the fresh session.
pub fn reset_game(s: &mut GameSession) -> Vec<GameEvent> {
    if s.phase == Phase::Title {
        return vec![];
    }
    s.reset_run();
    vec![]
}

/// Lock in option `index` and start the checking hold.
pub fn submit_answer(s: &mut GameSession, index: usize) -> Vec<GameEvent> {
    if s.phase != Phase::Playing {
        return vec![];
    }
    if !rules::may_submit(&s.action_view(), index) {
        return vec![];
    }
    s.selected = Some(index);
    s.answer = AnswerState::Checking {
        ticks_left: s.timing.lock_in_ticks,
    };
    vec![GameEvent::AnswerLockedIn { index }]
}

/// Remove two wrong options. Single use per run.
pub fn use_fifty_fifty(s: &mut GameSession) -> Vec<GameEvent> {
    if s.phase != Phase::Playing {
        return vec![];
    }
    if !rules::may_use_lifeline(&s.action_view(), s.lifelines.fifty_fifty) {
        return vec![];
    }
    let correct = match &s.question {
        Some(q) => q.correct_index,
        None => return vec![],
    };
    let hides = rules::fifty_fifty_hides(correct, &mut s.rng);
    s.hidden = hides.to_vec();
    s.lifelines.fifty_fifty = true;
    vec![GameEvent::LifelineUsed {
        which: Lifeline::FiftyFifty,
    }]
}

/// Ask the friend for advice. Single use per run. The advice fetch
/// is gating like a question fetch but its arrival never fails.
pub fn use_call_friend(s: &mut GameSession) -> Vec<GameEvent> {
    if s.phase != Phase::Playing {
        return vec![];
    }
    if !rules::may_use_lifeline(&s.action_view(), s.lifelines.call_friend) {
        return vec![];
    }
    s.lifelines.call_friend = true;
    s.loading = Some(LoadKind::Advice);
    vec![
        GameEvent::LifelineUsed {
            which: Lifeline::CallFriend,
        },
        GameEvent::AdviceRequested,
    ]
}

/// Open the swap confirmation prompt. The lifeline is not spent until
/// the player confirms.
pub fn request_change_question(s: &mut GameSession) -> Vec<GameEvent> {
    if s.phase != Phase::Playing {
        return vec![];
    }
    if !rules::may_use_lifeline(&s.action_view(), s.lifelines.change_question) {
        return vec![];
    }
    s.confirm_swap = true;
    vec![]
}

/// Spend the swap lifeline: fetch a replacement at the same level.
pub fn confirm_change_question(s: &mut GameSession) -> Vec<GameEvent> {
    if s.phase != Phase::Playing || !s.confirm_swap {
        return vec![];
    }
    s.confirm_swap = false;
    s.lifelines.change_question = true;
    s.loading = Some(LoadKind::Question);
    vec![
        GameEvent::LifelineUsed {
            which: Lifeline::ChangeQuestion,
        },
        GameEvent::QuestionRequested { level: s.level },
    ]
}

/// Close the swap prompt without spending the lifeline.
pub fn cancel_change_question(s: &mut GameSession) -> Vec<GameEvent> {
    if !s.confirm_swap {
        return vec![];
    }
    s.confirm_swap = false;
    vec![]
}

/// Close the friend panel.
pub fn dismiss_advice(s: &mut GameSession) -> Vec<GameEvent> {
    if s.friend_message.is_none() {
        return vec![];
    }
    s.friend_message = None;
    vec![]
}

/// Retry the question fetch after a failure. Only legal while the
/// failure banner is showing.
pub fn retry_load(s: &mut GameSession) -> Vec<GameEvent> {
    match s.phase {
        Phase::Loading | Phase::Playing => {}
        _ => return vec![],
    }
    if s.loading.is_some() || s.load_error.is_none() {
        return vec![];
    }
    s.load_error = None;
    s.loading = Some(LoadKind::Question);
    vec![GameEvent::QuestionRequested { level: s.level }]
}

/// Advance the clock one tick. The hold countdowns only run while
/// playing; the frame counter always runs.
pub fn tick(s: &mut GameSession) -> Vec<GameEvent> {
    s.tick = s.tick.wrapping_add(1);
    if s.phase != Phase::Playing {
        return vec![];
    }
    match s.answer {
        AnswerState::Idle => vec![],
        AnswerState::Checking { ticks_left } => {
            if ticks_left > 1 {
                s.answer = AnswerState::Checking {
                    ticks_left: ticks_left - 1,
                };
                vec![]
            } else {
                resolve_answer(s)
            }
        }
        AnswerState::Correct { ticks_left } => {
            if ticks_left > 1 {
                s.answer = AnswerState::Correct {
                    ticks_left: ticks_left - 1,
                };
                vec![]
            } else {
                advance_or_win(s)
            }
        }
        AnswerState::Wrong { ticks_left } => {
            if ticks_left > 1 {
                s.answer = AnswerState::Wrong {
                    ticks_left: ticks_left - 1,
                };
                vec![]
            } else {
                conclude_loss(s)
            }
        }
    }
}

/// Deliver a fetch result. Results that arrive when nothing is being
/// waited for (after a reset, or of the wrong kind) are dropped.
pub fn apply_fetch(s: &mut GameSession, outcome: FetchOutcome) -> Vec<GameEvent> {
    let kind = match s.loading {
        Some(k) => k,
        None => return vec![],
    };
    match (kind, outcome) {
        (LoadKind::Question, FetchOutcome::Question(Ok(question))) => {
            s.loading = None;
            s.load_error = None;
            s.question = Some(question);
            s.hidden.clear();
            s.selected = None;
            s.answer = AnswerState::Idle;
            s.friend_message = None;
            s.confirm_swap = false;
            s.phase = Phase::Playing;
            vec![GameEvent::QuestionLoaded { level: s.level }]
        }
        (LoadKind::Question, FetchOutcome::Question(Err(err))) => {
            s.loading = None;
            s.load_error = Some(err.to_string());
            vec![GameEvent::QuestionFailed]
        }
        (LoadKind::Advice, FetchOutcome::Advice(text)) => {
            s.loading = None;
            s.friend_message = Some(text);
            vec![GameEvent::AdviceArrived]
        }
        _ => vec![],
    }
}

// ── Hold expiries ──

fn resolve_answer(s: &mut GameSession) -> Vec<GameEvent> {
    let correct = match (&s.question, s.selected) {
        (Some(q), Some(i)) => i == q.correct_index,
        _ => false,
    };
    if correct {
        s.answer = AnswerState::Correct {
            ticks_left: s.timing.reveal_hold_ticks,
        };
        vec![GameEvent::AnswerRevealed { correct: true }]
    } else {
        s.answer = AnswerState::Wrong {
            ticks_left: s.timing.wrong_hold_ticks,
        };
        vec![GameEvent::AnswerRevealed { correct: false }]
    }
}

fn advance_or_win(s: &mut GameSession) -> Vec<GameEvent> {
    if s.level >= ladder::TOP_LEVEL {
        s.phase = Phase::Won;
        return vec![GameEvent::GameWon];
    }
    s.level += 1;
    s.selected = None;
    s.answer = AnswerState::Idle;
    s.hidden.clear();
    s.loading = Some(LoadKind::Question);
    vec![
        GameEvent::LevelAdvanced { level: s.level },
        GameEvent::QuestionRequested { level: s.level },
    ]
}

fn conclude_loss(s: &mut GameSession) -> Vec<GameEvent> {
    // Question, selection and verdict stay in place for the end screen.
    s.phase = Phase::Lost;
    vec![GameEvent::GameLost {
        prize: ladder::secured_prize(s.level),
    }]
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimingConfig;
    use crate::domain::question::Question;
    use crate::provider::ProviderError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Two-tick holds keep the countdown walks short.
    fn quick_timing() -> TimingConfig {
        TimingConfig {
            tick_rate_ms: 10,
            lock_in_ticks: 2,
            reveal_hold_ticks: 2,
            wrong_hold_ticks: 2,
        }
    }

    fn question(level: u8, correct: usize) -> Question {
        Question {
            id: format!("t-{level}"),
            prompt: format!("Question for tier {level}?"),
            options: vec![
                "Alpha".into(),
                "Beta".into(),
                "Gamma".into(),
                "Delta".into(),
            ],
            correct_index: correct,
            explanation: "Because.".into(),
            level,
        }
    }

    fn session() -> GameSession {
        GameSession::with_rng(quick_timing(), StdRng::seed_from_u64(99))
    }

    /// A session mid-run with one question installed.
    fn playing(correct: usize) -> GameSession {
        let mut s = session();
        begin_game(&mut s);
        apply_fetch(&mut s, FetchOutcome::Question(Ok(question(1, correct))));
        assert_eq!(s.phase, Phase::Playing);
        s
    }

    fn tick_n(s: &mut GameSession, n: u32) -> Vec<GameEvent> {
        let mut out = vec![];
        for _ in 0..n {
            out.extend(tick(s));
        }
        out
    }

    // ── Run lifecycle ──

    #[test]
    fn begin_game_requests_the_first_question() {
        let mut s = session();
        let events = begin_game(&mut s);
        assert_eq!(
            events,
            vec![
                GameEvent::GameStarted,
                GameEvent::QuestionRequested { level: 1 }
            ]
        );
        assert_eq!(s.phase, Phase::Loading);
        assert_eq!(s.loading, Some(LoadKind::Question));
    }

    #[test]
    fn begin_game_is_inert_while_already_loading() {
        let mut s = session();
        begin_game(&mut s);
        assert!(begin_game(&mut s).is_empty());
        assert_eq!(s.phase, Phase::Loading);
    }

    #[test]
    fn installing_a_question_opens_play() {
        let mut s = session();
        begin_game(&mut s);
        let events = apply_fetch(&mut s, FetchOutcome::Question(Ok(question(1, 0))));
        assert_eq!(events, vec![GameEvent::QuestionLoaded { level: 1 }]);
        assert_eq!(s.phase, Phase::Playing);
        assert!(s.loading.is_none());
        assert!(s.question.is_some());
    }

    #[test]
    fn reset_returns_to_title_from_any_point() {
        let mut s = playing(0);
        submit_answer(&mut s, 0);
        assert!(reset_game(&mut s).is_empty());
        assert_eq!(s.phase, Phase::Title);
        assert!(s.question.is_none());
        assert_eq!(s.level, 1);
    }

    // ── Answering ──

    #[test]
    fn correct_answer_advances_and_requests_the_next_question() {
        let mut s = playing(2);
        let events = submit_answer(&mut s, 2);
        assert_eq!(events, vec![GameEvent::AnswerLockedIn { index: 2 }]);

        let events = tick_n(&mut s, 2);
        assert_eq!(events, vec![GameEvent::AnswerRevealed { correct: true }]);
        assert!(matches!(s.answer, AnswerState::Correct { .. }));

        let events = tick_n(&mut s, 2);
        assert_eq!(
            events,
            vec![
                GameEvent::LevelAdvanced { level: 2 },
                GameEvent::QuestionRequested { level: 2 }
            ]
        );
        assert_eq!(s.level, 2);
        assert!(s.answer.is_idle());
        assert_eq!(s.loading, Some(LoadKind::Question));
    }

    #[test]
    fn wrong_answer_at_level_one_loses_everything() {
        let mut s = playing(2);
        submit_answer(&mut s, 0);
        let events = tick_n(&mut s, 4);
        assert!(events.contains(&GameEvent::AnswerRevealed { correct: false }));
        assert!(events.contains(&GameEvent::GameLost { prize: "0" }));
        assert_eq!(s.phase, Phase::Lost);
        assert!(s.question.is_some(), "end screen still shows the reveal");
    }

    #[test]
    fn wrong_answer_keeps_the_previous_tier() {
        let mut s = playing(1);
        s.level = 7;
        submit_answer(&mut s, 3);
        let events = tick_n(&mut s, 4);
        assert!(events.contains(&GameEvent::GameLost { prize: "2,000" }));
    }

    #[test]
    fn correct_answer_on_the_final_level_wins() {
        let mut s = playing(0);
        s.level = 15;
        submit_answer(&mut s, 0);
        let events = tick_n(&mut s, 4);
        assert!(events.contains(&GameEvent::GameWon));
        assert_eq!(s.phase, Phase::Won);
        assert!(s.has_won());
    }

    #[test]
    fn submissions_are_ignored_while_checking() {
        let mut s = playing(0);
        submit_answer(&mut s, 1);
        assert!(submit_answer(&mut s, 0).is_empty());
        assert_eq!(s.selected, Some(1));
    }

    #[test]
    fn hold_countdowns_freeze_outside_play() {
        let mut s = playing(0);
        submit_answer(&mut s, 0);
        s.phase = Phase::Lost;
        let before = s.answer;
        assert!(tick_n(&mut s, 10).is_empty());
        assert_eq!(s.answer, before);
    }

    // ── Fifty-fifty ──

    #[test]
    fn fifty_fifty_hides_two_wrong_options_once() {
        let mut s = playing(1);
        let events = use_fifty_fifty(&mut s);
        assert_eq!(
            events,
            vec![GameEvent::LifelineUsed {
                which: Lifeline::FiftyFifty
            }]
        );
        assert_eq!(s.hidden.len(), 2);
        assert!(!s.hidden.contains(&1));
        assert!(s.lifelines.fifty_fifty);

        let hidden = s.hidden.clone();
        assert!(use_fifty_fifty(&mut s).is_empty());
        assert_eq!(s.hidden, hidden);
    }

    #[test]
    fn hidden_options_cannot_be_submitted() {
        let mut s = playing(1);
        use_fifty_fifty(&mut s);
        let hidden = s.hidden[0];
        assert!(submit_answer(&mut s, hidden).is_empty());
        assert!(s.answer.is_idle());
    }

    // ── Call a friend ──

    #[test]
    fn call_friend_gates_play_until_the_advice_lands() {
        let mut s = playing(0);
        let events = use_call_friend(&mut s);
        assert_eq!(
            events,
            vec![
                GameEvent::LifelineUsed {
                    which: Lifeline::CallFriend
                },
                GameEvent::AdviceRequested
            ]
        );
        assert_eq!(s.loading, Some(LoadKind::Advice));
        assert!(submit_answer(&mut s, 0).is_empty());

        let events = apply_fetch(&mut s, FetchOutcome::Advice("go with A".into()));
        assert_eq!(events, vec![GameEvent::AdviceArrived]);
        assert_eq!(s.friend_message.as_deref(), Some("go with A"));
        assert!(s.loading.is_none());
    }

    #[test]
    fn the_friend_panel_does_not_block_answering() {
        let mut s = playing(0);
        use_call_friend(&mut s);
        apply_fetch(&mut s, FetchOutcome::Advice("hmm".into()));
        let events = submit_answer(&mut s, 0);
        assert_eq!(events, vec![GameEvent::AnswerLockedIn { index: 0 }]);
        tick_n(&mut s, 2);
        assert_eq!(
            s.friend_message.as_deref(),
            Some("hmm"),
            "the panel stays up through the reveal"
        );
    }

    #[test]
    fn the_advice_survives_until_the_next_question() {
        let mut s = playing(2);
        use_call_friend(&mut s);
        apply_fetch(&mut s, FetchOutcome::Advice("second one".into()));
        submit_answer(&mut s, 2);
        tick_n(&mut s, 4);
        assert_eq!(s.level, 2);
        assert!(s.friend_message.is_some());

        apply_fetch(&mut s, FetchOutcome::Question(Ok(question(2, 0))));
        assert!(s.friend_message.is_none(), "a fresh question clears it");
    }

    #[test]
    fn calling_twice_is_inert() {
        let mut s = playing(0);
        use_call_friend(&mut s);
        apply_fetch(&mut s, FetchOutcome::Advice("hmm".into()));
        dismiss_advice(&mut s);
        assert!(use_call_friend(&mut s).is_empty());
        assert!(s.loading.is_none());
    }

    // ── Change question ──

    #[test]
    fn change_question_swaps_at_the_same_level_and_clears_hints() {
        let mut s = playing(1);
        use_fifty_fifty(&mut s);
        assert!(!s.hidden.is_empty());

        assert!(request_change_question(&mut s).is_empty());
        assert!(s.confirm_swap);
        assert!(submit_answer(&mut s, 1).is_empty(), "prompt is modal");

        let events = confirm_change_question(&mut s);
        assert_eq!(
            events,
            vec![
                GameEvent::LifelineUsed {
                    which: Lifeline::ChangeQuestion
                },
                GameEvent::QuestionRequested { level: 1 }
            ]
        );
        assert!(s.lifelines.change_question);
        assert_eq!(s.loading, Some(LoadKind::Question));

        apply_fetch(&mut s, FetchOutcome::Question(Ok(question(1, 3))));
        assert!(s.hidden.is_empty(), "a fresh question starts unhinted");
        assert_eq!(s.level, 1);
    }

    #[test]
    fn cancelling_keeps_the_lifeline() {
        let mut s = playing(0);
        request_change_question(&mut s);
        assert!(cancel_change_question(&mut s).is_empty());
        assert!(!s.confirm_swap);
        assert!(!s.lifelines.change_question);
        request_change_question(&mut s);
        assert!(s.confirm_swap, "still available after cancelling");
    }

    #[test]
    fn confirming_without_a_prompt_is_inert() {
        let mut s = playing(0);
        assert!(confirm_change_question(&mut s).is_empty());
        assert!(!s.lifelines.change_question);
    }

    // ── Fetch plumbing ──

    #[test]
    fn results_nobody_waits_for_are_dropped() {
        let mut s = playing(0);
        let before = s.question.clone();
        let events = apply_fetch(&mut s, FetchOutcome::Question(Ok(question(9, 0))));
        assert!(events.is_empty());
        assert_eq!(
            s.question.as_ref().map(|q| q.id.clone()),
            before.map(|q| q.id)
        );
    }

    #[test]
    fn a_failed_load_can_be_retried() {
        let mut s = session();
        begin_game(&mut s);
        let events = apply_fetch(
            &mut s,
            FetchOutcome::Question(Err(ProviderError::EmptyResponse)),
        );
        assert_eq!(events, vec![GameEvent::QuestionFailed]);
        assert!(s.load_error.is_some());
        assert!(s.loading.is_none());
        assert_eq!(s.phase, Phase::Loading, "no silent retry");

        let events = retry_load(&mut s);
        assert_eq!(events, vec![GameEvent::QuestionRequested { level: 1 }]);
        assert!(s.load_error.is_none());
        assert_eq!(s.loading, Some(LoadKind::Question));

        apply_fetch(&mut s, FetchOutcome::Question(Ok(question(1, 0))));
        assert_eq!(s.phase, Phase::Playing);
    }

    #[test]
    fn retry_is_inert_without_a_failure() {
        let mut s = playing(0);
        assert!(retry_load(&mut s).is_empty());
        assert!(s.loading.is_none());
    }

    #[test]
    fn the_error_card_blocks_play_on_the_stale_question() {
        // Advance off level 1, then fail the fetch for level 2. The
        // level-1 question is still installed but no longer on screen.
        let mut s = playing(2);
        submit_answer(&mut s, 2);
        tick_n(&mut s, 4);
        assert_eq!(s.level, 2);
        apply_fetch(
            &mut s,
            FetchOutcome::Question(Err(ProviderError::EmptyResponse)),
        );
        assert_eq!(s.phase, Phase::Playing);
        assert!(s.load_error.is_some());
        assert!(s.question.is_some());

        assert!(submit_answer(&mut s, 3).is_empty());
        assert!(s.answer.is_idle());
        assert!(s.selected.is_none());
        assert!(use_fifty_fifty(&mut s).is_empty());
        assert!(use_call_friend(&mut s).is_empty());
        assert!(request_change_question(&mut s).is_empty());
        assert_eq!(s.phase, Phase::Playing, "no blind loss");

        let events = retry_load(&mut s);
        assert_eq!(events, vec![GameEvent::QuestionRequested { level: 2 }]);
        apply_fetch(&mut s, FetchOutcome::Question(Ok(question(2, 0))));
        assert_eq!(submit_answer(&mut s, 0), vec![GameEvent::AnswerLockedIn { index: 0 }]);
    }

    #[test]
    fn the_frame_counter_runs_on_every_screen() {
        let mut s = session();
        let before = s.tick;
        tick_n(&mut s, 3);
        assert_eq!(s.tick, before + 3);
    }

    // ── Full runs ──

    #[test]
    fn a_full_run_climbs_all_fifteen_tiers() {
        let mut s = session();
        begin_game(&mut s);
        for level in 1..=15u8 {
            apply_fetch(&mut s, FetchOutcome::Question(Ok(question(level, 2))));
            assert_eq!(s.phase, Phase::Playing);
            assert_eq!(s.level, level);
            submit_answer(&mut s, 2);
            tick_n(&mut s, 4);
        }
        assert_eq!(s.phase, Phase::Won);
        assert!(s.loading.is_none());
    }

    #[test]
    fn a_new_run_after_a_loss_starts_clean() {
        use crate::quiz::session::Lifelines;

        let mut s = playing(1);
        s.level = 9;
        use_fifty_fifty(&mut s);
        let wrong = (0..4).find(|&i| i != 1 && !s.is_option_hidden(i)).unwrap();
        submit_answer(&mut s, wrong);
        tick_n(&mut s, 4);
        assert_eq!(s.phase, Phase::Lost);

        let events = begin_game(&mut s);
        assert!(events.contains(&GameEvent::GameStarted));
        assert_eq!(s.level, 1);
        assert_eq!(s.lifelines, Lifelines::default());
        assert!(s.hidden.is_empty());
        assert!(s.question.is_none());
    }
}
