/// Action guards, difficulty banding and the fifty-fifty pick.
///
/// Pure functions over a borrowed view of the session, no side
/// effects. These encode "what is legal right now" without performing
/// the action; the engine consults them and the UI may mirror them
/// for greying out controls, but the engine is the authority.
///
/// ## Answer Submission Truth Table
///
/// ┌───────────────────────────┬────────┬──────────────────┐
/// │ Condition                  │ Allow? │ Notes            │
/// ├───────────────────────────┼────────┼──────────────────┤
/// │ No question loaded         │ DENY   │ nothing to answer│
/// │ Answer not idle            │ DENY   │ already locked in│
/// │ Acquisition in flight      │ DENY   │ loading gate     │
/// │ Failed fetch on screen     │ DENY   │ error card shown │
/// │ Swap prompt open           │ DENY   │ modal            │
/// │ Index >= 4                 │ DENY   │ out of range     │
/// │ Index hidden by fifty-fifty│ DENY   │ removed option   │
/// │ Otherwise                  │ ALLOW  │                  │
/// └───────────────────────────┴────────┴──────────────────┘
///
/// ## Lifeline Truth Table
///
/// ┌───────────────────────────┬────────┬──────────────────┐
/// │ Condition                  │ Allow? │ Notes            │
/// ├───────────────────────────┼────────┼──────────────────┤
/// │ Already used this game     │ DENY   │ single use       │
/// │ No question loaded         │ DENY   │                  │
/// │ Answer not idle            │ DENY   │ too late         │
/// │ Acquisition in flight      │ DENY   │ loading gate     │
/// │ Failed fetch on screen     │ DENY   │ error card shown │
/// │ Swap prompt open           │ DENY   │ modal            │
/// │ Otherwise                  │ ALLOW  │                  │
/// └───────────────────────────┴────────┴──────────────────┘
///
/// ## Difficulty Banding
///
/// ┌────────────┬────────┐
/// │ Level       │ Band   │
/// ├────────────┼────────┤
/// │ 1 - 5       │ Easy   │
/// │ 6 - 10      │ Medium │
/// │ 11 - 15     │ Hard   │
/// └────────────┴────────┘

use rand::seq::SliceRandom;
use rand::Rng;

use super::question::{Band, OPTION_COUNT};

/// Immutable view of the session fields the guards need.
pub struct ActionView<'a> {
    pub has_question: bool,
    pub answer_idle: bool,
    pub loading: bool,
    /// A question fetch failed and the error card is on screen. Any
    /// question still held is stale and not being shown.
    pub load_failed: bool,
    pub prompt_open: bool,
    pub hidden: &'a [usize],
}

impl<'a> ActionView<'a> {
    /// Shared preconditions for submitting and for every lifeline.
    fn interactive(&self) -> bool {
        self.has_question
            && self.answer_idle
            && !self.loading
            && !self.load_failed
            && !self.prompt_open
    }
}

/// May the player lock in option `index`? See truth table above.
pub fn may_submit(view: &ActionView, index: usize) -> bool {
    if !view.interactive() { return false; }
    if index >= OPTION_COUNT { return false; }
    !view.hidden.contains(&index)
}

/// May the player activate a lifeline whose used-flag is `already_used`?
pub fn may_use_lifeline(view: &ActionView, already_used: bool) -> bool {
    !already_used && view.interactive()
}

/// Band for a level. Levels outside 1-15 clamp to the outer bands.
pub fn band_for_level(level: u8) -> Band {
    match level {
        0..=5 => Band::Easy,
        6..=10 => Band::Medium,
        _ => Band::Hard,
    }
}

/// Pick the two options the fifty-fifty lifeline removes: two of the
/// three incorrect indices, chosen uniformly, never the correct one.
/// Returned sorted ascending.
pub fn fifty_fifty_hides<R: Rng>(correct_index: usize, rng: &mut R) -> [usize; 2] {
    let wrongs: Vec<usize> = (0..OPTION_COUNT).filter(|&i| i != correct_index).collect();
    let mut picked: Vec<usize> = wrongs.choose_multiple(rng, 2).copied().collect();
    picked.sort_unstable();
    [picked[0], picked[1]]
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Helper: a view in the fully-interactive state.
    fn open_view() -> ActionView<'static> {
        ActionView {
            has_question: true,
            answer_idle: true,
            loading: false,
            load_failed: false,
            prompt_open: false,
            hidden: &[],
        }
    }

    // ── Submission guards ──

    #[test]
    fn submit_allowed_when_idle() {
        let v = open_view();
        for i in 0..4 {
            assert!(may_submit(&v, i));
        }
    }

    #[test]
    fn submit_denied_out_of_range() {
        let v = open_view();
        assert!(!may_submit(&v, 4));
        assert!(!may_submit(&v, 99));
    }

    #[test]
    fn submit_denied_for_hidden_option() {
        let mut v = open_view();
        v.hidden = &[0, 2];
        assert!(!may_submit(&v, 0));
        assert!(may_submit(&v, 1));
        assert!(!may_submit(&v, 2));
        assert!(may_submit(&v, 3));
    }

    #[test]
    fn submit_denied_while_locked_in() {
        let mut v = open_view();
        v.answer_idle = false;
        assert!(!may_submit(&v, 0));
    }

    #[test]
    fn submit_denied_while_loading() {
        let mut v = open_view();
        v.loading = true;
        assert!(!may_submit(&v, 0));
    }

    #[test]
    fn submit_denied_after_a_failed_fetch() {
        let mut v = open_view();
        v.load_failed = true;
        assert!(!may_submit(&v, 0));
    }

    #[test]
    fn submit_denied_without_question() {
        let mut v = open_view();
        v.has_question = false;
        assert!(!may_submit(&v, 0));
    }

    #[test]
    fn submit_denied_while_prompt_open() {
        let mut v = open_view();
        v.prompt_open = true;
        assert!(!may_submit(&v, 0));
    }

    // ── Lifeline guards ──

    #[test]
    fn lifeline_single_use() {
        let v = open_view();
        assert!(may_use_lifeline(&v, false));
        assert!(!may_use_lifeline(&v, true));
    }

    #[test]
    fn lifeline_denied_outside_idle() {
        let mut v = open_view();
        v.answer_idle = false;
        assert!(!may_use_lifeline(&v, false));

        let mut v = open_view();
        v.loading = true;
        assert!(!may_use_lifeline(&v, false));

        let mut v = open_view();
        v.load_failed = true;
        assert!(!may_use_lifeline(&v, false));

        let mut v = open_view();
        v.prompt_open = true;
        assert!(!may_use_lifeline(&v, false));
    }

    // ── Banding ──

    #[test]
    fn band_boundaries() {
        assert_eq!(band_for_level(1), Band::Easy);
        assert_eq!(band_for_level(5), Band::Easy);
        assert_eq!(band_for_level(6), Band::Medium);
        assert_eq!(band_for_level(10), Band::Medium);
        assert_eq!(band_for_level(11), Band::Hard);
        assert_eq!(band_for_level(15), Band::Hard);
    }

    // ── Fifty-fifty pick ──

    #[test]
    fn fifty_fifty_never_hides_correct() {
        let mut rng = StdRng::seed_from_u64(7);
        for correct in 0..4 {
            for _ in 0..200 {
                let [a, b] = fifty_fifty_hides(correct, &mut rng);
                assert_ne!(a, correct);
                assert_ne!(b, correct);
                assert!(a < b, "sorted, distinct");
                assert!(b < 4);
            }
        }
    }

    #[test]
    fn fifty_fifty_reaches_every_pair() {
        // With correct=1 the candidate pairs are {0,2} {0,3} {2,3}.
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..300 {
            seen.insert(fifty_fifty_hides(1, &mut rng));
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn fifty_fifty_deterministic_per_seed() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        for correct in 0..4 {
            assert_eq!(fifty_fifty_hides(correct, &mut a), fifty_fifty_hides(correct, &mut b));
        }
    }
}
