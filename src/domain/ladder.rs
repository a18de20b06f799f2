/// The prize ladder: fifteen fixed tiers, one per level.
/// All prize math is centralized here so the engine and the
/// renderer never index the table directly.

/// Prize values, index = level - 1. Formatted for display.
pub const PRIZES: [&str; 15] = [
    "100",
    "200",
    "300",
    "500",
    "1,000",
    "2,000",
    "4,000",
    "8,000",
    "16,000",
    "32,000",
    "64,000",
    "125,000",
    "250,000",
    "500,000",
    "1,000,000",
];

/// The final level. Answering it correctly wins the game.
pub const TOP_LEVEL: u8 = 15;

/// Prize at stake for the given level (1-based).
pub fn prize_for_level(level: u8) -> &'static str {
    let idx = (level.clamp(1, TOP_LEVEL) - 1) as usize;
    PRIZES[idx]
}

/// Prize the player walks away with after a wrong answer at `level`.
/// The previous tier is kept; a wrong answer on level 1 pays nothing.
pub fn secured_prize(level: u8) -> &'static str {
    if level > 1 {
        PRIZES[(level.min(TOP_LEVEL) - 2) as usize]
    } else {
        "0"
    }
}

/// Milestone tiers (every fifth level), highlighted on the ladder.
/// Purely presentational: losing does not fall back to them.
pub fn is_milestone(level: u8) -> bool {
    level % 5 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(prize: &str) -> u64 {
        prize.replace(',', "").parse().unwrap()
    }

    #[test]
    fn fifteen_tiers_strictly_ascending() {
        assert_eq!(PRIZES.len(), 15);
        for pair in PRIZES.windows(2) {
            assert!(numeric(pair[0]) < numeric(pair[1]));
        }
    }

    #[test]
    fn prize_for_level_is_one_based() {
        assert_eq!(prize_for_level(1), "100");
        assert_eq!(prize_for_level(5), "1,000");
        assert_eq!(prize_for_level(15), "1,000,000");
    }

    #[test]
    fn secured_prize_is_previous_tier() {
        assert_eq!(secured_prize(1), "0");
        assert_eq!(secured_prize(2), "100");
        assert_eq!(secured_prize(8), "4,000");
        assert_eq!(secured_prize(15), "500,000");
    }

    #[test]
    fn milestones_every_fifth_level() {
        let marked: Vec<u8> = (1..=TOP_LEVEL).filter(|&l| is_milestone(l)).collect();
        assert_eq!(marked, vec![5, 10, 15]);
    }
}
