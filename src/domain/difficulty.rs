/// Difficulty tiers.
///
/// The tier is a pure function of the round number and controls the
/// per-round time budget and how much of the portrait is obscured.
///
/// ┌──────────┬────────┬─────────┬───────┐
/// │ Rounds   │ Tier   │ Seconds │ Hints │
/// ├──────────┼────────┼─────────┼───────┤
/// │ 1 – 5    │ Easy   │ 30      │ 3     │
/// │ 6 – 10   │ Medium │ 25      │ 2     │
/// │ 11+      │ Hard   │ 20      │ 1     │
/// └──────────┴────────┴─────────┴───────┘

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Tier for a 1-based round number. Round 0 never occurs but maps to Easy.
    pub fn for_round(round: u32) -> Self {
        match round {
            0..=5 => Difficulty::Easy,
            6..=10 => Difficulty::Medium,
            _ => Difficulty::Hard,
        }
    }

    /// Countdown budget for one round, in seconds.
    pub fn round_seconds(self) -> u32 {
        match self {
            Difficulty::Easy => 30,
            Difficulty::Medium => 25,
            Difficulty::Hard => 20,
        }
    }

    /// How many textual hints the obscured portrait shows.
    pub fn hint_count(self) -> usize {
        match self {
            Difficulty::Easy => 3,
            Difficulty::Medium => 2,
            Difficulty::Hard => 1,
        }
    }

    /// Fraction of the portrait block covered by noise (0.0 – 1.0).
    pub fn obscurity(self) -> f32 {
        match self {
            Difficulty::Easy => 0.35,
            Difficulty::Medium => 0.6,
            Difficulty::Hard => 0.85,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries() {
        assert_eq!(Difficulty::for_round(1), Difficulty::Easy);
        assert_eq!(Difficulty::for_round(5), Difficulty::Easy);
        assert_eq!(Difficulty::for_round(6), Difficulty::Medium);
        assert_eq!(Difficulty::for_round(10), Difficulty::Medium);
        assert_eq!(Difficulty::for_round(11), Difficulty::Hard);
        assert_eq!(Difficulty::for_round(250), Difficulty::Hard);
    }

    #[test]
    fn seconds_per_tier() {
        assert_eq!(Difficulty::Easy.round_seconds(), 30);
        assert_eq!(Difficulty::Medium.round_seconds(), 25);
        assert_eq!(Difficulty::Hard.round_seconds(), 20);
    }

    #[test]
    fn harder_tiers_hide_more() {
        assert!(Difficulty::Easy.hint_count() > Difficulty::Medium.hint_count());
        assert!(Difficulty::Medium.hint_count() > Difficulty::Hard.hint_count());
        assert!(Difficulty::Easy.obscurity() < Difficulty::Hard.obscurity());
    }
}
