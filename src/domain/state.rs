/// Score-bearing records: the per-game state and the accumulated stats.

use super::difficulty::Difficulty;

pub const MAX_LIVES: u32 = 3;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    pub score: u32,
    pub lives: u32,
    pub current_round: u32,
    pub is_game_over: bool,
    /// Seconds left on the round countdown.
    pub time_left: u32,
    pub difficulty: Difficulty,
}

impl GameState {
    pub fn new() -> Self {
        let difficulty = Difficulty::for_round(1);
        GameState {
            score: 0,
            lives: MAX_LIVES,
            current_round: 1,
            is_game_over: false,
            time_left: difficulty.round_seconds(),
            difficulty,
        }
    }

    /// Rounds actually cleared (the current one is still in progress).
    pub fn rounds_played(&self) -> u32 {
        self.current_round.saturating_sub(1)
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GameStats {
    pub total_rounds: u32,
    pub correct_answers: u32,
    pub incorrect_answers: u32,
    pub best_streak: u32,
    /// Running mean response time in seconds.
    pub average_time: f64,
}

impl GameStats {
    /// Whole-percent accuracy; 0 before any round is scored.
    pub fn accuracy(&self) -> u32 {
        if self.total_rounds == 0 {
            return 0;
        }
        (f64::from(self.correct_answers) / f64::from(self.total_rounds) * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state() {
        let s = GameState::new();
        assert_eq!(s.score, 0);
        assert_eq!(s.lives, 3);
        assert_eq!(s.current_round, 1);
        assert!(!s.is_game_over);
        assert_eq!(s.time_left, 30);
        assert_eq!(s.difficulty, Difficulty::Easy);
        assert_eq!(s.rounds_played(), 0);
    }

    #[test]
    fn accuracy_rounds_to_whole_percent() {
        let mut st = GameStats::default();
        assert_eq!(st.accuracy(), 0);
        st.total_rounds = 3;
        st.correct_answers = 2;
        assert_eq!(st.accuracy(), 67);
        st.correct_answers = 3;
        assert_eq!(st.accuracy(), 100);
    }
}
