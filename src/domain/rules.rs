/// Scoring rules, truth-table driven.
///
/// Pure functions over `GameState` / `GameStats` / the current streak.
/// No timers, no I/O: the step layer decides *when* a rule applies, these
/// decide *what* changes.
///
/// ┌────────────────────┬──────────┬───────────┬───────┬────────┬──────────────┐
/// │ Outcome            │ Score    │ Lives     │ Round │ Streak │ Timer        │
/// ├────────────────────┼──────────┼───────────┼───────┼────────┼──────────────┤
/// │ Correct            │ +10      │ =, or 3   │ +1    │ +1     │ new tier     │
/// │                    │          │ on tier ↑ │       │        │              │
/// │ Incorrect          │ −5, ≥ 0  │ −1        │ =     │ 0      │ current tier │
/// │ Timeout            │ =        │ −1        │ =     │ 0      │ current tier │
/// └────────────────────┴──────────┴───────────┴───────┴────────┴──────────────┘
///
/// Every outcome bumps `total_rounds` and one of `correct_answers` /
/// `incorrect_answers`. Lives reaching 0 ends the game.
///
/// Response time is folded into the running mean *before* the outcome is
/// applied, so the divisor is the pre-answer `total_rounds`.

use super::difficulty::Difficulty;
use super::state::{GameState, GameStats, MAX_LIVES};

pub const CORRECT_POINTS: u32 = 10;
pub const WRONG_PENALTY: u32 = 5;

/// Fold one response latency into the running mean.
pub fn record_response_time(stats: &mut GameStats, elapsed_secs: f64) {
    let n = f64::from(stats.total_rounds);
    stats.average_time = (stats.average_time * n + elapsed_secs) / (n + 1.0);
}

/// Apply a correct answer. Returns `true` when the tier changed
/// (and lives were restored).
pub fn apply_correct(state: &mut GameState, stats: &mut GameStats, streak: &mut u32) -> bool {
    stats.correct_answers += 1;
    stats.total_rounds += 1;
    *streak += 1;
    stats.best_streak = stats.best_streak.max(*streak);

    state.score += CORRECT_POINTS;
    state.current_round += 1;

    let previous = state.difficulty;
    let next = Difficulty::for_round(state.current_round);
    state.difficulty = next;
    state.time_left = next.round_seconds();

    let tier_changed = next != previous;
    if tier_changed {
        state.lives = MAX_LIVES;
    }
    tier_changed
}

/// Apply an explicit wrong answer. Returns `true` when the game is now over.
pub fn apply_incorrect(state: &mut GameState, stats: &mut GameStats, streak: &mut u32) -> bool {
    state.score = state.score.saturating_sub(WRONG_PENALTY);
    lose_life(state, stats, streak)
}

/// Apply a countdown expiry. Score and round are untouched.
/// Returns `true` when the game is now over.
pub fn apply_timeout(state: &mut GameState, stats: &mut GameStats, streak: &mut u32) -> bool {
    lose_life(state, stats, streak)
}

fn lose_life(state: &mut GameState, stats: &mut GameStats, streak: &mut u32) -> bool {
    *streak = 0;
    stats.incorrect_answers += 1;
    stats.total_rounds += 1;

    state.lives = state.lives.saturating_sub(1);
    state.difficulty = Difficulty::for_round(state.current_round);
    state.time_left = state.difficulty.round_seconds();

    if state.lives == 0 {
        state.is_game_over = true;
    }
    state.is_game_over
}
