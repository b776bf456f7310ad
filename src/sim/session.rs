/// Session: the complete record of a running game.
///
/// ## Ownership
///
/// Everything the round state machine reads or writes lives here, including
/// the pieces that are easy to leave out-of-band: the current streak, the
/// instant the question was asked (inside `Question`), and the timers.
/// Only `sim::step` mutates the scoring fields.
///
/// ## Phase
///
/// The phase is derived, never stored:
///
/// ┌───────────────────────────────────┬────────────┐
/// │ Condition (priority order)        │ Phase      │
/// ├───────────────────────────────────┼────────────┤
/// │ state.is_game_over                │ GameOver   │
/// │ an answer is awaiting next round  │ Revealing  │
/// │ a question is on screen           │ Playing    │
/// │ otherwise                         │ Loading    │
/// └───────────────────────────────────┴────────────┘
///
/// ## Epoch
///
/// `epoch` increments on every restart. Deferred callbacks and fetch
/// replies carry the epoch they belong to; anything older is ignored.

use rand::rngs::StdRng;

use crate::config::TimingConfig;
use crate::domain::character::Character;
use crate::domain::question::Question;
use crate::domain::state::{GameState, GameStats};
use super::clock::{RoundClock, Scheduler};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Loading,
    Playing,
    Revealing,
    GameOver,
}

/// The player's choice for the current question, kept until the next one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub selected: String,
    pub correct: bool,
}

pub struct Session {
    // ── Scoring ──
    pub state: GameState,
    pub stats: GameStats,
    pub streak: u32,

    // ── Round ──
    pub pool: Vec<Character>,
    pub question: Option<Question>,
    pub answer: Option<AnswerFeedback>,
    /// Why no question can be shown (fetch failure, insufficient pool).
    pub pool_error: Option<String>,

    // ── Timers ──
    pub clock: RoundClock,
    pub scheduler: Scheduler,
    pub answer_delay: std::time::Duration,
    pub epoch: u64,

    pub rng: StdRng,

    // ── UI ──
    pub cursor: usize,
    pub dark: bool,
    pub top_scores: Vec<u32>,
    pub anim_tick: u32,
    pub message: String,
    pub message_timer: u32,
}

impl Session {
    pub fn new(timing: &TimingConfig, rng: StdRng) -> Self {
        Session {
            state: GameState::new(),
            stats: GameStats::default(),
            streak: 0,
            pool: Vec::new(),
            question: None,
            answer: None,
            pool_error: None,
            clock: RoundClock::new(timing.tick),
            scheduler: Scheduler::new(),
            answer_delay: timing.answer_delay,
            epoch: 0,
            rng,
            cursor: 0,
            dark: true,
            top_scores: Vec::new(),
            anim_tick: 0,
            message: String::new(),
            message_timer: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.state.is_game_over {
            Phase::GameOver
        } else if self.answer.is_some() {
            Phase::Revealing
        } else if self.question.is_some() {
            Phase::Playing
        } else {
            Phase::Loading
        }
    }

    /// Name shown in option slot `slot`, if a question is up.
    pub fn option(&self, slot: usize) -> Option<&str> {
        self.question
            .as_ref()
            .and_then(|q| q.options.get(slot))
            .map(String::as_str)
    }

    /// Show a transient banner for `frames` frames (0 = until replaced).
    pub fn set_message(&mut self, msg: &str, frames: u32) {
        self.message = msg.to_string();
        self.message_timer = frames;
    }

    /// Advance per-frame presentation counters.
    pub fn tick_frame(&mut self) {
        self.anim_tick = self.anim_tick.wrapping_add(1);
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 {
                self.message.clear();
            }
        }
    }

    pub fn move_cursor(&mut self, delta: i32) {
        let n = crate::domain::question::OPTION_COUNT as i32;
        self.cursor = (self.cursor as i32 + delta).rem_euclid(n) as usize;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::question::{generate, tests::pool};
    use rand::SeedableRng;
    use std::time::Instant;

    fn session() -> Session {
        Session::new(&GameConfig::default().timing, StdRng::seed_from_u64(9))
    }

    #[test]
    fn phase_is_derived_in_priority_order() {
        let mut s = session();
        assert_eq!(s.phase(), Phase::Loading);

        let mut rng = StdRng::seed_from_u64(1);
        s.question = Some(generate(&pool(6), &mut rng, Instant::now()).unwrap());
        assert_eq!(s.phase(), Phase::Playing);

        s.answer = Some(AnswerFeedback { selected: "x".into(), correct: false });
        assert_eq!(s.phase(), Phase::Revealing);

        s.state.is_game_over = true;
        assert_eq!(s.phase(), Phase::GameOver);
    }

    #[test]
    fn cursor_wraps() {
        let mut s = session();
        s.move_cursor(-1);
        assert_eq!(s.cursor, 3);
        s.move_cursor(2);
        assert_eq!(s.cursor, 1);
    }

    #[test]
    fn message_expires() {
        let mut s = session();
        s.set_message("Time's up!", 2);
        s.tick_frame();
        assert_eq!(s.message, "Time's up!");
        s.tick_frame();
        assert!(s.message.is_empty());
    }
}
