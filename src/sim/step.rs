/// Round state machine: every transition of a `Session`.
///
/// Entry points, all driven by the frame loop with the current instant:
///   - `start`         : request the first candidate pool
///   - `on_pool_loaded`: a fetch finished (ignored if from an old epoch)
///   - `advance`       : deliver due callbacks, then due clock ticks
///   - `submit_answer` : the player picked a name
///   - `restart`       : new epoch, initial state, fresh pool request
///
/// Ordering guarantees:
///   - Reaching game over stops the clock and cancels every pending
///     callback in the same call, so no later tick or question can land.
///   - A next-question callback re-checks game over on entry.
///   - Restart bumps the epoch; callbacks and fetch replies stamped with an
///     older epoch are discarded.

use std::time::Instant;

use crate::domain::character::Character;
use crate::domain::question;
use crate::domain::rules::{self, CORRECT_POINTS};
use crate::fetch::FetchError;
use super::clock::Deferred;
use super::event::GameEvent;
use super::session::{AnswerFeedback, Session};

/// The last few seconds of a round each emit a countdown event.
const COUNTDOWN_FROM: u32 = 5;

// ══════════════════════════════════════════════════════════════
// Lifecycle
// ══════════════════════════════════════════════════════════════

/// Ask for the initial pool. The session stays in Loading until it lands.
pub fn start(s: &mut Session) -> Vec<GameEvent> {
    vec![GameEvent::PoolRequested { epoch: s.epoch }]
}

/// Reinitialize everything except presentation preferences and the
/// cached top scores, and request a fresh pool under a new epoch.
pub fn restart(s: &mut Session) -> Vec<GameEvent> {
    s.epoch += 1;
    s.state = Default::default();
    s.stats = Default::default();
    s.streak = 0;
    s.pool.clear();
    s.question = None;
    s.answer = None;
    s.pool_error = None;
    s.cursor = 0;
    s.set_message("", 0);
    s.clock.stop();
    s.scheduler.cancel_all();

    tracing::info!(epoch = s.epoch, "game restarted");
    vec![GameEvent::PoolRequested { epoch: s.epoch }]
}

pub fn on_pool_loaded(
    s: &mut Session,
    epoch: u64,
    result: Result<Vec<Character>, FetchError>,
    now: Instant,
) -> Vec<GameEvent> {
    if epoch != s.epoch {
        tracing::debug!(stale = epoch, current = s.epoch, "ignoring pool from a previous game");
        return vec![];
    }

    let mut events = Vec::new();
    match result {
        Ok(pool) => {
            tracing::info!(size = pool.len(), "candidate pool loaded");
            s.pool = pool;
            s.pool_error = None;
            events.push(GameEvent::PoolLoaded { size: s.pool.len() });
            if s.question.is_none() {
                next_question(s, now, &mut events);
            }
        }
        Err(e) => {
            tracing::error!("Error fetching characters: {e}");
            s.pool_error = Some(format!("Could not load characters: {e}"));
            events.push(GameEvent::PoolFailed);
        }
    }
    events
}

// ══════════════════════════════════════════════════════════════
// Time
// ══════════════════════════════════════════════════════════════

pub fn advance(s: &mut Session, now: Instant) -> Vec<GameEvent> {
    let mut events = Vec::new();

    for action in s.scheduler.take_due(now, s.epoch) {
        match action {
            Deferred::NextQuestion => next_question(s, now, &mut events),
        }
    }

    let ticks = s.clock.due(now);
    for _ in 0..ticks {
        if s.state.is_game_over {
            break;
        }
        tick(s, &mut events);
    }

    events
}

/// One second of the round countdown.
fn tick(s: &mut Session, events: &mut Vec<GameEvent>) {
    if s.state.time_left > 1 {
        s.state.time_left -= 1;
        if s.state.time_left <= COUNTDOWN_FROM {
            events.push(GameEvent::Countdown { seconds_left: s.state.time_left });
        }
        return;
    }

    let over = rules::apply_timeout(&mut s.state, &mut s.stats, &mut s.streak);
    tracing::info!(
        round = s.state.current_round,
        lives = s.state.lives,
        "round timed out"
    );
    events.push(GameEvent::TimedOut);
    if over {
        finish(s, events);
    }
}

// ══════════════════════════════════════════════════════════════
// Rounds
// ══════════════════════════════════════════════════════════════

/// Draw the next question from the pool. No-op once the game is over.
pub fn next_question(s: &mut Session, now: Instant, events: &mut Vec<GameEvent>) {
    if s.state.is_game_over {
        return;
    }

    s.answer = None;
    s.cursor = 0;

    match question::generate(&s.pool, &mut s.rng, now) {
        Ok(q) => {
            tracing::debug!(round = s.state.current_round, answer = q.answer.id, "question drawn");
            s.question = Some(q);
            s.pool_error = None;
            if !s.clock.is_running() {
                s.clock.start(now);
            }
            events.push(GameEvent::QuestionShown);
        }
        Err(e) => {
            tracing::warn!("cannot draw a question: {e}");
            s.question = None;
            s.pool_error = Some(e.to_string());
            s.clock.stop();
            events.push(GameEvent::QuestionUnavailable);
        }
    }
}

/// Score the player's choice. No-op when the game is over, no question is
/// up, or the current question was already answered.
pub fn submit_answer(s: &mut Session, selected: &str, now: Instant) -> Vec<GameEvent> {
    if s.state.is_game_over || s.answer.is_some() {
        return vec![];
    }
    let Some(q) = s.question.as_ref() else {
        return vec![];
    };

    let correct = q.is_correct(selected);
    let elapsed = now.saturating_duration_since(q.asked_at).as_secs_f64();
    rules::record_response_time(&mut s.stats, elapsed);
    s.answer = Some(AnswerFeedback {
        selected: selected.to_string(),
        correct,
    });

    let mut events = Vec::new();
    if correct {
        let tier_up = rules::apply_correct(&mut s.state, &mut s.stats, &mut s.streak);
        events.push(GameEvent::Answered { correct: true, points: CORRECT_POINTS as i32 });
        if tier_up {
            tracing::info!(round = s.state.current_round, tier = s.state.difficulty.label(), "tier up");
            events.push(GameEvent::TierUp);
        }
    } else {
        let before = s.state.score;
        let over = rules::apply_incorrect(&mut s.state, &mut s.stats, &mut s.streak);
        events.push(GameEvent::Answered {
            correct: false,
            points: -((before - s.state.score) as i32),
        });
        if over {
            finish(s, &mut events);
            return events;
        }
    }

    s.clock.start(now);
    s.scheduler
        .schedule(Deferred::NextQuestion, now + s.answer_delay, s.epoch);
    events
}

/// Answer with whatever name sits in option slot `slot`.
pub fn submit_slot(s: &mut Session, slot: usize, now: Instant) -> Vec<GameEvent> {
    match s.option(slot).map(str::to_string) {
        Some(name) => submit_answer(s, &name, now),
        None => vec![],
    }
}

fn finish(s: &mut Session, events: &mut Vec<GameEvent>) {
    s.state.is_game_over = true;
    s.clock.stop();
    s.scheduler.cancel_all();
    tracing::info!(
        score = s.state.score,
        rounds = s.state.rounds_played(),
        accuracy = s.stats.accuracy(),
        "game over"
    );
    events.push(GameEvent::GameOver { score: s.state.score });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::difficulty::Difficulty;
    use crate::domain::question::tests::pool;
    use crate::sim::session::Phase;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    const SEC: Duration = Duration::from_secs(1);
    const DELAY: Duration = Duration::from_millis(1500);

    fn ready(t0: Instant) -> Session {
        let mut s = Session::new(&GameConfig::default().timing, StdRng::seed_from_u64(17));
        assert_eq!(start(&mut s), vec![GameEvent::PoolRequested { epoch: 0 }]);
        let events = on_pool_loaded(&mut s, 0, Ok(pool(12)), t0);
        assert!(events.contains(&GameEvent::QuestionShown));
        s
    }

    fn correct_name(s: &Session) -> String {
        s.question.as_ref().unwrap().answer.name.clone()
    }

    fn wrong_name(s: &Session) -> String {
        let q = s.question.as_ref().unwrap();
        q.options.iter().find(|o| **o != q.answer.name).unwrap().clone()
    }

    /// Answer, then let the reveal delay elapse. Returns the instant after.
    fn answer(s: &mut Session, correct: bool, now: Instant) -> Instant {
        let name = if correct { correct_name(s) } else { wrong_name(s) };
        submit_answer(s, &name, now);
        let after = now + DELAY;
        advance(s, after);
        after
    }

    #[test]
    fn first_correct_answer() {
        let t0 = Instant::now();
        let mut s = ready(t0);
        let name = correct_name(&s);
        let events = submit_answer(&mut s, &name, t0 + SEC / 2);
        assert_eq!(events, vec![GameEvent::Answered { correct: true, points: 10 }]);
        assert_eq!(s.state.score, 10);
        assert_eq!(s.state.current_round, 2);
        assert_eq!(s.state.difficulty, Difficulty::Easy);
        assert_eq!(s.state.lives, 3);
        assert_eq!(s.state.time_left, 30);
        assert_eq!(s.phase(), Phase::Revealing);

        let events = advance(&mut s, t0 + SEC / 2 + DELAY);
        assert!(events.contains(&GameEvent::QuestionShown));
        assert_eq!(s.phase(), Phase::Playing);
    }

    #[test]
    fn fifth_consecutive_correct_enters_medium_with_full_lives() {
        let t0 = Instant::now();
        let mut s = ready(t0);
        let mut now = answer(&mut s, false, t0);
        assert_eq!(s.state.lives, 2);

        for _ in 0..4 {
            now = answer(&mut s, true, now);
        }
        assert_eq!(s.state.current_round, 5);
        assert_eq!(s.state.lives, 2);

        let name = correct_name(&s);
        let events = submit_answer(&mut s, &name, now);
        assert!(events.contains(&GameEvent::TierUp));
        assert_eq!(s.state.current_round, 6);
        assert_eq!(s.state.difficulty, Difficulty::Medium);
        assert_eq!(s.state.time_left, 25);
        assert_eq!(s.state.lives, 3);
        assert_eq!(s.streak, 5);
        assert_eq!(s.stats.best_streak, 5);
    }

    #[test]
    fn three_wrong_answers_end_the_game() {
        let t0 = Instant::now();
        let mut s = ready(t0);
        let now = answer(&mut s, false, t0);
        let now = answer(&mut s, false, now);
        assert_eq!(s.state.lives, 1);
        assert_eq!(s.state.score, 0);
        assert!(!s.state.is_game_over);

        let name = wrong_name(&s);
        let events = submit_answer(&mut s, &name, now);
        assert_eq!(
            events,
            vec![
                GameEvent::Answered { correct: false, points: 0 },
                GameEvent::GameOver { score: 0 },
            ]
        );
        assert_eq!(s.state.lives, 0);
        assert_eq!(s.phase(), Phase::GameOver);
        assert!(!s.clock.is_running());
        assert_eq!(s.scheduler.len(), 0);

        // frozen: no ticks, no questions, no answers
        let snapshot = s.state.clone();
        assert!(advance(&mut s, now + SEC * 120).is_empty());
        let mut extra = Vec::new();
        next_question(&mut s, now, &mut extra);
        assert!(extra.is_empty());
        let name = correct_name(&s);
        assert!(submit_answer(&mut s, &name, now).is_empty());
        assert_eq!(s.state, snapshot);
    }

    #[test]
    fn wrong_answer_costs_five_points() {
        let t0 = Instant::now();
        let mut s = ready(t0);
        let now = answer(&mut s, true, t0);
        let now = answer(&mut s, true, now);
        let name = wrong_name(&s);
        let events = submit_answer(&mut s, &name, now);
        assert_eq!(events, vec![GameEvent::Answered { correct: false, points: -5 }]);
        assert_eq!(s.state.score, 15);
        assert_eq!(s.state.current_round, 3);
        assert_eq!(s.streak, 0);
        assert_eq!(s.stats.best_streak, 2);
    }

    #[test]
    fn double_submission_is_ignored() {
        let t0 = Instant::now();
        let mut s = ready(t0);
        let name = correct_name(&s);
        submit_answer(&mut s, &name, t0);
        assert!(submit_answer(&mut s, &name, t0).is_empty());
        let wrong = wrong_name(&s);
        assert!(submit_answer(&mut s, &wrong, t0).is_empty());
        assert_eq!(s.stats.total_rounds, 1);
        assert_eq!(s.state.score, 10);
    }

    #[test]
    fn answer_without_question_is_ignored() {
        let mut s = Session::new(&GameConfig::default().timing, StdRng::seed_from_u64(1));
        assert!(submit_answer(&mut s, "Rick Sanchez", Instant::now()).is_empty());
        assert!(submit_slot(&mut s, 0, Instant::now()).is_empty());
        assert_eq!(s.stats.total_rounds, 0);
    }

    #[test]
    fn submit_slot_uses_presentation_order() {
        let t0 = Instant::now();
        let mut s = ready(t0);
        let slot = s.question.as_ref().unwrap().correct_slot();
        submit_slot(&mut s, slot, t0);
        assert_eq!(s.answer.as_ref().map(|a| a.correct), Some(true));
    }

    #[test]
    fn timeout_behaves_like_a_miss_without_penalty() {
        let t0 = Instant::now();
        let mut s = ready(t0);
        let now = answer(&mut s, true, t0);
        let score = s.state.score;
        let round = s.state.current_round;
        s.streak = 1;

        s.clock.start(now);
        s.state.time_left = 1;
        let events = advance(&mut s, now + SEC);
        assert_eq!(events, vec![GameEvent::TimedOut]);
        assert_eq!(s.state.lives, 2);
        assert_eq!(s.state.score, score);
        assert_eq!(s.state.current_round, round);
        assert_eq!(s.state.difficulty, Difficulty::Easy);
        assert_eq!(s.state.time_left, 30);
        assert_eq!(s.streak, 0);
        assert_eq!(s.stats.incorrect_answers, 1);
        assert_eq!(s.stats.total_rounds, 2);
    }

    #[test]
    fn countdown_runs_once_per_second() {
        let t0 = Instant::now();
        let mut s = ready(t0);
        let events = advance(&mut s, t0 + SEC * 25);
        assert_eq!(s.state.time_left, 5);
        assert_eq!(events, vec![GameEvent::Countdown { seconds_left: 5 }]);
        let events = advance(&mut s, t0 + SEC * 29);
        assert_eq!(s.state.time_left, 1);
        assert_eq!(events.len(), 4);
        advance(&mut s, t0 + SEC * 30);
        assert_eq!(s.state.lives, 2);
        assert_eq!(s.state.time_left, 30);
    }

    #[test]
    fn timeout_on_last_life_freezes_the_clock() {
        let t0 = Instant::now();
        let mut s = ready(t0);
        s.state.lives = 1;
        s.state.time_left = 1;
        let events = advance(&mut s, t0 + SEC * 10);
        assert_eq!(events, vec![GameEvent::TimedOut, GameEvent::GameOver { score: 0 }]);
        assert!(s.state.is_game_over);
        assert_eq!(s.state.lives, 0);
        assert!(!s.clock.is_running());
        assert!(advance(&mut s, t0 + SEC * 100).is_empty());
    }

    #[test]
    fn pending_next_question_dies_with_the_game() {
        let t0 = Instant::now();
        let mut s = ready(t0);
        s.state.lives = 1;
        let name = correct_name(&s);
        submit_answer(&mut s, &name, t0);
        let answered = s.question.as_ref().unwrap().asked_at;

        // callback re-checks game over on entry
        s.state.is_game_over = true;
        assert!(advance(&mut s, t0 + DELAY).is_empty());
        assert_eq!(s.question.as_ref().unwrap().asked_at, answered);
    }

    #[test]
    fn restart_discards_callbacks_and_replies_from_the_old_game() {
        let t0 = Instant::now();
        let mut s = ready(t0);
        let name = correct_name(&s);
        submit_answer(&mut s, &name, t0);
        s.scheduler.schedule(Deferred::NextQuestion, t0 + DELAY, 0);

        let events = restart(&mut s);
        assert_eq!(events, vec![GameEvent::PoolRequested { epoch: 1 }]);
        assert_eq!(s.phase(), Phase::Loading);

        // stale epoch callback slipped back in after restart
        s.scheduler.schedule(Deferred::NextQuestion, t0 + DELAY, 0);
        assert!(advance(&mut s, t0 + DELAY).is_empty());
        assert!(s.question.is_none());

        // late reply for the previous game
        assert!(on_pool_loaded(&mut s, 0, Ok(pool(12)), t0 + DELAY).is_empty());
        assert!(s.pool.is_empty());

        let events = on_pool_loaded(&mut s, 1, Ok(pool(12)), t0 + DELAY);
        assert!(events.contains(&GameEvent::QuestionShown));
    }

    #[test]
    fn restart_restores_initial_values() {
        let t0 = Instant::now();
        let mut s = ready(t0);
        let now = answer(&mut s, true, t0);
        let now = answer(&mut s, false, now);
        answer(&mut s, true, now);
        s.top_scores = vec![50];
        s.dark = false;

        restart(&mut s);
        assert_eq!(s.state.score, 0);
        assert_eq!(s.state.lives, 3);
        assert_eq!(s.state.current_round, 1);
        assert_eq!(s.state.difficulty, Difficulty::Easy);
        assert_eq!(s.state.time_left, 30);
        assert!(!s.state.is_game_over);
        assert_eq!(s.stats, Default::default());
        assert_eq!(s.streak, 0);
        assert!(!s.clock.is_running());
        assert_eq!(s.top_scores, vec![50]);
        assert!(!s.dark);
    }

    #[test]
    fn response_time_feeds_the_average() {
        let t0 = Instant::now();
        let mut s = ready(t0);
        let name = correct_name(&s);
        submit_answer(&mut s, &name, t0 + SEC * 4);
        assert!((s.stats.average_time - 4.0).abs() < 1e-6);

        let next = t0 + SEC * 4 + DELAY;
        advance(&mut s, next);
        let name = wrong_name(&s);
        submit_answer(&mut s, &name, next + SEC * 2);
        assert!((s.stats.average_time - 3.0).abs() < 1e-6);
    }

    #[test]
    fn small_pool_is_reported_not_swallowed() {
        let t0 = Instant::now();
        let mut s = Session::new(&GameConfig::default().timing, StdRng::seed_from_u64(1));
        let events = on_pool_loaded(&mut s, 0, Ok(pool(3)), t0);
        assert_eq!(events, vec![GameEvent::PoolLoaded { size: 3 }, GameEvent::QuestionUnavailable]);
        assert!(s.pool_error.as_deref().unwrap_or_default().contains("distinct"));
        assert_eq!(s.phase(), Phase::Loading);
        assert!(!s.clock.is_running());
        assert!(advance(&mut s, t0 + SEC * 60).is_empty());
        assert_eq!(s.state.lives, 3);
    }

    #[test]
    fn fetch_failure_leaves_the_game_loading() {
        let t0 = Instant::now();
        let mut s = Session::new(&GameConfig::default().timing, StdRng::seed_from_u64(1));
        let events = on_pool_loaded(&mut s, 0, Err(FetchError::WorkerGone), t0);
        assert_eq!(events, vec![GameEvent::PoolFailed]);
        assert!(s.pool_error.is_some());
        assert_eq!(s.phase(), Phase::Loading);
    }

    #[test]
    fn invariants_hold_under_random_play() {
        let t0 = Instant::now();
        let mut s = ready(t0);
        let mut now = t0;
        let mut pick = StdRng::seed_from_u64(99);
        for i in 0..200u32 {
            if s.state.is_game_over {
                break;
            }
            now += SEC * (i % 7);
            advance(&mut s, now);
            if s.phase() == Phase::Playing {
                let correct = rand::Rng::gen_bool(&mut pick, 0.7);
                now = answer(&mut s, correct, now);
            }
            assert!(s.state.lives <= 3);
            assert_eq!(s.state.difficulty, Difficulty::for_round(s.state.current_round));
            assert_eq!(
                s.stats.total_rounds,
                s.stats.correct_answers + s.stats.incorrect_answers
            );
        }
    }
}
