/// Question generation: one correct character plus three decoys.
///
/// Both the candidate draw and the option order use a uniform
/// Fisher–Yates shuffle (`SliceRandom::shuffle`).
///
/// Decoys are taken from the shuffled remainder in order, skipping any
/// whose display name collides with the answer or an earlier decoy, so the
/// answer's name appears among the options exactly once even when the pool
/// holds namesakes.

use std::time::Instant;

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use super::character::Character;

pub const OPTION_COUNT: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum QuestionError {
    #[error("need 4 characters with distinct names, pool has {distinct}")]
    InsufficientPool { distinct: usize },
}

#[derive(Clone, Debug)]
pub struct Question {
    pub answer: Character,
    pub options: [String; OPTION_COUNT],
    /// Wall-clock instant the question was shown, for response latency.
    pub asked_at: Instant,
}

impl Question {
    pub fn is_correct(&self, name: &str) -> bool {
        self.answer.name == name
    }

    /// Index of the correct option in presentation order.
    pub fn correct_slot(&self) -> usize {
        self.options
            .iter()
            .position(|o| *o == self.answer.name)
            .unwrap_or(0)
    }
}

pub fn generate<R: Rng + ?Sized>(
    pool: &[Character],
    rng: &mut R,
    now: Instant,
) -> Result<Question, QuestionError> {
    if pool.len() < OPTION_COUNT {
        return Err(QuestionError::InsufficientPool { distinct: distinct_names(pool) });
    }

    let mut shuffled: Vec<&Character> = pool.iter().collect();
    shuffled.shuffle(rng);

    let answer = shuffled[0];
    let mut names: Vec<String> = Vec::with_capacity(OPTION_COUNT);
    names.push(answer.name.clone());
    for c in &shuffled[1..] {
        if names.len() == OPTION_COUNT {
            break;
        }
        if !names.contains(&c.name) {
            names.push(c.name.clone());
        }
    }
    if names.len() < OPTION_COUNT {
        return Err(QuestionError::InsufficientPool { distinct: names.len() });
    }

    names.shuffle(rng);
    let options: [String; OPTION_COUNT] = std::array::from_fn(|i| names[i].clone());

    Ok(Question {
        answer: answer.clone(),
        options,
        asked_at: now,
    })
}

fn distinct_names(pool: &[Character]) -> usize {
    let mut seen: Vec<&str> = Vec::with_capacity(pool.len());
    for c in pool {
        if !seen.contains(&c.name.as_str()) {
            seen.push(&c.name);
        }
    }
    seen.len()
}
