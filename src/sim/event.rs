/// Events emitted by state transitions.
/// The presentation layer consumes these for sound, persistence and fetches.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    /// A fresh candidate pool is needed for this epoch.
    PoolRequested { epoch: u64 },
    PoolLoaded { size: usize },
    PoolFailed,
    QuestionShown,
    QuestionUnavailable,
    Answered { correct: bool, points: i32 },
    TierUp,
    /// One second left on the countdown is worth a beep.
    Countdown { seconds_left: u32 },
    TimedOut,
    GameOver { score: u32 },
}
