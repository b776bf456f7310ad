pub mod clock;
pub mod event;
pub mod scores;
pub mod session;
pub mod step;
