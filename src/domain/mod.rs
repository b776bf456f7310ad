pub mod character;
pub mod difficulty;
pub mod question;
pub mod rules;
pub mod state;
