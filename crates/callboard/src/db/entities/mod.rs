pub mod prelude;

pub mod settings;
pub mod submission;
pub mod vote;
