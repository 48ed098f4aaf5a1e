pub mod entities;
pub mod migration;
pub mod settings;
pub mod submission;
pub mod vote;
