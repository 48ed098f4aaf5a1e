pub mod error;
pub mod socket;
