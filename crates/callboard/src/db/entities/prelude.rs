pub use super::settings::Entity as Settings;
pub use super::submission::Entity as Submission;
pub use super::vote::Entity as Vote;
