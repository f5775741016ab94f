pub mod achievement;
pub mod journal;
pub mod session;

pub use achievement::{default_catalog, evaluate_achievements, Achievement, Milestone};
pub use journal::JournalEntry;
pub use session::{DetoxDuration, DetoxSession};
