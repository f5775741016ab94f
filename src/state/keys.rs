//! Storage keys. Values are JSON encoded.

pub const DOPAMINE_INDEX: &str = "dopamineIndex";
pub const ONBOARDING_COMPLETED: &str = "onboardingCompleted";
pub const STREAK: &str = "streak";
pub const TOTAL_FOCUS_MINUTES: &str = "totalFocusMinutes";
pub const COMPLETED_SESSIONS: &str = "completedSessions";
/// Present only while a session is running.
pub const ACTIVE_SESSION: &str = "activeSession";
pub const PAST_SESSIONS: &str = "pastSessions";
pub const JOURNAL_ENTRIES: &str = "journalEntries";
