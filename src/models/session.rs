//! Detox session data models.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed session lengths offered to the user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum DetoxDuration {
    OneHour,
    ThreeHours,
    OneDay,
    ThreeDays,
    SevenDays,
}

impl Default for DetoxDuration {
    fn default() -> Self {
        DetoxDuration::OneHour
    }
}

impl DetoxDuration {
    pub const ALL: [DetoxDuration; 5] = [
        DetoxDuration::OneHour,
        DetoxDuration::ThreeHours,
        DetoxDuration::OneDay,
        DetoxDuration::ThreeDays,
        DetoxDuration::SevenDays,
    ];

    pub fn as_secs(&self) -> u64 {
        match self {
            DetoxDuration::OneHour => 3_600,
            DetoxDuration::ThreeHours => 10_800,
            DetoxDuration::OneDay => 86_400,
            DetoxDuration::ThreeDays => 259_200,
            DetoxDuration::SevenDays => 604_800,
        }
    }

    pub fn as_ms(&self) -> u64 {
        self.as_secs() * 1_000
    }

    /// Whole minutes credited when a session of this length completes.
    pub fn focus_minutes(&self) -> u64 {
        self.as_secs() / 60
    }

    pub fn label(&self) -> &'static str {
        match self {
            DetoxDuration::OneHour => "1h",
            DetoxDuration::ThreeHours => "3h",
            DetoxDuration::OneDay => "1d",
            DetoxDuration::ThreeDays => "3d",
            DetoxDuration::SevenDays => "7d",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DetoxDuration::OneHour => "Quick reset to clear your mind.",
            DetoxDuration::ThreeHours => "Deep focus block for meaningful work.",
            DetoxDuration::OneDay => "Full day cleanse from digital noise.",
            DetoxDuration::ThreeDays => "Recalibrate your habits over a long weekend.",
            DetoxDuration::SevenDays => "Transformational break to rebuild focus.",
        }
    }

    pub fn to_chrono(&self) -> Duration {
        Duration::seconds(self.as_secs() as i64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DetoxSession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub duration: DetoxDuration,
    /// Set only when the session ran to completion.
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub aborted: bool,
}

impl DetoxSession {
    pub fn new(duration: DetoxDuration, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at,
            duration,
            completed_at: None,
            aborted: false,
        }
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        self.started_at + self.duration.to_chrono()
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some() && !self.aborted
    }

    pub fn progress(&self, at: DateTime<Utc>) -> f64 {
        crate::timer::SessionClock::for_session(self).read(at).progress
    }

    /// Copy of this session as it is committed to history.
    pub fn finalized(&self, aborted: bool, at: DateTime<Utc>) -> Self {
        Self {
            completed_at: if aborted { None } else { Some(at) },
            aborted,
            ..self.clone()
        }
    }
}
