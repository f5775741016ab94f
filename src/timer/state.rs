use serde::{Deserialize, Serialize};

use crate::models::{DetoxDuration, DetoxSession};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerPhase {
    Idle,
    Running,
    /// Session ran to completion; celebration not yet acknowledged.
    Finished,
}

impl Default for TimerPhase {
    fn default() -> Self {
        TimerPhase::Idle
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub phase: TimerPhase,
    pub selected_duration: DetoxDuration,
    /// Session being counted down; mirrors the active session in app state.
    pub session: Option<DetoxSession>,
    pub remaining_ms: u64,
    /// One-shot signal raised when a session completes.
    pub celebration: Option<DetoxSession>,
}

impl Default for TimerState {
    fn default() -> Self {
        let selected_duration = DetoxDuration::default();
        Self {
            phase: TimerPhase::Idle,
            selected_duration,
            session: None,
            remaining_ms: selected_duration.as_ms(),
            celebration: None,
        }
    }
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_session(&mut self, session: DetoxSession, remaining_ms: u64) {
        *self = Self {
            phase: TimerPhase::Running,
            selected_duration: session.duration,
            session: Some(session),
            remaining_ms,
            celebration: None,
        };
    }

    /// Leave `Running` for `Finished`. Returns the session that was running,
    /// or `None` when the timer was not running (nothing to commit).
    pub fn finish(&mut self) -> Option<DetoxSession> {
        if self.phase != TimerPhase::Running {
            return None;
        }
        let session = self.session.take()?;
        self.phase = TimerPhase::Finished;
        self.remaining_ms = 0;
        self.celebration = Some(session.clone());
        Some(session)
    }

    /// Leave `Running` for `Idle` without celebrating.
    pub fn cancel(&mut self) -> Option<DetoxSession> {
        if self.phase != TimerPhase::Running {
            return None;
        }
        let session = self.session.take()?;
        self.reset_idle();
        Some(session)
    }

    pub fn acknowledge(&mut self) -> bool {
        if self.phase != TimerPhase::Finished {
            return false;
        }
        self.reset_idle();
        true
    }

    fn reset_idle(&mut self) {
        let selected_duration = self.selected_duration;
        *self = Self {
            selected_duration,
            remaining_ms: selected_duration.as_ms(),
            ..Self::default()
        };
    }

    pub fn is_celebrating(&self) -> bool {
        self.celebration.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn finish_only_once() {
        let mut state = TimerState::new();
        let session = DetoxSession::new(DetoxDuration::ThreeHours, Utc::now());
        state.begin_session(session.clone(), session.duration.as_ms());

        assert_eq!(state.finish().map(|s| s.id), Some(session.id));
        assert_eq!(state.phase, TimerPhase::Finished);
        assert!(state.is_celebrating());
        assert!(state.finish().is_none());
        assert!(state.cancel().is_none());
    }

    #[test]
    fn acknowledge_returns_to_idle_keeping_selection() {
        let mut state = TimerState::new();
        let session = DetoxSession::new(DetoxDuration::OneDay, Utc::now());
        state.begin_session(session, 10);
        state.finish();

        assert!(state.acknowledge());
        assert_eq!(state.phase, TimerPhase::Idle);
        assert!(!state.is_celebrating());
        assert_eq!(state.selected_duration, DetoxDuration::OneDay);
        assert_eq!(state.remaining_ms, DetoxDuration::OneDay.as_ms());
        assert!(!state.acknowledge());
    }
}
