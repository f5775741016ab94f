//! Process-wide detox state and its durable mirror.
//!
//! `AppState` is a cheap-to-clone handle created once by the application shell
//! and handed to every component that reads or mutates progress. In-memory
//! state is authoritative; storage writes are best effort and a failed write is
//! logged, never rolled back.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{broadcast, Mutex};

use crate::db::KeyValueStore;
use crate::models::{
    default_catalog, evaluate_achievements, Achievement, DetoxSession, JournalEntry,
};

use super::keys;

pub const DEFAULT_DOPAMINE_INDEX: u8 = 50;
const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSnapshot {
    pub dopamine_index: u8,
    pub has_completed_onboarding: bool,
    pub streak: u64,
    pub total_focus_minutes: u64,
    pub completed_session_count: u64,
    pub active_session: Option<DetoxSession>,
    /// Committed sessions in completion order.
    pub past_sessions: Vec<DetoxSession>,
    /// Newest first.
    pub journal_entries: Vec<JournalEntry>,
    pub achievements: Vec<Achievement>,
}

impl Default for AppSnapshot {
    fn default() -> Self {
        Self {
            dopamine_index: DEFAULT_DOPAMINE_INDEX,
            has_completed_onboarding: false,
            streak: 0,
            total_focus_minutes: 0,
            completed_session_count: 0,
            active_session: None,
            past_sessions: Vec::new(),
            journal_entries: Vec::new(),
            achievements: evaluate_achievements(&default_catalog(), 0, 0),
        }
    }
}

impl AppSnapshot {
    pub fn total_focus_hours(&self) -> u64 {
        self.total_focus_minutes / 60
    }

    fn refresh_achievements(&mut self) {
        self.achievements =
            evaluate_achievements(&self.achievements, self.streak, self.total_focus_minutes);
    }
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    OnboardingCompleted { score: u8 },
    ActiveSessionChanged(Option<DetoxSession>),
    SessionRecorded { session: DetoxSession, aborted: bool },
    JournalEntryAdded(JournalEntry),
    AchievementsUpdated(Vec<Achievement>),
}

#[derive(Clone)]
pub struct AppState {
    inner: Arc<Mutex<AppSnapshot>>,
    store: Arc<dyn KeyValueStore>,
    events: broadcast::Sender<AppEvent>,
}

impl AppState {
    /// Rebuild state from storage. Unreadable values fall back to defaults.
    ///
    /// A stored active session whose end time is already behind `now` finished
    /// while the process was gone; it is committed as completed here, before
    /// anyone can observe it as running.
    pub async fn load(store: Arc<dyn KeyValueStore>, now: DateTime<Utc>) -> Self {
        let mut snapshot = AppSnapshot::default();

        if let Some(index) = read_json::<u8>(store.as_ref(), keys::DOPAMINE_INDEX).await {
            snapshot.dopamine_index = index.min(100);
        }
        if let Some(done) = read_json(store.as_ref(), keys::ONBOARDING_COMPLETED).await {
            snapshot.has_completed_onboarding = done;
        }
        if let Some(streak) = read_json(store.as_ref(), keys::STREAK).await {
            snapshot.streak = streak;
        }
        if let Some(minutes) = read_json(store.as_ref(), keys::TOTAL_FOCUS_MINUTES).await {
            snapshot.total_focus_minutes = minutes;
        }
        if let Some(count) = read_json(store.as_ref(), keys::COMPLETED_SESSIONS).await {
            snapshot.completed_session_count = count;
        }
        if let Some(past) = read_json(store.as_ref(), keys::PAST_SESSIONS).await {
            snapshot.past_sessions = past;
        }
        if let Some(entries) = read_json(store.as_ref(), keys::JOURNAL_ENTRIES).await {
            snapshot.journal_entries = entries;
        }
        snapshot.refresh_achievements();

        let stored_active: Option<DetoxSession> =
            read_json(store.as_ref(), keys::ACTIVE_SESSION).await;

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let state = Self {
            inner: Arc::new(Mutex::new(snapshot)),
            store,
            events,
        };

        if let Some(session) = stored_active {
            let already_recorded = state
                .inner
                .lock()
                .await
                .past_sessions
                .iter()
                .any(|past| past.id == session.id);
            if already_recorded {
                // Committed before, but clearing the record did not reach storage.
                warn!(
                    "Active session {} is already in history; discarding stale record",
                    session.id
                );
                state.remove_key(keys::ACTIVE_SESSION).await;
            } else if session.ends_at() > now {
                info!("Resuming active session {}", session.id);
                state.inner.lock().await.active_session = Some(session);
            } else {
                info!(
                    "Session {} ended at {} while the app was closed; recording completion",
                    session.id,
                    session.ends_at()
                );
                state
                    .record_session_completion(&session, false, session.ends_at())
                    .await;
                state.remove_key(keys::ACTIVE_SESSION).await;
            }
        }

        state
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> AppSnapshot {
        self.inner.lock().await.clone()
    }

    pub async fn active_session(&self) -> Option<DetoxSession> {
        self.inner.lock().await.active_session.clone()
    }

    pub async fn completed_session_count(&self) -> u64 {
        self.inner.lock().await.completed_session_count
    }

    // Storage writes happen while `inner` is held so stored values land in
    // the same order as the in-memory mutations.

    pub async fn mark_onboarding_complete(&self, score: u8) {
        let score = score.min(100);
        {
            let mut guard = self.inner.lock().await;
            guard.dopamine_index = score;
            guard.has_completed_onboarding = true;
            self.write_json(keys::DOPAMINE_INDEX, &score).await;
            self.write_json(keys::ONBOARDING_COMPLETED, &true).await;
        }
        self.emit(AppEvent::OnboardingCompleted { score });
    }

    /// Replace the running session. `None` clears the stored record.
    pub async fn set_active_session(&self, session: Option<DetoxSession>) {
        {
            let mut guard = self.inner.lock().await;
            guard.active_session = session.clone();
            match &session {
                Some(active) => self.write_json(keys::ACTIVE_SESSION, active).await,
                None => self.remove_key(keys::ACTIVE_SESSION).await,
            }
        }
        self.emit(AppEvent::ActiveSessionChanged(session));
    }

    /// Commit a finished session to history and update progress counters.
    ///
    /// Returns `false` without touching anything when a session with the same
    /// id was already committed.
    pub async fn record_session_completion(
        &self,
        session: &DetoxSession,
        aborted: bool,
        at: DateTime<Utc>,
    ) -> bool {
        let finished = session.finalized(aborted, at);

        let (streak, minutes, achievements) = {
            let mut guard = self.inner.lock().await;
            if guard.past_sessions.iter().any(|past| past.id == session.id) {
                warn!("Session {} already recorded; ignoring", session.id);
                return false;
            }

            guard.past_sessions.push(finished.clone());
            if aborted {
                guard.streak = 0;
            } else {
                guard.streak += 1;
                guard.total_focus_minutes += session.duration.focus_minutes();
                guard.completed_session_count += 1;
            }
            guard.refresh_achievements();

            self.write_json(keys::STREAK, &guard.streak).await;
            if !aborted {
                self.write_json(keys::TOTAL_FOCUS_MINUTES, &guard.total_focus_minutes)
                    .await;
                self.write_json(keys::COMPLETED_SESSIONS, &guard.completed_session_count)
                    .await;
            }
            self.write_json(keys::PAST_SESSIONS, &guard.past_sessions).await;

            (
                guard.streak,
                guard.total_focus_minutes,
                guard.achievements.clone(),
            )
        };

        info!(
            "Recorded session {} (aborted: {aborted}); streak {streak}, {minutes} focus minutes",
            session.id
        );

        self.emit(AppEvent::SessionRecorded {
            session: finished,
            aborted,
        });
        self.emit(AppEvent::AchievementsUpdated(achievements));
        true
    }

    pub async fn add_journal_entry(&self, entry: JournalEntry) {
        {
            let mut guard = self.inner.lock().await;
            guard.journal_entries.insert(0, entry.clone());
            self.write_json(keys::JOURNAL_ENTRIES, &guard.journal_entries)
                .await;
        }
        self.emit(AppEvent::JournalEntryAdded(entry));
    }

    fn emit(&self, event: AppEvent) {
        // No receivers is normal before the UI subscribes.
        let _ = self.events.send(event);
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!("Failed to encode {key}: {err}");
                return;
            }
        };
        if let Err(err) = self.store.set(key, encoded).await {
            warn!("Failed to persist {key}: {err:#}");
        }
    }

    async fn remove_key(&self, key: &str) {
        if let Err(err) = self.store.remove(key).await {
            warn!("Failed to clear {key}: {err:#}");
        }
    }
}

async fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key).await {
        Ok(raw) => raw?,
        Err(err) => {
            warn!("Failed to read {key}: {err:#}");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("Discarding undecodable {key}: {err}");
            None
        }
    }
}
