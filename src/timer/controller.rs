use std::sync::Arc;

use anyhow::{bail, Result};
use log::{info, warn};
use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    models::{DetoxDuration, DetoxSession},
    services::{AccessDecision, FocusAutomation, PaywallGate},
    state::AppState,
};

use super::{format_remaining, SessionClock, TimeSource, TimerConfig, TimerPhase, TimerState};

// Per-tick logging; flip on when debugging the countdown loop.
const ENABLE_LOGS: bool = false;

use crate::{log_debug, log_info};

const EVENT_CAPACITY: usize = 32;

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub progress: f64,
    pub formatted_remaining: String,
}

#[derive(Debug, Clone)]
pub enum TimerEvent {
    StateChanged(TimerSnapshot),
    Heartbeat(TimerSnapshot),
    /// Raised once when a session runs to completion.
    Celebration(DetoxSession),
}

#[derive(Debug, Clone)]
pub enum StartOutcome {
    Started(TimerSnapshot),
    AlreadyRunning,
    PaywallRequired { offering_id: String },
    Blocked { message: String },
}

struct Ticker {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

#[derive(Clone)]
pub struct TimerController {
    state: Arc<Mutex<TimerState>>,
    app_state: AppState,
    time: Arc<dyn TimeSource>,
    focus: FocusAutomation,
    gate: Arc<PaywallGate>,
    config: TimerConfig,
    events: broadcast::Sender<TimerEvent>,
    ticker: Arc<Mutex<Option<Ticker>>>,
}

impl TimerController {
    /// Build the controller and resume a session that is still running.
    pub async fn new(
        app_state: AppState,
        time: Arc<dyn TimeSource>,
        focus: FocusAutomation,
        gate: Arc<PaywallGate>,
        config: TimerConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let controller = Self {
            state: Arc::new(Mutex::new(TimerState::new())),
            app_state,
            time,
            focus,
            gate,
            config,
            events,
            ticker: Arc::new(Mutex::new(None)),
        };
        controller.restore().await;
        controller
    }

    async fn restore(&self) {
        let Some(session) = self.app_state.active_session().await else {
            return;
        };

        let now = self.time.now();
        let reading = SessionClock::for_session(&session).read(now);
        if reading.is_expired() {
            // Expired between load and construction. Commit it quietly and stay idle.
            warn!(
                "Active session {} already expired at startup; staying idle",
                session.id
            );
            self.app_state
                .record_session_completion(&session, false, session.ends_at())
                .await;
            self.app_state.set_active_session(None).await;
            return;
        }

        info!(
            "Resuming session {} with {} remaining",
            session.id,
            format_remaining(reading.remaining_ms())
        );
        self.state
            .lock()
            .await
            .begin_session(session, reading.remaining_ms());
        self.focus.begin();
        self.spawn_ticker().await;
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.events.subscribe()
    }

    pub async fn get_snapshot(&self) -> TimerSnapshot {
        let mut guard = self.state.lock().await;
        let progress = match (guard.phase, guard.session.as_ref()) {
            (TimerPhase::Running, Some(session)) => {
                let reading = SessionClock::for_session(session).read(self.time.now());
                guard.remaining_ms = reading.remaining_ms();
                reading.progress
            }
            (TimerPhase::Finished, _) => 1.0,
            _ => 0.0,
        };
        TimerSnapshot {
            formatted_remaining: format_remaining(guard.remaining_ms),
            progress,
            state: guard.clone(),
        }
    }

    /// Check access, then start. The paywall decision is returned to the
    /// caller untouched when the session may not start yet.
    pub async fn request_start(&self, duration: DetoxDuration) -> StartOutcome {
        if self.state.lock().await.phase == TimerPhase::Running {
            return StartOutcome::AlreadyRunning;
        }

        let completed = self.app_state.completed_session_count().await;
        match self.gate.check(completed).await {
            AccessDecision::Allowed => match self.start_session(duration).await {
                Ok(snapshot) => StartOutcome::Started(snapshot),
                Err(_) => StartOutcome::AlreadyRunning,
            },
            AccessDecision::PaywallRequired { offering_id } => {
                StartOutcome::PaywallRequired { offering_id }
            }
            AccessDecision::Blocked { message } => StartOutcome::Blocked { message },
        }
    }

    pub async fn start_session(&self, duration: DetoxDuration) -> Result<TimerSnapshot> {
        let session = {
            let mut state = self.state.lock().await;
            if state.phase == TimerPhase::Running {
                bail!("a detox session is already running");
            }
            let session = DetoxSession::new(duration, self.time.now());
            state.begin_session(session.clone(), duration.as_ms());
            session
        };

        info!(
            "Starting {} detox session {}",
            duration.label(),
            session.id
        );
        self.app_state.set_active_session(Some(session)).await;
        self.focus.begin();
        self.spawn_ticker().await;

        let snapshot = self.get_snapshot().await;
        self.emit(TimerEvent::StateChanged(snapshot.clone()));
        Ok(snapshot)
    }

    /// Recompute remaining time from the wall clock and finish the session
    /// once it reaches zero. Returns the phase after the tick.
    pub async fn tick(&self) -> TimerPhase {
        let now = self.time.now();

        let expired = {
            let mut guard = self.state.lock().await;
            if guard.phase != TimerPhase::Running {
                return guard.phase;
            }
            let Some(session) = guard.session.as_ref() else {
                return guard.phase;
            };

            let reading = SessionClock::for_session(session).read(now);
            if !reading.is_expired() {
                guard.remaining_ms = reading.remaining_ms();
                log_debug!("tick: {} remaining", format_remaining(guard.remaining_ms));
            }
            reading.is_expired()
        };

        if expired {
            self.finish_session().await;
        }
        self.state.lock().await.phase
    }

    async fn finish_session(&self) {
        let Some(session) = self.state.lock().await.finish() else {
            return;
        };

        self.stop_ticker().await;
        self.focus.end();

        let now = self.time.now();
        let recorded = self
            .app_state
            .record_session_completion(&session, false, now)
            .await;
        self.app_state.set_active_session(None).await;

        if recorded {
            info!("Detox session {} completed", session.id);
            self.emit(TimerEvent::Celebration(session));
        } else {
            warn!(
                "Detox session {} was already in history; skipping celebration",
                session.id
            );
            self.state.lock().await.acknowledge();
        }
        let snapshot = self.get_snapshot().await;
        self.emit(TimerEvent::StateChanged(snapshot));
    }

    /// Abort the running session. No-op when idle.
    pub async fn cancel_session(&self) {
        let Some(session) = self.state.lock().await.cancel() else {
            return;
        };

        self.stop_ticker().await;
        self.focus.end();

        let now = self.time.now();
        self.app_state
            .record_session_completion(&session, true, now)
            .await;
        self.app_state.set_active_session(None).await;

        info!("Detox session {} cancelled", session.id);
        let snapshot = self.get_snapshot().await;
        self.emit(TimerEvent::StateChanged(snapshot));
    }

    pub async fn acknowledge_celebration(&self) {
        let changed = self.state.lock().await.acknowledge();
        if changed {
            let snapshot = self.get_snapshot().await;
            self.emit(TimerEvent::StateChanged(snapshot));
        }
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(previous) = ticker_guard.take() {
            previous.cancel.cancel();
        }

        let cancel = CancellationToken::new();
        let controller = self.clone();
        let token = cancel.clone();
        let handle = tokio::spawn(async move { controller.run_ticker(token).await });

        *ticker_guard = Some(Ticker { handle, cancel });
    }

    async fn run_ticker(self, cancel: CancellationToken) {
        let mut interval = time::interval(self.config.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let heartbeat_every = self.config.heartbeat_every_ticks.max(1);
        let mut ticks: u32 = 0;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if self.tick().await != TimerPhase::Running {
                        break;
                    }
                    ticks = ticks.wrapping_add(1);
                    if ticks % heartbeat_every == 0 {
                        let snapshot = self.get_snapshot().await;
                        self.emit(TimerEvent::Heartbeat(snapshot));
                    }
                }
                _ = cancel.cancelled() => {
                    log_info!("ticker cancelled");
                    break;
                }
            }
        }
    }

    /// Cancel the tick loop without awaiting it; this may run on the loop itself.
    async fn stop_ticker(&self) {
        if let Some(ticker) = self.ticker.lock().await.take() {
            ticker.cancel.cancel();
            drop(ticker.handle);
        }
    }

    fn emit(&self, event: TimerEvent) {
        let _ = self.events.send(event);
    }
}
