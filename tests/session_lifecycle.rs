use std::{
    path::Path,
    sync::{Arc, Mutex},
    time::Duration as StdDuration,
};

use chrono::{DateTime, Duration, TimeZone, Utc};
use dopamine_detox_lib::{
    bootstrap, bootstrap_with_time,
    db::{Database, KeyValueStore},
    models::{DetoxDuration, DetoxSession},
    services::{AlwaysEntitled, NoopFocusService},
    state::keys,
    timer::{StartOutcome, TimeSource, TimerConfig, TimerPhase},
    DetoxApp, DATABASE_FILE,
};
use tempfile::tempdir;

struct ManualTime(Mutex<DateTime<Utc>>);

impl ManualTime {
    fn at(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self(Mutex::new(now)))
    }

    fn advance(&self, by: Duration) {
        let mut guard = self.0.lock().unwrap();
        *guard = *guard + by;
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

fn quiet_config() -> TimerConfig {
    TimerConfig {
        tick_interval: StdDuration::from_secs(3600),
        heartbeat_every_ticks: 1,
        entitlement_timeout: StdDuration::from_millis(200),
        free_sessions: 1,
    }
}

fn evening() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 7, 21, 0, 0).unwrap()
}

async fn open(dir: &Path, time: Arc<ManualTime>) -> DetoxApp {
    bootstrap_with_time(
        dir,
        Arc::new(AlwaysEntitled),
        Arc::new(NoopFocusService),
        time,
        quiet_config(),
    )
    .await
    .unwrap()
}

async fn seed_active_session(dir: &Path, session: &DetoxSession) {
    let db = Database::new(dir.join(DATABASE_FILE)).unwrap();
    db.set(keys::ACTIVE_SESSION, serde_json::to_string(session).unwrap())
        .await
        .unwrap();
}

#[tokio::test]
async fn fresh_install_starts_from_defaults() {
    let dir = tempdir().unwrap();
    let app = bootstrap(dir.path(), Arc::new(AlwaysEntitled), Arc::new(NoopFocusService))
        .await
        .unwrap();

    let snapshot = app.state.snapshot().await;
    assert_eq!(snapshot.dopamine_index, 50);
    assert!(!snapshot.has_completed_onboarding);
    assert_eq!(snapshot.streak, 0);
    assert!(snapshot.achievements.iter().all(|a| !a.is_unlocked));

    let timer = app.timer.get_snapshot().await;
    assert_eq!(timer.state.phase, TimerPhase::Idle);
    assert!(dir.path().join(DATABASE_FILE).exists());
}

#[tokio::test]
async fn session_that_ended_while_closed_is_committed_once() {
    let dir = tempdir().unwrap();
    let now = evening();
    let session = DetoxSession::new(DetoxDuration::OneHour, now - Duration::hours(3));
    seed_active_session(dir.path(), &session).await;

    let app = open(dir.path(), ManualTime::at(now)).await;
    let snapshot = app.state.snapshot().await;
    assert_eq!(snapshot.streak, 1);
    assert_eq!(snapshot.total_focus_minutes, 60);
    assert!(snapshot.active_session.is_none());
    assert_eq!(snapshot.past_sessions.len(), 1);
    assert_eq!(
        snapshot.past_sessions[0].completed_at,
        Some(session.ends_at())
    );
    assert!(snapshot
        .achievements
        .iter()
        .any(|a| a.title == "First Reset" && a.is_unlocked));
    assert_eq!(app.timer.get_snapshot().await.state.phase, TimerPhase::Idle);
    drop(app);

    let reopened = open(dir.path(), ManualTime::at(now + Duration::hours(1))).await;
    let snapshot = reopened.state.snapshot().await;
    assert_eq!(snapshot.streak, 1);
    assert_eq!(snapshot.past_sessions.len(), 1);
}

#[tokio::test]
async fn running_session_resumes_after_restart() {
    let dir = tempdir().unwrap();
    let now = evening();
    let session = DetoxSession::new(DetoxDuration::OneHour, now - Duration::minutes(10));
    seed_active_session(dir.path(), &session).await;

    let app = open(dir.path(), ManualTime::at(now)).await;
    let timer = app.timer.get_snapshot().await;
    assert_eq!(timer.state.phase, TimerPhase::Running);
    assert_eq!(timer.state.session.as_ref().map(|s| s.id), Some(session.id));
    assert_eq!(timer.state.remaining_ms, 50 * 60 * 1000);
    assert_eq!(timer.formatted_remaining, "50m 0s");

    app.timer.cancel_session().await;
    let snapshot = app.state.snapshot().await;
    assert_eq!(snapshot.streak, 0);
    assert!(snapshot.active_session.is_none());
}

#[tokio::test]
async fn completed_session_unlocks_and_celebrates() {
    let dir = tempdir().unwrap();
    let time = ManualTime::at(evening());
    let app = open(dir.path(), time.clone()).await;

    let outcome = app.timer.request_start(DetoxDuration::OneHour).await;
    assert!(matches!(outcome, StartOutcome::Started(_)));
    assert!(app.state.active_session().await.is_some());

    time.advance(Duration::minutes(30));
    assert_eq!(app.timer.tick().await, TimerPhase::Running);

    time.advance(Duration::minutes(31));
    assert_eq!(app.timer.tick().await, TimerPhase::Finished);

    let timer = app.timer.get_snapshot().await;
    assert!(timer.state.celebration.is_some());
    assert_eq!(timer.progress, 1.0);

    let snapshot = app.state.snapshot().await;
    assert_eq!(snapshot.streak, 1);
    assert_eq!(snapshot.total_focus_hours(), 1);
    assert!(snapshot.active_session.is_none());

    app.timer.acknowledge_celebration().await;
    assert_eq!(app.timer.get_snapshot().await.state.phase, TimerPhase::Idle);
}

#[tokio::test]
async fn deep_link_opens_and_closes_the_wall() {
    let dir = tempdir().unwrap();
    let app = open(dir.path(), ManualTime::at(evening())).await;

    assert!(app
        .interventions
        .handle_url("dopaminedetox://intervention?app=Instagram&redirect=instagram%3A%2F%2Fapp"));
    assert_eq!(
        app.interventions.current().map(|i| i.display_name().to_string()),
        Some("Instagram".to_string())
    );

    let target = app.interventions.proceed();
    assert_eq!(target.as_ref().map(|u| u.as_str()), Some("instagram://app"));
    assert!(app.interventions.current().is_none());

    assert!(!app.interventions.handle_url("https://example.com"));
    assert!(app.interventions.current().is_none());
}
