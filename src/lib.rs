pub mod db;
pub mod intervention;
pub mod models;
pub mod onboarding;
pub mod services;
pub mod settings;
pub mod state;
pub mod timer;
pub mod utils;

use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use db::{Database, KeyValueStore};
use intervention::InterventionCenter;
use services::{EntitlementService, FocusAutomation, FocusService, PaywallGate};
use settings::SettingsStore;
use state::AppState;
use timer::{SystemTime, TimeSource, TimerConfig, TimerController};

pub const DATABASE_FILE: &str = "dopamine_detox.sqlite3";
pub const SETTINGS_FILE: &str = "settings.json";

/// Initialize logging (reads RUST_LOG env var). Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}

/// Everything the presentation layer talks to.
#[derive(Clone)]
pub struct DetoxApp {
    pub db: Database,
    pub state: AppState,
    pub timer: TimerController,
    pub interventions: InterventionCenter,
    pub settings: Arc<SettingsStore>,
}

/// Open storage under `data_dir`, reconcile whatever session was active when
/// the process last stopped, and wire up the timer.
pub async fn bootstrap(
    data_dir: &Path,
    entitlements: Arc<dyn EntitlementService>,
    focus_service: Arc<dyn FocusService>,
) -> Result<DetoxApp> {
    bootstrap_with_time(
        data_dir,
        entitlements,
        focus_service,
        Arc::new(SystemTime),
        TimerConfig::from_env(),
    )
    .await
}

pub async fn bootstrap_with_time(
    data_dir: &Path,
    entitlements: Arc<dyn EntitlementService>,
    focus_service: Arc<dyn FocusService>,
    time: Arc<dyn TimeSource>,
    config: TimerConfig,
) -> Result<DetoxApp> {
    log::info!("Dopamine Detox starting up...");

    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let database = Database::new(data_dir.join(DATABASE_FILE))?;
    let settings = Arc::new(SettingsStore::new(data_dir.join(SETTINGS_FILE))?);

    let store: Arc<dyn KeyValueStore> = Arc::new(database.clone());
    let app_state = AppState::load(store, time.now()).await;

    let gate = Arc::new(PaywallGate::new(
        entitlements,
        config.entitlement_timeout,
        config.free_sessions,
    ));
    let focus = FocusAutomation::new(focus_service, settings.clone());
    let timer = TimerController::new(app_state.clone(), time, focus, gate, config).await;

    Ok(DetoxApp {
        db: database,
        state: app_state,
        timer,
        interventions: InterventionCenter::new(),
        settings,
    })
}
