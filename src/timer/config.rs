use std::time::Duration;

pub const DEBUG_ENV_VAR: &str = "DOPAMINE_DETOX_DEBUG";

/// Tunables for the countdown loop and the pre-start paywall check.
#[derive(Debug, Clone)]
pub struct TimerConfig {
    pub tick_interval: Duration,
    /// Emit a heartbeat snapshot every N ticks.
    pub heartbeat_every_ticks: u32,
    pub entitlement_timeout: Duration,
    /// Completed sessions allowed before an entitlement is required.
    pub free_sessions: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            heartbeat_every_ticks: 10,
            entitlement_timeout: Duration::from_secs(10),
            free_sessions: 1,
        }
    }
}

impl TimerConfig {
    pub fn from_env() -> Self {
        let debug_mode = std::env::var(DEBUG_ENV_VAR)
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            heartbeat_every_ticks: if debug_mode { 1 } else { 10 },
            ..Self::default()
        }
    }
}
