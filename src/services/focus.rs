//! Notification silencing while a session runs.
//!
//! Activation and deactivation are fire-and-forget: a failing or slow focus
//! service is logged and never delays starting or stopping the timer.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use log::{error, info};
use uuid::Uuid;

use crate::settings::SettingsStore;

#[async_trait]
pub trait FocusService: Send + Sync {
    async fn begin_session(&self, configuration_id: Uuid) -> Result<()>;
    async fn end_session(&self, configuration_id: Uuid) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct NoopFocusService;

#[async_trait]
impl FocusService for NoopFocusService {
    async fn begin_session(&self, _configuration_id: Uuid) -> Result<()> {
        Ok(())
    }

    async fn end_session(&self, _configuration_id: Uuid) -> Result<()> {
        Ok(())
    }
}

#[derive(Clone)]
pub struct FocusAutomation {
    service: Arc<dyn FocusService>,
    settings: Arc<SettingsStore>,
}

impl FocusAutomation {
    pub fn new(service: Arc<dyn FocusService>, settings: Arc<SettingsStore>) -> Self {
        Self { service, settings }
    }

    pub fn begin(&self) {
        let Some(id) = self.settings.focus().configuration_id else {
            return;
        };
        let service = self.service.clone();
        tokio::spawn(async move {
            match service.begin_session(id).await {
                Ok(()) => info!("Activated focus configuration during detox session"),
                Err(err) => error!("Failed to activate focus configuration: {err:#}"),
            }
        });
    }

    pub fn end(&self) {
        let Some(id) = self.settings.focus().configuration_id else {
            return;
        };
        let service = self.service.clone();
        tokio::spawn(async move {
            match service.end_session(id).await {
                Ok(()) => info!("Deactivated focus configuration after detox session"),
                Err(err) => error!("Failed to deactivate focus configuration: {err:#}"),
            }
        });
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use tokio::sync::Mutex;

    /// Records begin/end calls in order.
    #[derive(Default)]
    pub struct RecordingFocus {
        pub calls: Mutex<Vec<(&'static str, Uuid)>>,
        pub fail: bool,
    }

    #[async_trait]
    impl FocusService for RecordingFocus {
        async fn begin_session(&self, configuration_id: Uuid) -> Result<()> {
            self.calls.lock().await.push(("begin", configuration_id));
            if self.fail {
                anyhow::bail!("focus unavailable");
            }
            Ok(())
        }

        async fn end_session(&self, configuration_id: Uuid) -> Result<()> {
            self.calls.lock().await.push(("end", configuration_id));
            if self.fail {
                anyhow::bail!("focus unavailable");
            }
            Ok(())
        }
    }
}
