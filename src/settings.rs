use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};
use uuid::Uuid;

/// Focus filter chosen by the user to silence notifications during a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FocusSettings {
    pub configuration_id: Option<Uuid>,
    pub configuration_name: Option<String>,
}

impl FocusSettings {
    pub fn is_configured(&self) -> bool {
        self.configuration_id.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserSettings {
    #[serde(default)]
    focus: FocusSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring unreadable settings at {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn focus(&self) -> FocusSettings {
        self.data
            .read()
            .map(|guard| guard.focus.clone())
            .unwrap_or_default()
    }

    pub fn update_focus(&self, settings: FocusSettings) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        guard.focus = settings;
        self.persist(&guard)
    }

    pub fn clear_focus(&self) -> Result<()> {
        self.update_focus(FocusSettings::default())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
