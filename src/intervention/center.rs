use std::sync::Arc;

use log::{debug, info};
use tokio::sync::watch;
use url::Url;

use super::link::{resolve_intervention, DetoxIntervention};

/// Holds the calm-wall request currently on screen. The presentation layer
/// subscribes and renders whatever value is current; `None` means no wall.
#[derive(Clone)]
pub struct InterventionCenter {
    current: Arc<watch::Sender<Option<DetoxIntervention>>>,
}

impl Default for InterventionCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl InterventionCenter {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            current: Arc::new(current),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<DetoxIntervention>> {
        self.current.subscribe()
    }

    pub fn current(&self) -> Option<DetoxIntervention> {
        self.current.borrow().clone()
    }

    /// Feed an inbound URL. Returns `true` when it was an intervention link.
    pub fn handle_url(&self, uri: &str) -> bool {
        match resolve_intervention(uri) {
            Some(intervention) => {
                info!("Showing calm wall for {}", intervention.display_name());
                self.current.send_replace(Some(intervention));
                true
            }
            None => {
                debug!("Ignoring non-intervention link {uri}");
                false
            }
        }
    }

    /// User chose to stay away; the wall closes without redirecting.
    pub fn dismiss(&self) {
        self.current.send_replace(None);
    }

    /// User chose to continue. Closes the wall and returns where to go next.
    pub fn proceed(&self) -> Option<Url> {
        self.current
            .send_replace(None)
            .and_then(|intervention| intervention.redirect_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_sees_wall_open_and_close() {
        let center = InterventionCenter::new();
        let mut rx = center.subscribe();

        assert!(center.handle_url("dopaminedetox://intervention?app=YouTube"));
        rx.changed().await.unwrap();
        assert_eq!(
            rx.borrow_and_update().as_ref().map(|i| i.app_name.clone()),
            Some("YouTube".to_string())
        );

        center.dismiss();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
    }

    #[test]
    fn foreign_link_leaves_state_untouched() {
        let center = InterventionCenter::new();
        center.handle_url("dopaminedetox://intervention?app=TikTok");
        assert!(!center.handle_url("mailto:someone@example.com"));
        assert_eq!(center.current().unwrap().app_name, "TikTok");
    }

    #[test]
    fn proceed_returns_redirect_and_clears() {
        let center = InterventionCenter::new();
        center.handle_url("dopaminedetox://intervention?app=Instagram&redirect=instagram%3A%2F%2Fapp");

        let target = center.proceed().unwrap();
        assert_eq!(target.as_str(), "instagram://app");
        assert!(center.current().is_none());
        assert!(center.proceed().is_none());
    }
}
