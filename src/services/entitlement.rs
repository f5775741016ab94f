//! Subscription check performed before a session may start.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{error, info, warn};
use serde::Serialize;
use thiserror::Error;

const VERIFY_FAILED_MESSAGE: &str =
    "We couldn't verify your subscription right now. Check your connection and try again.";
const NO_OFFERINGS_MESSAGE: &str =
    "No subscription options are available right now. Please try again in a moment.";

#[derive(Debug, Error)]
pub enum EntitlementError {
    #[error("network error: {0}")]
    Network(String),

    #[error("entitlement request timed out after {0:?}")]
    Timeout(Duration),

    #[error("no offerings are currently available")]
    NoOfferings,

    #[error("entitlement service error: {0}")]
    Service(String),
}

impl EntitlementError {
    pub fn user_message(&self) -> &'static str {
        match self {
            EntitlementError::NoOfferings => NO_OFFERINGS_MESSAGE,
            _ => VERIFY_FAILED_MESSAGE,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CustomerInfo {
    pub active_entitlements: Vec<String>,
}

impl CustomerInfo {
    pub fn has_active_entitlement(&self) -> bool {
        !self.active_entitlements.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offering {
    pub identifier: String,
}

#[async_trait]
pub trait EntitlementService: Send + Sync {
    async fn customer_info(&self) -> Result<CustomerInfo, EntitlementError>;
    async fn current_offering(&self) -> Result<Option<Offering>, EntitlementError>;
}

/// Treats every user as subscribed. Used when no purchase backend is wired.
#[derive(Debug, Default)]
pub struct AlwaysEntitled;

#[async_trait]
impl EntitlementService for AlwaysEntitled {
    async fn customer_info(&self) -> Result<CustomerInfo, EntitlementError> {
        Ok(CustomerInfo {
            active_entitlements: vec!["premium".into()],
        })
    }

    async fn current_offering(&self) -> Result<Option<Offering>, EntitlementError> {
        Ok(None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum AccessDecision {
    Allowed,
    PaywallRequired { offering_id: String },
    /// Check failed; the user may dismiss and retry.
    Blocked { message: String },
}

pub struct PaywallGate {
    service: Arc<dyn EntitlementService>,
    timeout: Duration,
    free_sessions: u64,
}

impl PaywallGate {
    pub fn new(service: Arc<dyn EntitlementService>, timeout: Duration, free_sessions: u64) -> Self {
        Self {
            service,
            timeout,
            free_sessions,
        }
    }

    pub async fn check(&self, completed_sessions: u64) -> AccessDecision {
        if completed_sessions < self.free_sessions {
            return AccessDecision::Allowed;
        }

        info!("Checking entitlement before starting session");
        let customer = match self.with_timeout(self.service.customer_info()).await {
            Ok(customer) => customer,
            Err(err) => {
                warn!("Entitlement check failed: {err}");
                return AccessDecision::Blocked {
                    message: err.user_message().to_string(),
                };
            }
        };

        if customer.has_active_entitlement() {
            return AccessDecision::Allowed;
        }

        match self.with_timeout(self.service.current_offering()).await {
            Ok(Some(offering)) => {
                info!("Presenting paywall with offering {}", offering.identifier);
                AccessDecision::PaywallRequired {
                    offering_id: offering.identifier,
                }
            }
            Ok(None) => {
                error!("No current offering available for paywall");
                AccessDecision::Blocked {
                    message: EntitlementError::NoOfferings.user_message().to_string(),
                }
            }
            Err(err) => {
                error!("Failed to fetch offerings: {err}");
                AccessDecision::Blocked {
                    message: err.user_message().to_string(),
                }
            }
        }
    }

    async fn with_timeout<T, F>(&self, fut: F) -> Result<T, EntitlementError>
    where
        F: std::future::Future<Output = Result<T, EntitlementError>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| EntitlementError::Timeout(self.timeout))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeService {
        entitled: bool,
        offering: Option<&'static str>,
        fail_customer: bool,
        hang: bool,
        customer_calls: AtomicUsize,
    }

    #[async_trait]
    impl EntitlementService for FakeService {
        async fn customer_info(&self) -> Result<CustomerInfo, EntitlementError> {
            self.customer_calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if self.fail_customer {
                return Err(EntitlementError::Network("offline".into()));
            }
            Ok(CustomerInfo {
                active_entitlements: if self.entitled {
                    vec!["premium".into()]
                } else {
                    Vec::new()
                },
            })
        }

        async fn current_offering(&self) -> Result<Option<Offering>, EntitlementError> {
            Ok(self.offering.map(|id| Offering {
                identifier: id.into(),
            }))
        }
    }

    fn gate(service: FakeService) -> (PaywallGate, Arc<FakeService>) {
        let service = Arc::new(service);
        (
            PaywallGate::new(service.clone(), Duration::from_millis(50), 1),
            service,
        )
    }

    #[tokio::test]
    async fn first_session_skips_the_check() {
        let (gate, service) = gate(FakeService::default());
        assert_eq!(gate.check(0).await, AccessDecision::Allowed);
        assert_eq!(service.customer_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn entitled_user_is_allowed() {
        let (gate, _) = gate(FakeService {
            entitled: true,
            ..Default::default()
        });
        assert_eq!(gate.check(3).await, AccessDecision::Allowed);
    }

    #[tokio::test]
    async fn unentitled_user_sees_offering() {
        let (gate, _) = gate(FakeService {
            offering: Some("default"),
            ..Default::default()
        });
        assert_eq!(
            gate.check(1).await,
            AccessDecision::PaywallRequired {
                offering_id: "default".into()
            }
        );
    }

    #[tokio::test]
    async fn missing_offering_blocks_with_message() {
        let (gate, _) = gate(FakeService::default());
        assert_eq!(
            gate.check(1).await,
            AccessDecision::Blocked {
                message: NO_OFFERINGS_MESSAGE.into()
            }
        );
    }

    #[tokio::test]
    async fn network_failure_blocks_with_retry_message() {
        let (gate, _) = gate(FakeService {
            fail_customer: true,
            ..Default::default()
        });
        assert_eq!(
            gate.check(2).await,
            AccessDecision::Blocked {
                message: VERIFY_FAILED_MESSAGE.into()
            }
        );
    }

    #[tokio::test]
    async fn slow_service_times_out_like_network_failure() {
        let (gate, _) = gate(FakeService {
            hang: true,
            entitled: true,
            ..Default::default()
        });
        assert_eq!(
            gate.check(2).await,
            AccessDecision::Blocked {
                message: VERIFY_FAILED_MESSAGE.into()
            }
        );
    }
}
