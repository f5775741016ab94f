pub mod entitlement;
pub mod focus;

pub use entitlement::{
    AccessDecision, AlwaysEntitled, CustomerInfo, EntitlementError, EntitlementService, Offering,
    PaywallGate,
};
pub use focus::{FocusAutomation, FocusService, NoopFocusService};
