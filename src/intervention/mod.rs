mod center;
mod link;

pub use center::InterventionCenter;
pub use link::{build_intervention_url, resolve_intervention, DetoxIntervention, HOST, SCHEME};
