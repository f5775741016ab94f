mod app_state;
pub mod keys;

pub use app_state::{AppEvent, AppSnapshot, AppState, DEFAULT_DOPAMINE_INDEX};
