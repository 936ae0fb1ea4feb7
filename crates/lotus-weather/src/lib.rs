//! Weather engine for the Lotus sidebar
//!
//! Fetches station observations, keeps every payload as a timestamped
//! snapshot, and resolves what the sidebar shows when the feed reports
//! "no data".

pub mod types;
pub mod store;
pub mod provider;
pub mod resolve;
pub mod view;

pub use types::*;
pub use store::{SnapshotEntry, SnapshotStore};
pub use provider::WeatherProvider;
pub use resolve::{
    resolve_field, resolve_field_named, resolve_forecast_window, resolve_from_history,
    FieldPolicy,
};
pub use view::WeatherView;
