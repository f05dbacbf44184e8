pub mod client;
pub mod error;
#[cfg(test)]
pub mod fake;
pub mod types;

pub use client::{ControlApi, HttpControlClient};
pub use error::{ControlError, ControlResult};
pub use types::{
    ArchivedScan, ConfigSection, ConfigValue, HistoryEntry, SearchQuery, Source, Telemetry,
};
