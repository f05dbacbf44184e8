pub mod archive;
pub mod error;
pub mod monitor;
pub mod schedules;
pub mod sources;
pub mod station;
