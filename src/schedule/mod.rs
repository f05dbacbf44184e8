pub mod cache;
pub mod snapshot;

pub use cache::ScheduleService;
pub use snapshot::{ScheduleSnapshot, ScheduleView, ScheduledScan};
