pub mod monitor;
pub mod recovery;
pub mod status;

pub use monitor::{MonitorError, MonitorHandle, MonitorState, MonitorView, StatusMonitor};
pub use recovery::RecoveryAction;
