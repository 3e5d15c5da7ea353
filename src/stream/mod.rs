//! Live event stream viewer

pub mod live_log;
pub mod ws;

pub use live_log::{parse_message, LiveEventLog, LogEntry, DEFAULT_MAX_ENTRIES};
pub use ws::follow;
