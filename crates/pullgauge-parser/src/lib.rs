pub mod event;
pub mod stats;

pub use event::{PRINT_MARKER, StatusEvent, StreamFormat};
pub use stats::{ProcessingStats, QUEUE_CAPACITY, StatsSnapshot};
