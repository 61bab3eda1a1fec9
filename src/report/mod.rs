//! Report buffers, text formats and the throttled publish path.

pub mod buffer;
pub mod format;
pub mod publish;

pub use buffer::{BoundedBuffer, OVERFLOW_MARKER, Overflow};
pub use publish::RateLimitedPublisher;
