//! Outbound application events.
//!
//! The [`Controller`](super::service::Controller) emits these through the
//! [`EventSink`](super::ports::EventSink) port and appends a one-line
//! rendering of each to the event-log buffer.

use core::fmt;

use crate::error::PublishError;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The controller has started.
    Booted { version: &'static str },

    /// Discovery finished (complete or not).
    DiscoveryFinished {
        found: usize,
        expected: usize,
        passes: u8,
    },

    /// A bus never completed a scan within its budget.
    BusSkipped { bus: usize, attempts: u16 },

    /// Two resolved slots share the same factory address.
    DuplicateAddresses,

    /// One sample cycle completed.
    SampleTaken {
        cycle: u32,
        invalid_slots: usize,
        total_power_w: f32,
    },

    /// A compact report went out.
    Published { channel: &'static str, bytes: usize },

    /// The publish channel refused or throttled a report.
    PublishFailed(PublishError),

    /// A report buffer overflowed and was truncated.
    ReportTruncated { buffer: &'static str },
}

impl fmt::Display for AppEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Booted { version } => write!(f, "boot v{}", version),
            Self::DiscoveryFinished {
                found,
                expected,
                passes,
            } => write!(f, "found {}/{} in {} pass(es)", found, expected, passes),
            Self::BusSkipped { bus, attempts } => {
                write!(f, "bus {} skipped after {} attempts", bus, attempts)
            }
            Self::DuplicateAddresses => write!(f, "duplicate probe address"),
            Self::SampleTaken {
                cycle,
                invalid_slots,
                total_power_w,
            } => write!(
                f,
                "sample #{} {:.0}W invalid={}",
                cycle, total_power_w, invalid_slots
            ),
            Self::Published { channel, bytes } => write!(f, "published {} ({}B)", channel, bytes),
            Self::PublishFailed(e) => write!(f, "publish failed: {}", e),
            Self::ReportTruncated { buffer } => write!(f, "{} truncated", buffer),
        }
    }
}
