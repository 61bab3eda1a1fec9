//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller (domain)
//! ```
//!
//! Driven adapters (bus transceivers, clock, publish channel, event sinks)
//! implement these traits.  The [`Controller`](super::service::Controller)
//! consumes them via generics, so the acquisition core never touches
//! hardware directly.

use crate::error::PublishError;
use crate::sensors::address::SensorAddress;

// ───────────────────────────────────────────────────────────────
// Bus transceiver port (driven adapter: single-wire bus → domain)
// ───────────────────────────────────────────────────────────────

/// One raw value read from a sensor, with its integrity verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueRead {
    /// Raw two's-complement temperature, 1/16 °C per LSB.
    pub raw: i16,
    /// `true` when the transmission passed its CRC check.
    pub integrity_ok: bool,
}

impl ValueRead {
    pub const fn ok(raw: i16) -> Self {
        Self {
            raw,
            integrity_ok: true,
        }
    }

    pub const fn corrupt() -> Self {
        Self {
            raw: 0,
            integrity_ok: false,
        }
    }
}

/// Primitive operations on one shared single-wire bus.
///
/// One handle per physical bus; the bus id is the handle's index in the
/// controller's bus collection.
pub trait BusTransceiver {
    /// Restart device enumeration from the beginning.
    fn reset_scan(&mut self);

    /// Next device address in the current scan, or `None` when the scan is
    /// exhausted or failed.
    fn next_address(&mut self) -> Option<SensorAddress>;

    /// Read the current value of the device at `address`.
    fn read_value(&mut self, address: &SensorAddress) -> ValueRead;

    /// Ask every device on the bus to start a measurement.
    fn start_conversion(&mut self) {}
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Publish port (driven adapter: domain → cloud channel)
// ───────────────────────────────────────────────────────────────

/// Outbound telemetry channel.  Callers are responsible for spacing
/// calls; see [`RateLimitedPublisher`](crate::report::publish::RateLimitedPublisher).
pub trait PublishPort {
    fn publish(&mut self, channel: &str, payload: &str) -> Result<(), PublishError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from the controller)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the scheduler invokes when a schedule fires.
pub trait SchedulerDelegate {
    /// * `label`: the human-readable label of the schedule that fired.
    /// * `task`: what the schedule asks for.
    fn on_schedule_fired(&mut self, label: &str, task: ScheduledTask);
}

/// Work a schedule triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledTask {
    /// Run one sample cycle.
    Sample,
    /// Render and publish the latest snapshot.
    Report,
}
