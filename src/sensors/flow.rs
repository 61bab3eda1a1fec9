//! Hall-effect turbine flow sensors, one per real coil.
//!
//! Each turbine outputs a pulse train (≈486 pulses per litre once
//! calibrated).  The GPIO ISR increments a per-channel atomic counter on
//! every rising edge; nothing else happens in interrupt context.
//!
//! The counters are never reset.  The aggregator keeps its own per-channel
//! baseline and subtracts, so a pulse landing between the read and the
//! baseline update is simply attributed to the next cycle.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::config::FLOW_CHANNELS;

/// Monotonic pulse counters for every flow channel.
#[derive(Debug)]
pub struct FlowCounters {
    counts: [AtomicU32; FLOW_CHANNELS],
}

/// Process-wide instance fed by the GPIO ISR.
/// `static` because ESP-IDF ISR callbacks cannot capture state.
pub static FLOW_COUNTERS: FlowCounters = FlowCounters::new();

impl FlowCounters {
    pub const fn new() -> Self {
        Self {
            counts: [const { AtomicU32::new(0) }; FLOW_CHANNELS],
        }
    }

    /// Called from the GPIO ISR on each rising edge.
    /// Lock-free single-word increment; out-of-range channels are ignored.
    #[inline]
    pub fn record_pulse(&self, channel: usize) {
        if let Some(c) = self.counts.get(channel) {
            c.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Current cumulative count for `channel` (0 for unknown channels).
    #[inline]
    pub fn count(&self, channel: usize) -> u32 {
        self.counts
            .get(channel)
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }
}

impl Default for FlowCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Pulses counted since `baseline`, tolerant of 32-bit rollover.
#[inline]
pub fn pulse_delta(baseline: u32, current: u32) -> u32 {
    current.wrapping_sub(baseline)
}
