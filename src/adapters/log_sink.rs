//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Booted { version } => {
                info!("START | version={}", version);
            }
            AppEvent::DiscoveryFinished {
                found,
                expected,
                passes,
            } => {
                if found < expected {
                    warn!("DISCO | found={}/{} passes={} | degraded", found, expected, passes);
                } else {
                    info!("DISCO | found={}/{} passes={}", found, expected, passes);
                }
            }
            AppEvent::BusSkipped { bus, attempts } => {
                warn!("DISCO | bus={} skipped attempts={}", bus, attempts);
            }
            AppEvent::DuplicateAddresses => {
                warn!("DISCO | duplicate address among resolved probes");
            }
            AppEvent::SampleTaken {
                cycle,
                invalid_slots,
                total_power_w,
            } => {
                info!(
                    "SAMPLE | cycle={} | P={:.0}W | invalid={}",
                    cycle, total_power_w, invalid_slots
                );
            }
            AppEvent::Published { channel, bytes } => {
                info!("PUB | channel={} | {}B", channel, bytes);
            }
            AppEvent::PublishFailed(e) => {
                warn!("PUB | failed: {}", e);
            }
            AppEvent::ReportTruncated { buffer } => {
                warn!("REPORT | {} truncated", buffer);
            }
        }
    }
}
