//! System configuration parameters
//!
//! All tunable parameters for the coil monitor.  Values are fixed at build
//! time through [`MonitorConfig::default`]; the core never reconfigures them
//! at runtime.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Upper bound on the number of single-wire buses.
pub const MAX_BUSES: usize = 12;

/// Upper bound on sensors expected on a single bus.
pub const MAX_SENSORS_PER_BUS: usize = 8;

/// Number of Hall-effect flow channels (one per real coil).
pub const FLOW_CHANNELS: usize = 8;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    // --- Bus layout ---
    /// Expected sensor count on each bus, indexed by bus id.
    pub bus_sensor_counts: Vec<u8, MAX_BUSES>,
    /// Total sensors expected across all buses.
    pub expected_sensors: u8,

    // --- Retry budgets ---
    /// Scan attempts per bus within one discovery pass.
    pub bus_scan_attempts: u8,
    /// End-to-end discovery passes.
    pub discovery_attempts: u8,
    /// Reads per temperature sample before reporting invalid.
    pub temp_read_attempts: u8,
    /// Pause between failed bus attempts (milliseconds).
    pub retry_delay_ms: u32,

    // --- Timing ---
    /// Main loop tick (milliseconds).
    pub tick_interval_ms: u32,
    /// Sample cycle period (milliseconds).
    pub sample_interval_ms: u32,
    /// Report/publish period (milliseconds).
    pub report_interval_ms: u32,
    /// Publish tokens refilled per second.
    pub publish_rate_per_sec: u32,
    /// Publish bucket capacity (back-to-back publishes allowed).
    pub publish_burst: u32,
    /// Wait after broadcasting a temperature conversion (milliseconds).
    pub conversion_wait_ms: u32,
    /// Loop stall that triggers a watchdog reset (milliseconds).
    pub watchdog_timeout_ms: u32,

    // --- Calibration ---
    /// Flow turbine pulses per litre.
    pub pulses_per_liter: f32,
    /// Specific heat of water (J / kg / °C).
    pub specific_heat_j_per_kg_c: f32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let mut bus_sensor_counts = Vec::new();
        // Seven buses run along the collector rows in pairs; buses 7 and 8
        // each carry a single ambient probe (sun, shade).
        for count in [2u8, 2, 2, 2, 2, 2, 2, 1, 1] {
            let _ = bus_sensor_counts.push(count);
        }

        Self {
            bus_sensor_counts,
            expected_sensors: 16,

            bus_scan_attempts: 5,
            discovery_attempts: 3,
            temp_read_attempts: 5,
            retry_delay_ms: 50,

            tick_interval_ms: 1000,
            sample_interval_ms: 60_000, // 1/min
            report_interval_ms: 60_000,
            publish_rate_per_sec: 1, // at most one publish per second
            publish_burst: 1,
            conversion_wait_ms: 750, // 12-bit resolution
            watchdog_timeout_ms: 10_000,

            pulses_per_liter: 486.0,
            specific_heat_j_per_kg_c: 4186.0,
        }
    }
}

impl MonitorConfig {
    /// Number of buses described by the layout.
    pub fn bus_count(&self) -> usize {
        self.bus_sensor_counts.len()
    }

    /// Total slots implied by the bus layout.
    pub fn slot_count(&self) -> usize {
        self.bus_sensor_counts.iter().map(|&c| c as usize).sum()
    }

    /// Reject layouts and budgets the locator/aggregator cannot work with.
    pub fn validate(&self) -> Result<(), Error> {
        if self.bus_sensor_counts.is_empty() {
            return Err(Error::Config("no buses configured"));
        }
        if self
            .bus_sensor_counts
            .iter()
            .any(|&c| c as usize > MAX_SENSORS_PER_BUS)
        {
            return Err(Error::Config("too many sensors on one bus"));
        }
        if self.slot_count() != self.expected_sensors as usize {
            return Err(Error::Config("expected_sensors does not match bus layout"));
        }
        if self.bus_scan_attempts == 0 || self.discovery_attempts == 0 {
            return Err(Error::Config("discovery retry budgets must be non-zero"));
        }
        if self.temp_read_attempts == 0 {
            return Err(Error::Config("temp_read_attempts must be non-zero"));
        }
        if self.tick_interval_ms == 0
            || self.sample_interval_ms < self.tick_interval_ms
            || self.report_interval_ms < self.tick_interval_ms
        {
            return Err(Error::Config("periods must be at least one tick"));
        }
        if self.watchdog_timeout_ms <= self.tick_interval_ms.saturating_add(self.conversion_wait_ms) {
            return Err(Error::Config("watchdog would fire during a sample tick"));
        }
        if self.publish_rate_per_sec == 0 || self.publish_burst == 0 {
            return Err(Error::Config("publish rate and burst must be non-zero"));
        }
        if !(self.pulses_per_liter > 0.0) || !(self.specific_heat_j_per_kg_c > 0.0) {
            return Err(Error::Config("calibration constants must be positive"));
        }
        Ok(())
    }
}
