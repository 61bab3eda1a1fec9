//! Mock adapters for integration tests.
//!
//! `MockBus` plays a whole single-wire bus at the transceiver level: a
//! scripted list of probes, forced scan failures and forced integrity
//! failures.  Time comes from one thread-local timeline shared by
//! `MockClock` and the publish limiter.

use std::cell::Cell;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use solarcoil::app::events::AppEvent;
use solarcoil::app::ports::{BusTransceiver, Clock, EventSink, PublishPort, ValueRead};
use solarcoil::coils::COILS;
use solarcoil::config::MonitorConfig;
use solarcoil::error::PublishError;
use solarcoil::sensors::address::SensorAddress;
use solarcoil::sensors::registry::INSTALLED_PROBES;

// ── Timeline ──────────────────────────────────────────────────

thread_local! {
    static NOW_MS: Cell<u64> = const { Cell::new(0) };
}

pub fn reset_time() {
    NOW_MS.with(|t| t.set(0));
}

pub fn advance(ms: u64) {
    NOW_MS.with(|t| t.set(t.get() + ms));
}

pub fn mock_now() -> Duration {
    Duration::from_millis(NOW_MS.with(Cell::get))
}

pub struct MockClock;

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        NOW_MS.with(Cell::get)
    }
}

pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

// ── MockBus ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MockProbe {
    pub address: SensorAddress,
    pub raw: i16,
    /// Upcoming reads that fail the integrity check.
    pub corrupt_reads: u32,
}

#[derive(Debug, Default)]
pub struct MockBus {
    pub probes: Vec<MockProbe>,
    /// Upcoming scans that stop after the first probe.
    pub failing_scans: u32,
    pub scans: u32,
    pub reads: u32,
    pub conversions: u32,
    cursor: usize,
    this_scan_fails: bool,
}

#[allow(dead_code)]
impl MockBus {
    pub fn new(probes: Vec<MockProbe>) -> Self {
        Self {
            probes,
            ..Default::default()
        }
    }

    pub fn set_celsius(&mut self, address: &SensorAddress, c: f32) {
        if let Some(p) = self.probes.iter_mut().find(|p| p.address == *address) {
            p.raw = celsius_raw(c);
        }
    }

    pub fn probe_mut(&mut self, index: usize) -> &mut MockProbe {
        &mut self.probes[index]
    }
}

impl BusTransceiver for MockBus {
    fn reset_scan(&mut self) {
        self.scans += 1;
        self.cursor = 0;
        self.this_scan_fails = self.failing_scans > 0;
        if self.this_scan_fails {
            self.failing_scans -= 1;
        }
    }

    fn next_address(&mut self) -> Option<SensorAddress> {
        if self.this_scan_fails && self.cursor >= 1 {
            return None;
        }
        let probe = self.probes.get(self.cursor)?;
        self.cursor += 1;
        Some(probe.address)
    }

    fn read_value(&mut self, address: &SensorAddress) -> ValueRead {
        self.reads += 1;
        match self.probes.iter_mut().find(|p| p.address == *address) {
            Some(p) if p.corrupt_reads > 0 => {
                p.corrupt_reads -= 1;
                ValueRead::corrupt()
            }
            Some(p) => ValueRead::ok(p.raw),
            None => ValueRead::corrupt(),
        }
    }

    fn start_conversion(&mut self) {
        self.conversions += 1;
    }
}

pub fn celsius_raw(c: f32) -> i16 {
    (c * 16.0).round() as i16
}

/// The installed probes on their buses, slot `i` reading `temps[i]`.
///
/// Each bus hands out its probes in ROM search order, the order a real
/// search enumerates them and therefore the order slots are filled.
pub fn installed_buses(temps: &[f32; 16]) -> Vec<MockBus> {
    let config = MonitorConfig::default();
    let mut buses = Vec::new();
    let mut slot = 0;
    for &count in &config.bus_sensor_counts {
        let mut addresses: Vec<SensorAddress> = INSTALLED_PROBES[slot..slot + count as usize]
            .iter()
            .map(|e| e.address)
            .collect();
        addresses.sort_by_key(SensorAddress::search_order_key);
        let probes = addresses
            .into_iter()
            .enumerate()
            .map(|(offset, address)| MockProbe {
                address,
                raw: celsius_raw(temps[slot + offset]),
                corrupt_reads: 0,
            })
            .collect();
        slot += count as usize;
        buses.push(MockBus::new(probes));
    }
    buses
}

/// Inflow `inflow` °C and outflow `outflow` °C on every real coil; sun and
/// shade on the ambient pair.
pub fn coil_temps(inflow: f32, outflow: f32, sun: f32, shade: f32) -> [f32; 16] {
    let mut t = [0.0; 16];
    for coil in COILS.iter().filter(|c| !c.is_ambient()) {
        t[coil.inflow_slot] = inflow;
        t[coil.outflow_slot] = outflow;
    }
    if let Some(air) = COILS.iter().find(|c| c.is_ambient()) {
        t[air.inflow_slot] = sun;
        t[air.outflow_slot] = shade;
    }
    t
}

// ── Sinks ─────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

#[derive(Debug, Default)]
pub struct CapturePublisher {
    pub sent: Vec<(String, String)>,
}

impl PublishPort for CapturePublisher {
    fn publish(&mut self, channel: &str, payload: &str) -> Result<(), PublishError> {
        self.sent.push((channel.to_string(), payload.to_string()));
        Ok(())
    }
}
