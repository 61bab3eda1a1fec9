//! Sensor locator: maps discovered probes onto stable logical slots.
//!
//! Each bus owns a fixed, contiguous range of slots sized by its expected
//! probe count.  Discovery walks the buses in index order:
//!
//! ```text
//!  pass ──▶ bus 0 ──▶ bus 1 ──▶ … ──▶ bus N-1 ──▶ found ≥ expected? ──▶ done
//!            │ attempt 1..=B: reset_scan, next_address × expected
//!            │   any None → restart this bus
//!            │ all present → lookup names, fill the bus's slots
//!            └ budget exhausted → bus skipped this pass
//! ```
//!
//! A bus that never completes leaves its own slots empty; other buses keep
//! their positions, so coils wired elsewhere are unaffected.  Buses that
//! resolved in an earlier pass are not rescanned.

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use log::{debug, info, warn};
use serde::Serialize;

use super::address::SensorAddress;
use super::registry::SensorRegistry;
use crate::app::ports::BusTransceiver;
use crate::config::{MAX_BUSES, MAX_SENSORS_PER_BUS, MonitorConfig};

/// Maximum number of slots the table can hold.
pub const MAX_SLOTS: usize = MAX_BUSES * MAX_SENSORS_PER_BUS;

/// Name shown for a probe that is not in the registry.
pub const UNKNOWN_NAME: &str = "unknown";

// ═══════════════════════════════════════════════════════════════
//  Slot table
// ═══════════════════════════════════════════════════════════════

/// A probe assigned to a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiscoveredSensor {
    pub slot: usize,
    pub bus: usize,
    pub address: SensorAddress,
    /// Registry name, or `None` when the probe is not catalogued.
    pub name: Option<&'static str>,
}

impl DiscoveredSensor {
    /// Registry name or [`UNKNOWN_NAME`].
    pub fn display_name(&self) -> &'static str {
        self.name.unwrap_or(UNKNOWN_NAME)
    }
}

/// Slot index → assigned probe.  Empty slots are unresolved.
#[derive(Debug, Clone, Default)]
pub struct SensorTable {
    slots: Vec<Option<DiscoveredSensor>, MAX_SLOTS>,
}

impl SensorTable {
    /// A table of `count` empty slots (clamped to [`MAX_SLOTS`]).
    pub fn with_slots(count: usize) -> Self {
        let mut slots = Vec::new();
        for _ in 0..count.min(MAX_SLOTS) {
            let _ = slots.push(None);
        }
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<&DiscoveredSensor> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Every slot in index order, resolved or not.
    pub fn slots(&self) -> &[Option<DiscoveredSensor>] {
        &self.slots
    }

    /// Resolved slots only.
    pub fn resolved(&self) -> impl Iterator<Item = &DiscoveredSensor> {
        self.slots.iter().flatten()
    }

    pub fn resolved_count(&self) -> usize {
        self.resolved().count()
    }

    fn assign(&mut self, sensor: DiscoveredSensor) {
        if let Some(slot) = self.slots.get_mut(sensor.slot) {
            *slot = Some(sensor);
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Uniqueness diagnostic
// ═══════════════════════════════════════════════════════════════

/// Outcome of the pairwise duplicate-address check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Uniqueness {
    AllUnique,
    DuplicateFound,
}

/// Compare every unordered pair of addresses byte for byte.
pub fn check_addresses_unique(addresses: &[SensorAddress]) -> Uniqueness {
    for (i, a) in addresses.iter().enumerate() {
        if addresses[i + 1..].iter().any(|b| a.bytes() == b.bytes()) {
            return Uniqueness::DuplicateFound;
        }
    }
    Uniqueness::AllUnique
}

/// Duplicate check over every resolved slot of `table`.
///
/// Diagnostic only: the locator never calls this, callers decide how to
/// react.
pub fn check_unique(table: &SensorTable) -> Uniqueness {
    let addresses: Vec<SensorAddress, MAX_SLOTS> = table.resolved().map(|s| s.address).collect();
    check_addresses_unique(&addresses)
}

// ═══════════════════════════════════════════════════════════════
//  Discovery report
// ═══════════════════════════════════════════════════════════════

/// What happened on one bus across all discovery passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BusOutcome {
    pub bus: usize,
    pub expected: u8,
    /// Bus-level scan attempts spent, summed over passes.
    pub attempts_used: u16,
    pub resolved: bool,
}

/// Summary of a discovery run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryReport {
    pub found: usize,
    pub expected: usize,
    /// Global passes actually run.
    pub passes: u8,
    pub buses: Vec<BusOutcome, MAX_BUSES>,
}

impl DiscoveryReport {
    pub fn is_complete(&self) -> bool {
        self.found >= self.expected
    }

    /// Buses that never completed a scan.
    pub fn skipped_buses(&self) -> impl Iterator<Item = &BusOutcome> {
        self.buses.iter().filter(|b| !b.resolved)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Locator
// ═══════════════════════════════════════════════════════════════

/// Probes every bus and fills the slot table.
pub struct SensorLocator {
    registry: SensorRegistry<'static>,
    layout: Vec<u8, MAX_BUSES>,
    expected: usize,
    bus_attempts: u8,
    discovery_attempts: u8,
    retry_delay_ms: u32,
}

impl SensorLocator {
    pub fn new(registry: SensorRegistry<'static>, config: &MonitorConfig) -> Self {
        Self {
            registry,
            layout: config.bus_sensor_counts.clone(),
            expected: config.expected_sensors as usize,
            bus_attempts: config.bus_scan_attempts,
            discovery_attempts: config.discovery_attempts,
            retry_delay_ms: config.retry_delay_ms,
        }
    }

    /// Run discovery over `buses` (indexed by bus id).
    pub fn discover<B: BusTransceiver, D: DelayNs>(
        &self,
        buses: &mut [B],
        delay: &mut D,
    ) -> (SensorTable, DiscoveryReport) {
        let slot_count: usize = self.layout.iter().map(|&c| c as usize).sum();
        let mut table = SensorTable::with_slots(slot_count);
        let mut report = DiscoveryReport {
            found: 0,
            expected: self.expected,
            passes: 0,
            buses: self
                .layout
                .iter()
                .enumerate()
                .map(|(bus, &expected)| BusOutcome {
                    bus,
                    expected,
                    attempts_used: 0,
                    resolved: false,
                })
                .collect(),
        };

        for pass in 1..=self.discovery_attempts {
            report.passes = pass;
            let mut first_slot = 0usize;

            for (bus_id, &count) in self.layout.iter().enumerate() {
                let slot_start = first_slot;
                first_slot += count as usize;

                let outcome = &mut report.buses[bus_id];
                if outcome.resolved {
                    continue;
                }
                let Some(bus) = buses.get_mut(bus_id) else {
                    warn!("locator: no transceiver for bus {}, skipping", bus_id);
                    continue;
                };

                let (scanned, attempts) = self.scan_bus(bus, count as usize, delay);
                outcome.attempts_used += u16::from(attempts);

                let Some(addresses) = scanned else {
                    warn!(
                        "locator: bus {} failed {} attempts in pass {}, skipped",
                        bus_id, attempts, pass
                    );
                    continue;
                };

                for (offset, address) in addresses.iter().enumerate() {
                    let name = self.registry.lookup(address);
                    if name.is_none() {
                        warn!("locator: bus {} found unregistered probe {}", bus_id, address);
                    }
                    table.assign(DiscoveredSensor {
                        slot: slot_start + offset,
                        bus: bus_id,
                        address: *address,
                        name,
                    });
                }
                outcome.resolved = true;
                info!(
                    "locator: bus {} resolved {} probe(s) after {} attempt(s)",
                    bus_id, count, attempts
                );
            }

            report.found = table.resolved_count();
            if report.is_complete() {
                break;
            }
            info!(
                "locator: pass {} found {}/{} probes",
                pass, report.found, report.expected
            );
        }

        info!(
            "locator: discovery finished, {}/{} probes in {} pass(es)",
            report.found, report.expected, report.passes
        );
        (table, report)
    }

    /// Up to `bus_attempts` scans for exactly `expected` addresses.
    ///
    /// Returns the addresses in discovery order (or `None`) and the number of
    /// attempts spent.
    pub fn scan_bus<B: BusTransceiver + ?Sized, D: DelayNs>(
        &self,
        bus: &mut B,
        expected: usize,
        delay: &mut D,
    ) -> (Option<Vec<SensorAddress, MAX_SENSORS_PER_BUS>>, u8) {
        let expected = expected.min(MAX_SENSORS_PER_BUS);

        for attempt in 1..=self.bus_attempts {
            bus.reset_scan();
            let mut found: Vec<SensorAddress, MAX_SENSORS_PER_BUS> = Vec::new();

            while found.len() < expected {
                match bus.next_address() {
                    Some(address) => {
                        let _ = found.push(address);
                    }
                    None => break,
                }
            }

            if found.len() == expected {
                return (Some(found), attempt);
            }

            debug!(
                "locator: scan attempt {}/{} enumerated {}/{}",
                attempt,
                self.bus_attempts,
                found.len(),
                expected
            );
            if attempt < self.bus_attempts {
                delay.delay_ms(self.retry_delay_ms);
            }
        }
        (None, self.bus_attempts)
    }
}
