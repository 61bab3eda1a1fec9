//! Discovery against mock buses: retry budgets, fixed slot ranges,
//! registry naming and the duplicate diagnostic.

use crate::mock_bus::{MockBus, MockProbe, NoDelay, installed_buses};
use solarcoil::config::MonitorConfig;
use solarcoil::sensors::address::{SensorAddress, crc8};
use solarcoil::sensors::locator::{SensorLocator, Uniqueness, check_unique};
use solarcoil::sensors::registry::{INSTALLED_PROBES, SensorRegistry};

const TEMPS: [f32; 16] = [20.0; 16];

fn locator() -> SensorLocator {
    SensorLocator::new(SensorRegistry::installed(), &MonitorConfig::default())
}

fn stranger(serial: u8) -> SensorAddress {
    let mut b = [0x28, serial, 0x01, 0x02, 0x03, 0x04, 0x05, 0];
    b[7] = crc8(&b[..7]);
    SensorAddress::new(b)
}

#[test]
fn healthy_installation_resolves_every_slot_in_one_pass() {
    let mut buses = installed_buses(&TEMPS);
    let (table, report) = locator().discover(&mut buses, &mut NoDelay);

    assert!(report.is_complete());
    assert_eq!(report.found, 16);
    assert_eq!(report.passes, 1);
    // Every installed probe lands on its own bus's slot range.
    let config = MonitorConfig::default();
    let mut first = 0;
    for (bus, &count) in config.bus_sensor_counts.iter().enumerate() {
        let range = first..first + count as usize;
        for entry in &INSTALLED_PROBES[range.clone()] {
            let s = table
                .resolved()
                .find(|s| s.address == entry.address)
                .expect("installed probe resolved");
            assert!(range.contains(&s.slot), "{} outside bus {}", entry.name, bus);
            assert_eq!(s.bus, bus);
            assert_eq!(s.display_name(), entry.name);
        }
        first = range.end;
    }
    assert!(buses.iter().all(|b| b.scans == 1));
}

#[test]
fn slots_within_a_bus_follow_search_order() {
    let mut buses = installed_buses(&TEMPS);
    let (table, _) = locator().discover(&mut buses, &mut NoDelay);
    // The C3 outlet probe enumerates ahead of the C3 supply probe.
    assert_eq!(table.get(4).map(|s| s.display_name()), Some("C3 out"));
    assert_eq!(table.get(5).map(|s| s.display_name()), Some("C3 in"));
    assert_eq!(table.get(10).map(|s| s.display_name()), Some("C7-8 in"));
    assert_eq!(table.get(11).map(|s| s.display_name()), Some("C6 out"));
}

#[test]
fn bus_that_recovers_within_budget_is_resolved() {
    let mut buses = installed_buses(&TEMPS);
    // Four bad scans, fifth succeeds: 4 < bus_scan_attempts.
    buses[3].failing_scans = 4;

    let (table, report) = locator().discover(&mut buses, &mut NoDelay);
    assert_eq!(report.found, 16);
    assert_eq!(report.passes, 1);
    assert_eq!(report.buses[3].attempts_used, 5);
    assert!(report.buses[3].resolved);
    assert_eq!(table.get(6).map(|s| s.display_name()), Some("C4 in"));
}

#[test]
fn dead_bus_is_skipped_without_shifting_later_slots() {
    let mut buses = installed_buses(&TEMPS);
    buses[2].failing_scans = u32::MAX;

    let (table, report) = locator().discover(&mut buses, &mut NoDelay);
    let config = MonitorConfig::default();
    let budget = u16::from(config.bus_scan_attempts) * u16::from(config.discovery_attempts);

    assert!(!report.is_complete());
    assert_eq!(report.found, 14);
    assert_eq!(report.passes, config.discovery_attempts);
    assert_eq!(report.buses[2].attempts_used, budget);
    assert_eq!(buses[2].scans, u32::from(budget));
    assert_eq!(report.skipped_buses().map(|b| b.bus).collect::<Vec<_>>(), vec![2]);

    // Bus 2 owns slots 4 and 5.
    assert!(table.get(4).is_none());
    assert!(table.get(5).is_none());
    assert_eq!(table.get(6).map(|s| s.display_name()), Some("C4 in"));
    assert_eq!(table.get(15).map(|s| s.display_name()), Some("Shade"));

    // Resolved buses were not rescanned in later passes.
    assert_eq!(buses[0].scans, 1);
}

#[test]
fn bus_recovering_in_a_later_pass_completes_discovery() {
    let mut buses = installed_buses(&TEMPS);
    let attempts = u32::from(MonitorConfig::default().bus_scan_attempts);
    buses[5].failing_scans = attempts + 2;

    let (_, report) = locator().discover(&mut buses, &mut NoDelay);
    assert!(report.is_complete());
    assert_eq!(report.passes, 2);
    assert_eq!(u32::from(report.buses[5].attempts_used), attempts + 3);
}

#[test]
fn missing_bus_handle_leaves_its_slots_unresolved() {
    let mut buses = installed_buses(&TEMPS);
    buses.pop(); // no shade bus

    let (table, report) = locator().discover(&mut buses, &mut NoDelay);
    assert_eq!(report.found, 15);
    assert!(table.get(15).is_none());
    assert_eq!(report.buses[8].attempts_used, 0);
}

#[test]
fn spare_and_unregistered_probes() {
    let mut buses = installed_buses(&TEMPS);
    // C1 in replaced from the spares drawer; C1 out by an uncatalogued probe.
    buses[0].probe_mut(0).address = INSTALLED_PROBES[16].address;
    buses[0].probe_mut(1).address = stranger(0x77);

    let (table, report) = locator().discover(&mut buses, &mut NoDelay);
    assert_eq!(report.found, 16);
    assert_eq!(table.get(0).map(|s| s.display_name()), Some("Spare A"));
    let unknown = table.get(1).expect("slot 1 resolved");
    assert_eq!(unknown.name, None);
    assert_eq!(unknown.display_name(), "unknown");
}

#[test]
fn duplicate_address_is_reported_not_corrected() {
    let mut buses = installed_buses(&TEMPS);
    // Bus 1 echoes bus 0's probes (crossed wiring).
    let echoed: Vec<MockProbe> = buses[0].probes.clone();
    buses[1] = MockBus::new(echoed);

    let (table, report) = locator().discover(&mut buses, &mut NoDelay);
    assert_eq!(report.found, 16);
    assert_eq!(check_unique(&table), Uniqueness::DuplicateFound);
    assert_eq!(table.get(2).map(|s| s.display_name()), Some("C1 in"));
}

#[test]
fn distinct_addresses_pass_uniqueness() {
    let mut buses = installed_buses(&TEMPS);
    let (table, _) = locator().discover(&mut buses, &mut NoDelay);
    assert_eq!(check_unique(&table), Uniqueness::AllUnique);
}
