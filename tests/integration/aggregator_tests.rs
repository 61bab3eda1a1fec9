//! Sample cycles over a discovered installation: flow and power figures,
//! bounded read retry and invalid propagation.

use crate::mock_bus::{MockBus, NoDelay, coil_temps, installed_buses};
use solarcoil::coils::COILS;
use solarcoil::config::MonitorConfig;
use solarcoil::sensors::aggregator::{ReadingAggregator, SampleSnapshot};
use solarcoil::sensors::flow::FlowCounters;
use solarcoil::sensors::locator::{SensorLocator, SensorTable};
use solarcoil::sensors::registry::SensorRegistry;

/// Inflow 25 °C, outflow 30 °C on every coil; sun 35, shade 22.
fn temps() -> [f32; 16] {
    coil_temps(25.0, 30.0, 35.0, 22.0)
}

struct Rig {
    config: MonitorConfig,
    buses: Vec<MockBus>,
    table: SensorTable,
    flow: FlowCounters,
    aggregator: ReadingAggregator,
}

impl Rig {
    fn new() -> Self {
        let config = MonitorConfig::default();
        let mut buses = installed_buses(&temps());
        let (table, _) = SensorLocator::new(SensorRegistry::installed(), &config)
            .discover(&mut buses, &mut NoDelay);
        let flow = FlowCounters::new();
        let mut aggregator = ReadingAggregator::new(&config);
        aggregator.prime(&flow, 0);
        Self {
            config,
            buses,
            table,
            flow,
            aggregator,
        }
    }

    fn pulses(&self, channel: usize, n: u32) {
        for _ in 0..n {
            self.flow.record_pulse(channel);
        }
    }

    fn sample(&mut self, now_ms: u64) -> SampleSnapshot {
        self.aggregator.sample(
            now_ms,
            &mut self.buses,
            &self.table,
            &self.flow,
            &COILS,
            &mut NoDelay,
        )
    }
}

#[test]
fn one_minute_of_flow_on_coil_one() {
    let mut rig = Rig::new();
    rig.pulses(0, 972);

    let snap = rig.sample(60_000);
    assert_eq!(snap.cycle, 1);
    assert_eq!(snap.elapsed_ms, Some(60_000));

    let c1 = &snap.coils[0];
    assert_eq!(c1.name, "C1");
    assert_eq!(c1.delta_pulses, 972);
    assert!((c1.delta_liters - 2.0).abs() < 1e-6);
    assert!((c1.flow_lps.unwrap() - 0.033_333).abs() < 1e-5);
    assert!((c1.delta_t_c.unwrap() - 5.0).abs() < 1e-6);
    assert!((c1.power_w.unwrap() - 697.67).abs() < 0.01);

    // No flow elsewhere: zero power, not invalid.
    assert_eq!(snap.coils[1].power_w, Some(0.0));
    assert!((snap.total_power_w() - 697.67).abs() < 0.01);
}

#[test]
fn every_coil_reads_its_own_supply_and_outlet() {
    let mut rig = Rig::new();
    let snap = rig.sample(60_000);
    for coil in &snap.coils {
        assert_eq!(coil.inflow_c, Some(25.0), "{} inflow", coil.name);
        assert_eq!(coil.outflow_c, Some(30.0), "{} outflow", coil.name);
        assert_eq!(coil.delta_t_c, Some(5.0), "{} dT", coil.name);
    }
}

#[test]
fn baseline_advances_between_cycles() {
    let mut rig = Rig::new();
    rig.pulses(3, 486);
    let first = rig.sample(60_000);
    assert_eq!(first.coils[3].delta_pulses, 486);

    let second = rig.sample(120_000);
    assert_eq!(second.cycle, 2);
    assert_eq!(second.coils[3].delta_pulses, 0);
    assert_eq!(rig.aggregator.baseline(3), Some(486));
}

#[test]
fn ambient_comes_from_the_pseudo_coil() {
    let mut rig = Rig::new();
    let snap = rig.sample(60_000);
    assert_eq!(snap.coils.len(), 8);
    assert_eq!(snap.ambient.sun_c, Some(35.0));
    assert_eq!(snap.ambient.shade_c, Some(22.0));
    assert!(snap.coils.iter().all(|c| c.name != "Air"));
}

#[test]
fn read_succeeding_on_last_attempt_is_valid() {
    let mut rig = Rig::new();
    let attempts = u32::from(rig.config.temp_read_attempts);
    rig.buses[0].probe_mut(0).corrupt_reads = attempts - 1;

    let snap = rig.sample(60_000);
    assert_eq!(snap.temperatures[0], Some(25.0));
    assert_eq!(snap.invalid_slots(), 0);
}

#[test]
fn exhausted_read_budget_propagates_invalid() {
    let mut rig = Rig::new();
    let attempts = u32::from(rig.config.temp_read_attempts);
    rig.buses[0].probe_mut(1).corrupt_reads = attempts;
    rig.pulses(0, 972);

    let snap = rig.sample(60_000);
    assert_eq!(snap.temperatures[1], None);
    assert_eq!(snap.invalid_slots(), 1);

    let c1 = &snap.coils[0];
    assert_eq!(c1.outflow_c, None);
    assert_eq!(c1.delta_t_c, None);
    assert_eq!(c1.power_w, None);
    // Flow does not depend on temperature.
    assert!(c1.flow_lps.is_some());
}

#[test]
fn shared_inflow_probe_is_read_once_per_cycle() {
    let mut rig = Rig::new();
    let before = rig.buses[4].reads;
    let snap = rig.sample(60_000);

    // Bus 4 carries "C5-6 in" and "C5 out".
    assert_eq!(rig.buses[4].reads - before, 2);
    assert_eq!(snap.coils[4].inflow_c, snap.coils[5].inflow_c);
    assert!(rig.buses.iter().all(|b| b.conversions == 1));
}

#[test]
fn unresolved_slots_read_invalid() {
    let config = MonitorConfig::default();
    let mut buses = installed_buses(&temps());
    buses[2].failing_scans = u32::MAX;
    let (table, _) = SensorLocator::new(SensorRegistry::installed(), &config)
        .discover(&mut buses, &mut NoDelay);
    let flow = FlowCounters::new();
    let mut aggregator = ReadingAggregator::new(&config);
    aggregator.prime(&flow, 0);

    let snap = aggregator.sample(60_000, &mut buses, &table, &flow, &COILS, &mut NoDelay);
    let c3 = &snap.coils[2];
    assert_eq!((c3.inflow_c, c3.outflow_c), (None, None));
    assert_eq!(snap.invalid_slots(), 2);
    assert!(snap.coils[3].delta_t_c.is_some());
}

#[test]
fn repeated_timestamp_suppresses_rates() {
    let mut rig = Rig::new();
    rig.sample(60_000);
    rig.pulses(0, 100);
    let snap = rig.sample(60_000);
    assert_eq!(snap.elapsed_ms, None);
    assert_eq!(snap.coils[0].flow_lps, None);
    assert_eq!(snap.coils[0].power_w, None);
    assert_eq!(snap.coils[0].delta_pulses, 100);
}
