//! Reading aggregator: raw samples into physical quantities per coil.
//!
//! One call to [`ReadingAggregator::sample`] is one sample cycle:
//!
//! 1. elapsed time since the previous cycle, and every flow counter, are
//!    captured together;
//! 2. all buses start a conversion, then each resolved slot is read once
//!    (with bounded retry);
//! 3. per coil: flow rate from the pulse delta, ΔT = outflow − inflow,
//!    thermal power from volume and ΔT;
//! 4. the ambient pseudo-coil contributes the sun/shade readings.
//!
//! Invalid temperatures are `None` and stay `None` through ΔT and power.

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use log::debug;
use serde::Serialize;

use super::flow::{FlowCounters, pulse_delta};
use super::locator::{MAX_SLOTS, SensorTable};
use super::temperature::read_celsius;
use crate::app::ports::BusTransceiver;
use crate::coils::Coil;
use crate::config::{FLOW_CHANNELS, MonitorConfig};

/// Upper bound on configured coils (real + ambient).
pub const MAX_COILS: usize = 12;

// ═══════════════════════════════════════════════════════════════
//  Physics
// ═══════════════════════════════════════════════════════════════

/// Turbine pulses → litres.
pub fn pulses_to_liters(pulses: u32, pulses_per_liter: f32) -> f32 {
    pulses as f32 / pulses_per_liter
}

/// Litres over `elapsed_ms` → L/s.  `None` without a usable interval.
pub fn liters_per_second(liters: f32, elapsed_ms: Option<u64>) -> Option<f32> {
    let ms = elapsed_ms.filter(|&ms| ms > 0)?;
    Some(liters * (1000.0 / ms as f32))
}

/// ΔT = outflow − inflow.  Negative at night or with reversed flow.
pub fn delta_temperature(inflow_c: Option<f32>, outflow_c: Option<f32>) -> Option<f32> {
    Some(outflow_c? - inflow_c?)
}

/// Heat carried off by `delta_liters` of water warmed by `delta_t_c`,
/// averaged over `elapsed_ms` (W).  One litre is taken as one kilogram.
pub fn thermal_power_w(
    delta_liters: f32,
    delta_t_c: Option<f32>,
    elapsed_ms: Option<u64>,
    specific_heat_j_per_kg_c: f32,
) -> Option<f32> {
    let dt = delta_t_c?;
    let ms = elapsed_ms.filter(|&ms| ms > 0)?;
    let energy_j = specific_heat_j_per_kg_c * delta_liters * dt;
    Some(energy_j * 1000.0 / ms as f32)
}

// ═══════════════════════════════════════════════════════════════
//  Snapshot
// ═══════════════════════════════════════════════════════════════

/// One real coil's readings for a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoilReading {
    pub name: &'static str,
    pub inflow_c: Option<f32>,
    pub outflow_c: Option<f32>,
    pub delta_pulses: u32,
    pub delta_liters: f32,
    pub flow_lps: Option<f32>,
    pub delta_t_c: Option<f32>,
    pub power_w: Option<f32>,
}

/// Ambient air readings from the pseudo-coil.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Ambient {
    pub sun_c: Option<f32>,
    pub shade_c: Option<f32>,
}

/// Everything measured in one sample cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleSnapshot {
    /// Monotonic uptime at the start of the cycle.
    pub timestamp_ms: u64,
    /// 1-based cycle counter.
    pub cycle: u32,
    /// Interval since the previous cycle, `None` when unusable.
    pub elapsed_ms: Option<u64>,
    /// Per-slot temperature, indexed like the sensor table.
    pub temperatures: Vec<Option<f32>, MAX_SLOTS>,
    pub coils: Vec<CoilReading, MAX_COILS>,
    pub ambient: Ambient,
}

impl SampleSnapshot {
    /// Sum of every coil's valid power figure (W).
    pub fn total_power_w(&self) -> f32 {
        self.coils.iter().filter_map(|c| c.power_w).sum()
    }

    /// Slots whose read came back invalid this cycle.
    pub fn invalid_slots(&self) -> usize {
        self.temperatures.iter().filter(|t| t.is_none()).count()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Aggregator
// ═══════════════════════════════════════════════════════════════

/// Owns the per-channel flow baselines and the previous cycle's timestamp.
pub struct ReadingAggregator {
    baselines: [u32; FLOW_CHANNELS],
    last_sample_ms: Option<u64>,
    cycle: u32,
    pulses_per_liter: f32,
    specific_heat_j_per_kg_c: f32,
    temp_read_attempts: u8,
    conversion_wait_ms: u32,
}

impl ReadingAggregator {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            baselines: [0; FLOW_CHANNELS],
            last_sample_ms: None,
            cycle: 0,
            pulses_per_liter: config.pulses_per_liter,
            specific_heat_j_per_kg_c: config.specific_heat_j_per_kg_c,
            temp_read_attempts: config.temp_read_attempts,
            conversion_wait_ms: config.conversion_wait_ms,
        }
    }

    /// Adopt the current counts and time as the baseline, so the first cycle
    /// measures from here rather than from boot.
    pub fn prime(&mut self, flow: &FlowCounters, now_ms: u64) {
        for (ch, baseline) in self.baselines.iter_mut().enumerate() {
            *baseline = flow.count(ch);
        }
        self.last_sample_ms = Some(now_ms);
    }

    /// Last observed count for `channel`.
    pub fn baseline(&self, channel: usize) -> Option<u32> {
        self.baselines.get(channel).copied()
    }

    pub fn cycles(&self) -> u32 {
        self.cycle
    }

    /// Run one sample cycle.
    pub fn sample<B: BusTransceiver, D: DelayNs>(
        &mut self,
        now_ms: u64,
        buses: &mut [B],
        table: &SensorTable,
        flow: &FlowCounters,
        coils: &[Coil],
        delay: &mut D,
    ) -> SampleSnapshot {
        self.cycle = self.cycle.wrapping_add(1);

        // 1. Interval and flow counts, captured together.
        let elapsed_ms = self
            .last_sample_ms
            .map(|prev| now_ms.saturating_sub(prev))
            .filter(|&ms| ms > 0);
        if self.last_sample_ms.is_some() && elapsed_ms.is_none() {
            debug!("aggregator: zero or negative interval, rates suppressed");
        }
        self.last_sample_ms = Some(now_ms);

        let mut counts = [0u32; FLOW_CHANNELS];
        for (ch, count) in counts.iter_mut().enumerate() {
            *count = flow.count(ch);
        }

        // 2. Temperatures, one read per resolved slot.
        for bus in buses.iter_mut() {
            bus.start_conversion();
        }
        if self.conversion_wait_ms > 0 {
            delay.delay_ms(self.conversion_wait_ms);
        }

        let mut temperatures: Vec<Option<f32>, MAX_SLOTS> = Vec::new();
        for slot in table.slots() {
            let reading = slot.as_ref().and_then(|s| {
                let bus = buses.get_mut(s.bus)?;
                read_celsius(bus, &s.address, self.temp_read_attempts)
            });
            let _ = temperatures.push(reading);
        }
        let temp_of = |slot: usize| temperatures.get(slot).copied().flatten();

        // 3–4. Per coil.
        let mut readings: Vec<CoilReading, MAX_COILS> = Vec::new();
        let mut ambient = Ambient::default();

        for coil in coils {
            let inflow_c = temp_of(coil.inflow_slot);
            let outflow_c = temp_of(coil.outflow_slot);

            let Some(ch) = coil.flow_channel.filter(|&ch| ch < FLOW_CHANNELS) else {
                ambient = Ambient {
                    sun_c: inflow_c,
                    shade_c: outflow_c,
                };
                continue;
            };

            let delta_pulses = pulse_delta(self.baselines[ch], counts[ch]);
            self.baselines[ch] = counts[ch];

            let delta_liters = pulses_to_liters(delta_pulses, self.pulses_per_liter);
            let delta_t_c = delta_temperature(inflow_c, outflow_c);

            let _ = readings.push(CoilReading {
                name: coil.name,
                inflow_c,
                outflow_c,
                delta_pulses,
                delta_liters,
                flow_lps: liters_per_second(delta_liters, elapsed_ms),
                delta_t_c,
                power_w: thermal_power_w(
                    delta_liters,
                    delta_t_c,
                    elapsed_ms,
                    self.specific_heat_j_per_kg_c,
                ),
            });
        }

        SampleSnapshot {
            timestamp_ms: now_ms,
            cycle: self.cycle,
            elapsed_ms,
            temperatures,
            coils: readings,
            ambient,
        }
    }
}
