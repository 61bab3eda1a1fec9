//! Text renderings of a sample cycle and of discovery.
//!
//! Each `render_*` function clears its buffer and writes the whole report;
//! [`append_event`] is the only appending writer.  Every function returns
//! `Err(Overflow)` when the buffer had to be truncated.

use core::fmt::{self, Write};

use super::buffer::{BoundedBuffer, Overflow};
use crate::app::events::AppEvent;
use crate::sensors::aggregator::SampleSnapshot;
use crate::sensors::locator::{DiscoveryReport, SensorTable, Uniqueness};

pub const EVENT_LOG_CAPACITY: usize = 622;
pub const VERBOSE_CAPACITY: usize = 622;
pub const DIAGNOSTIC_CAPACITY: usize = 622;
pub const COMPACT_CAPACITY: usize = 255;

pub type EventLog = BoundedBuffer<EVENT_LOG_CAPACITY>;
pub type VerboseReport = BoundedBuffer<VERBOSE_CAPACITY>;
pub type DiagnosticReport = BoundedBuffer<DIAGNOSTIC_CAPACITY>;
pub type CompactReport = BoundedBuffer<COMPACT_CAPACITY>;

/// `Option<f32>` at a fixed precision, `nan` when absent or non-finite.
#[derive(Debug, Clone, Copy)]
pub struct Fixed(pub Option<f32>, pub usize);

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            // `+ 0.0` turns -0.0 into 0.0.
            Some(v) if v.is_finite() => write!(f, "{:.*}", self.1, v + 0.0),
            _ => f.write_str("nan"),
        }
    }
}

fn temp(v: Option<f32>) -> Fixed {
    Fixed(v, 1)
}

fn flow(v: Option<f32>) -> Fixed {
    Fixed(v, 3)
}

fn watts(v: Option<f32>) -> Fixed {
    Fixed(v, 0)
}

// ── Verbose ──────────────────────────────────────────────────

/// Human-readable report with labeled fields.
pub fn render_verbose<const N: usize>(
    snap: &SampleSnapshot,
    out: &mut BoundedBuffer<N>,
) -> Result<(), Overflow> {
    out.clear();
    write_verbose(snap, out).map_err(|_| Overflow)
}

fn write_verbose(snap: &SampleSnapshot, w: &mut impl Write) -> fmt::Result {
    write!(
        w,
        "#{} t={}s sun={}C shade={}C",
        snap.cycle,
        snap.timestamp_ms / 1000,
        temp(snap.ambient.sun_c),
        temp(snap.ambient.shade_c)
    )?;
    for c in &snap.coils {
        write!(
            w,
            " | {} in={} out={} dT={} flow={}L/s P={}W",
            c.name,
            temp(c.inflow_c),
            temp(c.outflow_c),
            temp(c.delta_t_c),
            flow(c.flow_lps),
            watts(c.power_w)
        )?;
    }
    write!(w, " | total={}W", watts(Some(snap.total_power_w())))
}

// ── Compact ──────────────────────────────────────────────────

/// Comma-delimited publish payload: `sun,shade`, then per coil
/// `inflow,outflow,flow,power`.
pub fn render_compact<const N: usize>(
    snap: &SampleSnapshot,
    out: &mut BoundedBuffer<N>,
) -> Result<(), Overflow> {
    out.clear();
    write_compact(snap, out).map_err(|_| Overflow)
}

fn write_compact(snap: &SampleSnapshot, w: &mut impl Write) -> fmt::Result {
    write!(
        w,
        "{},{}",
        temp(snap.ambient.sun_c),
        temp(snap.ambient.shade_c)
    )?;
    for c in &snap.coils {
        write!(
            w,
            ",{},{},{},{}",
            temp(c.inflow_c),
            temp(c.outflow_c),
            flow(c.flow_lps),
            watts(c.power_w)
        )?;
    }
    Ok(())
}

// ── Diagnostic ───────────────────────────────────────────────

/// Discovery summary: totals, uniqueness, per-bus outcome, per-slot sensor.
pub fn render_diagnostic<const N: usize>(
    report: &DiscoveryReport,
    uniqueness: Uniqueness,
    table: &SensorTable,
    out: &mut BoundedBuffer<N>,
) -> Result<(), Overflow> {
    out.clear();
    write_diagnostic(report, uniqueness, table, out).map_err(|_| Overflow)
}

fn write_diagnostic(
    report: &DiscoveryReport,
    uniqueness: Uniqueness,
    table: &SensorTable,
    w: &mut impl Write,
) -> fmt::Result {
    let unique = match uniqueness {
        Uniqueness::AllUnique => "unique",
        Uniqueness::DuplicateFound => "DUPLICATE",
    };
    writeln!(
        w,
        "found {}/{} passes={} {}",
        report.found, report.expected, report.passes, unique
    )?;

    for b in &report.buses {
        let state = if b.resolved { "ok" } else { "SKIP" };
        write!(w, "b{} {} x{} a{}; ", b.bus, state, b.expected, b.attempts_used)?;
    }
    writeln!(w)?;

    for (slot, entry) in table.slots().iter().enumerate() {
        match entry {
            Some(s) => write!(w, "{}={} {}; ", slot, s.display_name(), s.address)?,
            None => write!(w, "{}=-; ", slot)?,
        }
    }
    Ok(())
}

// ── Event log ────────────────────────────────────────────────

/// Append a `[uptime] event` line.
pub fn append_event<const N: usize>(
    log: &mut BoundedBuffer<N>,
    uptime_ms: u64,
    event: &AppEvent,
) -> Result<(), Overflow> {
    writeln!(log, "[{}s] {}", uptime_ms / 1000, event).map_err(|_| Overflow)
}
