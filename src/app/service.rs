//! Application service: the hexagonal core.
//!
//! [`Controller`] owns every piece of mutable monitor state: bus handles,
//! the slot table, the aggregator baselines, the scheduler and the report
//! buffers.  I/O flows through port traits, so the whole loop runs on the
//! host against mock buses.
//!
//! ```text
//!  BusTransceiver ──▶ ┌─────────────────────────────┐ ──▶ EventSink
//!  FlowCounters   ──▶ │         Controller          │
//!  Clock          ──▶ │ locate · sample · format    │ ──▶ RateLimitedPublisher
//!                     └─────────────────────────────┘
//! ```

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::coils::{COILS, Coil};
use crate::config::{FLOW_CHANNELS, MonitorConfig};
use crate::error::Error;
use crate::report::format::{
    CompactReport, DiagnosticReport, EventLog, VerboseReport, append_event, render_compact,
    render_diagnostic, render_verbose,
};
use crate::report::publish::RateLimitedPublisher;
use crate::scheduler::{Schedule, ScheduleKind, Scheduler};
use crate::sensors::aggregator::{ReadingAggregator, SampleSnapshot};
use crate::sensors::flow::FlowCounters;
use crate::sensors::locator::{
    DiscoveryReport, SensorLocator, SensorTable, Uniqueness, check_unique,
};
use crate::sensors::registry::SensorRegistry;

use super::events::AppEvent;
use super::ports::{BusTransceiver, Clock, EventSink, PublishPort, ScheduledTask, SchedulerDelegate};

/// Channel name the compact report is published under.
pub const PUBLISH_CHANNEL: &str = "coil-report";

// ───────────────────────────────────────────────────────────────
// Report buffers
// ───────────────────────────────────────────────────────────────

/// The four text buffers exposed to the outside world.
#[derive(Debug, Default)]
pub struct Reports {
    /// Append-only boot/event log.
    pub event_log: EventLog,
    /// Human-readable last sample.
    pub verbose: VerboseReport,
    /// Discovery outcome.
    pub diagnostic: DiagnosticReport,
    /// Last published payload.
    pub compact: CompactReport,
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate
// ───────────────────────────────────────────────────────────────

/// Records which tasks fell due during one scheduler tick.
///
/// The work runs after the tick so the scheduler and the controller are
/// never borrowed at the same time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DueTasks {
    pub sample: bool,
    pub report: bool,
}

impl SchedulerDelegate for DueTasks {
    fn on_schedule_fired(&mut self, label: &str, task: ScheduledTask) {
        debug!("schedule '{}' fired ({:?})", label, task);
        match task {
            ScheduledTask::Sample => self.sample = true,
            ScheduledTask::Report => self.report = true,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

pub struct Controller<'f, B, C, D> {
    config: MonitorConfig,
    buses: Vec<B>,
    clock: C,
    delay: D,
    flow: &'f FlowCounters,
    coils: &'static [Coil],

    locator: SensorLocator,
    aggregator: ReadingAggregator,
    scheduler: Scheduler,

    table: SensorTable,
    discovery: Option<DiscoveryReport>,
    uniqueness: Option<Uniqueness>,
    last_snapshot: Option<SampleSnapshot>,
    reports: Reports,
}

impl<'f, B, C, D> Controller<'f, B, C, D>
where
    B: BusTransceiver,
    C: Clock,
    D: DelayNs,
{
    /// Build a controller for the installed coil layout.
    ///
    /// `buses` is indexed by bus id; a short vector leaves the missing
    /// buses unresolved.
    pub fn new(
        config: MonitorConfig,
        registry: SensorRegistry<'static>,
        buses: Vec<B>,
        flow: &'f FlowCounters,
        clock: C,
        delay: D,
    ) -> Result<Self, Error> {
        Self::with_coils(config, registry, &COILS, buses, flow, clock, delay)
    }

    pub fn with_coils(
        config: MonitorConfig,
        registry: SensorRegistry<'static>,
        coils: &'static [Coil],
        buses: Vec<B>,
        flow: &'f FlowCounters,
        clock: C,
        delay: D,
    ) -> Result<Self, Error> {
        config.validate()?;

        let slots = config.slot_count();
        if coils
            .iter()
            .any(|c| c.inflow_slot >= slots || c.outflow_slot >= slots)
        {
            return Err(Error::Config("coil references a slot outside the bus layout"));
        }
        if coils
            .iter()
            .any(|c| c.flow_channel.is_some_and(|ch| ch >= FLOW_CHANNELS))
        {
            return Err(Error::Config("coil references a missing flow channel"));
        }
        if buses.len() < config.bus_count() {
            warn!(
                "controller: {} bus handle(s) for {} configured buses",
                buses.len(),
                config.bus_count()
            );
        }

        Ok(Self {
            locator: SensorLocator::new(registry, &config),
            aggregator: ReadingAggregator::new(&config),
            scheduler: Scheduler::new(),
            table: SensorTable::with_slots(slots),
            discovery: None,
            uniqueness: None,
            last_snapshot: None,
            reports: Reports::default(),
            config,
            buses,
            clock,
            delay,
            flow,
            coils,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Discover the probes, run the duplicate diagnostic, prime the flow
    /// baselines and arm the sample/report schedules.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.record(
            sink,
            AppEvent::Booted {
                version: env!("CARGO_PKG_VERSION"),
            },
        );

        let (table, report) = self.locator.discover(&mut self.buses, &mut self.delay);

        for bus in report.skipped_buses() {
            self.record(
                sink,
                AppEvent::BusSkipped {
                    bus: bus.bus,
                    attempts: bus.attempts_used,
                },
            );
        }
        self.record(
            sink,
            AppEvent::DiscoveryFinished {
                found: report.found,
                expected: report.expected,
                passes: report.passes,
            },
        );

        let uniqueness = check_unique(&table);
        if uniqueness == Uniqueness::DuplicateFound {
            self.record(sink, AppEvent::DuplicateAddresses);
        }

        if render_diagnostic(&report, uniqueness, &table, &mut self.reports.diagnostic).is_err() {
            self.record(sink, AppEvent::ReportTruncated { buffer: "diagnostic" });
        }

        self.table = table;
        self.discovery = Some(report);
        self.uniqueness = Some(uniqueness);

        self.aggregator.prime(self.flow, self.clock.now_ms());

        self.scheduler.add(Schedule {
            label: "sample",
            task: ScheduledTask::Sample,
            kind: ScheduleKind::Periodic {
                interval_ms: self.config.sample_interval_ms,
            },
            enabled: true,
        });
        self.scheduler.add(Schedule {
            label: "report",
            task: ScheduledTask::Report,
            kind: ScheduleKind::Periodic {
                interval_ms: self.config.report_interval_ms,
            },
            enabled: true,
        });

        info!(
            "controller started: {}/{} probes, {} schedule(s)",
            self.table.resolved_count(),
            self.config.expected_sensors,
            self.scheduler.active_count()
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Advance the scheduler by one loop tick and run whatever fell due.
    /// A sample due on the same tick as a report runs first.
    pub fn tick<P: PublishPort>(
        &mut self,
        publisher: &mut RateLimitedPublisher<P>,
        sink: &mut impl EventSink,
    ) -> DueTasks {
        let mut due = DueTasks::default();
        self.scheduler.tick(self.config.tick_interval_ms, &mut due);

        if due.sample {
            self.sample_now(sink);
        }
        if due.report {
            // Failures are already in the event log.
            let _ = self.report_now(publisher, sink);
        }
        due
    }

    /// Run one sample cycle and refresh the verbose report.
    pub fn sample_now(&mut self, sink: &mut impl EventSink) -> &SampleSnapshot {
        let now = self.clock.now_ms();
        let snap = self.aggregator.sample(
            now,
            &mut self.buses,
            &self.table,
            self.flow,
            self.coils,
            &mut self.delay,
        );

        if render_verbose(&snap, &mut self.reports.verbose).is_err() {
            self.record(sink, AppEvent::ReportTruncated { buffer: "verbose" });
        }
        self.record(
            sink,
            AppEvent::SampleTaken {
                cycle: snap.cycle,
                invalid_slots: snap.invalid_slots(),
                total_power_w: snap.total_power_w(),
            },
        );
        self.last_snapshot.insert(snap)
    }

    /// Render the last sample as the compact payload and publish it.
    ///
    /// Does nothing before the first sample.
    pub fn report_now<P: PublishPort>(
        &mut self,
        publisher: &mut RateLimitedPublisher<P>,
        sink: &mut impl EventSink,
    ) -> Result<(), Error> {
        let Some(snap) = self.last_snapshot.as_ref() else {
            debug!("controller: no sample yet, report skipped");
            return Ok(());
        };
        let truncated = render_compact(snap, &mut self.reports.compact).is_err();
        if truncated {
            self.record(sink, AppEvent::ReportTruncated { buffer: "compact" });
        }

        match publisher.publish(PUBLISH_CHANNEL, self.reports.compact.as_str()) {
            Ok(()) => {
                let bytes = self.reports.compact.len();
                self.record(
                    sink,
                    AppEvent::Published {
                        channel: PUBLISH_CHANNEL,
                        bytes,
                    },
                );
                Ok(())
            }
            Err(e) => {
                self.record(sink, AppEvent::PublishFailed(e));
                Err(e.into())
            }
        }
    }

    /// Append to the event log and forward to the sink.
    fn record(&mut self, sink: &mut impl EventSink, event: AppEvent) {
        let now = self.clock.now_ms();
        if append_event(&mut self.reports.event_log, now, &event).is_err() {
            debug!("controller: event log full");
        }
        sink.emit(&event);
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn table(&self) -> &SensorTable {
        &self.table
    }

    pub fn discovery(&self) -> Option<&DiscoveryReport> {
        self.discovery.as_ref()
    }

    pub fn uniqueness(&self) -> Option<Uniqueness> {
        self.uniqueness
    }

    pub fn last_snapshot(&self) -> Option<&SampleSnapshot> {
        self.last_snapshot.as_ref()
    }

    pub fn reports(&self) -> &Reports {
        &self.reports
    }

    pub fn buses_mut(&mut self) -> &mut [B] {
        &mut self.buses
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }
}
