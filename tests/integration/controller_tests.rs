//! Controller lifecycle: boot discovery, scheduled sample/report ticks,
//! throttled publishing and the report buffers.

use crate::mock_bus::{
    CapturePublisher, MockBus, MockClock, NoDelay, RecordingSink, advance, coil_temps,
    installed_buses, mock_now, reset_time,
};
use solarcoil::app::events::AppEvent;
use solarcoil::app::service::{Controller, PUBLISH_CHANNEL};
use solarcoil::config::MonitorConfig;
use solarcoil::error::{Error, PublishError};
use solarcoil::report::RateLimitedPublisher;
use solarcoil::report::format::EVENT_LOG_CAPACITY;
use solarcoil::sensors::flow::FlowCounters;
use solarcoil::sensors::locator::Uniqueness;
use solarcoil::sensors::registry::SensorRegistry;

type TestController<'f> = Controller<'f, MockBus, MockClock, NoDelay>;

fn temps() -> [f32; 16] {
    coil_temps(25.0, 30.0, 35.0, 22.0)
}

fn controller_with(buses: Vec<MockBus>, flow: &FlowCounters) -> TestController<'_> {
    reset_time();
    Controller::new(
        MonitorConfig::default(),
        SensorRegistry::installed(),
        buses,
        flow,
        MockClock,
        NoDelay,
    )
    .expect("default config is valid")
}

fn publisher() -> RateLimitedPublisher<CapturePublisher> {
    RateLimitedPublisher::with_time_provider(CapturePublisher::default(), 1, 1, mock_now)
}

/// Advance one loop tick at a time until `ms` have passed.
fn run_for(
    ctrl: &mut TestController<'_>,
    publisher: &mut RateLimitedPublisher<CapturePublisher>,
    sink: &mut RecordingSink,
    ms: u64,
) {
    let tick = u64::from(ctrl.config().tick_interval_ms);
    for _ in 0..ms / tick {
        advance(tick);
        ctrl.tick(publisher, sink);
    }
}

#[test]
fn boot_discovers_and_fills_diagnostic() {
    let flow = FlowCounters::new();
    let mut ctrl = controller_with(installed_buses(&temps()), &flow);
    let mut sink = RecordingSink::new();
    ctrl.start(&mut sink);

    assert!(matches!(sink.events[0], AppEvent::Booted { .. }));
    assert!(sink.events.contains(&AppEvent::DiscoveryFinished {
        found: 16,
        expected: 16,
        passes: 1
    }));
    assert_eq!(ctrl.uniqueness(), Some(Uniqueness::AllUnique));
    assert_eq!(ctrl.table().resolved_count(), 16);

    let diag = ctrl.reports().diagnostic.as_str();
    assert!(!ctrl.reports().diagnostic.is_truncated());
    assert!(diag.starts_with("found 16/16 passes=1 unique\n"));
    assert!(diag.contains("b0 ok x2 a1; "));
    assert!(diag.contains("0=C1 in 28A54DCA18253061; "));
    assert!(diag.contains("15=Shade "));

    assert!(ctrl.reports().event_log.as_str().starts_with("[0s] boot v"));
    assert!(ctrl.last_snapshot().is_none());
}

#[test]
fn one_minute_yields_one_sample_and_one_publish() {
    let flow = FlowCounters::new();
    let mut ctrl = controller_with(installed_buses(&temps()), &flow);
    let mut sink = RecordingSink::new();
    let mut publisher = publisher();
    ctrl.start(&mut sink);

    for _ in 0..972 {
        flow.record_pulse(0);
    }
    run_for(&mut ctrl, &mut publisher, &mut sink, 59_000);
    assert!(ctrl.last_snapshot().is_none());
    run_for(&mut ctrl, &mut publisher, &mut sink, 1_000);

    let snap = ctrl.last_snapshot().expect("sampled at 60 s");
    assert_eq!(snap.cycle, 1);
    assert!((snap.coils[0].power_w.unwrap() - 697.67).abs() < 0.01);

    let sent = &publisher.inner().sent;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, PUBLISH_CHANNEL);
    assert!(sent[0].1.starts_with("35.0,22.0,25.0,30.0,0.033,698,25.0,30.0,0.000,0,"));
    assert_eq!(sent[0].1, ctrl.reports().compact.as_str());
    // 2 ambient + 8 coils × 4 fields.
    assert_eq!(sent[0].1.split(',').count(), 34);

    let verbose = ctrl.reports().verbose.as_str();
    assert!(verbose.contains("C1 in=25.0 out=30.0 dT=5.0 flow=0.033L/s P=698W"));
    assert!(verbose.ends_with("total=698W"));

    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::SampleTaken { .. })),
        1
    );
    assert_eq!(sink.count(|e| matches!(e, AppEvent::Published { .. })), 1);
}

#[test]
fn report_before_first_sample_sends_nothing() {
    let flow = FlowCounters::new();
    let mut ctrl = controller_with(installed_buses(&temps()), &flow);
    let mut sink = RecordingSink::new();
    let mut publisher = publisher();
    ctrl.start(&mut sink);

    assert_eq!(ctrl.report_now(&mut publisher, &mut sink), Ok(()));
    assert!(publisher.inner().sent.is_empty());
}

#[test]
fn back_to_back_reports_are_throttled() {
    let flow = FlowCounters::new();
    let mut ctrl = controller_with(installed_buses(&temps()), &flow);
    let mut sink = RecordingSink::new();
    let mut publisher = publisher();
    ctrl.start(&mut sink);

    advance(60_000);
    ctrl.sample_now(&mut sink);
    assert_eq!(ctrl.report_now(&mut publisher, &mut sink), Ok(()));
    assert_eq!(
        ctrl.report_now(&mut publisher, &mut sink),
        Err(Error::Publish(PublishError::RateLimited))
    );
    assert!(sink
        .events
        .contains(&AppEvent::PublishFailed(PublishError::RateLimited)));
    assert_eq!(publisher.inner().sent.len(), 1);

    advance(2_000);
    assert_eq!(ctrl.report_now(&mut publisher, &mut sink), Ok(()));
    assert_eq!(publisher.inner().sent.len(), 2);
}

#[test]
fn dead_bus_degrades_instead_of_failing() {
    let flow = FlowCounters::new();
    let mut buses = installed_buses(&temps());
    buses[2].failing_scans = u32::MAX;
    let mut ctrl = controller_with(buses, &flow);
    let mut sink = RecordingSink::new();
    let mut publisher = publisher();
    ctrl.start(&mut sink);

    assert!(sink
        .events
        .contains(&AppEvent::BusSkipped { bus: 2, attempts: 15 }));
    assert!(ctrl.reports().diagnostic.as_str().contains("b2 SKIP x2 a15; "));
    assert!(ctrl.reports().diagnostic.as_str().contains("4=-; 5=-; "));

    advance(60_000);
    ctrl.sample_now(&mut sink);
    ctrl.report_now(&mut publisher, &mut sink).unwrap();

    let fields: Vec<&str> = publisher.inner().sent[0].1.split(',').collect();
    // C3 is the third coil: fields 10..14.
    assert_eq!(&fields[10..14], &["nan", "nan", "0.000", "nan"]);
    assert_eq!(fields[14], "25.0");
}

#[test]
fn duplicate_addresses_are_flagged_at_boot() {
    let flow = FlowCounters::new();
    let mut buses = installed_buses(&temps());
    let echoed = buses[0].probes.clone();
    buses[1] = MockBus::new(echoed);
    let mut ctrl = controller_with(buses, &flow);
    let mut sink = RecordingSink::new();
    ctrl.start(&mut sink);

    assert_eq!(ctrl.uniqueness(), Some(Uniqueness::DuplicateFound));
    assert!(sink.events.contains(&AppEvent::DuplicateAddresses));
    assert!(ctrl.reports().diagnostic.as_str().contains("DUPLICATE"));
}

#[test]
fn event_log_saturates_with_marker() {
    let flow = FlowCounters::new();
    let mut ctrl = controller_with(installed_buses(&temps()), &flow);
    let mut sink = RecordingSink::new();
    ctrl.start(&mut sink);

    for _ in 0..40 {
        advance(60_000);
        ctrl.sample_now(&mut sink);
    }
    let log = &ctrl.reports().event_log;
    assert!(log.is_truncated());
    assert_eq!(log.len(), EVENT_LOG_CAPACITY);
    assert!(log.as_str().ends_with("~~~"));
    // The sink still saw every event.
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::SampleTaken { .. })),
        40
    );
}

#[test]
fn inconsistent_config_is_rejected() {
    let flow = FlowCounters::new();
    let mut config = MonitorConfig::default();
    config.expected_sensors = 12;
    let result: Result<TestController<'_>, _> = Controller::new(
        config,
        SensorRegistry::installed(),
        Vec::new(),
        &flow,
        MockClock,
        NoDelay,
    );
    assert!(matches!(result, Err(Error::Config(_))));
}
