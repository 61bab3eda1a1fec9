//! Solar coil monitor firmware entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  OneWireBus ×9     LogEventSink   LogPublisher   SystemClock   │
//! │  (BusTransceiver)  (EventSink)    (PublishPort)  (Clock)       │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              Controller (pure logic)                   │    │
//! │  │  Locator · Aggregator · Report buffers                 │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Scheduler (delegate-driven) · flow ISRs → FLOW_COUNTERS       │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::{Ets, FreeRtos};
use log::{error, info, warn};

use solarcoil::adapters::log_publisher::LogPublisher;
use solarcoil::adapters::log_sink::LogEventSink;
use solarcoil::adapters::time::SystemClock;
use solarcoil::app::ports::Clock;
use solarcoil::app::service::Controller;
use solarcoil::config::MonitorConfig;
use solarcoil::drivers::gpio::OpenDrainPin;
use solarcoil::drivers::hw_init;
use solarcoil::drivers::onewire::{OneWireBus, OpenDrainLink};
use solarcoil::drivers::watchdog::LoopWatchdog;
use solarcoil::pins;
use solarcoil::report::RateLimitedPublisher;
use solarcoil::sensors::flow::FLOW_COUNTERS;
use solarcoil::sensors::registry::SensorRegistry;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  SolarCoil v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Hardware ───────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Without the bus pins there is nothing to measure.
        error!("HAL init failed: {}, halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }
    if let Err(e) = hw_init::init_isr_service() {
        warn!("ISR service init failed: {}, flow will read zero", e);
    }

    // ── 3. Wiring ─────────────────────────────────────────────
    let config = MonitorConfig::default();

    let buses: Vec<_> = pins::ONEWIRE_BUS_GPIOS
        .iter()
        .map(|&gpio| OneWireBus::new(OpenDrainLink::new(OpenDrainPin::new(gpio), Ets)))
        .collect();

    let mut controller = Controller::new(
        config.clone(),
        SensorRegistry::installed(),
        buses,
        &FLOW_COUNTERS,
        SystemClock::new(),
        FreeRtos,
    )?;
    let mut sink = LogEventSink::new();
    let mut publisher = RateLimitedPublisher::new(
        LogPublisher::new(),
        config.publish_rate_per_sec,
        config.publish_burst,
    );

    // ── 4. Discovery ──────────────────────────────────────────
    controller.start(&mut sink);
    info!("{}", controller.reports().diagnostic);

    // Armed after discovery, which may legitimately run long.
    let loop_clock = SystemClock::new();
    let mut watchdog = LoopWatchdog::arm(
        config.watchdog_timeout_ms,
        config.tick_interval_ms,
        loop_clock.now_ms(),
    )?;

    info!("System ready. Entering sample loop.");

    // ── 5. Sample loop ────────────────────────────────────────
    loop {
        FreeRtos::delay_ms(config.tick_interval_ms);

        let due = controller.tick(&mut publisher, &mut sink);
        if due.sample {
            info!("{}", controller.reports().verbose);
        }
        if due.report {
            info!("PUB | {}", publisher.stats());
        }

        // Only observable when the TWDT subscription failed.
        let now = loop_clock.now_ms();
        if watchdog.is_overdue(now) {
            warn!("loop overran the {}ms watchdog timeout", watchdog.timeout_ms());
        }
        watchdog.feed(now);
    }
}
