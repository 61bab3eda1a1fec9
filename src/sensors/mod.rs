//! Sensor acquisition core.
//!
//! ```text
//!  registry ──▶ locator ──▶ SensorTable ──┐
//!                                          ├──▶ aggregator ──▶ SampleSnapshot
//!  flow ISR ──▶ FlowCounters ──────────────┘
//! ```

pub mod address;
pub mod aggregator;
pub mod flow;
pub mod locator;
pub mod registry;
pub mod temperature;
