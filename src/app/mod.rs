//! Application core: pure domain logic, zero direct I/O.
//!
//! This module holds the monitor's orchestration: discovery at boot, the
//! periodic sample/report cycle, and the report buffers.  All interaction
//! with hardware happens through **port traits** defined in [`ports`],
//! keeping this layer fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
