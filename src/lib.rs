//! Solar pool-heating coil monitor firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod coils;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod report;
pub mod scheduler;
pub mod sensors;
