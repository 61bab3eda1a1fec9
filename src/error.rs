//! Unified error types for the SolarCoil firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level loop's error handling uniform.  All variants are `Copy` so they
//! can be passed through the locator, aggregator and publisher without
//! allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The publish collaborator rejected or throttled a payload.
    Publish(PublishError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Publish(e) => write!(f, "publish: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// No presence pulse after a reset: nothing is wired or the line is shorted.
    NoPresence,
    /// No device answered the first search bit.
    SearchExhausted,
    /// Both search bits read back as 1 (device dropped out mid-search).
    SearchCollision,
    /// A ROM or scratchpad failed its CRC-8 check.
    CrcMismatch,
    /// The underlying GPIO reported an error.
    Pin,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPresence => write!(f, "no presence pulse"),
            Self::SearchExhausted => write!(f, "search exhausted"),
            Self::SearchCollision => write!(f, "search collision"),
            Self::CrcMismatch => write!(f, "CRC mismatch"),
            Self::Pin => write!(f, "GPIO error"),
        }
    }
}

impl std::error::Error for Error {}


// ---------------------------------------------------------------------------
// Publish errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishError {
    /// The minimum spacing between publishes has not elapsed.
    RateLimited,
    /// The remote channel is not connected.
    NotConnected,
    /// The payload exceeds the channel's size limit.
    PayloadTooLarge,
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate limited"),
            Self::NotConnected => write!(f, "not connected"),
            Self::PayloadTooLarge => write!(f, "payload too large"),
        }
    }
}

impl From<PublishError> for Error {
    fn from(e: PublishError) -> Self {
        Self::Publish(e)
    }
}
