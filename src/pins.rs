//! GPIO / peripheral pin assignments for the SolarCoil main board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Single-wire temperature buses (open-drain, 4.7 kΩ external pull-up)
// ---------------------------------------------------------------------------

/// Data line of each single-wire bus, indexed by bus id.
pub const ONEWIRE_BUS_GPIOS: [i32; 9] = [4, 5, 6, 7, 15, 16, 17, 18, 8];

// ---------------------------------------------------------------------------
// Hall-effect flow sensors (pulse output, rising-edge interrupt)
// ---------------------------------------------------------------------------

/// Pulse input of each flow channel, indexed by channel id (= coil 1..8).
pub const FLOW_PULSE_GPIOS: [i32; 8] = [1, 2, 9, 10, 11, 12, 13, 14];

