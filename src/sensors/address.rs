//! Factory ROM address of a single-wire temperature sensor.
//!
//! ```text
//!  byte:   0        1 ─────────────── 6        7
//!        ┌────────┬─────────────────────┬────────┐
//!        │ family │   48-bit serial     │ CRC-8  │
//!        └────────┴─────────────────────┴────────┘
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};

/// Family code of the DS18B20 waterproof probes used in the array.
pub const FAMILY_DS18B20: u8 = 0x28;

/// 8-byte factory address.  Immutable and globally unique per device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SensorAddress([u8; 8]);

impl SensorAddress {
    pub const fn new(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> &[u8; 8] {
        &self.0
    }

    pub const fn family(&self) -> u8 {
        self.0[0]
    }

    /// The 48-bit factory serial (bytes 1–6).
    pub fn serial(&self) -> &[u8] {
        &self.0[1..7]
    }

    pub const fn checksum(&self) -> u8 {
        self.0[7]
    }

    /// `true` when byte 7 is the CRC-8 of bytes 0–6.
    pub fn has_valid_checksum(&self) -> bool {
        crc8(&self.0[..7]) == self.0[7]
    }

    /// Sort key for the order a ROM search enumerates devices on one bus.
    ///
    /// The search walks bits LSB-first from byte 0 and takes the 0 branch
    /// first, so bit 0 of byte 0 is the most significant bit of the key.
    pub const fn search_order_key(&self) -> u64 {
        u64::from_le_bytes(self.0).reverse_bits()
    }
}

impl From<[u8; 8]> for SensorAddress {
    fn from(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for SensorAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}

/// Dallas/Maxim CRC-8 (polynomial x⁸ + x⁵ + x⁴ + 1, reflected 0x8C).
///
/// Covers both ROM codes and scratchpad contents.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        let mut b = byte;
        for _ in 0..8 {
            let mix = (crc ^ b) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            b >>= 1;
        }
    }
    crc
}
