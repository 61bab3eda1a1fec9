//! Fuzz target: `OneWireBus` ROM search and scratchpad decoding
//!
//! Replays arbitrary bytes as the wire level seen by every read slot and
//! presence sample, and verifies:
//! - No panics under any line behaviour
//! - Every address the search returns carries a valid CRC-8
//! - The search terminates once the input runs out
//!
//! cargo fuzz run fuzz_onewire_search

#![no_main]

use libfuzzer_sys::fuzz_target;
use solarcoil::app::ports::BusTransceiver;
use solarcoil::drivers::onewire::{BitLink, OneWireBus};
use solarcoil::error::BusError;
use solarcoil::sensors::address::SensorAddress;

/// Line whose sampled levels come from the fuzz input.
struct FuzzLine<'a> {
    bits: &'a [u8],
    pos: usize,
}

impl FuzzLine<'_> {
    fn next(&mut self) -> bool {
        let byte = self.bits.get(self.pos / 8).copied().unwrap_or(0xFF);
        let bit = byte & (1 << (self.pos % 8)) != 0;
        self.pos += 1;
        bit
    }
}

impl BitLink for FuzzLine<'_> {
    fn reset(&mut self) -> Result<bool, BusError> {
        Ok(!self.next())
    }

    fn write_bit(&mut self, _bit: bool) -> Result<(), BusError> {
        Ok(())
    }

    fn read_bit(&mut self) -> Result<bool, BusError> {
        Ok(self.next())
    }
}

fuzz_target!(|data: &[u8]| {
    let mut bus = OneWireBus::new(FuzzLine { bits: data, pos: 0 });

    bus.reset_scan();
    // A successful pass samples one presence bit plus 64 bit pairs.
    let max_hits = data.len() * 8 / 129;
    let mut found = 0;
    while let Some(addr) = bus.next_address() {
        assert!(addr.has_valid_checksum(), "search returned bad CRC: {}", addr);
        found += 1;
        assert!(found <= max_hits, "search did not terminate");
    }

    let probe = SensorAddress::new([0x28, 0, 0, 0, 0, 0, 0, 0]);
    let _ = bus.read_value(&probe);
});
