//! Bit-banged single-wire (1-Wire) bus master.
//!
//! Two layers:
//!
//! - [`BitLink`]: reset/presence plus single time slots.  [`OpenDrainLink`]
//!   implements it over any `embedded-hal` open-drain pin and delay.
//! - [`OneWireBus`]: ROM search, Match ROM + Read Scratchpad and the
//!   Skip ROM + Convert T broadcast, exposed as a [`BusTransceiver`].
//!
//! Timings are standard speed (µs) from the DS18B20 datasheet.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::debug;

use crate::app::ports::{BusTransceiver, ValueRead};
use crate::error::BusError;
use crate::sensors::address::{SensorAddress, crc8};

// ── ROM / function commands ──────────────────────────────────

pub const CMD_SEARCH_ROM: u8 = 0xF0;
pub const CMD_MATCH_ROM: u8 = 0x55;
pub const CMD_SKIP_ROM: u8 = 0xCC;
pub const CMD_CONVERT_T: u8 = 0x44;
pub const CMD_READ_SCRATCHPAD: u8 = 0xBE;

/// Scratchpad length including its trailing CRC byte.
pub const SCRATCHPAD_LEN: usize = 9;

// ═══════════════════════════════════════════════════════════════
//  Bit layer
// ═══════════════════════════════════════════════════════════════

/// Reset pulse and single time slots on one bus.
pub trait BitLink {
    /// Reset pulse; `Ok(true)` when at least one device answered presence.
    fn reset(&mut self) -> Result<bool, BusError>;
    fn write_bit(&mut self, bit: bool) -> Result<(), BusError>;
    fn read_bit(&mut self) -> Result<bool, BusError>;

    /// LSB first.
    fn write_byte(&mut self, byte: u8) -> Result<(), BusError> {
        for i in 0..8 {
            self.write_bit(byte & (1 << i) != 0)?;
        }
        Ok(())
    }

    /// LSB first.
    fn read_byte(&mut self) -> Result<u8, BusError> {
        let mut byte = 0u8;
        for i in 0..8 {
            if self.read_bit()? {
                byte |= 1 << i;
            }
        }
        Ok(byte)
    }
}

/// [`BitLink`] over an open-drain pin: `set_low` pulls the wire down,
/// `set_high` releases it to the pull-up.
pub struct OpenDrainLink<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> OpenDrainLink<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    fn pull_low(&mut self) -> Result<(), BusError> {
        self.pin.set_low().map_err(|_| BusError::Pin)
    }

    fn release(&mut self) -> Result<(), BusError> {
        self.pin.set_high().map_err(|_| BusError::Pin)
    }

    fn sample(&mut self) -> Result<bool, BusError> {
        self.pin.is_high().map_err(|_| BusError::Pin)
    }
}

impl<P, D> BitLink for OpenDrainLink<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    fn reset(&mut self) -> Result<bool, BusError> {
        self.release()?;
        // A wire held low before the reset is shorted, not present.
        if !self.sample()? {
            return Err(BusError::Pin);
        }
        self.pull_low()?;
        self.delay.delay_us(480);
        // The presence pulse must be sampled inside its 60-240 µs window.
        let present = time_critical(|| {
            self.release()?;
            self.delay.delay_us(70);
            self.sample().map(|high| !high)
        })?;
        self.delay.delay_us(410);
        Ok(present)
    }

    fn write_bit(&mut self, bit: bool) -> Result<(), BusError> {
        time_critical(|| {
            self.pull_low()?;
            if bit {
                self.delay.delay_us(6);
                self.release()?;
                self.delay.delay_us(64);
            } else {
                self.delay.delay_us(60);
                self.release()?;
                self.delay.delay_us(10);
            }
            Ok(())
        })
    }

    fn read_bit(&mut self) -> Result<bool, BusError> {
        let bit = time_critical(|| {
            self.pull_low()?;
            self.delay.delay_us(6);
            self.release()?;
            self.delay.delay_us(9);
            self.sample()
        })?;
        self.delay.delay_us(55);
        Ok(bit)
    }
}

/// Run one bit slot with interrupts masked.
///
/// A flow-sensor ISR landing in the 6 µs low phase of a write-1 or read
/// slot would stretch it past 15 µs and the device would see a 0.
#[cfg(target_os = "espidf")]
fn time_critical<R>(slot: impl FnOnce() -> R) -> R {
    esp_idf_svc::hal::interrupt::free(slot)
}

#[cfg(not(target_os = "espidf"))]
fn time_critical<R>(slot: impl FnOnce() -> R) -> R {
    slot()
}

// ═══════════════════════════════════════════════════════════════
//  Bus master
// ═══════════════════════════════════════════════════════════════

/// Progress of an in-flight ROM search.
#[derive(Debug, Clone, Copy, Default)]
struct SearchState {
    rom: [u8; 8],
    /// 1-based bit position of the last unresolved 0-branch; 0 = none.
    last_discrepancy: u8,
    done: bool,
}

pub struct OneWireBus<L> {
    link: L,
    search: SearchState,
}

impl<L: BitLink> OneWireBus<L> {
    pub fn new(link: L) -> Self {
        Self {
            link,
            search: SearchState::default(),
        }
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    /// Restart the ROM search from the first device.
    pub fn reset_search(&mut self) {
        self.search = SearchState::default();
    }

    /// Next device in ROM order, `Ok(None)` once every device was returned.
    ///
    /// Any error aborts the search; the caller restarts with
    /// [`reset_search`](Self::reset_search).
    pub fn search_next(&mut self) -> Result<Option<[u8; 8]>, BusError> {
        if self.search.done {
            return Ok(None);
        }
        let result = self.search_step();
        if result.is_err() {
            self.search.done = true;
        }
        result.map(Some)
    }

    fn search_step(&mut self) -> Result<[u8; 8], BusError> {
        if !self.link.reset()? {
            return Err(BusError::NoPresence);
        }
        self.link.write_byte(CMD_SEARCH_ROM)?;

        let mut rom = self.search.rom;
        let mut last_zero = 0u8;

        for bit_number in 1..=64u8 {
            let byte = usize::from((bit_number - 1) / 8);
            let mask = 1u8 << ((bit_number - 1) % 8);

            let id_bit = self.link.read_bit()?;
            let cmp_bit = self.link.read_bit()?;

            let direction = match (id_bit, cmp_bit) {
                (true, true) if bit_number == 1 => return Err(BusError::SearchExhausted),
                (true, true) => return Err(BusError::SearchCollision),
                (a, b) if a != b => a,
                _ => {
                    // Devices disagree at this bit.
                    let take_one = if bit_number < self.search.last_discrepancy {
                        rom[byte] & mask != 0
                    } else {
                        bit_number == self.search.last_discrepancy
                    };
                    if !take_one {
                        last_zero = bit_number;
                    }
                    take_one
                }
            };

            if direction {
                rom[byte] |= mask;
            } else {
                rom[byte] &= !mask;
            }
            self.link.write_bit(direction)?;
        }

        if crc8(&rom[..7]) != rom[7] {
            return Err(BusError::CrcMismatch);
        }

        self.search.rom = rom;
        self.search.last_discrepancy = last_zero;
        self.search.done = last_zero == 0;
        Ok(rom)
    }

    /// Broadcast Convert T to every device on the bus.
    pub fn convert_all(&mut self) -> Result<(), BusError> {
        if !self.link.reset()? {
            return Err(BusError::NoPresence);
        }
        self.link.write_byte(CMD_SKIP_ROM)?;
        self.link.write_byte(CMD_CONVERT_T)
    }

    /// Address one device and read its scratchpad; the CRC is checked.
    pub fn read_scratchpad(&mut self, rom: &[u8; 8]) -> Result<[u8; SCRATCHPAD_LEN], BusError> {
        if !self.link.reset()? {
            return Err(BusError::NoPresence);
        }
        self.link.write_byte(CMD_MATCH_ROM)?;
        for &b in rom {
            self.link.write_byte(b)?;
        }
        self.link.write_byte(CMD_READ_SCRATCHPAD)?;

        let mut pad = [0u8; SCRATCHPAD_LEN];
        for b in pad.iter_mut() {
            *b = self.link.read_byte()?;
        }
        // All-zero passes the CRC but means the wire stuck low.
        if pad.iter().all(|&b| b == 0) || crc8(&pad[..8]) != pad[8] {
            return Err(BusError::CrcMismatch);
        }
        Ok(pad)
    }
}

impl<L: BitLink> BusTransceiver for OneWireBus<L> {
    fn reset_scan(&mut self) {
        self.reset_search();
    }

    fn next_address(&mut self) -> Option<SensorAddress> {
        match self.search_next() {
            Ok(rom) => rom.map(SensorAddress::new),
            Err(e) => {
                debug!("onewire: search aborted: {}", e);
                None
            }
        }
    }

    fn read_value(&mut self, address: &SensorAddress) -> ValueRead {
        match self.read_scratchpad(address.bytes()) {
            Ok(pad) => ValueRead::ok(i16::from_le_bytes([pad[0], pad[1]])),
            Err(e) => {
                debug!("onewire: read {} failed: {}", address, e);
                ValueRead::corrupt()
            }
        }
    }

    fn start_conversion(&mut self) {
        if let Err(e) = self.convert_all() {
            debug!("onewire: convert failed: {}", e);
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
