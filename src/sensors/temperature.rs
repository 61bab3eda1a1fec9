//! Temperature reads with bounded retry on integrity failure.

use log::debug;

use super::address::SensorAddress;
use crate::app::ports::BusTransceiver;

/// DS18B20 LSB weight at 12-bit resolution (°C).
const CELSIUS_PER_LSB: f32 = 0.0625;

/// Convert a raw two's-complement reading to °C.
pub fn raw_to_celsius(raw: i16) -> f32 {
    raw as f32 * CELSIUS_PER_LSB
}

/// Read `address` on `bus`, retrying up to `attempts` times while the
/// integrity check fails.
///
/// Returns `None` when every attempt failed.  Never substitutes a
/// plausible-looking default.
pub fn read_celsius<B: BusTransceiver + ?Sized>(
    bus: &mut B,
    address: &SensorAddress,
    attempts: u8,
) -> Option<f32> {
    for attempt in 1..=attempts {
        let reading = bus.read_value(address);
        if reading.integrity_ok {
            return Some(raw_to_celsius(reading.raw));
        }
        debug!("temp: {} integrity failure ({}/{})", address, attempt, attempts);
    }
    None
}
