//! Static catalog of every temperature probe this installation owns.
//!
//! Installed and spare probes alike are listed by factory address, so a
//! probe swapped in from the spares drawer is recognised by name as soon as
//! it is discovered.  Discovery order has no influence on the catalog.

use log::debug;

use super::address::SensorAddress;

/// One catalogued probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryEntry {
    pub address: SensorAddress,
    pub name: &'static str,
}

const fn entry(bytes: [u8; 8], name: &'static str) -> RegistryEntry {
    RegistryEntry {
        address: SensorAddress::new(bytes),
        name,
    }
}

/// Every probe owned by the installation.
pub static INSTALLED_PROBES: [RegistryEntry; 19] = [
    entry([0x28, 0xA5, 0x4D, 0xCA, 0x18, 0x25, 0x30, 0x61], "C1 in"),
    entry([0x28, 0xBB, 0x1D, 0x6D, 0x13, 0x2C, 0xDE, 0x16], "C1 out"),
    entry([0x28, 0xD6, 0x23, 0x7B, 0x2E, 0xD9, 0x1E, 0xEA], "C2 in"),
    entry([0x28, 0x3F, 0x72, 0x1F, 0xCB, 0x19, 0x71, 0xF1], "C2 out"),
    entry([0x28, 0x17, 0x44, 0x94, 0xD6, 0x49, 0x3C, 0x25], "C3 in"),
    entry([0x28, 0x9D, 0x5C, 0x34, 0x60, 0xBE, 0x31, 0x8C], "C3 out"),
    entry([0x28, 0x20, 0x1E, 0x69, 0xFE, 0xDA, 0xA0, 0x1C], "C4 in"),
    entry([0x28, 0xEE, 0xE8, 0xB9, 0x99, 0x7F, 0x5C, 0xB2], "C4 out"),
    entry([0x28, 0x7C, 0x29, 0x99, 0xFD, 0xAF, 0xE5, 0x3F], "C5-6 in"),
    entry([0x28, 0x93, 0x25, 0x3C, 0xD6, 0x54, 0xAF, 0xEC], "C5 out"),
    entry([0x28, 0x4D, 0xFA, 0xD7, 0x14, 0x27, 0xA0, 0x69], "C6 out"),
    entry([0x28, 0xAE, 0xB3, 0xFE, 0xE9, 0x23, 0x2F, 0x8B], "C7-8 in"),
    entry([0x28, 0x8A, 0xF2, 0x21, 0x1F, 0x9E, 0xE4, 0x63], "C7 out"),
    entry([0x28, 0x91, 0xC5, 0xB1, 0x0B, 0xEC, 0xB5, 0x82], "C8 out"),
    entry([0x28, 0x56, 0x3B, 0xFC, 0x1E, 0x6F, 0x93, 0x1A], "Sun"),
    entry([0x28, 0x42, 0x7E, 0xCB, 0xC8, 0xFE, 0x29, 0xEB], "Shade"),
    // Spares
    entry([0x28, 0x55, 0xE5, 0xCD, 0x8E, 0x46, 0xDC, 0x24], "Spare A"),
    entry([0x28, 0x8E, 0xD4, 0xB7, 0xC2, 0x76, 0x4D, 0x0A], "Spare B"),
    entry([0x28, 0x2A, 0x5A, 0x4D, 0x76, 0x77, 0x06, 0x09], "Spare C"),
];

/// Read-only lookup over a catalog.
#[derive(Debug, Clone, Copy)]
pub struct SensorRegistry<'a> {
    entries: &'a [RegistryEntry],
}

impl SensorRegistry<'static> {
    /// The installation's own catalog.
    pub fn installed() -> Self {
        Self::new(&INSTALLED_PROBES)
    }
}

impl<'a> SensorRegistry<'a> {
    pub const fn new(entries: &'a [RegistryEntry]) -> Self {
        Self { entries }
    }

    /// Resolve an address to its logical name.
    ///
    /// Byte-wise exact match only.  An address listed more than once is
    /// ambiguous and resolves to `None`, the same as an unregistered one.
    pub fn lookup(&self, address: &SensorAddress) -> Option<&'a str> {
        let mut matches = self.entries.iter().filter(|e| e.address == *address);
        let first = matches.next()?;
        if matches.next().is_some() {
            debug!("registry: {} listed more than once, treating as unknown", address);
            return None;
        }
        Some(first.name)
    }

    pub fn entries(&self) -> &'a [RegistryEntry] {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `true` if any address appears in more than one entry.
    pub fn has_duplicates(&self) -> bool {
        self.entries.iter().enumerate().any(|(i, a)| {
            self.entries[i + 1..]
                .iter()
                .any(|b| a.address == b.address)
        })
    }
}
