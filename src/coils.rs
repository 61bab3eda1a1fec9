//! Coil layout: which slots and flow channel belong to each heating loop.
//!
//! Slots within a bus are filled in ROM search order, so the table below
//! follows the installed probes' factory addresses, not the wiring order.
//! On bus 2 the C3 outlet probe enumerates first; on bus 5 the C7/C8
//! supply probe enumerates ahead of the C6 outlet.
//!
//! ```text
//!  bus  slots   coil    inflow  outflow  flow ch
//!   0   0,1     C1        0       1        0
//!   1   2,3     C2        2       3        1
//!   2   4,5     C3        5       4        2
//!   3   6,7     C4        6       7        3
//!   4   8,9     C5        8       9        4     ┐ shared supply manifold probe
//!   5  10,11    C6        8      11        5     ┘
//!   6  12,13    C7       10      12        6     ┐ shared supply manifold probe
//!               C8       10      13        7     ┘
//!  7,8 14,15    Air      14      15        –     sun, shade
//! ```

/// One heating loop (or the ambient pseudo-coil).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coil {
    pub name: &'static str,
    /// Inflow slot (the "sun" probe for the ambient pseudo-coil).
    pub inflow_slot: usize,
    /// Outflow slot (the "shade" probe for the ambient pseudo-coil).
    pub outflow_slot: usize,
    /// Flow channel, `None` for the ambient pseudo-coil.
    pub flow_channel: Option<usize>,
}

impl Coil {
    const fn real(name: &'static str, inflow: usize, outflow: usize, channel: usize) -> Self {
        Self {
            name,
            inflow_slot: inflow,
            outflow_slot: outflow,
            flow_channel: Some(channel),
        }
    }

    pub fn is_ambient(&self) -> bool {
        self.flow_channel.is_none()
    }
}

/// Installed coils, in report order.  The ambient pseudo-coil is last.
pub static COILS: [Coil; 9] = [
    Coil::real("C1", 0, 1, 0),
    Coil::real("C2", 2, 3, 1),
    Coil::real("C3", 5, 4, 2),
    Coil::real("C4", 6, 7, 3),
    Coil::real("C5", 8, 9, 4),
    Coil::real("C6", 8, 11, 5),
    Coil::real("C7", 10, 12, 6),
    Coil::real("C8", 10, 13, 7),
    Coil {
        name: "Air",
        inflow_slot: 14,
        outflow_slot: 15,
        flow_channel: None,
    },
];
