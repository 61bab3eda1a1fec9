//! Fixed-capacity text buffer with explicit overflow marking.
//!
//! Content that does not fit is cut at a character boundary and the buffer
//! is padded with [`OVERFLOW_MARKER`] up to exactly `N` bytes.  A truncated
//! buffer rejects further appends until it is cleared or replaced.

use core::fmt;

use heapless::String;

/// Character padding the tail of a truncated buffer.
pub const OVERFLOW_MARKER: char = '~';

/// Minimum number of marker characters ending a truncated buffer.
pub const OVERFLOW_TAIL: usize = 3;

/// Returned when an append did not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overflow;

impl fmt::Display for Overflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buffer overflow, content truncated")
    }
}

/// `N`-byte text buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundedBuffer<const N: usize> {
    text: String<N>,
    truncated: bool,
}

impl<const N: usize> BoundedBuffer<N> {
    pub const fn new() -> Self {
        Self {
            text: String::new(),
            truncated: false,
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.truncated = false;
    }

    /// Append `s`, truncating and marking the buffer if it does not fit.
    pub fn push_str(&mut self, s: &str) -> Result<(), Overflow> {
        if self.truncated {
            return Err(Overflow);
        }
        if self.text.len() + s.len() <= N {
            // Cannot fail: length checked above.
            let _ = self.text.push_str(s);
            return Ok(());
        }

        let keep = N.saturating_sub(OVERFLOW_TAIL);
        if self.text.len() > keep {
            let cut = floor_char_boundary(self.text.as_str(), keep);
            self.text.truncate(cut);
        } else {
            let room = keep - self.text.len();
            let cut = floor_char_boundary(s, room);
            let _ = self.text.push_str(&s[..cut]);
        }
        while self.text.len() < N {
            let _ = self.text.push(OVERFLOW_MARKER);
        }
        self.truncated = true;
        Err(Overflow)
    }

    /// Clear, then append `s`.
    pub fn replace(&mut self, s: &str) -> Result<(), Overflow> {
        self.clear();
        self.push_str(s)
    }
}

impl<const N: usize> fmt::Write for BoundedBuffer<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s).map_err(|_| fmt::Error)
    }
}

impl<const N: usize> fmt::Display for BoundedBuffer<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Largest index `<= max` that lies on a char boundary of `s`.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    let mut i = max;
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}
