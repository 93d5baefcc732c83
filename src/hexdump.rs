//! Fixed width hex and ASCII dump of byte buffers, used to display EEPROM
//! images.
//!
//! Each row looks like
//!
//! ```text
//! 0010: 41 42 00 7f                                      AB..
//! ```
//!
//! i.e. the offset of the row's first byte, up to 16 ` xx` fields (blank
//! padded in a short final row), two spaces, then the printable bytes.
use crate::constants::HEXDUMP_ROW_LEN;
use std::fmt::{self, Write as _};
use std::io::{self, Write};

/// Wraps a byte slice so it can be formatted as a hex dump
pub struct HexDump<'a>(pub &'a [u8]);

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut row = RowBuilder::new();
        for &byte in self.0 {
            row.push(byte);
            if row.is_full() {
                writeln!(f, "{}", row.finish())?;
            }
        }
        if !row.is_empty() {
            writeln!(f, "{}", row.finish())?;
        }
        Ok(())
    }
}

/// Writes the hex dump of `data` to `out`.  Writes nothing for an empty
/// slice.
pub fn hexdump<W: Write>(out: &mut W, data: &[u8]) -> io::Result<()> {
    write!(out, "{}", HexDump(data))
}

/// Accumulates one row at a time.  A row never holds more than
/// [`HEXDUMP_ROW_LEN`] entries; [`RowBuilder::finish`] renders it and moves
/// on to the next offset.
struct RowBuilder {
    offset: usize,
    count: usize,
    hex: String,
    ascii: String,
}

impl RowBuilder {
    fn new() -> Self {
        Self {
            offset: 0,
            count: 0,
            hex: String::with_capacity(3 * HEXDUMP_ROW_LEN),
            ascii: String::with_capacity(HEXDUMP_ROW_LEN),
        }
    }

    fn push(&mut self, byte: u8) {
        debug_assert!(!self.is_full());
        // Writing to a String can't fail
        let _ = write!(self.hex, " {byte:02x}");
        self.ascii.push(printable(byte));
        self.count += 1;
    }

    fn is_full(&self) -> bool {
        self.count == HEXDUMP_ROW_LEN
    }

    fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn finish(&mut self) -> String {
        for _ in self.count..HEXDUMP_ROW_LEN {
            self.hex.push_str("   ");
        }
        let line = format!("{:04x}:{}  {}", self.offset, self.hex, self.ascii);
        self.offset += self.count;
        self.count = 0;
        self.hex.clear();
        self.ascii.clear();
        line
    }
}

fn printable(byte: u8) -> char {
    if (b' '..=b'~').contains(&byte) {
        byte as char
    } else {
        '.'
    }
}
