//! Constants used in the FTDI EEPROM recovery implementation
use std::time::Duration;

/// Device info

/// FTDI USB vendor ID
pub const FTDI_VID: u16 = 0x0403;
/// FT232H factory default product ID
pub const FT232H_PID: u16 = 0x6014;

/// Timeouts

/// Used to wait for the USB device to respond to a control message
pub const DEFAULT_CONTROL_TIMEOUT: Duration = Duration::from_secs(5);

/// USB interface and SIO index

/// The interface claimed for the lifetime of the session
pub const USB_INTERFACE: u8 = 0;
/// wIndex used for SIO requests addressed to interface A
pub const SIO_INDEX_A: u16 = 1;

/// Vendor requests

/// Reset the SIO
pub const SIO_RESET_REQUEST: u8 = 0x00;
/// wValue for [`SIO_RESET_REQUEST`] which resets the chip
pub const SIO_RESET_SIO: u16 = 0;
/// Read one 16-bit EEPROM word
pub const SIO_READ_EEPROM_REQUEST: u8 = 0x90;
/// Write one 16-bit EEPROM word
pub const SIO_WRITE_EEPROM_REQUEST: u8 = 0x91;
/// Erase the whole EEPROM
pub const SIO_ERASE_EEPROM_REQUEST: u8 = 0x92;

/// EEPROM

/// Largest EEPROM image an FTDI chip exposes (93x66)
pub const FTDI_MAX_EEPROM_SIZE: usize = 256;
/// Size of the internal EEPROM of an FT232R
pub const FT232R_EEPROM_SIZE: usize = 0x80;
/// Word written after an erase to detect how the EEPROM wraps
pub const EEPROM_MAGIC: u16 = 0x55aa;
/// Word address the magic is written to
pub const EEPROM_MAGIC_ADDR: u16 = 0xc0;
/// Word addresses holding the obfuscated FTDIChip-ID
pub const CHIPID_ADDR_HIGH: u16 = 0x43;
pub const CHIPID_ADDR_LOW: u16 = 0x44;
/// XOR key applied to the shuffled FTDIChip-ID
pub const CHIPID_XOR: u32 = 0xa5f0_f7d1;

/// Number of bytes shown on each hex dump row
pub const HEXDUMP_ROW_LEN: usize = 16;
