//! The [`Device`] module provides the low-level interface to the FTDI chip's
//! EEPROM.  [`crate::Recovery`] drives it to perform the dump/erase/dump
//! sequence.

pub mod usb;

pub use usb::UsbDevice;

use crate::{DeviceLocation, Error};

/// The core Device trait, which allows Device to be mocked out for testing
///
/// A Device is an open session with the chip.  The session is released when
/// the Device is dropped, so an opened Device is closed exactly once on every
/// path out of the code that owns it.
pub trait Device: std::fmt::Debug {
    type Config;

    /// Opens the first device matching `location`, using the provided
    /// config, which can be omitted in order to use default configuration.
    ///
    /// # Arguments
    /// * `location` - Vendor and product ID to match
    /// * `config` - Configuration for the device, or None for default
    ///
    /// # Returns
    /// * `Ok(Device)` - Successfully opened device
    /// * `Err(Error)` - If no device was found, or it could not be opened
    fn open(location: DeviceLocation, config: Option<Self::Config>) -> Result<Self, Error>
    where
        Self: Sized;

    /// The location this device was opened from
    fn location(&self) -> DeviceLocation;

    /// The chip type detected when the device was opened
    fn chip_type(&self) -> ChipType;

    /// Reads the FTDIChip-ID.
    ///
    /// # Returns
    /// * `Ok(u32)` - The decoded chip ID
    /// * `Err(Error)` - If the ID words could not be read
    fn read_chipid(&mut self) -> Result<u32, Error>;

    /// Reads the whole EEPROM into device side storage.  Use
    /// [`Device::eeprom_buf`] to retrieve it.
    fn read_eeprom(&mut self) -> Result<(), Error>;

    /// Copies the EEPROM image read by [`Device::read_eeprom`] into `buf`.
    ///
    /// Fails if `buf` is smaller than the detected EEPROM size.  At most
    /// [`crate::constants::FTDI_MAX_EEPROM_SIZE`] bytes are copied; any
    /// remainder of `buf` is zeroed.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of bytes copied from the EEPROM image
    /// * `Err(Error)` - On failure
    fn eeprom_buf(&self, buf: &mut [u8]) -> Result<usize, Error>;

    /// Erases the EEPROM back to its blank state.
    fn erase_eeprom(&mut self) -> Result<(), Error>;

    /// The EEPROM part detected by the last [`Device::erase_eeprom`], if
    /// the device can tell
    fn eeprom_chip(&self) -> Option<EepromChip> {
        None
    }

    /// Closes the session.  Equivalent to dropping the Device, but makes the
    /// release explicit at the call site.
    fn close(self)
    where
        Self: Sized,
    {
        drop(self);
    }
}

/// FTDI chip families, as identified by the device's bcdDevice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipType {
    Am,
    Bm,
    Ft2232C,
    Ft232R,
    Ft2232H,
    Ft4232H,
    Ft232H,
    Ft230X,
}

impl ChipType {
    /// Identifies the chip from the device descriptor's bcdDevice and
    /// whether it advertises a serial number.  Unknown values are treated
    /// as BM, matching libftdi.
    pub fn from_bcd_device(bcd: u16, has_serial: bool) -> Self {
        match bcd {
            0x0200 if !has_serial => ChipType::Bm, // BM reports 0x200 when serial index is 0
            0x0200 => ChipType::Am,
            0x0400 => ChipType::Bm,
            0x0500 => ChipType::Ft2232C,
            0x0600 => ChipType::Ft232R,
            0x0700 => ChipType::Ft2232H,
            0x0800 => ChipType::Ft4232H,
            0x0900 => ChipType::Ft232H,
            0x1000 => ChipType::Ft230X,
            _ => ChipType::Bm,
        }
    }

    /// Whether the chip's EEPROM is internal to the silicon, and so can't
    /// be erased via SIO_ERASE_EEPROM_REQUEST
    pub fn has_internal_eeprom(&self) -> bool {
        matches!(self, ChipType::Ft232R | ChipType::Ft230X)
    }
}

/// The EEPROM part detected after an erase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EepromChip {
    /// EEPROM is part of the chip (FT232R, FT230X)
    Internal,
    /// 93x46, 64 words
    Ee93x46,
    /// 93x56, 128 words
    Ee93x56,
    /// 93x66, 256 words
    Ee93x66,
    /// The magic word wasn't found at any checked address
    Unknown,
}
