//! [`Recovery`] runs the open, chip ID, dump, erase, dump sequence against a
//! [`Device`], writing progress and dumps to the provided output.
//!
//! Every failure after the device is opened ends the run: the error is
//! returned to the caller and the device is dropped, which closes it.  The
//! one exception is the chip ID query, whose status is printed but never
//! fails the run.
use crate::constants::FTDI_MAX_EEPROM_SIZE;
use crate::hexdump::hexdump;
use crate::{Device, DeviceLocation, RunError};

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use std::io::Write;

/// Number of EEPROM bytes dumped unless overridden with
/// [`Recovery::eeprom_size`]
pub const DEFAULT_EEPROM_SIZE: usize = FTDI_MAX_EEPROM_SIZE;

/// Step names used in fail-fast error messages
pub const STEP_EEPROM_READ: &str = "eeprom read";
pub const STEP_GET_BUFFER: &str = "get buffer";
pub const STEP_ERASE_EEPROM: &str = "erase eeprom";

/// Configures and runs an EEPROM recovery
///
/// ```rust,no_run
/// use ft232h_unbrick::{DeviceLocation, Recovery, UsbDevice};
///
/// let location: DeviceLocation = "0403:6014".parse().unwrap();
/// let mut stdout = std::io::stdout();
/// Recovery::new()
///     .eeprom_size(256)
///     .run::<UsbDevice, _>(location, None, &mut stdout)
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct Recovery {
    eeprom_size: usize,
}

impl Default for Recovery {
    fn default() -> Self {
        Recovery {
            eeprom_size: DEFAULT_EEPROM_SIZE,
        }
    }
}

impl Recovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of EEPROM bytes to retrieve and dump.
    ///
    /// Must be at least the EEPROM size the device detects, or retrieving
    /// the image fails.
    pub fn eeprom_size(mut self, size: usize) -> Self {
        self.eeprom_size = size;
        self
    }

    /// Opens the device at `location` and runs the whole recovery sequence.
    ///
    /// # Returns
    /// * `Ok(())` - The EEPROM was dumped, erased and dumped again, and the
    ///   device closed
    /// * `Err(RunError)` - The first failure.  If the device was opened it
    ///   has been closed by the time this returns.
    pub fn run<D: Device, W: Write>(
        &self,
        location: DeviceLocation,
        config: Option<D::Config>,
        out: &mut W,
    ) -> Result<(), RunError> {
        trace!("Recovery::run {location} eeprom_size {}", self.eeprom_size);

        writeln!(out, "looking for usb device: {location}")?;
        let mut device = D::open(location, config).map_err(|error| {
            info!("Failed to open {location}: {error}");
            RunError::Open { location, error }
        })?;
        debug!("Opened {:?}", device.chip_type());

        self.show_chip_id(&mut device, out)?;
        self.reset_eeprom(&mut device, out)?;

        info!("Recovery of {} complete", device.location());
        device.close();
        Ok(())
    }

    /// Reads and prints the chip ID together with the call's status.  A
    /// failed read is reported through the status line only.
    pub fn show_chip_id<D: Device, W: Write>(
        &self,
        device: &mut D,
        out: &mut W,
    ) -> Result<(), RunError> {
        let (status, chipid) = match device.read_chipid() {
            Ok(chipid) => (0, chipid),
            Err(e) => {
                warn!("Chip ID read failed: {e}");
                (e.status(), 0)
            }
        };
        writeln!(out, "ftdi_read_chipid: {status}")?;
        writeln!(out, "FTDI chipid: {chipid:X}")?;
        Ok(())
    }

    /// Dumps the EEPROM, erases it, then dumps it again
    pub fn reset_eeprom<D: Device, W: Write>(
        &self,
        device: &mut D,
        out: &mut W,
    ) -> Result<(), RunError> {
        writeln!(out, "before:")?;
        self.show_eeprom(device, out)?;

        writeln!(out, "resting eeprom...")?;
        device
            .erase_eeprom()
            .map_err(RunError::step(STEP_ERASE_EEPROM))?;
        match device.eeprom_chip() {
            Some(chip) => info!("Erased EEPROM, part is {chip:?}"),
            None => debug!("Erased EEPROM, part not reported"),
        }

        writeln!(out, "after:")?;
        self.show_eeprom(device, out)
    }

    /// Reads the EEPROM and hex dumps the configured number of bytes
    pub fn show_eeprom<D: Device, W: Write>(
        &self,
        device: &mut D,
        out: &mut W,
    ) -> Result<(), RunError> {
        let size = self.eeprom_size;
        let mut eeprom = Vec::new();
        eeprom.try_reserve_exact(size).map_err(|e| {
            error!("Failed to allocate {size} byte EEPROM buffer: {e}");
            RunError::OutOfMemory { size }
        })?;
        eeprom.resize(size, 0);

        device
            .read_eeprom()
            .map_err(RunError::step(STEP_EEPROM_READ))?;
        let copied = device
            .eeprom_buf(&mut eeprom)
            .map_err(RunError::step(STEP_GET_BUFFER))?;
        debug!("Retrieved {copied} EEPROM bytes into {size} byte buffer");

        hexdump(out, &eeprom)?;
        Ok(())
    }
}

/// Returns the startup banner describing the USB library in use
pub fn library_banner() -> String {
    let version = rusb::version();
    format!(
        "Initialized libusb {}.{}.{}.{} (major: {}, minor: {}, micro: {}, snapshot ver: {})",
        version.major(),
        version.minor(),
        version.micro(),
        version.nano(),
        version.major(),
        version.minor(),
        version.micro(),
        version.rc().unwrap_or("none"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_size() {
        let recovery = Recovery::new();
        assert_eq!(recovery.eeprom_size, FTDI_MAX_EEPROM_SIZE);
        assert_eq!(recovery.eeprom_size(0xff).eeprom_size, 0xff);
    }

    #[test]
    fn test_banner() {
        let banner = library_banner();
        assert!(banner.starts_with("Initialized libusb "));
        assert!(banner.contains("snapshot ver: "));
    }
}
