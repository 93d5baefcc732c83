//! Error objects for the ft232h-unbrick crate
use crate::location::DeviceLocation;
use thiserror::Error;

/// Error type for operations on the FTDI device
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    /// Errors from the USB stack.
    /// Note that permission problems are explicitly handled in DeviceAccess
    #[error("USB error while attempting to communicate with the FTDI device: {0}")]
    Usb(rusb::Error),

    /// DeviceAccess holds a variety of errors relating to getting hold of
    /// the FTDI device
    #[error("{kind}")]
    DeviceAccess { kind: DeviceAccessKind },

    /// Failures reading, copying or erasing the EEPROM
    #[error("{kind}")]
    Eeprom { kind: EepromKind },
}

/// Used to differentiate between different types of problems accessing the
/// FTDI device
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DeviceAccessKind {
    #[error("USB device unavailable")]
    NoDevice,

    #[error("device {vid:04x}:{pid:04x} not found - is it connected and do you have permissions to access it?")]
    NotFound { vid: u16, pid: u16 },

    #[error("Hit USB permissions error while attempting to access the device.  Are you sure you have suitable permissions?  You may need to reconfigure udev rules in /etc/udev/rules.d/.")]
    Permission,

    #[error("unable to claim usb device. Make sure the default FTDI driver is not in use")]
    ClaimFailed,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EepromKind {
    /// The device returned fewer than 2 bytes for a word read
    #[error("reading eeprom failed: short read at word 0x{addr:02x}")]
    ShortRead { addr: u16 },

    /// The device side EEPROM buffer was requested before a read
    #[error("eeprom has not been read from the device")]
    NotRead,

    #[error("Not enough room to store eeprom: buffer is {have} bytes, eeprom is {need} bytes")]
    NoRoom { have: usize, need: usize },

    #[error("read of FTDIChip-ID failed")]
    ChipId,

    /// The magic word used to detect the EEPROM part couldn't be written
    #[error("writing magic failed: {error}")]
    Magic { error: Box<Error> },
}

impl Error {
    /// Returns the libftdi style status code for this error.  Successful
    /// calls report 0, so every error maps to a negative value.
    pub fn status(&self) -> i32 {
        match self {
            Error::Usb(_) => -1,
            Error::DeviceAccess { kind } => match kind {
                DeviceAccessKind::NoDevice => -2,
                DeviceAccessKind::NotFound { .. } => -3,
                DeviceAccessKind::ClaimFailed => -5,
                DeviceAccessKind::Permission => -8,
            },
            Error::Eeprom { kind } => match kind {
                EepromKind::ShortRead { .. } => -1,
                EepromKind::NotRead => -2,
                EepromKind::NoRoom { .. } => -1,
                EepromKind::ChipId => -1,
                EepromKind::Magic { .. } => -2,
            },
        }
    }
}

// Map rusb::Error to Error
impl From<rusb::Error> for Error {
    fn from(err: rusb::Error) -> Self {
        match err {
            rusb::Error::Access => Self::DeviceAccess {
                kind: DeviceAccessKind::Permission,
            },
            rusb::Error::NoDevice => Self::DeviceAccess {
                kind: DeviceAccessKind::NoDevice,
            },
            other => Self::Usb(other),
        }
    }
}

// Map DeviceAccessKind to Error
impl From<DeviceAccessKind> for Error {
    fn from(kind: DeviceAccessKind) -> Self {
        Self::DeviceAccess { kind }
    }
}

// Map EepromKind to Error
impl From<EepromKind> for Error {
    fn from(kind: EepromKind) -> Self {
        Self::Eeprom { kind }
    }
}

/// Errors which end a recovery run.  The Display text of each variant is
/// exactly what the tool prints to stderr before exiting with status 1.
#[derive(Debug, Error)]
pub enum RunError {
    /// The USB context could not be created
    #[error("ftdi_new failed: {0}")]
    Context(rusb::Error),

    /// The device could not be opened, so there is no session to close
    #[error("unable to open ftdi device: {error}")]
    Open {
        location: DeviceLocation,
        error: Error,
    },

    /// A fail-fast library call after the device was opened
    #[error("error: {step}: {error}")]
    Step { step: &'static str, error: Error },

    /// The EEPROM image buffer could not be allocated
    #[error("error: failed to allocate memory")]
    OutOfMemory { size: usize },

    /// Writing progress or dump output failed
    #[error("error: failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl RunError {
    /// Builds a closure which wraps a library [`Error`] as a failed `step`,
    /// for use with `map_err`
    pub fn step(step: &'static str) -> impl FnOnce(Error) -> RunError {
        move |error| RunError::Step { step, error }
    }
}
