//! # ft232h-unbrick
//!
//! This crate recovers FTDI USB-to-serial chips - primarily the FT232H -
//! whose EEPROM has been misconfigured, for example with a vendor or product
//! ID no driver recognises.  It opens the chip by its current
//! vendor/product ID, shows the chip ID and the EEPROM contents, erases the
//! EEPROM back to its blank factory state, and shows the contents again.
//!
//! ## Overview
//!
//! - [`Recovery`] runs the dump/erase/dump sequence and is what most users
//!   want
//! - [`Device`] is the low-level interface to the chip, implemented for real
//!   hardware by [`UsbDevice`]
//! - [`hexdump`] formats EEPROM images for display
//!
//! ## Getting Started
//!
//! ```rust,no_run
//! use ft232h_unbrick::{DeviceLocation, Recovery, UsbDevice};
//!
//! let location = DeviceLocation::new(0x0403, 0x6014);
//! let mut stdout = std::io::stdout();
//! Recovery::new()
//!     .run::<UsbDevice, _>(location, None, &mut stdout)
//!     .unwrap();
//! ```
//!
//! The device is closed when [`Recovery::run`] returns, whether it
//! succeeded or not.
//!
//! ## Error Handling
//!
//! Device operations return [`Error`], covering USB failures, problems
//! finding or claiming the device, and EEPROM access failures.  A run
//! returns [`RunError`], which records the step that failed and displays as
//! the message the command line tool prints.
//!
//! ## Logging
//!
//! The library uses the `log` crate for diagnostic output:
//!
//! - Error: Critical failures requiring immediate attention
//! - Warn: Potential issues, such as a failed chip ID read
//! - Info: Device open/close and detection results
//! - Debug: Detailed operation information
//! - Trace: Function entry and USB control transfers
//!
//! The `ft232h-unbrick` binary initializes
//! [`env_logger`](https://docs.rs/env_logger/latest/env_logger/index.html),
//! so set `RUST_LOG` (e.g. `RUST_LOG=debug`) to see it.
//!
//! ## Technical Details
//!
//! - FTDI vendor ID 0x0403, FT232H product ID 0x6014
//! - Vendor control transfers on interface A
//! - EEPROM read 16 bits at a time, up to 256 bytes (93x66)

pub mod args;
pub mod constants;
pub mod device;
pub mod error;
pub mod hexdump;
pub mod location;
pub mod recovery;

pub use crate::args::Args;
pub use crate::device::usb::{EepromSize, UsbDevice, UsbDeviceConfig};
pub use crate::device::*;
pub use crate::error::{DeviceAccessKind, EepromKind, Error, RunError};
pub use crate::hexdump::{hexdump, HexDump};
pub use crate::location::{DeviceLocation, ParseLocationError};
pub use crate::recovery::{library_banner, Recovery, DEFAULT_EEPROM_SIZE};
