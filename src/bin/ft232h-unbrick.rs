//! Recovers an FTDI chip with a misconfigured EEPROM.
//!
//! ```text
//! ft232h-unbrick [--eeprom-size <N>] <vendor_id>:<product_id>
//! ```
//!
//! Opens the device with the given (hexadecimal) vendor and product IDs,
//! prints its chip ID, dumps the EEPROM, erases it and dumps it again.
//!
//! Progress and dumps go to stdout, errors to stderr.  The exit status is 0
//! if the whole sequence completed and 1 otherwise.
//!
//! Diagnostic logging goes to stderr and can be controlled via the
//! `RUST_LOG` environment variable.
use ft232h_unbrick::args::USAGE;
use ft232h_unbrick::{library_banner, Args, Recovery, RunError, UsbDevice, UsbDeviceConfig};

use clap::error::ErrorKind;
use clap::Parser;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use rusb::Context;
use std::io::{self, Write};

fn execute(args: Args) -> Result<(), RunError> {
    info!("Create USB context");
    let context = Context::new().map_err(RunError::Context)?;
    println!("{}", library_banner());

    let config = UsbDeviceConfig {
        context: Some(context),
        ..Default::default()
    };
    let recovery = Recovery::new().eeprom_size(args.eeprom_size);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = recovery.run::<UsbDevice, _>(args.location, Some(config), &mut out);
    // Get everything printed so far out before any error message
    out.flush()?;
    result
}

fn main() {
    env_logger::builder().init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            debug!("Failed to parse arguments: {e}");
            println!("{USAGE}");
            std::process::exit(1);
        }
    };

    match execute(args) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            debug!("Recovery failed: {e:?}");
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
