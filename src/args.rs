//! Command line arguments for the ft232h-unbrick binary
use crate::recovery::DEFAULT_EEPROM_SIZE;
use crate::DeviceLocation;
use clap::Parser;

/// Printed to stdout when the arguments can't be parsed
pub const USAGE: &str = "usage: [vendor_id:product_id]";

/// Resets the EEPROM of an FTDI chip, showing its contents before and after
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Device to recover as vendor_id:product_id in hex, e.g. 0403:6014
    pub location: DeviceLocation,

    /// Number of EEPROM bytes to retrieve and display
    #[arg(long, default_value_t = DEFAULT_EEPROM_SIZE)]
    pub eeprom_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_location() {
        let args = Args::try_parse_from(["ft232h-unbrick", "0403:6014"]).unwrap();
        assert_eq!(args.location, DeviceLocation::new(0x0403, 0x6014));
        assert_eq!(args.eeprom_size, DEFAULT_EEPROM_SIZE);
    }

    #[test]
    fn test_eeprom_size() {
        let args =
            Args::try_parse_from(["ft232h-unbrick", "--eeprom-size", "255", "aaaa:bbbb"]).unwrap();
        assert_eq!(args.eeprom_size, 255);
        assert_eq!(args.location, DeviceLocation::new(0xaaaa, 0xbbbb));
    }

    #[test]
    fn test_missing_argument() {
        assert!(Args::try_parse_from(["ft232h-unbrick"]).is_err());
    }

    #[test]
    fn test_malformed_argument() {
        assert!(Args::try_parse_from(["ft232h-unbrick", "04036014"]).is_err());
        assert!(Args::try_parse_from(["ft232h-unbrick", "0403:xyz"]).is_err());
    }
}
