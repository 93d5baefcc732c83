//! [`DeviceLocation`] identifies the USB device to recover by its vendor and
//! product IDs.
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A USB vendor/product ID pair, as given on the command line in the form
/// `vvvv:pppp` (hexadecimal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceLocation {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl DeviceLocation {
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }
}

impl fmt::Display for DeviceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

/// Returned when a string isn't of the form `<hex>:<hex>`
#[derive(Debug, Error, PartialEq)]
pub enum ParseLocationError {
    #[error("expected vendor_id:product_id, no ':' separator found")]
    MissingSeparator,

    #[error("invalid {field} {value:?}: expected a 16-bit hexadecimal number")]
    InvalidHex { field: &'static str, value: String },
}

impl FromStr for DeviceLocation {
    type Err = ParseLocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (vendor, product) = s
            .split_once(':')
            .ok_or(ParseLocationError::MissingSeparator)?;
        Ok(Self {
            vendor_id: parse_hex_u16("vendor_id", vendor)?,
            product_id: parse_hex_u16("product_id", product)?,
        })
    }
}

fn parse_hex_u16(field: &'static str, value: &str) -> Result<u16, ParseLocationError> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u16::from_str_radix(digits, 16).map_err(|_| ParseLocationError::InvalidHex {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{FT232H_PID, FTDI_VID};

    #[test]
    fn test_parse_valid() {
        let loc: DeviceLocation = "aaaa:bbbb".parse().unwrap();
        assert_eq!(loc, DeviceLocation::new(0xaaaa, 0xbbbb));

        let loc: DeviceLocation = "0403:6014".parse().unwrap();
        assert_eq!(loc.vendor_id, FTDI_VID);
        assert_eq!(loc.product_id, FT232H_PID);
    }

    #[test]
    fn test_parse_prefix_and_case() {
        let loc: DeviceLocation = "0x403:0X6014".parse().unwrap();
        assert_eq!(loc, DeviceLocation::new(0x0403, 0x6014));

        let loc: DeviceLocation = "FfFf:1".parse().unwrap();
        assert_eq!(loc, DeviceLocation::new(0xffff, 0x0001));
    }

    #[test]
    fn test_parse_missing_separator() {
        assert_eq!(
            "04036014".parse::<DeviceLocation>(),
            Err(ParseLocationError::MissingSeparator)
        );
    }

    #[test]
    fn test_parse_invalid_components() {
        assert!(matches!(
            "0403:".parse::<DeviceLocation>(),
            Err(ParseLocationError::InvalidHex {
                field: "product_id",
                ..
            })
        ));
        assert!(matches!(
            "zz:6014".parse::<DeviceLocation>(),
            Err(ParseLocationError::InvalidHex {
                field: "vendor_id",
                ..
            })
        ));
        // Out of 16-bit range
        assert!("10000:6014".parse::<DeviceLocation>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(DeviceLocation::new(0x403, 0x6014).to_string(), "0403:6014");
    }
}
