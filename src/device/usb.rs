#[allow(unused_imports)]
use crate::constants::*;
use crate::device::{ChipType, Device, EepromChip};
use crate::error::{DeviceAccessKind, EepromKind};
use crate::{DeviceLocation, Error};

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use rusb::Device as RusbDevice;
use rusb::DeviceHandle as RusbDeviceHandle;
use rusb::{constants, Context, DeviceDescriptor, UsbContext};
use std::cmp::min;
use std::time::Duration;

/// UsbDevice represents an open session with an FTDI chip attached via USB.
///
/// The interface is claimed when the device is opened and released when it
/// is dropped.  EEPROM reads go into a device side image, retrieved with
/// [`Device::eeprom_buf`].
#[derive(Debug)]
pub struct UsbDevice {
    handle: RusbDeviceHandle<Context>,
    config: UsbDeviceConfig,
    location: DeviceLocation,
    chip_type: ChipType,
    eeprom: Option<EepromImage>,
    eeprom_chip: Option<EepromChip>,
}

#[derive(Debug)]
pub struct UsbDeviceConfig {
    /// The [`rusb::Context`] to use for this device.  May be None to use
    /// a newly created context.
    pub context: Option<Context>,

    /// Timeout applied to each USB control transfer
    pub timeout: Duration,
}

impl Default for UsbDeviceConfig {
    fn default() -> Self {
        UsbDeviceConfig {
            context: None,
            timeout: DEFAULT_CONTROL_TIMEOUT,
        }
    }
}

/// Detected size of the EEPROM image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EepromSize {
    /// Every byte read back as 0xff
    Blank,
    Bytes(usize),
}

impl EepromSize {
    /// The minimum buffer size needed to hold the image
    pub fn required(&self) -> usize {
        match self {
            EepromSize::Blank => 0,
            EepromSize::Bytes(n) => *n,
        }
    }
}

#[derive(Debug)]
struct EepromImage {
    buf: [u8; FTDI_MAX_EEPROM_SIZE],
    size: EepromSize,
}

/// Public Device functions
impl Device for UsbDevice {
    type Config = UsbDeviceConfig;

    fn open(location: DeviceLocation, config: Option<Self::Config>) -> Result<Self, Error> {
        trace!("Device::open {location}");

        let mut config = config.unwrap_or_default();
        trace!("DeviceConfig::context {:?}", config.context);
        trace!("DeviceConfig::timeout {:?}", config.timeout);

        // Create the rusb:Context if we weren't provided one
        let context = match config.context.take() {
            Some(ctx) => ctx,
            None => Context::new()?,
        };
        config.context = Some(context.clone());

        let (device, mut handle) = Self::find_device(&context, location)?;
        let device_desc = device.device_descriptor()?;
        let bcd_device = bcd_device(&device_desc);
        let chip_type = ChipType::from_bcd_device(
            bcd_device,
            device_desc.serial_number_string_index().is_some(),
        );
        info!(
            "Opened {chip_type:?} (bcdDevice 0x{bcd_device:04x}) at bus/address {:03}-{:03}",
            device.bus_number(),
            device.address()
        );

        Self::claim_interface(&mut handle)?;

        // From here on Drop releases the interface, whatever happens
        let device = Self {
            handle,
            config,
            location,
            chip_type,
            eeprom: None,
            eeprom_chip: None,
        };
        device.usb_reset()?;

        Ok(device)
    }

    fn location(&self) -> DeviceLocation {
        self.location
    }

    fn chip_type(&self) -> ChipType {
        self.chip_type
    }

    fn read_chipid(&mut self) -> Result<u32, Error> {
        trace!("Device::read_chipid");
        let a = self.read_word(CHIPID_ADDR_HIGH).map_err(chipid_error)?;
        let b = self.read_word(CHIPID_ADDR_LOW).map_err(chipid_error)?;
        let chipid = decode_chipid(a, b);
        debug!("Chip ID words 0x{a:04x} 0x{b:04x} decode to 0x{chipid:08x}");
        Ok(chipid)
    }

    fn read_eeprom(&mut self) -> Result<(), Error> {
        trace!("Device::read_eeprom");

        let mut buf = [0u8; FTDI_MAX_EEPROM_SIZE];
        for (addr, word) in buf.chunks_exact_mut(2).enumerate() {
            let value = self.read_word(addr as u16)?;
            word.copy_from_slice(&value.to_le_bytes());
        }

        let size = detect_eeprom_size(self.chip_type, &buf);
        debug!("Read EEPROM, detected size {size:?}");
        self.eeprom = Some(EepromImage { buf, size });
        Ok(())
    }

    fn eeprom_buf(&self, buf: &mut [u8]) -> Result<usize, Error> {
        trace!("Device::eeprom_buf buf.len() {}", buf.len());

        let image = self.eeprom.as_ref().ok_or(EepromKind::NotRead)?;
        let need = image.size.required();
        if buf.len() < need {
            warn!("Buffer of {} bytes too small for {need} byte EEPROM", buf.len());
            return Err(EepromKind::NoRoom {
                have: buf.len(),
                need,
            }
            .into());
        }

        let copied = min(buf.len(), FTDI_MAX_EEPROM_SIZE);
        buf[..copied].copy_from_slice(&image.buf[..copied]);
        buf[copied..].fill(0);
        Ok(copied)
    }

    fn erase_eeprom(&mut self) -> Result<(), Error> {
        trace!("Device::erase_eeprom");

        // Any image we hold no longer reflects the device
        self.eeprom = None;

        if self.chip_type.has_internal_eeprom() {
            info!(
                "{:?} has an internal EEPROM, nothing to erase",
                self.chip_type
            );
            self.eeprom_chip = Some(EepromChip::Internal);
            return Ok(());
        }

        self.control_out(SIO_ERASE_EEPROM_REQUEST, 0, 0)?;

        // Work out the EEPROM part from where the magic word wraps to
        self.control_out(SIO_WRITE_EEPROM_REQUEST, EEPROM_MAGIC, EEPROM_MAGIC_ADDR)
            .map_err(magic_error)?;
        let chip = if self.read_word(0x00)? == EEPROM_MAGIC {
            EepromChip::Ee93x46
        } else if self.read_word(0x40)? == EEPROM_MAGIC {
            EepromChip::Ee93x56
        } else if self.read_word(EEPROM_MAGIC_ADDR)? == EEPROM_MAGIC {
            EepromChip::Ee93x66
        } else {
            warn!("Magic word not found after write, EEPROM part unknown");
            EepromChip::Unknown
        };
        info!("Detected EEPROM {chip:?}");
        self.eeprom_chip = Some(chip);

        // Erase again to get rid of the magic word
        self.control_out(SIO_ERASE_EEPROM_REQUEST, 0, 0)?;

        Ok(())
    }

    fn eeprom_chip(&self) -> Option<EepromChip> {
        self.eeprom_chip
    }
}

/// Private Device functions
impl UsbDevice {
    /// Enumerate the bus, find the first device at `location` and open it
    fn find_device(
        context: &Context,
        location: DeviceLocation,
    ) -> Result<(RusbDevice<Context>, RusbDeviceHandle<Context>), Error> {
        trace!("Device::find_device context {context:?} location {location}");

        for device in context.devices()?.iter() {
            let device_desc = device.device_descriptor()?;
            trace!(
                "Found USB device {:04x}:{:04x}",
                device_desc.vendor_id(),
                device_desc.product_id()
            );

            if device_desc.vendor_id() == location.vendor_id
                && device_desc.product_id() == location.product_id
            {
                debug!("Found matching device {location}");
                let handle = device.open().inspect_err(|e| {
                    info!("Failed to open device {location}: {e}");
                })?;
                return Ok((device, handle));
            }
        }

        info!("No device {location} found");
        Err(DeviceAccessKind::NotFound {
            vid: location.vendor_id,
            pid: location.product_id,
        }
        .into())
    }

    fn claim_interface(handle: &mut RusbDeviceHandle<Context>) -> Result<(), Error> {
        // ftdi_sio will usually have bound to the device on Linux
        match handle.set_auto_detach_kernel_driver(true) {
            Ok(()) => (),
            Err(rusb::Error::NotSupported) => {
                debug!("Kernel driver auto-detach not supported on this platform")
            }
            Err(e) => return Err(e.into()),
        }

        handle.claim_interface(USB_INTERFACE).map_err(|e| {
            warn!("Failed to claim interface {USB_INTERFACE}: {e}");
            match e {
                rusb::Error::Access => Error::from(DeviceAccessKind::Permission),
                _ => Error::from(DeviceAccessKind::ClaimFailed),
            }
        })
    }

    fn usb_reset(&self) -> Result<(), Error> {
        trace!("Device::usb_reset");
        self.control_out(SIO_RESET_REQUEST, SIO_RESET_SIO, SIO_INDEX_A)
    }

    /// Reads a single 16-bit EEPROM word
    fn read_word(&self, addr: u16) -> Result<u16, Error> {
        let data = self.control_in(SIO_READ_EEPROM_REQUEST, 0, addr, 2)?;
        match data.as_slice() {
            [lo, hi] => Ok(u16::from_le_bytes([*lo, *hi])),
            _ => {
                debug!("Short EEPROM read at 0x{addr:02x}: {} bytes", data.len());
                Err(EepromKind::ShortRead { addr }.into())
            }
        }
    }

    /// Sends a vendor control message and reads the response
    fn control_in(
        &self,
        request: u8,
        value: u16,
        index: u16,
        len: usize,
    ) -> Result<Vec<u8>, Error> {
        trace!(
            "Device::control_in request 0x{request:02x} value 0x{value:04x} index 0x{index:04x} len {len}"
        );

        // Vendor request, device as recipient, with IN direction
        const REQUEST_TYPE: u8 = constants::LIBUSB_REQUEST_TYPE_VENDOR
            | constants::LIBUSB_RECIPIENT_DEVICE
            | constants::LIBUSB_ENDPOINT_IN;

        let mut buf = vec![0u8; len];
        let read = self.handle.read_control(
            REQUEST_TYPE,
            request,
            value,
            index,
            &mut buf,
            self.config.timeout,
        )?;
        buf.truncate(read);
        Ok(buf)
    }

    /// Sends a vendor control message with no data stage
    fn control_out(&self, request: u8, value: u16, index: u16) -> Result<(), Error> {
        trace!(
            "Device::control_out request 0x{request:02x} value 0x{value:04x} index 0x{index:04x}"
        );

        const REQUEST_TYPE: u8 = constants::LIBUSB_REQUEST_TYPE_VENDOR
            | constants::LIBUSB_RECIPIENT_DEVICE
            | constants::LIBUSB_ENDPOINT_OUT;

        self.handle.write_control(
            REQUEST_TYPE,
            request,
            value,
            index,
            &[],
            self.config.timeout,
        )?;
        Ok(())
    }
}

impl Drop for UsbDevice {
    fn drop(&mut self) {
        trace!("Device::drop");
        // Release interface - ignoring errors since we're in drop.  The
        // handle itself is closed when it is dropped after this.
        if let Err(e) = self.handle.release_interface(USB_INTERFACE) {
            debug!("Failed to release interface: {e}");
        }
        info!("Closed device {}", self.location);
    }
}

/// Rebuilds the raw bcdDevice value, which rusb hands back decoded
fn bcd_device(desc: &DeviceDescriptor) -> u16 {
    let version = desc.device_version();
    let major = version.major() as u16;
    ((major / 10) << 12)
        | ((major % 10) << 8)
        | ((version.minor() as u16) << 4)
        | version.sub_minor() as u16
}

fn chipid_error(err: Error) -> Error {
    match err {
        Error::Eeprom {
            kind: EepromKind::ShortRead { .. },
        } => EepromKind::ChipId.into(),
        other => other,
    }
}

fn magic_error(err: Error) -> Error {
    EepromKind::Magic {
        error: Box::new(err),
    }
    .into()
}

/// Works out how much of the 256 byte image is real by looking for the
/// address wraparound of smaller parts
pub fn detect_eeprom_size(chip_type: ChipType, buf: &[u8; FTDI_MAX_EEPROM_SIZE]) -> EepromSize {
    if chip_type == ChipType::Ft232R {
        EepromSize::Bytes(FT232R_EEPROM_SIZE)
    } else if buf.iter().all(|&b| b == 0xff) {
        EepromSize::Blank
    } else if buf[..0x80] == buf[0x80..] {
        EepromSize::Bytes(0x80)
    } else if buf[..0x40] == buf[0x40..0x80] {
        EepromSize::Bytes(0x40)
    } else {
        EepromSize::Bytes(FTDI_MAX_EEPROM_SIZE)
    }
}

/// Decodes the FTDIChip-ID from the two EEPROM words holding it
pub fn decode_chipid(high: u16, low: u16) -> u32 {
    let a = ((high.swap_bytes() as u32) << 16) | low.swap_bytes() as u32;
    let shuffled = chipid_shift(a)
        | (chipid_shift(a >> 8) << 8)
        | (chipid_shift(a >> 16) << 16)
        | (chipid_shift(a >> 24) << 24);
    shuffled ^ CHIPID_XOR
}

/// Bit shuffle applied to each byte of the chip ID
fn chipid_shift(value: u32) -> u32 {
    let v = value as u8;
    (((v & 1) << 1)
        | ((v & 2) << 5)
        | ((v & 4) >> 2)
        | ((v & 8) << 4)
        | ((v & 16) >> 1)
        | ((v & 32) >> 1)
        | ((v & 64) >> 4)
        | ((v & 128) >> 2)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_not_found() {
        // Nothing should ever be attached with this VID/PID
        let location = DeviceLocation::new(0xfffe, 0xfffe);
        let result = UsbDevice::open(location, None);
        println!("{result:?}");
        assert!(matches!(
            result,
            Err(Error::DeviceAccess {
                kind: DeviceAccessKind::NotFound {
                    vid: 0xfffe,
                    pid: 0xfffe
                }
            }) |
            // No USB access at all in some test environments
            Err(Error::Usb(_)) | Err(Error::DeviceAccess { .. })
        ));
    }

    #[test]
    fn test_magic_error_wraps_transfer_error() {
        let err = magic_error(rusb::Error::Timeout.into());
        assert_eq!(
            err,
            Error::Eeprom {
                kind: EepromKind::Magic {
                    error: Box::new(Error::Usb(rusb::Error::Timeout))
                }
            }
        );
        assert_eq!(err.status(), -2);
    }

    #[test]
    fn test_chipid_shift_bits() {
        let mapping = [
            (0x01, 0x02),
            (0x02, 0x40),
            (0x04, 0x01),
            (0x08, 0x80),
            (0x10, 0x08),
            (0x20, 0x10),
            (0x40, 0x04),
            (0x80, 0x20),
        ];
        for (input, output) in mapping {
            assert_eq!(chipid_shift(input), output, "bit 0x{input:02x}");
        }
        assert_eq!(chipid_shift(0x1ff), 0xff);
    }

    #[test]
    fn test_decode_chipid() {
        assert_eq!(decode_chipid(0x0000, 0x0000), CHIPID_XOR);
        assert_eq!(decode_chipid(0xffff, 0xffff), 0x5a0f_082e);
        assert_eq!(decode_chipid(0x1234, 0xabcd), 0xbcb8_5023);
    }

    #[test]
    fn test_detect_blank() {
        let buf = [0xffu8; FTDI_MAX_EEPROM_SIZE];
        assert_eq!(
            detect_eeprom_size(ChipType::Ft232H, &buf),
            EepromSize::Blank
        );
        assert_eq!(EepromSize::Blank.required(), 0);
        // FT232R is always 128 bytes
        assert_eq!(
            detect_eeprom_size(ChipType::Ft232R, &buf),
            EepromSize::Bytes(0x80)
        );
    }

    #[test]
    fn test_detect_wraparound() {
        let mut buf = [0u8; FTDI_MAX_EEPROM_SIZE];
        for (i, b) in buf.iter_mut().enumerate() {
            *b = (i % 0x40) as u8;
        }
        assert_eq!(
            detect_eeprom_size(ChipType::Ft232H, &buf),
            EepromSize::Bytes(0x80)
        );

        for (i, b) in buf.iter_mut().enumerate() {
            *b = (i % 0x80) as u8;
        }
        buf[0xff] = 0x42;
        assert_eq!(
            detect_eeprom_size(ChipType::Ft232H, &buf),
            EepromSize::Bytes(0x100)
        );

        let mut buf = [0u8; FTDI_MAX_EEPROM_SIZE];
        for (i, b) in buf.iter_mut().enumerate() {
            *b = (i % 0x40) as u8;
        }
        buf[0x80] = 0x99;
        assert_eq!(
            detect_eeprom_size(ChipType::Ft2232H, &buf),
            EepromSize::Bytes(0x40)
        );
    }
}
