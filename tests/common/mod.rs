use ft232h_unbrick::{ChipType, Device, DeviceLocation, EepromChip, Error};
use std::cell::RefCell;
use std::rc::Rc;

/// Shared record of the calls made on a [`MockDevice`], which outlives the
/// device so tests can check it was closed
pub type CallLog = Rc<RefCell<Vec<&'static str>>>;

/// Scripted behaviour for a [`MockDevice`]
#[derive(Debug, Default)]
pub struct MockConfig {
    pub open_error: Option<Error>,
    pub chipid: Option<Result<u32, Error>>,
    pub read_eeprom_error: Option<Error>,
    pub get_buffer_error: Option<Error>,
    pub erase_error: Option<Error>,
    /// EEPROM contents before the erase.  Erasing sets every byte to 0xff.
    pub image: Vec<u8>,
    pub calls: CallLog,
}

#[derive(Debug)]
pub struct MockDevice {
    location: DeviceLocation,
    config: MockConfig,
    image: Vec<u8>,
    read: bool,
    erased: bool,
}

impl MockDevice {
    fn record(&self, call: &'static str) {
        self.config.calls.borrow_mut().push(call);
    }
}

impl Device for MockDevice {
    type Config = MockConfig;

    fn open(location: DeviceLocation, config: Option<Self::Config>) -> Result<Self, Error> {
        let config = config.unwrap_or_default();
        config.calls.borrow_mut().push("open");
        if let Some(e) = &config.open_error {
            return Err(e.clone());
        }
        Ok(Self {
            location,
            image: config.image.clone(),
            config,
            read: false,
            erased: false,
        })
    }

    fn location(&self) -> DeviceLocation {
        self.location
    }

    fn chip_type(&self) -> ChipType {
        ChipType::Ft232H
    }

    fn read_chipid(&mut self) -> Result<u32, Error> {
        self.record("read_chipid");
        self.config.chipid.clone().unwrap_or(Ok(0))
    }

    fn read_eeprom(&mut self) -> Result<(), Error> {
        self.record("read_eeprom");
        if let Some(e) = &self.config.read_eeprom_error {
            return Err(e.clone());
        }
        self.read = true;
        Ok(())
    }

    fn eeprom_buf(&self, buf: &mut [u8]) -> Result<usize, Error> {
        self.record("eeprom_buf");
        if let Some(e) = &self.config.get_buffer_error {
            return Err(e.clone());
        }
        assert!(self.read, "eeprom_buf called before read_eeprom");
        let copied = buf.len().min(self.image.len());
        buf[..copied].copy_from_slice(&self.image[..copied]);
        buf[copied..].fill(0);
        Ok(copied)
    }

    fn erase_eeprom(&mut self) -> Result<(), Error> {
        self.record("erase_eeprom");
        if let Some(e) = &self.config.erase_error {
            return Err(e.clone());
        }
        self.image.fill(0xff);
        self.read = false;
        self.erased = true;
        Ok(())
    }

    fn eeprom_chip(&self) -> Option<EepromChip> {
        self.record("eeprom_chip");
        self.erased.then_some(EepromChip::Ee93x56)
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        self.record("close");
    }
}

pub fn close_count(calls: &CallLog) -> usize {
    calls.borrow().iter().filter(|c| **c == "close").count()
}
