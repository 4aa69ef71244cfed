use crate::device::base::{Transport, TransportError, UsbLocation, UsbSpeed};
use crate::error::ConnectError;
use crate::request::{direction_of, Direction};
use crate::VID_MAGTEK;
use log::{debug, info, warn};
use rusb::{Device, DeviceDescriptor, DeviceHandle, GlobalContext, Language};
use std::time::Duration;

pub struct LibUsbTransport {
    handle: DeviceHandle<GlobalContext>,
    device: Device<GlobalContext>,
    location: UsbLocation,
    language: Option<Language>,
    timeout: Duration,
}

impl LibUsbTransport {
    fn find_device(
        location: UsbLocation,
    ) -> Result<(Device<GlobalContext>, DeviceDescriptor), ConnectError> {
        for usb_device in rusb::devices()?.iter() {
            if usb_device.bus_number() == location.bus_number
                && usb_device.address() == location.address
            {
                let descriptor = usb_device.device_descriptor()?;
                return Ok((usb_device, descriptor));
            }
        }
        Err(ConnectError::DeviceNotFound)
    }

    pub fn open(location: UsbLocation) -> Result<Self, ConnectError> {
        let (device, descriptor) = LibUsbTransport::find_device(location)?;
        if descriptor.vendor_id() != VID_MAGTEK {
            warn!(
                "Device at {} has vendor id {:04x}, not a MagTek reader?",
                location,
                descriptor.vendor_id()
            );
        }

        let mut handle = device.open()?;
        let timeout = Duration::from_secs(1);

        // HID readers are normally bound to the kernel driver, feature reports still go
        // through the default pipe, but detaching lets us claim the interface where needed.
        if let Err(e) = handle.set_auto_detach_kernel_driver(true) {
            debug!("Auto detach of kernel driver not available: {}", e);
        }

        // Devices without string descriptors answer with a pipe error, that's not fatal here.
        let language = match handle.read_languages(timeout) {
            Ok(languages) => languages.first().copied(),
            Err(e) => {
                debug!("Unable to read string descriptor languages: {}", e);
                None
            }
        };

        info!("Connected to possible MagTek device at {:?}", device);

        Ok(Self {
            handle,
            device,
            location,
            language,
            timeout,
        })
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Performs a USB port reset, the device will re-enumerate.
    pub fn usb_reset(&mut self) -> Result<(), ConnectError> {
        debug!("Performing USB port reset on {:?}", self.device);
        self.handle.reset()?;
        Ok(())
    }
}

impl Transport for LibUsbTransport {
    fn control_transfer(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buffer: &mut [u8],
    ) -> Result<usize, TransportError> {
        let result = match direction_of(request_type) {
            Direction::In => self.handle.read_control(
                request_type,
                request,
                value,
                index,
                buffer,
                self.timeout,
            ),
            Direction::Out => self.handle.write_control(
                request_type,
                request,
                value,
                index,
                buffer,
                self.timeout,
            ),
        };
        Ok(result?)
    }

    fn string_descriptor(&mut self, index: u8) -> Result<String, TransportError> {
        let language = self.language.ok_or(TransportError::Stall)?;
        Ok(self
            .handle
            .read_string_descriptor(language, index, self.timeout)?)
    }

    fn location(&self) -> Option<UsbLocation> {
        Some(self.location)
    }

    fn speed(&self) -> Option<UsbSpeed> {
        map_speed(self.device.speed())
    }
}

fn map_speed(speed: rusb::Speed) -> Option<UsbSpeed> {
    match speed {
        rusb::Speed::Low => Some(UsbSpeed::Low),
        rusb::Speed::Full => Some(UsbSpeed::Full),
        rusb::Speed::High => Some(UsbSpeed::High),
        rusb::Speed::Super => Some(UsbSpeed::Super),
        rusb::Speed::SuperPlus => Some(UsbSpeed::SuperPlus),
        _ => None,
    }
}

impl From<rusb::Error> for TransportError {
    fn from(error: rusb::Error) -> Self {
        match error {
            rusb::Error::Timeout => TransportError::Timeout,
            rusb::Error::Pipe => TransportError::Stall,
            rusb::Error::NoDevice => TransportError::Disconnected,
            other => TransportError::Io(other.to_string()),
        }
    }
}

pub fn find_devices() -> Vec<UsbLocation> {
    let mut found_devices: Vec<UsbLocation> = Vec::new();

    if let Ok(devices) = rusb::devices() {
        for device in devices.iter() {
            if let Ok(descriptor) = device.device_descriptor() {
                if descriptor.vendor_id() == VID_MAGTEK {
                    found_devices.push(UsbLocation {
                        bus_number: device.bus_number(),
                        address: device.address(),
                    });
                }
            }
        }
    }

    found_devices
}
