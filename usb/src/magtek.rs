use crate::descriptor::{
    bcd_to_string, class_name, ConfigDescriptor, DescriptorKind, DeviceDescriptor,
};
use crate::device::base::{Transport, UsbLocation, UsbSpeed};
use crate::error::MagtekError;
use crate::family::DeviceFamily;
use crate::negotiate::negotiate_buffer_size;
use crate::protocol;
use crate::request::{
    INTERFACE_NUMBER, REQUEST_GET_DESCRIPTOR, REQUEST_TYPE_STANDARD_IN, VALUE_CONFIG_DESCRIPTOR,
    VALUE_DEVICE_DESCRIPTOR,
};
use log::{debug, info};
use magtek_types::{DeviceInfo, PropertyId};
use std::thread::sleep;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    Unnegotiated,
    Ready { buffer_size: usize },
}

/// A single MagTek reader, and everything learned about it since it was opened.
///
/// Operations block until the transport completes. The facade is not safe to share between
/// threads without external locking, as a command and its response are separate transfers.
#[derive(Debug)]
pub struct MagTek<T: Transport> {
    transport: T,
    family: DeviceFamily,
    device_descriptor: DeviceDescriptor,
    config_descriptor: ConfigDescriptor,
    state: State,
}

impl<T: Transport> MagTek<T> {
    /// Reads the device and configuration descriptors, without negotiating a buffer size.
    pub fn new(mut transport: T, family: DeviceFamily) -> Result<Self, MagtekError> {
        let device = read_descriptor(&mut transport, DescriptorKind::Device)?;
        let device_descriptor = DeviceDescriptor::decode(&device)?;

        let config = read_descriptor(&mut transport, DescriptorKind::Configuration)?;
        let config_descriptor = ConfigDescriptor::decode(&config)?;

        debug!("Device Descriptor: {:?}", device_descriptor);
        debug!("Config Descriptor: {:?}", config_descriptor);

        Ok(Self {
            transport,
            family,
            device_descriptor,
            config_descriptor,
            state: State::Unnegotiated,
        })
    }

    /// Opens the device and negotiates the command buffer using the given family.
    pub fn open(transport: T, family: DeviceFamily) -> Result<Self, MagtekError> {
        let mut magtek = Self::new(transport, family)?;
        magtek.negotiate()?;
        Ok(magtek)
    }

    /// Like [`MagTek::new`], picking the family from the product id in the device descriptor.
    pub fn detect(mut transport: T) -> Result<Self, MagtekError> {
        let device = read_descriptor(&mut transport, DescriptorKind::Device)?;
        let family = DeviceFamily::for_product(DeviceDescriptor::decode(&device)?.product_id);
        info!("Using the {} device family", family.name);

        Self::new(transport, family)
    }

    /// Opens the device, picking the family from the product id in its descriptor.
    pub fn open_detected(transport: T) -> Result<Self, MagtekError> {
        let mut magtek = Self::detect(transport)?;
        magtek.negotiate()?;
        Ok(magtek)
    }

    /// Probes the family's buffer sizes. Once a size is found it is kept for the life of this
    /// value, a failed negotiation leaves the device unusable for property commands.
    pub fn negotiate(&mut self) -> Result<usize, MagtekError> {
        if let State::Ready { buffer_size } = self.state {
            return Ok(buffer_size);
        }

        let buffer_size = negotiate_buffer_size(&mut self.transport, &self.family.buffer_sizes)?;
        self.state = State::Ready { buffer_size };
        Ok(buffer_size)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready { .. })
    }

    pub fn buffer_size(&self) -> Result<usize, MagtekError> {
        self.ready("buffer size")
    }

    fn ready(&self, operation: &'static str) -> Result<usize, MagtekError> {
        match self.state {
            State::Ready { buffer_size } => Ok(buffer_size),
            State::Unnegotiated => Err(MagtekError::DeviceNotReady { operation }),
        }
    }

    pub fn family(&self) -> &DeviceFamily {
        &self.family
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Releases the underlying handle, needed to reopen the device after a reset.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Reads a property by its raw code, including codes not covered by [`PropertyId`].
    pub fn get(&mut self, property: u8) -> Result<Vec<u8>, MagtekError> {
        let buffer_size = self.ready("get property")?;
        protocol::get_property(&mut self.transport, buffer_size, property)
    }

    /// Writes a property by its raw code.
    pub fn set(&mut self, property: u8, value: &[u8]) -> Result<(), MagtekError> {
        let buffer_size = self.ready("set property")?;
        protocol::set_property(&mut self.transport, buffer_size, property, value)
    }

    pub fn get_property(&mut self, property: PropertyId) -> Result<String, MagtekError> {
        let value = self.get(property.code())?;
        Ok(String::from_utf8_lossy(&value).to_string())
    }

    pub fn set_property(&mut self, property: PropertyId, value: &str) -> Result<(), MagtekError> {
        self.set(property.code(), value.as_bytes())
    }

    pub fn get_software_id(&mut self) -> Result<String, MagtekError> {
        self.get_property(PropertyId::SoftwareId)
    }

    pub fn get_product_version(&mut self) -> Result<String, MagtekError> {
        let version = self.get(PropertyId::ProductVersion.code())?;

        // Readers without a product version answer with a single placeholder byte.
        if version.len() == 1 {
            return Ok(String::new());
        }
        Ok(String::from_utf8_lossy(&version).to_string())
    }

    pub fn get_serial_number(&mut self) -> Result<String, MagtekError> {
        self.get_property(PropertyId::DeviceSerialNumber)
    }

    pub fn set_serial_number(&mut self, serial: &str) -> Result<(), MagtekError> {
        self.set_property(PropertyId::DeviceSerialNumber, serial)
    }

    pub fn erase_serial_number(&mut self) -> Result<(), MagtekError> {
        self.set_property(PropertyId::DeviceSerialNumber, "")
    }

    pub fn get_factory_serial_number(&mut self) -> Result<String, MagtekError> {
        self.get_property(PropertyId::FactorySerialNumber)
    }

    /// On DynaMag readers this fails with a command error once the value has been configured.
    pub fn set_factory_serial_number(&mut self, serial: &str) -> Result<(), MagtekError> {
        self.set_property(PropertyId::FactorySerialNumber, serial)
    }

    pub fn erase_factory_serial_number(&mut self) -> Result<(), MagtekError> {
        self.set_property(PropertyId::FactorySerialNumber, "")
    }

    /// Sets the device serial number to the first `length` characters of the factory serial.
    pub fn copy_factory_serial_number(&mut self, length: usize) -> Result<(), MagtekError> {
        let factory = self.get_factory_serial_number()?;
        if factory.is_empty() {
            return Err(MagtekError::FactorySerialAbsent);
        }

        let serial: String = factory.chars().take(length).collect();
        debug!("Copying factory serial {} to device as {}", factory, serial);
        self.set_serial_number(&serial)
    }

    /// Sends a vendor reset, then blocks for the family's settle time.
    ///
    /// The descriptors and buffer size held here no longer describe the device afterwards, so
    /// the facade is consumed and the transport handed back for reopening with a new [`MagTek`].
    pub fn reset(mut self) -> Result<T, MagtekError> {
        let buffer_size = self.ready("reset device")?;
        protocol::reset_device(
            &mut self.transport,
            buffer_size,
            self.family.drain_after_reset,
        )?;

        debug!("Waiting {:?} for the device to settle", self.family.reset_settle);
        sleep(self.family.reset_settle);
        Ok(self.transport)
    }

    pub fn device_descriptor(&self) -> &DeviceDescriptor {
        &self.device_descriptor
    }

    pub fn config_descriptor(&self) -> &ConfigDescriptor {
        &self.config_descriptor
    }

    pub fn location(&self) -> Option<UsbLocation> {
        self.transport.location()
    }

    pub fn speed(&self) -> Option<UsbSpeed> {
        self.transport.speed()
    }

    pub fn vendor_id(&self) -> String {
        format!("{:04x}", self.device_descriptor.vendor_id)
    }

    pub fn product_id(&self) -> String {
        format!("{:04x}", self.device_descriptor.product_id)
    }

    pub fn usb_spec(&self) -> String {
        bcd_to_string(self.device_descriptor.usb_specification)
    }

    pub fn device_version(&self) -> String {
        bcd_to_string(self.device_descriptor.device_release_number)
    }

    pub fn usb_class(&self) -> &'static str {
        class_name(self.device_descriptor.device_class)
    }

    pub fn usb_subclass(&self) -> &'static str {
        class_name(self.device_descriptor.device_sub_class)
    }

    pub fn usb_protocol(&self) -> u8 {
        self.device_descriptor.device_protocol
    }

    pub fn max_packet_size(&self) -> u8 {
        self.device_descriptor.max_packet_size
    }

    pub fn manufacturer_name(&mut self) -> Result<String, MagtekError> {
        let index = self.device_descriptor.manufacturer_index;
        self.read_string(index, "read manufacturer name")
    }

    pub fn product_name(&mut self) -> Result<String, MagtekError> {
        let index = self.device_descriptor.product_index;
        self.read_string(index, "read product name")
    }

    /// The serial number in the string descriptor, which isn't refreshed until the device is
    /// power cycled. [`MagTek::get_serial_number`] is always current.
    pub fn descriptor_serial_number(&mut self) -> Result<String, MagtekError> {
        let index = self.device_descriptor.serial_number_index;
        self.read_string(index, "read descriptor serial number")
    }

    fn read_string(&mut self, index: u8, operation: &'static str) -> Result<String, MagtekError> {
        if index == 0 {
            return Ok(String::new());
        }
        self.transport
            .string_descriptor(index)
            .map_err(MagtekError::transport(operation))
    }

    /// Gathers everything known about the device. A property which cannot be read is left
    /// empty and its error returned alongside, rather than failing the whole report.
    pub fn device_info(&mut self, host_name: &str) -> (DeviceInfo, Vec<MagtekError>) {
        let mut errors = vec![];

        let mut info = DeviceInfo {
            host_name: host_name.to_string(),
            vendor_id: self.vendor_id(),
            product_id: self.product_id(),
            usb_spec: self.usb_spec(),
            usb_class: self.usb_class().to_string(),
            usb_subclass: self.usb_subclass().to_string(),
            usb_protocol: self.usb_protocol().to_string(),
            device_version: self.device_version(),
            max_packet_size: self.max_packet_size().to_string(),
            ..Default::default()
        };

        if let Some(speed) = self.speed() {
            info.device_speed = speed.to_string();
        }

        if let Some(location) = self.location() {
            info.bus_number = location.bus_number().to_string();
            info.bus_address = location.address().to_string();
        }

        let mut collect = |result: Result<String, MagtekError>| match result {
            Ok(value) => value,
            Err(e) => {
                errors.push(e);
                String::new()
            }
        };

        info.device_sn = collect(self.get_serial_number());
        info.software_id = collect(self.get_software_id());
        info.vendor_name = collect(self.manufacturer_name());
        info.product_name = collect(self.product_name());
        info.product_version = collect(self.get_product_version());
        info.factory_sn = collect(self.get_factory_serial_number());
        info.descriptor_sn = collect(self.descriptor_serial_number());
        info.buffer_size = collect(self.buffer_size().map(|size| size.to_string()));

        (info, errors)
    }
}

fn read_descriptor<T: Transport + ?Sized>(
    transport: &mut T,
    kind: DescriptorKind,
) -> Result<Vec<u8>, MagtekError> {
    let value = match kind {
        DescriptorKind::Device => VALUE_DEVICE_DESCRIPTOR,
        DescriptorKind::Configuration => VALUE_CONFIG_DESCRIPTOR,
    };

    let mut data = vec![0; kind.length()];
    let read = transport
        .control_transfer(
            REQUEST_TYPE_STANDARD_IN,
            REQUEST_GET_DESCRIPTOR,
            value,
            INTERFACE_NUMBER,
            &mut data,
        )
        .map_err(MagtekError::transport("read descriptor"))?;

    data.truncate(read);
    Ok(data)
}
