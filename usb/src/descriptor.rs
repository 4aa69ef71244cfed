use crate::error::MagtekError;
use byteorder::{ByteOrder, LittleEndian};
use strum::Display;

pub const DEVICE_DESCRIPTOR_LENGTH: usize = 18;
pub const CONFIG_DESCRIPTOR_LENGTH: usize = 9;

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum DescriptorKind {
    #[strum(to_string = "device")]
    Device,
    #[strum(to_string = "configuration")]
    Configuration,
}

impl DescriptorKind {
    pub fn length(&self) -> usize {
        match self {
            DescriptorKind::Device => DEVICE_DESCRIPTOR_LENGTH,
            DescriptorKind::Configuration => CONFIG_DESCRIPTOR_LENGTH,
        }
    }

    fn check(&self, data: &[u8]) -> Result<(), MagtekError> {
        if data.len() != self.length() {
            return Err(MagtekError::MalformedDescriptor {
                kind: *self,
                expected: self.length(),
                actual: data.len(),
            });
        }
        Ok(())
    }
}

/// The standard USB device descriptor, with every field kept in its raw form.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub length: u8,
    pub descriptor_type: u8,
    /// BCD of the USB specification the device complies with
    pub usb_specification: u16,
    pub device_class: u8,
    pub device_sub_class: u8,
    pub device_protocol: u8,
    pub max_packet_size: u8,
    pub vendor_id: u16,
    pub product_id: u16,
    /// BCD of the device release number
    pub device_release_number: u16,
    pub manufacturer_index: u8,
    pub product_index: u8,
    pub serial_number_index: u8,
    pub num_configurations: u8,
}

impl DeviceDescriptor {
    pub fn decode(data: &[u8]) -> Result<Self, MagtekError> {
        DescriptorKind::Device.check(data)?;

        Ok(Self {
            length: data[0],
            descriptor_type: data[1],
            usb_specification: LittleEndian::read_u16(&data[2..4]),
            device_class: data[4],
            device_sub_class: data[5],
            device_protocol: data[6],
            max_packet_size: data[7],
            vendor_id: LittleEndian::read_u16(&data[8..10]),
            product_id: LittleEndian::read_u16(&data[10..12]),
            device_release_number: LittleEndian::read_u16(&data[12..14]),
            manufacturer_index: data[14],
            product_index: data[15],
            serial_number_index: data[16],
            num_configurations: data[17],
        })
    }
}

/// The descriptor of the device's active configuration, without its interfaces.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ConfigDescriptor {
    pub length: u8,
    pub descriptor_type: u8,
    pub total_length: u16,
    pub num_interfaces: u8,
    pub configuration_value: u8,
    pub configuration_index: u8,
    pub attributes: u8,
    /// In 2mA units
    pub max_power: u8,
}

impl ConfigDescriptor {
    pub fn decode(data: &[u8]) -> Result<Self, MagtekError> {
        DescriptorKind::Configuration.check(data)?;

        Ok(Self {
            length: data[0],
            descriptor_type: data[1],
            total_length: LittleEndian::read_u16(&data[2..4]),
            num_interfaces: data[4],
            configuration_value: data[5],
            configuration_index: data[6],
            attributes: data[7],
            max_power: data[8],
        })
    }

    pub fn self_powered(&self) -> bool {
        self.attributes & 0x40 != 0
    }

    pub fn max_power_milliamps(&self) -> u16 {
        self.max_power as u16 * 2
    }
}

/// Renders a BCD word such as 0x0110 as "1.10".
pub fn bcd_to_string(bcd: u16) -> String {
    format!("{:x}.{:02x}", bcd >> 8, bcd & 0xFF)
}

pub fn class_name(class: u8) -> &'static str {
    match class {
        0x00 => "per-interface",
        0x02 => "communications",
        0x03 => "hid",
        0x08 => "mass-storage",
        0x09 => "hub",
        0xEF => "miscellaneous",
        0xFF => "vendor-specific",
        _ => "unknown",
    }
}
