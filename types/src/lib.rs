#[cfg(feature = "clap")]
use clap::ValueEnum;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, EnumString};

/// NVRAM-resident properties reachable through the vendor command channel.
#[derive(Copy, Clone, Debug, Display, EnumIter, EnumCount, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "clap", derive(ValueEnum))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PropertyId {
    SoftwareId,
    DeviceSerialNumber,
    FactorySerialNumber,
    ProductVersion,
}

impl PropertyId {
    pub fn code(&self) -> u8 {
        match self {
            PropertyId::SoftwareId => 0x00,
            PropertyId::DeviceSerialNumber => 0x01,
            PropertyId::FactorySerialNumber => 0x03,
            PropertyId::ProductVersion => 0x04,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(PropertyId::SoftwareId),
            0x01 => Some(PropertyId::DeviceSerialNumber),
            0x03 => Some(PropertyId::FactorySerialNumber),
            0x04 => Some(PropertyId::ProductVersion),
            _ => None,
        }
    }
}

/// A single column of a device report, selectable by its short flag.
#[derive(Copy, Clone, Debug, Display, EnumIter, EnumCount, EnumString, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "clap", derive(ValueEnum))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[strum(ascii_case_insensitive)]
pub enum ReportField {
    #[strum(serialize = "hn", serialize = "host_name")]
    #[cfg_attr(feature = "clap", value(name = "hn", alias = "host_name"))]
    HostName,

    #[strum(serialize = "vid", serialize = "vendor_id")]
    #[cfg_attr(feature = "clap", value(name = "vid", alias = "vendor_id"))]
    VendorId,

    #[strum(serialize = "vn", serialize = "vendor_name")]
    #[cfg_attr(feature = "clap", value(name = "vn", alias = "vendor_name"))]
    VendorName,

    #[strum(serialize = "pid", serialize = "product_id")]
    #[cfg_attr(feature = "clap", value(name = "pid", alias = "product_id"))]
    ProductId,

    #[strum(serialize = "pn", serialize = "product_name")]
    #[cfg_attr(feature = "clap", value(name = "pn", alias = "product_name"))]
    ProductName,

    #[strum(serialize = "pv", serialize = "product_ver")]
    #[cfg_attr(feature = "clap", value(name = "pv", alias = "product_ver"))]
    ProductVersion,

    #[strum(serialize = "sid", serialize = "software_id")]
    #[cfg_attr(feature = "clap", value(name = "sid", alias = "software_id"))]
    SoftwareId,

    #[strum(serialize = "bs", serialize = "buffer_size")]
    #[cfg_attr(feature = "clap", value(name = "bs", alias = "buffer_size"))]
    BufferSize,

    #[strum(serialize = "sn", serialize = "device_sn")]
    #[cfg_attr(feature = "clap", value(name = "sn", alias = "device_sn"))]
    DeviceSerial,

    #[strum(serialize = "fsn", serialize = "factory_sn")]
    #[cfg_attr(feature = "clap", value(name = "fsn", alias = "factory_sn"))]
    FactorySerial,

    #[strum(serialize = "dsn", serialize = "descript_sn")]
    #[cfg_attr(feature = "clap", value(name = "dsn", alias = "descript_sn"))]
    DescriptorSerial,
}

impl ReportField {
    /// The column key used in CSV headers and name-value output.
    pub fn key(&self) -> &'static str {
        match self {
            ReportField::HostName => "host_name",
            ReportField::VendorId => "vendor_id",
            ReportField::VendorName => "vendor_name",
            ReportField::ProductId => "product_id",
            ReportField::ProductName => "product_name",
            ReportField::ProductVersion => "product_ver",
            ReportField::SoftwareId => "software_id",
            ReportField::BufferSize => "buffer_size",
            ReportField::DeviceSerial => "device_sn",
            ReportField::FactorySerial => "factory_sn",
            ReportField::DescriptorSerial => "descript_sn",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportField::HostName => "Host Name",
            ReportField::VendorId => "Vendor ID",
            ReportField::VendorName => "Vendor Name",
            ReportField::ProductId => "Product ID",
            ReportField::ProductName => "Product Name",
            ReportField::ProductVersion => "Product Version",
            ReportField::SoftwareId => "Software ID",
            ReportField::BufferSize => "Buffer Size",
            ReportField::DeviceSerial => "Device Serial Number",
            ReportField::FactorySerial => "Factory Serial Number",
            ReportField::DescriptorSerial => "Descriptor Serial Number",
        }
    }
}

#[derive(Copy, Clone, Debug, Display, EnumIter, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(ValueEnum))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ReportFormat {
    /// Comma-separated values
    Csv,
    /// Name-value pairs
    Nvp,
    Json,
    Xml,
}

// Every value is pre-rendered as a string, empty fields are left out of JSON / XML output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "PascalCase", default))]
pub struct DeviceInfo {
    pub host_name: String,
    #[cfg_attr(feature = "serde", serde(rename = "DeviceSN"))]
    pub device_sn: String,
    #[cfg_attr(feature = "serde", serde(rename = "VendorID", skip_serializing_if = "String::is_empty"))]
    pub vendor_id: String,
    #[cfg_attr(feature = "serde", serde(rename = "ProductID", skip_serializing_if = "String::is_empty"))]
    pub product_id: String,
    #[cfg_attr(feature = "serde", serde(rename = "SoftwareID", skip_serializing_if = "String::is_empty"))]
    pub software_id: String,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "String::is_empty"))]
    pub vendor_name: String,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "String::is_empty"))]
    pub product_name: String,
    #[cfg_attr(feature = "serde", serde(rename = "ProductVer", skip_serializing_if = "String::is_empty"))]
    pub product_version: String,
    #[cfg_attr(feature = "serde", serde(rename = "FactorySN", skip_serializing_if = "String::is_empty"))]
    pub factory_sn: String,
    #[cfg_attr(feature = "serde", serde(rename = "DescriptSN", skip_serializing_if = "String::is_empty"))]
    pub descriptor_sn: String,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "String::is_empty"))]
    pub bus_number: String,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "String::is_empty"))]
    pub bus_address: String,
    #[cfg_attr(feature = "serde", serde(rename = "USBSpec", skip_serializing_if = "String::is_empty"))]
    pub usb_spec: String,
    #[cfg_attr(feature = "serde", serde(rename = "USBClass", skip_serializing_if = "String::is_empty"))]
    pub usb_class: String,
    #[cfg_attr(feature = "serde", serde(rename = "USBSubclass", skip_serializing_if = "String::is_empty"))]
    pub usb_subclass: String,
    #[cfg_attr(feature = "serde", serde(rename = "USBProtocol", skip_serializing_if = "String::is_empty"))]
    pub usb_protocol: String,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "String::is_empty"))]
    pub device_speed: String,
    #[cfg_attr(feature = "serde", serde(rename = "DeviceVer", skip_serializing_if = "String::is_empty"))]
    pub device_version: String,
    #[cfg_attr(feature = "serde", serde(rename = "MaxPktSize", skip_serializing_if = "String::is_empty"))]
    pub max_packet_size: String,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "String::is_empty"))]
    pub buffer_size: String,
}

impl DeviceInfo {
    pub fn field(&self, field: ReportField) -> &str {
        match field {
            ReportField::HostName => &self.host_name,
            ReportField::VendorId => &self.vendor_id,
            ReportField::VendorName => &self.vendor_name,
            ReportField::ProductId => &self.product_id,
            ReportField::ProductName => &self.product_name,
            ReportField::ProductVersion => &self.product_version,
            ReportField::SoftwareId => &self.software_id,
            ReportField::BufferSize => &self.buffer_size,
            ReportField::DeviceSerial => &self.device_sn,
            ReportField::FactorySerial => &self.factory_sn,
            ReportField::DescriptorSerial => &self.descriptor_sn,
        }
    }

    /// A copy holding only the identifying columns (host, serial, vendor, product, software id).
    pub fn minimal(&self) -> DeviceInfo {
        DeviceInfo {
            host_name: self.host_name.clone(),
            device_sn: self.device_sn.clone(),
            vendor_id: self.vendor_id.clone(),
            product_id: self.product_id.clone(),
            software_id: self.software_id.clone(),
            ..Default::default()
        }
    }
}
