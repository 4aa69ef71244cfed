pub use magtek_types::PropertyId;
pub use rusb;

pub mod commands;
pub mod descriptor;
pub mod device;
pub mod error;
pub mod family;
pub mod magtek;
pub mod negotiate;
pub mod protocol;
pub mod request;

pub use device::base::{Transport, TransportError, UsbLocation, UsbSpeed};
pub use error::MagtekError;
pub use family::DeviceFamily;
pub use magtek::MagTek;

pub const VID_MAGTEK: u16 = 0x0801;
pub const PID_SURESWIPE_KB: u16 = 0x0001;
pub const PID_SURESWIPE_HID: u16 = 0x0002;
pub const PID_DYNAMAG_SWIPE_HID: u16 = 0x0011;
pub const PID_DYNAMAG_INSERT_HID: u16 = 0x0013;
pub const PID_DYNAMAG_WIRELESS_HID: u16 = 0x0014;
