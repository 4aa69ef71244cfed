pub mod base;

// Only libusb is supported as a host binding, other bindings implement `base::Transport`.
pub mod libusb;

pub use libusb::device::{find_devices, LibUsbTransport};
