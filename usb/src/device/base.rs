use std::fmt::{Display, Formatter};
use strum::Display as StrumDisplay;

/// The host controller binding the protocol layer talks through.
///
/// Only the setup packet and data stage are decided above this trait, opening, claiming and
/// timing out transfers all belong to the implementation. A handle is not safe for interleaved
/// use, callers must serialise operations against the same device.
pub trait Transport {
    /// Performs a control transfer. For OUT requests `buffer` is sent, for IN requests it is
    /// filled. Returns the number of bytes actually transferred.
    fn control_transfer(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buffer: &mut [u8],
    ) -> Result<usize, TransportError>;

    /// Reads a standard string descriptor in the device's first supported language.
    fn string_descriptor(&mut self, index: u8) -> Result<String, TransportError>;

    fn location(&self) -> Option<UsbLocation> {
        None
    }

    /// The negotiated bus speed, if the host controller reports it.
    fn speed(&self) -> Option<UsbSpeed> {
        None
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn control_transfer(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buffer: &mut [u8],
    ) -> Result<usize, TransportError> {
        (**self).control_transfer(request_type, request, value, index, buffer)
    }

    fn string_descriptor(&mut self, index: u8) -> Result<String, TransportError> {
        (**self).string_descriptor(index)
    }

    fn location(&self) -> Option<UsbLocation> {
        (**self).location()
    }

    fn speed(&self) -> Option<UsbSpeed> {
        (**self).speed()
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Transfer timed out")]
    Timeout,

    #[error("Endpoint stalled")]
    Stall,

    #[error("Device disconnected")]
    Disconnected,

    #[error("{0}")]
    Io(String),
}

// We primarily need the bus number, and address for reporting..
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UsbLocation {
    pub(crate) bus_number: u8,
    pub(crate) address: u8,
}

impl UsbLocation {
    pub fn new(bus_number: u8, address: u8) -> Self {
        Self {
            bus_number,
            address,
        }
    }

    pub fn bus_number(&self) -> u8 {
        self.bus_number
    }
    pub fn address(&self) -> u8 {
        self.address
    }
}

impl Display for UsbLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03}:{:03}", self.bus_number, self.address)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, StrumDisplay)]
#[strum(serialize_all = "lowercase")]
pub enum UsbSpeed {
    Low,
    Full,
    High,
    Super,
    #[strum(to_string = "super+")]
    SuperPlus,
}
