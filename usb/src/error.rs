use crate::commands::ResultCode;
use crate::descriptor::DescriptorKind;
use crate::device::base::TransportError;
use magtek_types::PropertyId;

#[derive(thiserror::Error, Debug)]
pub enum ConnectError {
    #[error("No MagTek device was found")]
    DeviceNotFound,

    #[error("USB error: {0}")]
    UsbError(#[from] rusb::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum MagtekError {
    #[error("Malformed {kind} descriptor, expected {expected} bytes but received {actual}")]
    MalformedDescriptor {
        kind: DescriptorKind,
        expected: usize,
        actual: usize,
    },

    #[error("Buffer size {size} is outside the supported range of {min} to {max} bytes")]
    InvalidBufferSize { size: usize, min: usize, max: usize },

    #[error("Unsupported device, no buffer size accepted (tried {tried:?})")]
    UnsupportedDevice { tried: Vec<usize> },

    #[error("Transport error during {operation}: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: TransportError,
    },

    #[error("Device rejected {operation}{}: {code}", describe_property(.property))]
    CommandError {
        operation: &'static str,
        property: Option<u8>,
        code: ResultCode,
    },

    #[error("Value{} is {length} bytes, the device accepts at most {max}", property_name(.property))]
    PayloadTooLarge {
        property: u8,
        length: usize,
        max: usize,
    },

    #[error("Device is not ready for {operation}, buffer size has not been negotiated")]
    DeviceNotReady { operation: &'static str },

    #[error("Factory serial number is empty, nothing to copy")]
    FactorySerialAbsent,
}

impl MagtekError {
    pub(crate) fn transport(operation: &'static str) -> impl FnOnce(TransportError) -> Self {
        move |source| MagtekError::Transport { operation, source }
    }

    /// The raw code reported by the device, if this is a rejected command.
    pub fn device_code(&self) -> Option<u8> {
        match self {
            MagtekError::CommandError { code, .. } => Some(code.raw()),
            _ => None,
        }
    }
}

fn describe_property(code: &Option<u8>) -> String {
    code.as_ref().map(property_name).unwrap_or_default()
}

fn property_name(code: &u8) -> String {
    match PropertyId::from_code(*code) {
        Some(property) => format!(" of {}", property),
        None => format!(" of property {:#04x}", code),
    }
}
