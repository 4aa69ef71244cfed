//! A simulated MagTek reader speaking the feature report command protocol.

#![allow(dead_code)]

use magtek_usb::request::{
    REQUEST_GET_DESCRIPTOR, REQUEST_GET_REPORT, REQUEST_SET_REPORT, REQUEST_TYPE_REPORT_IN,
    REQUEST_TYPE_REPORT_OUT, REQUEST_TYPE_STANDARD_IN, VALUE_CONFIG_DESCRIPTOR,
    VALUE_DEVICE_DESCRIPTOR, VALUE_FEATURE_REPORT,
};
use magtek_usb::{PropertyId, Transport, TransportError, UsbLocation, UsbSpeed};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

pub const DEVICE_DESCRIPTOR: [u8; 18] = [
    0x12, 0x01, 0x10, 0x01, 0x00, 0x00, 0x00, 0x08, 0x01, 0x08, 0x02, 0x00, 0x00, 0x01, 0x01,
    0x02, 0x03, 0x01,
];
pub const CONFIG_DESCRIPTOR: [u8; 9] = [0x09, 0x02, 0x22, 0x00, 0x01, 0x01, 0x00, 0x80, 0x32];

pub const FACTORY_SERIAL: &str = "B164F78022713AA";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub request_type: u8,
    pub request: u8,
    pub value: u16,
    pub length: usize,
}

pub struct SimulatedReader {
    pub buffer_size: usize,
    pub device_descriptor: Vec<u8>,
    pub config_descriptor: Vec<u8>,
    pub nvram: HashMap<u8, Vec<u8>>,
    pub write_once: HashSet<u8>,
    pub strings: HashMap<u8, String>,
    pub calls: Vec<Call>,
    pub resets: usize,
    pub speed: Option<UsbSpeed>,

    pending: Option<Vec<u8>>,

    /// Returned instead of the next response read.
    pub fail_next_read: Option<TransportError>,
}

impl SimulatedReader {
    pub fn new(buffer_size: usize) -> Self {
        let mut nvram = HashMap::new();
        nvram.insert(PropertyId::SoftwareId.code(), b"21042840G01".to_vec());
        nvram.insert(PropertyId::DeviceSerialNumber.code(), vec![]);
        nvram.insert(PropertyId::FactorySerialNumber.code(), FACTORY_SERIAL.as_bytes().to_vec());
        nvram.insert(PropertyId::ProductVersion.code(), b"V05".to_vec());

        let mut strings = HashMap::new();
        strings.insert(1, String::from("Mag-Tek"));
        strings.insert(2, String::from("USB Swipe Reader"));
        strings.insert(3, String::from("B164F78"));

        Self {
            buffer_size,
            device_descriptor: DEVICE_DESCRIPTOR.to_vec(),
            config_descriptor: CONFIG_DESCRIPTOR.to_vec(),
            nvram,
            write_once: HashSet::from([PropertyId::FactorySerialNumber.code()]),
            strings,
            calls: vec![],
            resets: 0,
            speed: Some(UsbSpeed::Full),
            pending: None,
            fail_next_read: None,
        }
    }

    pub fn report_calls(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| call.value == VALUE_FEATURE_REPORT)
            .count()
    }

    pub fn property(&self, property: PropertyId) -> Vec<u8> {
        self.nvram.get(&property.code()).cloned().unwrap_or_default()
    }

    fn respond(&mut self, result: u8, payload: &[u8]) {
        let mut frame = vec![0; self.buffer_size];
        frame[0] = result;
        frame[1] = payload.len() as u8;
        frame[2..2 + payload.len()].copy_from_slice(payload);
        self.pending = Some(frame);
    }

    fn handle_command(&mut self, frame: &[u8]) {
        match frame[0] {
            0x00 => match self.nvram.get(&frame[2]).cloned() {
                Some(value) => self.respond(0x00, &value),
                None => self.respond(0x02, &[]),
            },
            0x01 => {
                let code = frame[2];
                let length = frame[1] as usize - 1;
                let value = frame[3..3 + length].to_vec();

                let locked = self.write_once.contains(&code)
                    && self.nvram.get(&code).is_some_and(|v| !v.is_empty());
                if locked {
                    self.respond(0x07, &[]);
                } else {
                    self.nvram.insert(code, value);
                    self.respond(0x00, &[]);
                }
            }
            0x02 => {
                self.resets += 1;
                self.respond(0x00, &[]);
            }
            _ => self.respond(0x01, &[]),
        }
    }
}

impl Transport for SimulatedReader {
    fn control_transfer(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        _index: u16,
        buffer: &mut [u8],
    ) -> Result<usize, TransportError> {
        self.calls.push(Call {
            request_type,
            request,
            value,
            length: buffer.len(),
        });

        match (request_type, request, value) {
            (REQUEST_TYPE_STANDARD_IN, REQUEST_GET_DESCRIPTOR, VALUE_DEVICE_DESCRIPTOR) => {
                let length = buffer.len().min(self.device_descriptor.len());
                buffer[..length].copy_from_slice(&self.device_descriptor[..length]);
                Ok(length)
            }
            (REQUEST_TYPE_STANDARD_IN, REQUEST_GET_DESCRIPTOR, VALUE_CONFIG_DESCRIPTOR) => {
                let length = buffer.len().min(self.config_descriptor.len());
                buffer[..length].copy_from_slice(&self.config_descriptor[..length]);
                Ok(length)
            }
            (REQUEST_TYPE_REPORT_OUT, REQUEST_SET_REPORT, VALUE_FEATURE_REPORT) => {
                if buffer.len() != self.buffer_size {
                    return Err(TransportError::Stall);
                }
                let frame = buffer.to_vec();
                self.handle_command(&frame);
                Ok(buffer.len())
            }
            (REQUEST_TYPE_REPORT_IN, REQUEST_GET_REPORT, VALUE_FEATURE_REPORT) => {
                if let Some(error) = self.fail_next_read.take() {
                    return Err(error);
                }
                if buffer.len() != self.buffer_size {
                    return Err(TransportError::Stall);
                }
                let frame = self.pending.take().ok_or(TransportError::Stall)?;
                buffer.copy_from_slice(&frame);
                Ok(buffer.len())
            }
            _ => Err(TransportError::Stall),
        }
    }

    fn string_descriptor(&mut self, index: u8) -> Result<String, TransportError> {
        self.strings
            .get(&index)
            .cloned()
            .ok_or(TransportError::Stall)
    }

    fn location(&self) -> Option<UsbLocation> {
        Some(UsbLocation::new(1, 29))
    }

    fn speed(&self) -> Option<UsbSpeed> {
        self.speed
    }
}

pub fn instant_family(buffer_sizes: Vec<usize>) -> magtek_usb::DeviceFamily {
    magtek_usb::DeviceFamily {
        name: String::from("Simulated"),
        buffer_sizes,
        reset_settle: Duration::ZERO,
        drain_after_reset: true,
    }
}
