use crate::device::base::TransportError;
use crate::error::MagtekError;
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;

// Command byte, length byte and property id precede any payload.
pub const COMMAND_HEADER_LENGTH: usize = 3;

// The length byte counts the property id, so the largest payload is u8::MAX - 1 bytes.
pub const BUFFER_SIZES: RangeInclusive<usize> = COMMAND_HEADER_LENGTH..=u8::MAX as usize + 2;

pub fn check_buffer_size(size: usize) -> Result<(), MagtekError> {
    if !BUFFER_SIZES.contains(&size) {
        return Err(MagtekError::InvalidBufferSize {
            size,
            min: *BUFFER_SIZES.start(),
            max: *BUFFER_SIZES.end(),
        });
    }
    Ok(())
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command<'a> {
    // Properties are carried as raw codes, so undocumented ones can be reached too.
    GetProperty(u8),
    SetProperty(u8, &'a [u8]),
    ResetDevice,
}

impl Command<'_> {
    pub fn command_id(&self) -> u8 {
        match self {
            Command::GetProperty(_) => 0x00,
            Command::SetProperty(_, _) => 0x01,
            Command::ResetDevice => 0x02,
        }
    }

    pub fn property(&self) -> Option<u8> {
        match self {
            Command::GetProperty(property) | Command::SetProperty(property, _) => Some(*property),
            Command::ResetDevice => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::GetProperty(_) => "get property",
            Command::SetProperty(_, _) => "set property",
            Command::ResetDevice => "reset device",
        }
    }

    /// Builds the frame for this command, zero padded to `size` bytes.
    pub fn encode(&self, size: usize) -> Result<Vec<u8>, MagtekError> {
        check_buffer_size(size)?;

        let mut frame = vec![0; size];
        match self {
            Command::GetProperty(property) => {
                frame[..COMMAND_HEADER_LENGTH].copy_from_slice(&[
                    self.command_id(),
                    0x01,
                    *property,
                ]);
            }
            Command::SetProperty(property, value) => {
                let max = max_payload(size);
                let too_large = || MagtekError::PayloadTooLarge {
                    property: *property,
                    length: value.len(),
                    max,
                };
                if value.len() > max {
                    return Err(too_large());
                }

                // The length byte counts the property id as well as the value.
                let length = u8::try_from(value.len() + 1).map_err(|_| too_large())?;
                frame[..COMMAND_HEADER_LENGTH].copy_from_slice(&[
                    self.command_id(),
                    length,
                    *property,
                ]);
                frame[COMMAND_HEADER_LENGTH..COMMAND_HEADER_LENGTH + value.len()]
                    .copy_from_slice(value);
            }
            Command::ResetDevice => frame[0] = self.command_id(),
        }
        Ok(frame)
    }
}

pub fn max_payload(buffer_size: usize) -> usize {
    buffer_size.saturating_sub(COMMAND_HEADER_LENGTH)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResultCode {
    Success,
    Failure,
    BadParameter,
    Other(u8),
}

impl ResultCode {
    pub fn raw(&self) -> u8 {
        match self {
            ResultCode::Success => 0x00,
            ResultCode::Failure => 0x01,
            ResultCode::BadParameter => 0x02,
            ResultCode::Other(code) => *code,
        }
    }
}

impl From<u8> for ResultCode {
    fn from(value: u8) -> Self {
        match value {
            0x00 => ResultCode::Success,
            0x01 => ResultCode::Failure,
            0x02 => ResultCode::BadParameter,
            code => ResultCode::Other(code),
        }
    }
}

impl Display for ResultCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultCode::Success => write!(f, "success (0x00)"),
            ResultCode::Failure => write!(f, "failure (0x01)"),
            ResultCode::BadParameter => write!(f, "bad parameter (0x02)"),
            ResultCode::Other(code) => write!(f, "result code {:#04x}", code),
        }
    }
}

/// A feature report read back from the device after a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub result: ResultCode,
    pub payload: Vec<u8>,
}

impl Response {
    /// Splits a response frame into its result code and payload. A length byte running past
    /// the end of the frame is a protocol error.
    pub fn decode(frame: &[u8]) -> Result<Self, TransportError> {
        let (&result, &length) = match frame {
            [result, length, ..] => (result, length),
            _ => {
                return Err(TransportError::Io(format!(
                    "response frame of {} bytes has no header",
                    frame.len()
                )))
            }
        };

        let payload = frame.get(2..2 + length as usize).ok_or_else(|| {
            TransportError::Io(format!(
                "response length {} overruns a {} byte frame",
                length,
                frame.len()
            ))
        })?;

        Ok(Self {
            result: ResultCode::from(result),
            payload: payload.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use magtek_types::PropertyId;

    #[test]
    fn get_frame_is_zero_padded() {
        let frame = Command::GetProperty(PropertyId::FactorySerialNumber.code()).encode(24).unwrap();
        assert_eq!(frame.len(), 24);
        assert_eq!(&frame[..3], &[0x00, 0x01, 0x03]);
        assert!(frame[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn set_frame_carries_length_and_value() {
        let frame = Command::SetProperty(PropertyId::DeviceSerialNumber.code(), b"24FA12C").encode(60).unwrap();
        assert_eq!(frame.len(), 60);
        assert_eq!(&frame[..3], &[0x01, 8, 0x01]);
        assert_eq!(&frame[3..10], b"24FA12C");
        assert!(frame[10..].iter().all(|&b| b == 0));
    }

    #[test]
    fn empty_set_frame_erases() {
        let frame = Command::SetProperty(PropertyId::DeviceSerialNumber.code(), &[]).encode(24).unwrap();
        assert_eq!(&frame[..3], &[0x01, 0x01, 0x01]);
    }

    #[test]
    fn reset_frame_is_a_single_byte() {
        let frame = Command::ResetDevice.encode(24).unwrap();
        assert_eq!(frame[0], 0x02);
        assert!(frame[1..].iter().all(|&b| b == 0));
    }

    #[test]
    fn response_payload_follows_length_byte() {
        let mut frame = vec![0; 24];
        frame[1] = 3;
        frame[2..5].copy_from_slice(b"V05");

        let response = Response::decode(&frame).unwrap();
        assert_eq!(response.result, ResultCode::Success);
        assert_eq!(response.payload, b"V05");
    }

    #[test]
    fn response_with_zero_length_is_empty() {
        let response = Response::decode(&[0x00, 0x00, 0x41, 0x42]).unwrap();
        assert!(response.payload.is_empty());
    }

    #[test]
    fn result_codes() {
        assert_eq!(ResultCode::from(0x07), ResultCode::Other(7));
        assert_eq!(ResultCode::from(0x02).raw(), 2);
        assert_eq!(ResultCode::Other(7).to_string(), "result code 0x07");
    }

    #[test]
    fn max_payload_leaves_room_for_header() {
        assert_eq!(max_payload(24), 21);
        assert_eq!(max_payload(60), 57);
        assert_eq!(max_payload(2), 0);
    }

    #[test]
    fn buffer_size_bounds() {
        assert!(Command::ResetDevice.encode(3).is_ok());
        assert!(Command::GetProperty(0x00).encode(257).is_ok());

        for size in [0, 2, 258, 300] {
            assert!(matches!(
                Command::ResetDevice.encode(size),
                Err(MagtekError::InvalidBufferSize { min: 3, max: 257, .. })
            ));
        }
    }

    #[test]
    fn largest_set_frame_fills_the_length_byte() {
        let value = [b'x'; 254];
        let frame = Command::SetProperty(0x01, &value).encode(257).unwrap();
        assert_eq!(frame[1], 0xFF);
        assert_eq!(&frame[3..], &value[..]);
    }

    #[test]
    fn oversized_set_frame_is_rejected() {
        assert!(matches!(
            Command::SetProperty(0x01, &[b'x'; 22]).encode(24),
            Err(MagtekError::PayloadTooLarge { length: 22, max: 21, .. })
        ));
    }

    #[test]
    fn response_length_past_frame_is_an_error() {
        let mut frame = vec![0; 24];
        frame[1] = 0xFF;
        assert!(matches!(Response::decode(&frame), Err(TransportError::Io(_))));

        // Exactly filling the frame is fine.
        frame[1] = 22;
        assert_eq!(Response::decode(&frame).unwrap().payload.len(), 22);

        assert!(Response::decode(&[0x00]).is_err());
    }
}
