use crate::commands::{Command, Response, ResultCode};
use crate::device::base::{Transport, TransportError};
use crate::error::MagtekError;
use crate::request::{
    INTERFACE_NUMBER, REQUEST_GET_REPORT, REQUEST_SET_REPORT, REQUEST_TYPE_REPORT_IN,
    REQUEST_TYPE_REPORT_OUT, VALUE_FEATURE_REPORT,
};
use log::{debug, warn};

// Commands and responses share the feature report, so every command is a SET_REPORT followed
// by a GET_REPORT. Skipping the read leaves a stale response in the device which the next
// command would then receive.

fn write_command<T: Transport + ?Sized>(
    transport: &mut T,
    buffer_size: usize,
    command: &Command,
) -> Result<(), MagtekError> {
    let mut frame = command.encode(buffer_size)?;
    debug!("Sending {} frame: {:x?}", command.name(), frame);

    let written = transport
        .control_transfer(
            REQUEST_TYPE_REPORT_OUT,
            REQUEST_SET_REPORT,
            VALUE_FEATURE_REPORT,
            INTERFACE_NUMBER,
            &mut frame,
        )
        .map_err(MagtekError::transport(command.name()))?;

    if written != buffer_size {
        return Err(MagtekError::Transport {
            operation: command.name(),
            source: TransportError::Io(format!(
                "device accepted {} of {} command bytes",
                written, buffer_size
            )),
        });
    }
    Ok(())
}

fn read_response<T: Transport + ?Sized>(
    transport: &mut T,
    buffer_size: usize,
    command: &Command,
) -> Result<Response, MagtekError> {
    let mut frame = vec![0; buffer_size];
    let read = transport
        .control_transfer(
            REQUEST_TYPE_REPORT_IN,
            REQUEST_GET_REPORT,
            VALUE_FEATURE_REPORT,
            INTERFACE_NUMBER,
            &mut frame,
        )
        .map_err(MagtekError::transport(command.name()))?;

    if read != buffer_size {
        return Err(MagtekError::Transport {
            operation: command.name(),
            source: TransportError::Io(format!(
                "device returned {} of {} response bytes",
                read, buffer_size
            )),
        });
    }

    debug!("Received {} response: {:x?}", command.name(), frame);
    let response = Response::decode(&frame).map_err(MagtekError::transport(command.name()))?;
    if response.result != ResultCode::Success {
        warn!("Device rejected {}: {}", command.name(), response.result);
        return Err(MagtekError::CommandError {
            operation: command.name(),
            property: command.property(),
            code: response.result,
        });
    }
    Ok(response)
}

/// Sends a command and reads back its response. A failed write is final, no read is attempted.
pub fn execute<T: Transport + ?Sized>(
    transport: &mut T,
    buffer_size: usize,
    command: Command,
) -> Result<Response, MagtekError> {
    write_command(transport, buffer_size, &command)?;
    read_response(transport, buffer_size, &command)
}

/// Reads a property, an empty property is returned as an empty value.
pub fn get_property<T: Transport + ?Sized>(
    transport: &mut T,
    buffer_size: usize,
    property: u8,
) -> Result<Vec<u8>, MagtekError> {
    let response = execute(transport, buffer_size, Command::GetProperty(property))?;
    Ok(response.payload)
}

/// Writes a property. If the read back fails the stored value is unknown, and should be
/// confirmed with [`get_property`].
pub fn set_property<T: Transport + ?Sized>(
    transport: &mut T,
    buffer_size: usize,
    property: u8,
    value: &[u8],
) -> Result<(), MagtekError> {
    // Oversized values are refused while encoding, before anything reaches the device.
    execute(transport, buffer_size, Command::SetProperty(property, value))?;
    Ok(())
}

/// Sends the vendor reset command. Families that answer a reset have the response drained.
pub fn reset_device<T: Transport + ?Sized>(
    transport: &mut T,
    buffer_size: usize,
    drain: bool,
) -> Result<(), MagtekError> {
    let command = Command::ResetDevice;
    write_command(transport, buffer_size, &command)?;
    if drain {
        read_response(transport, buffer_size, &command)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use magtek_types::PropertyId;

    // Replays canned responses and records every setup packet.
    #[derive(Default)]
    struct Scripted {
        responses: Vec<Vec<u8>>,
        sent: Vec<(u8, u8, u16, Vec<u8>)>,
        short_write: bool,
    }

    impl Transport for Scripted {
        fn control_transfer(
            &mut self,
            request_type: u8,
            request: u8,
            value: u16,
            _index: u16,
            buffer: &mut [u8],
        ) -> Result<usize, TransportError> {
            self.sent.push((request_type, request, value, buffer.to_vec()));
            if request_type == REQUEST_TYPE_REPORT_OUT {
                if self.short_write {
                    return Ok(buffer.len() - 1);
                }
                return Ok(buffer.len());
            }
            if self.responses.is_empty() {
                return Err(TransportError::Timeout);
            }
            let response = self.responses.remove(0);
            buffer[..response.len()].copy_from_slice(&response);
            Ok(buffer.len())
        }

        fn string_descriptor(&mut self, _index: u8) -> Result<String, TransportError> {
            Err(TransportError::Stall)
        }
    }

    #[test]
    fn get_uses_feature_report_setup_packets() {
        let mut transport = Scripted {
            responses: vec![vec![0x00, 0x0B, b'2', b'1', b'0', b'4', b'2', b'8', b'4', b'0', b'G', b'0', b'1']],
            ..Default::default()
        };

        let value = get_property(&mut transport, 24, PropertyId::SoftwareId.code()).unwrap();
        assert_eq!(value, b"21042840G01");

        assert_eq!(transport.sent.len(), 2);
        let (request_type, request, value, frame) = &transport.sent[0];
        assert_eq!((*request_type, *request, *value), (0x21, 0x09, 0x0300));
        assert_eq!(&frame[..3], &[0x00, 0x01, 0x00]);
        assert_eq!(frame.len(), 24);

        let (request_type, request, value, frame) = &transport.sent[1];
        assert_eq!((*request_type, *request, *value), (0xA1, 0x01, 0x0300));
        assert_eq!(frame.len(), 24);
    }

    #[test]
    fn nonzero_result_code_is_a_command_error() {
        let mut transport = Scripted {
            responses: vec![vec![0x02, 0x00]],
            ..Default::default()
        };

        let error = get_property(&mut transport, 24, PropertyId::ProductVersion.code()).unwrap_err();
        assert!(matches!(
            error,
            MagtekError::CommandError {
                code: ResultCode::BadParameter,
                property: Some(0x04),
                ..
            }
        ));
    }

    #[test]
    fn failed_read_back_is_reported_for_set() {
        let mut transport = Scripted::default();

        let error =
            set_property(&mut transport, 24, PropertyId::DeviceSerialNumber.code(), b"ABC").unwrap_err();
        assert!(matches!(
            error,
            MagtekError::Transport {
                source: TransportError::Timeout,
                ..
            }
        ));
        assert_eq!(transport.sent.len(), 2);
    }

    #[test]
    fn short_write_is_not_truncated_silently() {
        let mut transport = Scripted {
            short_write: true,
            responses: vec![vec![0x00, 0x00]],
            ..Default::default()
        };

        let error = get_property(&mut transport, 24, PropertyId::SoftwareId.code()).unwrap_err();
        assert!(matches!(error, MagtekError::Transport { .. }));

        // No read back after a failed write.
        assert_eq!(transport.sent.len(), 1);
    }

    #[test]
    fn reset_only_reads_back_when_draining() {
        let mut transport = Scripted::default();
        reset_device(&mut transport, 24, false).unwrap();
        assert_eq!(transport.sent.len(), 1);
        assert_eq!(transport.sent[0].3[0], 0x02);

        let mut transport = Scripted {
            responses: vec![vec![0x00]],
            ..Default::default()
        };
        reset_device(&mut transport, 60, true).unwrap();
        assert_eq!(transport.sent.len(), 2);
    }

    #[test]
    fn overrunning_response_length_is_a_transport_error() {
        let mut response = vec![0x00, 0xFF];
        response.extend_from_slice(&[b'A'; 22]);
        let mut transport = Scripted {
            responses: vec![response],
            ..Default::default()
        };

        let error = get_property(&mut transport, 24, PropertyId::SoftwareId.code()).unwrap_err();
        assert!(matches!(
            error,
            MagtekError::Transport {
                source: TransportError::Io(_),
                ..
            }
        ));
    }

    #[test]
    fn invalid_buffer_size_sends_nothing() {
        let mut transport = Scripted::default();

        assert!(matches!(
            get_property(&mut transport, 2, PropertyId::SoftwareId.code()),
            Err(MagtekError::InvalidBufferSize { size: 2, .. })
        ));
        assert!(matches!(
            reset_device(&mut transport, 0, false),
            Err(MagtekError::InvalidBufferSize { size: 0, .. })
        ));
        assert!(transport.sent.is_empty());
    }
}
