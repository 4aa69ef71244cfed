use crate::commands::{check_buffer_size, Command};
use crate::device::base::Transport;
use crate::error::MagtekError;
use crate::request::{
    INTERFACE_NUMBER, REQUEST_GET_REPORT, REQUEST_SET_REPORT, REQUEST_TYPE_REPORT_IN,
    REQUEST_TYPE_REPORT_OUT, VALUE_FEATURE_REPORT,
};
use log::{debug, info, warn};
use magtek_types::PropertyId;

/// Discovers the command buffer size the device expects for vendor commands.
///
/// Each candidate is probed with a `GetProperty(SoftwareId)` frame padded to that size. The
/// device only accepts a frame of its own size, any other size is stalled or short-written.
/// Whenever a probe is not rejected by the transport its response is drained, so the device
/// is left without a pending response for the next probe or the first real command.
///
/// Candidates that could never carry a command frame are rejected before anything is sent.
pub fn negotiate_buffer_size<T: Transport + ?Sized>(
    transport: &mut T,
    candidates: &[usize],
) -> Result<usize, MagtekError> {
    for &size in candidates {
        check_buffer_size(size)?;
    }

    for &size in candidates {
        let mut probe = Command::GetProperty(PropertyId::SoftwareId.code()).encode(size)?;

        let written = match transport.control_transfer(
            REQUEST_TYPE_REPORT_OUT,
            REQUEST_SET_REPORT,
            VALUE_FEATURE_REPORT,
            INTERFACE_NUMBER,
            &mut probe,
        ) {
            Ok(written) => written,
            Err(e) => {
                debug!("Buffer size {} rejected: {}", size, e);
                continue;
            }
        };

        let mut response = vec![0; size];
        if let Err(e) = transport.control_transfer(
            REQUEST_TYPE_REPORT_IN,
            REQUEST_GET_REPORT,
            VALUE_FEATURE_REPORT,
            INTERFACE_NUMBER,
            &mut response,
        ) {
            warn!("Unable to drain probe response for size {}: {}", size, e);
        }

        if written == size {
            info!("Negotiated command buffer size of {} bytes", size);
            return Ok(size);
        }
        debug!("Buffer size {} only accepted {} bytes", size, written);
    }

    Err(MagtekError::UnsupportedDevice {
        tried: candidates.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::base::TransportError;

    // Accepts OUT transfers of exactly `size` bytes, stalls everything else.
    struct FixedSize {
        size: usize,
        calls: Vec<(u8, usize)>,
    }

    impl Transport for FixedSize {
        fn control_transfer(
            &mut self,
            request_type: u8,
            _request: u8,
            _value: u16,
            _index: u16,
            buffer: &mut [u8],
        ) -> Result<usize, TransportError> {
            self.calls.push((request_type, buffer.len()));
            if buffer.len() != self.size {
                return Err(TransportError::Stall);
            }
            Ok(buffer.len())
        }

        fn string_descriptor(&mut self, _index: u8) -> Result<String, TransportError> {
            Err(TransportError::Stall)
        }
    }

    #[test]
    fn probe_sequence_drains_after_accepted_write() {
        let mut device = FixedSize {
            size: 60,
            calls: vec![],
        };

        assert_eq!(negotiate_buffer_size(&mut device, &[24, 60]).unwrap(), 60);
        assert_eq!(
            device.calls,
            vec![
                (REQUEST_TYPE_REPORT_OUT, 24),
                (REQUEST_TYPE_REPORT_OUT, 60),
                (REQUEST_TYPE_REPORT_IN, 60)
            ]
        );
    }

    #[test]
    fn no_candidates_is_unsupported() {
        let mut device = FixedSize {
            size: 24,
            calls: vec![],
        };
        assert!(matches!(
            negotiate_buffer_size(&mut device, &[]),
            Err(MagtekError::UnsupportedDevice { .. })
        ));
        assert!(device.calls.is_empty());
    }

    #[test]
    fn out_of_range_candidates_are_rejected_before_probing() {
        for candidates in [vec![2, 24], vec![24, 258]] {
            let mut device = FixedSize {
                size: 24,
                calls: vec![],
            };

            assert!(matches!(
                negotiate_buffer_size(&mut device, &candidates),
                Err(MagtekError::InvalidBufferSize { .. })
            ));
            assert!(device.calls.is_empty());
        }
    }
}
