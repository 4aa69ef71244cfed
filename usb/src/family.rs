use crate::commands::check_buffer_size;
use crate::error::MagtekError;
use crate::{
    PID_DYNAMAG_INSERT_HID, PID_DYNAMAG_SWIPE_HID, PID_DYNAMAG_WIRELESS_HID, PID_SURESWIPE_HID,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const BUFFER_SIZE_SURESWIPE: usize = 24;
pub const BUFFER_SIZE_DYNAMAG: usize = 60;

/// Per product line behaviour of the vendor command channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFamily {
    pub name: String,

    /// Candidate command buffer sizes, probed in order.
    pub buffer_sizes: Vec<usize>,

    /// How long the device needs after a vendor reset before it can be used.
    #[serde(with = "millis", rename = "reset_settle_ms")]
    pub reset_settle: Duration,

    /// Read back a response after the reset command.
    #[serde(default)]
    pub drain_after_reset: bool,
}

impl DeviceFamily {
    pub fn sureswipe() -> Self {
        Self {
            name: String::from("SureSwipe"),
            buffer_sizes: vec![BUFFER_SIZE_SURESWIPE],
            reset_settle: Duration::from_secs(5),
            drain_after_reset: false,
        }
    }

    pub fn dynamag() -> Self {
        Self {
            name: String::from("DynaMag"),
            buffer_sizes: vec![BUFFER_SIZE_DYNAMAG],
            reset_settle: Duration::from_secs(5),
            drain_after_reset: true,
        }
    }

    /// Used when the product id is unknown, probes every size we know about.
    pub fn generic() -> Self {
        Self {
            name: String::from("MagTek"),
            buffer_sizes: vec![BUFFER_SIZE_SURESWIPE, BUFFER_SIZE_DYNAMAG],
            reset_settle: Duration::from_secs(5),
            drain_after_reset: false,
        }
    }

    pub fn for_product(product_id: u16) -> Self {
        match product_id {
            PID_SURESWIPE_HID => Self::sureswipe(),
            PID_DYNAMAG_SWIPE_HID | PID_DYNAMAG_INSERT_HID | PID_DYNAMAG_WIRELESS_HID => {
                Self::dynamag()
            }

            // The keyboard emulating SureSwipe and DynaMag readers share a product id.
            _ => Self::generic(),
        }
    }
}

impl DeviceFamily {
    /// Checks that every candidate buffer size could carry a command frame.
    pub fn validate(&self) -> Result<(), MagtekError> {
        if self.buffer_sizes.is_empty() {
            return Err(MagtekError::UnsupportedDevice { tried: vec![] });
        }
        self.buffer_sizes
            .iter()
            .try_for_each(|&size| check_buffer_size(size))
    }
}

impl Default for DeviceFamily {
    fn default() -> Self {
        Self::generic()
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
