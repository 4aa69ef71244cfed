// The bmRequestType byte of a control transfer setup packet is built from three parts,
// the direction (bit 7), the request type (bits 5..6) and the recipient (bits 0..4).

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Out = 0x00,
    In = 0x80,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RequestKind {
    Standard = 0x00,
    Class = 0x20,
    Vendor = 0x40,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Recipient {
    Device = 0x00,
    Interface = 0x01,
    Endpoint = 0x02,
    Other = 0x03,
}

pub const fn request_type(direction: Direction, kind: RequestKind, recipient: Recipient) -> u8 {
    direction as u8 | kind as u8 | recipient as u8
}

pub fn direction_of(request_type: u8) -> Direction {
    if request_type & 0x80 == 0x80 {
        Direction::In
    } else {
        Direction::Out
    }
}

// Feature reports are HID class requests addressed to the interface.
pub const REQUEST_TYPE_REPORT_OUT: u8 =
    request_type(Direction::Out, RequestKind::Class, Recipient::Interface);
pub const REQUEST_TYPE_REPORT_IN: u8 =
    request_type(Direction::In, RequestKind::Class, Recipient::Interface);
pub const REQUEST_TYPE_STANDARD_IN: u8 =
    request_type(Direction::In, RequestKind::Standard, Recipient::Device);

pub const REQUEST_GET_REPORT: u8 = 0x01;
pub const REQUEST_GET_DESCRIPTOR: u8 = 0x06;
pub const REQUEST_SET_REPORT: u8 = 0x09;

pub const VALUE_DEVICE_DESCRIPTOR: u16 = 0x0100;
pub const VALUE_CONFIG_DESCRIPTOR: u16 = 0x0200;
pub const VALUE_FEATURE_REPORT: u16 = 0x0300;

pub const INTERFACE_NUMBER: u16 = 0x0000;
