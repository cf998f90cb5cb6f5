//! GIP frames and the structured payloads of known commands.

use log::warn;

use super::header::GipHeader;

pub const GIP_CMD_ACKNOWLEDGE: u8 = 0x01;
pub const GIP_CMD_ARRIVAL: u8 = 0x02;
pub const GIP_CMD_STATUS: u8 = 0x03;
pub const GIP_CMD_DESCRIPTOR: u8 = 0x04;

const ACKNOWLEDGE_LEN: usize = 9;
const ARRIVAL_LEN: usize = 28;
const STATUS_LEN: usize = 4;

fn le16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

/// One GIP frame: header, payload and the raw bytes it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GipMessage {
    header: GipHeader,
    payload_offset: usize,
    raw: Vec<u8>,
}

impl GipMessage {
    /// Parse a frame read from the device. Returns `None` if it has no header.
    pub fn parse(frame: &[u8]) -> Option<GipMessage> {
        let (header, payload_offset) = GipHeader::parse(frame)?;
        Some(GipMessage {
            header,
            payload_offset,
            raw: frame.to_vec(),
        })
    }

    pub fn header(&self) -> &GipHeader {
        &self.header
    }

    /// The payload: `length` bytes after the header, cut short if the frame is.
    pub fn payload(&self) -> &[u8] {
        let start = self.payload_offset.min(self.raw.len());
        let end = start
            .saturating_add(self.header.length as usize)
            .min(self.raw.len());
        &self.raw[start..end]
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Decode the payload according to the command.
    pub fn decode(&self) -> GipPayload {
        GipPayload::decode(self.header.command, self.payload())
    }
}

/// Firmware or hardware version quad.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
    pub build: u16,
    pub revision: u16,
}

impl Version {
    fn from_le(buf: &[u8]) -> Version {
        Version {
            major: le16(buf, 0),
            minor: le16(buf, 2),
            build: le16(buf, 4),
            revision: le16(buf, 6),
        }
    }
}

/// Payload of an acknowledgement (command `0x01`).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Acknowledgement {
    pub unknown: u8,
    /// Command being acknowledged.
    pub inner_command: u8,
    pub inner_flags: u8,
    pub bytes_received: u16,
    pub reserved: u16,
    pub remaining_buffer: u16,
}

/// Payload of a device arrival announcement (command `0x02`).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DeviceArrival {
    pub serial: u64,
    pub vendor_id: u16,
    pub product_id: u16,
    pub firmware_version: Version,
    pub hardware_version: Version,
}

/// Payload of a device status report (command `0x03`).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DeviceStatus {
    pub battery_level: u8,
    pub battery_type: u8,
    pub reserved: [u8; 3],
}

/// Structured decode of a GIP payload.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GipPayload {
    Acknowledgement(Acknowledgement),
    DeviceArrival(DeviceArrival),
    DeviceStatus(DeviceStatus),

    /// A chunk of the device descriptor; see [`ExtendedDescriptor`][super::ExtendedDescriptor].
    DeviceDescriptor,

    /// A known command whose payload is too short for its layout.
    Short {
        command: u8,
        needed: usize,
        actual: usize,
    },

    Unknown {
        command: u8,
    },
}

impl GipPayload {
    pub fn decode(command: u8, payload: &[u8]) -> GipPayload {
        let needed = match command {
            GIP_CMD_ACKNOWLEDGE => ACKNOWLEDGE_LEN,
            GIP_CMD_ARRIVAL => ARRIVAL_LEN,
            GIP_CMD_STATUS => STATUS_LEN,
            GIP_CMD_DESCRIPTOR => return GipPayload::DeviceDescriptor,
            _ => return GipPayload::Unknown { command },
        };

        if payload.len() < needed {
            if command == GIP_CMD_ARRIVAL && payload.len() >= 24 {
                warn!(
                    "device arrival payload is {} bytes, hardware version needs {ARRIVAL_LEN}",
                    payload.len()
                );
            }
            return GipPayload::Short {
                command,
                needed,
                actual: payload.len(),
            };
        }

        match command {
            GIP_CMD_ACKNOWLEDGE => GipPayload::Acknowledgement(Acknowledgement {
                unknown: payload[0],
                inner_command: payload[1],
                inner_flags: payload[2],
                bytes_received: le16(payload, 3),
                reserved: le16(payload, 5),
                remaining_buffer: le16(payload, 7),
            }),
            GIP_CMD_ARRIVAL => {
                let mut serial = [0; 8];
                serial.copy_from_slice(&payload[0..8]);
                GipPayload::DeviceArrival(DeviceArrival {
                    serial: u64::from_le_bytes(serial),
                    vendor_id: le16(payload, 8),
                    product_id: le16(payload, 10),
                    firmware_version: Version::from_le(&payload[12..20]),
                    hardware_version: Version::from_le(&payload[20..28]),
                })
            }
            _ => GipPayload::DeviceStatus(DeviceStatus {
                battery_level: payload[0] & 0x03,
                battery_type: (payload[0] >> 2) & 0x03,
                reserved: [payload[1], payload[2], payload[3]],
            }),
        }
    }

    /// Human-readable name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            GipPayload::Acknowledgement(_) => "Acknowledgement",
            GipPayload::DeviceArrival(_) => "Device Arrival",
            GipPayload::DeviceStatus(_) => "Device Status",
            GipPayload::DeviceDescriptor => "Device Descriptor",
            GipPayload::Short { .. } => "Short Payload",
            GipPayload::Unknown { .. } => "Unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_payload() {
        let msg = GipMessage::parse(&[0x04, 0x20, 0x01, 0x05, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE]).unwrap();
        assert_eq!(msg.header().command, GIP_CMD_DESCRIPTOR);
        assert_eq!(msg.payload(), &[0xAA, 0xBB, 0xCC, 0xDD, 0xEE]);
        assert_eq!(msg.raw().len(), 9);
        assert_eq!(msg.decode(), GipPayload::DeviceDescriptor);
    }

    #[test]
    fn test_payload_bounded_by_frame_and_length() {
        // declared 8 bytes, 2 present
        let msg = GipMessage::parse(&[0x20, 0x00, 0x01, 0x08, 0x11, 0x22]).unwrap();
        assert_eq!(msg.payload(), &[0x11, 0x22]);

        // declared 1 byte, padding after it
        let msg = GipMessage::parse(&[0x20, 0x00, 0x01, 0x01, 0x11, 0x00, 0x00]).unwrap();
        assert_eq!(msg.payload(), &[0x11]);

        assert!(GipMessage::parse(&[0x20, 0x00]).is_none());
    }

    #[test]
    fn test_acknowledgement() {
        let msg = GipMessage::parse(&[
            0x01, 0x20, 0x02, 0x09, 0x00, 0x04, 0x20, 0x3A, 0x00, 0x00, 0x00, 0x80, 0x01,
        ])
        .unwrap();
        assert_eq!(
            msg.decode(),
            GipPayload::Acknowledgement(Acknowledgement {
                unknown: 0,
                inner_command: 0x04,
                inner_flags: 0x20,
                bytes_received: 0x3A,
                reserved: 0,
                remaining_buffer: 0x180,
            })
        );
    }

    #[test]
    #[rustfmt::skip]
    fn test_device_arrival() {
        let payload = [
            0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88,
            0x5E, 0x04, 0xEA, 0x02,
            0x05, 0x00, 0x11, 0x00, 0x82, 0x0C, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x00,
        ];
        let GipPayload::DeviceArrival(arrival) = GipPayload::decode(GIP_CMD_ARRIVAL, &payload) else {
            panic!("not decoded as arrival");
        };
        assert_eq!(arrival.serial, 0x8877665544332211);
        assert_eq!(arrival.vendor_id, 0x045E);
        assert_eq!(arrival.product_id, 0x02EA);
        assert_eq!(arrival.firmware_version, Version { major: 5, minor: 17, build: 3202, revision: 0 });
        assert_eq!(arrival.hardware_version, Version { major: 1, minor: 0, build: 0, revision: 3 });

        assert_eq!(
            GipPayload::decode(GIP_CMD_ARRIVAL, &payload[..24]),
            GipPayload::Short { command: GIP_CMD_ARRIVAL, needed: 28, actual: 24 }
        );
    }

    #[test]
    fn test_device_status() {
        assert_eq!(
            GipPayload::decode(GIP_CMD_STATUS, &[0b1110, 0xA, 0xB, 0xC]),
            GipPayload::DeviceStatus(DeviceStatus {
                battery_level: 2,
                battery_type: 3,
                reserved: [0xA, 0xB, 0xC],
            })
        );
        assert_eq!(
            GipPayload::decode(GIP_CMD_STATUS, &[0x01]),
            GipPayload::Short {
                command: GIP_CMD_STATUS,
                needed: 4,
                actual: 1
            }
        );
    }

    #[test]
    fn test_unknown_command() {
        let payload = GipPayload::decode(0x20, &[0; 14]);
        assert_eq!(payload, GipPayload::Unknown { command: 0x20 });
        assert_eq!(payload.name(), "Unknown");
    }
}
