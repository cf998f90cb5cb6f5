//! GIP frame header.
//!
//! ```text
//!  byte 0    command
//!  byte 1    flags: client id (bits 0..3), needs-ack (4), system (5),
//!            chunk-start (6), chunked (7)
//!  byte 2    sequence
//!  byte 3..  payload length, LEB128
//! ```

/// Bytes before the length field.
pub const GIP_HEADER_FIXED_LEN: usize = 3;

/// Upper bound on length-field bytes read, so adversarial input can't shift past 32 bits.
const MAX_LENGTH_BYTES: usize = 5;

const FLAG_NEEDS_ACK: u8 = 0x10;
const FLAG_SYSTEM: u8 = 0x20;
const FLAG_CHUNK_START: u8 = 0x40;
const FLAG_CHUNKED: u8 = 0x80;

/// Decode a LEB128 value from the start of `buf`.
///
/// Returns the value and the number of bytes consumed. Decoding stops at the
/// first byte without the continuation bit, at the end of `buf`, or after 5
/// bytes, whichever comes first.
pub fn decode_length(buf: &[u8]) -> (u32, usize) {
    let mut value = 0u32;
    let mut consumed = 0;

    for &byte in buf.iter().take(MAX_LENGTH_BYTES) {
        value |= ((byte & 0x7F) as u32) << (7 * consumed);
        consumed += 1;
        if byte & 0x80 == 0 {
            break;
        }
    }

    (value, consumed)
}

/// Append the LEB128 encoding of `value` to `out`.
pub fn encode_length(mut value: u32, out: &mut Vec<u8>) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// A decoded GIP header.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct GipHeader {
    pub command: u8,

    /// Which component of the device the message is for (4 bits).
    pub client: u8,

    pub needs_ack: bool,

    /// System message, as opposed to a device-specific one.
    pub system: bool,

    /// First frame of a chunked message.
    pub chunk_start: bool,

    /// More chunks follow this frame.
    pub chunked: bool,

    pub sequence: u8,

    /// Payload length.
    pub length: u32,
}

impl GipHeader {
    /// Parse the header at the start of `frame`.
    ///
    /// Returns the header and its encoded size (the payload offset), or `None`
    /// if the frame is shorter than 3 bytes.
    pub fn parse(frame: &[u8]) -> Option<(GipHeader, usize)> {
        if frame.len() < GIP_HEADER_FIXED_LEN {
            return None;
        }

        let flags = frame[1];
        let (length, length_bytes) = decode_length(&frame[GIP_HEADER_FIXED_LEN..]);

        let header = GipHeader {
            command: frame[0],
            client: flags & 0x0F,
            needs_ack: flags & FLAG_NEEDS_ACK != 0,
            system: flags & FLAG_SYSTEM != 0,
            chunk_start: flags & FLAG_CHUNK_START != 0,
            chunked: flags & FLAG_CHUNKED != 0,
            sequence: frame[2],
            length,
        };

        Some((header, GIP_HEADER_FIXED_LEN + length_bytes))
    }

    /// The flags byte.
    pub fn flags(&self) -> u8 {
        let mut flags = self.client & 0x0F;
        if self.needs_ack {
            flags |= FLAG_NEEDS_ACK;
        }
        if self.system {
            flags |= FLAG_SYSTEM;
        }
        if self.chunk_start {
            flags |= FLAG_CHUNK_START;
        }
        if self.chunked {
            flags |= FLAG_CHUNKED;
        }
        flags
    }

    /// Encode the header, including the length field.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![self.command, self.flags(), self.sequence];
        encode_length(self.length, &mut buf);
        buf
    }
}

/// Make public when fuzzing
#[cfg(fuzzing)]
pub fn fuzz_parse_header(frame: &[u8]) -> Option<(GipHeader, usize)> {
    GipHeader::parse(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_descriptor_response() {
        let (header, offset) =
            GipHeader::parse(&[0x04, 0x20, 0x01, 0x05, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE]).unwrap();
        assert_eq!(
            header,
            GipHeader {
                command: 0x04,
                client: 0,
                needs_ack: false,
                system: true,
                chunk_start: false,
                chunked: false,
                sequence: 1,
                length: 5,
            }
        );
        assert_eq!(offset, 4);
    }

    #[test]
    fn test_parse_flags() {
        let (header, _) = GipHeader::parse(&[0x20, 0xF3, 0x7F, 0x00]).unwrap();
        assert_eq!(header.command, 0x20);
        assert_eq!(header.client, 3);
        assert!(header.needs_ack);
        assert!(header.system);
        assert!(header.chunk_start);
        assert!(header.chunked);
        assert_eq!(header.sequence, 0x7F);
        assert_eq!(header.flags(), 0xF3);
    }

    #[test]
    fn test_parse_short() {
        assert_eq!(GipHeader::parse(&[]), None);
        assert_eq!(GipHeader::parse(&[0x04, 0x20]), None);

        // no length byte at all
        let (header, offset) = GipHeader::parse(&[0x04, 0x20, 0x01]).unwrap();
        assert_eq!(header.length, 0);
        assert_eq!(offset, 3);
    }

    #[test]
    fn test_multibyte_length() {
        let (header, offset) = GipHeader::parse(&[0x04, 0xA0, 0x02, 0xBA, 0x03, 0x00]).unwrap();
        assert_eq!(header.length, 0x1BA);
        assert_eq!(offset, 5);
        assert!(header.chunked);
    }

    #[test]
    fn test_length_stops_after_five_bytes() {
        let (value, consumed) = decode_length(&[0xFF; 16]);
        assert_eq!(consumed, 5);
        assert_eq!(value, u32::MAX);

        let (header, offset) = GipHeader::parse(&[0x04, 0x20, 0x01, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x01]).unwrap();
        assert_eq!(offset, 8);
        assert_eq!(header.length, 0);
    }

    #[test]
    fn test_length_roundtrip() {
        let boundaries = [0, 1, 0x7F, 0x80, 0x3FFF, 0x4000, (1 << 21) - 1];
        for value in (0..1u32 << 21).step_by(97).chain(boundaries) {
            let mut buf = Vec::new();
            encode_length(value, &mut buf);
            assert_eq!(decode_length(&buf), (value, buf.len()), "value {value:#x}");
        }
    }

    #[test]
    fn test_encode_request() {
        let header = GipHeader {
            command: 0x04,
            system: true,
            sequence: 1,
            ..Default::default()
        };
        assert_eq!(header.encode(), vec![0x04, 0x20, 0x01, 0x00]);

        let header = GipHeader {
            length: 300,
            ..header
        };
        assert_eq!(header.encode(), vec![0x04, 0x20, 0x01, 0xAC, 0x02]);
    }
}
