/// Combined descriptor payloads of this size or less are not decoded.
pub const EXTENDED_DESCRIPTOR_MIN_LEN: usize = 21;

/// Offset of the HID descriptor offset, relative to the end of the header.
const HID_OFFSET_POS: usize = 14;

fn le16_at(buf: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_le_bytes([*buf.get(at)?, *buf.get(at.checked_add(1)?)?]))
}

/// The reassembled GIP device descriptor.
///
/// ```text
///  0                 header_len (u16)
///  header_len - 2    data_len (u16)
///  header_len + 14   hid_offset (u16), relative to header_len
///  header_len + hid_offset        HID descriptor byte count
///  header_len + hid_offset + 1..  HID descriptor
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedDescriptor {
    pub header_len: u16,

    /// Informational; nothing downstream depends on it.
    pub data_len: Option<u16>,

    pub hid_offset: Option<u16>,

    pub hid_descriptor: Option<Vec<u8>>,
}

impl ExtendedDescriptor {
    /// Parse a combined descriptor payload. Returns `None` for payloads of 20
    /// bytes or less.
    pub fn parse(combined: &[u8]) -> Option<ExtendedDescriptor> {
        if combined.len() < EXTENDED_DESCRIPTOR_MIN_LEN {
            return None;
        }

        let header_len = le16_at(combined, 0)?;
        let base = header_len as usize;

        let data_len = base.checked_sub(2).and_then(|at| le16_at(combined, at));
        let hid_offset = le16_at(combined, base + HID_OFFSET_POS);

        let hid_descriptor = hid_offset.filter(|&o| o > 0).and_then(|o| {
            let hid_pos = base + o as usize;
            let count = *combined.get(hid_pos)? as usize;
            if count == 0 {
                return None;
            }
            let end = (hid_pos + 1 + count).min(combined.len());
            Some(combined[hid_pos + 1..end].to_vec())
        });

        Some(ExtendedDescriptor {
            header_len,
            data_len,
            hid_offset,
            hid_descriptor,
        })
    }
}
