//! Reassembly of GIP messages split across several frames.

use super::{header::GipHeader, message::GIP_CMD_ACKNOWLEDGE};
use crate::error::GipError;

/// Bytes stripped from the front of every chunk frame: the three fixed header
/// bytes and the reserved length byte.
pub const CHUNK_HEADER_LEN: usize = 4;

/// What [`ChunkAssembly::offer`] did with a frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Offered {
    /// A chunk was appended and more are expected.
    Chunk,
    /// The final chunk was appended.
    Final,
    /// An acknowledgement frame, not part of the message.
    Acknowledgement,
    /// A frame with no header, nothing past the header, or another command.
    Ignored,
}

/// Collects the frames of one chunked GIP message.
#[derive(Debug, Clone)]
pub struct ChunkAssembly {
    command: u8,
    frames: Vec<Vec<u8>>,
    complete: bool,
    retries: u32,
}

impl ChunkAssembly {
    /// Start collecting frames for `command`, allowing `retries` failed reads.
    pub fn new(command: u8, retries: u32) -> ChunkAssembly {
        ChunkAssembly {
            command,
            frames: Vec::new(),
            complete: false,
            retries,
        }
    }

    /// Offer a frame read from the device.
    pub fn offer(&mut self, frame: &[u8]) -> Offered {
        if frame.len() <= CHUNK_HEADER_LEN {
            return Offered::Ignored;
        }
        let Some((header, _)) = GipHeader::parse(frame) else {
            return Offered::Ignored;
        };

        if header.command == self.command {
            self.frames.push(frame.to_vec());
            if header.chunked {
                Offered::Chunk
            } else {
                self.complete = true;
                Offered::Final
            }
        } else if header.command == GIP_CMD_ACKNOWLEDGE {
            Offered::Acknowledgement
        } else {
            Offered::Ignored
        }
    }

    /// Consume one retry after a failed or useless read.
    pub fn retry(&mut self) {
        self.retries = self.retries.saturating_sub(1);
    }

    pub fn retries_left(&self) -> u32 {
        self.retries
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// True once collection should stop.
    pub fn is_done(&self) -> bool {
        self.complete || self.retries == 0
    }

    /// The raw frames collected so far, in arrival order.
    pub fn frames(&self) -> &[Vec<u8>] {
        &self.frames
    }

    /// Concatenate the frames' payloads, dropping each 4-byte chunk header.
    pub fn combined(&self) -> Vec<u8> {
        self.frames
            .iter()
            .flat_map(|f| f.get(CHUNK_HEADER_LEN..).unwrap_or(&[]))
            .copied()
            .collect()
    }

    /// The combined payload of a complete message.
    pub fn finish(self) -> Result<Vec<u8>, GipError> {
        if self.complete {
            Ok(self.combined())
        } else if self.frames.is_empty() {
            Err(GipError::NoFrames)
        } else {
            Err(GipError::Incomplete {
                frames: self.frames.len(),
                partial: self.combined(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_chunks() {
        let mut assembly = ChunkAssembly::new(0x04, 10);
        assert_eq!(assembly.offer(&[0x04, 0xE0, 0x01, 0x3A, 1, 2, 3]), Offered::Chunk);
        assert_eq!(assembly.offer(&[0x04, 0xA0, 0x02, 0x3A, 4, 5]), Offered::Chunk);
        assert!(!assembly.is_done());
        assert_eq!(assembly.offer(&[0x04, 0x20, 0x03, 0x01, 6]), Offered::Final);
        assert!(assembly.is_done());
        assert_eq!(assembly.frames().len(), 3);
        assert_eq!(assembly.finish(), Ok(vec![1, 2, 3, 4, 5, 6]));
    }

    #[test]
    fn test_ack_and_other_frames() {
        let mut assembly = ChunkAssembly::new(0x04, 10);
        assert_eq!(
            assembly.offer(&[0x01, 0x20, 0x01, 0x09, 0, 4, 0x20, 0, 0, 0, 0, 0, 0]),
            Offered::Acknowledgement
        );
        assert_eq!(assembly.offer(&[0x03, 0x20, 0x01, 0x04, 1, 0, 0, 0]), Offered::Ignored);
        // nothing past the header
        assert_eq!(assembly.offer(&[0x04, 0x20, 0x01, 0x00]), Offered::Ignored);
        assert!(assembly.frames().is_empty());
        assert_eq!(assembly.finish(), Err(GipError::NoFrames));
    }

    #[test]
    fn test_incomplete() {
        let mut assembly = ChunkAssembly::new(0x04, 2);
        assembly.offer(&[0x04, 0xE0, 0x01, 0x3A, 1, 2]);
        assembly.offer(&[0x04, 0xA0, 0x02, 0x3A, 3]);
        assembly.retry();
        assert!(!assembly.is_done());
        assembly.retry();
        assert!(assembly.is_done());
        assert_eq!(
            assembly.finish(),
            Err(GipError::Incomplete {
                frames: 2,
                partial: vec![1, 2, 3]
            })
        );
    }
}
