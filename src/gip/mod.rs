//! Xbox Gaming Input Protocol (GIP) framing and the exchanges used to pull
//! descriptors out of Xbox One and Series controllers.

use log::{debug, warn};

use crate::{error::GipError, error::TransportError, settings::Settings, Transport};

mod chunk;
pub use chunk::{ChunkAssembly, Offered, CHUNK_HEADER_LEN};

mod extended;
pub use extended::{ExtendedDescriptor, EXTENDED_DESCRIPTOR_MIN_LEN};

mod header;
pub use header::{decode_length, encode_length, GipHeader, GIP_HEADER_FIXED_LEN};

#[cfg(fuzzing)]
pub use header::fuzz_parse_header;

pub mod init;

mod message;
pub use message::{
    Acknowledgement, DeviceArrival, DeviceStatus, GipMessage, GipPayload, Version,
    GIP_CMD_ACKNOWLEDGE, GIP_CMD_ARRIVAL, GIP_CMD_DESCRIPTOR, GIP_CMD_STATUS,
};

/// OUT endpoint number used when the configuration lists none.
pub const DEFAULT_OUT_ENDPOINT: u8 = 0x02;

/// IN endpoint polled for unsolicited messages.
pub const MESSAGE_ENDPOINT: u8 = 0x82;

/// Frames that add nothing to the descriptor (acknowledgements, input reports
/// and other traffic) read before each one starts costing a retry.
const MAX_UNRELATED_FRAMES: u32 = 64;

/// Descriptor chunks accepted before each further one costs a retry.
const MAX_CHUNK_FRAMES: u32 = 1024;

/// Send the initialization sequence to `ep_out`, pausing `settings.pacing`
/// after each frame.
pub fn initialize<T: Transport + ?Sized>(
    transport: &mut T,
    ep_out: u8,
    settings: &Settings,
) -> Result<(), TransportError> {
    for frame in init::INIT_SEQUENCE {
        transport.write(ep_out, frame, settings.timeout)?;
        transport.delay(settings.pacing);
    }
    Ok(())
}

/// The frame that asks the device for its GIP descriptor.
pub fn descriptor_request() -> Vec<u8> {
    GipHeader {
        command: GIP_CMD_DESCRIPTOR,
        system: true,
        sequence: 1,
        ..Default::default()
    }
    .encode()
}

/// Request the GIP descriptor on `ep_out` and reassemble the chunked reply
/// from the matching IN endpoint.
///
/// Returns the combined payload with every chunk header stripped.
pub fn request_descriptor<T: Transport + ?Sized>(
    transport: &mut T,
    ep_out: u8,
    settings: &Settings,
) -> Result<Vec<u8>, GipError> {
    transport.write(ep_out, &descriptor_request(), settings.timeout)?;

    let ep_in = 0x80 | (ep_out & 0x0F);
    let mut assembly = ChunkAssembly::new(GIP_CMD_DESCRIPTOR, settings.chunk_retries);
    let mut unrelated = 0;
    let mut chunks = 0;

    while !assembly.is_done() {
        let frame = match transport.read(ep_in, settings.read_max_len, settings.timeout) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("error reading GIP descriptor from endpoint {ep_in:02x}: {e}");
                assembly.retry();
                transport.delay(settings.pacing);
                continue;
            }
        };

        match assembly.offer(&frame) {
            Offered::Chunk | Offered::Final => {
                debug!("GIP descriptor chunk: {} bytes", frame.len());
                chunks += 1;
                if chunks > MAX_CHUNK_FRAMES {
                    assembly.retry();
                }
            }
            Offered::Acknowledgement | Offered::Ignored => {
                debug!("skipping {} byte frame during GIP descriptor exchange", frame.len());
                unrelated += 1;
                if unrelated > MAX_UNRELATED_FRAMES {
                    assembly.retry();
                }
            }
        }
    }

    debug!(
        "GIP descriptor exchange finished with {} frames, {} retries left",
        assembly.frames().len(),
        assembly.retries_left()
    );
    assembly.finish()
}

/// Poll `endpoint` up to `settings.message_reads` times, keeping every frame
/// with a decodable GIP header.
pub fn read_messages<T: Transport + ?Sized>(
    transport: &mut T,
    endpoint: u8,
    settings: &Settings,
) -> Vec<GipMessage> {
    let mut messages = Vec::new();

    for _ in 0..settings.message_reads {
        match transport.read(endpoint, settings.read_max_len, settings.timeout) {
            Ok(frame) if frame.len() > GIP_HEADER_FIXED_LEN => {
                if let Some(message) = GipMessage::parse(&frame) {
                    debug!(
                        "GIP message command {:02x}: {:?}",
                        message.header().command,
                        message.decode()
                    );
                    messages.push(message);
                }
            }
            Ok(frame) => debug!("ignoring {} byte frame from {endpoint:02x}", frame.len()),
            Err(e) => {
                warn!("error reading GIP message from endpoint {endpoint:02x}: {e}");
                transport.delay(settings.pacing);
            }
        }
    }

    messages
}
