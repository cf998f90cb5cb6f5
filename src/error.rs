use std::{fmt::Display, io};

/// Error decoding a descriptor stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer is shorter than the fixed layout of the structure requires.
    Truncated {
        /// Name of the structure being decoded.
        what: &'static str,
        /// Bytes required by the fixed layout.
        needed: usize,
        /// Bytes available.
        actual: usize,
    },

    /// A descriptor's `bLength` can't advance the walk, or runs past the
    /// configuration's `wTotalLength`.
    MalformedLength {
        /// Offset of the offending descriptor within the configuration.
        offset: usize,
        /// The declared `bLength`.
        length: u8,
    },

    /// `wTotalLength` claims more bytes than the buffer holds.
    SizeMismatch {
        /// The declared `wTotalLength`.
        declared: usize,
        /// Bytes available.
        actual: usize,
    },
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Truncated {
                what,
                needed,
                actual,
            } => write!(f, "{what} requires {needed} bytes, got {actual}"),
            DecodeError::MalformedLength { offset, length } => write!(
                f,
                "descriptor at offset {offset} has invalid bLength {length}"
            ),
            DecodeError::SizeMismatch { declared, actual } => write!(
                f,
                "configuration wTotalLength is {declared} but buffer is {actual} bytes"
            ),
        }
    }
}

impl std::error::Error for DecodeError {}

/// General category of a [`TransportError`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportErrorKind {
    /// The request did not complete within its timeout.
    Timeout,

    /// The device stalled the endpoint or rejected the request.
    Stall,

    /// Device is disconnected.
    Disconnected,

    /// The operation is not supported by the transport.
    NotSupported,

    /// Uncategorized error.
    Other,
}

/// Error returned by a [`Transport`][crate::Transport] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    kind: TransportErrorKind,
    message: &'static str,
}

impl TransportError {
    /// Create an error of the given kind.
    pub fn new(kind: TransportErrorKind, message: &'static str) -> Self {
        Self { kind, message }
    }

    /// Shorthand for a timed-out request.
    pub fn timeout() -> Self {
        Self::new(TransportErrorKind::Timeout, "request timed out")
    }

    /// Get the error kind.
    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }
}

impl Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TransportError {}

impl From<TransportError> for io::Error {
    fn from(err: TransportError) -> Self {
        let kind = match err.kind {
            TransportErrorKind::Timeout => io::ErrorKind::TimedOut,
            TransportErrorKind::Disconnected => io::ErrorKind::NotConnected,
            TransportErrorKind::NotSupported => io::ErrorKind::Unsupported,
            TransportErrorKind::Stall | TransportErrorKind::Other => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

/// Error from a GIP exchange with the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GipError {
    /// The retry budget ran out before any matching frame arrived.
    NoFrames,

    /// Chunks arrived but the final one (with `chunked` clear) never did.
    Incomplete {
        /// Number of chunk frames collected.
        frames: usize,
        /// Concatenated payload of the frames that did arrive.
        partial: Vec<u8>,
    },

    /// Sending the request failed.
    Transport(TransportError),
}

impl Display for GipError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GipError::NoFrames => write!(f, "no GIP frames received"),
            GipError::Incomplete { frames, partial } => write!(
                f,
                "chunked GIP message incomplete after {frames} frames ({} bytes)",
                partial.len()
            ),
            GipError::Transport(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for GipError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GipError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for GipError {
    fn from(value: TransportError) -> Self {
        GipError::Transport(value)
    }
}

/// Any error produced by this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed descriptor data.
    Decode(DecodeError),

    /// Transport call failed.
    Transport(TransportError),

    /// GIP exchange failed.
    Gip(GipError),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Decode(e) => write!(f, "{e}"),
            Error::Transport(e) => write!(f, "{e}"),
            Error::Gip(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Decode(e) => Some(e),
            Error::Transport(e) => Some(e),
            Error::Gip(e) => Some(e),
        }
    }
}

impl From<DecodeError> for Error {
    fn from(value: DecodeError) -> Self {
        Error::Decode(value)
    }
}

impl From<TransportError> for Error {
    fn from(value: TransportError) -> Self {
        Error::Transport(value)
    }
}

impl From<GipError> for Error {
    fn from(value: GipError) -> Self {
        Error::Gip(value)
    }
}

impl From<Error> for io::Error {
    fn from(value: Error) -> Self {
        match value {
            Error::Transport(e) => e.into(),
            Error::Decode(e) => io::Error::new(io::ErrorKind::InvalidData, e),
            Error::Gip(GipError::Transport(e)) => e.into(),
            Error::Gip(e) => io::Error::new(io::ErrorKind::TimedOut, e),
        }
    }
}
