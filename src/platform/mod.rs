//! Hardware transports.

#[cfg(feature = "nusb")]
mod nusb_transport;

#[cfg(feature = "nusb")]
pub use nusb_transport::NusbTransport;
