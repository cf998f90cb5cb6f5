//! Decode the descriptors of USB game controllers, and talk enough Xbox GIP
//! to get descriptors out of Xbox One and Series controllers.
//!
//! The entry point is [`get_device_info`], which drives a [`Transport`] to
//! fetch the device, configuration, string and HID report descriptors and
//! returns a [`DeviceModel`]. The decoders it uses are available on their own
//! in [`descriptors`], [`configuration`] and [`gip`].
//!
//! Enable the `nusb` feature for [`platform::NusbTransport`], which talks to
//! real hardware.

pub mod configuration;
pub use configuration::{ConfigurationModel, DeviceFamily};

pub mod descriptors;
pub use descriptors::DescriptorRecord;

mod device_info;
pub use device_info::{get_device_info, get_device_info_with, DeviceModel, ReportRecord};

mod error;
pub use error::{DecodeError, Error, GipError, TransportError, TransportErrorKind};

pub mod gip;

pub mod platform;

mod settings;
pub use settings::Settings;

mod transport;
pub use transport::Transport;

#[cfg(test)]
mod test_util;

#[cfg(fuzzing)]
pub use configuration::fuzz_decode_configuration;

#[cfg(fuzzing)]
pub use gip::fuzz_parse_header;
