use std::time::Duration;

use crate::error::TransportError;

/// Synchronous request/response access to one USB device.
///
/// Every call blocks until it completes, fails, or times out. The decoding
/// code never enumerates devices or claims interfaces itself; that is up to
/// the implementation. See [`NusbTransport`][crate::platform::NusbTransport]
/// for a hardware backend.
pub trait Transport {
    /// Read the device descriptor (standard GET_DESCRIPTOR, type 1, index 0).
    fn get_device_descriptor(&mut self, max_len: usize) -> Result<Vec<u8>, TransportError>;

    /// Read the configuration descriptor set at `index`, including all of its
    /// interface, endpoint and class descriptors.
    fn get_config_descriptor(&mut self, index: u8, max_len: usize)
        -> Result<Vec<u8>, TransportError>;

    /// Read string descriptor `index` in the given language.
    fn get_string_descriptor(
        &mut self,
        index: u8,
        language_id: u16,
        max_len: usize,
    ) -> Result<Vec<u8>, TransportError>;

    /// Read the HID report descriptor of `interface_number` with a
    /// class-specific GET_DESCRIPTOR request.
    fn get_class_descriptor(
        &mut self,
        interface_number: u8,
        max_len: usize,
    ) -> Result<Vec<u8>, TransportError>;

    /// Write one frame to an OUT endpoint.
    fn write(&mut self, endpoint: u8, data: &[u8], timeout: Duration)
        -> Result<(), TransportError>;

    /// Read one frame of at most `max_len` bytes from an IN endpoint.
    fn read(
        &mut self,
        endpoint: u8,
        max_len: usize,
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError>;

    /// Wait between requests that the device firmware expects to be paced.
    fn delay(&mut self, duration: Duration) {
        std::thread::sleep(duration)
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn get_device_descriptor(&mut self, max_len: usize) -> Result<Vec<u8>, TransportError> {
        (**self).get_device_descriptor(max_len)
    }

    fn get_config_descriptor(
        &mut self,
        index: u8,
        max_len: usize,
    ) -> Result<Vec<u8>, TransportError> {
        (**self).get_config_descriptor(index, max_len)
    }

    fn get_string_descriptor(
        &mut self,
        index: u8,
        language_id: u16,
        max_len: usize,
    ) -> Result<Vec<u8>, TransportError> {
        (**self).get_string_descriptor(index, language_id, max_len)
    }

    fn get_class_descriptor(
        &mut self,
        interface_number: u8,
        max_len: usize,
    ) -> Result<Vec<u8>, TransportError> {
        (**self).get_class_descriptor(interface_number, max_len)
    }

    fn write(
        &mut self,
        endpoint: u8,
        data: &[u8],
        timeout: Duration,
    ) -> Result<(), TransportError> {
        (**self).write(endpoint, data, timeout)
    }

    fn read(
        &mut self,
        endpoint: u8,
        max_len: usize,
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        (**self).read(endpoint, max_len, timeout)
    }

    fn delay(&mut self, duration: Duration) {
        (**self).delay(duration)
    }
}
