use std::{collections::HashMap, time::Duration};

use log::{debug, warn};
use nusb::{
    transfer::{Buffer, ControlIn, ControlType, In, Interrupt, Out, Recipient, TransferError},
    Device, GetDescriptorError, Interface, MaybeFuture,
};

use crate::{
    descriptors::{
        DESCRIPTOR_TYPE_CONFIGURATION, DESCRIPTOR_TYPE_DEVICE, DESCRIPTOR_TYPE_HID_REPORT,
        DESCRIPTOR_TYPE_STRING,
    },
    error::{TransportError, TransportErrorKind},
    Transport,
};

const REQUEST_GET_DESCRIPTOR: u8 = 0x06;

fn transfer_error(e: TransferError) -> TransportError {
    match e {
        TransferError::Stall => {
            TransportError::new(TransportErrorKind::Stall, "endpoint STALL condition")
        }
        TransferError::Disconnected => {
            TransportError::new(TransportErrorKind::Disconnected, "device disconnected")
        }
        TransferError::Cancelled => TransportError::timeout(),
        TransferError::InvalidArgument => TransportError::new(
            TransportErrorKind::NotSupported,
            "invalid or unsupported argument",
        ),
        _ => TransportError::new(TransportErrorKind::Other, "transfer failed"),
    }
}

fn descriptor_error(e: GetDescriptorError) -> TransportError {
    match e {
        GetDescriptorError::Transfer(e) => transfer_error(e),
        _ => TransportError::new(TransportErrorKind::Other, "invalid descriptor"),
    }
}

fn open_error(e: nusb::Error) -> TransportError {
    warn!("failed to open interface: {e}");
    TransportError::new(TransportErrorKind::NotSupported, "could not claim interface")
}

/// [`Transport`] over a device opened with [`nusb`].
///
/// Interfaces are claimed (detaching kernel drivers on Linux) the first time
/// one of their endpoints or class descriptors is used.
///
/// ```no_run
/// use nusb::MaybeFuture;
/// use padscope::platform::NusbTransport;
///
/// let info = nusb::list_devices().wait().unwrap()
///     .find(|d| d.vendor_id() == 0x045E)
///     .expect("no controller connected");
/// let mut transport = NusbTransport::new(info.open().wait().unwrap());
/// let model = padscope::get_device_info(&mut transport).unwrap();
/// ```
pub struct NusbTransport {
    device: Device,
    timeout: Duration,
    interfaces: HashMap<u8, Interface>,
}

impl NusbTransport {
    pub fn new(device: Device) -> NusbTransport {
        NusbTransport {
            device,
            timeout: Duration::from_millis(1000),
            interfaces: HashMap::new(),
        }
    }

    /// Timeout for control transfers. Endpoint I/O takes its timeout per call.
    pub fn with_timeout(mut self, timeout: Duration) -> NusbTransport {
        self.timeout = timeout;
        self
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    fn get_descriptor(
        &self,
        desc_type: u8,
        index: u8,
        language_id: u16,
        max_len: usize,
    ) -> Result<Vec<u8>, TransportError> {
        let mut data = self
            .device
            .get_descriptor(desc_type, index, language_id, self.timeout)
            .wait()
            .map_err(descriptor_error)?;
        data.truncate(max_len);
        Ok(data)
    }

    fn interface(&mut self, number: u8) -> Result<&Interface, TransportError> {
        if !self.interfaces.contains_key(&number) {
            debug!("claiming interface {number}");
            let interface = self
                .device
                .detach_and_claim_interface(number)
                .wait()
                .map_err(open_error)?;
            self.interfaces.insert(number, interface);
        }
        self.interfaces
            .get(&number)
            .ok_or_else(|| TransportError::new(TransportErrorKind::Other, "interface lost"))
    }

    /// Find the interface of the active configuration that owns `endpoint`.
    fn interface_for_endpoint(&mut self, endpoint: u8) -> Result<&Interface, TransportError> {
        let config = self.device.active_configuration().map_err(|_| {
            TransportError::new(TransportErrorKind::Other, "no active configuration")
        })?;
        let number = config
            .interface_alt_settings()
            .find(|i| i.endpoints().any(|e| e.address() == endpoint))
            .map(|i| i.interface_number())
            .ok_or(TransportError::new(
                TransportErrorKind::NotSupported,
                "endpoint not found in active configuration",
            ))?;
        self.interface(number)
    }
}

impl Transport for NusbTransport {
    fn get_device_descriptor(&mut self, max_len: usize) -> Result<Vec<u8>, TransportError> {
        self.get_descriptor(DESCRIPTOR_TYPE_DEVICE, 0, 0, max_len)
    }

    fn get_config_descriptor(
        &mut self,
        index: u8,
        max_len: usize,
    ) -> Result<Vec<u8>, TransportError> {
        self.get_descriptor(DESCRIPTOR_TYPE_CONFIGURATION, index, 0, max_len)
    }

    fn get_string_descriptor(
        &mut self,
        index: u8,
        language_id: u16,
        max_len: usize,
    ) -> Result<Vec<u8>, TransportError> {
        self.get_descriptor(DESCRIPTOR_TYPE_STRING, index, language_id, max_len)
    }

    fn get_class_descriptor(
        &mut self,
        interface_number: u8,
        max_len: usize,
    ) -> Result<Vec<u8>, TransportError> {
        let timeout = self.timeout;
        let length = u16::try_from(max_len).unwrap_or(u16::MAX);
        self.interface(interface_number)?
            .control_in(
                ControlIn {
                    control_type: ControlType::Class,
                    recipient: Recipient::Interface,
                    request: REQUEST_GET_DESCRIPTOR,
                    value: (DESCRIPTOR_TYPE_HID_REPORT as u16) << 8,
                    index: interface_number as u16,
                    length,
                },
                timeout,
            )
            .wait()
            .map_err(transfer_error)
    }

    fn write(
        &mut self,
        endpoint: u8,
        data: &[u8],
        timeout: Duration,
    ) -> Result<(), TransportError> {
        let mut ep = self
            .interface_for_endpoint(endpoint)?
            .endpoint::<Interrupt, Out>(endpoint)
            .map_err(open_error)?;

        ep.submit(Buffer::from(data.to_vec()));
        match ep.wait_next_complete(timeout) {
            Some(c) => c.status.map_err(transfer_error),
            None => {
                ep.cancel_all();
                let _ = ep.wait_next_complete(timeout);
                Err(TransportError::timeout())
            }
        }
    }

    fn read(
        &mut self,
        endpoint: u8,
        max_len: usize,
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        let mut ep = self
            .interface_for_endpoint(endpoint)?
            .endpoint::<Interrupt, In>(endpoint)
            .map_err(open_error)?;

        // IN transfers must be a whole number of packets
        let packet = ep.max_packet_size().max(1);
        let requested = max_len.max(1).div_ceil(packet) * packet;

        ep.submit(Buffer::new(requested));
        match ep.wait_next_complete(timeout) {
            Some(c) => {
                c.status.map_err(transfer_error)?;
                let mut data = c.buffer.into_vec();
                data.truncate(max_len);
                Ok(data)
            }
            None => {
                ep.cancel_all();
                let _ = ep.wait_next_complete(timeout);
                Err(TransportError::timeout())
            }
        }
    }
}
