//! Fixed-layout USB descriptor structures.
//!
//! Each standard descriptor is stored as the bytes of its fixed layout and exposes
//! its fields through accessors. Descriptors with no known layout are kept as
//! [`RawDescriptor`] blobs so unknown vendor data survives decoding untouched.

use std::fmt::Debug;

use log::warn;

use crate::error::DecodeError;

pub const DESCRIPTOR_TYPE_DEVICE: u8 = 0x01;
pub const DESCRIPTOR_LEN_DEVICE: usize = 18;

pub const DESCRIPTOR_TYPE_CONFIGURATION: u8 = 0x02;
pub const DESCRIPTOR_LEN_CONFIGURATION: usize = 9;

pub const DESCRIPTOR_TYPE_STRING: u8 = 0x03;

pub const DESCRIPTOR_TYPE_INTERFACE: u8 = 0x04;
pub const DESCRIPTOR_LEN_INTERFACE: usize = 9;

pub const DESCRIPTOR_TYPE_ENDPOINT: u8 = 0x05;
pub const DESCRIPTOR_LEN_ENDPOINT: usize = 7;

pub const DESCRIPTOR_TYPE_HID: u8 = 0x21;
pub const DESCRIPTOR_LEN_HID: usize = 9;

pub const DESCRIPTOR_TYPE_HID_REPORT: u8 = 0x22;

/// Vendor descriptor carried by XInput security interfaces.
pub const DESCRIPTOR_TYPE_XINPUT_AUTH: u8 = 0x41;

/// Descriptor type used for report records that carry XGIP artifacts.
pub const DESCRIPTOR_TYPE_XGIP_ARTIFACT: u8 = 0xF0;

/// USB defined language IDs for string descriptors.
pub mod language_id {
    /// US English
    pub const US_ENGLISH: u16 = 0x0409;
}

/// Endpoint direction, from bit 7 of `bEndpointAddress`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    /// Host to device
    Out,

    /// Device to host
    In,
}

/// Endpoint transfer type, from bits 0..2 of `bmAttributes`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EndpointType {
    Control,
    Isochronous,
    Bulk,
    Interrupt,
}

macro_rules! descriptor_fields {
    (impl $tname:ident {
        $(
            $(#[$attr:meta])*
            $vis:vis fn $name:ident at $pos:literal -> $ty:ty;
        )*
    }) => {
        impl $tname {
            $(
                $(#[$attr])*
                #[inline]
                $vis fn $name(&self) -> $ty { <$ty>::from_le_bytes(self.0[$pos..$pos + std::mem::size_of::<$ty>()].try_into().unwrap()) }
            )*
        }
    }
}

/// Copy the fixed `N`-byte layout from the start of `buf`.
fn fixed<const N: usize>(what: &'static str, buf: &[u8]) -> Result<[u8; N], DecodeError> {
    buf.get(..N)
        .and_then(|b| b.try_into().ok())
        .ok_or(DecodeError::Truncated {
            what,
            needed: N,
            actual: buf.len(),
        })
}

/// Information about a USB device.
#[derive(Clone, PartialEq, Eq)]
pub struct DeviceDescriptor([u8; DESCRIPTOR_LEN_DEVICE]);

impl DeviceDescriptor {
    /// Create a `DeviceDescriptor` from a buffer beginning with a device descriptor.
    pub fn new(buf: &[u8]) -> Result<Self, DecodeError> {
        fixed("device descriptor", buf).map(DeviceDescriptor)
    }

    /// Like [`new`][Self::new], but a short buffer is zero-filled to 18 bytes
    /// instead of rejected.
    pub fn from_padded(buf: &[u8]) -> Self {
        let mut bytes = [0; DESCRIPTOR_LEN_DEVICE];
        if buf.len() < DESCRIPTOR_LEN_DEVICE {
            warn!(
                "device descriptor has {} bytes, expected {DESCRIPTOR_LEN_DEVICE}; padding with zeros",
                buf.len()
            );
        }
        let n = buf.len().min(DESCRIPTOR_LEN_DEVICE);
        bytes[..n].copy_from_slice(&buf[..n]);
        DeviceDescriptor(bytes)
    }

    /// Get the bytes of the descriptor.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

descriptor_fields! {
    impl DeviceDescriptor {
        /// `bLength` descriptor field.
        #[doc(alias = "bLength")]
        pub fn length at 0 -> u8;

        /// `bDescriptorType` descriptor field.
        #[doc(alias = "bDescriptorType")]
        pub fn descriptor_type at 1 -> u8;

        /// `bcdUSB` descriptor field: USB Specification Number.
        #[doc(alias = "bcdUSB")]
        pub fn usb_version at 2 -> u16;

        /// `bDeviceClass` descriptor field: Class code, assigned by USB-IF.
        #[doc(alias = "bDeviceClass")]
        pub fn class at 4 -> u8;

        /// `bDeviceSubClass` descriptor field: Subclass code, assigned by USB-IF.
        #[doc(alias = "bDeviceSubClass")]
        pub fn subclass at 5 -> u8;

        /// `bDeviceProtocol` descriptor field: Protocol code, assigned by USB-IF.
        #[doc(alias = "bDeviceProtocol")]
        pub fn protocol at 6 -> u8;

        /// `bMaxPacketSize0` descriptor field: Maximum packet size for 0 Endpoint.
        #[doc(alias = "bMaxPacketSize0")]
        pub fn max_packet_size_0 at 7 -> u8;

        /// `idVendor` descriptor field: Vendor ID, assigned by USB-IF.
        #[doc(alias = "idVendor")]
        pub fn vendor_id at 8 -> u16;

        /// `idProduct` descriptor field: Product ID, assigned by the manufacturer.
        #[doc(alias = "idProduct")]
        pub fn product_id at 10 -> u16;

        /// `bcdDevice` descriptor field: Device release number.
        #[doc(alias = "bcdDevice")]
        pub fn device_version at 12 -> u16;

        fn manufacturer_string_index_raw at 14 -> u8;
        fn product_string_index_raw at 15 -> u8;
        fn serial_number_string_index_raw at 16 -> u8;

        /// `bNumConfigurations` descriptor field: Number of configurations
        #[doc(alias = "bNumConfigurations")]
        pub fn num_configurations at 17 -> u8;
    }
}

impl DeviceDescriptor {
    /// `iManufacturer` descriptor field: Index for manufacturer description string.
    pub fn manufacturer_string_index(&self) -> Option<u8> {
        Some(self.manufacturer_string_index_raw()).filter(|&i| i != 0)
    }

    /// `iProduct` descriptor field: Index for product description string.
    pub fn product_string_index(&self) -> Option<u8> {
        Some(self.product_string_index_raw()).filter(|&i| i != 0)
    }

    /// `iSerialNumber` descriptor field: Index for serial number string.
    pub fn serial_number_string_index(&self) -> Option<u8> {
        Some(self.serial_number_string_index_raw()).filter(|&i| i != 0)
    }
}

impl Debug for DeviceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceDescriptor")
            .field("length", &self.length())
            .field("usb_version", &format_args!("0x{:04X}", self.usb_version()))
            .field("class", &format_args!("0x{:02X}", self.class()))
            .field("subclass", &format_args!("0x{:02X}", self.subclass()))
            .field("protocol", &format_args!("0x{:02X}", self.protocol()))
            .field("max_packet_size_0", &self.max_packet_size_0())
            .field("vendor_id", &format_args!("0x{:04X}", self.vendor_id()))
            .field("product_id", &format_args!("0x{:04X}", self.product_id()))
            .field(
                "device_version",
                &format_args!("0x{:04X}", self.device_version()),
            )
            .field(
                "manufacturer_string_index",
                &self.manufacturer_string_index(),
            )
            .field("product_string_index", &self.product_string_index())
            .field(
                "serial_number_string_index",
                &self.serial_number_string_index(),
            )
            .field("num_configurations", &self.num_configurations())
            .finish()
    }
}

/// The 9-byte header at the start of a configuration descriptor set.
#[derive(Clone, PartialEq, Eq)]
pub struct ConfigurationDescriptor([u8; DESCRIPTOR_LEN_CONFIGURATION]);

impl ConfigurationDescriptor {
    pub fn new(buf: &[u8]) -> Result<Self, DecodeError> {
        fixed("configuration descriptor", buf).map(ConfigurationDescriptor)
    }

    /// Get the bytes of the descriptor.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

descriptor_fields! {
    impl ConfigurationDescriptor {
        #[doc(alias = "bLength")]
        pub fn length at 0 -> u8;

        #[doc(alias = "bDescriptorType")]
        pub fn descriptor_type at 1 -> u8;

        /// `wTotalLength` descriptor field: Length of the configuration and all trailing descriptors.
        #[doc(alias = "wTotalLength")]
        pub fn total_length at 2 -> u16;

        /// `bNumInterfaces` descriptor field: Number of interfaces.
        #[doc(alias = "bNumInterfaces")]
        pub fn num_interfaces at 4 -> u8;

        /// `bConfigurationValue` descriptor field: Identifier for the configuration.
        #[doc(alias = "bConfigurationValue")]
        pub fn configuration_value at 5 -> u8;

        fn string_index_raw at 6 -> u8;

        /// `bmAttributes` descriptor field: Bitmap of configuration attributes.
        #[doc(alias = "bmAttributes")]
        pub fn attributes at 7 -> u8;

        /// `bMaxPower` descriptor field: Maximum power, in units of **2** milliamps.
        #[doc(alias = "bMaxPower")]
        pub fn max_power at 8 -> u8;
    }
}

impl ConfigurationDescriptor {
    /// Index of the string descriptor describing this configuration.
    #[doc(alias = "iConfiguration")]
    pub fn string_index(&self) -> Option<u8> {
        Some(self.string_index_raw()).filter(|&i| i != 0)
    }

    pub fn self_powered(&self) -> bool {
        self.attributes() & 0x40 != 0
    }

    pub fn remote_wakeup(&self) -> bool {
        self.attributes() & 0x20 != 0
    }

    /// Maximum power draw in milliamps.
    pub fn max_power_ma(&self) -> u16 {
        self.max_power() as u16 * 2
    }
}

impl Debug for ConfigurationDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationDescriptor")
            .field("total_length", &self.total_length())
            .field("num_interfaces", &self.num_interfaces())
            .field("configuration_value", &self.configuration_value())
            .field("string_index", &self.string_index())
            .field("attributes", &format_args!("0x{:02X}", self.attributes()))
            .field("self_powered", &self.self_powered())
            .field("remote_wakeup", &self.remote_wakeup())
            .field("max_power_ma", &self.max_power_ma())
            .finish()
    }
}

/// A USB interface descriptor (one alternate setting).
#[derive(Clone, PartialEq, Eq)]
pub struct InterfaceDescriptor([u8; DESCRIPTOR_LEN_INTERFACE]);

impl InterfaceDescriptor {
    pub fn new(buf: &[u8]) -> Result<Self, DecodeError> {
        fixed("interface descriptor", buf).map(InterfaceDescriptor)
    }

    /// Get the bytes of the descriptor.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

descriptor_fields! {
    impl InterfaceDescriptor {
        #[doc(alias = "bLength")]
        pub fn length at 0 -> u8;

        #[doc(alias = "bDescriptorType")]
        pub fn descriptor_type at 1 -> u8;

        /// `bInterfaceNumber` descriptor field: Identifier for the interface.
        #[doc(alias="bInterfaceNumber")]
        pub fn interface_number at 2 -> u8;

        /// `bAlternateSetting` descriptor field: Identifier for this alternate setting.
        #[doc(alias="bAlternateSetting")]
        pub fn alternate_setting at 3 -> u8;

        /// `bNumEndpoints` descriptor field: Number of endpoints in this alternate setting.
        #[doc(alias="bNumEndpoints")]
        pub fn num_endpoints at 4 -> u8;

        /// `bInterfaceClass` descriptor field: Standard interface class.
        #[doc(alias="bInterfaceClass")]
        pub fn class at 5 -> u8;

        /// `bInterfaceSubClass` descriptor field: Standard interface subclass.
        #[doc(alias="bInterfaceSubClass")]
        pub fn subclass at 6 -> u8;

        /// `bInterfaceProtocol` descriptor field: Standard interface protocol.
        #[doc(alias="bInterfaceProtocol")]
        pub fn protocol at 7 -> u8;

        fn string_index_raw at 8 -> u8;
    }
}

impl InterfaceDescriptor {
    /// Index of the string descriptor describing this interface or alternate setting.
    #[doc(alias = "iInterface")]
    pub fn string_index(&self) -> Option<u8> {
        Some(self.string_index_raw()).filter(|&i| i != 0)
    }
}

impl Debug for InterfaceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterfaceDescriptor")
            .field("interface_number", &self.interface_number())
            .field("alternate_setting", &self.alternate_setting())
            .field("num_endpoints", &self.num_endpoints())
            .field("class", &format_args!("0x{:02X}", self.class()))
            .field("subclass", &format_args!("0x{:02X}", self.subclass()))
            .field("protocol", &format_args!("0x{:02X}", self.protocol()))
            .field("string_index", &self.string_index())
            .finish()
    }
}

/// A USB endpoint descriptor.
#[derive(Clone, PartialEq, Eq)]
pub struct EndpointDescriptor([u8; DESCRIPTOR_LEN_ENDPOINT]);

impl EndpointDescriptor {
    pub fn new(buf: &[u8]) -> Result<Self, DecodeError> {
        fixed("endpoint descriptor", buf).map(EndpointDescriptor)
    }

    /// Get the bytes of the descriptor.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Get the endpoint's direction.
    pub fn direction(&self) -> Direction {
        match self.address() & 0x80 {
            0 => Direction::Out,
            _ => Direction::In,
        }
    }

    /// Endpoint number without the direction bit.
    pub fn number(&self) -> u8 {
        self.address() & 0x0F
    }

    /// Get the endpoint's transfer type.
    pub fn transfer_type(&self) -> EndpointType {
        match self.attributes() & 0x03 {
            0 => EndpointType::Control,
            1 => EndpointType::Isochronous,
            2 => EndpointType::Bulk,
            _ => EndpointType::Interrupt,
        }
    }

    /// Get the maximum packet size in bytes.
    pub fn max_packet_size(&self) -> usize {
        (self.max_packet_size_raw() & ((1 << 11) - 1)) as usize
    }
}

descriptor_fields! {
    impl EndpointDescriptor {
        #[doc(alias = "bLength")]
        pub fn length at 0 -> u8;

        #[doc(alias = "bDescriptorType")]
        pub fn descriptor_type at 1 -> u8;

        /// Get the `bEndpointAddress` descriptor field: Endpoint address.
        #[doc(alias = "bEndpointAddress")]
        pub fn address at 2 -> u8;

        /// Get the raw value of the `bmAttributes` descriptor field.
        #[doc(alias = "bmAttributes")]
        pub fn attributes at 3 -> u8;

        /// Get the raw value of the `wMaxPacketSize` descriptor field.
        #[doc(alias = "wMaxPacketSize")]
        pub fn max_packet_size_raw at 4 -> u16;

        /// Get the `bInterval` field: Polling interval in frames or microframes.
        #[doc(alias = "bInterval")]
        pub fn interval at 6 -> u8;
    }
}

impl Debug for EndpointDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointDescriptor")
            .field("address", &format_args!("0x{:02X}", self.address()))
            .field("direction", &self.direction())
            .field("transfer_type", &self.transfer_type())
            .field("max_packet_size", &self.max_packet_size())
            .field("interval", &self.interval())
            .finish()
    }
}

/// The HID class descriptor that follows a HID interface.
///
/// Only the first subordinate descriptor entry is decoded, which for every
/// HID device is the report descriptor.
#[derive(Clone, PartialEq, Eq)]
pub struct HidDescriptor([u8; DESCRIPTOR_LEN_HID]);

impl HidDescriptor {
    pub fn new(buf: &[u8]) -> Result<Self, DecodeError> {
        fixed("HID descriptor", buf).map(HidDescriptor)
    }

    /// Get the bytes of the descriptor.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

descriptor_fields! {
    impl HidDescriptor {
        #[doc(alias = "bLength")]
        pub fn length at 0 -> u8;

        #[doc(alias = "bDescriptorType")]
        pub fn descriptor_type at 1 -> u8;

        #[doc(alias = "bcdHID")]
        pub fn hid_version at 2 -> u16;

        #[doc(alias = "bCountryCode")]
        pub fn country_code at 4 -> u8;

        #[doc(alias = "bNumDescriptors")]
        pub fn num_descriptors at 5 -> u8;

        /// Type of the first subordinate descriptor, `0x22` for a report descriptor.
        pub fn report_descriptor_type at 6 -> u8;

        /// Length of the first subordinate descriptor.
        #[doc(alias = "wDescriptorLength")]
        pub fn report_descriptor_length at 7 -> u16;
    }
}

impl Debug for HidDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HidDescriptor")
            .field("hid_version", &format_args!("0x{:04X}", self.hid_version()))
            .field("country_code", &self.country_code())
            .field("num_descriptors", &self.num_descriptors())
            .field(
                "report_descriptor_type",
                &format_args!("0x{:02X}", self.report_descriptor_type()),
            )
            .field("report_descriptor_length", &self.report_descriptor_length())
            .finish()
    }
}

/// A descriptor kept as raw bytes, with a display name.
#[derive(Clone, PartialEq, Eq)]
pub struct RawDescriptor {
    name: &'static str,
    data: Vec<u8>,
}

impl RawDescriptor {
    /// Wrap the bytes of one descriptor, header included.
    pub fn new(name: &'static str, buf: &[u8]) -> Result<Self, DecodeError> {
        if buf.len() < 2 {
            return Err(DecodeError::Truncated {
                what: "descriptor header",
                needed: 2,
                actual: buf.len(),
            });
        }
        Ok(RawDescriptor {
            name,
            data: buf.to_vec(),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn length(&self) -> u8 {
        self.data[0]
    }

    pub fn descriptor_type(&self) -> u8 {
        self.data[1]
    }

    /// Bytes following the two-byte header.
    pub fn payload(&self) -> &[u8] {
        &self.data[2..]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Debug for RawDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawDescriptor")
            .field("name", &self.name)
            .field("length", &self.length())
            .field(
                "descriptor_type",
                &format_args!("0x{:02X}", self.descriptor_type()),
            )
            .field("payload", &format_args!("{:02x?}", self.payload()))
            .finish()
    }
}

/// What a string descriptor was requested for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StringRole {
    /// String index 0: the list of supported language IDs.
    LanguageIds,
    Manufacturer,
    Product,
    SerialNumber,
    /// The `iInterface` string of the given interface number.
    Interface(u8),
}

/// A string descriptor as returned by the device.
#[derive(Clone, PartialEq, Eq)]
pub struct StringDescriptor {
    index: u8,
    role: StringRole,
    data: Vec<u8>,
}

impl StringDescriptor {
    pub fn new(index: u8, role: StringRole, buf: &[u8]) -> Result<Self, DecodeError> {
        if buf.len() < 2 {
            return Err(DecodeError::Truncated {
                what: "string descriptor",
                needed: 2,
                actual: buf.len(),
            });
        }
        Ok(StringDescriptor {
            index,
            role,
            data: buf.to_vec(),
        })
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn role(&self) -> StringRole {
        self.role
    }

    pub fn length(&self) -> u8 {
        self.data[0]
    }

    pub fn descriptor_type(&self) -> u8 {
        self.data[1]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The UTF-16LE body, bounded by both `bLength` and the bytes received.
    fn body(&self) -> &[u8] {
        let end = (self.length() as usize).min(self.data.len());
        self.data.get(2..end).unwrap_or(&[])
    }

    /// Language IDs listed by string descriptor 0.
    pub fn language_ids(&self) -> impl Iterator<Item = u16> + '_ {
        self.body()
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
    }

    /// Decode the string.
    ///
    /// Unpaired UTF-16 surrogates will be replaced with `�`, like [`String::from_utf16_lossy`].
    pub fn text(&self) -> String {
        decode_utf16_lossy(self.body())
    }
}

impl Debug for StringDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("StringDescriptor");
        s.field("index", &self.index).field("role", &self.role);
        match self.role {
            StringRole::LanguageIds => s.field(
                "language_ids",
                &format_args!("{:04x?}", self.language_ids().collect::<Vec<_>>()),
            ),
            _ => s.field("text", &self.text()),
        };
        s.finish()
    }
}

pub(crate) fn decode_utf16_lossy(data: &[u8]) -> String {
    char::decode_utf16(
        data.chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]])),
    )
    .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
    .collect::<String>()
}

/// One decoded descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DescriptorRecord {
    Device(DeviceDescriptor),
    Configuration(ConfigurationDescriptor),
    Interface(InterfaceDescriptor),
    Endpoint(EndpointDescriptor),
    Hid(HidDescriptor),
    String(StringDescriptor),

    /// A standard tag reinterpreted as a vendor layout, such as the XInput
    /// class descriptors that reuse the HID tag.
    VendorOverlay(RawDescriptor),

    /// A descriptor with no known layout.
    Unknown(RawDescriptor),
}

impl DescriptorRecord {
    /// The `bLength` field as declared in the stream.
    pub fn length(&self) -> u8 {
        match self {
            DescriptorRecord::Device(d) => d.length(),
            DescriptorRecord::Configuration(d) => d.length(),
            DescriptorRecord::Interface(d) => d.length(),
            DescriptorRecord::Endpoint(d) => d.length(),
            DescriptorRecord::Hid(d) => d.length(),
            DescriptorRecord::String(d) => d.length(),
            DescriptorRecord::VendorOverlay(d) | DescriptorRecord::Unknown(d) => d.length(),
        }
    }

    /// The raw `bDescriptorType` tag.
    pub fn descriptor_type(&self) -> u8 {
        match self {
            DescriptorRecord::Device(d) => d.descriptor_type(),
            DescriptorRecord::Configuration(d) => d.descriptor_type(),
            DescriptorRecord::Interface(d) => d.descriptor_type(),
            DescriptorRecord::Endpoint(d) => d.descriptor_type(),
            DescriptorRecord::Hid(d) => d.descriptor_type(),
            DescriptorRecord::String(d) => d.descriptor_type(),
            DescriptorRecord::VendorOverlay(d) | DescriptorRecord::Unknown(d) => {
                d.descriptor_type()
            }
        }
    }
}

#[test]
#[rustfmt::skip]
fn test_xbox360_device_descriptor() {
    let dev = DeviceDescriptor::new(&[
        0x12, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x40, 0x5E,
        0x04, 0x8E, 0x02, 0x00, 0x01, 0x01, 0x02, 0x00, 0x01,
    ]).unwrap();
    assert_eq!(dev.length(), 18);
    assert_eq!(dev.descriptor_type(), DESCRIPTOR_TYPE_DEVICE);
    assert_eq!(dev.usb_version(), 0x0200);
    assert_eq!(dev.class(), 0);
    assert_eq!(dev.max_packet_size_0(), 64);
    assert_eq!(dev.vendor_id(), 0x045E);
    assert_eq!(dev.product_id(), 0x028E);
    assert_eq!(dev.device_version(), 0x0100);
    assert_eq!(dev.manufacturer_string_index(), Some(1));
    assert_eq!(dev.product_string_index(), Some(2));
    assert_eq!(dev.serial_number_string_index(), None);
    assert_eq!(dev.num_configurations(), 1);
}

#[test]
fn test_short_device_descriptor() {
    assert_eq!(
        DeviceDescriptor::new(&[0x12, 0x01, 0x00, 0x02]),
        Err(DecodeError::Truncated {
            what: "device descriptor",
            needed: 18,
            actual: 4
        })
    );

    let dev = DeviceDescriptor::from_padded(&[0x12, 0x01, 0x10, 0x01, 0xFF]);
    assert_eq!(dev.usb_version(), 0x0110);
    assert_eq!(dev.class(), 0xFF);
    assert_eq!(dev.vendor_id(), 0);
    assert_eq!(dev.num_configurations(), 0);
}

#[test]
fn test_endpoint() {
    let ep = EndpointDescriptor::new(&[0x07, 0x05, 0x81, 0x03, 0x20, 0x00, 0x04]).unwrap();
    assert_eq!(ep.direction(), Direction::In);
    assert_eq!(ep.number(), 1);
    assert_eq!(ep.transfer_type(), EndpointType::Interrupt);
    assert_eq!(ep.max_packet_size(), 32);
    assert_eq!(ep.interval(), 4);

    let ep = EndpointDescriptor::new(&[0x07, 0x05, 0x02, 0x02, 0x00, 0x02, 0x00]).unwrap();
    assert_eq!(ep.direction(), Direction::Out);
    assert_eq!(ep.transfer_type(), EndpointType::Bulk);
    assert_eq!(ep.max_packet_size(), 512);
}

#[test]
fn test_hid_descriptor() {
    let hid = HidDescriptor::new(&[0x09, 0x21, 0x11, 0x01, 0x00, 0x01, 0x22, 0x3F, 0x01]).unwrap();
    assert_eq!(hid.hid_version(), 0x0111);
    assert_eq!(hid.country_code(), 0);
    assert_eq!(hid.num_descriptors(), 1);
    assert_eq!(hid.report_descriptor_type(), DESCRIPTOR_TYPE_HID_REPORT);
    assert_eq!(hid.report_descriptor_length(), 0x013F);

    assert!(matches!(
        HidDescriptor::new(&[0x06, 0x21, 0x11, 0x01, 0x00, 0x01]),
        Err(DecodeError::Truncated { needed: 9, actual: 6, .. })
    ));
}

#[test]
fn test_string_descriptors() {
    let langs = StringDescriptor::new(0, StringRole::LanguageIds, &[4, 3, 0x09, 0x04]).unwrap();
    assert_eq!(langs.language_ids().collect::<Vec<_>>(), vec![0x0409]);

    let s = StringDescriptor::new(
        2,
        StringRole::Product,
        &[10, 3, b'P', 0, b'a', 0, b'd', 0, 0x00, 0xD8],
    )
    .unwrap();
    assert_eq!(s.text(), "Pad\u{FFFD}");

    // bLength larger than the data received
    let s = StringDescriptor::new(1, StringRole::Manufacturer, &[0xFF, 3, b'M', 0]).unwrap();
    assert_eq!(s.text(), "M");

    let s = StringDescriptor::new(1, StringRole::Manufacturer, &[2, 3]).unwrap();
    assert_eq!(s.text(), "");
}
