//! Configuration descriptor walk and controller family classification.

use log::warn;

use crate::{
    descriptors::{
        ConfigurationDescriptor, DescriptorRecord, Direction, EndpointDescriptor, HidDescriptor,
        InterfaceDescriptor, RawDescriptor, DESCRIPTOR_TYPE_CONFIGURATION,
        DESCRIPTOR_TYPE_ENDPOINT, DESCRIPTOR_TYPE_HID, DESCRIPTOR_TYPE_HID_REPORT,
        DESCRIPTOR_TYPE_INTERFACE, DESCRIPTOR_TYPE_XINPUT_AUTH,
    },
    error::DecodeError,
};

pub const INTERFACE_CLASS_HID: u8 = 0x03;
pub const INTERFACE_CLASS_XID: u8 = 0x58;
pub const INTERFACE_CLASS_XID_AUDIO: u8 = 0x78;
pub const INTERFACE_CLASS_VENDOR: u8 = 0xFF;

pub const INTERFACE_SUBCLASS_XID: u8 = 0x42;
pub const INTERFACE_SUBCLASS_XGIP: u8 = 0x47;
pub const INTERFACE_SUBCLASS_XINPUT: u8 = 0x5D;
pub const INTERFACE_SUBCLASS_XINPUT_AUTH: u8 = 0xFD;

pub const INTERFACE_PROTOCOL_XINPUT_HID: u8 = 0x01;
pub const INTERFACE_PROTOCOL_XINPUT_PLUGIN: u8 = 0x02;
pub const INTERFACE_PROTOCOL_XINPUT_AUDIO: u8 = 0x03;

/// Controller family a configuration belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DeviceFamily {
    #[default]
    Unknown,

    /// Xbox 360 wired controllers and accessories.
    XInput,

    /// Original Xbox controllers.
    Xid,

    /// Xbox One / Series controllers speaking GIP.
    Xgip,

    /// Generic HID devices.
    Hid,
}

impl DeviceFamily {
    /// Classify one interface by its class and subclass.
    pub fn classify(class: u8, subclass: u8) -> DeviceFamily {
        match (class, subclass) {
            (INTERFACE_CLASS_VENDOR, INTERFACE_SUBCLASS_XINPUT | INTERFACE_SUBCLASS_XINPUT_AUTH) => {
                DeviceFamily::XInput
            }
            (INTERFACE_CLASS_VENDOR, INTERFACE_SUBCLASS_XGIP) => DeviceFamily::Xgip,
            (INTERFACE_CLASS_XID, INTERFACE_SUBCLASS_XID) => DeviceFamily::Xid,
            (INTERFACE_CLASS_XID_AUDIO, _) => DeviceFamily::Xid,
            (INTERFACE_CLASS_HID, _) => DeviceFamily::Hid,
            _ => DeviceFamily::Unknown,
        }
    }
}

/// Name of the vendor overlay an XInput interface puts under the HID tag.
fn xinput_class_name(protocol: u8) -> &'static str {
    match protocol {
        INTERFACE_PROTOCOL_XINPUT_HID => "XInput HID Class",
        INTERFACE_PROTOCOL_XINPUT_AUDIO => "XInput Audio Class",
        INTERFACE_PROTOCOL_XINPUT_PLUGIN => "XInput Plugin Class",
        _ => "XInput Unknown Class",
    }
}

/// A HID interface paired with the report descriptor length its HID
/// descriptor advertises.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HidReportRef {
    pub interface_number: u8,
    pub report_length: u16,
}

/// One configuration, decoded into an ordered list of descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationModel {
    configuration_value: u8,
    family: DeviceFamily,
    records: Vec<DescriptorRecord>,
}

impl ConfigurationModel {
    /// Decode a configuration descriptor set.
    ///
    /// `buf` must start with the 9-byte configuration header; its
    /// `wTotalLength` bounds the walk. Bytes past `wTotalLength` are ignored.
    pub fn decode(buf: &[u8]) -> Result<ConfigurationModel, DecodeError> {
        let total_len = declared_total_length(buf)?;
        let mut walker = Walker::default();
        let mut pos = 0;

        while pos < total_len {
            let remaining = &buf[pos..total_len];
            if remaining.len() < 2 {
                return Err(DecodeError::Truncated {
                    what: "descriptor header",
                    needed: 2,
                    actual: remaining.len(),
                });
            }

            let len = remaining[0];
            if len < 2 || len as usize > remaining.len() {
                return Err(DecodeError::MalformedLength {
                    offset: pos,
                    length: len,
                });
            }

            walker.step(&remaining[..len as usize])?;
            pos += len as usize;
        }

        debug_assert_eq!(pos, total_len);

        Ok(ConfigurationModel {
            configuration_value: walker.configuration_value,
            family: walker.family,
            records: walker.records,
        })
    }

    /// `bConfigurationValue` of the configuration header, or 0 if there was none.
    pub fn configuration_value(&self) -> u8 {
        self.configuration_value
    }

    pub fn family(&self) -> DeviceFamily {
        self.family
    }

    /// All descriptors in stream order.
    pub fn records(&self) -> &[DescriptorRecord] {
        &self.records
    }

    /// The configuration header, if the stream contained one.
    pub fn header(&self) -> Option<&ConfigurationDescriptor> {
        self.records.iter().find_map(|r| match r {
            DescriptorRecord::Configuration(c) => Some(c),
            _ => None,
        })
    }

    /// Iterate the interface descriptors.
    pub fn interfaces(&self) -> impl Iterator<Item = &InterfaceDescriptor> {
        self.records.iter().filter_map(|r| match r {
            DescriptorRecord::Interface(i) => Some(i),
            _ => None,
        })
    }

    /// Iterate the endpoint descriptors.
    pub fn endpoints(&self) -> impl Iterator<Item = &EndpointDescriptor> {
        self.records.iter().filter_map(|r| match r {
            DescriptorRecord::Endpoint(e) => Some(e),
            _ => None,
        })
    }

    /// First endpoint in the given direction.
    pub fn first_endpoint(&self, direction: Direction) -> Option<&EndpointDescriptor> {
        self.endpoints().find(|e| e.direction() == direction)
    }

    /// Pair each HID-class interface with the report descriptors advertised by
    /// the HID descriptors that follow it, up to the next interface.
    pub fn hid_reports(&self) -> Vec<HidReportRef> {
        let mut reports = Vec::new();

        for (i, record) in self.records.iter().enumerate() {
            let DescriptorRecord::Interface(intf) = record else {
                continue;
            };
            if intf.class() != INTERFACE_CLASS_HID {
                continue;
            }

            for next in &self.records[i + 1..] {
                match next {
                    DescriptorRecord::Interface(_) => break,
                    DescriptorRecord::Hid(hid)
                        if hid.report_descriptor_type() == DESCRIPTOR_TYPE_HID_REPORT =>
                    {
                        reports.push(HidReportRef {
                            interface_number: intf.interface_number(),
                            report_length: hid.report_descriptor_length(),
                        });
                    }
                    _ => {}
                }
            }
        }

        reports
    }
}

/// Read `wTotalLength` and check it against the buffer.
fn declared_total_length(buf: &[u8]) -> Result<usize, DecodeError> {
    if buf.len() < 4 {
        return Err(DecodeError::Truncated {
            what: "configuration descriptor",
            needed: 4,
            actual: buf.len(),
        });
    }

    let total_len = u16::from_le_bytes([buf[2], buf[3]]) as usize;
    if total_len > buf.len() {
        warn!(
            "invalid config descriptor wTotalLen of {total_len} (buffer size is {bufsize})",
            bufsize = buf.len()
        );
        return Err(DecodeError::SizeMismatch {
            declared: total_len,
            actual: buf.len(),
        });
    }

    Ok(total_len)
}

/// State carried across one walk of a configuration.
#[derive(Default)]
struct Walker {
    configuration_value: u8,
    family: DeviceFamily,
    /// `bInterfaceProtocol` of the most recent interface.
    protocol: u8,
    records: Vec<DescriptorRecord>,
}

impl Walker {
    /// Decode one descriptor; `desc` is exactly `bLength` bytes.
    fn step(&mut self, desc: &[u8]) -> Result<(), DecodeError> {
        let record = match desc[1] {
            DESCRIPTOR_TYPE_CONFIGURATION => {
                let c = ConfigurationDescriptor::new(desc)?;
                self.configuration_value = c.configuration_value();
                DescriptorRecord::Configuration(c)
            }

            DESCRIPTOR_TYPE_INTERFACE => {
                let i = InterfaceDescriptor::new(desc)?;
                self.protocol = i.protocol();
                if self.family == DeviceFamily::Unknown {
                    self.family = DeviceFamily::classify(i.class(), i.subclass());
                }
                DescriptorRecord::Interface(i)
            }

            DESCRIPTOR_TYPE_ENDPOINT => DescriptorRecord::Endpoint(EndpointDescriptor::new(desc)?),

            DESCRIPTOR_TYPE_HID if self.family == DeviceFamily::XInput => {
                DescriptorRecord::VendorOverlay(RawDescriptor::new(
                    xinput_class_name(self.protocol),
                    desc,
                )?)
            }

            DESCRIPTOR_TYPE_HID => DescriptorRecord::Hid(HidDescriptor::new(desc)?),

            DESCRIPTOR_TYPE_XINPUT_AUTH if self.family == DeviceFamily::XInput => {
                DescriptorRecord::VendorOverlay(RawDescriptor::new("XInput Auth", desc)?)
            }

            _ => DescriptorRecord::Unknown(RawDescriptor::new("Unknown Descriptor", desc)?),
        };

        self.records.push(record);
        Ok(())
    }
}

/// Make public when fuzzing
#[cfg(fuzzing)]
pub fn fuzz_decode_configuration(buf: &[u8]) -> Result<ConfigurationModel, DecodeError> {
    ConfigurationModel::decode(buf)
}
