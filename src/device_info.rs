//! Collect everything a device will tell us about itself into one [`DeviceModel`].

use std::fmt::Debug;

use log::{debug, warn};

use crate::{
    configuration::{ConfigurationModel, DeviceFamily},
    descriptors::{
        language_id, DescriptorRecord, DeviceDescriptor, Direction, StringDescriptor, StringRole,
        DESCRIPTOR_TYPE_HID_REPORT, DESCRIPTOR_TYPE_XGIP_ARTIFACT,
    },
    error::{Error, GipError},
    gip::{self, ExtendedDescriptor},
    settings::Settings,
    Transport,
};

/// String index of the Microsoft OS string descriptor.
const MS_OS_STRING_INDEX: u8 = 0xEE;
const MS_OS_STRING_LEN: usize = 0x12;

/// A named blob fetched from the device outside the standard descriptor set:
/// a HID report descriptor, or an artifact of the XGIP exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct ReportRecord {
    pub name: String,
    pub descriptor_type: u8,
    pub interface_number: u8,
    pub data: Vec<u8>,
}

impl ReportRecord {
    fn xgip(name: impl Into<String>, data: Vec<u8>) -> ReportRecord {
        ReportRecord {
            name: name.into(),
            descriptor_type: DESCRIPTOR_TYPE_XGIP_ARTIFACT,
            interface_number: 0,
            data,
        }
    }
}

impl Debug for ReportRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportRecord")
            .field("name", &self.name)
            .field("descriptor_type", &format_args!("0x{:02X}", self.descriptor_type))
            .field("interface_number", &self.interface_number)
            .field("data", &format_args!("{:02x?}", self.data))
            .finish()
    }
}

/// Descriptors, strings and reports read from one device.
///
/// Any part other than the device descriptor may be incomplete: configurations
/// that fail to fetch or decode are left out, as are strings and reports the
/// device did not return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceModel {
    device: DeviceDescriptor,
    configurations: Vec<ConfigurationModel>,
    strings: Vec<StringDescriptor>,
    reports: Vec<ReportRecord>,
}

impl DeviceModel {
    pub fn device(&self) -> &DeviceDescriptor {
        &self.device
    }

    pub fn configurations(&self) -> &[ConfigurationModel] {
        &self.configurations
    }

    /// Language ID list first, if the device returned one, then the
    /// manufacturer, product, serial number and interface strings.
    pub fn strings(&self) -> &[StringDescriptor] {
        &self.strings
    }

    pub fn reports(&self) -> &[ReportRecord] {
        &self.reports
    }

    /// Family of the first configuration that has one.
    pub fn family(&self) -> DeviceFamily {
        self.configurations
            .iter()
            .map(|c| c.family())
            .find(|&f| f != DeviceFamily::Unknown)
            .unwrap_or_default()
    }

    pub fn string(&self, role: StringRole) -> Option<&StringDescriptor> {
        self.strings.iter().find(|s| s.role() == role)
    }

    pub fn report(&self, name: &str) -> Option<&ReportRecord> {
        self.reports.iter().find(|r| r.name == name)
    }

    /// All descriptors in dump order: device, each configuration's records,
    /// then strings.
    pub fn descriptors(&self) -> Vec<DescriptorRecord> {
        std::iter::once(DescriptorRecord::Device(self.device.clone()))
            .chain(
                self.configurations
                    .iter()
                    .flat_map(|c| c.records().iter().cloned()),
            )
            .chain(self.strings.iter().cloned().map(DescriptorRecord::String))
            .collect()
    }
}

/// Read and decode everything the device exposes, with default [`Settings`].
pub fn get_device_info<T: Transport + ?Sized>(transport: &mut T) -> Result<DeviceModel, Error> {
    get_device_info_with(transport, &Settings::default())
}

/// Read and decode everything the device exposes.
///
/// Only a failure to read the device descriptor is an error. Everything after
/// that is best-effort and logged when it fails.
pub fn get_device_info_with<T: Transport + ?Sized>(
    transport: &mut T,
    settings: &Settings,
) -> Result<DeviceModel, Error> {
    let device_data = transport.get_device_descriptor(settings.device_max_len)?;
    let device = DeviceDescriptor::from_padded(&device_data);

    let mut configurations = Vec::new();
    for index in 0..device.num_configurations() {
        let buf = match transport.get_config_descriptor(index, settings.config_max_len) {
            Ok(buf) => buf,
            Err(e) => {
                warn!("could not get configuration descriptor {index}: {e}");
                continue;
            }
        };
        match ConfigurationModel::decode(&buf) {
            Ok(c) => configurations.push(c),
            Err(e) => warn!("could not decode configuration descriptor {index}: {e}"),
        }
    }

    let strings = fetch_strings(transport, &device, configurations.first(), settings);

    let mut reports = Vec::new();
    for configuration in &configurations {
        match configuration.family() {
            DeviceFamily::Hid => fetch_hid_reports(transport, configuration, &mut reports),
            DeviceFamily::Xgip => fetch_xgip(transport, configuration, settings, &mut reports),
            _ => {}
        }
    }

    Ok(DeviceModel {
        device,
        configurations,
        strings,
        reports,
    })
}

fn fetch_strings<T: Transport + ?Sized>(
    transport: &mut T,
    device: &DeviceDescriptor,
    first_configuration: Option<&ConfigurationModel>,
    settings: &Settings,
) -> Vec<StringDescriptor> {
    let mut strings = Vec::new();

    let mut language = language_id::US_ENGLISH;
    match transport.get_string_descriptor(0, 0, settings.string_max_len) {
        Ok(data) if data.len() >= 4 => {
            language = u16::from_le_bytes([data[2], data[3]]);
            if let Ok(s) = StringDescriptor::new(0, StringRole::LanguageIds, &data) {
                strings.push(s);
            }
        }
        _ => warn!("could not get language ID string descriptor, using default 0x0409"),
    }

    let mut wanted = vec![
        (device.manufacturer_string_index(), StringRole::Manufacturer),
        (device.product_string_index(), StringRole::Product),
        (device.serial_number_string_index(), StringRole::SerialNumber),
    ];
    if let Some(c) = first_configuration {
        wanted.extend(
            c.interfaces()
                .map(|i| (i.string_index(), StringRole::Interface(i.interface_number()))),
        );
    }

    for (index, role) in wanted {
        let Some(index) = index else { continue };
        let fetched = transport
            .get_string_descriptor(index, language, settings.string_max_len)
            .map_err(Error::from)
            .and_then(|data| Ok(StringDescriptor::new(index, role, &data)?));
        match fetched {
            Ok(s) => strings.push(s),
            Err(e) => debug!("could not get string descriptor {index} ({role:?}): {e}"),
        }
    }

    strings
}

fn fetch_hid_reports<T: Transport + ?Sized>(
    transport: &mut T,
    configuration: &ConfigurationModel,
    reports: &mut Vec<ReportRecord>,
) {
    for r in configuration.hid_reports() {
        match transport.get_class_descriptor(r.interface_number, r.report_length as usize) {
            Ok(data) if !data.is_empty() => reports.push(ReportRecord {
                name: "Report Descriptor".into(),
                descriptor_type: DESCRIPTOR_TYPE_HID_REPORT,
                interface_number: r.interface_number,
                data,
            }),
            Ok(_) => debug!("empty report descriptor on interface {}", r.interface_number),
            Err(e) => warn!(
                "could not get report descriptor for interface {}: {e}",
                r.interface_number
            ),
        }
    }
}

fn fetch_xgip<T: Transport + ?Sized>(
    transport: &mut T,
    configuration: &ConfigurationModel,
    settings: &Settings,
    reports: &mut Vec<ReportRecord>,
) {
    let ep_out = configuration
        .first_endpoint(Direction::Out)
        .map_or(gip::DEFAULT_OUT_ENDPOINT, |e| e.number());

    if let Err(e) = gip::initialize(transport, ep_out, settings) {
        warn!("XGIP initialization on endpoint {ep_out:02x} failed: {e}");
    }

    match gip::request_descriptor(transport, ep_out, settings) {
        Ok(combined) => match ExtendedDescriptor::parse(&combined) {
            Some(extended) => {
                debug!("XGIP descriptor: {extended:?}");
                reports.push(ReportRecord::xgip("XGIP_DESCRIPTOR", combined));
                if let Some(hid) = extended.hid_descriptor {
                    reports.push(ReportRecord::xgip("XGIP_HID_DESCRIPTOR", hid));
                }
            }
            None => debug!("XGIP descriptor too short ({} bytes)", combined.len()),
        },
        Err(GipError::Incomplete { frames, partial }) => {
            warn!("XGIP descriptor incomplete after {frames} frames");
            if !partial.is_empty() {
                reports.push(ReportRecord::xgip("XGIP_DESCRIPTOR_PARTIAL", partial));
            }
        }
        Err(e) => warn!("could not get XGIP descriptor: {e}"),
    }

    if settings.fetch_os_descriptor {
        match transport.get_string_descriptor(MS_OS_STRING_INDEX, 0, MS_OS_STRING_LEN) {
            Ok(data) if data.len() > 2 => reports.push(ReportRecord::xgip("MS_OS_DESC", data)),
            Ok(_) => debug!("empty Microsoft OS string descriptor"),
            Err(e) => debug!("no Microsoft OS string descriptor: {e}"),
        }
    }

    if settings.collect_messages {
        let messages = gip::read_messages(transport, gip::MESSAGE_ENDPOINT, settings);
        for (i, message) in messages.into_iter().enumerate() {
            debug!("XGIP_MSG_{i}: {}", message.decode().name());
            reports.push(ReportRecord::xgip(
                format!("XGIP_MSG_{i}"),
                message.raw().to_vec(),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        gip::init,
        test_util::{config, interface, string, Event, MockTransport},
    };

    #[rustfmt::skip]
    const XBOX360_DEVICE: [u8; 18] = [
        0x12, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x40, 0x5E, 0x04,
        0x8E, 0x02, 0x00, 0x01, 0x01, 0x02, 0x00, 0x01,
    ];

    fn device(num_configurations: u8) -> Vec<u8> {
        let mut d = XBOX360_DEVICE.to_vec();
        d[17] = num_configurations;
        d
    }

    fn transport_with_strings() -> MockTransport {
        let mut t = MockTransport {
            device: Some(XBOX360_DEVICE.to_vec()),
            ..Default::default()
        };
        t.strings.insert((0, 0), vec![0x04, 0x03, 0x09, 0x04]);
        t.strings.insert((1, 0x0409), string("Microsoft"));
        t.strings.insert((2, 0x0409), string("Controller"));
        t
    }

    #[test]
    fn test_no_device_descriptor() {
        let mut t = MockTransport::default();
        assert!(matches!(
            get_device_info(&mut t),
            Err(Error::Transport(_))
        ));
    }

    #[test]
    fn test_short_device_descriptor() {
        let mut t = MockTransport {
            device: Some(XBOX360_DEVICE[..8].to_vec()),
            ..Default::default()
        };
        let info = get_device_info(&mut t).unwrap();
        assert_eq!(info.device().usb_version(), 0x0200);
        assert_eq!(info.device().vendor_id(), 0);
        assert_eq!(info.device().num_configurations(), 0);
        assert!(info.configurations().is_empty());
        assert!(info.strings().is_empty());
    }

    #[test]
    fn test_strings() {
        let mut t = transport_with_strings();
        let mut intf = interface(0, 0xFF, 0x5D, 0x01);
        intf[8] = 4;
        t.configs.insert(0, config(1, &[&intf]));
        t.strings.insert((4, 0x0409), string("Gamepad"));

        let info = get_device_info(&mut t).unwrap();
        let roles: Vec<_> = info.strings().iter().map(|s| s.role()).collect();
        assert_eq!(
            roles,
            vec![
                StringRole::LanguageIds,
                StringRole::Manufacturer,
                StringRole::Product,
                StringRole::Interface(0),
            ]
        );
        assert_eq!(
            info.string(StringRole::LanguageIds)
                .unwrap()
                .language_ids()
                .collect::<Vec<_>>(),
            vec![0x0409]
        );
        assert_eq!(info.string(StringRole::Product).unwrap().text(), "Controller");
        assert_eq!(info.string(StringRole::Interface(0)).unwrap().index(), 4);
        assert_eq!(info.family(), DeviceFamily::XInput);
        assert!(info.reports().is_empty());

        let descriptors = info.descriptors();
        assert_eq!(descriptors.len(), 1 + 2 + 4);
        assert!(matches!(descriptors[0], DescriptorRecord::Device(_)));
        assert!(matches!(descriptors[2], DescriptorRecord::Interface(_)));
        assert!(matches!(descriptors[6], DescriptorRecord::String(_)));
    }

    #[test]
    fn test_default_language() {
        let mut t = transport_with_strings();
        t.strings.remove(&(0, 0));
        let info = get_device_info(&mut t).unwrap();
        assert_eq!(info.strings().len(), 2);
        assert_eq!(info.string(StringRole::Manufacturer).unwrap().text(), "Microsoft");
        assert!(info.string(StringRole::LanguageIds).is_none());
    }

    #[test]
    fn test_other_language() {
        let mut t = transport_with_strings();
        t.strings.insert((0, 0), vec![0x04, 0x03, 0x07, 0x04]);
        t.strings.insert((1, 0x0407), string("Hersteller"));
        let info = get_device_info(&mut t).unwrap();
        assert_eq!(info.string(StringRole::Manufacturer).unwrap().text(), "Hersteller");
        // product is only available in English
        assert!(info.string(StringRole::Product).is_none());
    }

    #[test]
    fn test_skipped_configurations() {
        let mut t = MockTransport {
            device: Some(device(3)),
            ..Default::default()
        };
        // 0 is missing, 1 has a zero-length descriptor
        t.configs.insert(1, config(2, &[&[0x00, 0x04, 0, 0, 0, 0, 0, 0, 0]]));
        t.configs.insert(2, config(3, &[&interface(0, 0x03, 0, 0)]));

        let info = get_device_info(&mut t).unwrap();
        assert_eq!(info.configurations().len(), 1);
        assert_eq!(info.configurations()[0].configuration_value(), 3);
        assert_eq!(info.family(), DeviceFamily::Hid);
    }

    #[test]
    fn test_hid_report_descriptor() {
        let mut t = MockTransport {
            device: Some(device(1)),
            ..Default::default()
        };
        t.configs.insert(
            0,
            config(
                1,
                &[
                    &interface(0, 0x03, 0x00, 0x00),
                    &[0x09, 0x21, 0x11, 0x01, 0x00, 0x01, 0x22, 0x40, 0x00],
                    &[0x07, 0x05, 0x81, 0x03, 0x40, 0x00, 0x01],
                    &interface(1, 0x03, 0x00, 0x00),
                    &[0x09, 0x21, 0x11, 0x01, 0x00, 0x01, 0x22, 0x20, 0x00],
                ],
            ),
        );
        t.class_descriptors.insert(0, vec![0x05, 0x01, 0x09, 0x05]);

        let info = get_device_info(&mut t).unwrap();
        assert!(t.events.contains(&Event::ClassDescriptor {
            interface_number: 0,
            max_len: 0x40
        }));
        assert!(t.events.contains(&Event::ClassDescriptor {
            interface_number: 1,
            max_len: 0x20
        }));

        // interface 1 stalled
        assert_eq!(
            info.reports(),
            &[ReportRecord {
                name: "Report Descriptor".into(),
                descriptor_type: 0x22,
                interface_number: 0,
                data: vec![0x05, 0x01, 0x09, 0x05],
            }]
        );
        assert!(t.writes(0x02).is_empty());
    }

    fn xgip_transport() -> MockTransport {
        let mut t = MockTransport {
            device: Some(device(1)),
            ..Default::default()
        };
        t.configs.insert(
            0,
            config(
                1,
                &[
                    &interface(0, 0xFF, 0x47, 0xD0),
                    &[0x07, 0x05, 0x02, 0x03, 0x40, 0x00, 0x04],
                    &[0x07, 0x05, 0x82, 0x03, 0x40, 0x00, 0x04],
                ],
            ),
        );
        t
    }

    /// 40 byte descriptor: 10 byte header, HID descriptor offset 20
    fn xgip_descriptor() -> Vec<u8> {
        let mut d = vec![0; 40];
        d[0] = 10;
        d[8] = 40;
        d[24] = 20;
        d[30] = 3;
        d[31..34].copy_from_slice(&[0x05, 0x01, 0x09]);
        d
    }

    #[test]
    fn test_xgip() {
        let mut t = xgip_transport();
        let d = xgip_descriptor();
        t.queue_read(0x82, &[&[0x04, 0xF0, 0x01, 0x3A][..], &d[..20]].concat());
        t.queue_read(0x82, &[0x01, 0x20, 0x01, 0x09, 0, 4, 0x20, 20, 0, 0, 0, 20, 0]);
        t.queue_read(0x82, &[&[0x04, 0x20, 0x02, 0x14][..], &d[20..]].concat());
        t.queue_read(0x82, &[0x03, 0x20, 0x03, 0x04, 0x05, 0, 0, 0]);

        #[rustfmt::skip]
        let os_string = vec![
            0x12, 0x03, 0x4D, 0x00, 0x53, 0x00, 0x46, 0x00, 0x54, 0x00,
            0x31, 0x00, 0x30, 0x00, 0x30, 0x00, 0x90, 0x00,
        ];
        t.strings.insert((0xEE, 0), os_string.clone());

        let info = get_device_info(&mut t).unwrap();
        assert_eq!(info.family(), DeviceFamily::Xgip);

        assert_eq!(
            t.writes(0x02),
            vec![
                init::POWER_ON.to_vec(),
                init::ENABLE_1.to_vec(),
                init::LED_ON.to_vec(),
                init::ENABLE_2.to_vec(),
                vec![0x04, 0x20, 0x01, 0x00],
            ]
        );

        // pacing after each init frame, then after each failed message read
        let pacing = Duration::from_millis(100);
        assert_eq!(t.delays(), vec![pacing; 4 + 4]);
        assert_eq!(t.events[..2], [Event::Write(0x02, init::POWER_ON.to_vec()), Event::Delay(pacing)]);

        let names: Vec<_> = info.reports().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["XGIP_DESCRIPTOR", "XGIP_HID_DESCRIPTOR", "MS_OS_DESC", "XGIP_MSG_0"]
        );
        assert!(info
            .reports()
            .iter()
            .all(|r| r.descriptor_type == 0xF0 && r.interface_number == 0));
        assert_eq!(info.report("XGIP_DESCRIPTOR").unwrap().data, d);
        assert_eq!(
            info.report("XGIP_HID_DESCRIPTOR").unwrap().data,
            vec![0x05, 0x01, 0x09]
        );
        assert_eq!(info.report("MS_OS_DESC").unwrap().data, os_string);
        assert_eq!(
            info.report("XGIP_MSG_0").unwrap().data,
            vec![0x03, 0x20, 0x03, 0x04, 0x05, 0, 0, 0]
        );
    }

    #[test]
    fn test_xgip_silent_device() {
        let mut t = xgip_transport();
        t.fail_writes = true;
        let settings = Settings {
            collect_messages: false,
            fetch_os_descriptor: false,
            ..Default::default()
        };

        let info = get_device_info_with(&mut t, &settings).unwrap();
        assert_eq!(info.configurations().len(), 1);
        assert!(info.reports().is_empty());
        assert_eq!(t.reads(0x82), 0);
    }

    #[test]
    fn test_xgip_partial_descriptor() {
        let mut t = xgip_transport();
        t.queue_read(0x82, &[0x04, 0xF0, 0x01, 0x3A, 1, 2, 3]);
        let settings = Settings {
            chunk_retries: 2,
            message_reads: 0,
            ..Default::default()
        };

        let info = get_device_info_with(&mut t, &settings).unwrap();
        assert_eq!(
            info.reports(),
            &[ReportRecord::xgip("XGIP_DESCRIPTOR_PARTIAL", vec![1, 2, 3])]
        );
    }

    #[test]
    fn test_xgip_short_descriptor() {
        let mut t = xgip_transport();
        t.queue_read(0x82, &[0x04, 0x20, 0x01, 0x05, 1, 2, 3, 4, 5]);
        let settings = Settings {
            collect_messages: false,
            ..Default::default()
        };

        let info = get_device_info_with(&mut t, &settings).unwrap();
        assert!(info.reports().is_empty());
    }
}
