//! Scripted transport and fixture builders for unit tests.

use std::{
    collections::{HashMap, VecDeque},
    time::Duration,
};

use crate::{
    error::{TransportError, TransportErrorKind},
    Transport,
};

/// Something the code under test asked the transport to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    Write(u8, Vec<u8>),
    Read(u8),
    Delay(Duration),
    ClassDescriptor { interface_number: u8, max_len: usize },
}

/// A transport that answers descriptor requests from tables and endpoint reads
/// from per-endpoint queues. Reads from an empty queue time out.
#[derive(Default)]
pub(crate) struct MockTransport {
    pub device: Option<Vec<u8>>,
    pub configs: HashMap<u8, Vec<u8>>,
    pub strings: HashMap<(u8, u16), Vec<u8>>,
    pub class_descriptors: HashMap<u8, Vec<u8>>,
    pub reads: HashMap<u8, VecDeque<Result<Vec<u8>, TransportError>>>,
    pub fail_writes: bool,
    pub events: Vec<Event>,
}

fn stall() -> TransportError {
    TransportError::new(TransportErrorKind::Stall, "endpoint STALL condition")
}

impl MockTransport {
    pub fn queue_read(&mut self, endpoint: u8, frame: &[u8]) {
        self.reads
            .entry(endpoint)
            .or_default()
            .push_back(Ok(frame.to_vec()));
    }

    pub fn queue_error(&mut self, endpoint: u8, err: TransportError) {
        self.reads.entry(endpoint).or_default().push_back(Err(err));
    }

    pub fn pending_reads(&self, endpoint: u8) -> usize {
        self.reads.get(&endpoint).map_or(0, |q| q.len())
    }

    pub fn writes(&self, endpoint: u8) -> Vec<Vec<u8>> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Write(ep, data) if *ep == endpoint => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn reads(&self, endpoint: u8) -> usize {
        self.events
            .iter()
            .filter(|e| **e == Event::Read(endpoint))
            .count()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Delay(d) => Some(*d),
                _ => None,
            })
            .collect()
    }
}

fn truncated(data: &[u8], max_len: usize) -> Vec<u8> {
    data[..data.len().min(max_len)].to_vec()
}

impl Transport for MockTransport {
    fn get_device_descriptor(&mut self, max_len: usize) -> Result<Vec<u8>, TransportError> {
        self.device
            .as_deref()
            .map(|d| truncated(d, max_len))
            .ok_or_else(stall)
    }

    fn get_config_descriptor(
        &mut self,
        index: u8,
        max_len: usize,
    ) -> Result<Vec<u8>, TransportError> {
        self.configs
            .get(&index)
            .map(|d| truncated(d, max_len))
            .ok_or_else(stall)
    }

    fn get_string_descriptor(
        &mut self,
        index: u8,
        language_id: u16,
        max_len: usize,
    ) -> Result<Vec<u8>, TransportError> {
        self.strings
            .get(&(index, language_id))
            .map(|d| truncated(d, max_len))
            .ok_or_else(stall)
    }

    fn get_class_descriptor(
        &mut self,
        interface_number: u8,
        max_len: usize,
    ) -> Result<Vec<u8>, TransportError> {
        self.events.push(Event::ClassDescriptor {
            interface_number,
            max_len,
        });
        self.class_descriptors
            .get(&interface_number)
            .map(|d| truncated(d, max_len))
            .ok_or_else(stall)
    }

    fn write(
        &mut self,
        endpoint: u8,
        data: &[u8],
        _timeout: Duration,
    ) -> Result<(), TransportError> {
        if self.fail_writes {
            return Err(stall());
        }
        self.events.push(Event::Write(endpoint, data.to_vec()));
        Ok(())
    }

    fn read(
        &mut self,
        endpoint: u8,
        max_len: usize,
        _timeout: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        self.events.push(Event::Read(endpoint));
        match self.reads.get_mut(&endpoint).and_then(|q| q.pop_front()) {
            Some(Ok(frame)) => Ok(truncated(&frame, max_len)),
            Some(Err(e)) => Err(e),
            None => Err(TransportError::timeout()),
        }
    }

    fn delay(&mut self, duration: Duration) {
        self.events.push(Event::Delay(duration));
    }
}

/// Build a configuration set from its trailing descriptors, filling in `wTotalLength`.
pub(crate) fn config(value: u8, rest: &[&[u8]]) -> Vec<u8> {
    let mut buf = vec![0x09, 0x02, 0, 0, 1, value, 0, 0x80, 0xFA];
    for d in rest {
        buf.extend_from_slice(d);
    }
    let total = (buf.len() as u16).to_le_bytes();
    buf[2] = total[0];
    buf[3] = total[1];
    buf
}

pub(crate) const fn interface(number: u8, class: u8, subclass: u8, protocol: u8) -> [u8; 9] {
    [0x09, 0x04, number, 0, 2, class, subclass, protocol, 0]
}

/// UTF-16LE string descriptor.
pub(crate) fn string(s: &str) -> Vec<u8> {
    let mut buf = vec![0, 0x03];
    for c in s.encode_utf16() {
        buf.extend_from_slice(&c.to_le_bytes());
    }
    buf[0] = buf.len() as u8;
    buf
}
