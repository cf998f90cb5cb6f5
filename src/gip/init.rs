//! Frames that bring an XGIP controller up far enough to answer descriptor requests.

pub const POWER_ON: [u8; 6] = [0x05, 0x20, 0x00, 0x01, 0x00, 0x00];

#[rustfmt::skip]
pub const ENABLE_1: [u8; 19] = [
    0x05, 0x20, 0x00, 0x0F, 0x06, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x55, 0x53, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

pub const LED_ON: [u8; 7] = [0x0A, 0x20, 0x00, 0x03, 0x00, 0x01, 0x14];

pub const ENABLE_2: [u8; 6] = [0x4D, 0x10, 0x00, 0x02, 0x07, 0x00];

/// The initialization frames in the order they are sent.
pub const INIT_SEQUENCE: [&[u8]; 4] = [&POWER_ON, &ENABLE_1, &LED_ON, &ENABLE_2];
