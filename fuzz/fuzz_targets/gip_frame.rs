#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Some((header, offset)) = padscope::fuzz_parse_header(data) {
        assert!(offset <= 3 + 5);
        std::hint::black_box(header.encode());
    }
    if let Some(message) = padscope::gip::GipMessage::parse(data) {
        std::hint::black_box(message.decode());
    }
    std::hint::black_box(padscope::gip::ExtendedDescriptor::parse(data));
});
