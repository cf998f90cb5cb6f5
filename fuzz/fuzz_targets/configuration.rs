#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = padscope::fuzz_decode_configuration(data) {
        let s = format!("{config:?}");
        std::hint::black_box(s);
        std::hint::black_box(config.hid_reports());
    }
});
