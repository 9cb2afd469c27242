#![no_main]

use libfuzzer_sys::fuzz_target;
use voltage_s7::address;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(desc) = address::parse("fuzz", text) {
        // Accepted addresses always resolve to a usable field
        assert!(desc.byte_length >= 1);
        assert_eq!(desc.raw_address, text);
        assert_eq!(address::parse("fuzz", text).as_ref(), Ok(&desc));
    }
});
