#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use voltage_s7::{decode_value, encode_value, AddressDescriptor, TaggedValue};

#[derive(Debug, Arbitrary)]
struct Input {
    kind: u8,
    suffix: u16,
    data: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let address = match input.kind % 6 {
        0 => format!("DB1,X0.{}", input.suffix),
        1 => "DB1,B0".to_string(),
        2 => "DB1,INT0".to_string(),
        3 => "DB1,DINT0".to_string(),
        4 => "DB1,DT0".to_string(),
        _ => format!("DB1,STRING0.{}", input.suffix),
    };
    let Ok(desc) = AddressDescriptor::parse("fuzz", &address) else {
        return;
    };

    let Ok(value) = decode_value(&desc, &input.data) else {
        return;
    };

    // Strings and in-range timestamps re-encode to a value that decodes the same
    if let Ok(bytes) = encode_value(&desc, &value) {
        let again = decode_value(&desc, &bytes).expect("re-encoded field decodes");
        if !matches!(value, TaggedValue::Text(_)) {
            assert_eq!(again, value);
        }
    }
});
