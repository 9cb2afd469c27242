//! # Data Block Codec
//!
//! Encoding and decoding of data-block fields. All offsets are relative to
//! the start of the field; placing the field within the block is the tag's
//! job.
//!
//! ## Field Layouts
//!
//! | Type | Bytes | Layout |
//! |------|-------|--------|
//! | Bit | 1 | bit `n` of byte 0 |
//! | Byte | 1 | unsigned |
//! | ShortInt | 2 | signed, big-endian |
//! | LongInt | 4 | signed, big-endian |
//! | Timestamp | 8 | DATE_AND_TIME, BCD |
//! | String | max + 2 | `[max][len][chars...]` |
//!
//! ## DATE_AND_TIME
//!
//! ```text
//! byte:  0     1      2    3     4       5       6        7
//!        year  month  day  hour  minute  second  ms/10    ms%10 | weekday
//! ```
//!
//! Every byte is BCD. Years below 90 are 20xx. The weekday nibble counts
//! from 1 = Sunday.

use bytes::{Buf, BufMut};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::address::{AddressDescriptor, LogicalType};
use crate::constants::{
    BITS_PER_BYTE, DATE_AND_TIME_LEN, DATE_AND_TIME_MAX_YEAR, DATE_AND_TIME_MIN_YEAR,
    DATE_AND_TIME_YEAR_PIVOT, MAX_STRING_LENGTH, STRING_CUR_LEN_OFFSET, STRING_HEADER_LEN,
    STRING_MAX_LEN_OFFSET,
};
use crate::error::{DecodeError, EncodeError};
use crate::value::TaggedValue;

// ============================================================================
// Validation
// ============================================================================

/// Check the parts of a descriptor the parser does not range-check.
///
/// Bit indices must be 0-7 and string capacities must fit the one-byte
/// header.
pub fn validate_descriptor(desc: &AddressDescriptor) -> Result<(), DecodeError> {
    match desc.logical_type {
        LogicalType::Bit if desc.bit_offset >= BITS_PER_BYTE => Err(DecodeError::BitOutOfRange {
            bit: desc.bit_offset,
        }),
        LogicalType::String if desc.max_string_length > MAX_STRING_LENGTH => {
            Err(DecodeError::StringTooLong {
                length: desc.max_string_length,
            })
        }
        _ => Ok(()),
    }
}

fn validate_for_encode(desc: &AddressDescriptor) -> Result<(), EncodeError> {
    validate_descriptor(desc).map_err(|err| match err {
        DecodeError::BitOutOfRange { bit } => EncodeError::BitOutOfRange { bit },
        other => EncodeError::OutOfRange {
            message: other.to_string(),
        },
    })
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode a field from the start of `buffer`.
///
/// `buffer` must hold at least `desc.byte_length` bytes.
///
/// # Example
///
/// ```rust
/// use voltage_s7::{decode_value, AddressDescriptor, TaggedValue};
///
/// let desc = AddressDescriptor::parse("speed", "DB1,INT2").unwrap();
/// assert_eq!(decode_value(&desc, &[0xFF, 0x38]).unwrap(), TaggedValue::Int16(-200));
/// ```
pub fn decode_value(desc: &AddressDescriptor, buffer: &[u8]) -> Result<TaggedValue, DecodeError> {
    validate_descriptor(desc)?;

    let needed = desc.len();
    if buffer.len() < needed {
        return Err(DecodeError::BufferTooShort {
            needed,
            actual: buffer.len(),
        });
    }

    let mut data = &buffer[..needed];
    let value = match desc.logical_type {
        LogicalType::Bit => TaggedValue::Bool(get_bit(data[0], desc.bit_offset)),
        LogicalType::Byte => TaggedValue::Byte(data.get_u8()),
        LogicalType::ShortInt => TaggedValue::Int16(data.get_i16()),
        LogicalType::LongInt => TaggedValue::Int32(data.get_i32()),
        LogicalType::Timestamp => TaggedValue::Timestamp(decode_date_and_time(data)),
        LogicalType::String => TaggedValue::Text(decode_string(data)),
    };
    Ok(value)
}

/// Read bit `bit` (0 = LSB) of `byte`.
#[inline]
pub fn get_bit(byte: u8, bit: u32) -> bool {
    (byte >> bit) & 0x01 != 0
}

/// Decode a counted string. The current length is clamped to the data
/// present; invalid UTF-8 is replaced.
pub fn decode_string(data: &[u8]) -> String {
    if data.len() < STRING_HEADER_LEN {
        return String::new();
    }
    let available = data.len() - STRING_HEADER_LEN;
    let len = (data[STRING_CUR_LEN_OFFSET] as usize).min(available);
    let chars = &data[STRING_HEADER_LEN..STRING_HEADER_LEN + len];
    String::from_utf8_lossy(chars).into_owned()
}

/// Decode an 8-byte DATE_AND_TIME. Impossible dates and non-BCD digits
/// yield `NaiveDateTime::MIN`.
pub fn decode_date_and_time(data: &[u8]) -> NaiveDateTime {
    try_decode_date_and_time(data).unwrap_or(NaiveDateTime::MIN)
}

fn try_decode_date_and_time(data: &[u8]) -> Option<NaiveDateTime> {
    if data.len() < DATE_AND_TIME_LEN {
        return None;
    }

    let yy = from_bcd(data[0])?;
    let year = if yy < u32::from(DATE_AND_TIME_YEAR_PIVOT) {
        2000 + yy as i32
    } else {
        1900 + yy as i32
    };
    let month = from_bcd(data[1])?;
    let day = from_bcd(data[2])?;
    let hour = from_bcd(data[3])?;
    let minute = from_bcd(data[4])?;
    let second = from_bcd(data[5])?;
    // Low nibble of byte 7 is the weekday
    let millis = from_bcd(data[6])? * 10 + from_bcd(data[7] & 0xF0)? / 10;
    if millis > 999 || second > 59 {
        return None;
    }

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_milli_opt(hour, minute, second, millis)
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode a value into a freshly sized, zeroed buffer.
///
/// The value's variant must match the field's logical type; conversion is
/// the caller's job (see [`TaggedValue::convert_to`]).
///
/// # Example
///
/// ```rust
/// use voltage_s7::{encode_value, AddressDescriptor, TaggedValue};
///
/// let desc = AddressDescriptor::parse("label", "DB12,STRING60.10").unwrap();
/// let bytes = encode_value(&desc, &TaggedValue::from("test-1234567890")).unwrap();
/// assert_eq!(bytes[0], 10);
/// assert_eq!(bytes[1], 10);
/// assert_eq!(&bytes[2..], b"test-12345");
/// ```
pub fn encode_value(desc: &AddressDescriptor, value: &TaggedValue) -> Result<Vec<u8>, EncodeError> {
    validate_for_encode(desc)?;
    let mut buffer = vec![0u8; desc.len()];
    encode_value_into(desc, value, &mut buffer)?;
    Ok(buffer)
}

/// Encode a value into the start of `buffer`.
///
/// Only the field's bytes are written. For `Bit` only the target bit of
/// byte 0 changes.
pub fn encode_value_into(
    desc: &AddressDescriptor,
    value: &TaggedValue,
    buffer: &mut [u8],
) -> Result<(), EncodeError> {
    validate_for_encode(desc)?;

    let needed = desc.len();
    if buffer.len() < needed {
        return Err(EncodeError::BufferTooShort {
            needed,
            actual: buffer.len(),
        });
    }

    let mut out = &mut buffer[..needed];
    match (desc.logical_type, value) {
        (LogicalType::Bit, TaggedValue::Bool(v)) => {
            out[0] = set_bit(out[0], desc.bit_offset, *v);
        }
        (LogicalType::Byte, TaggedValue::Byte(v)) => out.put_u8(*v),
        (LogicalType::ShortInt, TaggedValue::Int16(v)) => out.put_i16(*v),
        (LogicalType::LongInt, TaggedValue::Int32(v)) => out.put_i32(*v),
        (LogicalType::Timestamp, TaggedValue::Timestamp(ts)) => {
            out.put_slice(&encode_date_and_time(ts)?);
        }
        (LogicalType::String, TaggedValue::Text(text)) => {
            encode_string(text, desc.max_string_length, out);
        }
        (expected, other) => {
            return Err(EncodeError::TypeMismatch {
                expected,
                actual: other.type_name(),
            });
        }
    }
    Ok(())
}

/// Return `byte` with bit `bit` set to `value`.
#[inline]
pub fn set_bit(byte: u8, bit: u32, value: bool) -> u8 {
    let mask = 1u8 << bit;
    if value {
        byte | mask
    } else {
        byte & !mask
    }
}

/// Write a counted string into `out`, truncating to `max_len` bytes.
///
/// Truncation backs off to a character boundary. Unused character bytes
/// are zeroed.
pub fn encode_string(text: &str, max_len: u32, out: &mut [u8]) {
    let capacity = (max_len as usize).min(out.len().saturating_sub(STRING_HEADER_LEN));
    let mut len = text.len().min(capacity);
    while !text.is_char_boundary(len) {
        len -= 1;
    }

    out[STRING_MAX_LEN_OFFSET] = max_len as u8;
    out[STRING_CUR_LEN_OFFSET] = len as u8;
    let chars = &mut out[STRING_HEADER_LEN..];
    chars[..len].copy_from_slice(&text.as_bytes()[..len]);
    chars[len..].fill(0);
}

/// Encode a timestamp as DATE_AND_TIME.
///
/// Fails for years outside 1990-2089. Sub-millisecond precision is dropped.
pub fn encode_date_and_time(ts: &NaiveDateTime) -> Result<[u8; DATE_AND_TIME_LEN], EncodeError> {
    let year = ts.year();
    if !(DATE_AND_TIME_MIN_YEAR..=DATE_AND_TIME_MAX_YEAR).contains(&year) {
        return Err(EncodeError::OutOfRange {
            message: format!(
                "year {} outside {}-{}",
                year, DATE_AND_TIME_MIN_YEAR, DATE_AND_TIME_MAX_YEAR
            ),
        });
    }

    // Leap-second nanos run past 999 ms
    let millis = (ts.nanosecond() / 1_000_000).min(999);
    let weekday = ts.weekday().number_from_sunday();

    Ok([
        to_bcd(year.rem_euclid(100) as u32),
        to_bcd(ts.month()),
        to_bcd(ts.day()),
        to_bcd(ts.hour()),
        to_bcd(ts.minute()),
        to_bcd(ts.second()),
        to_bcd(millis / 10),
        to_bcd((millis % 10) * 10 + weekday),
    ])
}

#[inline]
fn to_bcd(value: u32) -> u8 {
    (((value / 10) << 4) | (value % 10)) as u8
}

/// Two packed decimal digits; `None` if either nibble is above 9.
#[inline]
fn from_bcd(byte: u8) -> Option<u32> {
    let (high, low) = (byte >> 4, byte & 0x0F);
    if high > 9 || low > 9 {
        return None;
    }
    Some(u32::from(high) * 10 + u32::from(low))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn desc(address: &str) -> AddressDescriptor {
        AddressDescriptor::parse("t", address).unwrap()
    }

    fn ts(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32, ms: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_milli_opt(h, mi, s, ms)
            .unwrap()
    }

    #[test]
    fn test_decode_bit() {
        let d = desc("DB12,X4.4");
        assert_eq!(decode_value(&d, &[0x10]).unwrap(), TaggedValue::Bool(true));
        assert_eq!(decode_value(&d, &[0xEF]).unwrap(), TaggedValue::Bool(false));
    }

    #[test]
    fn test_decode_integers_big_endian() {
        assert_eq!(
            decode_value(&desc("DB1,B0"), &[0xFE]).unwrap(),
            TaggedValue::Byte(254)
        );
        assert_eq!(
            decode_value(&desc("DB1,INT0"), &[0x12, 0x34]).unwrap(),
            TaggedValue::Int16(0x1234)
        );
        assert_eq!(
            decode_value(&desc("DB1,DINT0"), &[0xFF, 0xFF, 0xFF, 0xFE]).unwrap(),
            TaggedValue::Int32(-2)
        );
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let value = decode_value(&desc("DB1,INT0"), &[0x00, 0x05, 0xAA, 0xBB]).unwrap();
        assert_eq!(value, TaggedValue::Int16(5));
    }

    #[test]
    fn test_decode_buffer_too_short() {
        assert_eq!(
            decode_value(&desc("DB1,DINT0"), &[0x00, 0x01]),
            Err(DecodeError::BufferTooShort {
                needed: 4,
                actual: 2
            })
        );
        assert!(decode_value(&desc("DB1,STRING0.4"), &[4, 0, 0]).is_err());
    }

    #[test]
    fn test_bit_out_of_range() {
        let d = desc("DB1,X0.8");
        assert_eq!(
            decode_value(&d, &[0xFF]),
            Err(DecodeError::BitOutOfRange { bit: 8 })
        );
        assert_eq!(
            encode_value(&d, &TaggedValue::Bool(true)),
            Err(EncodeError::BitOutOfRange { bit: 8 })
        );
    }

    #[test]
    fn test_string_capacity_out_of_range() {
        let d = desc("DB1,STRING0.255");
        assert_eq!(
            validate_descriptor(&d),
            Err(DecodeError::StringTooLong { length: 255 })
        );
        assert!(matches!(
            encode_value(&d, &TaggedValue::from("x")),
            Err(EncodeError::OutOfRange { .. })
        ));
        assert!(validate_descriptor(&desc("DB1,STRING0.254")).is_ok());
    }

    #[test]
    fn test_encode_string_truncates() {
        let d = desc("DB12,STRING60.10");
        let bytes = encode_value(&d, &TaggedValue::from("test-1234567890")).unwrap();
        let mut expected = vec![10u8, 10];
        expected.extend_from_slice(b"test-12345");
        assert_eq!(bytes, expected);

        assert_eq!(
            decode_value(&d, &bytes).unwrap(),
            TaggedValue::Text("test-12345".to_string())
        );
    }

    #[test]
    fn test_encode_string_header() {
        let d = desc("DB1,STRING0.10");

        let empty = encode_value(&d, &TaggedValue::from("")).unwrap();
        assert_eq!(&empty[..2], &[10, 0]);
        assert!(empty[2..].iter().all(|b| *b == 0));

        let exact = encode_value(&d, &TaggedValue::from("0123456789")).unwrap();
        assert_eq!(&exact[..2], &[10, 10]);

        let short = encode_value(&d, &TaggedValue::from("abc")).unwrap();
        assert_eq!(&short[..5], &[10, 3, b'a', b'b', b'c']);
        assert_eq!(short.len(), 12);
    }

    #[test]
    fn test_encode_string_char_boundary() {
        // 'é' is two bytes; the cut would land inside it
        let d = desc("DB1,STRING0.4");
        let bytes = encode_value(&d, &TaggedValue::from("abcé")).unwrap();
        assert_eq!(bytes[1], 3);
        assert_eq!(
            decode_value(&d, &bytes).unwrap(),
            TaggedValue::Text("abc".to_string())
        );
    }

    #[test]
    fn test_decode_string_clamps_length() {
        let d = desc("DB1,STRING0.3");
        // Current length claims more than the field holds
        let data = [3u8, 9, b'x', b'y', b'z'];
        assert_eq!(
            decode_value(&d, &data).unwrap(),
            TaggedValue::Text("xyz".to_string())
        );
    }

    #[test]
    fn test_bit_write_leaves_other_bits() {
        let d = desc("DB1,X0.3");
        let mut buffer = [0x55u8];

        encode_value_into(&d, &TaggedValue::Bool(true), &mut buffer).unwrap();
        assert_eq!(buffer[0], 0x5D);
        for bit in [0, 1, 2, 4, 5, 6, 7] {
            assert_eq!(get_bit(buffer[0], bit), get_bit(0x55, bit), "bit {}", bit);
        }

        encode_value_into(&d, &TaggedValue::Bool(false), &mut buffer).unwrap();
        assert_eq!(buffer[0], 0x55);
    }

    #[test]
    fn test_encode_integers() {
        assert_eq!(
            encode_value(&desc("DB1,INT0"), &TaggedValue::Int16(-2)).unwrap(),
            vec![0xFF, 0xFE]
        );
        assert_eq!(
            encode_value(&desc("DB1,DINT0"), &TaggedValue::Int32(0x01020304)).unwrap(),
            vec![1, 2, 3, 4]
        );
        assert_eq!(
            encode_value(&desc("DB1,B0"), &TaggedValue::Byte(7)).unwrap(),
            vec![7]
        );
    }

    #[test]
    fn test_encode_type_mismatch() {
        assert_eq!(
            encode_value(&desc("DB1,INT0"), &TaggedValue::Int32(1)),
            Err(EncodeError::TypeMismatch {
                expected: LogicalType::ShortInt,
                actual: "int32",
            })
        );
        assert!(matches!(
            encode_value(&desc("DB1,X0.0"), &TaggedValue::None),
            Err(EncodeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_encode_into_short_buffer() {
        let mut buffer = [0u8; 3];
        assert_eq!(
            encode_value_into(&desc("DB1,DINT0"), &TaggedValue::Int32(1), &mut buffer),
            Err(EncodeError::BufferTooShort {
                needed: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn test_date_and_time_layout() {
        // 2024-03-15 is a Friday
        let value = ts(2024, 3, 15, 13, 45, 30, 123);
        assert_eq!(value.weekday(), Weekday::Fri);

        let bytes = encode_date_and_time(&value).unwrap();
        assert_eq!(bytes, [0x24, 0x03, 0x15, 0x13, 0x45, 0x30, 0x12, 0x36]);
        assert_eq!(decode_date_and_time(&bytes), value);
    }

    #[test]
    fn test_date_and_time_century_pivot() {
        let bytes = [0x95, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x01];
        assert_eq!(decode_date_and_time(&bytes), ts(1995, 1, 1, 0, 0, 0, 0));

        let bytes = [0x89, 0x12, 0x31, 0x23, 0x59, 0x59, 0x99, 0x97];
        assert_eq!(decode_date_and_time(&bytes), ts(2089, 12, 31, 23, 59, 59, 999));
    }

    #[test]
    fn test_date_and_time_invalid_date() {
        let bytes = [0x24, 0x02, 0x30, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(decode_date_and_time(&bytes), NaiveDateTime::MIN);

        let d = desc("DB1,DT0");
        assert_eq!(
            decode_value(&d, &[0u8; 8]).unwrap(),
            TaggedValue::Timestamp(NaiveDateTime::MIN)
        );
    }

    #[test]
    fn test_date_and_time_rejects_non_bcd_digits() {
        // Millisecond digits 0xF, 0xF, 0xF would read as 1665 ms, a leap second
        let bytes = [0x24, 0x01, 0x01, 0x00, 0x00, 0x59, 0xFF, 0xF1];
        assert_eq!(decode_date_and_time(&bytes), NaiveDateTime::MIN);

        // Hex digit in the day
        let bytes = [0x24, 0x01, 0x1A, 0x00, 0x00, 0x00, 0x00, 0x01];
        assert_eq!(decode_date_and_time(&bytes), NaiveDateTime::MIN);

        // High millisecond nibble of byte 7 above 9
        let bytes = [0x24, 0x01, 0x01, 0x00, 0x00, 0x59, 0x99, 0xA1];
        assert_eq!(decode_date_and_time(&bytes), NaiveDateTime::MIN);
    }

    #[test]
    fn test_date_and_time_max_millis_decodes() {
        // Weekday nibble is ignored; 999 ms with second 59 stays a normal second
        let bytes = [0x24, 0x01, 0x01, 0x00, 0x00, 0x59, 0x99, 0x9F];
        let value = decode_date_and_time(&bytes);
        assert_eq!(value, ts(2024, 1, 1, 0, 0, 59, 999));

        let d = desc("DB1,DT0");
        let encoded = encode_value(&d, &TaggedValue::Timestamp(value)).unwrap();
        assert_eq!(
            decode_value(&d, &encoded).unwrap(),
            TaggedValue::Timestamp(value)
        );
    }

    #[test]
    fn test_date_and_time_out_of_range() {
        let d = desc("DB1,DT0");
        for year in [1989, 2090] {
            let result = encode_value(&d, &TaggedValue::Timestamp(ts(year, 6, 1, 0, 0, 0, 0)));
            assert!(
                matches!(result, Err(EncodeError::OutOfRange { .. })),
                "{}",
                year
            );
        }
    }

    #[test]
    fn test_bcd_helpers() {
        assert_eq!(to_bcd(59), 0x59);
        assert_eq!(from_bcd(0x59), Some(59));
        assert_eq!(from_bcd(0x5A), None);
        assert_eq!(from_bcd(0xA5), None);
        assert_eq!(set_bit(0x00, 7, true), 0x80);
        assert_eq!(set_bit(0xFF, 0, false), 0xFE);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn int32_round_trip(v in any::<i32>()) {
                let d = desc("DB1,DINT0");
                let bytes = encode_value(&d, &TaggedValue::Int32(v)).unwrap();
                prop_assert_eq!(decode_value(&d, &bytes).unwrap(), TaggedValue::Int32(v));
            }

            #[test]
            fn timestamp_round_trip(
                days in 0i64..36_500,
                millis_of_day in 0i64..86_400_000,
            ) {
                let base = ts(1990, 1, 1, 0, 0, 0, 0);
                let value = base
                    + chrono::Duration::days(days)
                    + chrono::Duration::milliseconds(millis_of_day);
                prop_assume!(value.year() <= DATE_AND_TIME_MAX_YEAR);
                let d = desc("DB1,DT0");
                let bytes = encode_value(&d, &TaggedValue::Timestamp(value)).unwrap();
                prop_assert_eq!(decode_value(&d, &bytes).unwrap(), TaggedValue::Timestamp(value));
            }

            #[test]
            fn string_decodes_to_truncated_prefix(text in "[a-z0-9]{0,40}", max in 0u32..32) {
                let d = desc(&format!("DB1,STRING0.{}", max));
                let bytes = encode_value(&d, &TaggedValue::Text(text.clone())).unwrap();
                let keep = text.len().min(max as usize);
                prop_assert_eq!(bytes[0] as u32, max);
                prop_assert_eq!(bytes[1] as usize, keep);
                prop_assert_eq!(
                    decode_value(&d, &bytes).unwrap(),
                    TaggedValue::Text(text[..keep].to_string())
                );
            }

            #[test]
            fn bit_write_touches_one_bit(fill in any::<u8>(), bit in 0u32..8, v in any::<bool>()) {
                let d = desc(&format!("DB1,X0.{}", bit));
                let mut buffer = [fill];
                encode_value_into(&d, &TaggedValue::Bool(v), &mut buffer).unwrap();
                prop_assert_eq!(buffer[0] & !(1 << bit), fill & !(1 << bit));
                prop_assert_eq!(get_bit(buffer[0], bit), v);
            }

            #[test]
            fn decode_never_panics(data in proptest::collection::vec(any::<u8>(), 0..16)) {
                for address in ["DB1,X0.7", "DB1,B0", "DB1,INT0", "DB1,DINT0", "DB1,DT0", "DB1,STRING0.8"] {
                    let _ = decode_value(&desc(address), &data);
                }
            }
        }
    }
}
