//! SCALE primitive writers over `parity-scale-codec`. Integer writers take the
//! declared bit width and narrow to it, so an out-of-range value is an error
//! here rather than a silently truncated encoding.

use std::fmt::Display;

use parity_scale_codec::{Compact, Encode};

fn narrow<S, T>(value: S, kind: char, bits: u32) -> Result<T, String>
where
    S: Copy + Display,
    T: TryFrom<S>,
{
    T::try_from(value).map_err(|_| format!("{value} does not fit in {kind}{bits}"))
}

fn unsupported(kind: char, bits: u32) -> String {
    format!("unsupported integer width {kind}{bits}")
}

/// Append `Compact<u{bits}>`.
pub fn write_compact(value: u128, bits: u32, out: &mut Vec<u8>) -> Result<(), String> {
    match bits {
        8 => Compact(narrow::<_, u8>(value, 'u', bits)?).encode_to(out),
        16 => Compact(narrow::<_, u16>(value, 'u', bits)?).encode_to(out),
        32 => Compact(narrow::<_, u32>(value, 'u', bits)?).encode_to(out),
        64 => Compact(narrow::<_, u64>(value, 'u', bits)?).encode_to(out),
        128 => Compact(value).encode_to(out),
        _ => return Err(unsupported('u', bits)),
    }
    Ok(())
}

/// Compact length prefix of a sequence.
pub fn write_len(len: usize, out: &mut Vec<u8>) {
    // usize is at most 64 bits on every supported target
    Compact(len as u64).encode_to(out);
}

/// Length-prefixed byte string.
pub fn write_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    bytes.encode_to(out);
}

/// Fixed-width little-endian unsigned integer.
pub fn write_uint(value: u128, bits: u32, out: &mut Vec<u8>) -> Result<(), String> {
    match bits {
        8 => narrow::<_, u8>(value, 'u', bits)?.encode_to(out),
        16 => narrow::<_, u16>(value, 'u', bits)?.encode_to(out),
        32 => narrow::<_, u32>(value, 'u', bits)?.encode_to(out),
        64 => narrow::<_, u64>(value, 'u', bits)?.encode_to(out),
        128 => value.encode_to(out),
        _ => return Err(unsupported('u', bits)),
    }
    Ok(())
}

/// Fixed-width little-endian two's-complement integer.
pub fn write_int(value: i128, bits: u32, out: &mut Vec<u8>) -> Result<(), String> {
    match bits {
        8 => narrow::<_, i8>(value, 'i', bits)?.encode_to(out),
        16 => narrow::<_, i16>(value, 'i', bits)?.encode_to(out),
        32 => narrow::<_, i32>(value, 'i', bits)?.encode_to(out),
        64 => narrow::<_, i64>(value, 'i', bits)?.encode_to(out),
        128 => value.encode_to(out),
        _ => return Err(unsupported('i', bits)),
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn compact(value: u128) -> Vec<u8> {
        let mut out = Vec::new();
        write_compact(value, 128, &mut out).unwrap();
        out
    }

    #[test]
    fn compact_modes() {
        assert_eq!(compact(0), [0x00]);
        assert_eq!(compact(1), [0x04]);
        assert_eq!(compact(63), [0xfc]);
        assert_eq!(compact(64), [0x01, 0x01]);
        assert_eq!(compact(16383), [0xfd, 0xff]);
        assert_eq!(compact(16384), [0x02, 0x00, 0x01, 0x00]);
        assert_eq!(compact(1_073_741_823), [0xfe, 0xff, 0xff, 0xff]);
        assert_eq!(compact(1_073_741_824), [0x03, 0x00, 0x00, 0x00, 0x40]);
        assert_eq!(compact(u128::from(u64::MAX)), [0x13, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn compact_width_does_not_change_encoding() {
        let mut narrow_out = Vec::new();
        write_compact(300, 16, &mut narrow_out).unwrap();
        assert_eq!(narrow_out, compact(300));
    }

    #[test]
    fn fixed_width_integers() {
        let mut out = Vec::new();
        write_uint(0x0102, 16, &mut out).unwrap();
        write_int(-1, 32, &mut out).unwrap();
        assert_eq!(out, [0x02, 0x01, 0xff, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut out = Vec::new();
        assert_eq!(write_uint(256, 8, &mut out).unwrap_err(), "256 does not fit in u8");
        assert_eq!(write_int(128, 8, &mut out).unwrap_err(), "128 does not fit in i8");
        assert_eq!(write_int(-129, 8, &mut out).unwrap_err(), "-129 does not fit in i8");
        assert_eq!(
            write_compact(u128::from(u32::MAX) + 1, 32, &mut out).unwrap_err(),
            "4294967296 does not fit in u32"
        );
        assert!(write_uint(1, 24, &mut out).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn byte_strings_are_length_prefixed() {
        let mut out = Vec::new();
        write_bytes(b"abc", &mut out);
        assert_eq!(out, [0x0c, b'a', b'b', b'c']);
    }
}
