//! Explicit decoding of values captured from another process.
//!
//! Captured memory is never reinterpreted in place. Values are decoded from
//! byte slices with a fixed (little-endian) byte order, and only for plain
//! fixed-size types that implement [`Primitive`].

use encoding_rs::{Encoding, SHIFT_JIS, UTF_16LE, UTF_8};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use tracing::debug;

mod private {
    pub trait Sealed {}
}

/// A fixed-layout value that can be decoded from little-endian bytes.
///
/// Implemented for the integer and float primitives and for byte arrays.
/// Sealed: pointer-carrying or variable-length types cannot opt in.
pub trait Primitive: private::Sealed + Sized + Copy {
    /// Number of bytes the value occupies in the target process.
    const SIZE: usize;

    /// Decode from exactly [`Self::SIZE`] bytes, `None` on length mismatch.
    fn decode(bytes: &[u8]) -> Option<Self>;
}

macro_rules! impl_primitive {
    ($($ty:ty),* $(,)?) => {
        $(
            impl private::Sealed for $ty {}

            impl Primitive for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                fn decode(bytes: &[u8]) -> Option<Self> {
                    Some(<$ty>::from_le_bytes(bytes.try_into().ok()?))
                }
            }
        )*
    };
}

impl_primitive!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl<const N: usize> private::Sealed for [u8; N] {}

impl<const N: usize> Primitive for [u8; N] {
    const SIZE: usize = N;

    fn decode(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok()
    }
}

/// Source encodings accepted by text reads.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum TextEncoding {
    #[default]
    #[serde(rename = "utf8")]
    #[strum(serialize = "utf8")]
    Utf8,
    #[serde(rename = "utf16-le")]
    #[strum(serialize = "utf16-le")]
    Utf16Le,
    #[serde(rename = "shift-jis")]
    #[strum(serialize = "shift-jis")]
    ShiftJis,
}

impl TextEncoding {
    fn encoding(self) -> &'static Encoding {
        match self {
            TextEncoding::Utf8 => UTF_8,
            TextEncoding::Utf16Le => UTF_16LE,
            TextEncoding::ShiftJis => SHIFT_JIS,
        }
    }

    /// Width of the terminating NUL unit.
    fn unit_width(self) -> usize {
        match self {
            TextEncoding::Utf16Le => 2,
            TextEncoding::Utf8 | TextEncoding::ShiftJis => 1,
        }
    }
}

/// Decode a fixed-length text field, stopping at the first NUL unit.
///
/// Malformed sequences are replaced with U+FFFD.
pub fn decode_text(bytes: &[u8], encoding: TextEncoding) -> String {
    let width = encoding.unit_width();
    let len = bytes
        .chunks_exact(width)
        .position(|unit| unit.iter().all(|&b| b == 0))
        .map(|units| units * width)
        .unwrap_or(bytes.len() - bytes.len() % width);

    let (decoded, had_errors) = encoding.encoding().decode_without_bom_handling(&bytes[..len]);
    if had_errors {
        debug!(
            "{} decoding had errors for bytes: {:?}",
            encoding,
            &bytes[..len.min(20)]
        );
    }
    decoded.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_integers() {
        assert_eq!(u32::decode(&[0x78, 0x56, 0x34, 0x12]), Some(0x12345678));
        assert_eq!(i32::decode(&[0xFF, 0xFF, 0xFF, 0xFF]), Some(-1));
        assert_eq!(
            u64::decode(&[0xEF, 0xCD, 0xAB, 0x90, 0x78, 0x56, 0x34, 0x12]),
            Some(0x1234567890ABCDEF)
        );
        assert_eq!(i16::decode(&[0x00, 0x80]), Some(i16::MIN));
    }

    #[test]
    fn test_decode_floats() {
        assert_eq!(f32::decode(&1.5f32.to_le_bytes()), Some(1.5));
        assert_eq!(f64::decode(&(-2.25f64).to_le_bytes()), Some(-2.25));
    }

    #[test]
    fn test_decode_length_mismatch() {
        assert_eq!(u32::decode(&[0x01, 0x02]), None);
        assert_eq!(<[u8; 4]>::decode(&[1, 2, 3, 4, 5]), None);
    }

    #[test]
    fn test_decode_byte_array() {
        assert_eq!(<[u8; 3]>::decode(&[7, 8, 9]), Some([7, 8, 9]));
        assert_eq!(<[u8; 12]>::SIZE, 12);
    }

    #[test]
    fn test_decode_utf8_stops_at_nul() {
        assert_eq!(decode_text(b"Hello\0World", TextEncoding::Utf8), "Hello");
        assert_eq!(decode_text(b"Hunter", TextEncoding::Utf8), "Hunter");
    }

    #[test]
    fn test_decode_shift_jis() {
        // "テスト" in Shift-JIS
        let data = [0x83, 0x65, 0x83, 0x58, 0x83, 0x67, 0x00, 0x41];
        assert_eq!(decode_text(&data, TextEncoding::ShiftJis), "テスト");
    }

    #[test]
    fn test_decode_utf16le() {
        let data = [0x48, 0x00, 0x69, 0x00, 0x00, 0x00, 0x41, 0x00];
        assert_eq!(decode_text(&data, TextEncoding::Utf16Le), "Hi");
    }

    #[test]
    fn test_decode_utf16le_ignores_odd_trailing_byte() {
        let data = [0x48, 0x00, 0x69, 0x00, 0x41];
        assert_eq!(decode_text(&data, TextEncoding::Utf16Le), "Hi");
    }

    #[test]
    fn test_encoding_names() {
        assert_eq!("shift-jis".parse::<TextEncoding>().unwrap(), TextEncoding::ShiftJis);
        assert_eq!("UTF8".parse::<TextEncoding>().unwrap(), TextEncoding::Utf8);
        assert_eq!(TextEncoding::Utf16Le.to_string(), "utf16-le");
    }
}
