//! Value types carried by the echo methods

use std::ops::BitOr;

use serde::{Deserialize, Serialize};

use crate::payload::BlockCodec;

/// Maximum length in bytes of [`TheStruct::name`]
pub const NAME_MAX_LEN: usize = 20;

/// Enumeration small enough to travel inline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum SmallEnum {
    Value1 = 0,
    Value2 = 1,
    Value3 = 2,
    Value4 = 3,
    Value5 = 4,
}

/// Enumeration with 64-bit discriminants, boxed in the value pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LargeEnum(pub u64);

impl LargeEnum {
    pub const VALUE1: Self = Self(0);
    pub const VALUE2: Self = Self(1);
    pub const VALUE3: Self = Self(2);
    pub const LARGE_VALUE1: Self = Self(0xFFFF_FFFF_FFFF_FFFE);
    pub const LARGE_VALUE2: Self = Self(0x7FFF_FFFF_FFFF_FFFF);
}

/// 32-bit bitmask, carried inline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SmallBitMask(pub u32);

impl SmallBitMask {
    pub const VALUE1: Self = Self(1 << 0);
    pub const VALUE2: Self = Self(1 << 1);
    pub const VALUE3: Self = Self(1 << 2);
    pub const VALUE4: Self = Self(1 << 3);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for SmallBitMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// 64-bit bitmask, boxed in the value pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LargeBitMask(pub u64);

impl LargeBitMask {
    pub const VALUE1: Self = Self(1 << 0);
    pub const VALUE2: Self = Self(1 << 1);
    pub const VALUE32: Self = Self(1 << 31);
    pub const VALUE33: Self = Self(1 << 32);
    pub const VALUE64: Self = Self(1 << 63);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for LargeBitMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Result code: zero is success, negative values are failures
///
/// Unknown codes are carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultCode(pub i32);

impl ResultCode {
    pub const OK: Self = Self(0);
    pub const NOT_FOUND: Self = Self(-1);
    pub const NOT_POSSIBLE: Self = Self(-2);
    pub const OUT_OF_RANGE: Self = Self(-3);
    pub const NO_MEMORY: Self = Self(-4);
    pub const NOT_PERMITTED: Self = Self(-5);
    pub const FAULT: Self = Self(-6);
    pub const COMM_ERROR: Self = Self(-7);
    pub const TIMEOUT: Self = Self(-8);
    pub const OVERFLOW: Self = Self(-9);
    pub const UNDERFLOW: Self = Self(-10);
    pub const WOULD_BLOCK: Self = Self(-11);
    pub const DEADLOCK: Self = Self(-12);
    pub const FORMAT_ERROR: Self = Self(-13);
    pub const DUPLICATE: Self = Self(-14);
    pub const BAD_PARAMETER: Self = Self(-15);
    pub const CLOSED: Self = Self(-16);
    pub const BUSY: Self = Self(-17);
    pub const UNSUPPORTED: Self = Self(-18);
    pub const IO_ERROR: Self = Self(-19);
    pub const NOT_IMPLEMENTED: Self = Self(-20);
    pub const UNAVAILABLE: Self = Self(-21);
    pub const TERMINATED: Self = Self(-22);

    pub fn is_ok(self) -> bool {
        self.0 == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnOff {
    Off,
    On,
}

/// Opaque reference handed out by a client; echoed back untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimpleRef(pub u64);

/// Aggregate payload for the struct echo methods
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TheStruct {
    pub name: String,
    pub index: i8,
}

impl TheStruct {
    pub fn new(name: impl Into<String>, index: i8) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }
}

/// Layout: `[name_len: u8][name: NAME_MAX_LEN bytes, zero padded][index: i8]`
impl BlockCodec for TheStruct {
    const ENCODED_LEN: usize = 1 + NAME_MAX_LEN + 1;

    fn encode(&self, out: &mut [u8]) {
        let name_len = floor_char_boundary(&self.name, NAME_MAX_LEN);
        out[0] = name_len as u8;
        out[1..1 + name_len].copy_from_slice(&self.name.as_bytes()[..name_len]);
        out[1 + name_len..1 + NAME_MAX_LEN].fill(0);
        out[1 + NAME_MAX_LEN] = self.index as u8;
    }

    fn decode(bytes: &[u8]) -> Self {
        let name_len = usize::from(bytes[0]).min(NAME_MAX_LEN);
        Self {
            name: String::from_utf8_lossy(&bytes[1..1 + name_len]).into_owned(),
            index: bytes[1 + NAME_MAX_LEN] as i8,
        }
    }
}

/// Largest index `<= max` that falls on a character boundary of `s`
pub(crate) fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_struct_codec_roundtrip() {
        let value = TheStruct::new("echo", -7);
        let mut block = [0u8; TheStruct::ENCODED_LEN];
        value.encode(&mut block);
        assert_eq!(TheStruct::decode(&block), value);
    }

    #[test]
    fn test_struct_name_truncated_on_char_boundary() {
        // 19 ASCII bytes followed by a two-byte character straddling the limit
        let name = format!("{}é", "a".repeat(19));
        let mut block = [0u8; TheStruct::ENCODED_LEN];
        TheStruct::new(name, 1).encode(&mut block);

        let decoded = TheStruct::decode(&block);
        assert_eq!(decoded.name, "a".repeat(19));
        assert_eq!(decoded.index, 1);
    }

    #[test]
    fn test_floor_char_boundary() {
        assert_eq!(floor_char_boundary("hello", 10), 5);
        assert_eq!(floor_char_boundary("hello", 3), 3);
        assert_eq!(floor_char_boundary("héllo", 2), 1);
    }

    #[test]
    fn test_bitmask_ops() {
        let mask = SmallBitMask::VALUE1 | SmallBitMask::VALUE3;
        assert!(mask.contains(SmallBitMask::VALUE3));
        assert!(!mask.contains(SmallBitMask::VALUE2));

        let large = LargeBitMask::VALUE33 | LargeBitMask::VALUE64;
        assert!(large.contains(LargeBitMask::VALUE64));
        assert_eq!(large.0, (1 << 32) | (1 << 63));
    }

    #[test]
    fn test_result_code() {
        assert!(ResultCode::OK.is_ok());
        assert!(!ResultCode::TIMEOUT.is_ok());
    }
}
