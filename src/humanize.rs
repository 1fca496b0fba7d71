//! Byte sizes written the way people write them in config files

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty size")]
    Empty,

    #[error("invalid number in size '{0}'")]
    InvalidNumber(String),

    #[error("unknown size unit '{0}'")]
    InvalidUnit(String),

    #[error("size '{0}' does not fit in 64 bits")]
    Overflow(String),
}

const UNITS: [(&str, u64); 5] = [
    ("TB", 1 << 40),
    ("GB", 1 << 30),
    ("MB", 1 << 20),
    ("KB", 1 << 10),
    ("B", 1),
];

/// Size in bytes; binary multiples ("64KB" is 65536)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ByteSize(pub u64);

impl ByteSize {
    pub const fn kib(n: u64) -> Self {
        ByteSize(n << 10)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

fn multiplier(unit: &str) -> Option<u64> {
    let unit = unit.to_ascii_uppercase();
    let unit = unit.strip_suffix("IB").map(|u| format!("{u}B")).unwrap_or(unit);
    match unit.as_str() {
        "" | "B" => Some(1),
        "K" => Some(1 << 10),
        "M" => Some(1 << 20),
        "G" => Some(1 << 30),
        "T" => Some(1 << 40),
        other => UNITS.iter().find(|(name, _)| *name == other).map(|(_, m)| *m),
    }
}

impl FromStr for ByteSize {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseError::Empty);
        }

        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (digits, unit) = s.split_at(split);
        let value: u64 = digits
            .parse()
            .map_err(|_| ParseError::InvalidNumber(s.to_string()))?;
        let factor = multiplier(unit.trim()).ok_or_else(|| ParseError::InvalidUnit(unit.trim().to_string()))?;

        value
            .checked_mul(factor)
            .map(ByteSize)
            .ok_or_else(|| ParseError::Overflow(s.to_string()))
    }
}

/// Largest unit dividing the size exactly, so the output parses back
impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (unit, factor) = UNITS
            .iter()
            .find(|(_, factor)| self.0 != 0 && self.0 % factor == 0)
            .copied()
            .unwrap_or(("B", 1));
        write!(f, "{}{}", self.0 / factor, unit)
    }
}

impl Serialize for ByteSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Visitor;

        impl serde::de::Visitor<'_> for Visitor {
            type Value = ByteSize;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a byte count or a size such as \"64KB\"")
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<ByteSize, E> {
                Ok(ByteSize(v))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<ByteSize, E> {
                u64::try_from(v)
                    .map(ByteSize)
                    .map_err(|_| E::custom(format!("negative size {v}")))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<ByteSize, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!("4096".parse::<ByteSize>().unwrap(), ByteSize(4096));
        assert_eq!("64KB".parse::<ByteSize>().unwrap(), ByteSize::kib(64));
        assert_eq!("64k".parse::<ByteSize>().unwrap(), ByteSize::kib(64));
        assert_eq!("2 MiB".parse::<ByteSize>().unwrap(), ByteSize(2 << 20));
        assert_eq!("1GB".parse::<ByteSize>().unwrap(), ByteSize(1 << 30));
        assert_eq!("12B".parse::<ByteSize>().unwrap(), ByteSize(12));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<ByteSize>(), Err(ParseError::Empty));
        assert!(matches!("KB".parse::<ByteSize>(), Err(ParseError::InvalidNumber(_))));
        assert!(matches!("5XB".parse::<ByteSize>(), Err(ParseError::InvalidUnit(_))));
        assert!(matches!(
            "99999999TB".parse::<ByteSize>(),
            Err(ParseError::Overflow(_))
        ));
    }

    #[test]
    fn test_display_parses_back() {
        for size in [ByteSize(0), ByteSize(100), ByteSize::kib(64), ByteSize(3 << 30), ByteSize(1536)] {
            assert_eq!(size.to_string().parse::<ByteSize>().unwrap(), size);
        }
        assert_eq!(ByteSize::kib(64).to_string(), "64KB");
        assert_eq!(ByteSize(1536).to_string(), "1536B");
    }

    #[test]
    fn test_deserialize() {
        #[derive(Deserialize)]
        struct Sized {
            buffer: ByteSize,
        }

        let parsed: Sized = toml::from_str(r#"buffer = "16KB""#).unwrap();
        assert_eq!(parsed.buffer, ByteSize::kib(16));
        let parsed: Sized = toml::from_str("buffer = 512").unwrap();
        assert_eq!(parsed.buffer, ByteSize(512));
        assert!(toml::from_str::<Sized>("buffer = -1").is_err());
    }
}
