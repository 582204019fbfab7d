//! 7-bit I2C slave addresses and the text forms used to enter them.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A 7-bit I2C slave address (0x00 - 0x7F), stored unshifted.
///
/// The read/write direction bit is only added when a frame is encoded
/// (see [`SlaveAddress::wire_byte`]); callers never shift it themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlaveAddress(u8);

impl SlaveAddress {
    /// Creates a 7-bit address, checking validity (0-127).
    pub fn new(addr: u8) -> Result<Self> {
        if addr <= 0x7F {
            Ok(SlaveAddress(addr))
        } else {
            Err(Error::InvalidAddress(addr))
        }
    }

    /// Returns the unshifted 7-bit address.
    #[inline]
    pub fn value(&self) -> u8 {
        self.0
    }

    /// The address byte as it appears in a bridge frame (`addr << 1`).
    #[inline]
    pub fn wire_byte(&self) -> u8 {
        self.0 << 1
    }

    /// Parses a hexadecimal address, with or without a `0x` prefix.
    pub fn from_hex_str(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let value = u8::from_str_radix(digits, 16).map_err(|e| Error::AddressParse {
            input: input.to_string(),
            message: e.to_string(),
        })?;
        Self::new(value)
    }

    /// Parses a binary address of at most seven `0`/`1` digits.
    pub fn from_bin_str(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let digits = trimmed
            .strip_prefix("0b")
            .or_else(|| trimmed.strip_prefix("0B"))
            .unwrap_or(trimmed);
        if digits.is_empty() || !digits.chars().all(|c| c == '0' || c == '1') {
            return Err(Error::AddressParse {
                input: input.to_string(),
                message: "binary address must contain only 0 or 1".to_string(),
            });
        }
        if digits.len() > 7 {
            return Err(Error::AddressParse {
                input: input.to_string(),
                message: "binary address must be at most 7 bits".to_string(),
            });
        }
        // Seven binary digits always fit, so this cannot fail.
        let value = u8::from_str_radix(digits, 2).map_err(|e| Error::AddressParse {
            input: input.to_string(),
            message: e.to_string(),
        })?;
        Ok(SlaveAddress(value))
    }

    /// Seven-digit binary rendering, e.g. `0101101` for 0x2D.
    pub fn to_bin_string(&self) -> String {
        format!("{:07b}", self.0)
    }
}

impl FromStr for SlaveAddress {
    type Err = Error;

    /// Accepts `0x2D`, `0b0101101`, or bare hex such as `2D`.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.starts_with("0b") || trimmed.starts_with("0B") {
            Self::from_bin_str(trimmed)
        } else {
            Self::from_hex_str(trimmed)
        }
    }
}

impl TryFrom<u8> for SlaveAddress {
    type Error = Error;

    fn try_from(addr: u8) -> Result<Self> {
        Self::new(addr)
    }
}

impl From<SlaveAddress> for u8 {
    fn from(addr: SlaveAddress) -> u8 {
        addr.0
    }
}

impl fmt::Display for SlaveAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}
