//! Encoding and decoding of CP2112 I2C report frames.
//!
//! Everything here is pure: functions build [`Report`] buffers or inspect
//! received bytes and never touch a transport.

use crate::address::SlaveAddress;
use crate::consts::{self, i2c, report_id};
use crate::error::{Error, Result};
use log::warn;
use std::fmt;
use std::ops::Deref;

/// An output report, zero-padded to 64 bytes. Byte 0 is the report ID.
///
/// Block writes of 60 or 61 bytes do not fit in 64 and produce a longer frame.
#[derive(Clone, PartialEq, Eq)]
pub struct Report {
    buf: [u8; consts::MAX_FRAME_SIZE],
    len: usize,
}

impl Report {
    fn new(prefix: &[u8]) -> Self {
        let mut buf = [0u8; consts::MAX_FRAME_SIZE];
        buf[..prefix.len()].copy_from_slice(prefix);
        Report {
            buf,
            len: prefix.len(),
        }
    }

    fn push(&mut self, bytes: &[u8]) {
        self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
    }

    /// The full zero-padded report as sent on the wire.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len.max(consts::REPORT_SIZE)]
    }

    /// The report ID (byte 0).
    pub fn tag(&self) -> u8 {
        self.buf[0]
    }

    /// The bytes before the zero padding.
    pub fn payload(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl Deref for Report {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Report({:02X?})", self.payload())
    }
}

/// Decoded transfer-status response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusResponse {
    /// Read data is buffered in the bridge and can be force-read.
    pub ready: bool,
}

/// The low `length` bytes of `value`, as they go on the wire.
pub fn truncate_value(value: u64, length: usize) -> u64 {
    if length >= 8 {
        value
    } else {
        value & ((1u64 << (length * 8)) - 1)
    }
}

/// Builds a register write frame for a value of `length` bytes.
///
/// One and two byte values use the short data-write report; three to eight
/// byte values use the register block-write report. `value` is truncated to
/// its low `length` bytes and sent MSB first.
pub fn encode_write(
    address: SlaveAddress,
    register: u16,
    value: u64,
    length: usize,
) -> Result<Report> {
    if length == 0 || length > i2c::MAX_REGISTER_VALUE_LEN {
        return Err(Error::UnsupportedLength(length));
    }
    let value_bytes = value.to_be_bytes();
    let data = &value_bytes[value_bytes.len() - length..];
    let [reg_hi, reg_lo] = register.to_be_bytes();

    let mut report = if length <= 2 {
        Report::new(&[
            report_id::DATA_WRITE,
            address.wire_byte(),
            length as u8 + i2c::REGISTER_ADDRESS_LEN,
            reg_hi,
            reg_lo,
        ])
    } else {
        Report::new(&[
            report_id::REGISTER_BLOCK_WRITE,
            address.wire_byte(),
            length as u8,
            i2c::REGISTER_ADDRESS_LEN,
            reg_hi,
            reg_lo,
        ])
    };
    report.push(data);
    Ok(report)
}

/// Builds a data-write frame carrying the register address followed by `bytes`.
pub fn encode_block_write(address: SlaveAddress, register: u16, bytes: &[u8]) -> Result<Report> {
    if bytes.is_empty() || bytes.len() > i2c::MAX_BLOCK_LEN {
        return Err(Error::BlockTooLarge(bytes.len()));
    }
    let [reg_hi, reg_lo] = register.to_be_bytes();
    let mut report = Report::new(&[
        report_id::DATA_WRITE,
        address.wire_byte(),
        bytes.len() as u8 + i2c::REGISTER_ADDRESS_LEN,
        reg_hi,
        reg_lo,
    ]);
    report.push(bytes);
    Ok(report)
}

/// Builds a write-read request: write the register address, then read `length` bytes.
pub fn encode_read_request(address: SlaveAddress, register: u16, length: u8) -> Report {
    let [reg_hi, reg_lo] = register.to_be_bytes();
    Report::new(&[
        report_id::DATA_WRITE_READ_REQUEST,
        address.wire_byte(),
        0x00,
        length,
        i2c::REGISTER_ADDRESS_LEN,
        reg_hi,
        reg_lo,
    ])
}

/// Builds a transfer-status request.
pub fn encode_status_poll() -> Report {
    Report::new(&[
        report_id::TRANSFER_STATUS_REQUEST,
        i2c::STATUS_REQUEST_GET,
    ])
}

/// Builds a data-read-force request for `length` buffered bytes.
pub fn encode_force_read(length: u8) -> Report {
    Report::new(&[report_id::DATA_READ_FORCE, 0x00, length])
}

/// Interprets a transfer-status response.
///
/// Anything that is not a status response is reported as not ready.
pub fn decode_status_response(bytes: &[u8]) -> StatusResponse {
    match bytes {
        [report_id::TRANSFER_STATUS_RESPONSE, _, status, ..] => StatusResponse {
            ready: *status == i2c::STATUS_DATA_AVAILABLE,
        },
        [report_id::TRANSFER_STATUS_RESPONSE, ..] | [] => StatusResponse { ready: false },
        [other, ..] => {
            warn!("Unrecognized status response (report ID 0x{:02X})", other);
            StatusResponse { ready: false }
        }
    }
}

/// Extracts a `length`-byte value from a data-read response, MSB first.
pub fn decode_data_response(bytes: &[u8], length: usize) -> Result<u64> {
    if length == 0 || length > i2c::MAX_REGISTER_VALUE_LEN {
        return Err(Error::UnsupportedLength(length));
    }
    let header = i2c::DATA_RESPONSE_HEADER_LEN;
    if bytes.len() < header + length {
        return Err(Error::MalformedResponse(format!(
            "data response too short: {} bytes, expected {}",
            bytes.len(),
            header + length
        )));
    }
    if bytes[0] != report_id::DATA_READ_RESPONSE {
        return Err(Error::MalformedResponse(format!(
            "expected data response ID 0x{:02X}, got 0x{:02X}",
            report_id::DATA_READ_RESPONSE,
            bytes[0]
        )));
    }
    if bytes[2] as usize != length {
        return Err(Error::MalformedResponse(format!(
            "data response carries {} bytes, expected {}",
            bytes[2], length
        )));
    }
    Ok(bytes[header..header + length]
        .iter()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
}
