use crate::address::SlaveAddress;
use thiserror::Error;

/// Errors raised at the Transport boundary.
///
/// These never reach a caller directly from a register operation: the
/// session resets the bridge first and reports them wrapped in
/// [`Error::Device`].
#[derive(Error, Debug)]
pub enum TransportError {
    /// Error from the underlying HID API layer.
    #[error("HID API error: {0}")]
    Hid(#[from] hidapi::HidError),
    /// General I/O error during device communication.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The HID layer accepted fewer bytes than the report holds.
    #[error("Partial report write: sent {written} of {expected} bytes")]
    PartialWrite {
        /// Bytes actually written.
        written: usize,
        /// Full report length.
        expected: usize,
    },
    /// No input report arrived within the read timeout.
    #[error("No input report received within {timeout_ms} ms")]
    NoResponse {
        /// The timeout that elapsed.
        timeout_ms: i32,
    },
}

/// Errors that can occur when talking to a CP2112 bridge.
#[derive(Error, Debug)]
pub enum Error {
    /// The bridge could not be opened or rejected its initial configuration.
    #[error("Failed to open CP2112 device: {message}")]
    Open {
        /// What went wrong during open.
        message: String,
        /// Underlying transport failure, if any.
        #[source]
        source: Option<TransportError>,
    },
    /// No CP2112 device matched the requested IDs.
    #[error("Device not found with VID 0x{vid:04X}, PID 0x{pid:04X}")]
    DeviceNotFound {
        /// Vendor ID that was searched for.
        vid: u16,
        /// Product ID that was searched for.
        pid: u16,
    },
    /// Register value length outside what the frame type can carry.
    #[error("Unsupported data length {0} (supported: 1-8 bytes)")]
    UnsupportedLength(usize),
    /// Block write payload outside 1-61 bytes.
    #[error("Block write of {0} bytes out of range (1-61 bytes)")]
    BlockTooLarge(usize),
    /// Slave address does not fit in 7 bits.
    #[error("Invalid 7-bit I2C address 0x{0:02X} (must be 0x00-0x7F)")]
    InvalidAddress(u8),
    /// Slave address text could not be parsed.
    #[error("Cannot parse I2C address '{input}': {message}")]
    AddressParse {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        message: String,
    },
    /// Function argument is outside the valid range.
    #[error("Argument out of range: {0}")]
    ArgumentOutOfRange(String),
    /// I/O failure at the Transport boundary.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    /// The bridge never reported buffered read data.
    #[error(
        "Read timeout at {address}, register 0x{register:04X}: no data after {attempts} status polls"
    )]
    ReadTimeout {
        /// Slave being read.
        address: SlaveAddress,
        /// Register being read.
        register: u16,
        /// Number of status polls performed.
        attempts: u8,
    },
    /// A response report had the wrong ID or length.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    /// An operation failed and the bridge was reset.
    ///
    /// `reopened` tells whether the session is usable again.
    #[error("Device error, bridge reset (reopened: {reopened}): {cause}")]
    Device {
        /// The failure that triggered the reset.
        #[source]
        cause: Box<Error>,
        /// Whether reset, reopen and reconfiguration all succeeded.
        reopened: bool,
    },
    /// The session holds no open transport.
    #[error("Session is not ready (state: {0})")]
    SessionNotReady(crate::session::SessionStatus),
    /// A script line could not be parsed.
    #[error("Script error on line {line}: {message}")]
    ScriptParse {
        /// 1-based line number.
        line: usize,
        /// Description of the problem.
        message: String,
    },
    /// No block with the requested name exists in the script.
    #[error("Script has no block named '{0}'")]
    UnknownBlock(String),
    /// General I/O error (e.g. reading a script file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The failure underneath a [`Error::Device`] wrapper, or `self`.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Device { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    /// True for errors that are raised only after an I/O fault and so
    /// require the session to be reset.
    pub(crate) fn needs_recovery(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::ReadTimeout { .. } | Error::MalformedResponse(_)
        )
    }
}

/// Result type alias for CP2112 operations.
pub type Result<T> = std::result::Result<T, Error>;
