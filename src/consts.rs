//! Internal constants: USB IDs, report IDs and fixed configuration frames.

// Default Vendor/Product IDs
/// Silicon Labs vendor ID.
pub const SILABS_VID: u16 = 0x10C4;
/// Product ID of the CP2112 HID USB-to-SMBus bridge.
pub const CP2112_PID: u16 = 0xEA90;

/// Output reports are zero-padded to this length, report ID included.
pub const REPORT_SIZE: usize = 64;
/// Longest frame the driver builds: a data-write header (5) plus a 61-byte block.
pub const MAX_FRAME_SIZE: usize = 66;

// --- Feature Reports (Control Transfer) ---
pub mod feature {
    /// Resets the bridge. The device re-enumerates afterwards.
    pub const RESET_DEVICE: [u8; 2] = [0x01, 0x01];

    /// GPIO configuration: all pins open-drain.
    pub const GPIO_OPEN_DRAIN: [u8; 5] = [0x03, 0xFF, 0x00, 0x00, 0x00];

    /// SMBus configuration for the 400 kHz setup.
    pub const SMBUS_CONFIG: [u8; 14] = [
        0x06, // Report ID
        0x00, // Reserved
        0x06, // Speed selector (400 kHz)
        0x00, 0x32, // Slave address timeout (50 ms)
        0x00, // SCL low timeout disabled. Must stay 0 with clock stretching on.
        0x00, 0x00, // Retry time disabled
        0xFF, 0x00, // Reserved
        0xFF, // Reserved
        0x01, // Reserved
        0x00, // Reserved
        0x0F, // Clock stretching enabled
    ];
}

// --- Interrupt Reports (I2C data path) ---
pub mod report_id {
    pub const DATA_WRITE_READ_REQUEST: u8 = 0x11;
    pub const DATA_READ_FORCE: u8 = 0x12;
    pub const DATA_READ_RESPONSE: u8 = 0x13;
    pub const DATA_WRITE: u8 = 0x14;
    pub const TRANSFER_STATUS_REQUEST: u8 = 0x15;
    pub const TRANSFER_STATUS_RESPONSE: u8 = 0x16;
    pub const REGISTER_BLOCK_WRITE: u8 = 0x17;
}

pub mod i2c {
    /// Register addresses are always sent as two bytes, MSB first.
    pub const REGISTER_ADDRESS_LEN: u8 = 0x02;
    /// Largest value accepted by the register write/read path.
    pub const MAX_REGISTER_VALUE_LEN: usize = 8;
    /// Largest payload a single data-write report can carry after the register bytes.
    pub const MAX_BLOCK_LEN: usize = 61;
    /// Bytes before the payload in a data-read response: ID, status, length.
    pub const DATA_RESPONSE_HEADER_LEN: usize = 3;
    /// Length of a transfer-status response.
    pub const STATUS_RESPONSE_LEN: usize = 7;
    /// Status byte 2 of a transfer-status response when read data is buffered.
    pub const STATUS_DATA_AVAILABLE: u8 = 0x05;
    /// Argument of the transfer-status request.
    pub const STATUS_REQUEST_GET: u8 = 0x01;
}
