//! # cp2112-hid
//!
//! A Rust crate for reading and writing 16-bit-addressed registers of I²C
//! chips through a Silicon Labs CP2112 HID USB-to-SMBus bridge.
//!
//! This crate uses the `hidapi` crate for cross-platform USB HID communication.
//!
//! ## Features
//!
//! *   Device discovery (`device_find_all`, `device_find_first`).
//! *   Session lifecycle (`Cp2112::open`, `open_first`, `open_session`, `close_session`).
//!     The bridge is configured for open-drain GPIO and 400 kHz SMBus with
//!     clock stretching on every open.
//! *   Register access with 16-bit register addresses:
//!     *   `write_register` for 1-8 byte values.
//!     *   `write_block` for 1-61 byte payloads in one transaction.
//!     *   `read_register` for 1-8 byte values (request, status polling, force read).
//!     *   `read_run`/`write_run` for byte-wide runs of consecutive registers.
//! *   Automatic recovery: a transport fault, read timeout or malformed response
//!     resets the bridge, reopens it and reapplies configuration. The failing
//!     call still returns `Error::Device`; it is never retried silently.
//! *   Register-write scripts (`script::Script`) replayed block by block.
//! *   A pluggable [`Transport`]/[`Connector`] boundary. `hidapi` is the default
//!     backend; tests use the in-memory simulator in `mock`.
//!
//! ## Installation
//!
//! ```toml
//! [dependencies]
//! cp2112-hid = "0.1.0"
//! log = "0.4"          # Optional, for logging
//!
//! [dev-dependencies]
//! env_logger = "0.11"
//! ```
//!
//! You also need the `hidapi` library installed on your system. See the [`hidapi` crate documentation](https://docs.rs/hidapi/) for details.
//!
//! ## Basic Usage
//!
//! ```no_run
//! use cp2112_hid::{Cp2112, Result, SlaveAddress};
//!
//! fn main() -> Result<()> {
//!     // Optional: Initialize logging
//!     // env_logger::init();
//!
//!     let mut bridge = Cp2112::open_first()?;
//!     let chip = SlaveAddress::new(0x2D)?;
//!
//!     bridge.write_register(chip, 0x020E, 0x00AB, 2)?;
//!     let value = bridge.read_register(chip, 0x020E, 2)?;
//!     println!("0x020E = 0x{:04X}", value);
//!
//!     let bytes = bridge.read_run(chip, 0x0010, 4)?;
//!     println!("0x0010..0x0013 = {:02X?}", bytes);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Recovery
//!
//! ```no_run
//! use cp2112_hid::{Cp2112, Error, SlaveAddress};
//!
//! # fn main() -> cp2112_hid::Result<()> {
//! let mut bridge = Cp2112::open_first()?;
//! let chip = SlaveAddress::new(0x2D)?;
//! match bridge.read_register(chip, 0x0100, 1) {
//!     Ok(v) => println!("value 0x{:02X}", v),
//!     Err(Error::Device { cause, reopened }) => {
//!         // The bridge was reset. If `reopened`, the next call can proceed.
//!         eprintln!("read failed ({cause}), bridge reopened: {reopened}");
//!     }
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Hardware Setup Notes
//!
//! *   **I²C Pull-up Resistors:** Required externally (e.g., 4.7kΩ to 3.3V).
//! *   **Linux udev Rules:** Grant user permission to the HID device. Create `/etc/udev/rules.d/99-cp2112.rules`:
//!     ```udev
//!     SUBSYSTEM=="hidraw", ATTRS{idVendor}=="10c4", ATTRS{idProduct}=="ea90", MODE="0666", GROUP="plugdev"
//!     ```
//!     Reload: `sudo udevadm control --reload-rules && sudo udevadm trigger`
//! *   **Reset settle time:** After a reset the bridge re-enumerates. Recovery
//!     waits `SessionConfig::settle_delay` (3 s by default) before reopening.
//!
//! ## License
//!
//! This project is licensed under the WTFPL.

// Make internal modules private, re-export public types
mod address;
pub mod codec;
mod consts;
mod error;
mod reader;
pub mod script;
mod sequence;
mod session;
pub mod transport;
mod writer;

#[doc(hidden)]
pub mod mock;

pub use address::SlaveAddress;
pub use error::{Error, Result, TransportError};
pub use session::{Cp2112, SessionConfig, SessionStatus};
pub use transport::{
    device_find_all, device_find_first, Connector, Cp2112DeviceInfo, DeviceDetails, DeviceIds,
    HidConnector, HidTransport, Transport,
};
// Re-export only essential public constants
pub use consts::{CP2112_PID, SILABS_VID};

/// Wire-level limits callers may want to validate against.
pub mod limits {
    pub use crate::consts::i2c::{MAX_BLOCK_LEN, MAX_REGISTER_VALUE_LEN};
    pub use crate::consts::REPORT_SIZE;
}
