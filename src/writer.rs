//! Register writes.

use crate::address::SlaveAddress;
use crate::codec::{self, Report};
use crate::error::Result;
use crate::session::Cp2112;
use crate::transport::{Connector, Transport};
use log::{debug, trace};

impl<C: Connector> Cp2112<C> {
    /// Writes a `length`-byte value (1-8) to a 16-bit register, MSB first.
    ///
    /// Values wider than `length` bytes are truncated. A length outside 1-8
    /// fails with [`crate::Error::UnsupportedLength`] before any I/O.
    pub fn write_register(
        &mut self,
        address: SlaveAddress,
        register: u16,
        value: u64,
        length: usize,
    ) -> Result<()> {
        let report = codec::encode_write(address, register, value, length)?;
        self.send_write(&report)?;
        debug!(
            "Write: Addr {}, Reg 0x{:04X}, Data 0x{:0width$X}",
            address,
            register,
            codec::truncate_value(value, length),
            width = length * 2
        );
        Ok(())
    }

    /// Writes 1-61 bytes starting at `register` in one I2C transaction.
    ///
    /// Sizes outside that range fail with [`crate::Error::BlockTooLarge`]
    /// before any I/O.
    pub fn write_block(&mut self, address: SlaveAddress, register: u16, bytes: &[u8]) -> Result<()> {
        let report = codec::encode_block_write(address, register, bytes)?;
        self.send_write(&report)?;
        debug!(
            "Write (block): Addr {}, Reg 0x{:04X}, Data: {:02X?}",
            address, register, bytes
        );
        Ok(())
    }

    fn send_write(&mut self, report: &Report) -> Result<()> {
        trace!("I2C OUT report: {:?}", report);
        self.transact(|transport, _| {
            transport.write_report(report.as_bytes())?;
            Ok(())
        })
    }
}
