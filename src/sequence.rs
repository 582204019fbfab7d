//! Byte-at-a-time access to runs of consecutive registers.

use crate::address::SlaveAddress;
use crate::error::{Error, Result};
use crate::session::Cp2112;
use crate::transport::Connector;
use log::debug;

/// Checks that `count` registers starting at `start` stay within 0x0000-0xFFFF.
fn check_run(start: u16, count: usize) -> Result<()> {
    if count > 0 && start as usize + count - 1 > u16::MAX as usize {
        return Err(Error::ArgumentOutOfRange(format!(
            "{} registers from 0x{:04X} run past 0xFFFF",
            count, start
        )));
    }
    Ok(())
}

impl<C: Connector> Cp2112<C> {
    /// Reads `count` single-byte registers starting at `start`, in order.
    ///
    /// The first failure aborts the run; bytes read before it are discarded.
    pub fn read_run(&mut self, address: SlaveAddress, start: u16, count: usize) -> Result<Vec<u8>> {
        check_run(start, count)?;
        debug!("Reading {} registers from 0x{:04X} at {}", count, start, address);
        (0..count)
            .map(|i| {
                let value = self.read_register(address, start + i as u16, 1)?;
                Ok(value as u8)
            })
            .collect()
    }

    /// Writes `values` one byte per register starting at `start`, in order.
    ///
    /// The first failure aborts the run.
    pub fn write_run(&mut self, address: SlaveAddress, start: u16, values: &[u8]) -> Result<()> {
        check_run(start, values.len())?;
        debug!(
            "Writing {} registers from 0x{:04X} at {}",
            values.len(),
            start,
            address
        );
        for (i, &value) in values.iter().enumerate() {
            self.write_register(address, start + i as u16, u64::from(value), 1)?;
        }
        Ok(())
    }
}
