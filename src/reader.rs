//! Register reads: request, poll for completion, force-fetch.

use crate::address::SlaveAddress;
use crate::codec;
use crate::consts::i2c;
use crate::error::{Error, Result};
use crate::session::{Cp2112, SessionConfig};
use crate::transport::{Connector, Transport};
use log::{debug, trace};

/// Progress of one read transaction. Lives only for the duration of a
/// single [`Cp2112::read_register`] call.
#[derive(Debug)]
struct ReadTransaction {
    address: SlaveAddress,
    register: u16,
    length: u8,
    poll_attempt: u8,
}

impl ReadTransaction {
    fn run<T: Transport>(&mut self, transport: &mut T, config: &SessionConfig) -> Result<u64> {
        // RequestSent
        let request = codec::encode_read_request(self.address, self.register, self.length);
        trace!("I2C OUT report: {:?}", request);
        transport.write_report(request.as_bytes())?;

        // Polling
        let mut ready = false;
        while self.poll_attempt < config.max_polls {
            self.poll_attempt += 1;
            std::thread::sleep(config.poll_interval);
            transport.write_report(codec::encode_status_poll().as_bytes())?;
            let response = transport.read_report(i2c::STATUS_RESPONSE_LEN)?;
            trace!(
                "Status response {}/{}: {:02X?}",
                self.poll_attempt,
                config.max_polls,
                response
            );
            if codec::decode_status_response(&response).ready {
                ready = true;
                break;
            }
        }
        if !ready {
            return Err(Error::ReadTimeout {
                address: self.address,
                register: self.register,
                attempts: self.poll_attempt,
            });
        }

        // DataRequested
        transport.write_report(codec::encode_force_read(self.length).as_bytes())?;
        let response =
            transport.read_report(self.length as usize + i2c::DATA_RESPONSE_HEADER_LEN)?;
        trace!("Data response: {:02X?}", response);

        // Decoded
        codec::decode_data_response(&response, self.length as usize)
    }
}

impl<C: Connector> Cp2112<C> {
    /// Reads a `length`-byte value (1-8) from a 16-bit register, MSB first.
    ///
    /// Polls the bridge at most `max_polls` times. A timeout, a malformed
    /// response or a transport fault resets the bridge and the read fails
    /// with [`Error::Device`]; it is not retried.
    pub fn read_register(
        &mut self,
        address: SlaveAddress,
        register: u16,
        length: usize,
    ) -> Result<u64> {
        if length == 0 || length > i2c::MAX_REGISTER_VALUE_LEN {
            return Err(Error::UnsupportedLength(length));
        }
        let mut transaction = ReadTransaction {
            address,
            register,
            length: length as u8,
            poll_attempt: 0,
        };
        let value = self.transact(|transport, config| transaction.run(transport, config))?;
        debug!(
            "Read: Addr {}, Reg 0x{:04X}, Data 0x{:0width$X} ({} polls)",
            address,
            register,
            value,
            transaction.poll_attempt,
            width = length * 2
        );
        Ok(value)
    }
}
