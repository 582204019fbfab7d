//! In-memory CP2112 simulator for tests.
//!
//! [`MockBridge`] is a cloneable handle to shared simulator state. Its
//! [`MockConnector`] hands out [`MockTransport`]s that decode the frames a
//! real bridge would receive, keep a byte-per-register map per slave, and
//! answer status polls and force reads. Fault injection covers open
//! failures, write/read failures, slow status and corrupted responses.

use crate::consts::{feature, report_id};
use crate::error::TransportError;
use crate::transport::{Connector, DeviceDetails, DeviceIds, Transport};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::rc::Rc;

/// Everything the simulator saw and will do next.
#[derive(Debug, Default)]
pub struct MockState {
    /// Register contents, keyed by (7-bit slave, register).
    pub registers: HashMap<(u8, u16), u8>,
    /// Successful `Connector::open` calls.
    pub opens: usize,
    /// `Transport::close` calls.
    pub closes: usize,
    /// Every feature report sent, in order.
    pub feature_reports: Vec<Vec<u8>>,
    /// Every output report sent, in order (full padded frames).
    pub writes: Vec<Vec<u8>>,
    /// Status polls answered so far.
    pub status_polls: usize,

    /// Fail the next N opens.
    pub fail_opens: usize,
    /// Reject the SMBus configuration feature report on the next N opens.
    pub fail_configs: usize,
    /// Fail the output report with this (0-based) index in `writes`.
    pub fail_write_at: Option<usize>,
    /// Fail every data-write frame targeting this register.
    pub fail_write_register: Option<u16>,
    /// Fail the read request for this register.
    pub fail_read_register: Option<u16>,
    /// Answer "busy" to this many status polls per read before "ready".
    pub busy_polls: usize,
    /// Never report ready.
    pub never_ready: bool,
    /// Answer this many status polls with a frame that is not a status response.
    pub foreign_status_polls: usize,
    /// Corrupt the report ID of data responses.
    pub corrupt_data_response: bool,
    /// Reject the reset feature report.
    pub fail_reset: bool,

    pending: VecDeque<Vec<u8>>,
    read_request: Option<(u8, u16, u8)>,
    busy_left: usize,
}

impl MockState {
    /// Feature reports equal to the bridge reset command.
    pub fn resets(&self) -> usize {
        self.feature_reports
            .iter()
            .filter(|r| r.as_slice() == feature::RESET_DEVICE)
            .count()
    }

    /// Output reports whose report ID is `tag`.
    pub fn writes_with_tag(&self, tag: u8) -> Vec<&Vec<u8>> {
        self.writes.iter().filter(|w| w.first() == Some(&tag)).collect()
    }

    fn store(&mut self, slave: u8, register: u16, data: &[u8]) {
        for (i, &b) in data.iter().enumerate() {
            self.registers
                .insert((slave, register.wrapping_add(i as u16)), b);
        }
    }

    fn handle_write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let index = self.writes.len();
        self.writes.push(data.to_vec());
        if self.fail_write_at == Some(index) {
            return Err(injected("write failure"));
        }
        let Some(&tag) = data.first() else {
            return Err(injected("empty report"));
        };
        match tag {
            report_id::DATA_WRITE => {
                let slave = data[1] >> 1;
                let count = data[2] as usize;
                let register = u16::from_be_bytes([data[3], data[4]]);
                if self.fail_write_register == Some(register) {
                    return Err(injected("bus error on write"));
                }
                let payload = data[5..5 + count.saturating_sub(2)].to_vec();
                self.store(slave, register, &payload);
            }
            report_id::REGISTER_BLOCK_WRITE => {
                let slave = data[1] >> 1;
                let count = data[2] as usize;
                let register = u16::from_be_bytes([data[4], data[5]]);
                if self.fail_write_register == Some(register) {
                    return Err(injected("bus error on write"));
                }
                let payload = data[6..6 + count].to_vec();
                self.store(slave, register, &payload);
            }
            report_id::DATA_WRITE_READ_REQUEST => {
                let slave = data[1] >> 1;
                let length = data[3];
                let register = u16::from_be_bytes([data[5], data[6]]);
                if self.fail_read_register == Some(register) {
                    return Err(injected("bus error on read request"));
                }
                self.read_request = Some((slave, register, length));
                self.busy_left = self.busy_polls;
            }
            report_id::TRANSFER_STATUS_REQUEST => {
                self.status_polls += 1;
                if self.foreign_status_polls > 0 {
                    self.foreign_status_polls -= 1;
                    self.pending
                        .push_back(vec![report_id::DATA_READ_RESPONSE, 0x02, 0x05, 0, 0, 0, 0]);
                    return Ok(());
                }
                let ready = self.read_request.is_some() && !self.never_ready && {
                    if self.busy_left > 0 {
                        self.busy_left -= 1;
                        false
                    } else {
                        true
                    }
                };
                let status = if ready { 0x05 } else { 0x00 };
                self.pending
                    .push_back(vec![report_id::TRANSFER_STATUS_RESPONSE, 0x01, status, 0, 0, 0, 0]);
            }
            report_id::DATA_READ_FORCE => {
                let (slave, register, length) = self
                    .read_request
                    .take()
                    .ok_or_else(|| injected("force read without request"))?;
                let tag = if self.corrupt_data_response {
                    0xEE
                } else {
                    report_id::DATA_READ_RESPONSE
                };
                let mut response = vec![tag, 0x02, length];
                for i in 0..length as u16 {
                    let value = self
                        .registers
                        .get(&(slave, register.wrapping_add(i)))
                        .copied()
                        .unwrap_or(0);
                    response.push(value);
                }
                self.pending.push_back(response);
            }
            other => return Err(injected(&format!("unknown report 0x{other:02X}"))),
        }
        Ok(())
    }
}

fn injected(message: &str) -> TransportError {
    TransportError::Io(io::Error::other(format!("mock: {message}")))
}

/// Shared handle to a simulated bridge.
#[derive(Debug, Clone, Default)]
pub struct MockBridge {
    state: Rc<RefCell<MockState>>,
}

impl MockBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// A connector that opens transports onto this bridge.
    pub fn connector(&self) -> MockConnector {
        MockConnector {
            bridge: self.clone(),
        }
    }

    /// Mutable access to simulator state for setup and fault injection.
    pub fn state(&self) -> std::cell::RefMut<'_, MockState> {
        self.state.borrow_mut()
    }

    /// Preloads a register value.
    pub fn set_register(&self, slave: u8, register: u16, value: u8) {
        self.state().registers.insert((slave, register), value);
    }

    /// Current register value, if written.
    pub fn register(&self, slave: u8, register: u16) -> Option<u8> {
        self.state.borrow().registers.get(&(slave, register)).copied()
    }
}

/// Opens [`MockTransport`]s onto a [`MockBridge`].
#[derive(Debug, Clone)]
pub struct MockConnector {
    bridge: MockBridge,
}

impl Connector for MockConnector {
    type Transport = MockTransport;

    fn open(&mut self, _ids: &DeviceIds) -> Result<MockTransport, TransportError> {
        let mut state = self.bridge.state();
        if state.fail_opens > 0 {
            state.fail_opens -= 1;
            return Err(injected("device not found"));
        }
        state.opens += 1;
        let reject_config = if state.fail_configs > 0 {
            state.fail_configs -= 1;
            true
        } else {
            false
        };
        state.pending.clear();
        state.read_request = None;
        Ok(MockTransport {
            bridge: self.bridge.clone(),
            reject_config,
        })
    }
}

/// One open handle onto a [`MockBridge`].
#[derive(Debug)]
pub struct MockTransport {
    bridge: MockBridge,
    reject_config: bool,
}

impl Transport for MockTransport {
    fn send_feature_report(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let mut state = self.bridge.state();
        state.feature_reports.push(data.to_vec());
        if data == feature::SMBUS_CONFIG && self.reject_config {
            return Err(injected("SMBus configuration rejected"));
        }
        if data == feature::RESET_DEVICE && state.fail_reset {
            return Err(injected("device unresponsive"));
        }
        Ok(())
    }

    fn write_report(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.bridge.state().handle_write(data)
    }

    fn read_report(&mut self, max_len: usize) -> Result<Vec<u8>, TransportError> {
        let mut response = self
            .bridge
            .state()
            .pending
            .pop_front()
            .ok_or(TransportError::NoResponse { timeout_ms: 0 })?;
        response.truncate(max_len);
        Ok(response)
    }

    fn close(self) {
        self.bridge.state().closes += 1;
    }

    fn details(&self) -> DeviceDetails {
        DeviceDetails {
            manufacturer_string: Some("Silicon Laboratories".to_string()),
            product_string: Some("CP2112 HID USB-to-SMBus Bridge".to_string()),
            serial_number: Some("MOCK0001".to_string()),
        }
    }
}
