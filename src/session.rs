//! Session lifecycle for a CP2112 bridge: open, configure, reset and reopen.

use crate::consts::feature;
use crate::error::{Error, Result, TransportError};
use crate::transport::{Connector, DeviceDetails, DeviceIds, HidConnector, Transport};
use log::{debug, info, trace, warn};
use std::fmt;
use std::time::Duration;

/// Tunable session parameters.
///
/// The defaults match the bridge's documented behaviour; tests shorten the
/// delays to zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Which bridge to open.
    pub ids: DeviceIds,
    /// Sleep before every transfer-status poll.
    pub poll_interval: Duration,
    /// Status polls before a read gives up.
    pub max_polls: u8,
    /// Wait between closing a reset bridge and reopening it.
    pub settle_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            ids: DeviceIds::default(),
            poll_interval: Duration::from_millis(10),
            max_polls: 10,
            settle_delay: Duration::from_secs(3),
        }
    }
}

impl SessionConfig {
    /// Selects a bridge by serial number.
    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.ids.serial = Some(serial.into());
        self
    }

    /// Overrides the USB vendor/product IDs.
    pub fn with_ids(mut self, vendor_id: u16, product_id: u16) -> Self {
        self.ids.vendor_id = vendor_id;
        self.ids.product_id = product_id;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_polls(mut self, max_polls: u8) -> Self {
        self.max_polls = max_polls;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }
}

/// Observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Closed,
    Configuring,
    Ready,
    Resetting,
    Failed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStatus::Closed => "closed",
            SessionStatus::Configuring => "configuring",
            SessionStatus::Ready => "ready",
            SessionStatus::Resetting => "resetting",
            SessionStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Only `Ready` owns a transport. During `Configuring` and `Resetting` the
/// handle has been moved out into the running open/recover call.
enum SessionState<T> {
    Closed,
    Configuring,
    Ready(T),
    Resetting,
    Failed,
}

impl<T> SessionState<T> {
    fn status(&self) -> SessionStatus {
        match self {
            SessionState::Closed => SessionStatus::Closed,
            SessionState::Configuring => SessionStatus::Configuring,
            SessionState::Ready(_) => SessionStatus::Ready,
            SessionState::Resetting => SessionStatus::Resetting,
            SessionState::Failed => SessionStatus::Failed,
        }
    }
}

/// A session with a CP2112 bridge.
///
/// Every operation takes `&mut self`, so one session runs one transaction
/// at a time. Share it between threads behind a `Mutex`.
pub struct Cp2112<C: Connector = HidConnector> {
    connector: C,
    config: SessionConfig,
    state: SessionState<C::Transport>,
    details: DeviceDetails,
    recoveries: usize,
}

impl Cp2112<HidConnector> {
    /// Opens the first CP2112 found through `hidapi` with default settings.
    pub fn open_first() -> Result<Self> {
        Self::open(HidConnector::new()?, SessionConfig::default())
    }
}

impl<C: Connector> Cp2112<C> {
    /// Creates a closed session. Call [`Cp2112::open_session`] before use.
    pub fn new(connector: C, config: SessionConfig) -> Self {
        Cp2112 {
            connector,
            config,
            state: SessionState::Closed,
            details: DeviceDetails::default(),
            recoveries: 0,
        }
    }

    /// Creates a session and opens the bridge.
    pub fn open(connector: C, config: SessionConfig) -> Result<Self> {
        let mut session = Self::new(connector, config);
        session.open_session()?;
        Ok(session)
    }

    /// Opens and configures the bridge: GPIO open-drain, then SMBus at 400 kHz.
    ///
    /// On failure the session is `Failed`; nothing is retried.
    pub fn open_session(&mut self) -> Result<()> {
        if let SessionState::Ready(_) = self.state {
            debug!("Session already open");
            return Ok(());
        }
        self.state = SessionState::Configuring;
        debug!(
            "Opening CP2112 VID={:04X}, PID={:04X}, SN={:?}",
            self.config.ids.vendor_id, self.config.ids.product_id, self.config.ids.serial
        );

        let mut transport = match self.connector.open(&self.config.ids) {
            Ok(t) => t,
            Err(e) => {
                self.state = SessionState::Failed;
                return Err(Error::Open {
                    message: format!(
                        "cannot open VID 0x{:04X} PID 0x{:04X}",
                        self.config.ids.vendor_id, self.config.ids.product_id
                    ),
                    source: Some(e),
                });
            }
        };

        if let Err(e) = Self::configure(&mut transport) {
            transport.close();
            self.state = SessionState::Failed;
            return Err(Error::Open {
                message: "bridge rejected its configuration".to_string(),
                source: Some(e),
            });
        }

        self.details = transport.details();
        debug!(
            "Manufacturer: {:?}, Product: {:?}, Serial No: {:?}",
            self.details.manufacturer_string,
            self.details.product_string,
            self.details.serial_number
        );
        self.state = SessionState::Ready(transport);
        Ok(())
    }

    fn configure(transport: &mut C::Transport) -> std::result::Result<(), TransportError> {
        trace!("Configuring GPIO as open-drain");
        transport.send_feature_report(&feature::GPIO_OPEN_DRAIN)?;
        trace!("Configuring SMBus: 400 kHz, clock stretching on");
        transport.send_feature_report(&feature::SMBUS_CONFIG)?;
        Ok(())
    }

    /// Closes the bridge. The session can be reopened with [`Cp2112::open_session`].
    pub fn close_session(&mut self) {
        if let SessionState::Ready(transport) =
            std::mem::replace(&mut self.state, SessionState::Closed)
        {
            debug!("Closing session");
            transport.close();
        }
    }

    /// Resets the bridge after a failed operation and reopens it.
    ///
    /// Returns [`Error::Device`] wrapping `cause`, which the failed
    /// operation hands back to its caller. The session is `Ready` again if
    /// the reopen succeeded, `Failed` otherwise.
    ///
    /// Only a `Ready` session can be reset. In any other state nothing is
    /// sent, the state is unchanged and the result is
    /// [`Error::SessionNotReady`].
    pub fn recover(&mut self, cause: Error) -> Error {
        let mut transport = match std::mem::replace(&mut self.state, SessionState::Resetting) {
            SessionState::Ready(transport) => transport,
            other => {
                let status = other.status();
                self.state = other;
                warn!("Cannot reset a {} session after: {}", status, cause);
                return Error::SessionNotReady(status);
            }
        };

        warn!("I2C error ({}), resetting device...", cause);
        if let Err(e) = transport.send_feature_report(&feature::RESET_DEVICE) {
            warn!("Error resetting device: {}", e);
        }
        transport.close();

        std::thread::sleep(self.config.settle_delay);

        let reopened = match self.open_session() {
            Ok(()) => {
                info!("Device reset and reopened");
                true
            }
            Err(e) => {
                warn!("Reopen after reset failed: {}", e);
                false
            }
        };
        self.recoveries += 1;

        Error::Device {
            cause: Box::new(cause),
            reopened,
        }
    }

    /// Current state of the session.
    pub fn status(&self) -> SessionStatus {
        self.state.status()
    }

    /// Strings reported by the bridge when it was last opened.
    pub fn device_details(&self) -> &DeviceDetails {
        &self.details
    }

    /// Number of resets performed since the session was created.
    pub fn recovery_count(&self) -> usize {
        self.recoveries
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Runs one transaction against the open transport. I/O-level failures
    /// reset the bridge and come back as [`Error::Device`].
    pub(crate) fn transact<R>(
        &mut self,
        op: impl FnOnce(&mut C::Transport, &SessionConfig) -> Result<R>,
    ) -> Result<R> {
        let result = match &mut self.state {
            SessionState::Ready(transport) => op(transport, &self.config),
            other => return Err(Error::SessionNotReady(other.status())),
        };
        match result {
            Ok(value) => Ok(value),
            Err(e) if e.needs_recovery() => Err(self.recover(e)),
            Err(e) => Err(e),
        }
    }
}

impl<C: Connector> fmt::Debug for Cp2112<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cp2112")
            .field("config", &self.config)
            .field("status", &self.status())
            .field("details", &self.details)
            .field("recoveries", &self.recoveries)
            .finish()
    }
}
