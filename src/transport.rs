//! The HID transport boundary and its `hidapi` backend.
//!
//! A [`Transport`] moves opaque report buffers; it knows nothing about I2C.
//! A [`Connector`] opens transports, and is kept by the session so it can
//! reopen the bridge after a reset.

use crate::consts;
use crate::error::{Error, Result, TransportError};
use hidapi::{HidApi, HidDevice};
use log::{debug, trace, warn};

/// USB identity used to locate a bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIds {
    /// USB vendor ID.
    pub vendor_id: u16,
    /// USB product ID.
    pub product_id: u16,
    /// Serial number to select among several bridges, if any.
    pub serial: Option<String>,
}

impl Default for DeviceIds {
    fn default() -> Self {
        DeviceIds {
            vendor_id: consts::SILABS_VID,
            product_id: consts::CP2112_PID,
            serial: None,
        }
    }
}

/// Strings reported by an opened bridge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceDetails {
    /// Manufacturer string (typically "Silicon Laboratories").
    pub manufacturer_string: Option<String>,
    /// Product string.
    pub product_string: Option<String>,
    /// Serial number string.
    pub serial_number: Option<String>,
}

/// Raw report I/O with an opened bridge.
pub trait Transport {
    /// Sends a feature report. Byte 0 is the report ID.
    fn send_feature_report(&mut self, data: &[u8]) -> std::result::Result<(), TransportError>;

    /// Sends an output report. Byte 0 is the report ID.
    fn write_report(&mut self, data: &[u8]) -> std::result::Result<(), TransportError>;

    /// Reads one input report, returning at most `max_len` bytes.
    fn read_report(&mut self, max_len: usize) -> std::result::Result<Vec<u8>, TransportError>;

    /// Releases the underlying handle.
    fn close(self)
    where
        Self: Sized;

    /// Identification strings of the opened device.
    fn details(&self) -> DeviceDetails {
        DeviceDetails::default()
    }
}

/// Opens transports to a bridge.
pub trait Connector {
    /// The transport produced by [`Connector::open`].
    type Transport: Transport;

    /// Opens the bridge identified by `ids`.
    fn open(&mut self, ids: &DeviceIds) -> std::result::Result<Self::Transport, TransportError>;
}

/// Information about a discovered CP2112 bridge.
#[derive(Debug, Clone)]
pub struct Cp2112DeviceInfo {
    /// USB vendor ID.
    pub vid: u16,
    /// USB product ID.
    pub pid: u16,
    /// Platform-specific HID path.
    pub path: std::ffi::CString,
    /// Serial number string, used to select a bridge when several are attached.
    pub serial_number: Option<String>,
    /// Human-readable product name.
    pub product_string: Option<String>,
}

impl Cp2112DeviceInfo {
    /// IDs that reopen exactly this bridge.
    pub fn device_ids(&self) -> DeviceIds {
        DeviceIds {
            vendor_id: self.vid,
            product_id: self.pid,
            serial: self.serial_number.clone(),
        }
    }
}

/// Finds all attached CP2112 bridges, ordered by serial number.
pub fn device_find_all(hid_api: &HidApi) -> Vec<Cp2112DeviceInfo> {
    let mut devices: Vec<Cp2112DeviceInfo> = hid_api
        .device_list()
        .filter(|info| {
            info.vendor_id() == consts::SILABS_VID && info.product_id() == consts::CP2112_PID
        })
        .map(|info| {
            debug!(
                "Found CP2112: VID={:04X}, PID={:04X}, Path={:?}, SN={:?}",
                info.vendor_id(),
                info.product_id(),
                info.path(),
                info.serial_number()
            );
            Cp2112DeviceInfo {
                vid: info.vendor_id(),
                pid: info.product_id(),
                path: info.path().to_owned(),
                serial_number: info.serial_number().map(|s| s.to_string()),
                product_string: info.product_string().map(|s| s.to_string()),
            }
        })
        .collect();

    // Devices with a serial come first, in serial order.
    devices.sort_by(|a, b| match (&a.serial_number, &b.serial_number) {
        (Some(a_serial), Some(b_serial)) => a_serial.cmp(b_serial),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    devices
}

/// Finds the first attached CP2112 bridge.
/// **Warning:** Ambiguous if multiple devices exist.
pub fn device_find_first(hid_api: &HidApi) -> Result<Cp2112DeviceInfo> {
    device_find_all(hid_api)
        .into_iter()
        .next()
        .ok_or(Error::DeviceNotFound {
            vid: consts::SILABS_VID,
            pid: consts::CP2112_PID,
        })
}

/// Opens bridges through `hidapi`.
pub struct HidConnector {
    api: HidApi,
    read_timeout_ms: i32,
}

impl HidConnector {
    /// Default time to wait for an input report.
    pub const DEFAULT_READ_TIMEOUT_MS: i32 = 1000;

    /// Creates a connector with its own `HidApi` context.
    pub fn new() -> Result<Self> {
        let api = HidApi::new().map_err(|e| Error::Open {
            message: "failed to initialise HID API".to_string(),
            source: Some(TransportError::Hid(e)),
        })?;
        Ok(Self::from_api(api))
    }

    /// Wraps an existing `HidApi` context.
    pub fn from_api(api: HidApi) -> Self {
        HidConnector {
            api,
            read_timeout_ms: Self::DEFAULT_READ_TIMEOUT_MS,
        }
    }

    /// Sets how long [`Transport::read_report`] waits for a report.
    pub fn with_read_timeout_ms(mut self, timeout_ms: i32) -> Self {
        self.read_timeout_ms = timeout_ms;
        self
    }

    /// The underlying `HidApi` context, e.g. for [`device_find_all`].
    pub fn api(&self) -> &HidApi {
        &self.api
    }
}

/// Descriptor strings are informational; an unreadable one is left empty.
fn readable(
    what: &str,
    result: std::result::Result<Option<String>, hidapi::HidError>,
) -> Option<String> {
    result.unwrap_or_else(|e| {
        warn!("Cannot read {} string: {}", what, e);
        None
    })
}

impl Connector for HidConnector {
    type Transport = HidTransport;

    fn open(&mut self, ids: &DeviceIds) -> std::result::Result<HidTransport, TransportError> {
        // A reset bridge re-enumerates, so the device list must be fresh.
        self.api.refresh_devices()?;
        let device = match &ids.serial {
            Some(serial) => self.api.open_serial(ids.vendor_id, ids.product_id, serial)?,
            None => self.api.open(ids.vendor_id, ids.product_id)?,
        };

        let details = DeviceDetails {
            manufacturer_string: readable("manufacturer", device.get_manufacturer_string()),
            product_string: readable("product", device.get_product_string()),
            serial_number: readable("serial number", device.get_serial_number_string()),
        };
        trace!("Opened HID device: {:?}", details);

        Ok(HidTransport {
            device,
            details,
            read_timeout_ms: self.read_timeout_ms,
        })
    }
}

/// A bridge opened through `hidapi`. The handle closes on drop.
pub struct HidTransport {
    device: HidDevice,
    details: DeviceDetails,
    read_timeout_ms: i32,
}

impl Transport for HidTransport {
    fn send_feature_report(&mut self, data: &[u8]) -> std::result::Result<(), TransportError> {
        trace!("Writing Feature Report: {:02X?}", data);
        self.device.send_feature_report(data)?;
        Ok(())
    }

    fn write_report(&mut self, data: &[u8]) -> std::result::Result<(), TransportError> {
        match self.device.write(data) {
            Ok(written) if written == data.len() => {
                trace!("Sent {} bytes to device", written);
                Ok(())
            }
            Ok(written) => {
                warn!("Partial write: sent {} of {} bytes", written, data.len());
                Err(TransportError::PartialWrite {
                    written,
                    expected: data.len(),
                })
            }
            Err(e) => Err(TransportError::Hid(e)),
        }
    }

    fn read_report(&mut self, max_len: usize) -> std::result::Result<Vec<u8>, TransportError> {
        let mut buf = vec![0u8; max_len];
        let received = self.device.read_timeout(&mut buf, self.read_timeout_ms)?;
        if received == 0 {
            return Err(TransportError::NoResponse {
                timeout_ms: self.read_timeout_ms,
            });
        }
        buf.truncate(received);
        trace!("Received {} bytes from device: {:02X?}", received, &buf);
        Ok(buf)
    }

    fn close(self) {
        debug!("Closing HID device");
        drop(self.device);
    }

    fn details(&self) -> DeviceDetails {
        self.details.clone()
    }
}
