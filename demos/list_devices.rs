use cp2112_hid::{self, Cp2112, HidConnector, Result, SessionConfig};
use hidapi::HidApi;

fn main() -> Result<()> {
    env_logger::init();
    let hid_api = HidApi::new().map_err(cp2112_hid::TransportError::from)?;

    println!(
        "Searching for CP2112 bridges (VID=0x{:04X}, PID=0x{:04X})...",
        cp2112_hid::SILABS_VID,
        cp2112_hid::CP2112_PID
    );
    let devices = cp2112_hid::device_find_all(&hid_api);

    if devices.is_empty() {
        println!("No devices found.");
        return Ok(());
    }

    println!("Found {} device(s):", devices.len());
    for (i, info) in devices.iter().enumerate() {
        println!(
            "  {}: VID=0x{:04X}, PID=0x{:04X}, Path={:?}, Serial='{}', Product='{}'",
            i,
            info.vid,
            info.pid,
            info.path,
            info.serial_number.as_deref().unwrap_or("N/A"),
            info.product_string.as_deref().unwrap_or("N/A"),
        );
    }

    // Open the first one to confirm the bridge accepts its configuration.
    let first = &devices[0];
    let config = SessionConfig::default().with_ids(first.vid, first.pid);
    let config = match &first.serial_number {
        Some(serial) => config.with_serial(serial.clone()),
        None => config,
    };
    let session = Cp2112::open(HidConnector::from_api(hid_api), config)?;
    let details = session.device_details();
    println!(
        "Opened device 0: Manufacturer='{}', Product='{}', Serial='{}', status {}",
        details.manufacturer_string.as_deref().unwrap_or("N/A"),
        details.product_string.as_deref().unwrap_or("N/A"),
        details.serial_number.as_deref().unwrap_or("N/A"),
        session.status()
    );
    Ok(())
}
