// tests/hardware_tests.rs
use cp2112_hid::{self, Cp2112, HidConnector, Result, SessionConfig, SessionStatus, SlaveAddress};
use hidapi::HidApi;

// Helper to open the first bridge, panics on failure for test simplicity
fn open_test_device() -> Cp2112 {
    let _ = env_logger::builder().is_test(true).try_init();
    let connector =
        HidConnector::from_api(HidApi::new().expect("Failed to create HID API"));
    Cp2112::open(connector, SessionConfig::default())
        .expect("Failed to open any CP2112 device. Is it connected and permissions set?")
}

#[test]
#[ignore] // Ignore by default, requires hardware
fn test_enumerate_finds_bridge() {
    let hid_api = HidApi::new().expect("Failed to create HID API");
    let devices = cp2112_hid::device_find_all(&hid_api);
    assert!(!devices.is_empty(), "No CP2112 found");
    for device in &devices {
        assert_eq!(device.vid, cp2112_hid::SILABS_VID);
        assert_eq!(device.pid, cp2112_hid::CP2112_PID);
    }
}

#[test]
#[ignore] // Ignore by default, requires hardware
fn test_register_write_readback() -> Result<()> {
    let mut device = open_test_device();
    let chip = SlaveAddress::new(0x2D)?; // CHANGE THIS to a chip KNOWN TO BE on your bus
    let scratch_register = 0x020E; // CHANGE THIS to a writable register of that chip

    println!("Testing register write/readback at {}", chip);
    device.write_register(chip, scratch_register, 0x00AB, 2)?;
    assert_eq!(device.read_register(chip, scratch_register, 2)?, 0x00AB);

    device.write_block(chip, scratch_register, &[0x12, 0x34])?;
    assert_eq!(device.read_run(chip, scratch_register, 2)?, vec![0x12, 0x34]);
    Ok(())
}

#[test]
#[ignore] // Ignore by default, requires hardware
fn test_absent_chip_recovers() -> Result<()> {
    let mut device = open_test_device();
    let absent = SlaveAddress::new(0x31)?; // CHANGE THIS to an address KNOWN TO BE EMPTY

    match device.read_register(absent, 0x0000, 1) {
        Ok(v) => panic!("Read 0x{:02X} from {} but expected no device", v, absent),
        Err(cp2112_hid::Error::Device { reopened, .. }) => {
            assert!(reopened, "Bridge did not come back after reset");
            assert_eq!(device.status(), SessionStatus::Ready);
        }
        Err(e) => return Err(e),
    }
    Ok(())
}
