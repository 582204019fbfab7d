use cp2112_hid::{Cp2112, Error, Result, SlaveAddress};
use std::env;

fn parse_hex(input: &str) -> Result<u64> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    u64::from_str_radix(digits, 16)
        .map_err(|e| Error::ArgumentOutOfRange(format!("'{}' is not hex: {}", input, e)))
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 3 {
        eprintln!("Usage: register_rw <address> <register> <length> [value]");
        eprintln!("  e.g. register_rw 0x2D 0x020E 2 0x00AB   (write, then read back)");
        eprintln!("       register_rw 0x2D 0x020E 2          (read only)");
        return Ok(());
    }

    let chip: SlaveAddress = args[0].parse()?;
    let register = u16::try_from(parse_hex(&args[1])?)
        .map_err(|_| Error::ArgumentOutOfRange(format!("register {} exceeds 0xFFFF", args[1])))?;
    let length: usize = args[2]
        .parse()
        .map_err(|e| Error::ArgumentOutOfRange(format!("length '{}': {}", args[2], e)))?;

    let mut bridge = Cp2112::open_first()?;
    println!("Opened bridge, talking to {}", chip);

    if let Some(value) = args.get(3) {
        let value = parse_hex(value)?;
        bridge.write_register(chip, register, value, length)?;
        println!("Wrote 0x{:X} ({} bytes) to 0x{:04X}", value, length, register);
    }

    match bridge.read_register(chip, register, length) {
        Ok(value) => println!("0x{:04X} = 0x{:0width$X}", register, value, width = length * 2),
        Err(Error::Device { cause, reopened }) => {
            eprintln!("Read failed: {}", cause);
            eprintln!("Bridge was reset (reopened: {})", reopened);
        }
        Err(e) => return Err(e),
    }
    Ok(())
}
