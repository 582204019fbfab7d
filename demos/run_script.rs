use cp2112_hid::script::Script;
use cp2112_hid::{Cp2112, Result, SlaveAddress};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(path) = args.first() else {
        eprintln!("Usage: run_script <script file> [block name]");
        return Ok(());
    };

    let script = Script::load(path)?;
    println!("Loaded {} block(s) from {}:", script.blocks.len(), path);
    for block in &script.blocks {
        println!("  {} {} ({} writes)", block.id, block.name, block.writes.len());
    }

    // Used when the script has no Addr= line.
    let default_address = SlaveAddress::new(0x2D)?;
    let mut bridge = Cp2112::open_first()?;

    match args.get(1) {
        Some(name) => bridge.run_named_block(&script, name, default_address)?,
        None => bridge.run_script(&script, default_address)?,
    }
    println!("Done. Recoveries during run: {}", bridge.recovery_count());
    Ok(())
}
