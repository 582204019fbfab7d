//! Register-write scripts: named blocks of writes replayed in file order.
//!
//! ```text
//! Addr=0x2D
//! WBlock(1, Power up)
//! [
//! (0x020E, 0x00AB, 2)
//! (0x0210, 0x01, 1)
//! ]
//! ```
//!
//! `Addr=` sets the default slave address. Each `(register, value, length)`
//! triple becomes one block write of `value` as `length` big-endian bytes.
//! Lines outside these forms are ignored.

use crate::address::SlaveAddress;
use crate::consts::i2c;
use crate::error::{Error, Result};
use crate::session::Cp2112;
use crate::transport::Connector;
use log::{debug, info};
use std::path::Path;

/// One `(register, value, length)` line of a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptWrite {
    pub register: u16,
    /// The value as `length` big-endian bytes.
    pub data: Vec<u8>,
}

impl ScriptWrite {
    /// The bytes sent in one block write.
    pub fn payload(&self) -> &[u8] {
        &self.data
    }
}

/// A named, numbered block of writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptBlock {
    /// Block number, zero-padded to two digits as written in logs.
    pub id: String,
    pub name: String,
    pub writes: Vec<ScriptWrite>,
}

/// A parsed script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    /// Address set by an `Addr=` line, if present.
    pub address: Option<SlaveAddress>,
    pub blocks: Vec<ScriptBlock>,
}

fn parse_error(line: usize, message: impl Into<String>) -> Error {
    Error::ScriptParse {
        line,
        message: message.into(),
    }
}

fn strip_hex_prefix(text: &str) -> &str {
    text.strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text)
}

/// Parses a hex value of any width into exactly `length` big-endian bytes.
fn parse_hex_bytes(text: &str, length: usize, line: usize) -> Result<Vec<u8>> {
    let text = text.trim();
    let digits = strip_hex_prefix(text);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(parse_error(line, format!("invalid hex number '{}'", text)));
    }
    let significant = digits.trim_start_matches('0');
    if significant.len() > length * 2 {
        return Err(parse_error(
            line,
            format!("value {} does not fit in {} byte(s)", text, length),
        ));
    }
    let padded = format!("{:0>width$}", significant, width = length * 2);
    (0..length)
        .map(|i| u8::from_str_radix(&padded[i * 2..i * 2 + 2], 16))
        .collect::<std::result::Result<Vec<u8>, _>>()
        .map_err(|e| parse_error(line, format!("invalid hex number '{}': {}", text, e)))
}

fn parse_hex(text: &str, line: usize) -> Result<u64> {
    let text = text.trim();
    u64::from_str_radix(strip_hex_prefix(text), 16)
        .map_err(|e| parse_error(line, format!("invalid hex number '{}': {}", text, e)))
}

/// Text between the first `open` and the following `close`.
fn enclosed(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)? + open.len_utf8();
    let end = start + text[start..].find(close)?;
    Some(&text[start..end])
}

impl Script {
    /// Parses script text.
    pub fn parse(text: &str) -> Result<Self> {
        let mut script = Script::default();
        let mut inside_block = false;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();

            if let Some(rest) = line.strip_prefix("Addr") {
                if let Some(value) = rest.trim_start().strip_prefix('=') {
                    script.address = Some(SlaveAddress::from_hex_str(value).map_err(|e| {
                        parse_error(line_no, format!("invalid address: {}", e))
                    })?);
                }
                continue;
            }

            if line.starts_with("WBlock") {
                let header = enclosed(line, '(', ')')
                    .ok_or_else(|| parse_error(line_no, "expected WBlock(<id>, <name>)"))?;
                let (id, name) = header
                    .split_once(',')
                    .ok_or_else(|| parse_error(line_no, "expected WBlock(<id>, <name>)"))?;
                let id = id.trim();
                if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
                    return Err(parse_error(line_no, format!("invalid block id '{}'", id)));
                }
                script.blocks.push(ScriptBlock {
                    id: format!("{:0>2}", id),
                    name: name.trim().to_string(),
                    writes: Vec::new(),
                });
                inside_block = true;
                continue;
            }

            if !inside_block {
                continue;
            }
            if line.starts_with(']') {
                inside_block = false;
                continue;
            }
            if line.starts_with('(') {
                let write = Self::parse_triple(line, line_no)?;
                if let Some(block) = script.blocks.last_mut() {
                    block.writes.push(write);
                }
            }
        }

        debug!("Parsed script with {} block(s)", script.blocks.len());
        Ok(script)
    }

    fn parse_triple(line: &str, line_no: usize) -> Result<ScriptWrite> {
        let inner = enclosed(line, '(', ')')
            .ok_or_else(|| parse_error(line_no, "unterminated write triple"))?;
        let parts: Vec<&str> = inner.split(',').collect();
        if parts.len() < 3 {
            return Err(parse_error(
                line_no,
                "expected (register, value, length)",
            ));
        }
        let register = parse_hex(parts[0], line_no)?;
        let register = u16::try_from(register).map_err(|_| {
            parse_error(line_no, format!("register 0x{:X} exceeds 16 bits", register))
        })?;
        let length: usize = parts[2].trim().parse().map_err(|e| {
            parse_error(line_no, format!("invalid length '{}': {}", parts[2].trim(), e))
        })?;
        if length == 0 || length > i2c::MAX_BLOCK_LEN {
            return Err(parse_error(
                line_no,
                format!("length {} out of range (1-{})", length, i2c::MAX_BLOCK_LEN),
            ));
        }
        let data = parse_hex_bytes(parts[1], length, line_no)?;
        Ok(ScriptWrite { register, data })
    }

    /// Reads and parses a script file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Looks up a block by name.
    pub fn block(&self, name: &str) -> Option<&ScriptBlock> {
        self.blocks.iter().find(|b| b.name == name)
    }

    /// Block names in file order.
    pub fn block_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.blocks.iter().map(|b| b.name.as_str())
    }
}

impl<C: Connector> Cp2112<C> {
    /// Replays one block, one block write per line. Stops at the first failure.
    pub fn run_block(&mut self, address: SlaveAddress, block: &ScriptBlock) -> Result<()> {
        info!("--- Start Block {} ({}) ---", block.id, block.name);
        for write in &block.writes {
            self.write_block(address, write.register, write.payload())?;
        }
        info!("--- End Block {} ({}) ---", block.id, block.name);
        Ok(())
    }

    /// Replays every block of `script` in file order.
    ///
    /// The script's `Addr=` line wins over `default_address`.
    pub fn run_script(&mut self, script: &Script, default_address: SlaveAddress) -> Result<()> {
        let address = script.address.unwrap_or(default_address);
        for block in &script.blocks {
            self.run_block(address, block)?;
        }
        Ok(())
    }

    /// Replays the block called `name`.
    pub fn run_named_block(
        &mut self,
        script: &Script,
        name: &str,
        default_address: SlaveAddress,
    ) -> Result<()> {
        let block = script
            .block(name)
            .ok_or_else(|| Error::UnknownBlock(name.to_string()))?;
        self.run_block(script.address.unwrap_or(default_address), block)
    }
}
