//! Read command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use hunter_core::{BrowserOptions, TextEncoding};

use crate::cli::ValueType;
use crate::cli_utils::open_session;
use crate::commands::hex_utils::{format_hex_address, parse_hex_address, parse_offset_list};
use crate::value::{ValueFormat, read_value, resolve_target};

pub struct ReadRequest<'a> {
    pub address: &'a str,
    pub relative: bool,
    pub chain: Option<&'a str>,
    pub value_type: ValueType,
    pub text: Option<usize>,
    pub encoding: TextEncoding,
}

impl ReadRequest<'_> {
    fn format(&self) -> ValueFormat {
        match self.text {
            Some(len) => ValueFormat::Text {
                len,
                encoding: self.encoding,
            },
            None => ValueFormat::Number(self.value_type),
        }
    }
}

/// Run the read command
pub fn run(
    pid: Option<i32>,
    replay: Option<&Path>,
    request: ReadRequest<'_>,
    options: BrowserOptions,
) -> Result<()> {
    let start = parse_hex_address(request.address)?;
    let chain = parse_offset_list(request.chain.unwrap_or(""))?;

    let mut browser = open_session(pid, replay, options)?;
    let address = resolve_target(&mut browser, start, request.relative, &chain)
        .with_context(|| format!("Failed to resolve {}", format_hex_address(start)))?;
    let value = read_value(&mut browser, address, request.format())
        .with_context(|| format!("Failed to read {}", format_hex_address(address)))?;

    println!("{} = {}", format_hex_address(address), value);
    Ok(())
}
