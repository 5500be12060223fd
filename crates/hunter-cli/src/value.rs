//! Address resolution and typed reads shared by `read` and `watch`.

use hunter_core::{Browser, MemorySource, Result, TextEncoding};

use crate::cli::ValueType;

/// What to read once the final address is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    Number(ValueType),
    Text { len: usize, encoding: TextEncoding },
}

/// Apply the optional RIP-relative step, then the pointer chain.
pub fn resolve_target<S: MemorySource>(
    browser: &mut Browser<S>,
    address: u64,
    relative: bool,
    chain: &[u64],
) -> Result<u64> {
    let base = if relative {
        browser.resolve_relative(address, true)?
    } else {
        address
    };
    browser.resolve_chain(base, chain, true)
}

/// Read the value at `address` and render it for display.
pub fn read_value<S: MemorySource>(
    browser: &mut Browser<S>,
    address: u64,
    format: ValueFormat,
) -> Result<String> {
    let ty = match format {
        ValueFormat::Text { len, encoding } => {
            return browser.read_text(address, len, encoding, true);
        }
        ValueFormat::Number(ty) => ty,
    };
    Ok(match ty {
        ValueType::U8 => browser.read::<u8>(address, true)?.to_string(),
        ValueType::I8 => browser.read::<i8>(address, true)?.to_string(),
        ValueType::U16 => browser.read::<u16>(address, true)?.to_string(),
        ValueType::I16 => browser.read::<i16>(address, true)?.to_string(),
        ValueType::U32 => browser.read::<u32>(address, true)?.to_string(),
        ValueType::I32 => browser.read::<i32>(address, true)?.to_string(),
        ValueType::U64 => browser.read::<u64>(address, true)?.to_string(),
        ValueType::I64 => browser.read::<i64>(address, true)?.to_string(),
        ValueType::F32 => format!("{:.3}", browser.read::<f32>(address, true)?),
        ValueType::F64 => format!("{:.3}", browser.read::<f64>(address, true)?),
    })
}
