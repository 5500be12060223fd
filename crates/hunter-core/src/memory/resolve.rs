//! Turning matched code locations into data addresses.

use crate::error::{Error, Result};
use crate::memory::browser::Browser;
use crate::process::MemorySource;

/// x86-64 RIP-relative addressing layout: `48 8B 0D <disp32>` and friends.
pub mod rip {
    /// Bytes before the 32-bit displacement (REX prefix, opcode, ModRM).
    pub const OPCODE_LENGTH: u64 = 3;
    /// Width of the displacement.
    pub const OPERAND_LENGTH: u64 = 4;
    /// The displacement is relative to the end of the instruction.
    pub const INSTRUCTION_LENGTH: u64 = OPCODE_LENGTH + OPERAND_LENGTH;
}

impl<S: MemorySource> Browser<S> {
    /// Target of the RIP-relative instruction at `address`.
    ///
    /// Reads the signed displacement at `address + 3` and adds it to the
    /// address of the next instruction.
    pub fn resolve_relative(&mut self, address: u64, allow_refresh: bool) -> Result<u64> {
        if address == 0 {
            return Err(Error::not_mapped(address, "null instruction address"));
        }
        let operand = address
            .checked_add(rip::OPCODE_LENGTH)
            .ok_or_else(|| Error::not_mapped(address, "instruction runs past the address space"))?;
        let displacement: i32 = self.read(operand, allow_refresh)?;
        Ok(address
            .wrapping_add(rip::INSTRUCTION_LENGTH)
            .wrapping_add_signed(i64::from(displacement)))
    }

    pub fn try_resolve_relative(&mut self, address: u64, allow_refresh: bool) -> Option<u64> {
        self.resolve_relative(address, allow_refresh).ok()
    }

    /// Follow a pointer chain starting at `start`.
    ///
    /// Each offset is applied after dereferencing the current address, so
    /// `[a, b]` reads the pointer at `start`, adds `a`, reads the pointer
    /// there and adds `b`. A null pointer anywhere ends the walk with
    /// [`Error::AddressNotMapped`]. An empty chain returns `start`.
    pub fn resolve_chain(&mut self, start: u64, offsets: &[u64], allow_refresh: bool) -> Result<u64> {
        let mut address = start;
        for (depth, offset) in offsets.iter().enumerate() {
            let pointer: u64 = self.read(address, allow_refresh)?;
            if pointer == 0 {
                return Err(Error::not_mapped(
                    address,
                    format!("null pointer at link {}", depth),
                ));
            }
            address = pointer.wrapping_add(*offset);
        }
        Ok(address)
    }

    pub fn try_resolve_chain(
        &mut self,
        start: u64,
        offsets: &[u64],
        allow_refresh: bool,
    ) -> Option<u64> {
        self.resolve_chain(start, offsets, allow_refresh).ok()
    }
}
