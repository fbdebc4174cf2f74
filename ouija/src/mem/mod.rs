mod banks;

pub use banks::*;

use std::iter;

use heapless::Vec as InlineVec;

use crate::cpu::Core;

/// The distance between work RAM and its echo at `0xE000..=0xFDFF`.
const ECHO_OFFSET: u16 = 0x2000;

/// The first address of OAM and the I/O registers, which change without the CPU writing to them.
pub const VOLATILE_START: u16 = 0xFE00;

/// The last address of the I/O registers.
pub const VOLATILE_END: u16 = 0xFF7F;

/// Every address whose byte a CPU write to `addr` changes, or `None` if the write can change
/// memory anywhere else. Only RAM with no side effects qualifies: VRAM, cartridge RAM, work RAM
/// (with its echo) and high RAM. Writes to the bank registers, OAM, I/O or `IE` give `None`.
pub fn write_aliases(addr: u16) -> Option<InlineVec<u16, 2>> {
    let mirror = match addr {
        0xC000..=0xDDFF => Some(addr + ECHO_OFFSET),
        0xE000..=0xFDFF => Some(addr - ECHO_OFFSET),
        0x8000..=0xDFFF | 0xFF80..=0xFFFE => None,
        _ => return None,
    };
    Some(iter::once(addr).chain(mirror).collect())
}

/// This trait is used to abstract over the memory map. The disassembly cache only ever reads
/// through it, which lets it be tested against plain byte buffers.
pub trait MemoryLike {
    fn read_byte(&self, addr: u16) -> u8;

    /// The three bytes starting at `addr`, wrapping at the top of the address space. This is
    /// always enough to decode one instruction.
    fn fetch(&self, addr: u16) -> [u8; 3] {
        [
            self.read_byte(addr),
            self.read_byte(addr.wrapping_add(1)),
            self.read_byte(addr.wrapping_add(2)),
        ]
    }
}

impl MemoryLike for [u8] {
    fn read_byte(&self, addr: u16) -> u8 {
        self.get(addr as usize).copied().unwrap_or_default()
    }
}

impl<const N: usize> MemoryLike for [u8; N] {
    fn read_byte(&self, addr: u16) -> u8 {
        self.as_slice().read_byte(addr)
    }
}

/// The debugger's view of the address space. ROM reads are served from the banks the debugger
/// has mapped, everything else is read from the core.
pub struct MemoryView<'a, C> {
    banks: &'a RomBanks,
    core: &'a C,
}

impl<'a, C: Core> MemoryView<'a, C> {
    pub fn new(banks: &'a RomBanks, core: &'a C) -> Self {
        Self { banks, core }
    }
}

impl<C: Core> MemoryLike for MemoryView<'_, C> {
    fn read_byte(&self, addr: u16) -> u8 {
        self.banks
            .read(addr)
            .unwrap_or_else(|| self.core.read(addr))
    }
}
