use std::fmt::Debug;
use std::sync::Arc;

use tracing::warn;

/// The size of a ROM bank, 16 KiB.
pub const ROM_BANK_SIZE: usize = 16 * 1024;

/// The byte read from the switchable window while no bank is mapped there.
pub const UNMAPPED_ROM_BYTE: u8 = 0x00;

/// The first address of the switchable ROM window.
pub const BANK_WINDOW_START: u16 = 0x4000;

/// The last address of the switchable ROM window.
pub const BANK_WINDOW_END: u16 = 0x7FFF;

/// A ROM bank. Banks are shared between the debugger's view and the core that executes out of
/// them, so the buffer is never copied when the mapping changes.
pub type SharedBank = Arc<[u8; ROM_BANK_SIZE]>;

/// Every ROM bank loaded from a cartridge, plus which of them is mapped into the switchable
/// window. Bank 0 is always visible at `0x0000..=0x3FFF`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RomBanks {
    banks: Vec<SharedBank>,
    mapped: Option<u16>,
}

impl RomBanks {
    /// Splits a ROM image into banks. The final bank is padded with zeros. Bank 1 (when present)
    /// starts out mapped, matching the power-on state of the bank register.
    pub fn from_rom(rom: &[u8]) -> Self {
        let banks: Vec<SharedBank> = rom
            .chunks(ROM_BANK_SIZE)
            .map(|chunk| {
                let mut bank = [0; ROM_BANK_SIZE];
                bank[..chunk.len()].copy_from_slice(chunk);
                Arc::new(bank)
            })
            .collect();
        let mapped = (banks.len() > 1).then_some(1);
        Self { banks, mapped }
    }

    /// The number of loaded banks, including bank 0.
    pub fn len(&self) -> usize {
        self.banks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banks.is_empty()
    }

    /// Bank 0, if any ROM was loaded.
    pub fn fixed(&self) -> Option<SharedBank> {
        self.banks.first().cloned()
    }

    /// The index of the bank currently mapped into the switchable window.
    pub fn mapped_index(&self) -> Option<u16> {
        self.mapped
    }

    pub fn mapped(&self) -> Option<SharedBank> {
        self.mapped.and_then(|index| self.banks.get(index as usize).cloned())
    }

    /// Points the switchable window at bank `index`. If no such bank was loaded, nothing is mapped
    /// and the window reads as [`UNMAPPED_ROM_BYTE`]. Returns whether the mapping changed.
    pub fn remap(&mut self, index: u16) -> bool {
        let mapped = if (index as usize) < self.banks.len() {
            Some(index)
        } else {
            warn!(
                "ROM bank {index} selected but only {} banks are loaded",
                self.banks.len()
            );
            None
        };
        let changed = self.mapped != mapped;
        self.mapped = mapped;
        changed
    }

    /// Reads a ROM address. Returns `None` for anything outside `0x0000..=0x7FFF`.
    pub fn read(&self, addr: u16) -> Option<u8> {
        let index = addr as usize % ROM_BANK_SIZE;
        match addr {
            0x0000..BANK_WINDOW_START => Some(
                self.banks
                    .first()
                    .map(|bank| bank[index])
                    .unwrap_or(UNMAPPED_ROM_BYTE),
            ),
            BANK_WINDOW_START..=BANK_WINDOW_END => Some(
                self.mapped
                    .and_then(|i| self.banks.get(i as usize))
                    .map(|bank| bank[index])
                    .unwrap_or(UNMAPPED_ROM_BYTE),
            ),
            _ => None,
        }
    }
}

impl Debug for RomBanks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RomBanks")
            .field("banks", &self.banks.len())
            .field("mapped", &self.mapped)
            .finish()
    }
}
