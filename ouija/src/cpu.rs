use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::mem::SharedBank;

/// The single-instruction interface of a CPU core. The debugger drives a core exclusively through
/// this trait and never looks at how instructions are executed.
pub trait Core {
    /// Resets the core to its power-on state and attaches ROM bank 0.
    fn init(&mut self, fixed: Option<SharedBank>);

    /// Executes exactly one instruction.
    fn step(&mut self);

    /// Reads a byte through whatever banking the core currently has mapped.
    fn read(&self, addr: u16) -> u8;

    fn pc(&self) -> u16;

    /// A counter that increases whenever the core makes progress.
    fn cycles(&self) -> u32;

    fn state(&self) -> CpuState;

    /// The ROM bank the core's bank register currently selects.
    fn rom_bank(&self) -> u16;

    /// Points the core's switchable ROM window at `bank`, or at nothing.
    fn map_rom_bank(&mut self, bank: Option<SharedBank>);

    /// The addresses written by the last call to `step`, or `None` if the core does not track
    /// them. A core that reports writes must report every one, including writes to bank
    /// registers and I/O. Changes the CPU didn't write, such as DMA, are accounted for by the
    /// debugger.
    fn last_writes(&self) -> Option<&[u16]> {
        None
    }
}

#[derive(
    Debug, Default, Hash, Clone, Copy, PartialEq, Eq, derive_more::Display, Serialize, Deserialize,
)]
pub enum RunMode {
    #[default]
    #[display("R")]
    Running,
    #[display("H")]
    Halted,
    #[display("S")]
    Stopped,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Hash, derive_more::Display, Serialize, Deserialize,
)]
#[display(
    "{}{}{}{}",
    flag_char(*z, 'Z'),
    flag_char(*n, 'N'),
    flag_char(*h, 'H'),
    flag_char(*c, 'C')
)]
pub struct Flags {
    /// The zero flag
    pub z: bool,
    /// The substraction flag
    pub n: bool,
    /// The half-carry flag
    pub h: bool,
    /// The full carry flag
    pub c: bool,
}

fn flag_char(set: bool, name: char) -> char {
    if set {
        name
    } else {
        name.to_ascii_lowercase()
    }
}

impl From<u8> for Flags {
    fn from(value: u8) -> Self {
        Self {
            z: check_bit_const::<7>(value),
            n: check_bit_const::<6>(value),
            h: check_bit_const::<5>(value),
            c: check_bit_const::<4>(value),
        }
    }
}

pub const fn check_bit_const<const B: u8>(src: u8) -> bool {
    let bit = const {
        match B {
            n @ 0..=7 => 0x1 << n,
            _ => panic!("You must select between the 0th and 7th bit!"),
        }
    };
    (src & bit) == bit
}

/// A read-only copy of the core's registers, taken between instructions.
#[derive(Debug, Default, Hash, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuState {
    pub a: u8,
    pub f: Flags,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
    pub cycles: u32,
    pub mode: RunMode,
    /// The interrupt master enable flag
    pub ime: bool,
}

impl fmt::Display for CpuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            " b {:02X} c {:02X} d {:02X} e {:02X}",
            self.b, self.c, self.d, self.e
        )?;
        writeln!(
            f,
            " h {:02X} l {:02X} a {:02X} f {}",
            self.h, self.l, self.a, self.f
        )?;
        write!(
            f,
            " sp {:04X} pc {:04X} {} {} #{}",
            self.sp,
            self.pc,
            self.mode,
            if self.ime { 'E' } else { 'D' },
            self.cycles
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{CpuState, Flags, RunMode};

    #[test]
    fn flags_from_f() {
        let flags = Flags::from(0xB0);
        assert!(flags.z && !flags.n && flags.h && flags.c);
        // The low nibble of F is unused.
        assert_eq!(Flags::from(0x0F), Flags::default());
        assert_eq!(Flags::from(0xFF).to_string(), "ZNHC");
        assert_eq!(Flags::from(0x40).to_string(), "zNhc");
    }

    #[test]
    fn state_display() {
        let state = CpuState {
            a: 0x01,
            f: Flags::from(0xB0),
            b: 0x00,
            c: 0x13,
            d: 0x00,
            e: 0xD8,
            h: 0x01,
            l: 0x4D,
            sp: 0xFFFE,
            pc: 0x0100,
            cycles: 1234,
            mode: RunMode::Halted,
            ime: true,
        };
        assert_eq!(
            state.to_string(),
            " b 00 c 13 d 00 e D8\n h 01 l 4D a 01 f ZnHC\n sp FFFE pc 0100 H E #1234"
        );
    }
}
