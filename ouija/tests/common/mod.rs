#![allow(dead_code)]

use std::cell::Cell;

use ouija::cpu::RunMode;
use ouija::mem::ROM_BANK_SIZE;
use ouija::{Config, Core, CpuState, Debugger, Flags, InvalidationPolicy, RomBanks, SharedBank};

/// A core that knows just enough instructions to exercise the debugger:
/// `nop`, `ld a, $n`, `inc a`, `xor a`, `ld ($nn), a`, `ldh ($ffn), a`, `call $nn`,
/// `call nz, $nn`, `call z, $nn`, `ret`, `jr $n`, `jp $nn` and `halt`. Anything else panics.
/// Only the zero flag is tracked.
///
/// Writes to `0x2000..=0x3FFF` select the ROM bank, like an MBC1. `0xE000..=0xFDFF` echoes
/// `0xC000..=0xDDFF`.
pub struct ToyCore {
    pub a: u8,
    pub z: bool,
    pub pc: u16,
    pub sp: u16,
    cycles: u32,
    mode: RunMode,
    ram: Vec<u8>,
    fixed: Option<SharedBank>,
    window: Option<SharedBank>,
    rom_bank: u16,
    report_writes: bool,
    writes: Vec<u16>,
    /// How many snapshots have been taken.
    pub state_calls: Cell<usize>,
}

impl ToyCore {
    pub fn new() -> Self {
        Self {
            a: 0,
            z: false,
            pc: 0x0100,
            sp: 0xFFFE,
            cycles: 0,
            mode: RunMode::Running,
            ram: vec![0; 0x8000],
            fixed: None,
            window: None,
            rom_bank: 1,
            report_writes: false,
            writes: Vec::new(),
            state_calls: Cell::new(0),
        }
    }

    /// Places `bytes` in RAM at `addr`.
    pub fn poke(mut self, addr: u16, bytes: &[u8]) -> Self {
        assert!(addr >= 0x8000, "{addr:04X} is not RAM");
        let start = addr as usize - 0x8000;
        self.ram[start..start + bytes.len()].copy_from_slice(bytes);
        self
    }

    pub fn reporting_writes(mut self) -> Self {
        self.report_writes = true;
        self
    }

    fn write(&mut self, addr: u16, val: u8) {
        match addr {
            0x2000..=0x3FFF => self.rom_bank = (val as u16).max(1),
            0x0000..=0x7FFF => {}
            _ => self.ram[unecho(addr) as usize - 0x8000] = val,
        }
        self.writes.push(addr);
    }

    fn imm(&self) -> u8 {
        self.read(self.pc.wrapping_add(1))
    }

    fn imm16(&self) -> u16 {
        u16::from_le_bytes([self.imm(), self.read(self.pc.wrapping_add(2))])
    }

    fn push(&mut self, val: u16) {
        let [lo, hi] = val.to_le_bytes();
        self.sp = self.sp.wrapping_sub(2);
        self.write(self.sp, lo);
        self.write(self.sp.wrapping_add(1), hi);
    }

    fn call(&mut self, pc: u16, taken: bool) -> u16 {
        if !taken {
            return pc.wrapping_add(3);
        }
        let target = self.imm16();
        self.push(pc.wrapping_add(3));
        target
    }

    fn pop(&mut self) -> u16 {
        let val = u16::from_le_bytes([self.read(self.sp), self.read(self.sp.wrapping_add(1))]);
        self.sp = self.sp.wrapping_add(2);
        val
    }
}

fn unecho(addr: u16) -> u16 {
    match addr {
        0xE000..=0xFDFF => addr - 0x2000,
        _ => addr,
    }
}

impl Core for ToyCore {
    fn init(&mut self, fixed: Option<SharedBank>) {
        self.a = 0;
        self.z = false;
        self.pc = 0x0100;
        self.sp = 0xFFFE;
        self.cycles = 0;
        self.mode = RunMode::Running;
        self.rom_bank = 1;
        self.fixed = fixed;
    }

    fn step(&mut self) {
        self.writes.clear();
        let pc = self.pc;
        self.pc = match self.read(pc) {
            0x00 => pc.wrapping_add(1),
            0x3C => {
                self.a = self.a.wrapping_add(1);
                self.z = self.a == 0;
                pc.wrapping_add(1)
            }
            0xAF => {
                self.a = 0;
                self.z = true;
                pc.wrapping_add(1)
            }
            0x3E => {
                self.a = self.imm();
                pc.wrapping_add(2)
            }
            0xEA => {
                self.write(self.imm16(), self.a);
                pc.wrapping_add(3)
            }
            0xE0 => {
                self.write(0xFF00 | self.imm() as u16, self.a);
                pc.wrapping_add(2)
            }
            0xCD => self.call(pc, true),
            0xC4 => self.call(pc, !self.z),
            0xCC => self.call(pc, self.z),
            0xC9 => self.pop(),
            0x18 => pc.wrapping_add(2).wrapping_add(self.imm() as i8 as u16),
            0xC3 => self.imm16(),
            0x76 => {
                self.mode = RunMode::Halted;
                pc.wrapping_add(1)
            }
            op => panic!("ToyCore can't execute {op:02X} at {pc:04X}"),
        };
        self.cycles += 4;
    }

    fn read(&self, addr: u16) -> u8 {
        let bank = match addr {
            0x0000..=0x3FFF => &self.fixed,
            0x4000..=0x7FFF => &self.window,
            _ => return self.ram[unecho(addr) as usize - 0x8000],
        };
        bank.as_ref()
            .map(|bank| bank[addr as usize % ROM_BANK_SIZE])
            .unwrap_or_default()
    }

    fn pc(&self) -> u16 {
        self.pc
    }

    fn cycles(&self) -> u32 {
        self.cycles
    }

    fn state(&self) -> CpuState {
        self.state_calls.set(self.state_calls.get() + 1);
        CpuState {
            a: self.a,
            f: Flags {
                z: self.z,
                ..Default::default()
            },
            sp: self.sp,
            pc: self.pc,
            cycles: self.cycles,
            mode: self.mode,
            ..Default::default()
        }
    }

    fn rom_bank(&self) -> u16 {
        self.rom_bank
    }

    fn map_rom_bank(&mut self, bank: Option<SharedBank>) {
        self.window = bank;
    }

    fn last_writes(&self) -> Option<&[u16]> {
        self.report_writes.then_some(self.writes.as_slice())
    }
}

/// A cartridge image under construction.
pub struct Cart {
    rom: Vec<u8>,
}

impl Cart {
    pub fn new(banks: usize) -> Self {
        Self {
            rom: vec![0; banks * ROM_BANK_SIZE],
        }
    }

    /// Places `bytes` at `addr` in bank 0.
    pub fn at(self, addr: u16, bytes: &[u8]) -> Self {
        self.bank(0, addr, bytes)
    }

    /// Places `bytes` at `addr` as seen when `bank` is mapped.
    pub fn bank(mut self, bank: usize, addr: u16, bytes: &[u8]) -> Self {
        let start = bank * ROM_BANK_SIZE + addr as usize % ROM_BANK_SIZE;
        self.rom[start..start + bytes.len()].copy_from_slice(bytes);
        self
    }

    pub fn banks(&self) -> RomBanks {
        RomBanks::from_rom(&self.rom)
    }
}

/// A config without the default entry point breakpoint.
pub fn no_breakpoints() -> Config {
    Config {
        breakpoints: Vec::new(),
        ..Config::default()
    }
}

pub fn debugger(core: ToyCore, cart: &Cart) -> Debugger<ToyCore> {
    Debugger::with_config(core, cart.banks(), &no_breakpoints())
}

pub fn debugger_with(
    core: ToyCore,
    cart: &Cart,
    invalidation: InvalidationPolicy,
) -> Debugger<ToyCore> {
    let config = Config {
        invalidation,
        ..no_breakpoints()
    };
    Debugger::with_config(core, cart.banks(), &config)
}
