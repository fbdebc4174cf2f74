use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::breakpoints::Breakpoints;
use crate::cache::DisassemblyCache;
use crate::config::{Config, InvalidationPolicy};
use crate::cpu::{Core, CpuState};
use crate::instruction::Instruction;
use crate::machine::{Machine, StepResult};
use crate::mem::{
    write_aliases, MemoryLike, MemoryView, RomBanks, BANK_WINDOW_END, BANK_WINDOW_START,
    VOLATILE_END, VOLATILE_START,
};
use crate::serial::SerialOutput;

/// Why a controller operation handed control back.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display, Serialize, Deserialize,
)]
pub enum Stop {
    /// The operation did what it was asked to do.
    #[display("completed")]
    Completed,
    #[display("breakpoint at {_0:04X}")]
    Breakpoint(u16),
    /// The last instruction jumped to itself.
    #[display("natural loop at {_0:04X}")]
    NaturalLoop(u16),
    #[display("cancelled at {_0:04X}")]
    Cancelled(u16),
}

/// A handle that interrupts a long-running operation (`run`, `step_over` or `step_out`) from
/// another thread. A request made while nothing is running stops the next such operation after
/// its first step.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

/// The execution controller. It owns the core and everything the debugger knows about it, and is
/// meant to be driven from a single thread (see [`Session`](crate::Session) for sharing one).
pub struct Debugger<C> {
    machine: Machine<C>,
    banks: RomBanks,
    /// The bank index last reported by the core.
    selected_bank: Option<u16>,
    cache: DisassemblyCache,
    breakpoints: Breakpoints,
    /// The last snapshot and the cycle count it was taken at.
    snapshot: Option<(u32, CpuState)>,
    policy: InvalidationPolicy,
    cancel: CancelToken,
}

impl<C: Core> Debugger<C> {
    pub fn new(core: C, banks: RomBanks) -> Self {
        Self::with_config(core, banks, &Config::default())
    }

    pub fn with_config(mut core: C, banks: RomBanks, config: &Config) -> Self {
        core.init(banks.fixed());
        core.map_rom_bank(banks.mapped());
        let mut debugger = Self {
            machine: Machine::with_serial_capacity(core, config.serial_capacity),
            banks,
            selected_bank: None,
            cache: DisassemblyCache::new(),
            breakpoints: config.breakpoints(),
            snapshot: None,
            policy: config.invalidation,
            cancel: CancelToken::default(),
        };
        debugger.sync_banks();
        debugger
    }

    pub fn core(&self) -> &C {
        self.machine.core()
    }

    /// Hands the core to `f` to be modified directly, for example to patch code or registers.
    /// Everything derived from the core is refreshed afterwards.
    pub fn with_core_mut<R>(&mut self, f: impl FnOnce(&mut C) -> R) -> R {
        let output = f(self.machine.core_mut());
        self.snapshot = None;
        self.cache.invalidate_all();
        self.sync_banks();
        output
    }

    pub fn pc(&self) -> u16 {
        self.machine.core().pc()
    }

    pub fn banks(&self) -> &RomBanks {
        &self.banks
    }

    pub fn cache(&self) -> &DisassemblyCache {
        &self.cache
    }

    pub fn read(&self, addr: u16) -> u8 {
        self.memory().read_byte(addr)
    }

    /// `len` bytes starting at `start`, wrapping at the top of the address space.
    pub fn dump(&self, start: u16, len: usize) -> Vec<u8> {
        let mem = self.memory();
        (0..len)
            .map(|i| mem.read_byte(start.wrapping_add(i as u16)))
            .collect()
    }

    pub fn disassemble(&mut self, addr: u16) -> Instruction {
        let mem = MemoryView::new(&self.banks, self.machine.core());
        self.cache.get(addr, &mem).clone()
    }

    /// `count` consecutive instructions starting at `start`.
    pub fn listing(&mut self, start: u16, count: usize) -> Vec<Instruction> {
        let mem = MemoryView::new(&self.banks, self.machine.core());
        let mut addr = start;
        (0..count)
            .map(|_| {
                let inst = self.cache.get(addr, &mem).clone();
                addr = inst.next_addr();
                inst
            })
            .collect()
    }

    pub fn next_addr(&mut self, addr: u16) -> u16 {
        let mem = MemoryView::new(&self.banks, self.machine.core());
        self.cache.next_addr(addr, &mem)
    }

    pub fn prev_addr(&self, addr: u16) -> u16 {
        self.cache.prev_addr(addr, &self.memory())
    }

    /// Drops every cached instruction.
    pub fn invalidate_disassembly(&mut self) {
        self.cache.invalidate_all();
    }

    pub fn breakpoints(&self) -> &Breakpoints {
        &self.breakpoints
    }

    /// Returns whether `addr` is now a breakpoint.
    pub fn toggle_breakpoint(&mut self, addr: u16) -> bool {
        self.breakpoints.toggle(addr)
    }

    pub fn is_breakpoint(&self, addr: u16) -> bool {
        self.breakpoints.is_set(addr)
    }

    /// The core's registers. The snapshot is only retaken once the core has made progress.
    pub fn cpu_state(&mut self) -> &CpuState {
        let cycles = self.machine.core().cycles();
        if self.snapshot.as_ref().is_some_and(|(taken, _)| *taken != cycles) {
            self.snapshot = None;
        }
        let (_, state) = self
            .snapshot
            .get_or_insert_with(|| (cycles, self.machine.core().state()));
        state
    }

    /// Attaches a consumer to the serial port. Until one is attached, serial output is dropped.
    pub fn serial_output(&mut self) -> SerialOutput {
        self.machine.attach_serial()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Executes exactly one instruction. Breakpoints are not consulted.
    pub fn step_into(&mut self) -> Stop {
        let stop = match self.step() {
            StepResult::Continue => Stop::Completed,
            StepResult::NaturalLoop => Stop::NaturalLoop(self.pc()),
        };
        debug!("Step into: {stop}");
        stop
    }

    /// Executes the instruction at PC. If it is a call, execution continues until control comes
    /// back to the instruction after it.
    pub fn step_over(&mut self) -> Stop {
        let inst = self.disassemble(self.pc());
        if !inst.is_call() {
            return self.step_into();
        }
        let ret = inst.next_addr();
        debug!("Stepping over call at {:04X}, expecting {ret:04X}", inst.address);
        let stop = self.step_until(|dbg| dbg.pc() == ret);
        debug!("Step over: {stop}");
        stop
    }

    /// Runs until a breakpoint or a natural loop.
    pub fn run(&mut self) -> Stop {
        let stop = self.step_until(|_| false);
        debug!("Run: {stop}");
        stop
    }

    /// Runs until the next instruction to execute is a return.
    pub fn step_out(&mut self) -> Stop {
        let stop = self.step_until(|dbg| {
            let pc = dbg.pc();
            dbg.disassemble(pc).is_return()
        });
        debug!("Step out: {stop}");
        stop
    }

    /// Steps at least once, stopping on a breakpoint, a natural loop, `done`, or cancellation,
    /// checked in that order.
    fn step_until(&mut self, mut done: impl FnMut(&mut Self) -> bool) -> Stop {
        loop {
            let result = self.step();
            let pc = self.pc();
            if self.breakpoints.is_set(pc) {
                return Stop::Breakpoint(pc);
            }
            if result == StepResult::NaturalLoop {
                return Stop::NaturalLoop(pc);
            }
            if done(self) {
                return Stop::Completed;
            }
            if self.cancel.take() {
                return Stop::Cancelled(pc);
            }
        }
    }

    fn step(&mut self) -> StepResult {
        let result = self.machine.step();
        self.sync_banks();
        let touched = match (self.policy, self.machine.core().last_writes()) {
            (InvalidationPolicy::Touched, Some(writes)) => writes
                .iter()
                .map(|&addr| write_aliases(addr))
                .collect::<Option<Vec<_>>>(),
            _ => None,
        };
        match touched {
            Some(aliases) => {
                // A changed byte affects any instruction that covers it, and those start at most
                // two bytes earlier.
                self.cache.invalidate_range(VOLATILE_START - 2, VOLATILE_END);
                for addr in aliases.into_iter().flatten() {
                    self.cache.invalidate_range(addr.saturating_sub(2), addr);
                }
            }
            None => self.cache.invalidate_all(),
        }
        result
    }

    /// Follows the core's bank register. Returns whether a different bank is now mapped.
    fn sync_banks(&mut self) -> bool {
        let selected = self.machine.core().rom_bank();
        if self.selected_bank == Some(selected) {
            return false;
        }
        self.selected_bank = Some(selected);
        if !self.banks.remap(selected) {
            return false;
        }
        debug!("Switched to ROM bank {selected}");
        self.machine.core_mut().map_rom_bank(self.banks.mapped());
        self.cache
            .invalidate_range(BANK_WINDOW_START, BANK_WINDOW_END);
        true
    }

    fn memory(&self) -> MemoryView<'_, C> {
        MemoryView::new(&self.banks, self.machine.core())
    }
}
