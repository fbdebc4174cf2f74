use std::sync::mpsc::SyncSender;

use tracing::{debug, trace};

use crate::cpu::Core;
use crate::instruction::Instruction;
use crate::serial::SerialOutput;

/// `ldh ($ff01), a`, the store of the accumulator into the serial data register.
const SERIAL_STORE: [u8; 2] = [0xE0, 0x01];

/// The outcome of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    Continue,
    /// The instruction just executed jumped to itself, so the program can make no further
    /// progress on its own.
    NaturalLoop,
}

/// Wraps a [`Core`] with the behavior every step shares, regardless of who asked for it: spotting
/// self-jumps and forwarding bytes written to the serial port.
#[derive(Debug)]
pub struct Machine<C> {
    core: C,
    serial: Option<SyncSender<u8>>,
    serial_capacity: usize,
}

impl<C: Core> Machine<C> {
    pub fn with_serial_capacity(core: C, serial_capacity: usize) -> Self {
        Self {
            core,
            serial: None,
            serial_capacity,
        }
    }

    pub fn core(&self) -> &C {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut C {
        &mut self.core
    }

    /// Attaches a new serial consumer. A previously attached consumer stops receiving bytes.
    pub fn attach_serial(&mut self) -> SerialOutput {
        let (send, output) = SerialOutput::channel(self.serial_capacity);
        self.serial = Some(send);
        output
    }

    /// Executes one instruction.
    ///
    /// If that instruction wrote to the serial port and a consumer is attached, this blocks until
    /// the channel has room for the byte.
    pub fn step(&mut self) -> StepResult {
        let pc = self.core.pc();
        let inst = Instruction::decode(
            pc,
            [
                self.core.read(pc),
                self.core.read(pc.wrapping_add(1)),
                self.core.read(pc.wrapping_add(2)),
            ],
        );
        self.core.step();

        if inst.bytes == SERIAL_STORE {
            let byte = self.core.state().a;
            self.emit_serial(byte);
        }

        if self.core.pc() == pc && inst.jumps_to_self() {
            trace!("Instruction at {pc:04X} jumps to itself");
            StepResult::NaturalLoop
        } else {
            StepResult::Continue
        }
    }

    fn emit_serial(&mut self, byte: u8) {
        let Some(send) = &self.serial else {
            trace!("No serial consumer attached, dropping {byte:02X}");
            return;
        };
        trace!("Serial output {byte:02X}");
        if send.send(byte).is_err() {
            debug!("Serial consumer hung up");
            self.serial = None;
        }
    }
}
