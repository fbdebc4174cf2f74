use std::fmt;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::command::Command;
use crate::cpu::{Core, CpuState};
use crate::debugger::{CancelToken, Debugger, Stop};
use crate::error::{Error, Result};
use crate::instruction::Instruction;

struct Request {
    command: Command,
    reply: mpsc::Sender<Response>,
}

/// What a command produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    /// Execution stopped. The state is the one execution stopped in.
    Stopped { reason: Stop, state: CpuState },
    Listing(Vec<Instruction>),
    Memory { start: u16, bytes: Vec<u8> },
    State(CpuState),
    /// A breakpoint was toggled.
    Breakpoint { addr: u16, set: bool },
    Breakpoints(Vec<u16>),
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Stopped { reason, state } => write!(f, "{reason}\n{state}"),
            Response::Listing(insts) => {
                let mut lines = insts.iter();
                if let Some(inst) = lines.next() {
                    write!(f, "{inst}")?;
                }
                lines.try_for_each(|inst| write!(f, "\n{inst}"))
            }
            Response::Memory { start, bytes } => {
                write!(f, "{start:04X}:")?;
                bytes.iter().try_for_each(|byte| write!(f, " {byte:02X}"))
            }
            Response::State(state) => write!(f, "{state}"),
            Response::Breakpoint { addr, set: true } => write!(f, "breakpoint set at {addr:04X}"),
            Response::Breakpoint { addr, set: false } => {
                write!(f, "breakpoint removed at {addr:04X}")
            }
            Response::Breakpoints(addrs) => {
                let mut addrs = addrs.iter();
                if let Some(addr) = addrs.next() {
                    write!(f, "{addr:04X}")?;
                }
                addrs.try_for_each(|addr| write!(f, " {addr:04X}"))
            }
        }
    }
}

/// A debugger running on its own thread. Commands are queued and executed one at a time, in the
/// order they were sent.
pub struct Session {
    commands: Option<mpsc::Sender<Request>>,
    cancel: CancelToken,
    worker: Option<JoinHandle<()>>,
}

impl Session {
    /// Moves `debugger` onto a new thread that serves commands until the session is dropped.
    pub fn spawn<C>(mut debugger: Debugger<C>) -> Self
    where
        C: 'static + Send + Core,
    {
        let cancel = debugger.cancel_token();
        let (send, recv) = mpsc::channel::<Request>();
        let worker = thread::spawn(move || {
            for Request { command, reply } in recv {
                trace!("Processing {command:?}");
                let response = process(&mut debugger, command);
                if reply.send(response).is_err() {
                    debug!("Requester went away before the response was ready");
                }
            }
            debug!("Command queue closed");
        });
        Self {
            commands: Some(send),
            cancel,
            worker: Some(worker),
        }
    }

    /// Queues `command` and waits for the debugger to finish it.
    pub fn execute(&self, command: Command) -> Result<Response> {
        let commands = self.commands.as_ref().ok_or(Error::SessionClosed)?;
        let (reply, response) = mpsc::channel();
        commands
            .send(Request { command, reply })
            .map_err(|_| Error::SessionClosed)?;
        response.recv().map_err(|_| Error::SessionClosed)
    }

    /// A token that interrupts whichever long-running command is executing.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.commands.take();
        self.cancel.cancel();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Debugger thread panicked");
            }
        }
    }
}

fn process<C: Core>(debugger: &mut Debugger<C>, command: Command) -> Response {
    let reason = match command {
        Command::Step { count } => {
            let mut reason = Stop::Completed;
            for _ in 0..count {
                reason = debugger.step_into();
                if reason != Stop::Completed {
                    break;
                }
            }
            reason
        }
        Command::Over => debugger.step_over(),
        Command::Out => debugger.step_out(),
        Command::Run => debugger.run(),
        Command::Break { addr } => {
            let set = debugger.toggle_breakpoint(addr);
            return Response::Breakpoint { addr, set };
        }
        Command::Breakpoints => {
            return Response::Breakpoints(debugger.breakpoints().iter().collect());
        }
        Command::Disassemble { addr, count } => {
            let start = addr.unwrap_or_else(|| debugger.pc());
            return Response::Listing(debugger.listing(start, count));
        }
        Command::Read { addr, len } => {
            return Response::Memory {
                start: addr,
                bytes: debugger.dump(addr, len),
            };
        }
        Command::Registers => return Response::State(debugger.cpu_state().clone()),
    };
    Response::Stopped {
        reason,
        state: debugger.cpu_state().clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::Response;
    use crate::Instruction;

    #[test]
    fn response_display() {
        let listing = Response::Listing(vec![
            Instruction::decode(0x0100, [0x00, 0x00, 0x00]),
            Instruction::decode(0x0101, [0xC3, 0x50, 0x01]),
        ]);
        assert_eq!(listing.to_string(), "0100 00       nop\n0101 C3 50 01 jp $0150");

        let memory = Response::Memory {
            start: 0xFF01,
            bytes: vec![0x48, 0x69],
        };
        assert_eq!(memory.to_string(), "FF01: 48 69");

        assert_eq!(
            Response::Breakpoints(vec![0xC000, 0x0150]).to_string(),
            "C000 0150"
        );
        assert_eq!(
            Response::Breakpoint {
                addr: 0xC000,
                set: false
            }
            .to_string(),
            "breakpoint removed at C000"
        );
    }
}
