//! Ouija is the debugger engine for the specters project. It drives a Game Boy CPU core one
//! instruction at a time and keeps a consistent picture of what the core is doing: the
//! disassembly around PC, breakpoints, the mapped ROM bank, and the register state. The core
//! itself is supplied by the caller through the [`Core`] trait, and rendering is left to whatever
//! front end wraps this crate.
//!
//! The [`Debugger`] is single threaded. To drive it from a UI thread, move it into a [`Session`],
//! which serializes commands through a queue.

pub mod breakpoints;
pub mod cache;
pub mod command;
pub mod config;
pub mod cpu;
pub mod debugger;
pub mod error;
pub mod instruction;
pub mod lookup;
pub mod machine;
pub mod mem;
pub mod serial;
pub mod session;

pub use breakpoints::Breakpoints;
pub use cache::DisassemblyCache;
pub use command::{Command, ReplCommand};
pub use config::{Config, InvalidationPolicy};
pub use cpu::{Core, CpuState, Flags, RunMode};
pub use debugger::{CancelToken, Debugger, Stop};
pub use error::{Error, Result};
pub use instruction::Instruction;
pub use lookup::decode;
pub use machine::{Machine, StepResult};
pub use mem::{MemoryLike, RomBanks, SharedBank};
pub use serial::SerialOutput;
pub use session::{Response, Session};
