//! Defines the commands that a REPL (or any other front end) can queue up for a debugger.

use std::num::ParseIntError;

use clap::Parser;
use clap::Subcommand;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(multicall = true)]
pub struct ReplCommand {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand, Serialize, Deserialize)]
pub enum Command {
    /// Executes single instructions, stopping early on a natural loop.
    Step {
        #[arg(default_value_t = 1)]
        count: usize,
    },
    /// Executes the next instruction, running through it if it is a call.
    Over,
    /// Runs until the next instruction to execute is a return.
    Out,
    /// Runs until a breakpoint or a natural loop is hit.
    Run,
    /// Toggles the breakpoint at an address.
    Break {
        #[arg(value_parser = parse_int)]
        addr: u16,
    },
    /// Lists the breakpoints that are set.
    Breakpoints,
    /// Disassembles instructions, starting at PC if no address is given.
    #[command(alias = "dis")]
    Disassemble {
        #[arg(value_parser = parse_int)]
        addr: Option<u16>,
        #[arg(short, long, default_value_t = 8)]
        count: usize,
    },
    /// Reads a range of memory.
    Read {
        #[arg(value_parser = parse_int)]
        addr: u16,
        #[arg(default_value_t = 1)]
        len: usize,
    },
    /// Shows the CPU's registers.
    #[command(alias = "regs")]
    Registers,
}

impl Command {
    /// Parses a line of user input.
    pub fn parse_line(line: &str) -> Result<Self, clap::Error> {
        ReplCommand::try_parse_from(line.split_whitespace()).map(|repl| repl.command)
    }
}

fn parse_int(input: &str) -> Result<u16, ParseIntError> {
    if let Some(input) = input.strip_prefix("0x") {
        u16::from_str_radix(input, 16)
    } else if let Some(input) = input.strip_prefix("0b") {
        u16::from_str_radix(input, 2)
    } else {
        input.parse()
    }
}
