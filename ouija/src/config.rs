use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::breakpoints::{Breakpoints, DEFAULT_BREAKPOINT};
use crate::error::Result;

/// How much of the disassembly cache is thrown away after each step.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidationPolicy {
    /// Forget every cached instruction.
    #[default]
    Full,
    /// Forget only the instructions that overlap a byte the step wrote, along with its echo and
    /// everything in OAM and the I/O registers. A write anywhere else, or a core that cannot
    /// report its writes, forgets everything as `Full` does.
    Touched,
}

/// Start-up settings for a [`Debugger`](crate::Debugger). Any key missing from a config file takes
/// its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Addresses that start out as breakpoints.
    pub breakpoints: Vec<u16>,
    pub invalidation: InvalidationPolicy,
    /// How many serial bytes may wait for the consumer before stepping blocks.
    pub serial_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            breakpoints: vec![DEFAULT_BREAKPOINT],
            invalidation: InvalidationPolicy::Full,
            serial_capacity: 0,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_toml(&data)
    }

    pub fn from_toml(data: &str) -> Result<Self> {
        Ok(toml::from_str(data)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub(crate) fn breakpoints(&self) -> Breakpoints {
        self.breakpoints.iter().copied().collect()
    }
}
