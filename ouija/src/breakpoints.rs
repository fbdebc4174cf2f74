use indexmap::IndexMap;
use tracing::debug;

/// Where execution conventionally enters a program loaded into work RAM. A fresh registry stops
/// there.
pub const DEFAULT_BREAKPOINT: u16 = 0xC000;

/// The set of breakpoint addresses. Only toggled addresses are tracked, and anything absent is not
/// a breakpoint. Addresses keep the order in which they were first toggled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoints(IndexMap<u16, bool>);

impl Breakpoints {
    /// A registry with no breakpoints at all.
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Flips `addr` between set and unset, returning whether it is now set.
    pub fn toggle(&mut self, addr: u16) -> bool {
        let enabled = self.0.entry(addr).or_insert(false);
        *enabled = !*enabled;
        debug!("Breakpoint at {addr:04X} is now {}", if *enabled { "set" } else { "unset" });
        *enabled
    }

    pub fn is_set(&self, addr: u16) -> bool {
        self.0.get(&addr).copied().unwrap_or_default()
    }

    /// Every set breakpoint, in first-toggle order.
    pub fn iter(&self) -> impl '_ + Iterator<Item = u16> {
        self.0
            .iter()
            .filter_map(|(addr, enabled)| enabled.then_some(*addr))
    }
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self::from_iter([DEFAULT_BREAKPOINT])
    }
}

impl FromIterator<u16> for Breakpoints {
    fn from_iter<T: IntoIterator<Item = u16>>(iter: T) -> Self {
        Self(iter.into_iter().map(|addr| (addr, true)).collect())
    }
}
