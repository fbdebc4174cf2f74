use std::collections::HashMap;
use std::ops::RangeInclusive;

use tracing::trace;

use crate::instruction::Instruction;
use crate::mem::MemoryLike;

/// Memoizes decoded instructions by address.
///
/// Entries carry no notion of freshness. Whoever owns the cache is responsible for invalidating
/// the addresses whose bytes may have changed since they were decoded.
#[derive(Debug, Default, Clone)]
pub struct DisassemblyCache {
    entries: HashMap<u16, Instruction>,
}

impl DisassemblyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the instruction at `addr`, decoding it from `mem` on a miss.
    pub fn get(&mut self, addr: u16, mem: &impl MemoryLike) -> &Instruction {
        self.entries
            .entry(addr)
            .or_insert_with(|| Instruction::decode(addr, mem.fetch(addr)))
    }

    /// Returns the cached instruction at `addr` without decoding anything.
    pub fn peek(&self, addr: u16) -> Option<&Instruction> {
        self.entries.get(&addr)
    }

    /// The address right after the instruction at `addr`.
    pub fn next_addr(&mut self, addr: u16, mem: &impl MemoryLike) -> u16 {
        self.get(addr, mem).next_addr()
    }

    /// Finds the closest address before `addr` whose instruction ends exactly at `addr`.
    ///
    /// Known instruction boundaries are preferred, nearest first. Failing that, the bytes before
    /// `addr` are decoded speculatively, farthest first, and nothing decoded this way is cached.
    /// Returns `addr` itself if no candidate lands on it.
    pub fn prev_addr(&self, addr: u16, mem: &impl MemoryLike) -> u16 {
        let candidates = |distances: [u16; 3]| {
            distances
                .into_iter()
                .filter_map(move |dist| addr.checked_sub(dist).map(|start| (start, dist)))
        };

        let cached = candidates([1, 2, 3]).find(|&(start, dist)| {
            self.peek(start)
                .is_some_and(|inst| inst.size() as u16 == dist)
        });
        if let Some((start, _)) = cached {
            return start;
        }

        candidates([3, 2, 1])
            .find(|&(start, dist)| {
                Instruction::decode(start, mem.fetch(start)).size() as u16 == dist
            })
            .map_or(addr, |(start, _)| start)
    }

    pub fn invalidate_all(&mut self) {
        if !self.entries.is_empty() {
            trace!("Invalidating {} cached instructions", self.entries.len());
            self.entries.clear();
        }
    }

    /// Drops every entry whose address lies in `start..=end`.
    pub fn invalidate_range(&mut self, start: u16, end: u16) {
        self.invalidate(start..=end);
    }

    fn invalidate(&mut self, range: RangeInclusive<u16>) {
        if range.is_empty() || self.entries.is_empty() {
            return;
        }
        trace!(
            "Invalidating cached instructions in {:04X}..={:04X}",
            range.start(),
            range.end()
        );
        self.entries.retain(|addr, _| !range.contains(addr));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
