//! Register cache.
//!
//! Masked writes need the current register value. Reading through to the hardware for every one
//! would be slow and, once writes have been recorded but not executed, wrong: the cache holds
//! the value the register will have at that point of the script.

use std::collections::HashMap;

/// One cached register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntry {
    /// Last known value.
    pub value: u32,
    /// Whether `value` may be used without reading the hardware.
    pub valid: bool,
}

/// Address-keyed register cache with hit/miss accounting.
#[derive(Debug, Clone, Default)]
pub struct RegisterCache {
    entries: HashMap<u32, CacheEntry>,
    hits: u64,
    misses: u64,
}

impl RegisterCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value of `addr`, counting a hit or a miss.
    pub fn lookup(&mut self, addr: u32) -> Option<u32> {
        match self.entries.get(&addr) {
            Some(entry) if entry.valid => {
                self.hits += 1;
                Some(entry.value)
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    /// Records `value` as the current content of `addr`.
    pub fn store(&mut self, addr: u32, value: u32) {
        let _ = self
            .entries
            .insert(addr, CacheEntry { value, valid: true });
    }

    /// Returns the entry for `addr` without touching the counters.
    pub fn peek(&self, addr: u32) -> Option<CacheEntry> {
        self.entries.get(&addr).copied()
    }

    /// Drops every entry. Counters are kept.
    pub fn invalidate(&mut self) {
        self.entries.clear();
    }

    /// Returns the number of cached registers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of lookups served from the cache.
    pub const fn hits(&self) -> u64 {
        self.hits
    }

    /// Returns the number of lookups that had to read the hardware.
    pub const fn misses(&self) -> u64 {
        self.misses
    }
}
