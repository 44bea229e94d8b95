// SPDX-License-Identifier: AGPL-3.0-or-later
// TernDB - Distributed Transactional Key-Value Store
// Copyright (C) 2026 Sushanth Reddy Vanagala (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Per-key latch manager
//!
//! Latches serialize commands whose write sets overlap. A latch is a
//! short-lived per-key mutual exclusion token: all keys a command might
//! write are latched at once before it reads MVCC state, and released after
//! its write batch is applied. This is what makes read-check-stage sequences
//! atomic with respect to other writers - not to be confused with the
//! transaction locks the protocol itself persists.
//!
//! The key space is partitioned into slots, each guarding a subset of keys
//! with its own mutex and latch table. A command touching keys in several
//! slots locks the slot mutexes in ascending slot order, which makes the
//! multi-slot protocol deadlock-free regardless of key interleaving.
//!
//! Waiting is a one-shot handshake: a conflicting acquire returns the
//! current holder's [`WaitHandle`]; the caller blocks on it and retries once
//! the holder releases. Acquisition is all-or-nothing - a conflict on any
//! key reserves nothing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex, MutexGuard};
use xxhash_rust::xxh3::xxh3_64;

/// Reference slot count. Keep it at or above the expected concurrent
/// command fan-out so contention tracks true key overlap rather than hash
/// collisions.
pub const DEFAULT_SLOTS: usize = 128;

/// Latch manager tuning.
#[derive(Debug, Clone)]
pub struct LatchConfig {
    /// Number of hash slots; must be a power of two.
    pub slots: usize,
}

impl Default for LatchConfig {
    fn default() -> Self {
        Self {
            slots: DEFAULT_SLOTS,
        }
    }
}

/// One-shot notification a blocked command parks on.
///
/// The holder signals exactly once on release; any number of waiters may be
/// parked and all of them wake. A handle that was signalled before `wait`
/// is called does not block.
#[derive(Debug, Default)]
pub struct WaitHandle {
    released: Mutex<bool>,
    cond: Condvar,
}

impl WaitHandle {
    fn new() -> Self {
        Self::default()
    }

    /// Block until the holding command releases its latches.
    pub fn wait(&self) {
        let mut released = self.released.lock();
        while !*released {
            self.cond.wait(&mut released);
        }
    }

    fn notify(&self) {
        let mut released = self.released.lock();
        *released = true;
        self.cond.notify_all();
    }
}

/// Counters for observing latch behavior. All relaxed; numbers are
/// monotonic totals since construction.
#[derive(Debug, Default)]
pub struct LatchStats {
    acquired: AtomicU64,
    conflicts: AtomicU64,
    waits: AtomicU64,
}

impl LatchStats {
    /// Successful whole-group acquisitions.
    pub fn acquired(&self) -> u64 {
        self.acquired.load(Ordering::Relaxed)
    }

    /// Acquisition attempts that found a key held.
    pub fn conflicts(&self) -> u64 {
        self.conflicts.load(Ordering::Relaxed)
    }

    /// Times a command parked on a [`WaitHandle`].
    pub fn waits(&self) -> u64 {
        self.waits.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Default)]
struct LatchSlot {
    // Keyed by raw key bytes. Probes borrow as &[u8]; only a successful
    // whole-group acquisition allocates owned keys.
    map: Mutex<HashMap<Vec<u8>, Arc<WaitHandle>>>,
}

/// Process-wide per-key latch table. One long-lived instance is shared by
/// all worker threads; commands acquire before touching MVCC state.
#[derive(Debug)]
pub struct Latches {
    slots: Vec<LatchSlot>,
    stats: LatchStats,
}

impl Default for Latches {
    fn default() -> Self {
        Self::new()
    }
}

impl Latches {
    pub fn new() -> Self {
        Self::with_config(&LatchConfig::default())
    }

    pub fn with_config(config: &LatchConfig) -> Self {
        assert!(
            config.slots.is_power_of_two(),
            "latch slot count must be a power of two, got {}",
            config.slots
        );
        let mut slots = Vec::with_capacity(config.slots);
        slots.resize_with(config.slots, LatchSlot::default);
        Self {
            slots,
            stats: LatchStats::default(),
        }
    }

    pub fn stats(&self) -> &LatchStats {
        &self.stats
    }

    fn slot_index(&self, key: &[u8]) -> usize {
        xxh3_64(key) as usize & (self.slots.len() - 1)
    }

    /// Sorted, deduplicated slot ids covering `keys`, and the guards for
    /// them, locked in ascending order.
    fn lock_slots(&self, keys: &[Vec<u8>]) -> (Vec<usize>, Vec<MutexGuard<'_, HashMap<Vec<u8>, Arc<WaitHandle>>>>) {
        let mut slot_ids: Vec<usize> = keys.iter().map(|k| self.slot_index(k)).collect();
        slot_ids.sort_unstable();
        slot_ids.dedup();
        let guards = slot_ids.iter().map(|&id| self.slots[id].map.lock()).collect();
        (slot_ids, guards)
    }

    /// Try to latch every key in the group at once.
    ///
    /// Returns `None` on success. If any key is already latched, returns the
    /// holder's [`WaitHandle`] and reserves nothing; the caller should block
    /// on it and retry.
    pub fn try_acquire(&self, keys: &[Vec<u8>]) -> Option<Arc<WaitHandle>> {
        let (slot_ids, mut guards) = self.lock_slots(keys);

        for key in keys {
            let idx = slot_ids
                .binary_search(&self.slot_index(key))
                .expect("slot id for key was collected above");
            if let Some(holder) = guards[idx].get(key.as_slice()) {
                self.stats.conflicts.fetch_add(1, Ordering::Relaxed);
                return Some(holder.clone());
            }
        }

        let handle = Arc::new(WaitHandle::new());
        for key in keys {
            let idx = slot_ids
                .binary_search(&self.slot_index(key))
                .expect("slot id for key was collected above");
            guards[idx].insert(key.clone(), handle.clone());
        }
        self.stats.acquired.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Release a group of latches previously acquired together in one
    /// `try_acquire` call, waking blocked waiters.
    ///
    /// The holder's handle is signalled exactly once. Releasing a key that
    /// is not held is a caller bug, asserted in debug builds.
    pub fn release(&self, keys: &[Vec<u8>]) {
        let (slot_ids, mut guards) = self.lock_slots(keys);

        let mut signalled = false;
        for key in keys {
            let idx = slot_ids
                .binary_search(&self.slot_index(key))
                .expect("slot id for key was collected above");
            match guards[idx].remove(key.as_slice()) {
                Some(holder) => {
                    if !signalled {
                        holder.notify();
                        signalled = true;
                    }
                }
                None => debug_assert!(false, "released latch that was not held"),
            }
        }
    }

    /// Latch the whole group, blocking as long as it takes. There is no
    /// timeout; callers layer deadlines externally if they need them.
    pub fn wait_for(&self, keys: &[Vec<u8>]) {
        while let Some(holder) = self.try_acquire(keys) {
            self.stats.waits.fetch_add(1, Ordering::Relaxed);
            holder.wait();
        }
    }
}
