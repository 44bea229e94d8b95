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

//! Command envelope
//!
//! Binds a transactional command to its lifecycle: compute the write-key
//! set, block until every key is latched, open a transaction buffer over a
//! fresh snapshot, run the command logic, hand the buffer to the engine for
//! atomic application, release the latches. Release happens on every exit
//! path - the latch group is held by an RAII guard, so an error return from
//! command logic or from the engine unwinds through it.

pub mod prewrite;

pub use prewrite::Prewrite;

use tracing::debug;

use terndb_core::Result;
use terndb_storage::{Engine, Snapshot};

use crate::latches::{LatchConfig, Latches};
use crate::txn::MvccTxn;

/// A write command runnable through the [`Scheduler`].
pub trait Command {
    type Response;

    /// Every key this command may write. Latched before any MVCC read.
    fn write_keys(&self) -> Vec<Vec<u8>>;

    /// The owning transaction's start timestamp.
    fn start_ts(&self) -> u64;

    /// Command logic. Runs with all write keys latched; reads the MVCC
    /// state through `txn` and stages its effects into the same `txn`.
    fn process<S: Snapshot>(&self, txn: &mut MvccTxn<S>) -> Result<Self::Response>;
}

/// Runs commands against an engine, serializing overlapping write sets
/// through a process-wide latch table. One scheduler is shared by all
/// worker threads for the lifetime of the server.
pub struct Scheduler<E: Engine> {
    engine: E,
    latches: Latches,
}

impl<E: Engine> Scheduler<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            latches: Latches::new(),
        }
    }

    pub fn with_latch_config(engine: E, config: &LatchConfig) -> Self {
        Self {
            engine,
            latches: Latches::with_config(config),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn latches(&self) -> &Latches {
        &self.latches
    }

    /// Run one command to completion, blocking on latch contention.
    ///
    /// Key-errors ride inside `C::Response`; an `Err` here is an internal
    /// failure (storage, corrupt record) that aborted the command. Staged
    /// modifications are applied even when the response carries key-errors:
    /// mutations that erred staged nothing.
    pub fn run<C: Command>(&self, cmd: C) -> Result<C::Response> {
        let mut keys = cmd.write_keys();
        keys.sort_unstable();
        keys.dedup();
        debug!(
            start_ts = cmd.start_ts(),
            keys = keys.len(),
            "admitting command"
        );

        let _latched = LatchGuard::acquire(&self.latches, keys);

        let snapshot = self.engine.snapshot()?;
        let mut txn = MvccTxn::new(snapshot, cmd.start_ts());
        let response = cmd.process(&mut txn)?;

        let modifies = txn.into_modifies();
        if !modifies.is_empty() {
            self.engine.write(modifies)?;
        }
        Ok(response)
    }
}

/// Holds a latched key group; releases it on drop, signalling waiters.
struct LatchGuard<'a> {
    latches: &'a Latches,
    keys: Vec<Vec<u8>>,
}

impl<'a> LatchGuard<'a> {
    /// Block until the whole group is latched.
    fn acquire(latches: &'a Latches, keys: Vec<Vec<u8>>) -> Self {
        latches.wait_for(&keys);
        Self { latches, keys }
    }
}

impl Drop for LatchGuard<'_> {
    fn drop(&mut self) {
        self.latches.release(&self.keys);
    }
}
