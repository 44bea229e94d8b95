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

//! MVCC read surface
//!
//! Read-only projection over a storage snapshot: locate a key's current
//! lock, its most recent committed write, the write a given transaction
//! produced, and staged values. All physical layout (encoded keys, column
//! families) stays behind this type.

use terndb_core::codec;
use terndb_core::Result;
use terndb_storage::{Snapshot, CF_DEFAULT, CF_LOCK, CF_WRITE};

use crate::lock::Lock;
use crate::write::Write;

/// Read-only MVCC view over one consistent snapshot.
pub struct MvccReader<S: Snapshot> {
    snapshot: S,
}

impl<S: Snapshot> MvccReader<S> {
    pub fn new(snapshot: S) -> Self {
        Self { snapshot }
    }

    /// The lock currently held on `key`, if any.
    pub fn get_lock(&self, key: &[u8]) -> Result<Option<Lock>> {
        match self.snapshot.get_cf(CF_LOCK, key)? {
            Some(bytes) => Ok(Some(Lock::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// The write record on `key` with the highest commit_ts, together with
    /// that commit_ts.
    pub fn most_recent_write(&self, key: &[u8]) -> Result<Option<(Write, u64)>> {
        let (lower, upper) = codec::version_range(key);
        let versions = self.snapshot.scan_cf(CF_WRITE, &lower, &upper)?;
        match versions.last() {
            Some((encoded, value)) => {
                let (_, commit_ts) = codec::decode_key(encoded)?;
                Ok(Some((Write::from_bytes(value)?, commit_ts)))
            }
            None => Ok(None),
        }
    }

    /// The write record on `key` produced by the transaction that started
    /// at `start_ts`, together with its commit_ts. Detects rollback
    /// poisoning and previously applied effects.
    pub fn current_write(&self, key: &[u8], start_ts: u64) -> Result<Option<(Write, u64)>> {
        let (lower, upper) = codec::version_range(key);
        // A transaction's commit_ts is never below its start_ts, and its
        // rollback is recorded at start_ts exactly: newest-first, stopping
        // once versions predate start_ts.
        for (encoded, value) in self.snapshot.scan_cf(CF_WRITE, &lower, &upper)?.iter().rev() {
            let (_, commit_ts) = codec::decode_key(encoded)?;
            if commit_ts < start_ts {
                break;
            }
            let write = Write::from_bytes(value)?;
            if write.start_ts == start_ts {
                return Ok(Some((write, commit_ts)));
            }
        }
        Ok(None)
    }

    /// The value staged or retained at `(key, ts)`, where `ts` is the
    /// writing transaction's start_ts.
    pub fn get_value(&self, key: &[u8], ts: u64) -> Result<Option<Vec<u8>>> {
        self.snapshot.get_cf(CF_DEFAULT, &codec::encode_key(key, ts))
    }
}
