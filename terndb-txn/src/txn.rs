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

//! MVCC transaction buffer
//!
//! Staging area for the writes one command will emit. Reads go through the
//! underlying [`MvccReader`] at the command's start_ts; writes append to an
//! ordered modification log that the storage engine applies as one atomic
//! batch after the command logic has run. Nothing is visible to anyone
//! until that batch lands.

use terndb_core::codec;
use terndb_core::Result;
use terndb_storage::{Modify, Snapshot, CF_DEFAULT, CF_LOCK, CF_WRITE};

use crate::lock::Lock;
use crate::reader::MvccReader;
use crate::write::Write;

/// One command's view of the store plus its staged modifications.
pub struct MvccTxn<S: Snapshot> {
    reader: MvccReader<S>,
    start_ts: u64,
    writes: Vec<Modify>,
}

impl<S: Snapshot> MvccTxn<S> {
    pub fn new(snapshot: S, start_ts: u64) -> Self {
        Self {
            reader: MvccReader::new(snapshot),
            start_ts,
            writes: Vec::new(),
        }
    }

    pub fn start_ts(&self) -> u64 {
        self.start_ts
    }

    /// Number of staged modifications.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Hand the staged modifications to the storage engine, in staging
    /// order.
    pub fn into_modifies(self) -> Vec<Modify> {
        self.writes
    }

    // Read surface, delegated to the view at our start_ts.

    /// The lock on `key`, observing this command's own staged lock ops
    /// before the snapshot. A command that locks a key mid-run (a prewrite
    /// with the same key twice in its mutation list) sees its own lock.
    pub fn get_lock(&self, key: &[u8]) -> Result<Option<Lock>> {
        for modify in self.writes.iter().rev() {
            if modify.cf() == CF_LOCK && modify.key() == key {
                return match modify {
                    Modify::Put { value, .. } => Ok(Some(Lock::from_bytes(value)?)),
                    Modify::Delete { .. } => Ok(None),
                };
            }
        }
        self.reader.get_lock(key)
    }

    pub fn most_recent_write(&self, key: &[u8]) -> Result<Option<(Write, u64)>> {
        self.reader.most_recent_write(key)
    }

    pub fn current_write(&self, key: &[u8]) -> Result<Option<(Write, u64)>> {
        self.reader.current_write(key, self.start_ts)
    }

    pub fn get_value(&self, key: &[u8], ts: u64) -> Result<Option<Vec<u8>>> {
        self.reader.get_value(key, ts)
    }

    // Write surface. Staging order is preserved.

    /// Stage a lock on `key`.
    pub fn put_lock(&mut self, key: &[u8], lock: &Lock) {
        self.writes.push(Modify::Put {
            cf: CF_LOCK,
            key: key.to_vec(),
            value: lock.to_bytes(),
        });
    }

    /// Stage removal of the lock on `key`.
    pub fn delete_lock(&mut self, key: &[u8]) {
        self.writes.push(Modify::Delete {
            cf: CF_LOCK,
            key: key.to_vec(),
        });
    }

    /// Stage a value at `(key, start_ts)`.
    pub fn put_value(&mut self, key: &[u8], value: Vec<u8>) {
        self.writes.push(Modify::Put {
            cf: CF_DEFAULT,
            key: codec::encode_key(key, self.start_ts),
            value,
        });
    }

    /// Stage removal of the value at `(key, start_ts)`.
    pub fn delete_value(&mut self, key: &[u8]) {
        self.writes.push(Modify::Delete {
            cf: CF_DEFAULT,
            key: codec::encode_key(key, self.start_ts),
        });
    }

    /// Stage a write record at `(key, commit_ts)`.
    pub fn put_write(&mut self, key: &[u8], commit_ts: u64, write: &Write) {
        self.writes.push(Modify::Put {
            cf: CF_WRITE,
            key: codec::encode_key(key, commit_ts),
            value: write.to_bytes(),
        });
    }
}
