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

//! In-memory reference engine
//!
//! `BTreeMap`-backed implementation of the [`Engine`] trait. Snapshots clone
//! the maps under the read lock, which makes them trivially consistent;
//! write batches apply under the write lock, which makes them trivially
//! atomic. Suitable for tests and single-node experiments, not for data you
//! want to keep.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use terndb_core::{Result, TernDbError};

use crate::engine::{CfName, Engine, Modify, Snapshot, CF_DEFAULT, CF_LOCK, CF_WRITE};

type CfMap = BTreeMap<Vec<u8>, Vec<u8>>;

#[derive(Debug, Default)]
struct MemoryInner {
    default: CfMap,
    lock: CfMap,
    write: CfMap,
}

impl MemoryInner {
    fn cf(&self, cf: CfName) -> Result<&CfMap> {
        match cf {
            CF_DEFAULT => Ok(&self.default),
            CF_LOCK => Ok(&self.lock),
            CF_WRITE => Ok(&self.write),
            other => Err(TernDbError::InvalidArgument(format!(
                "unknown column family: {other}"
            ))),
        }
    }

    fn cf_mut(&mut self, cf: CfName) -> Result<&mut CfMap> {
        match cf {
            CF_DEFAULT => Ok(&mut self.default),
            CF_LOCK => Ok(&mut self.lock),
            CF_WRITE => Ok(&mut self.write),
            other => Err(TernDbError::InvalidArgument(format!(
                "unknown column family: {other}"
            ))),
        }
    }
}

/// Shared in-memory engine. Cloning shares the underlying store.
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    inner: Arc<RwLock<MemoryInner>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dump an entire column family, ascending by key. Test convenience.
    pub fn dump_cf(&self, cf: CfName) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let inner = self.inner.read();
        Ok(inner
            .cf(cf)?
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

impl Engine for MemoryEngine {
    type Snap = MemorySnapshot;

    fn snapshot(&self) -> Result<MemorySnapshot> {
        let inner = self.inner.read();
        Ok(MemorySnapshot {
            default: inner.default.clone(),
            lock: inner.lock.clone(),
            write: inner.write.clone(),
        })
    }

    fn write(&self, batch: Vec<Modify>) -> Result<()> {
        let mut inner = self.inner.write();
        // Validate every CF name up front so a bad batch changes nothing.
        for m in &batch {
            inner.cf(m.cf())?;
        }
        for m in batch {
            match m {
                Modify::Put { cf, key, value } => {
                    inner.cf_mut(cf)?.insert(key, value);
                }
                Modify::Delete { cf, key } => {
                    inner.cf_mut(cf)?.remove(&key);
                }
            }
        }
        Ok(())
    }
}

/// Point-in-time clone of the three column families.
#[derive(Debug)]
pub struct MemorySnapshot {
    default: CfMap,
    lock: CfMap,
    write: CfMap,
}

impl MemorySnapshot {
    fn cf(&self, cf: CfName) -> Result<&CfMap> {
        match cf {
            CF_DEFAULT => Ok(&self.default),
            CF_LOCK => Ok(&self.lock),
            CF_WRITE => Ok(&self.write),
            other => Err(TernDbError::InvalidArgument(format!(
                "unknown column family: {other}"
            ))),
        }
    }
}

impl Snapshot for MemorySnapshot {
    fn get_cf(&self, cf: CfName, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.cf(cf)?.get(key).cloned())
    }

    fn scan_cf(&self, cf: CfName, lower: &[u8], upper: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let cf = self.cf(cf)?;
        if lower > upper {
            return Ok(Vec::new());
        }
        Ok(cf
            .range(lower.to_vec()..=upper.to_vec())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
