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

//! Engine trait abstraction
//!
//! Decouples the transactional layer from concrete storage backends. The
//! transactional layer needs exactly two things from a backend:
//!
//! - an atomic write-batch: an ordered list of put/delete operations that
//!   succeeds or fails as a unit
//! - a consistent snapshot: point lookups and bounded range scans that
//!   observe a single point in time
//!
//! Data lives in three logical column families:
//!
//! | CF | Keyed by | Holds |
//! |----|----------|-------|
//! | `lock` | user key | serialized lock records (one per key) |
//! | `write` | user key + commit_ts (BE) | serialized write records |
//! | `default` | user key + start_ts (BE) | raw value bytes |

use terndb_core::Result;

/// Column family name.
pub type CfName = &'static str;

/// Raw values keyed by `(user key, start_ts)`.
pub const CF_DEFAULT: CfName = "default";
/// Lock records keyed by user key.
pub const CF_LOCK: CfName = "lock";
/// Write records keyed by `(user key, commit_ts)`.
pub const CF_WRITE: CfName = "write";

/// All column families, in apply order.
pub const ALL_CFS: [CfName; 3] = [CF_DEFAULT, CF_LOCK, CF_WRITE];

/// A single pending modification in a write batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modify {
    Put {
        cf: CfName,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    Delete {
        cf: CfName,
        key: Vec<u8>,
    },
}

impl Modify {
    pub fn cf(&self) -> CfName {
        match self {
            Modify::Put { cf, .. } | Modify::Delete { cf, .. } => cf,
        }
    }

    pub fn key(&self) -> &[u8] {
        match self {
            Modify::Put { key, .. } | Modify::Delete { key, .. } => key,
        }
    }
}

/// Consistent read-only view over the store at a single point in time.
///
/// Writes applied after the snapshot was taken are never visible through it.
pub trait Snapshot: Send {
    /// Point lookup in a column family.
    fn get_cf(&self, cf: CfName, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Range scan over `[lower, upper]` (both bounds inclusive), ascending.
    fn scan_cf(&self, cf: CfName, lower: &[u8], upper: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;
}

/// A storage backend consumed by the transactional layer.
///
/// `write` must apply the whole batch atomically: concurrent snapshots see
/// either none or all of it, and a failure leaves the store unchanged.
pub trait Engine: Send + Sync {
    type Snap: Snapshot;

    /// Take a consistent snapshot of the current state.
    fn snapshot(&self) -> Result<Self::Snap>;

    /// Atomically apply an ordered batch of modifications.
    fn write(&self, batch: Vec<Modify>) -> Result<()>;
}
