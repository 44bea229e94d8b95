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

//! Lock records
//!
//! At most one lock per user key, created by prewrite and destroyed by
//! commit or rollback. The `primary` field points at the transaction's
//! primary key; resolvers consult the primary's write records to decide the
//! transaction's fate, so the field is stored verbatim and surfaced in
//! conflict errors. TTL is metadata for that out-of-band resolution - the
//! prewrite path itself never expires locks.

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use terndb_core::{Result, TernDbError};

use crate::api::LockInfo;
use crate::write::WriteKind;

/// An in-progress transaction's intent on one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lock {
    /// Primary key of the owning transaction.
    pub primary: Vec<u8>,
    /// Owning transaction's start_ts.
    pub ts: u64,
    /// Lifetime in milliseconds, for out-of-band resolution.
    pub ttl: u64,
    /// The write this lock intends.
    pub kind: WriteKind,
}

impl Lock {
    pub fn new(primary: impl Into<Vec<u8>>, ts: u64, ttl: u64, kind: WriteKind) -> Self {
        Self {
            primary: primary.into(),
            ts,
            ttl,
            kind,
        }
    }

    /// Describe this lock for a `Locked` key-error on `key`.
    pub fn info(&self, key: &[u8]) -> LockInfo {
        LockInfo {
            primary_lock: self.primary.clone(),
            lock_version: self.ts,
            key: key.to_vec(),
            lock_ttl: self.ttl,
            lock_kind: self.kind,
        }
    }

    /// Serialize: kind tag, ts, ttl, then length-prefixed primary key.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + 8 + 8 + 4 + self.primary.len());
        buf.push(self.kind as u8);
        buf.write_u64::<LittleEndian>(self.ts)
            .expect("write to Vec cannot fail");
        buf.write_u64::<LittleEndian>(self.ttl)
            .expect("write to Vec cannot fail");
        buf.write_u32::<LittleEndian>(self.primary.len() as u32)
            .expect("write to Vec cannot fail");
        buf.extend_from_slice(&self.primary);
        buf
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        // Fixed header: 1 (kind) + 8 (ts) + 8 (ttl) + 4 (primary len) = 21.
        if data.len() < 21 {
            return Err(TernDbError::CorruptRecord {
                record: "lock",
                details: format!("{} bytes, need at least 21", data.len()),
            });
        }
        let kind = WriteKind::try_from(data[0]).map_err(|_| TernDbError::CorruptRecord {
            record: "lock",
            details: format!("unknown lock kind tag: {}", data[0]),
        })?;
        let ts = LittleEndian::read_u64(&data[1..9]);
        let ttl = LittleEndian::read_u64(&data[9..17]);
        let primary_len = LittleEndian::read_u32(&data[17..21]) as usize;
        if data.len() != 21 + primary_len {
            return Err(TernDbError::CorruptRecord {
                record: "lock",
                details: format!(
                    "primary key truncated: need {} bytes, have {}",
                    21 + primary_len,
                    data.len()
                ),
            });
        }
        Ok(Self {
            primary: data[21..].to_vec(),
            ts,
            ttl,
            kind,
        })
    }
}
