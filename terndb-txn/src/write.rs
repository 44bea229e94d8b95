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

//! Write records
//!
//! One record per `(user key, commit_ts)` in the write CF, marking a
//! committed or rolled-back version. A rollback is recorded at
//! `commit_ts == start_ts`, permanently poisoning that slot: the
//! transaction can never prewrite this key again.

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use serde::{Deserialize, Serialize};
use terndb_core::{Result, TernDbError};

use crate::api::Op;

/// The effect a lock intends, and the effect a write record carries.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteKind {
    /// A value was written.
    Put = 1,
    /// The key was deleted.
    Delete = 2,
    /// The transaction was rolled back; poisons `(key, start_ts)`.
    Rollback = 3,
    /// Lock only, no data change.
    Lock = 4,
}

impl TryFrom<u8> for WriteKind {
    type Error = TernDbError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(WriteKind::Put),
            2 => Ok(WriteKind::Delete),
            3 => Ok(WriteKind::Rollback),
            4 => Ok(WriteKind::Lock),
            other => Err(TernDbError::CorruptRecord {
                record: "write",
                details: format!("unknown write kind tag: {other}"),
            }),
        }
    }
}

impl From<Op> for WriteKind {
    fn from(op: Op) -> Self {
        match op {
            Op::Put => WriteKind::Put,
            Op::Del => WriteKind::Delete,
            Op::Lock => WriteKind::Lock,
        }
    }
}

/// A committed or rolled-back version of one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Write {
    /// The transaction whose commit or rollback produced this record.
    pub start_ts: u64,
    pub kind: WriteKind,
}

impl Write {
    pub fn new(start_ts: u64, kind: WriteKind) -> Self {
        Self { start_ts, kind }
    }

    /// Serialize: 1-byte kind tag + 8-byte start_ts.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(9);
        buf.push(self.kind as u8);
        buf.write_u64::<LittleEndian>(self.start_ts)
            .expect("write to Vec cannot fail");
        buf
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() != 9 {
            return Err(TernDbError::CorruptRecord {
                record: "write",
                details: format!("expected 9 bytes, got {}", data.len()),
            });
        }
        Ok(Self {
            kind: WriteKind::try_from(data[0])?,
            start_ts: LittleEndian::read_u64(&data[1..9]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        for kind in [
            WriteKind::Put,
            WriteKind::Delete,
            WriteKind::Rollback,
            WriteKind::Lock,
        ] {
            let write = Write::new(77, kind);
            let parsed = Write::from_bytes(&write.to_bytes()).unwrap();
            assert_eq!(parsed, write);
        }
    }

    #[test]
    fn test_bad_length() {
        assert!(Write::from_bytes(&[]).is_err());
        assert!(Write::from_bytes(&[1, 2, 3]).is_err());
        let mut long = Write::new(1, WriteKind::Put).to_bytes();
        long.push(0);
        assert!(Write::from_bytes(&long).is_err());
    }

    #[test]
    fn test_bad_kind_tag() {
        let mut bytes = Write::new(1, WriteKind::Put).to_bytes();
        bytes[0] = 9;
        let err = Write::from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("unknown write kind"));
    }

    #[test]
    fn test_kind_from_op() {
        assert_eq!(WriteKind::from(Op::Put), WriteKind::Put);
        assert_eq!(WriteKind::from(Op::Del), WriteKind::Delete);
        assert_eq!(WriteKind::from(Op::Lock), WriteKind::Lock);
    }
}
