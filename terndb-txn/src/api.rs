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

//! Transactional request and response types
//!
//! The RPC layer maps its wire messages onto these structs; nothing here is
//! a wire format. Key-errors are per-mutation protocol outcomes reported in
//! the response body - a response full of key-errors is still a successful
//! command from the transport's point of view.

use serde::{Deserialize, Serialize};

use crate::write::WriteKind;

/// Routing metadata attached to every request. Opaque to the transactional
/// core; carried through for the layers above and below.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    /// Region the request was routed to.
    pub region_id: u64,
}

/// Client-requested mutation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    /// Write a value.
    Put,
    /// Remove the key.
    Del,
    /// Take a lock without changing the value.
    Lock,
}

/// A single requested change to one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mutation {
    pub op: Op,
    pub key: Vec<u8>,
    /// Present iff `op` is [`Op::Put`].
    pub value: Vec<u8>,
}

impl Mutation {
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            op: Op::Put,
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        Self {
            op: Op::Del,
            key: key.into(),
            value: Vec::new(),
        }
    }

    pub fn lock(key: impl Into<Vec<u8>>) -> Self {
        Self {
            op: Op::Lock,
            key: key.into(),
            value: Vec::new(),
        }
    }
}

/// First phase of two-phase commit: lock every mutated key and stage the
/// new values, without committing anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrewriteRequest {
    pub context: Context,
    /// Mutations in client order.
    pub mutations: Vec<Mutation>,
    /// The key whose lock represents the transaction's commit decision.
    pub primary_lock: Vec<u8>,
    /// The transaction's start timestamp.
    pub start_version: u64,
    /// Milliseconds the staged locks are considered live.
    pub lock_ttl: u64,
}

/// Per-mutation outcome list. Empty means every mutation was admitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrewriteResponse {
    pub errors: Vec<KeyError>,
}

/// Description of a lock surfaced in a [`KeyError::Locked`] outcome, enough
/// for the client to drive lock resolution against the primary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInfo {
    pub primary_lock: Vec<u8>,
    pub lock_version: u64,
    pub key: Vec<u8>,
    pub lock_ttl: u64,
    pub lock_kind: WriteKind,
}

/// A committed write newer than the requesting transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteConflict {
    pub start_ts: u64,
    pub conflict_ts: u64,
    pub key: Vec<u8>,
    pub primary: Vec<u8>,
}

/// Per-key protocol outcome. These never abort the command; the coordinator
/// keeps processing the remaining mutations so the client sees the complete
/// picture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyError {
    /// The key is held by another transaction's lock.
    Locked(LockInfo),
    /// A committed write exists with commit_ts above our start_ts.
    Conflict(WriteConflict),
    /// The transaction has already been rolled back on this key.
    Abort(String),
}

impl KeyError {
    /// The user key this outcome refers to, if it names one.
    pub fn key(&self) -> Option<&[u8]> {
        match self {
            KeyError::Locked(info) => Some(&info.key),
            KeyError::Conflict(conflict) => Some(&conflict.key),
            KeyError::Abort(_) => None,
        }
    }
}
