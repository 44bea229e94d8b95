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

//! Error types for TernDB
//!
//! These are command-scoped internal errors: a storage read failing, a
//! persisted record that does not parse, an invariant violation. Per-key
//! protocol outcomes (locked, write conflict, aborted) are not errors at
//! this level - they travel in the command response instead.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TernDbError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Corrupt {record} record: {details}")]
    CorruptRecord {
        record: &'static str,
        details: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Storage engine error: {0}")]
    Engine(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, TernDbError>;
