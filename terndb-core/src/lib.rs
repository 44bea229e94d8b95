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

//! TernDB Core
//!
//! Fundamental types shared across the TernDB workspace:
//!
//! - **Errors**: the workspace-wide [`TernDbError`] and [`Result`] alias
//! - **Key codec**: memcomparable MVCC key encoding for versioned column
//!   families (user key + big-endian timestamp)
//!
//! Keys are opaque byte sequences ordered byte-lexicographically. Timestamps
//! are `u64` values handed out by an external oracle; this crate never
//! generates them.

pub mod codec;
pub mod error;

pub use error::{Result, TernDbError};

/// Transaction timestamp (logical, oracle-assigned).
pub type Timestamp = u64;
