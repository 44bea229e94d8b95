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

//! TernDB Storage
//!
//! The storage seam between the transactional layer and whatever actually
//! persists bytes. The transactional layer consumes two capabilities only:
//! consistent snapshots and atomic write batches over three column families.
//! A consensus-replicated LSM engine satisfies the same traits in
//! production; the [`memory::MemoryEngine`] here satisfies them in tests.

pub mod engine;
pub mod memory;

pub use engine::{CfName, Engine, Modify, Snapshot, ALL_CFS, CF_DEFAULT, CF_LOCK, CF_WRITE};
pub use memory::{MemoryEngine, MemorySnapshot};
