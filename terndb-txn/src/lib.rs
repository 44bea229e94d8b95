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

//! TernDB Transactional Layer
//!
//! The write-admission core of TernDB's optimistic two-phase commit over
//! MVCC. Client mutations enter, contend for per-key latches, are validated
//! against the MVCC history, and emit lock + value records that the commit
//! phase later finalizes.
//!
//! # Components
//!
//! - [`latches`]: per-key mutual exclusion across overlapping key sets,
//!   deadlock-free multi-key acquisition, blocked-waiter wakeup
//! - [`reader`]: read-side MVCC projection (locks, write records, values)
//! - [`txn`]: staging buffer collecting one command's writes for atomic
//!   application
//! - [`commands`]: the command envelope ([`commands::Scheduler`]) and the
//!   [`commands::Prewrite`] coordinator
//! - [`api`]: request/response types the RPC layer maps onto
//!
//! # Control flow
//!
//! ```text
//! PrewriteRequest
//!   -> Scheduler::run            (compute write-key set)
//!   -> Latches::wait_for         (block until every key is latched)
//!   -> Engine::snapshot          (consistent MVCC view)
//!   -> Prewrite::process         (checks + staging per mutation)
//!   -> Engine::write             (atomic batch)
//!   -> latch release             (on every exit path)
//! ```

pub mod api;
pub mod commands;
pub mod latches;
pub mod lock;
pub mod reader;
pub mod txn;
pub mod write;

pub use api::{
    Context, KeyError, LockInfo, Mutation, Op, PrewriteRequest, PrewriteResponse, WriteConflict,
};
pub use commands::{Command, Prewrite, Scheduler};
pub use latches::{LatchConfig, Latches, WaitHandle};
pub use lock::Lock;
pub use reader::MvccReader;
pub use txn::MvccTxn;
pub use write::{Write, WriteKind};
