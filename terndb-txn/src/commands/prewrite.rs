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

//! Prewrite command
//!
//! First phase of optimistic two-phase commit. Each mutation passes three
//! admission checks against MVCC history, then stages a lock and (for data
//! ops) a value:
//!
//! 1. rollback poisoning - a rollback record at our start_ts means this
//!    transaction's fate was already decided against it
//! 2. write conflict - a committed write newer than our start_ts
//! 3. lock presence - another transaction holds the key; our own lock makes
//!    the request a stale retry that succeeds without re-staging
//!
//! Failed checks produce per-key errors and processing continues, so the
//! client receives the complete picture in one round trip. A repeated
//! prewrite of the same `(start_ts, key)` is idempotent.

use tracing::debug;

use terndb_core::Result;
use terndb_storage::Snapshot;

use crate::api::{KeyError, Mutation, Op, PrewriteRequest, PrewriteResponse, WriteConflict};
use crate::commands::Command;
use crate::lock::Lock;
use crate::txn::MvccTxn;
use crate::write::WriteKind;

/// The prewrite stage of a transaction: all of its writes, none of its
/// effects. If every key prewrites cleanly the client follows up with a
/// commit command; any key-error sends it back to retry or resolve.
pub struct Prewrite {
    request: PrewriteRequest,
}

impl Prewrite {
    pub fn new(request: PrewriteRequest) -> Self {
        Self { request }
    }

    /// Run one mutation through the admission checks, staging on success.
    ///
    /// `Ok(None)` is success, `Ok(Some(_))` a per-key protocol outcome, and
    /// `Err` an internal failure that aborts the whole command.
    fn prewrite_mutation<S: Snapshot>(
        &self,
        txn: &mut MvccTxn<S>,
        mutation: &Mutation,
    ) -> Result<Option<KeyError>> {
        let key = &mutation.key;
        debug!(start_ts = txn.start_ts(), key = ?key, "prewrite key");

        // A rollback record at our start_ts poisons the key for this
        // transaction permanently.
        if let Some((write, _)) = txn.current_write(key)? {
            if write.kind == WriteKind::Rollback {
                return Ok(Some(KeyError::Abort(
                    "transaction has been rolled back".to_string(),
                )));
            }
        }

        if let Some((_, commit_ts)) = txn.most_recent_write(key)? {
            if commit_ts > txn.start_ts() {
                return Ok(Some(KeyError::Conflict(WriteConflict {
                    start_ts: txn.start_ts(),
                    conflict_ts: commit_ts,
                    key: key.clone(),
                    primary: self.request.primary_lock.clone(),
                })));
            }
        }

        if let Some(lock) = txn.get_lock(key)? {
            if lock.ts != txn.start_ts() {
                return Ok(Some(KeyError::Locked(lock.info(key))));
            }
            // Our own lock: a stale retry. Nothing to re-stage.
            return Ok(None);
        }

        let kind = WriteKind::from(mutation.op);
        txn.put_lock(
            key,
            &Lock::new(
                self.request.primary_lock.clone(),
                txn.start_ts(),
                self.request.lock_ttl,
                kind,
            ),
        );
        match mutation.op {
            Op::Put => txn.put_value(key, mutation.value.clone()),
            Op::Del => txn.delete_value(key),
            Op::Lock => {}
        }
        Ok(None)
    }
}

impl Command for Prewrite {
    type Response = PrewriteResponse;

    fn write_keys(&self) -> Vec<Vec<u8>> {
        self.request
            .mutations
            .iter()
            .map(|m| m.key.clone())
            .collect()
    }

    fn start_ts(&self) -> u64 {
        self.request.start_version
    }

    fn process<S: Snapshot>(&self, txn: &mut MvccTxn<S>) -> Result<PrewriteResponse> {
        let mut response = PrewriteResponse::default();
        // Client order. Key-errors accumulate; internal errors abort.
        for mutation in &self.request.mutations {
            if let Some(key_error) = self.prewrite_mutation(txn, mutation)? {
                response.errors.push(key_error);
            }
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terndb_core::codec;
    use terndb_storage::{Engine, MemoryEngine, Modify, CF_WRITE};

    use crate::write::Write;

    fn request(start_ts: u64, primary: &[u8], mutations: Vec<Mutation>) -> PrewriteRequest {
        PrewriteRequest {
            mutations,
            primary_lock: primary.to_vec(),
            start_version: start_ts,
            lock_ttl: 3000,
            ..Default::default()
        }
    }

    fn process(engine: &MemoryEngine, req: PrewriteRequest) -> (PrewriteResponse, Vec<Modify>) {
        let cmd = Prewrite::new(req);
        let mut txn = MvccTxn::new(engine.snapshot().unwrap(), cmd.start_ts());
        let response = cmd.process(&mut txn).unwrap();
        (response, txn.into_modifies())
    }

    #[test]
    fn test_fresh_put_stages_lock_and_value() {
        let engine = MemoryEngine::new();
        let (response, modifies) = process(
            &engine,
            request(10, b"x", vec![Mutation::put(&b"x"[..], &b"1"[..])]),
        );
        assert!(response.errors.is_empty());
        assert_eq!(modifies.len(), 2);
    }

    #[test]
    fn test_lock_only_mutation_stages_no_value() {
        let engine = MemoryEngine::new();
        let (response, modifies) = process(
            &engine,
            request(10, b"x", vec![Mutation::lock(&b"x"[..])]),
        );
        assert!(response.errors.is_empty());
        assert_eq!(modifies.len(), 1);
        assert_eq!(modifies[0].cf(), terndb_storage::CF_LOCK);
    }

    #[test]
    fn test_duplicate_key_within_one_request() {
        // The first mutation dictates staging; the second hits the staged
        // self-owned lock and succeeds without staging anything.
        let engine = MemoryEngine::new();
        let (response, modifies) = process(
            &engine,
            request(
                10,
                b"x",
                vec![
                    Mutation::put(&b"x"[..], &b"1"[..]),
                    Mutation::put(&b"x"[..], &b"2"[..]),
                ],
            ),
        );
        assert!(response.errors.is_empty());
        assert_eq!(modifies.len(), 2);
    }

    #[test]
    fn test_stale_retry_after_apply_is_idempotent() {
        let engine = MemoryEngine::new();
        let (response, modifies) = process(
            &engine,
            request(10, b"x", vec![Mutation::put(&b"x"[..], &b"1"[..])]),
        );
        assert!(response.errors.is_empty());
        engine.write(modifies).unwrap();

        let (response, modifies) = process(
            &engine,
            request(10, b"x", vec![Mutation::put(&b"x"[..], &b"2"[..])]),
        );
        assert!(response.errors.is_empty());
        assert!(modifies.is_empty());
    }

    #[test]
    fn test_conflict_check_is_strict() {
        // A committed write at exactly start_ts from another transaction
        // does not conflict; only strictly newer commits do.
        let engine = MemoryEngine::new();
        engine
            .write(vec![Modify::Put {
                cf: CF_WRITE,
                key: codec::encode_key(b"k", 10),
                value: Write::new(5, WriteKind::Put).to_bytes(),
            }])
            .unwrap();

        let (response, _) = process(
            &engine,
            request(10, b"k", vec![Mutation::put(&b"k"[..], &b"v"[..])]),
        );
        assert!(response.errors.is_empty());

        let (response, modifies) = process(
            &engine,
            request(9, b"k", vec![Mutation::put(&b"k"[..], &b"v"[..])]),
        );
        assert_eq!(response.errors.len(), 1);
        assert!(modifies.is_empty());
        match &response.errors[0] {
            KeyError::Conflict(conflict) => {
                assert_eq!(conflict.start_ts, 9);
                assert_eq!(conflict.conflict_ts, 10);
                assert_eq!(conflict.key, b"k");
                assert_eq!(conflict.primary, b"k");
            }
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_key_errors_do_not_stop_later_mutations() {
        let engine = MemoryEngine::new();
        engine
            .write(vec![Modify::Put {
                cf: CF_WRITE,
                key: codec::encode_key(b"a", 20),
                value: Write::new(15, WriteKind::Put).to_bytes(),
            }])
            .unwrap();

        let (response, modifies) = process(
            &engine,
            request(
                10,
                b"a",
                vec![
                    Mutation::put(&b"a"[..], &b"1"[..]),
                    Mutation::put(&b"b"[..], &b"2"[..]),
                ],
            ),
        );
        // "a" conflicts, "b" still stages lock + value.
        assert_eq!(response.errors.len(), 1);
        assert_eq!(modifies.len(), 2);
        assert!(modifies.iter().all(|m| {
            let user = match m.cf() {
                terndb_storage::CF_LOCK => m.key().to_vec(),
                _ => codec::decode_key(m.key()).unwrap().0,
            };
            user == b"b"
        }));
    }

    #[test]
    fn test_empty_mutation_list() {
        let engine = MemoryEngine::new();
        let (response, modifies) = process(&engine, request(10, b"x", Vec::new()));
        assert!(response.errors.is_empty());
        assert!(modifies.is_empty());
    }
}
