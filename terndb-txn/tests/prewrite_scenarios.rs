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

//! End-to-end prewrite scenarios against the in-memory engine.

use std::sync::Arc;
use std::thread;

use terndb_core::codec;
use terndb_storage::{Engine, MemoryEngine, Modify, CF_DEFAULT, CF_LOCK, CF_WRITE};
use terndb_txn::{
    KeyError, Lock, Mutation, MvccReader, Prewrite, PrewriteRequest, Scheduler, Write, WriteKind,
};

fn scheduler() -> Scheduler<MemoryEngine> {
    Scheduler::new(MemoryEngine::new())
}

fn request(start_ts: u64, primary: &[u8], mutations: Vec<Mutation>) -> PrewriteRequest {
    PrewriteRequest {
        mutations,
        primary_lock: primary.to_vec(),
        start_version: start_ts,
        lock_ttl: 3000,
        ..Default::default()
    }
}

fn preload_lock(engine: &MemoryEngine, key: &[u8], lock: &Lock) {
    engine
        .write(vec![Modify::Put {
            cf: CF_LOCK,
            key: key.to_vec(),
            value: lock.to_bytes(),
        }])
        .unwrap();
}

fn preload_write(engine: &MemoryEngine, key: &[u8], start_ts: u64, commit_ts: u64, kind: WriteKind) {
    engine
        .write(vec![Modify::Put {
            cf: CF_WRITE,
            key: codec::encode_key(key, commit_ts),
            value: Write::new(start_ts, kind).to_bytes(),
        }])
        .unwrap();
}

fn get_lock(engine: &MemoryEngine, key: &[u8]) -> Option<Lock> {
    MvccReader::new(engine.snapshot().unwrap())
        .get_lock(key)
        .unwrap()
}

fn get_value(engine: &MemoryEngine, key: &[u8], ts: u64) -> Option<Vec<u8>> {
    MvccReader::new(engine.snapshot().unwrap())
        .get_value(key, ts)
        .unwrap()
}

/// Full store contents, for state-equality assertions.
fn dump(engine: &MemoryEngine) -> Vec<(&'static str, Vec<(Vec<u8>, Vec<u8>)>)> {
    [CF_DEFAULT, CF_LOCK, CF_WRITE]
        .into_iter()
        .map(|cf| (cf, engine.dump_cf(cf).unwrap()))
        .collect()
}

#[test]
fn test_fresh_single_key_put() {
    let scheduler = scheduler();
    let response = scheduler
        .run(Prewrite::new(request(
            10,
            b"x",
            vec![Mutation::put(&b"x"[..], &b"1"[..])],
        )))
        .unwrap();
    assert!(response.errors.is_empty());

    let lock = get_lock(scheduler.engine(), b"x").unwrap();
    assert_eq!(lock.primary, b"x");
    assert_eq!(lock.ts, 10);
    assert_eq!(lock.ttl, 3000);
    assert_eq!(lock.kind, WriteKind::Put);
    assert_eq!(get_value(scheduler.engine(), b"x", 10), Some(b"1".to_vec()));
}

#[test]
fn test_conflict_with_later_commit() {
    let scheduler = scheduler();
    preload_write(scheduler.engine(), b"k", 15, 20, WriteKind::Put);

    let response = scheduler
        .run(Prewrite::new(request(
            10,
            b"k",
            vec![Mutation::put(&b"k"[..], &b"v"[..])],
        )))
        .unwrap();

    assert_eq!(response.errors.len(), 1);
    match &response.errors[0] {
        KeyError::Conflict(conflict) => {
            assert_eq!(conflict.start_ts, 10);
            assert_eq!(conflict.conflict_ts, 20);
            assert_eq!(conflict.key, b"k");
            assert_eq!(conflict.primary, b"k");
        }
        other => panic!("expected Conflict, got {other:?}"),
    }
    assert_eq!(get_lock(scheduler.engine(), b"k"), None);
}

#[test]
fn test_locked_by_another_transaction() {
    let scheduler = scheduler();
    let existing = Lock::new(b"k".to_vec(), 7, 500, WriteKind::Put);
    preload_lock(scheduler.engine(), b"k", &existing);

    let response = scheduler
        .run(Prewrite::new(request(
            10,
            b"k",
            vec![Mutation::put(&b"k"[..], &b"v"[..])],
        )))
        .unwrap();

    assert_eq!(response.errors.len(), 1);
    match &response.errors[0] {
        KeyError::Locked(info) => {
            assert_eq!(info.lock_version, 7);
            assert_eq!(info.key, b"k");
            assert_eq!(info.primary_lock, b"k");
            assert_eq!(info.lock_ttl, 500);
        }
        other => panic!("expected Locked, got {other:?}"),
    }
    // The existing lock is untouched and no value was staged.
    assert_eq!(get_lock(scheduler.engine(), b"k"), Some(existing));
    assert_eq!(get_value(scheduler.engine(), b"k", 10), None);
}

#[test]
fn test_own_lock_is_idempotent() {
    let scheduler = scheduler();
    let own = Lock::new(b"k".to_vec(), 10, 500, WriteKind::Put);
    preload_lock(scheduler.engine(), b"k", &own);

    let response = scheduler
        .run(Prewrite::new(request(
            10,
            b"k",
            vec![Mutation::put(&b"k"[..], &b"v2"[..])],
        )))
        .unwrap();

    assert!(response.errors.is_empty());
    assert_eq!(get_lock(scheduler.engine(), b"k"), Some(own));
    // The retry staged nothing; no value appears for ("k", 10).
    assert_eq!(get_value(scheduler.engine(), b"k", 10), None);
}

#[test]
fn test_rollback_poisoning() {
    let scheduler = scheduler();
    preload_write(scheduler.engine(), b"k", 10, 10, WriteKind::Rollback);

    let response = scheduler
        .run(Prewrite::new(request(
            10,
            b"k",
            vec![Mutation::put(&b"k"[..], &b"v"[..])],
        )))
        .unwrap();

    assert_eq!(response.errors.len(), 1);
    assert!(matches!(&response.errors[0], KeyError::Abort(_)));
    assert_eq!(get_lock(scheduler.engine(), b"k"), None);
}

#[test]
fn test_prewrite_idempotence_full_state() {
    let scheduler = scheduler();
    let req = request(
        10,
        b"a",
        vec![
            Mutation::put(&b"a"[..], &b"1"[..]),
            Mutation::delete(&b"b"[..]),
            Mutation::lock(&b"c"[..]),
        ],
    );

    let first = scheduler.run(Prewrite::new(req.clone())).unwrap();
    assert!(first.errors.is_empty());
    let state_after_first = dump(scheduler.engine());

    let second = scheduler.run(Prewrite::new(req)).unwrap();
    assert!(second.errors.is_empty());
    assert_eq!(dump(scheduler.engine()), state_after_first);
}

#[test]
fn test_delete_mutation_stages_lock_without_value() {
    let scheduler = scheduler();
    let response = scheduler
        .run(Prewrite::new(request(
            10,
            b"d",
            vec![Mutation::delete(&b"d"[..])],
        )))
        .unwrap();
    assert!(response.errors.is_empty());

    let lock = get_lock(scheduler.engine(), b"d").unwrap();
    assert_eq!(lock.kind, WriteKind::Delete);
    assert_eq!(get_value(scheduler.engine(), b"d", 10), None);
}

#[test]
fn test_mixed_outcomes_in_one_request() {
    let scheduler = scheduler();
    preload_write(scheduler.engine(), b"conflicted", 15, 20, WriteKind::Put);
    preload_lock(
        scheduler.engine(),
        b"held",
        &Lock::new(b"held".to_vec(), 7, 500, WriteKind::Put),
    );
    preload_write(scheduler.engine(), b"poisoned", 10, 10, WriteKind::Rollback);

    let response = scheduler
        .run(Prewrite::new(request(
            10,
            b"fresh",
            vec![
                Mutation::put(&b"conflicted"[..], &b"v"[..]),
                Mutation::put(&b"held"[..], &b"v"[..]),
                Mutation::put(&b"poisoned"[..], &b"v"[..]),
                Mutation::put(&b"fresh"[..], &b"v"[..]),
            ],
        )))
        .unwrap();

    // One error per bad key, in client order; the fresh key still latches
    // and stages.
    assert_eq!(response.errors.len(), 3);
    assert!(matches!(&response.errors[0], KeyError::Conflict(_)));
    assert!(matches!(&response.errors[1], KeyError::Locked(_)));
    assert!(matches!(&response.errors[2], KeyError::Abort(_)));
    assert!(get_lock(scheduler.engine(), b"fresh").is_some());
    assert_eq!(
        get_value(scheduler.engine(), b"fresh", 10),
        Some(b"v".to_vec())
    );
}

#[test]
fn test_two_overlapping_commands_do_not_interleave() {
    let scheduler = Arc::new(scheduler());
    let keys: Vec<Vec<u8>> = vec![b"k1".to_vec(), b"k2".to_vec(), b"k3".to_vec()];

    let mut handles = Vec::new();
    for start_ts in [100u64, 200] {
        let scheduler = Arc::clone(&scheduler);
        let keys = keys.clone();
        handles.push(thread::spawn(move || {
            let mutations = keys
                .iter()
                .map(|k| Mutation::put(k.clone(), start_ts.to_be_bytes().to_vec()))
                .collect();
            scheduler
                .run(Prewrite::new(request(start_ts, &keys[0], mutations)))
                .unwrap()
        }));
    }
    let responses: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // Whichever command acquired latches first staged all three locks; the
    // other observed them and got Locked on every key. Exactly one winner.
    let winners = responses.iter().filter(|r| r.errors.is_empty()).count();
    assert_eq!(winners, 1);
    let loser = responses.iter().find(|r| !r.errors.is_empty()).unwrap();
    assert_eq!(loser.errors.len(), 3);
    assert!(loser
        .errors
        .iter()
        .all(|e| matches!(e, KeyError::Locked(_))));

    // The surviving locks all belong to one transaction.
    let owner = get_lock(scheduler.engine(), b"k1").unwrap().ts;
    for key in &keys {
        assert_eq!(get_lock(scheduler.engine(), key).unwrap().ts, owner);
    }
}
