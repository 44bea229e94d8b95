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

//! MVCC key encoding
//!
//! Versioned column families key on `(user key, timestamp)`. Concatenating
//! the two naively breaks range scans: `"a" + ts` and `"ab" + ts` interleave
//! because raw user keys are not prefix-free. The user key is therefore
//! memcomparable-encoded first:
//!
//! ```text
//! [group of 8 bytes][marker][group of 8 bytes][marker]...
//! ```
//!
//! Each group is zero-padded to 8 bytes; its marker is `0xFF - pad_count`.
//! Full groups carry marker `0xFF`, the final group a smaller one, so the
//! encoding is prefix-free and preserves byte-lexicographic order. An 8-byte
//! big-endian timestamp follows, ordering versions of one key ascending by
//! timestamp.

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use crate::error::{Result, TernDbError};

const ENC_GROUP_SIZE: usize = 8;
const ENC_MARKER: u8 = 0xFF;
const ENC_PAD: u8 = 0x00;

/// Number of bytes `encode_bytes` produces for a key of length `n`.
pub fn encoded_bytes_len(n: usize) -> usize {
    (n / ENC_GROUP_SIZE + 1) * (ENC_GROUP_SIZE + 1)
}

/// Encode a user key into its prefix-free, order-preserving form.
pub fn encode_bytes(key: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_bytes_len(key.len()));
    for chunk in key.chunks(ENC_GROUP_SIZE) {
        out.extend_from_slice(chunk);
        let pad = ENC_GROUP_SIZE - chunk.len();
        out.resize(out.len() + pad, ENC_PAD);
        out.push(ENC_MARKER - pad as u8);
    }
    // A key whose length is a multiple of 8 still needs a terminating group.
    if key.len() % ENC_GROUP_SIZE == 0 {
        out.resize(out.len() + ENC_GROUP_SIZE, ENC_PAD);
        out.push(ENC_MARKER - ENC_GROUP_SIZE as u8);
    }
    out
}

/// Decode a full `encode_bytes` payload back into the user key.
pub fn decode_bytes(data: &[u8]) -> Result<Vec<u8>> {
    let mut key = Vec::with_capacity(data.len() / (ENC_GROUP_SIZE + 1) * ENC_GROUP_SIZE);
    let mut chunks = data.chunks(ENC_GROUP_SIZE + 1);
    loop {
        let chunk = chunks
            .next()
            .ok_or_else(|| TernDbError::Codec("encoded key missing terminator group".into()))?;
        if chunk.len() != ENC_GROUP_SIZE + 1 {
            return Err(TernDbError::Codec(format!(
                "encoded key group truncated: {} of {} bytes",
                chunk.len(),
                ENC_GROUP_SIZE + 1
            )));
        }
        let marker = chunk[ENC_GROUP_SIZE];
        let pad = (ENC_MARKER - marker) as usize;
        if pad > ENC_GROUP_SIZE {
            return Err(TernDbError::Codec(format!(
                "invalid group marker: {marker:#04x}"
            )));
        }
        let data_len = ENC_GROUP_SIZE - pad;
        if chunk[data_len..ENC_GROUP_SIZE].iter().any(|&b| b != ENC_PAD) {
            return Err(TernDbError::Codec("non-zero padding in encoded key".into()));
        }
        key.extend_from_slice(&chunk[..data_len]);
        if pad > 0 {
            if chunks.next().is_some() {
                return Err(TernDbError::Codec(
                    "trailing bytes after encoded key terminator".into(),
                ));
            }
            return Ok(key);
        }
    }
}

/// Encode `(user key, ts)` into a versioned CF key.
pub fn encode_key(key: &[u8], ts: u64) -> Vec<u8> {
    let mut out = encode_bytes(key);
    out.write_u64::<BigEndian>(ts)
        .expect("write to Vec cannot fail");
    out
}

/// Split a versioned CF key back into `(user key, ts)`.
pub fn decode_key(encoded: &[u8]) -> Result<(Vec<u8>, u64)> {
    if encoded.len() < 8 {
        return Err(TernDbError::Codec(format!(
            "versioned key too short for timestamp: {} bytes",
            encoded.len()
        )));
    }
    let (key_part, ts_part) = encoded.split_at(encoded.len() - 8);
    let key = decode_bytes(key_part)?;
    Ok((key, BigEndian::read_u64(ts_part)))
}

/// Inclusive bounds covering every version of `key` in a versioned CF.
pub fn version_range(key: &[u8]) -> (Vec<u8>, Vec<u8>) {
    (encode_key(key, 0), encode_key(key, u64::MAX))
}
