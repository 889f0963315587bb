// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Persisted index record: the single source of truth for queue topology.
//!
//! The index is a small JSON object rewritten in place under the
//! cross-process lock:
//!
//! ```json
//! {
//!   "chunk-capacity": 512,
//!   "head": "20260114-….chunk",
//!   "tail": "20260114-….chunk",
//!   "next-tail": "20260114-….chunk"
//! }
//! ```
//!
//! `head` names the chunk currently being drained, `tail` the most recently
//! written chunk, and `next-tail` the name reserved for the chunk that will
//! be written next, reserved ahead of time so every chunk can carry its
//! successor's name in its link record. Empty strings mean "unset".
//!
//! Loading is self-healing: a missing, unparseable, or partially mistyped
//! index file never fails. Recognized, well-typed fields overwrite the
//! in-memory values, everything else keeps its current value, and the
//! reconciled record is immediately re-persisted. Chunk files get no such
//! leniency; see [`chunk`](crate::chunk).
//!
//! The advisory lock lives on this file's descriptor, so the file is opened
//! once for the queue's lifetime and rewritten via seek + truncate, never
//! replaced by rename, which would detach the lock from the file other
//! processes are locking.

use std::{
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::Path,
};

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use snafu::ensure;
use tracing::debug;

use crate::{
    Result,
    error::InvalidCapacitySnafu,
    lock::FileGuard,
    path::index_path,
};

/// In-memory form of the persisted index.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct IndexRecord {
    #[serde(rename = "chunk-capacity")]
    pub chunk_capacity: usize,
    pub head: String,
    pub tail: String,
    #[serde(rename = "next-tail")]
    pub next_tail: String,
}

impl IndexRecord {
    pub fn new(chunk_capacity: usize) -> Self {
        Self {
            chunk_capacity,
            head: String::new(),
            tail: String::new(),
            next_tail: String::new(),
        }
    }

    /// Best-effort absorption of a persisted JSON object.
    fn absorb(&mut self, value: &Value) {
        if let Some(capacity) = value.get("chunk-capacity").and_then(coerce_capacity) {
            self.chunk_capacity = capacity;
        }
        if let Some(name) = value.get("head").and_then(Value::as_str) {
            self.head = name.to_owned();
        }
        if let Some(name) = value.get("tail").and_then(Value::as_str) {
            self.tail = name.to_owned();
        }
        if let Some(name) = value.get("next-tail").and_then(Value::as_str) {
            self.next_tail = name.to_owned();
        }
    }
}

/// Accepts a positive integer or a numeric string, as earlier on-disk
/// formats stored the capacity unquoted and quoted interchangeably.
fn coerce_capacity(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// The index file handle plus the in-memory record it mirrors.
///
/// The record sits behind a process-local mutex: the advisory file lock does
/// not exclude threads sharing this handle, so every load/dump sequence
/// takes the mutex first and the [`FileGuard`] second.
#[derive(Debug)]
pub(crate) struct IndexFile {
    file: File,
    pub record: Mutex<IndexRecord>,
}

impl IndexFile {
    /// Open (or create) the index file of a queue directory and reconcile
    /// it with `chunk_capacity` as the default.
    ///
    /// The file is opened read+write without truncation so existing contents
    /// survive. One locked load/dump cycle runs immediately, healing any
    /// corruption into a valid record before the queue is used.
    pub fn open(directory: &Path, chunk_capacity: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(index_path(directory))?;

        let index = Self {
            file,
            record: Mutex::new(IndexRecord::new(chunk_capacity)),
        };

        {
            let mut record = index.record.lock();
            let guard = index.lock()?;
            index.load(&mut record, &guard)?;
            ensure!(
                record.chunk_capacity > 0,
                InvalidCapacitySnafu {
                    capacity: record.chunk_capacity,
                }
            );
        }

        Ok(index)
    }

    /// Acquire the cross-process lock guarding all on-disk queue state.
    pub fn lock(&self) -> Result<FileGuard<'_>> { FileGuard::acquire(&self.file) }

    /// Reload the record from disk, then re-persist the reconciled result.
    pub fn load(&self, record: &mut IndexRecord, guard: &FileGuard<'_>) -> Result<()> {
        let mut raw = Vec::new();
        let mut file = &self.file;
        file.seek(SeekFrom::Start(0))?;
        file.read_to_end(&mut raw)?;

        if let Ok(value) = serde_json::from_slice::<Value>(&raw) {
            record.absorb(&value);
        }

        // Re-persist immediately so a missing or corrupt file heals into a
        // valid record before any other process reads it.
        self.dump(record, guard)
    }

    /// Serialize the record and force it to stable storage.
    pub fn dump(&self, record: &IndexRecord, _guard: &FileGuard<'_>) -> Result<()> {
        let raw = serde_json::to_vec(record)?;

        let mut file = &self.file;
        file.seek(SeekFrom::Start(0))?;
        self.file.set_len(0)?;
        file.write_all(&raw)?;
        self.file.sync_data()?;

        debug!(
            head = %record.head,
            tail = %record.tail,
            next_tail = %record.next_tail,
            "index persisted"
        );
        Ok(())
    }
}
