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

//! The queue engine: `put`, `get`, and `sync` over a chunked linked list.
//!
//! On disk a queue is a singly-linked chain of chunk files described by the
//! index record. In memory each handle keeps two FIFO buffers:
//!
//! - the **input buffer** collects entries accepted by `put` until a full
//!   chunk's worth (or an explicit flush) drains them to a new tail chunk;
//! - the **output buffer** holds the entries of the most recently consumed
//!   head chunk, handed out one at a time by `get`.
//!
//! ```text
//!   put ──▶ input buffer ──flush──▶ tail ──▶ … ──▶ head ──▶ output buffer ──▶ get
//! ```
//!
//! `sync` makes the whole queue recoverable from disk alone: output-buffer
//! entries are written back as chunks spliced ahead of the remaining chain,
//! then the input buffer is drained to the tail.
//!
//! ## Durability
//!
//! Buffers are process memory. A crash loses whatever `put` accepted but had
//! not yet flushed, plus whatever the output buffer held (those entries were
//! already deleted from their chunk). `sync` closes the window at the moment
//! it returns; it does not shrink it retroactively.
//!
//! ## Locking
//!
//! Three tiers, always acquired in this order: buffer mutex (put path takes
//! the input buffer, get path the output buffer), index-record mutex, then
//! the cross-process advisory lock on the index file. `sync` takes both
//! buffer mutexes, output first.

use std::{collections::VecDeque, fs, path::Path};

use bytes::Bytes;
use parking_lot::Mutex;
use snafu::ensure;
use tracing::{debug, info};

use crate::{
    QueueConfig, Result,
    chunk,
    error::{EmptySnafu, InvalidCapacitySnafu, QueueError},
    index::{IndexFile, IndexRecord},
    lock::FileGuard,
    path,
};

/// A disk-resident FIFO queue shared between processes.
///
/// Any number of handles (across processes or within one) may operate on
/// the same directory concurrently; all on-disk mutation is serialized by an
/// advisory lock on the index file. The handle is `Send + Sync` and all
/// operations take `&self`.
#[derive(Debug)]
pub struct DiskQueue {
    config: QueueConfig,
    /// Capacity reconciled with the persisted index at open time.
    chunk_capacity: usize,
    index: IndexFile,
    inbuf: Mutex<VecDeque<Bytes>>,
    outbuf: Mutex<VecDeque<Bytes>>,
}

impl DiskQueue {
    /// Open the queue at `directory`, creating it if needed.
    ///
    /// Convenience for [`QueueBuilder`](crate::QueueBuilder).
    pub fn open<P: Into<std::path::PathBuf>>(directory: P, chunk_capacity: usize) -> Result<Self> {
        Self::new(QueueConfig {
            directory: directory.into(),
            chunk_capacity,
        })
    }

    pub(crate) fn new(config: QueueConfig) -> Result<Self> {
        ensure!(
            config.chunk_capacity > 0,
            InvalidCapacitySnafu {
                capacity: config.chunk_capacity,
            }
        );

        fs::create_dir_all(&config.directory)?;
        let index = IndexFile::open(&config.directory, config.chunk_capacity)?;
        let chunk_capacity = index.record.lock().chunk_capacity;

        info!(directory = ?config.directory, chunk_capacity, "queue opened");

        Ok(Self {
            config,
            chunk_capacity,
            index,
            inbuf: Mutex::new(VecDeque::new()),
            outbuf: Mutex::new(VecDeque::new()),
        })
    }

    /// Append an entry to the queue.
    ///
    /// The entry lands in the input buffer; once the buffer reaches the
    /// chunk capacity it is drained to a new tail chunk on disk. Entries
    /// still in the buffer are not durable until a flush or [`sync`].
    ///
    /// [`sync`]: DiskQueue::sync
    pub fn put(&self, entry: impl Into<Bytes>) -> Result<()> {
        self.put_inner(entry.into(), false)
    }

    /// Append an entry and immediately drain the input buffer to disk.
    pub fn put_and_flush(&self, entry: impl Into<Bytes>) -> Result<()> {
        self.put_inner(entry.into(), true)
    }

    fn put_inner(&self, entry: Bytes, flush: bool) -> Result<()> {
        let mut inbuf = self.inbuf.lock();
        inbuf.push_back(entry);

        if !flush && inbuf.len() < self.chunk_capacity {
            return Ok(());
        }

        let mut record = self.index.record.lock();
        let guard = self.index.lock()?;
        self.flush_to_tail(&mut record, &guard, &mut inbuf, flush)
    }

    /// Remove and return the oldest available entry.
    ///
    /// Entries come from the output buffer when it holds any; otherwise the
    /// head chunk is read into the buffer, deleted from disk, and the index
    /// advanced to its link, all inside the cross-process lock.
    ///
    /// Fails with [`QueueError::Empty`] when no flushed entry exists. This
    /// is a frequent, cheap outcome: nothing is touched beyond an index
    /// reload.
    pub fn get(&self) -> Result<Bytes> {
        let mut outbuf = self.outbuf.lock();
        if let Some(entry) = outbuf.pop_front() {
            return Ok(entry);
        }

        let mut record = self.index.record.lock();
        let guard = self.index.lock()?;
        self.index.load(&mut record, &guard)?;

        if record.head.is_empty() {
            // Redirect: the chain was only ever written, never read.
            ensure!(!record.tail.is_empty(), EmptySnafu);
            record.head = record.tail.clone();
        }

        let head_path = path::chunk_path(&self.config.directory, &record.head);
        // The head may name a reserved-but-unwritten successor; that is an
        // empty queue, not corruption.
        ensure!(head_path.exists(), EmptySnafu);

        let decoded = chunk::read(&head_path)?;
        debug!(
            chunk = %record.head,
            entries = decoded.entries.len(),
            "head chunk consumed"
        );

        outbuf.extend(decoded.entries);
        record.head = decoded.link;
        fs::remove_file(&head_path)?;
        self.index.dump(&record, &guard)?;

        outbuf.pop_front().ok_or(QueueError::Empty)
    }

    /// Flush both buffers so the queue is fully recoverable from disk.
    ///
    /// Output-buffer entries were already removed from their chunk, so they
    /// are first written back as chunks spliced ahead of the remaining
    /// chain; the input buffer is then drained to the tail. After `sync`
    /// returns, a fresh handle on the directory observes every entry this
    /// handle had accepted, in FIFO order.
    pub fn sync(&self) -> Result<()> {
        let mut outbuf = self.outbuf.lock();
        let mut inbuf = self.inbuf.lock();
        let mut record = self.index.record.lock();
        let guard = self.index.lock()?;
        self.index.load(&mut record, &guard)?;

        if !outbuf.is_empty() {
            self.rematerialize(&mut record, &guard, &mut outbuf)?;
        }
        if !inbuf.is_empty() {
            self.flush_to_tail(&mut record, &guard, &mut inbuf, true)?;
        }
        Ok(())
    }

    /// The reconciled chunk capacity this handle operates with.
    #[must_use]
    pub const fn chunk_capacity(&self) -> usize { self.chunk_capacity }

    /// The queue directory.
    #[must_use]
    pub fn directory(&self) -> &Path { &self.config.directory }

    /// Drain the input buffer into new tail chunks. Runs under the index
    /// lock.
    ///
    /// Each iteration reloads the index, takes the reserved `next_tail` name
    /// as the chunk to write, reserves a fresh name for the following chunk
    /// (so the link record can reference it), writes up to `chunk_capacity`
    /// entries, and persists the index. Without `force` a single chunk is
    /// written; with `force` the loop continues until the buffer is empty,
    /// shrinking it by up to a full capacity per pass.
    fn flush_to_tail(
        &self,
        record: &mut IndexRecord,
        guard: &FileGuard<'_>,
        inbuf: &mut VecDeque<Bytes>,
        force: bool,
    ) -> Result<()> {
        loop {
            self.index.load(record, guard)?;

            if record.next_tail.is_empty() {
                record.next_tail = path::generate_chunk_name();
            }
            if record.head.is_empty() {
                // The queue was empty: the chunk about to be written becomes
                // both head and tail.
                record.head = record.next_tail.clone();
            }

            let name = std::mem::replace(&mut record.next_tail, path::generate_chunk_name());
            record.tail = name.clone();

            let take = inbuf.len().min(self.chunk_capacity);
            let entries: Vec<Bytes> = inbuf.drain(..take).collect();
            chunk::write(
                &path::chunk_path(&self.config.directory, &name),
                &entries,
                &record.next_tail,
            )?;
            self.index.dump(record, guard)?;

            debug!(chunk = %name, entries = take, "tail chunk written");

            if !force || inbuf.is_empty() {
                return Ok(());
            }
        }
    }

    /// Write the output buffer back to disk as a chain of chunks placed
    /// ahead of everything else in the queue. Runs under the index lock.
    ///
    /// The buffered entries were consumed from the old head, so the last
    /// chunk of the new chain links to the current `head` and `head` moves
    /// to the first new chunk. When no chain remains on disk the new chain
    /// becomes the whole queue: its last chunk links to the reserved
    /// `next_tail` and `tail` points at it.
    fn rematerialize(
        &self,
        record: &mut IndexRecord,
        guard: &FileGuard<'_>,
        outbuf: &mut VecDeque<Bytes>,
    ) -> Result<()> {
        if record.head.is_empty() && !record.tail.is_empty() {
            record.head = record.tail.clone();
        }

        let first = path::generate_chunk_name();
        let mut name = first.clone();
        let mut written = 0usize;

        loop {
            let take = outbuf.len().min(self.chunk_capacity);
            let entries: Vec<Bytes> = outbuf.drain(..take).collect();
            written += take;

            let link = if !outbuf.is_empty() {
                path::generate_chunk_name()
            } else if record.head.is_empty() {
                if record.next_tail.is_empty() {
                    record.next_tail = path::generate_chunk_name();
                }
                record.tail = name.clone();
                record.next_tail.clone()
            } else {
                record.head.clone()
            };

            chunk::write(
                &path::chunk_path(&self.config.directory, &name),
                &entries,
                &link,
            )?;

            if outbuf.is_empty() {
                break;
            }
            name = link;
        }

        record.head = first;
        self.index.dump(record, guard)?;

        debug!(entries = written, "output buffer rematerialized");
        Ok(())
    }
}
