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

use std::path::PathBuf;

use snafu::Snafu;

/// Queue operation errors.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum QueueError {
    /// Nothing to return: no buffered entries and no readable head chunk.
    ///
    /// This is a normal steady-state outcome of [`get`](crate::DiskQueue::get)
    /// on a drained queue, not a failure. Callers are expected to retry or
    /// back off.
    #[snafu(display("queue is empty"))]
    Empty,

    /// Chunk capacity must be greater than zero.
    #[snafu(display("invalid chunk capacity: {capacity}"))]
    InvalidCapacity { capacity: usize },

    /// A chunk file exists but is not decodable as entries plus a trailing
    /// link record.
    #[snafu(display("corrupt chunk {}: {reason}", path.display()))]
    CorruptChunk { path: PathBuf, reason: String },

    /// Filesystem I/O failure, including lock acquisition errors.
    #[snafu(display("IO error: {source}"))]
    #[snafu(context(false))]
    Io { source: std::io::Error },

    /// Chunk row encoding or decoding failure.
    #[snafu(display("chunk codec error: {source}"))]
    #[snafu(context(false))]
    Codec { source: csv::Error },

    /// Index record serialization failure.
    #[snafu(display("index serialization error: {source}"))]
    #[snafu(context(false))]
    IndexEncode { source: serde_json::Error },
}

impl QueueError {
    /// Whether this error is the recoverable empty-queue condition.
    #[must_use]
    pub const fn is_empty(&self) -> bool { matches!(self, Self::Empty) }
}

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;
