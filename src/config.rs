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

/// Chunk capacity used when the builder does not specify one.
pub const DEFAULT_CHUNK_CAPACITY: usize = 512;

/// Configuration for opening a [`DiskQueue`](crate::DiskQueue).
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Directory holding the index file and chunk files. Created on open if
    /// it does not exist.
    pub directory: PathBuf,
    /// Maximum entries per chunk. Must be greater than zero. On an existing
    /// queue the capacity persisted in the index takes precedence.
    pub chunk_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./queue_data"),
            chunk_capacity: DEFAULT_CHUNK_CAPACITY,
        }
    }
}
