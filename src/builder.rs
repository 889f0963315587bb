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

use crate::{DiskQueue, QueueConfig, Result};

/// Fluent configuration for opening a [`DiskQueue`].
pub struct QueueBuilder {
    config: QueueConfig,
}

impl QueueBuilder {
    pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
        Self {
            config: QueueConfig {
                directory: directory.into(),
                ..Default::default()
            },
        }
    }

    /// Maximum entries per chunk file.
    #[must_use]
    pub const fn chunk_capacity(mut self, capacity: usize) -> Self {
        self.config.chunk_capacity = capacity;
        self
    }

    /// Open the queue, creating the directory and index file as needed.
    pub fn open(self) -> Result<DiskQueue> { DiskQueue::new(self.config) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_default_config() {
        let builder = QueueBuilder::new("/tmp/test_queue");
        assert_eq!(builder.config.directory, PathBuf::from("/tmp/test_queue"));
        assert_eq!(builder.config.chunk_capacity, 512);
    }

    #[test]
    fn test_builder_custom_capacity() {
        let builder = QueueBuilder::new("/tmp/test_queue").chunk_capacity(16);
        assert_eq!(builder.config.chunk_capacity, 16);
    }
}
