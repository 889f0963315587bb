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

//! Scoped cross-process advisory lock on a file.
//!
//! Every mutation of on-disk queue state happens inside a [`FileGuard`]
//! scope held on the index file. Acquisition blocks until the lock is
//! granted; the OS releases the lock if the holding process exits, so a
//! crashed holder cannot wedge the queue forever.
//!
//! The lock is advisory and per open file description: it excludes other
//! processes (and other handles within the same process), but two threads
//! sharing one handle are not serialized by it. In-process serialization is
//! the job of the engine's mutexes.

use std::fs::File;

use fs2::FileExt;

use crate::Result;

/// An exclusive advisory lock, released on drop.
#[must_use]
pub(crate) struct FileGuard<'a> {
    file: &'a File,
}

impl<'a> FileGuard<'a> {
    /// Block until an exclusive lock on `file` is granted.
    pub fn acquire(file: &'a File) -> Result<Self> {
        file.lock_exclusive()?;
        Ok(Self { file })
    }
}

impl Drop for FileGuard<'_> {
    fn drop(&mut self) {
        // An unlock failure leaves nothing actionable here; the OS will
        // still release the lock when the descriptor closes.
        let _ = FileExt::unlock(self.file);
    }
}
