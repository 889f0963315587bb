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

//! Queue directory layout and chunk name generation.
//!
//! A queue directory holds one `.index` file plus one file per chunk. Chunk
//! names carry a date stamp for operator convenience and a random token for
//! collision resistance; ordering comes from the link records, never from
//! the names.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

/// Name of the persisted index record inside a queue directory.
pub(crate) const INDEX_FILE: &str = ".index";

/// Extension used for chunk files.
pub(crate) const CHUNK_EXTENSION: &str = "chunk";

/// Returns the path of the index file for a queue directory.
pub(crate) fn index_path<P: AsRef<Path>>(directory: P) -> PathBuf {
    directory.as_ref().join(INDEX_FILE)
}

/// Generates a chunk file name: `YYYYMMDD-<32 hex>.chunk`.
pub(crate) fn chunk_file_name(time: DateTime<Utc>) -> String {
    format!(
        "{:04}{:02}{:02}-{}.{}",
        time.year(),
        time.month(),
        time.day(),
        Uuid::new_v4().simple(),
        CHUNK_EXTENSION
    )
}

/// Reserves a fresh, collision-resistant chunk name.
pub(crate) fn generate_chunk_name() -> String { chunk_file_name(Utc::now()) }

/// Returns the full path of a named chunk inside a queue directory.
pub(crate) fn chunk_path<P: AsRef<Path>>(directory: P, name: &str) -> PathBuf {
    directory.as_ref().join(name)
}
