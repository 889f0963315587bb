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

//! Chunk codec: an ordered batch of entries plus one trailing link record.
//!
//! ## Chunk File Format
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ entry row 0   (one quoted field)             │
//! │ entry row 1                                  │
//! │ ...                                          │
//! │ entry row N-1                                │
//! ├──────────────────────────────────────────────┤
//! │ link row: name of the successor chunk,       │
//! │ or empty when no successor has been written  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Rows are delimited records with a single field each. Every field is
//! quoted, so entries may contain separators, quotes, newlines, or arbitrary
//! non-UTF-8 bytes without ambiguity, and an empty link still occupies a
//! readable row.
//!
//! A chunk with no rows at all has lost its link record and is surfaced as
//! [`QueueError::CorruptChunk`](crate::QueueError::CorruptChunk). Callers
//! must check for a missing file *before* decoding: absent chunk means an
//! empty queue, not corruption.

use std::{
    fs::{File, OpenOptions},
    path::Path,
};

use bytes::Bytes;
use csv::{ByteRecord, QuoteStyle, ReaderBuilder, WriterBuilder};

use crate::{Result, error::CorruptChunkSnafu};

/// A decoded chunk: its entries in write order and the successor link.
#[derive(Debug)]
pub(crate) struct Chunk {
    pub entries: Vec<Bytes>,
    /// Name of the next chunk in the chain; empty when the chain ends here.
    pub link: String,
}

/// Create or overwrite the chunk file at `path`, then force it to disk.
pub(crate) fn write(path: &Path, entries: &[Bytes], link: &str) -> Result<()> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;

    {
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .from_writer(&file);

        let mut row = ByteRecord::new();
        for entry in entries {
            row.clear();
            row.push_field(entry);
            writer.write_byte_record(&row)?;
        }
        writer.write_record([link])?;
        writer.flush()?;
    }

    file.sync_data()?;
    Ok(())
}

/// Decode the chunk file at `path`.
pub(crate) fn read(path: &Path) -> Result<Chunk> {
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new().has_headers(false).from_reader(file);

    let mut rows: Vec<ByteRecord> = Vec::new();
    for row in reader.byte_records() {
        rows.push(row?);
    }

    let Some(link_row) = rows.pop() else {
        return CorruptChunkSnafu {
            path,
            reason: "missing link record",
        }
        .fail();
    };
    let link = String::from_utf8_lossy(link_row.get(0).unwrap_or_default()).into_owned();

    let entries = rows
        .iter()
        .map(|row| Bytes::copy_from_slice(row.get(0).unwrap_or_default()))
        .collect();

    Ok(Chunk { entries, link })
}
