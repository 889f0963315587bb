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

//! Disk-resident FIFO queue shared across processes.
//!
//! A queue lives in a directory: a small `.index` file naming the head and
//! tail of a singly-linked chain of chunk files, each chunk holding an
//! ordered batch of opaque byte entries plus a link record naming its
//! successor. Processes coordinate purely through an advisory lock on the
//! index file; no server is involved.
//!
//! ```no_run
//! use diskqueue::QueueBuilder;
//!
//! # fn main() -> diskqueue::Result<()> {
//! let queue = QueueBuilder::new("/var/lib/myapp/queue")
//!     .chunk_capacity(512)
//!     .open()?;
//!
//! queue.put("job payload")?;
//! queue.sync()?;
//!
//! match queue.get() {
//!     Ok(entry) => println!("{entry:?}"),
//!     Err(e) if e.is_empty() => { /* nothing queued, back off */ }
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Entries accepted by `put` are buffered in memory and become durable when
//! a chunk fills or on [`DiskQueue::sync`]; see the [`queue`] module docs
//! for the exact durability window.

pub mod builder;
pub mod config;
pub mod error;
pub mod queue;

mod chunk;
mod index;
mod lock;
mod path;

pub use builder::QueueBuilder;
pub use config::{DEFAULT_CHUNK_CAPACITY, QueueConfig};
pub use error::{QueueError, Result};
pub use queue::DiskQueue;
