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

use std::{collections::HashSet, fs, path::Path};

use bytes::Bytes;
use diskqueue::{DiskQueue, QueueBuilder, QueueError};
use tempfile::TempDir;
use test_case::test_case;

fn chunk_files(directory: &Path) -> usize {
    fs::read_dir(directory)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().and_then(|e| e.to_str()) == Some("chunk"))
        .count()
}

/// Drains a queue until it reports empty.
fn drain(queue: &DiskQueue) -> Vec<Bytes> {
    let mut entries = Vec::new();
    loop {
        match queue.get() {
            Ok(entry) => entries.push(entry),
            Err(e) if e.is_empty() => return entries,
            Err(e) => panic!("unexpected error while draining: {e}"),
        }
    }
}

#[test_case(1 ; "capacity one")]
#[test_case(10 ; "capacity equal to entry count")]
#[test_case(64 ; "capacity above entry count")]
fn test_fifo_order(capacity: usize) {
    let temp_dir = TempDir::new().unwrap();
    let queue = QueueBuilder::new(temp_dir.path())
        .chunk_capacity(capacity)
        .open()
        .unwrap();

    let entries: Vec<Bytes> = (0..10)
        .map(|i| Bytes::from(format!("entry,{i}\nwith \"awkward\" bytes")))
        .collect();

    for entry in &entries {
        queue.put(entry.clone()).unwrap();
    }
    queue.sync().unwrap();

    assert_eq!(drain(&queue), entries);
}

#[test]
fn test_empty_queue_signaling() {
    let temp_dir = TempDir::new().unwrap();
    let queue = QueueBuilder::new(temp_dir.path()).open().unwrap();

    let err = queue.get().unwrap_err();
    assert!(err.is_empty());

    // still empty on the next call, and still no crash
    assert!(queue.get().unwrap_err().is_empty());
}

#[test]
fn test_chunk_rollover() {
    const K: usize = 4;

    let temp_dir = TempDir::new().unwrap();
    let queue = QueueBuilder::new(temp_dir.path())
        .chunk_capacity(K)
        .open()
        .unwrap();

    let count = 2 * K + 1;
    for i in 0..count {
        queue.put(format!("entry-{i:03}")).unwrap();
    }
    queue.sync().unwrap();

    assert!(chunk_files(temp_dir.path()) >= 3);

    let drained = drain(&queue);
    assert_eq!(drained.len(), count);
    for (i, entry) in drained.iter().enumerate() {
        assert_eq!(entry, &Bytes::from(format!("entry-{i:03}")));
    }
}

#[test]
fn test_durability_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let entries: Vec<Bytes> = (0..25).map(|i| Bytes::from(format!("payload-{i}"))).collect();

    {
        let queue = QueueBuilder::new(temp_dir.path())
            .chunk_capacity(8)
            .open()
            .unwrap();
        for entry in &entries {
            queue.put(entry.clone()).unwrap();
        }
        queue.sync().unwrap();
    }

    let queue = QueueBuilder::new(temp_dir.path())
        .chunk_capacity(8)
        .open()
        .unwrap();
    assert_eq!(drain(&queue), entries);
}

#[test]
fn test_concurrent_producers_no_loss_no_duplication() {
    let temp_dir = TempDir::new().unwrap();
    let directory = temp_dir.path().to_path_buf();

    let spawn_producer = |prefix: &'static str| {
        let directory = directory.clone();
        std::thread::spawn(move || {
            let queue = QueueBuilder::new(&directory)
                .chunk_capacity(3)
                .open()
                .unwrap();
            for i in 0..40 {
                queue.put(format!("{prefix}-{i:03}")).unwrap();
                if i % 10 == 9 {
                    queue.sync().unwrap();
                }
            }
            queue.sync().unwrap();
        })
    };

    let a = spawn_producer("a");
    let b = spawn_producer("b");
    a.join().unwrap();
    b.join().unwrap();

    let queue = QueueBuilder::new(&directory).chunk_capacity(3).open().unwrap();
    let drained: HashSet<Bytes> = drain(&queue).into_iter().collect();

    let mut expected = HashSet::new();
    for prefix in ["a", "b"] {
        for i in 0..40 {
            expected.insert(Bytes::from(format!("{prefix}-{i:03}")));
        }
    }
    assert_eq!(drained, expected);
}

#[test]
fn test_drain_order_is_stable_for_fixed_disk_state() {
    let temp_dir = TempDir::new().unwrap();

    {
        let queue = QueueBuilder::new(temp_dir.path())
            .chunk_capacity(2)
            .open()
            .unwrap();
        for i in 0..7 {
            queue.put(format!("entry-{i}")).unwrap();
        }
        queue.sync().unwrap();
    }

    // Copy the on-disk state and drain both copies independently.
    let copies = [TempDir::new().unwrap(), TempDir::new().unwrap()];
    for copy in &copies {
        for entry in fs::read_dir(temp_dir.path()).unwrap() {
            let entry = entry.unwrap();
            fs::copy(entry.path(), copy.path().join(entry.file_name())).unwrap();
        }
    }

    let first = drain(&QueueBuilder::new(copies[0].path()).open().unwrap());
    let second = drain(&QueueBuilder::new(copies[1].path()).open().unwrap());

    assert_eq!(first.len(), 7);
    assert_eq!(first, second);
}

#[test]
fn test_invalid_capacity_rejected() {
    let temp_dir = TempDir::new().unwrap();

    let err = QueueBuilder::new(temp_dir.path())
        .chunk_capacity(0)
        .open()
        .unwrap_err();
    assert!(matches!(err, QueueError::InvalidCapacity { capacity: 0 }));

    // the failed open must not have left a queue behind
    assert!(!temp_dir.path().join(".index").exists());
}

#[test]
fn test_corrupt_index_self_heals_into_empty_queue() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join(".index"), b"{{{ not json").unwrap();

    let queue = QueueBuilder::new(temp_dir.path())
        .chunk_capacity(4)
        .open()
        .unwrap();
    assert!(queue.get().unwrap_err().is_empty());

    queue.put_and_flush("recovered").unwrap();
    assert_eq!(queue.get().unwrap(), Bytes::from("recovered"));
}

#[test]
fn test_two_handles_interleave_put_and_get() {
    let temp_dir = TempDir::new().unwrap();

    let producer = QueueBuilder::new(temp_dir.path())
        .chunk_capacity(2)
        .open()
        .unwrap();
    let consumer = QueueBuilder::new(temp_dir.path())
        .chunk_capacity(2)
        .open()
        .unwrap();

    producer.put("one").unwrap();
    producer.put("two").unwrap(); // fills the chunk, flushes

    assert_eq!(consumer.get().unwrap(), Bytes::from("one"));

    producer.put_and_flush("three").unwrap();

    assert_eq!(consumer.get().unwrap(), Bytes::from("two"));
    assert_eq!(consumer.get().unwrap(), Bytes::from("three"));
    assert!(consumer.get().unwrap_err().is_empty());
}
