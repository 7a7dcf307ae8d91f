//! Bounded min-priority run buffer.

use std::cmp::Ordering;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::format::{Row, SortKey};

/// Entry ordered by key text first, insertion sequence second, so that equal
/// keys drain in insertion order and every drain is deterministic.
#[derive(Debug)]
struct BufferEntry {
    key: String,
    seq: u64,
    row: Row,
}

impl PartialEq for BufferEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BufferEntry {}

impl PartialOrd for BufferEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BufferEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key).then(self.seq.cmp(&other.seq))
    }
}

/// Row buffer bounded by element count, draining in ascending key order.
///
/// This is the only ordering mechanism in run generation: rows go in one at a
/// time and come back out by repeated extract-minimum, which is what lets a
/// full buffer stream straight to a sorted run file. No slice sort is ever
/// involved.
pub struct RunBuffer {
    ceiling: usize,
    seq: u64,
    // binary heap is a max-heap by default so entries are reversed to get a min-heap
    heap: BinaryHeap<Reverse<BufferEntry>>,
}

impl RunBuffer {
    /// Creates a buffer holding at most `ceiling` rows.
    pub fn new(ceiling: usize) -> Self {
        RunBuffer {
            ceiling,
            seq: 0,
            heap: BinaryHeap::with_capacity(ceiling),
        }
    }

    /// Inserts a row, keying it by `key`'s column.
    pub fn push(&mut self, key: &SortKey, row: Row) {
        let entry = BufferEntry {
            key: key.field_of(&row).to_string(),
            seq: self.seq,
            row,
        };
        self.seq += 1;
        self.heap.push(Reverse(entry));
    }

    /// Extracts the row with the minimum key.
    pub fn pop_min(&mut self) -> Option<Row> {
        self.heap.pop().map(|Reverse(entry)| entry.row)
    }

    /// Number of buffered rows.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Checks if the buffer holds no rows.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Checks if the buffer reached its ceiling.
    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.ceiling
    }
}
