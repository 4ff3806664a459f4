//! Stable elevation-ordered task queues.
//!
//! One queue instance serves as a lake's boundary frontier (tasks are node
//! ids, priority is node elevation) and another orders the lakes themselves
//! by water level. Ties pop in insertion order, and re-adding a task
//! supersedes its previous entry; superseded entries are dropped lazily on
//! pop.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use ordered_float::OrderedFloat;

/// Min-priority queue of `u32` tasks keyed by `f64` priority, stable for
/// equal priorities.
#[derive(Debug, Clone, Default)]
pub struct ElevQueue {
    heap: BinaryHeap<Reverse<(OrderedFloat<f64>, u64, u32)>>,
    current: HashMap<u32, u64>,
    seq: u64,
}

impl ElevQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `task` at `priority`. Any earlier entry for the same task is
    /// superseded.
    pub fn push(&mut self, task: u32, priority: f64) {
        self.seq += 1;
        self.current.insert(task, self.seq);
        self.heap.push(Reverse((OrderedFloat(priority), self.seq, task)));
    }

    /// Pop the lowest-priority task, skipping superseded entries.
    pub fn pop(&mut self) -> Option<u32> {
        while let Some(Reverse((_, seq, task))) = self.heap.pop() {
            if self.current.get(&task) == Some(&seq) {
                self.current.remove(&task);
                return Some(task);
            }
        }
        None
    }

    /// Lowest pending priority, if any task is queued.
    pub fn peek_priority(&self) -> Option<f64> {
        // Skip stale heads without mutating: clone-free scan is not possible
        // on BinaryHeap, so tolerate a conservative answer from the raw head.
        self.heap
            .iter()
            .filter(|Reverse((_, seq, task))| self.current.get(task) == Some(seq))
            .map(|Reverse((p, _, _))| p.0)
            .fold(None, |acc, p| Some(acc.map_or(p, |a: f64| a.min(p))))
    }

    /// Number of live tasks in the queue.
    pub fn len(&self) -> usize {
        self.current.len()
    }

    /// True when no live task remains.
    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// True if `task` currently has a live entry.
    pub fn contains(&self, task: u32) -> bool {
        self.current.contains_key(&task)
    }

    /// Absorb every live task of `other`, superseding duplicates in `self`.
    pub fn merge(&mut self, mut other: ElevQueue) {
        while let Some(Reverse((p, seq, task))) = other.heap.pop() {
            if other.current.get(&task) == Some(&seq) {
                other.current.remove(&task);
                self.push(task, p.0);
            }
        }
    }

    /// Live tasks ordered by (priority, insertion), primarily for tests and
    /// diagnostics.
    pub fn tasks_in_queue(&self) -> Vec<u32> {
        let mut snapshot = self.clone();
        let mut out = Vec::with_capacity(snapshot.len());
        while let Some(t) = snapshot.pop() {
            out.push(t);
        }
        out
    }
}
