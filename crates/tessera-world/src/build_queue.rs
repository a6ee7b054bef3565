//! Set of columns waiting for a mesh (re)build.
//!
//! Entries keep their insertion order so scheduling passes visit columns in
//! the order they arrived, but membership is deduplicated through a hash set.

use rustc_hash::FxHashSet;

use crate::coords::ColumnCoord;

/// Pending columns awaiting a build once their neighbors are resident.
#[derive(Debug, Default)]
pub struct BuildQueue {
    /// Insertion-ordered entries, same membership as `pending`.
    order: Vec<ColumnCoord>,
    /// Coordinates currently queued (dedup guard).
    pending: FxHashSet<ColumnCoord>,
}

impl BuildQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues `coord`. Returns `false` if it was already pending.
    pub fn push(&mut self, coord: ColumnCoord) -> bool {
        if self.pending.insert(coord) {
            self.order.push(coord);
            true
        } else {
            false
        }
    }

    /// Returns `true` if `coord` is pending.
    pub fn contains(&self, coord: ColumnCoord) -> bool {
        self.pending.contains(&coord)
    }

    /// Removes `coord`. Returns `true` if it was pending.
    pub fn remove(&mut self, coord: ColumnCoord) -> bool {
        let removed = self.pending.remove(&coord);
        if removed {
            self.order.retain(|&queued| queued != coord);
        }
        removed
    }

    /// Snapshot of pending coordinates in insertion order.
    pub fn pending(&self) -> Vec<ColumnCoord> {
        self.order.clone()
    }

    /// Keeps only the entries for which `keep` returns `true`, visiting them
    /// in insertion order.
    pub fn retain(&mut self, mut keep: impl FnMut(ColumnCoord) -> bool) {
        let pending = &mut self.pending;
        self.order.retain(|&coord| {
            let kept = keep(coord);
            if !kept {
                pending.remove(&coord);
            }
            kept
        });
    }

    /// Number of pending columns.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drops every pending entry.
    pub fn clear(&mut self) {
        self.order.clear();
        self.pending.clear();
    }
}
