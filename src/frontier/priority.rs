use super::Page;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

/// A page waiting in the [`PriorityFrontier`]
#[derive(Debug, Clone)]
pub struct QueuedPage {
    pub page: Page,

    /// Link distance from the start page
    pub depth: u32,

    /// Relevance score; higher is visited first
    pub score: f64,

    /// Insertion sequence used to break score ties
    seq: u64,
}

// BinaryHeap is a max-heap: higher score first, then lower sequence
impl Ord for QueuedPage {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedPage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedPage {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedPage {}

/// Best-first frontier used during link discovery
///
/// Same dedup contract as [`super::Frontier`]: a URL is held at most once
/// while queued and may be pushed again after it is popped.
#[derive(Debug, Default)]
pub struct PriorityFrontier {
    heap: BinaryHeap<QueuedPage>,
    queued: HashSet<String>,
    next_seq: u64,
}

impl PriorityFrontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a page; returns false if its URL is already queued
    pub fn push(&mut self, page: Page, depth: u32, score: f64) -> bool {
        if !self.queued.insert(page.url.clone()) {
            return false;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(QueuedPage {
            page,
            depth,
            score,
            seq,
        });
        true
    }

    /// Removes the highest-scored page, earliest pushed among equals
    pub fn pop(&mut self) -> Option<QueuedPage> {
        let next = self.heap.pop()?;
        self.queued.remove(&next.page.url);
        Some(next)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn size(&self) -> usize {
        self.heap.len()
    }
}
