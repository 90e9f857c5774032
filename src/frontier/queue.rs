use super::{FrontierError, Page};
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct QueueState {
    pages: VecDeque<Page>,
    queued: HashSet<String>,
}

/// Deduplicating FIFO queue of pages
///
/// The membership check and the enqueue/dequeue happen under one lock, so
/// concurrent `put` and `get` calls never leave two copies of a URL in the
/// queue. Shared between tasks through `&self` (wrap in `Arc` as needed).
#[derive(Default)]
pub struct Frontier {
    state: Mutex<QueueState>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a page unless its URL is already queued
    ///
    /// # Returns
    ///
    /// * `true` - The page was enqueued
    /// * `false` - The URL was already queued; nothing changed
    pub fn put(&self, page: Page) -> bool {
        let mut state = self.lock();
        if !state.queued.insert(page.url.clone()) {
            return false;
        }
        state.pages.push_back(page);
        true
    }

    /// Removes the earliest enqueued page
    ///
    /// Once returned, the URL may be put again.
    pub fn get(&self) -> Result<Page, FrontierError> {
        let mut state = self.lock();
        let page = state.pages.pop_front().ok_or(FrontierError::EmptyQueue)?;
        state.queued.remove(&page.url);
        Ok(page)
    }

    pub fn is_empty(&self) -> bool {
        self.lock().pages.is_empty()
    }

    /// Number of distinct URLs currently queued
    pub fn size(&self) -> usize {
        self.lock().pages.len()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // The state stays consistent even if a holder panicked
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_fifo_order() {
        let frontier = Frontier::new();
        frontier.put(Page::detail("https://acme.com/a"));
        frontier.put(Page::detail("https://acme.com/b"));
        frontier.put(Page::detail("https://acme.com/c"));

        assert_eq!(frontier.get().unwrap().url, "https://acme.com/a");
        assert_eq!(frontier.get().unwrap().url, "https://acme.com/b");
        assert_eq!(frontier.get().unwrap().url, "https://acme.com/c");
    }

    #[test]
    fn test_duplicate_put_is_noop() {
        let frontier = Frontier::new();
        assert!(frontier.put(Page::listing("https://acme.com/a")));
        assert!(!frontier.put(Page::detail("https://acme.com/a")));
        assert_eq!(frontier.size(), 1);
        // The first put wins
        assert_eq!(frontier.get().unwrap().level, crate::frontier::Level::Listing);
    }

    #[test]
    fn test_size_counts_distinct_urls() {
        let frontier = Frontier::new();
        for url in ["/a", "/b", "/a", "/c", "/b"] {
            frontier.put(Page::detail(url));
        }
        assert_eq!(frontier.size(), 3);
    }

    #[test]
    fn test_get_on_empty() {
        let frontier = Frontier::new();
        assert!(frontier.is_empty());
        assert_eq!(frontier.get(), Err(FrontierError::EmptyQueue));
    }

    #[test]
    fn test_put_after_get() {
        let frontier = Frontier::new();
        frontier.put(Page::detail("/a"));
        frontier.get().unwrap();
        assert!(frontier.put(Page::detail("/a")));
        assert_eq!(frontier.size(), 1);
    }

    #[test]
    fn test_concurrent_puts_dedupe() {
        let frontier = Arc::new(Frontier::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let frontier = Arc::clone(&frontier);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        frontier.put(Page::detail(format!("/imovel/{}", i)));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(frontier.size(), 100);
    }
}
