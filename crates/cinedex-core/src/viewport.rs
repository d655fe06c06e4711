//! Viewport visibility events and the infinite-scroll trigger.
//!
//! The view layer owns a [`ViewportSignal`] and emits an event whenever the
//! sentinel element at the bottom of a list enters or leaves the viewport.

use tokio::task::JoinHandle;

use crate::signal::{Signal, Subscription};
use crate::sync::{ListSynchronizer, PageSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportEvent {
    SentinelVisible,
    SentinelHidden,
}

pub type ViewportSignal = Signal<ViewportEvent>;

/// Drives [`ListSynchronizer::load_more`] from sentinel visibility.
///
/// The trigger reads the synchronizer's live state on every event, so a
/// reset or filter change is picked up without re-attaching. Dropping the
/// trigger (view teardown) unsubscribes.
#[derive(Debug)]
pub struct PaginationTrigger {
    task: JoinHandle<()>,
}

impl PaginationTrigger {
    pub fn attach<S: PageSource>(
        sync: ListSynchronizer<S>,
        mut subscription: Subscription<ViewportEvent>,
    ) -> Self {
        let task = tokio::spawn(async move {
            while let Some(event) = subscription.next().await {
                if event != ViewportEvent::SentinelVisible {
                    continue;
                }
                if let Some(fetch) = sync.load_more() {
                    tracing::debug!(page = sync.page() + 1, "Sentinel visible, loading next page");
                    tokio::spawn(fetch);
                }
            }
        });
        Self { task }
    }

    /// Stop reacting to visibility events.
    pub fn detach(self) {}

    pub fn is_attached(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for PaginationTrigger {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::filter::FilterState;
    use crate::models::Keyed;
    use crate::sync::PageResult;

    #[derive(Debug, Clone)]
    struct Row(u64);

    impl Keyed for Row {
        type Key = u64;

        fn key(&self) -> u64 {
            self.0
        }
    }

    /// Ten rows per page, 50 pages.
    #[derive(Default)]
    struct Paged {
        calls: AtomicU32,
    }

    impl PageSource for Paged {
        type Item = Row;
        type Error = String;

        async fn fetch_page(
            &self,
            _filters: &FilterState,
            page: u32,
        ) -> Result<PageResult<Row>, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let start = u64::from(page - 1) * 10;
            Ok(PageResult {
                items: (start..start + 10).map(Row).collect(),
                page,
                total_pages: 50,
            })
        }
    }

    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_visible_sentinel_loads_next_page() {
        let sync = ListSynchronizer::new(Paged::default());
        sync.reset(FilterState::new()).await;

        let signal = ViewportSignal::new();
        let _trigger = PaginationTrigger::attach(sync.clone(), signal.subscribe());

        signal.emit(ViewportEvent::SentinelHidden);
        settle().await;
        assert_eq!(sync.page(), 1);

        signal.emit(ViewportEvent::SentinelVisible);
        settle().await;
        assert_eq!(sync.page(), 2);
        assert_eq!(sync.len(), 20);
    }

    #[tokio::test]
    async fn test_burst_dispatches_single_fetch() {
        let sync = ListSynchronizer::new(Paged::default());
        sync.reset(FilterState::new()).await;
        let signal = ViewportSignal::new();
        let _trigger = PaginationTrigger::attach(sync.clone(), signal.subscribe());

        for _ in 0..5 {
            signal.emit(ViewportEvent::SentinelVisible);
        }
        settle().await;

        assert_eq!(sync.source().calls.load(Ordering::SeqCst), 2);
        assert_eq!(sync.page(), 2);
    }

    #[tokio::test]
    async fn test_detach_unsubscribes() {
        let sync = ListSynchronizer::new(Paged::default());
        sync.reset(FilterState::new()).await;
        let signal = ViewportSignal::new();
        let trigger = PaginationTrigger::attach(sync.clone(), signal.subscribe());
        assert_eq!(signal.subscriber_count(), 1);

        trigger.detach();
        settle().await;
        assert_eq!(signal.subscriber_count(), 0);
        assert_eq!(signal.emit(ViewportEvent::SentinelVisible), 0);
        settle().await;
        assert_eq!(sync.page(), 1);
    }

    #[tokio::test]
    async fn test_trigger_follows_reset() {
        let sync = ListSynchronizer::new(Paged::default());
        sync.reset(FilterState::new()).await;
        let signal = ViewportSignal::new();
        let _trigger = PaginationTrigger::attach(sync.clone(), signal.subscribe());

        signal.emit(ViewportEvent::SentinelVisible);
        settle().await;
        assert_eq!(sync.page(), 2);

        sync.reset(FilterState::new().with_genres([80])).await;
        signal.emit(ViewportEvent::SentinelVisible);
        settle().await;
        // Continues from the fresh page 1, not from the old page 2.
        assert_eq!(sync.page(), 2);
        assert_eq!(sync.state().filters.genres, vec![80]);
        assert_eq!(sync.len(), 20);
    }
}
