//! Incremental synchronization of an infinite-scroll list against a
//! paginated upstream.
//!
//! A [`ListSynchronizer`] owns the in-memory list for one view. Pages are
//! fetched through an injected [`PageSource`], merged without duplicate
//! keys, and tagged with the generation they were issued under so that a
//! response arriving after a filter change is dropped instead of merged.
//!
//! State lives behind a `std::sync::Mutex` that is only held for short,
//! synchronous sections and never across an `.await`.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::Instrument;

use crate::filter::FilterState;
use crate::models::Keyed;

/// Hard ceiling on pagination regardless of what the upstream reports.
pub const MAX_PAGES: u32 = 500;

/// One page returned by a [`PageSource`].
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub page: u32,
    /// Zero when the upstream did not report a page count.
    pub total_pages: u32,
}

/// The paginated fetch function a list is synchronized against.
pub trait PageSource: Send + Sync + 'static {
    type Item: Keyed + Clone + Send + Sync + 'static;
    type Error: std::fmt::Display + Send + 'static;

    fn fetch_page(
        &self,
        filters: &FilterState,
        page: u32,
    ) -> impl Future<Output = Result<PageResult<Self::Item>, Self::Error>> + Send;
}

/// What happened to a single page fetch.
///
/// The list state is fail-soft either way; this only lets a caller tell an
/// upstream failure apart from a genuine end of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page was merged into the list.
    Applied,
    /// The filters changed while the fetch was in flight; response dropped.
    Stale,
    /// The fetch failed; the list was left as it was.
    Failed,
}

/// Observable list state for the view layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ListState<T> {
    /// Unique by key, in arrival order.
    pub items: Vec<T>,
    pub page: u32,
    pub has_more: bool,
    pub is_loading_initial: bool,
    pub is_loading_more: bool,
    pub filters: FilterState,
    /// Bumped on every reset; fetches issued under an older value are stale.
    pub generation: u64,
}

impl<T> ListState<T> {
    fn empty(filters: FilterState) -> Self {
        Self {
            items: Vec::new(),
            page: 0,
            has_more: true,
            is_loading_initial: false,
            is_loading_more: false,
            filters,
            generation: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading_initial || self.is_loading_more
    }

    /// Whether the viewport trigger may request the next page.
    pub fn can_load_more(&self) -> bool {
        self.has_more && !self.is_loading()
    }
}

struct Inner<T: Keyed> {
    state: ListState<T>,
    seen: HashSet<T::Key>,
}

/// Parameters captured when a fetch is issued.
#[derive(Debug, Clone)]
struct Ticket {
    generation: u64,
    page: u32,
    replace: bool,
    filters: FilterState,
}

impl<T: Keyed> Inner<T> {
    fn ticket(&self, page: u32, replace: bool) -> Ticket {
        Ticket {
            generation: self.state.generation,
            page,
            replace,
            filters: self.state.filters.clone(),
        }
    }

    fn apply<E: std::fmt::Display>(
        &mut self,
        ticket: &Ticket,
        result: Result<PageResult<T>, E>,
    ) -> FetchOutcome {
        if ticket.generation != self.state.generation {
            tracing::debug!(
                issued = ticket.generation,
                current = self.state.generation,
                "Discarding stale page response"
            );
            return FetchOutcome::Stale;
        }

        match result {
            Ok(result) => {
                self.merge(ticket, result);
                FetchOutcome::Applied
            }
            Err(e) => {
                tracing::warn!(error = %e, page = ticket.page, "Page fetch failed, keeping current list");
                FetchOutcome::Failed
            }
        }
    }

    fn merge(&mut self, ticket: &Ticket, result: PageResult<T>) {
        if ticket.replace {
            self.state.items.clear();
            self.seen.clear();
        }

        let received = result.items.len();
        for item in result.items {
            if self.seen.insert(item.key()) {
                self.state.items.push(item);
            }
        }

        self.state.page = ticket.page;
        self.state.has_more = ticket.page < result.total_pages && ticket.page < MAX_PAGES;

        tracing::debug!(
            page = ticket.page,
            received,
            total = self.state.items.len(),
            has_more = self.state.has_more,
            "Merged page"
        );
    }
}

fn lock<T: Keyed>(inner: &Mutex<Inner<T>>) -> MutexGuard<'_, Inner<T>> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the loading flags when a fetch finishes, fails or is dropped,
/// unless the list has been reset since the fetch was issued.
struct LoadingCleanup<T: Keyed> {
    inner: Arc<Mutex<Inner<T>>>,
    generation: u64,
}

impl<T: Keyed> Drop for LoadingCleanup<T> {
    fn drop(&mut self) {
        let mut inner = lock(&self.inner);
        if inner.state.generation == self.generation {
            inner.state.is_loading_initial = false;
            inner.state.is_loading_more = false;
        }
    }
}

/// Keeps one paginated list in sync with its upstream.
///
/// Cloning yields another handle to the same list.
pub struct ListSynchronizer<S: PageSource> {
    source: Arc<S>,
    inner: Arc<Mutex<Inner<S::Item>>>,
}

impl<S: PageSource> Clone for ListSynchronizer<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: PageSource> ListSynchronizer<S> {
    pub fn new(source: S) -> Self {
        Self::from_arc(Arc::new(source))
    }

    pub fn from_arc(source: Arc<S>) -> Self {
        Self {
            source,
            inner: Arc::new(Mutex::new(Inner {
                state: ListState::empty(FilterState::default()),
                seen: HashSet::new(),
            })),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Snapshot of the current list state.
    pub fn state(&self) -> ListState<S::Item> {
        lock(&self.inner).state.clone()
    }

    pub fn items(&self) -> Vec<S::Item> {
        lock(&self.inner).state.items.clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).state.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn page(&self) -> u32 {
        lock(&self.inner).state.page
    }

    pub fn has_more(&self) -> bool {
        lock(&self.inner).state.has_more
    }

    pub fn is_loading_initial(&self) -> bool {
        lock(&self.inner).state.is_loading_initial
    }

    pub fn is_loading_more(&self) -> bool {
        lock(&self.inner).state.is_loading_more
    }

    pub fn filters(&self) -> FilterState {
        lock(&self.inner).state.filters.clone()
    }

    /// Hard reset: clear the list and fetch page 1 under `filters`.
    ///
    /// The state change happens immediately, before the returned future is
    /// first polled. Calling this again with identical filters still
    /// re-fetches.
    pub fn reset(&self, filters: FilterState) -> impl Future<Output = FetchOutcome> + Send + 'static {
        let ticket = {
            let mut inner = lock(&self.inner);
            inner.state.generation += 1;
            inner.state.items.clear();
            inner.seen.clear();
            inner.state.page = 1;
            inner.state.has_more = true;
            inner.state.is_loading_initial = true;
            inner.state.is_loading_more = false;
            inner.state.filters = filters;
            inner.ticket(1, true)
        };
        tracing::debug!(generation = ticket.generation, "List reset");
        self.run(ticket)
    }

    /// Apply new filters. Any fetch still in flight for the previous
    /// filters is ignored when it completes.
    pub fn on_filter_change(
        &self,
        filters: FilterState,
    ) -> impl Future<Output = FetchOutcome> + Send + 'static {
        self.reset(filters)
    }

    /// Fetch page `page` (1-based) under the current filters.
    ///
    /// With `replace` the page's items become the whole list; otherwise
    /// unseen items are appended. Callers must not issue this while another
    /// fetch for the list is in flight; [`load_more`](Self::load_more)
    /// enforces that for viewport-driven pagination.
    pub fn fetch_page(
        &self,
        page: u32,
        replace: bool,
    ) -> impl Future<Output = FetchOutcome> + Send + 'static {
        let ticket = {
            let mut inner = lock(&self.inner);
            if replace {
                inner.state.is_loading_initial = true;
            } else {
                inner.state.is_loading_more = true;
            }
            inner.ticket(page.max(1), replace)
        };
        self.run(ticket)
    }

    /// Request the next page if there is one and nothing is loading.
    ///
    /// The check and the `is_loading_more` flag are updated in one critical
    /// section, so repeated visibility events dispatch at most one fetch.
    pub fn load_more(&self) -> Option<impl Future<Output = FetchOutcome> + Send + 'static> {
        let ticket = {
            let mut inner = lock(&self.inner);
            if !inner.state.can_load_more() {
                return None;
            }
            inner.state.is_loading_more = true;
            let next = inner.state.page + 1;
            inner.ticket(next, false)
        };
        Some(self.run(ticket))
    }

    fn run(&self, ticket: Ticket) -> impl Future<Output = FetchOutcome> + Send + 'static {
        let source = Arc::clone(&self.source);
        let inner = Arc::clone(&self.inner);
        // Armed before the future exists, so dropping it unpolled still
        // clears the flags.
        let cleanup = LoadingCleanup {
            inner: Arc::clone(&inner),
            generation: ticket.generation,
        };
        let span = tracing::debug_span!(
            "fetch_page",
            page = ticket.page,
            replace = ticket.replace,
            generation = ticket.generation
        );

        async move {
            let _cleanup = cleanup;
            let result = source.fetch_page(&ticket.filters, ticket.page).await;
            // Release the lock before `_cleanup` takes it.
            let outcome = lock(&inner).apply(&ticket, result);
            outcome
        }
        .instrument(span)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Notify;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct TestItem {
        id: u64,
    }

    impl Keyed for TestItem {
        type Key = u64;

        fn key(&self) -> u64 {
            self.id
        }
    }

    /// Serves canned pages. Requests whose filters carry `slow` wait on
    /// `gate` and answer with ids offset by 100; `hang` waits on `hold`.
    #[derive(Default)]
    struct ScriptedSource {
        pages: HashMap<u32, Result<(Vec<u64>, u32), String>>,
        gate: Arc<Notify>,
        hold: Arc<Notify>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn page(mut self, page: u32, ids: &[u64], total_pages: u32) -> Self {
            self.pages.insert(page, Ok((ids.to_vec(), total_pages)));
            self
        }

        fn failing(mut self, page: u32) -> Self {
            self.pages.insert(page, Err("503 Service Unavailable".into()));
            self
        }
    }

    impl PageSource for ScriptedSource {
        type Item = TestItem;
        type Error = String;

        async fn fetch_page(
            &self,
            filters: &FilterState,
            page: u32,
        ) -> Result<PageResult<TestItem>, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let slow = filters.extra.contains_key("slow");
            if slow {
                self.gate.notified().await;
            } else if filters.extra.contains_key("hang") {
                self.hold.notified().await;
            }
            let offset = if slow { 100 } else { 0 };
            let (ids, total_pages) = self
                .pages
                .get(&page)
                .cloned()
                .unwrap_or_else(|| Err(format!("no page {page}")))?;
            Ok(PageResult {
                items: ids.into_iter().map(|id| TestItem { id: id + offset }).collect(),
                page,
                total_pages,
            })
        }
    }

    fn ids<S: PageSource<Item = TestItem>>(sync: &ListSynchronizer<S>) -> Vec<u64> {
        sync.items().iter().map(|i| i.id).collect()
    }

    fn overlapping_source() -> ScriptedSource {
        ScriptedSource::default()
            .page(1, &[1, 2, 3], 3)
            .page(2, &[3, 4, 5], 3)
            .page(3, &[6], 3)
    }

    #[tokio::test]
    async fn test_overlapping_pages_merge_without_duplicates() {
        let sync = ListSynchronizer::new(overlapping_source());

        assert_eq!(sync.reset(FilterState::new()).await, FetchOutcome::Applied);
        assert_eq!(ids(&sync), vec![1, 2, 3]);

        assert_eq!(sync.fetch_page(2, false).await, FetchOutcome::Applied);
        assert_eq!(ids(&sync), vec![1, 2, 3, 4, 5]);
        assert_eq!(sync.page(), 2);
        assert!(sync.has_more());

        assert_eq!(sync.fetch_page(3, false).await, FetchOutcome::Applied);
        assert_eq!(ids(&sync), vec![1, 2, 3, 4, 5, 6]);
        assert!(!sync.has_more());
        assert!(!sync.is_loading_more());
    }

    #[tokio::test]
    async fn test_replace_dedupes_within_page() {
        let source = ScriptedSource::default().page(1, &[7, 7, 8], 1);
        let sync = ListSynchronizer::new(source);
        sync.reset(FilterState::new()).await;
        assert_eq!(ids(&sync), vec![7, 8]);
        // A replace fetch drops whatever was there.
        sync.fetch_page(1, true).await;
        assert_eq!(ids(&sync), vec![7, 8]);
    }

    #[tokio::test]
    async fn test_reset_is_synchronous() {
        let sync = ListSynchronizer::new(overlapping_source());
        sync.reset(FilterState::new()).await;
        sync.load_more().unwrap().await;
        assert_eq!(sync.page(), 2);

        let filters = FilterState::new().with_genres([28]);
        let pending = sync.reset(filters.clone());
        let state = sync.state();
        assert!(state.items.is_empty());
        assert_eq!(state.page, 1);
        assert!(state.has_more);
        assert!(state.is_loading_initial);
        assert_eq!(state.filters, filters);

        assert_eq!(pending.await, FetchOutcome::Applied);
        assert!(!sync.is_loading_initial());
    }

    #[tokio::test]
    async fn test_identical_reset_refetches() {
        let sync = ListSynchronizer::new(overlapping_source());
        sync.reset(FilterState::new()).await;
        sync.reset(FilterState::new()).await;
        assert_eq!(sync.source().calls.load(Ordering::SeqCst), 2);
        assert_eq!(sync.state().generation, 2);
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let source = overlapping_source();
        let gate = Arc::clone(&source.gate);
        let sync = ListSynchronizer::new(source);

        let slow = tokio::spawn(sync.reset(FilterState::new().with_extra("slow", "1")));
        tokio::task::yield_now().await;

        assert_eq!(
            sync.on_filter_change(FilterState::new()).await,
            FetchOutcome::Applied
        );
        gate.notify_one();

        assert_eq!(slow.await.unwrap(), FetchOutcome::Stale);
        assert_eq!(ids(&sync), vec![1, 2, 3]);
        assert!(!sync.is_loading_initial());
    }

    #[tokio::test]
    async fn test_stale_completion_keeps_new_loading_flag() {
        let source = overlapping_source();
        let gate = Arc::clone(&source.gate);
        let hold = Arc::clone(&source.hold);
        let sync = ListSynchronizer::new(source);

        let first = tokio::spawn(sync.reset(FilterState::new().with_extra("slow", "1")));
        tokio::task::yield_now().await;
        let second = tokio::spawn(sync.reset(FilterState::new().with_extra("hang", "1")));
        tokio::task::yield_now().await;

        // Release the first fetch only; the second is still outstanding.
        gate.notify_one();
        assert_eq!(first.await.unwrap(), FetchOutcome::Stale);
        assert!(sync.is_loading_initial());
        assert!(sync.is_empty());

        hold.notify_one();
        assert_eq!(second.await.unwrap(), FetchOutcome::Applied);
        assert!(!sync.is_loading_initial());
    }

    #[tokio::test]
    async fn test_reset_during_load_more_discards_page() {
        let source = overlapping_source();
        let gate = Arc::clone(&source.gate);
        let sync = ListSynchronizer::new(source);

        let initial = tokio::spawn(sync.reset(FilterState::new().with_extra("slow", "1")));
        gate.notify_one();
        assert_eq!(initial.await.unwrap(), FetchOutcome::Applied);
        assert_eq!(ids(&sync), vec![101, 102, 103]);

        let more = tokio::spawn(sync.load_more().expect("page 2 available"));
        tokio::task::yield_now().await;
        assert!(sync.is_loading_more());

        assert_eq!(sync.reset(FilterState::new()).await, FetchOutcome::Applied);
        gate.notify_one();
        assert_eq!(more.await.unwrap(), FetchOutcome::Stale);

        let state = sync.state();
        assert_eq!(ids(&sync), vec![1, 2, 3]);
        assert_eq!(state.page, 1);
        assert!(state.has_more);
        assert!(!state.is_loading_more);
        assert!(!state.is_loading_initial);
    }

    #[tokio::test]
    async fn test_load_more_guards_reentry() {
        let sync = ListSynchronizer::new(overlapping_source());
        sync.reset(FilterState::new()).await;

        let first = sync.load_more().expect("next page available");
        assert!(sync.is_loading_more());
        assert!(sync.load_more().is_none());
        assert_eq!(first.await, FetchOutcome::Applied);
        assert_eq!(sync.page(), 2);

        assert!(sync.load_more().is_some());
    }

    #[tokio::test]
    async fn test_load_more_blocked_during_initial_load() {
        let sync = ListSynchronizer::new(overlapping_source());
        let initial = sync.reset(FilterState::new());
        assert!(sync.load_more().is_none());
        initial.await;
        assert!(sync.load_more().is_some());
    }

    #[tokio::test]
    async fn test_failure_leaves_state_and_clears_flags() {
        let source = ScriptedSource::default().page(1, &[1, 2], 5).failing(2);
        let sync = ListSynchronizer::new(source);
        sync.reset(FilterState::new()).await;
        let before = sync.state();

        assert_eq!(sync.load_more().unwrap().await, FetchOutcome::Failed);
        let after = sync.state();
        assert_eq!(after.items, before.items);
        assert_eq!(after.page, 1);
        assert!(after.has_more);
        assert!(!after.is_loading_more);
        assert!(!after.is_loading_initial);
        // No retry was scheduled.
        assert_eq!(sync.source().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_initial_failure_keeps_empty_list() {
        let sync = ListSynchronizer::new(ScriptedSource::default().failing(1));
        assert_eq!(sync.reset(FilterState::new()).await, FetchOutcome::Failed);
        let state = sync.state();
        assert!(state.items.is_empty());
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn test_zero_total_pages_ends_list() {
        let sync = ListSynchronizer::new(ScriptedSource::default().page(1, &[1], 0));
        sync.reset(FilterState::new()).await;
        assert!(!sync.has_more());
        assert!(sync.load_more().is_none());
    }

    #[tokio::test]
    async fn test_short_page_still_has_more() {
        let sync = ListSynchronizer::new(ScriptedSource::default().page(1, &[1], 4));
        sync.reset(FilterState::new()).await;
        assert!(sync.has_more());
    }

    #[tokio::test]
    async fn test_page_ceiling() {
        let source = ScriptedSource::default()
            .page(1, &[1], 1000)
            .page(499, &[499], 1000)
            .page(500, &[500], 1000);
        let sync = ListSynchronizer::new(source);
        sync.reset(FilterState::new()).await;

        sync.fetch_page(499, false).await;
        assert!(sync.has_more());
        sync.load_more().unwrap().await;
        assert_eq!(sync.page(), 500);
        assert!(!sync.has_more());
        assert!(sync.load_more().is_none());
    }

    #[tokio::test]
    async fn test_pages_monotonic_under_load_more() {
        let source = ScriptedSource::default()
            .page(1, &[1, 2], 4)
            .page(2, &[2, 3], 4)
            .page(3, &[4, 1], 4)
            .page(4, &[5], 4);
        let sync = ListSynchronizer::new(source);
        sync.reset(FilterState::new()).await;

        let mut last = sync.page();
        while let Some(next) = sync.load_more() {
            next.await;
            assert!(sync.page() >= last);
            last = sync.page();
            let mut seen = HashSet::new();
            assert!(sync.items().iter().all(|i| seen.insert(i.id)));
        }
        assert_eq!(last, 4);
        assert_eq!(ids(&sync), vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_dropped_fetch_clears_flags() {
        let sync = ListSynchronizer::new(overlapping_source());
        let handle = tokio::spawn(sync.reset(FilterState::new().with_extra("hang", "1")));
        tokio::task::yield_now().await;
        assert!(sync.is_loading_initial());

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
        assert!(!sync.is_loading_initial());
    }

    #[test]
    fn test_unpolled_fetch_drop_clears_flags() {
        let sync = ListSynchronizer::new(overlapping_source());
        let fetch = sync.reset(FilterState::new());
        assert!(sync.is_loading_initial());
        drop(fetch);
        assert!(!sync.is_loading_initial());
        assert_eq!(sync.page(), 1);
        assert!(sync.is_empty());
    }
}
