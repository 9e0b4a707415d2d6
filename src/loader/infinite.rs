//! Infinite list host
//!
//! Owns the loaded items and wires a [`PageSource`] to the [`LoaderState`]
//! and the [`LoopGuard`]. [`InfiniteLoader::attempt_load`] is what a scroll
//! trigger calls when the end of the list comes into view.

use async_trait::async_trait;

use crate::api::page::{LOAD_LIMIT, Page, PageRequest};
use crate::error::{FeedError, Result};
use crate::loader::guard::{LoopGuard, LoopGuardConfig};
use crate::loader::state::{LoadStatus, LoaderState};

/// Anything that can answer a page request
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, request: PageRequest) -> Result<Page>;
}

/// Why a trigger did not start a load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Unmounted,
    Complete,
    Loading,
    Error,
    CoolingOff,
}

/// Result of one trigger
#[derive(Debug)]
pub enum LoadOutcome {
    /// Page appended, more pages remain
    Loaded { added: usize },
    /// Page appended and the feed is exhausted
    Complete { added: usize },
    /// Nothing was requested
    Skipped(SkipReason),
    /// The request failed; the loader is now in `Error`
    Failed(FeedError),
}

impl LoadOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, LoadOutcome::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LoadOutcome::Failed(_))
    }
}

/// Puts an in-flight load back to `Ready` if the fetch future is dropped
/// before it finishes.
struct InFlight<'a> {
    state: &'a mut LoaderState,
    finished: bool,
}

impl<'a> InFlight<'a> {
    fn start(state: &'a mut LoaderState) -> Self {
        state.start_loading();
        Self { state, finished: false }
    }

    fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished && self.state.is_loading() {
            log::debug!("Page request dropped before it finished");
            self.state.status = LoadStatus::Ready;
        }
    }
}

/// Infinite list host
pub struct InfiniteLoader<S: PageSource> {
    source: S,
    state: LoaderState,
    guard: LoopGuard,
    page_size: u32,
    items: Vec<u64>,
    total_count: Option<u64>,
}

impl<S: PageSource> InfiniteLoader<S> {
    pub fn new(source: S, guard_config: LoopGuardConfig, page_size: u32) -> Self {
        Self {
            source,
            state: LoaderState::new(),
            guard: LoopGuard::new(guard_config),
            page_size,
            items: Vec::new(),
            total_count: None,
        }
    }

    /// Loader with the default guard and page size
    pub fn with_defaults(source: S) -> Self {
        Self::new(source, LoopGuardConfig::default(), LOAD_LIMIT)
    }

    /// Seed the list with items that were available before any scroll
    pub fn with_initial(mut self, items: Vec<u64>) -> Self {
        self.items = items;
        self
    }

    pub fn state(&self) -> &LoaderState {
        &self.state
    }

    pub fn status(&self) -> LoadStatus {
        self.state.status
    }

    pub fn guard(&self) -> &LoopGuard {
        &self.guard
    }

    pub fn items(&self) -> &[u64] {
        &self.items
    }

    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn mount(&mut self) {
        self.state.set_mounted(true);
    }

    /// Stop taking triggers and return the guard to idle
    pub fn unmount(&mut self) {
        self.state.set_mounted(false);
        self.guard.cancel_all();
    }

    /// Why a trigger right now would be ignored, if it would be
    pub fn skip_reason(&self) -> Option<SkipReason> {
        if !self.state.mounted {
            return Some(SkipReason::Unmounted);
        }
        match self.state.status {
            LoadStatus::Complete => Some(SkipReason::Complete),
            LoadStatus::Loading => Some(SkipReason::Loading),
            LoadStatus::Error => Some(SkipReason::Error),
            LoadStatus::Ready if self.guard.is_cooling_off() => Some(SkipReason::CoolingOff),
            LoadStatus::Ready => None,
        }
    }

    /// Handle one scroll trigger.
    ///
    /// Cancel safe: dropping the future mid-fetch leaves the loader `Ready`
    /// with no items added.
    pub async fn attempt_load(&mut self) -> LoadOutcome {
        if let Some(reason) = self.skip_reason() {
            log::debug!("Load trigger skipped: {:?}", reason);
            return LoadOutcome::Skipped(reason);
        }

        let request = PageRequest::new(self.page_size, self.items.len() as u64);
        log::debug!("Requesting page limit={} skip={}", request.limit, request.skip);

        let in_flight = InFlight::start(&mut self.state);
        self.guard.track();
        let result = self.source.fetch_page(request).await;
        in_flight.finish();

        match result {
            Ok(page) => self.apply_page(page),
            Err(e) => {
                log::warn!("Page request failed at skip={}: {}", request.skip, e);
                self.state.error();
                LoadOutcome::Failed(e)
            }
        }
    }

    fn apply_page(&mut self, page: Page) -> LoadOutcome {
        let total = page.total_count;
        self.total_count = Some(total);

        let loaded = self.items.len() as u64;
        let room = usize::try_from(total.saturating_sub(loaded)).unwrap_or(usize::MAX);
        let added = page.items.len().min(room);
        self.items.extend(page.items.into_iter().take(added));

        if added == 0 || self.items.len() as u64 >= total {
            log::info!("Feed complete with {} items", self.items.len());
            self.state.complete();
            LoadOutcome::Complete { added }
        } else {
            self.state.loaded();
            LoadOutcome::Loaded { added }
        }
    }

    /// Retry after an error. Moves back to `Ready` and attempts a load; any
    /// retry policy belongs to the caller.
    pub async fn retry(&mut self) -> LoadOutcome {
        if self.state.is_error() {
            self.state.status = LoadStatus::Ready;
        }
        self.attempt_load().await
    }

    /// Drop all items and start over
    pub fn reset(&mut self) {
        self.items.clear();
        self.total_count = None;
        self.state.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{MockApi, MockApiConfig};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Source that replays queued results and records requests
    #[derive(Default)]
    struct ScriptedSource {
        responses: Mutex<VecDeque<Result<Page>>>,
        requests: Mutex<Vec<PageRequest>>,
    }

    impl ScriptedSource {
        fn with(responses: Vec<Result<Page>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<PageRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource for ScriptedSource {
        async fn fetch_page(&self, request: PageRequest) -> Result<Page> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Page::for_request(&request, 200)))
        }
    }

    fn relaxed_guard() -> LoopGuardConfig {
        LoopGuardConfig::new(1000, Duration::from_millis(2000), Duration::from_millis(3000))
    }

    fn mounted<S: PageSource>(mut loader: InfiniteLoader<S>) -> InfiniteLoader<S> {
        loader.mount();
        loader
    }

    #[tokio::test]
    async fn test_first_load_requests_from_zero() {
        let mut loader = mounted(InfiniteLoader::new(ScriptedSource::default(), relaxed_guard(), 20));

        let outcome = loader.attempt_load().await;

        assert!(matches!(outcome, LoadOutcome::Loaded { added: 20 }));
        assert_eq!(loader.items().len(), 20);
        assert_eq!(loader.total_count(), Some(200));
        assert_eq!(loader.status(), LoadStatus::Ready);
        assert!(!loader.state().is_first_load);
        assert_eq!(loader.source().requests(), vec![PageRequest::new(20, 0)]);
    }

    #[tokio::test]
    async fn test_initial_items_shift_skip() {
        let mut loader =
            mounted(InfiniteLoader::new(ScriptedSource::default(), relaxed_guard(), 20).with_initial((0..20).collect()));
        assert!(loader.state().is_first_load);

        loader.attempt_load().await;

        assert_eq!(loader.source().requests(), vec![PageRequest::new(20, 20)]);
        assert_eq!(loader.items().len(), 40);
        assert_eq!(loader.items()[39], 39);
    }

    #[tokio::test]
    async fn test_scrolls_to_completion() {
        let mut loader = mounted(InfiniteLoader::new(ScriptedSource::default(), relaxed_guard(), 20));

        let mut loads = 0;
        loop {
            match loader.attempt_load().await {
                LoadOutcome::Loaded { .. } => loads += 1,
                LoadOutcome::Complete { added } => {
                    loads += 1;
                    assert_eq!(added, 20);
                    break;
                }
                other => panic!("Unexpected outcome: {:?}", other),
            }
        }

        assert_eq!(loads, 10);
        assert_eq!(loader.items().len(), 200);
        assert_eq!(loader.status(), LoadStatus::Complete);
        assert!(matches!(loader.attempt_load().await, LoadOutcome::Skipped(SkipReason::Complete)));
    }

    #[tokio::test]
    async fn test_overlong_page_is_clamped_to_total() {
        let page = Page {
            items: (0..30).collect(),
            total_count: 25,
        };
        let mut loader = mounted(InfiniteLoader::new(ScriptedSource::with(vec![Ok(page)]), relaxed_guard(), 30));

        let outcome = loader.attempt_load().await;

        assert!(matches!(outcome, LoadOutcome::Complete { added: 25 }));
        assert_eq!(loader.items().len(), 25);
    }

    #[tokio::test]
    async fn test_empty_page_completes() {
        let page = Page {
            items: vec![],
            total_count: 500,
        };
        let mut loader = mounted(InfiniteLoader::new(ScriptedSource::with(vec![Ok(page)]), relaxed_guard(), 20));

        let outcome = loader.attempt_load().await;

        assert!(matches!(outcome, LoadOutcome::Complete { added: 0 }));
        assert!(loader.state().is_complete());
        assert!(!loader.state().is_first_load);
    }

    #[tokio::test]
    async fn test_failure_sets_error_and_blocks_triggers() {
        let source = ScriptedSource::with(vec![Err(FeedError::SimulatedFailure)]);
        let mut loader = mounted(InfiniteLoader::new(source, relaxed_guard(), 20));

        let outcome = loader.attempt_load().await;

        assert!(matches!(outcome, LoadOutcome::Failed(FeedError::SimulatedFailure)));
        assert_eq!(loader.status(), LoadStatus::Error);
        assert!(loader.state().is_first_load);
        assert!(loader.items().is_empty());

        assert!(matches!(loader.attempt_load().await, LoadOutcome::Skipped(SkipReason::Error)));
        assert_eq!(loader.source().requests().len(), 1);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_error() {
        let source = ScriptedSource::with(vec![Err(FeedError::SimulatedFailure)]);
        let mut loader = mounted(InfiniteLoader::new(source, relaxed_guard(), 20));
        loader.attempt_load().await;

        let outcome = loader.retry().await;

        assert!(matches!(outcome, LoadOutcome::Loaded { added: 20 }));
        assert_eq!(loader.status(), LoadStatus::Ready);
        assert_eq!(loader.source().requests(), vec![PageRequest::new(20, 0), PageRequest::new(20, 0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_triggers_cools_off() {
        let mut loader = mounted(InfiniteLoader::with_defaults(ScriptedSource::default()));

        for _ in 0..5 {
            assert!(matches!(loader.attempt_load().await, LoadOutcome::Loaded { .. }));
        }
        assert!(loader.guard().is_cooling_off());
        assert!(matches!(loader.attempt_load().await, LoadOutcome::Skipped(SkipReason::CoolingOff)));
        assert_eq!(loader.source().requests().len(), 5);

        tokio::time::sleep(Duration::from_millis(3100)).await;

        assert!(matches!(loader.attempt_load().await, LoadOutcome::Loaded { .. }));
        assert_eq!(loader.items().len(), 120);
    }

    #[tokio::test]
    async fn test_reset_clears_items() {
        let mut loader = mounted(InfiniteLoader::new(ScriptedSource::default(), relaxed_guard(), 20));
        loader.attempt_load().await;
        loader.reset();

        assert!(loader.items().is_empty());
        assert_eq!(loader.total_count(), None);
        assert!(loader.state().is_first_load);
        assert_eq!(loader.status(), LoadStatus::Ready);
    }

    #[tokio::test]
    async fn test_mount_and_unmount() {
        let mut loader = InfiniteLoader::new(ScriptedSource::default(), relaxed_guard(), 20);
        assert!(!loader.state().mounted);

        loader.mount();
        assert!(loader.state().mounted);

        loader.attempt_load().await;
        loader.unmount();
        assert!(!loader.state().mounted);
        assert_eq!(loader.guard().snapshot().pending_timers, 0);
    }

    #[tokio::test]
    async fn test_unmounted_loader_ignores_triggers() {
        let mut loader = InfiniteLoader::new(ScriptedSource::default(), relaxed_guard(), 20);

        assert!(matches!(loader.attempt_load().await, LoadOutcome::Skipped(SkipReason::Unmounted)));
        assert!(loader.source().requests().is_empty());
        assert_eq!(loader.guard().count(), 0);

        loader.mount();
        assert!(matches!(loader.attempt_load().await, LoadOutcome::Loaded { added: 20 }));

        loader.unmount();
        assert!(matches!(loader.attempt_load().await, LoadOutcome::Skipped(SkipReason::Unmounted)));
        assert_eq!(loader.source().requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remount_during_cooldown_loads_again() {
        let mut loader = mounted(InfiniteLoader::with_defaults(ScriptedSource::default()));
        for _ in 0..5 {
            loader.attempt_load().await;
        }
        assert!(loader.guard().is_cooling_off());

        loader.unmount();
        loader.mount();
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert!(!loader.guard().is_cooling_off());
        assert!(matches!(loader.attempt_load().await, LoadOutcome::Loaded { .. }));
        assert_eq!(loader.items().len(), 120);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_load_returns_to_ready() {
        let api = MockApi::new(MockApiConfig::instant().with_delay(Duration::from_millis(1000)));
        let mut loader = mounted(InfiniteLoader::new(api, relaxed_guard(), 20));

        let timed_out = tokio::time::timeout(Duration::from_millis(10), loader.attempt_load()).await;
        assert!(timed_out.is_err());
        assert_eq!(loader.status(), LoadStatus::Ready);
        assert!(loader.items().is_empty());
        assert!(loader.state().is_first_load);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(matches!(loader.attempt_load().await, LoadOutcome::Loaded { added: 20 }));
        assert_eq!(loader.items(), (0..20).collect::<Vec<u64>>().as_slice());
    }
}
