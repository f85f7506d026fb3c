// src/services/list_controller.rs
//
// Resource list controller
//
// One instance per list page. Composes:
//   gateway -> normalizer -> (debounced query x filter/sort) -> paginator
//   dialog  -> mutation coordinator -> gateway -> refetch / local patch
//
// CRITICAL RULES:
// - Every fetch is tagged with a generation; only the newest issued fetch
//   may replace the snapshot, whatever order responses arrive in
// - current_page is clamped whenever the filtered count changes
// - Selection never holds an id the filtered view no longer contains
// - A failed mutation leaves the snapshot untouched
// - After detach nothing is applied: no snapshot, query or selection updates
//
// The state mutex is never held across an await.

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::config::{DashboardConfig, PaginationMode};
use crate::domain::{
    validate_draft, validate_patch, MutationIntent, MutationKind, PageState, QueryState,
    Resource, ResourceCollection, ResourceKind, ResourceProfile, SortDirection,
};
use crate::error::{AppError, AppResult};
use crate::events::{
    CollectionRefreshed, EventBus, ListFetchFailed, PageClamped, SelectionPruned,
    StaleResponseDiscarded,
};
use crate::integrations::{extract_total, normalize, unwrap_record, Notifier};
use crate::repositories::{ListParams, ResourceGateway};

use super::debounce::DebouncedQuery;
use super::filter_sort::FilterSortSet;
use super::mutation_coordinator::MutationCoordinator;
use super::paginator::{PageSlice, Paginator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    pub page_size: usize,
    pub settle_interval: Duration,
    pub pagination_mode: PaginationMode,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self::from(&DashboardConfig::default())
    }
}

impl From<&DashboardConfig> for ControllerOptions {
    fn from(config: &DashboardConfig) -> Self {
        Self {
            page_size: config.page_size,
            settle_interval: config.settle_interval(),
            pagination_mode: config.pagination_mode,
        }
    }
}

/// What happened to one refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { generation: u64, item_count: usize },
    /// A newer fetch was issued (or a local change landed) before this one resolved
    Discarded { generation: u64, current: u64 },
}

/// Render-ready snapshot of a list page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView {
    pub kind: ResourceKind,
    pub items: Vec<Resource>,
    pub current_page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub display_range: (usize, usize),
    pub query: QueryState,
    pub selected: Vec<String>,
    pub loading: bool,
    pub error: Option<String>,
}

// ============================================================================
// INTERNAL STATE
// ============================================================================

#[derive(Default)]
struct ViewChanges {
    clamped: Option<(usize, usize)>,
    pruned: Vec<String>,
}

struct ViewState {
    collection: ResourceCollection,
    query: QueryState,
    page: PageState,
    /// Filtered and sorted records
    view: Vec<Resource>,
    /// Total reported by the server (server pagination only)
    server_total: Option<usize>,
    selection: BTreeSet<String>,
    loading: bool,
    load_error: Option<String>,
}

impl ViewState {
    fn filtered_total(&self, mode: PaginationMode) -> usize {
        match mode {
            PaginationMode::Client => self.view.len(),
            PaginationMode::Server => self.server_total.unwrap_or(self.view.len()),
        }
    }

    fn recompute(&mut self, profile: &ResourceProfile, mode: PaginationMode) -> ViewChanges {
        self.view = FilterSortSet::new(profile).apply(self.collection.as_slice(), &self.query);

        let before = self.page.current_page();
        let total_pages = self.page.total_pages_for(self.filtered_total(mode));
        let clamped = self
            .page
            .clamp_to(total_pages)
            .then(|| (before, self.page.current_page()));

        let visible: HashSet<&str> = self.view.iter().filter_map(Resource::id).collect();
        let pruned: Vec<String> = self
            .selection
            .iter()
            .filter(|id| !visible.contains(id.as_str()))
            .cloned()
            .collect();
        for id in &pruned {
            self.selection.remove(id);
        }

        ViewChanges { clamped, pruned }
    }

    fn slice(&self, mode: PaginationMode) -> PageSlice {
        match mode {
            PaginationMode::Client => Paginator::paginate(&self.view, &self.page),
            PaginationMode::Server => Paginator::server_page(
                self.view.clone(),
                self.filtered_total(mode),
                &self.page,
            ),
        }
    }
}

struct ControllerInner {
    profile: ResourceProfile,
    mode: PaginationMode,
    gateway: Arc<dyn ResourceGateway>,
    coordinator: MutationCoordinator,
    search: DebouncedQuery,
    event_bus: Arc<EventBus>,
    generation: AtomicU64,
    detached: AtomicBool,
    state: Mutex<ViewState>,
}

impl ControllerInner {
    fn lock_state(&self) -> MutexGuard<'_, ViewState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }

    fn ensure_attached(&self) -> AppResult<()> {
        if self.is_detached() {
            return Err(AppError::Detached);
        }
        Ok(())
    }

    /// Invalidate every fetch issued so far
    fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn publish(&self, changes: ViewChanges) {
        let kind = self.profile.kind;
        if let Some((from, to)) = changes.clamped {
            log::debug!("{}: page clamped {} -> {}", kind, from, to);
            self.event_bus.emit(PageClamped::new(kind, from, to));
        }
        if !changes.pruned.is_empty() {
            self.event_bus.emit(SelectionPruned::new(kind, changes.pruned));
        }
    }

    /// Apply a local state change and recompute the view
    fn update<F>(&self, change: F) -> AppResult<ViewChanges>
    where
        F: FnOnce(&mut ViewState),
    {
        self.ensure_attached()?;
        let changes = {
            let mut state = self.lock_state();
            change(&mut state);
            state.recompute(&self.profile, self.mode)
        };
        Ok(changes)
    }
}

// ============================================================================
// CONTROLLER
// ============================================================================

/// Handle to a list page's controller. Clones share the same state.
#[derive(Clone)]
pub struct ResourceListController {
    inner: Arc<ControllerInner>,
}

impl ResourceListController {
    pub fn new(
        profile: ResourceProfile,
        gateway: Arc<dyn ResourceGateway>,
        notifier: Arc<dyn Notifier>,
        event_bus: Arc<EventBus>,
        options: ControllerOptions,
    ) -> AppResult<Self> {
        let page = PageState::new(options.page_size)?;
        let query = match &profile.default_sort {
            Some((key, direction)) => QueryState::new().with_sort(key, *direction),
            None => QueryState::new(),
        };

        let state = ViewState {
            collection: ResourceCollection::new(),
            query,
            page,
            view: Vec::new(),
            server_total: None,
            selection: BTreeSet::new(),
            loading: false,
            load_error: None,
        };

        let inner = ControllerInner {
            coordinator: MutationCoordinator::new(profile.kind, notifier, Arc::clone(&event_bus)),
            search: DebouncedQuery::new(options.settle_interval),
            profile,
            mode: options.pagination_mode,
            gateway,
            event_bus,
            generation: AtomicU64::new(0),
            detached: AtomicBool::new(false),
            state: Mutex::new(state),
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    pub fn profile(&self) -> &ResourceProfile {
        &self.inner.profile
    }

    pub fn kind(&self) -> ResourceKind {
        self.inner.profile.kind
    }

    pub fn pagination_mode(&self) -> PaginationMode {
        self.inner.mode
    }

    pub fn is_detached(&self) -> bool {
        self.inner.is_detached()
    }

    /// Generation of the most recently issued fetch
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    // ------------------------------------------------------------------------
    // Fetching
    // ------------------------------------------------------------------------

    /// Fetch the list and, if no newer fetch was issued meanwhile, make it the
    /// current snapshot.
    ///
    /// A failed fetch sets the banner error and keeps the previous snapshot.
    pub async fn refresh(&self) -> AppResult<RefreshOutcome> {
        let outcome = self.fetch_once().await?;

        // A shrunken server total can push the page past the end; the clamped
        // page has to be fetched again since nothing was sliced locally.
        if let (RefreshOutcome::Applied { .. }, Some(_)) = (outcome, self.server_page_moved()) {
            return self.fetch_once().await;
        }
        Ok(outcome)
    }

    /// Re-run the list fetch after a banner error
    pub async fn retry(&self) -> AppResult<RefreshOutcome> {
        self.refresh().await
    }

    async fn fetch_once(&self) -> AppResult<RefreshOutcome> {
        let inner = &self.inner;
        inner.ensure_attached()?;

        let generation = inner.bump_generation();
        let params = {
            let mut state = inner.lock_state();
            state.loading = true;
            match inner.mode {
                PaginationMode::Client => ListParams::unpaged(),
                PaginationMode::Server => ListParams::for_page(
                    state.page.current_page(),
                    state.page.page_size(),
                    &state.query,
                ),
            }
        };

        log::debug!("{}: fetch #{} issued", inner.profile.kind, generation);
        let result = inner.gateway.list(&inner.profile, &params).await;

        let mut state = inner.lock_state();
        let current = inner.generation.load(Ordering::SeqCst);
        if inner.is_detached() || current != generation {
            drop(state);
            log::debug!(
                "{}: discarding fetch #{} (current #{})",
                inner.profile.kind,
                generation,
                current
            );
            if !inner.is_detached() {
                inner.event_bus.emit(StaleResponseDiscarded::new(
                    inner.profile.kind,
                    generation,
                    current,
                ));
            }
            return Ok(RefreshOutcome::Discarded {
                generation,
                current,
            });
        }

        state.loading = false;
        match result {
            Ok(payload) => {
                let total = extract_total(&payload);
                let collection =
                    ResourceCollection::from_items(normalize(payload, &inner.profile.items_key));
                let item_count = collection.len();

                state.collection = collection;
                state.server_total = match inner.mode {
                    PaginationMode::Client => None,
                    PaginationMode::Server => Some(total.unwrap_or(item_count)),
                };
                state.load_error = None;
                let changes = state.recompute(&inner.profile, inner.mode);
                drop(state);

                inner.publish(changes);
                inner.event_bus.emit(CollectionRefreshed::new(
                    inner.profile.kind,
                    generation,
                    item_count,
                ));
                Ok(RefreshOutcome::Applied {
                    generation,
                    item_count,
                })
            }
            Err(error) => {
                let message = error.user_message();
                state.load_error = Some(message.clone());
                drop(state);

                log::warn!("{}: list fetch failed: {}", inner.profile.kind, error);
                inner
                    .event_bus
                    .emit(ListFetchFailed::new(inner.profile.kind, generation, message));
                Err(error)
            }
        }
    }

    /// Whether the last applied server page was clamped (server mode only)
    fn server_page_moved(&self) -> Option<usize> {
        if self.inner.mode != PaginationMode::Server {
            return None;
        }
        let state = self.inner.lock_state();
        let requested_past_end = state.view.is_empty()
            && state.server_total.unwrap_or(0) > 0
            && state.page.current_page() > 1;
        requested_past_end.then(|| state.page.current_page())
    }

    /// Load one record for an edit dialog
    pub async fn fetch_one(&self, id: &str) -> AppResult<Resource> {
        self.inner.ensure_attached()?;
        let payload = self.inner.gateway.get_by_id(&self.inner.profile, id).await?;
        unwrap_record(payload)
            .and_then(Resource::from_value)
            .ok_or(AppError::NotFound)
    }

    /// Follow a query change: recompute locally, or refetch in server mode
    async fn after_query_change(&self, changes: ViewChanges) -> AppResult<()> {
        self.inner.publish(changes);
        if self.inner.mode == PaginationMode::Server {
            self.refresh().await?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Query
    // ------------------------------------------------------------------------

    /// Update the search box. Filtering follows once the text settles.
    pub fn set_search_text(&self, text: impl Into<String>) {
        if self.is_detached() {
            return;
        }
        let text = text.into();
        self.inner.lock_state().query.raw_text = text.clone();

        let weak: Weak<ControllerInner> = Arc::downgrade(&self.inner);
        self.inner.search.set_raw_text(text, move |settled| {
            if let Some(inner) = weak.upgrade() {
                ResourceListController { inner }.apply_settled_text(settled);
            }
        });
    }

    /// Apply search text without waiting for it to settle (e.g. a search button)
    pub async fn search_now(&self, text: impl Into<String>) -> AppResult<()> {
        let text = text.into();
        self.inner.ensure_attached()?;
        self.inner.search.settle_now(text.clone());
        let changes = self.inner.update(|state| {
            state.query.raw_text = text.clone();
            state.query.debounced_text = text;
            state.page.reset();
        })?;
        self.after_query_change(changes).await
    }

    fn apply_settled_text(&self, settled: String) {
        let changes = match self.inner.update(|state| {
            if state.query.debounced_text != settled {
                state.query.debounced_text = settled;
                state.page.reset();
            }
        }) {
            Ok(changes) => changes,
            Err(_) => return,
        };
        self.inner.publish(changes);

        if self.inner.mode == PaginationMode::Server {
            let controller = self.clone();
            tokio::spawn(async move {
                if let Err(e) = controller.refresh().await {
                    log::debug!("{}: search refetch failed: {}", controller.kind(), e);
                }
            });
        }
    }

    pub async fn set_facet(&self, name: &str, value: &str) -> AppResult<()> {
        let changes = self.inner.update(|state| {
            state.query.set_facet(name, value);
            state.page.reset();
        })?;
        self.after_query_change(changes).await
    }

    pub async fn set_sort(&self, key: &str, direction: SortDirection) -> AppResult<()> {
        let changes = self.inner.update(|state| {
            state.query.sort_key = Some(key.to_string());
            state.query.sort_direction = direction;
        })?;
        self.after_query_change(changes).await
    }

    /// Same key flips the direction; a new key starts ascending
    pub async fn toggle_sort(&self, key: &str) -> AppResult<()> {
        let direction = {
            let state = self.inner.lock_state();
            match &state.query.sort_key {
                Some(current) if current == key => state.query.sort_direction.toggled(),
                _ => SortDirection::Asc,
            }
        };
        self.set_sort(key, direction).await
    }

    pub async fn clear_filters(&self) -> AppResult<()> {
        self.inner.ensure_attached()?;
        self.inner.search.settle_now(String::new());
        let changes = self.inner.update(|state| {
            state.query.clear_filters();
            state.page.reset();
        })?;
        self.after_query_change(changes).await
    }

    /// Go to `page`, clamped to the available pages
    pub async fn set_page(&self, page: usize) -> AppResult<()> {
        let changes = self.inner.update(|state| state.page.go_to(page))?;
        self.after_query_change(changes).await
    }

    pub async fn set_page_size(&self, page_size: usize) -> AppResult<()> {
        self.inner.ensure_attached()?;
        let changes = {
            let mut state = self.inner.lock_state();
            state.page.set_page_size(page_size)?;
            state.recompute(&self.inner.profile, self.inner.mode)
        };
        self.after_query_change(changes).await
    }

    // ------------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------------

    /// Toggle a row. Ids outside the filtered view cannot be selected.
    pub fn toggle_selection(&self, id: &str) -> bool {
        if self.is_detached() {
            return false;
        }
        let mut state = self.inner.lock_state();
        if !state.view.iter().any(|r| r.id() == Some(id)) {
            return false;
        }
        if !state.selection.remove(id) {
            state.selection.insert(id.to_string());
        }
        true
    }

    /// Select every row on the current page
    pub fn select_page(&self) {
        if self.is_detached() {
            return;
        }
        let mut state = self.inner.lock_state();
        let ids: Vec<String> = state
            .slice(self.inner.mode)
            .items
            .iter()
            .filter_map(|r| r.id().map(str::to_string))
            .collect();
        state.selection.extend(ids);
    }

    pub fn clear_selection(&self) {
        if self.is_detached() {
            return;
        }
        self.inner.lock_state().selection.clear();
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.inner.lock_state().selection.iter().cloned().collect()
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    fn check_intent(&self, intent: &mut MutationIntent, expected: &str) -> AppResult<()> {
        self.inner.ensure_attached()?;
        if intent.kind.verb() != expected {
            return Err(AppError::Other(format!(
                "Expected a {} intent, got {}",
                expected,
                intent.kind.verb()
            )));
        }
        Ok(())
    }

    fn reject(intent: &mut MutationIntent, error: AppError) -> AppError {
        intent.fail(error.user_message());
        error
    }

    fn single_target(intent: &mut MutationIntent) -> AppResult<String> {
        match intent.target_id() {
            Some(id) => Ok(id.to_string()),
            None => Err(Self::reject(
                intent,
                AppError::Validation("No record selected".to_string()),
            )),
        }
    }

    /// Validate and create; the list is refetched on success.
    pub async fn create(&self, intent: &mut MutationIntent, draft: Value) -> AppResult<Value> {
        self.check_intent(intent, "create")?;
        if let Err(e) = validate_draft(&self.inner.profile, &draft) {
            return Err(Self::reject(intent, AppError::Validation(e.to_string())));
        }

        let inner = &self.inner;
        let created = inner
            .coordinator
            .perform(intent, inner.gateway.create(&inner.profile, &draft))
            .await?;
        self.refresh_after_mutation().await;
        Ok(created)
    }

    /// Validate and update; the list is refetched on success.
    pub async fn update(&self, intent: &mut MutationIntent, patch: Value) -> AppResult<Value> {
        self.check_intent(intent, "update")?;
        let id = Self::single_target(intent)?;
        if let Err(e) = validate_patch(&self.inner.profile, &patch) {
            return Err(Self::reject(intent, AppError::Validation(e.to_string())));
        }

        let inner = &self.inner;
        let updated = inner
            .coordinator
            .perform(intent, inner.gateway.update(&inner.profile, &id, &patch))
            .await?;
        self.refresh_after_mutation().await;
        Ok(updated)
    }

    /// Delete; the record is removed locally on success, without a refetch.
    pub async fn delete(&self, intent: &mut MutationIntent) -> AppResult<()> {
        self.check_intent(intent, "delete")?;
        let id = Self::single_target(intent)?;

        let inner = &self.inner;
        inner
            .coordinator
            .perform(intent, inner.gateway.delete(&inner.profile, &id))
            .await?;

        if inner.is_detached() {
            return Ok(());
        }
        // An in-flight fetch issued before the delete could bring the record back.
        inner.bump_generation();
        let (changes, short) = {
            let mut state = inner.lock_state();
            state.loading = false;
            if state.collection.remove(&id) {
                if let Some(total) = state.server_total.as_mut() {
                    *total = total.saturating_sub(1);
                }
            }
            let changes = state.recompute(&inner.profile, inner.mode);
            let shown = state.page.offset() + state.view.len();
            let short = state.view.len() < state.page.page_size()
                && state.server_total.unwrap_or(0) > shown;
            (changes, short)
        };
        let page_moved = changes.clamped.is_some();
        inner.publish(changes);

        // The server owns the page contents; refill a page that moved or lost a row.
        if inner.mode == PaginationMode::Server && (page_moved || short) {
            self.refresh_after_mutation().await;
        }
        Ok(())
    }

    /// Intent assigning the current selection to `target`
    pub fn bulk_assign_intent(&self, target: &str) -> AppResult<MutationIntent> {
        let ids = self.selected_ids();
        if ids.is_empty() {
            return Err(AppError::Validation("Select at least one row".to_string()));
        }
        if target.trim().is_empty() {
            return Err(AppError::Validation("Choose where to assign".to_string()));
        }
        Ok(MutationIntent::bulk_assign(ids, target.trim()))
    }

    /// Assign the intent's records; selection is cleared and the list refetched on success.
    pub async fn bulk_assign(&self, intent: &mut MutationIntent) -> AppResult<Value> {
        self.check_intent(intent, "bulk-assign")?;
        let MutationKind::BulkAssign { target } = intent.kind.clone() else {
            return Err(AppError::Other("Expected a bulk-assign intent".to_string()));
        };
        if intent.target_ids.is_empty() {
            return Err(Self::reject(
                intent,
                AppError::Validation("Select at least one row".to_string()),
            ));
        }

        let inner = &self.inner;
        let ids = intent.target_ids.clone();
        let result = inner
            .coordinator
            .perform(intent, inner.gateway.bulk_assign(&inner.profile, &ids, &target))
            .await?;

        if !inner.is_detached() {
            inner.lock_state().selection.clear();
        }
        self.refresh_after_mutation().await;
        Ok(result)
    }

    /// Whether a mutation on `id` is in flight
    pub fn is_mutation_pending(&self, id: &str) -> bool {
        self.inner.coordinator.is_pending(id)
    }

    async fn refresh_after_mutation(&self) {
        if self.is_detached() {
            return;
        }
        // The mutation itself succeeded; a failed refetch only shows the banner.
        if let Err(e) = self.refresh().await {
            log::warn!("{}: refetch after mutation failed: {}", self.kind(), e);
        }
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    pub fn page_view(&self) -> PageView {
        let state = self.inner.lock_state();
        let slice = state.slice(self.inner.mode);
        PageView {
            kind: self.inner.profile.kind,
            items: slice.items,
            current_page: state.page.current_page(),
            page_size: state.page.page_size(),
            total_pages: slice.total_pages,
            total_items: slice.total_items,
            display_range: slice.display_range,
            query: state.query.clone(),
            selected: state.selection.iter().cloned().collect(),
            loading: state.loading,
            error: state.load_error.clone(),
        }
    }

    /// Every record of the accepted snapshot, unfiltered
    pub fn snapshot(&self) -> ResourceCollection {
        self.inner.lock_state().collection.clone()
    }

    /// Filtered and sorted records across all pages
    pub fn filtered(&self) -> Vec<Resource> {
        self.inner.lock_state().view.clone()
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Unmount: cancel the pending search settle and ignore every in-flight
    /// fetch. Idempotent.
    pub fn detach(&self) {
        if self.inner.detached.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.search.cancel();
        self.inner.bump_generation();
        log::debug!("{}: controller detached", self.kind());
    }
}
