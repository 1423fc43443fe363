// =============================================================================
// PLAYBACK CONTROLLER - SINGLE SOURCE OF TRUTH FOR THE VIDEO FEED
// =============================================================================
//
// Owns the list of feed items, decides which single item is active, and keeps
// the per-item transport state. It never performs I/O itself: fetches and
// media transport leave as commands (drain_commands) and their outcomes come
// back through on_fetch_completed / handle_media_event.
//
// RULES:
// - At most one item is active, and only the active item may be playing
// - Every fetch carries a request id; only the newest one of its kind applies
// - Every media event carries an ItemKey; events for items that moved or
//   vanished are dropped
//
// =============================================================================

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use serde::Serialize;

use crate::core::{DataFetchError, FeedConfig, FeedItem, FeedPage, MediaLoadError, PageCursor};
use crate::feed::playback::{
    ItemKey, ItemPhase, ItemPlaybackState, MediaAction, MediaCommand, MediaEvent,
};
use crate::feed::visibility::{ScrollMetrics, ViewableItem, VisibilityPolicy};

// =============================================================================
// COMMANDS, RESULTS AND NOTICES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FetchKind {
    Initial,
    Refresh,
    More,
}

impl FetchKind {
    fn replaces_list(self) -> bool {
        matches!(self, FetchKind::Initial | FetchKind::Refresh)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub id: u64,
    pub kind: FetchKind,
    pub cursor: Option<PageCursor>,
}

#[derive(Debug, Clone)]
pub struct FetchResult {
    pub request: FetchRequest,
    pub result: Result<FeedPage, DataFetchError>,
}

/// Work the controller wants done on its behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerCommand {
    Fetch(FetchRequest),
    Media(MediaCommand),
}

/// One-shot messages for the presentation layer (toast, inline banner).
#[derive(Debug, Clone, PartialEq)]
pub enum FeedNotice {
    FetchFailed { kind: FetchKind, error: DataFetchError },
    MediaFailed(MediaLoadError),
}

/// Events the feed view forwards to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedIntent {
    VisibilityChanged(Vec<ViewableItem>),
    Scrolled(ScrollMetrics),
    EndReached,
    RefreshRequested,
    PlayPauseTapped(usize),
    MuteTapped(usize),
    OrderRequested(usize),
}

/// Everything the feed view needs for one render.
#[derive(Debug, Clone, Serialize)]
pub struct FeedSnapshot {
    pub items: Vec<FeedItem>,
    pub active_index: Option<usize>,
    pub playback: BTreeMap<String, ItemPlaybackState>,
    pub is_initial_loading: bool,
    pub is_refreshing: bool,
    pub is_loading_more: bool,
    pub has_more_data: bool,
}

// =============================================================================
// CONTROLLER
// =============================================================================

#[derive(Debug)]
pub struct PlaybackController {
    items: Vec<FeedItem>,
    active_index: Option<usize>,
    playback: HashMap<String, ItemPlaybackState>,

    // Pagination
    has_more_data: bool,
    next_cursor: Option<PageCursor>,
    page_size_threshold: usize,

    // Loading flags
    is_initial_loading: bool,
    is_refreshing: bool,
    is_loading_more: bool,

    // Request tracking (last write wins)
    next_request_id: u64,
    pending_reload: Option<u64>,
    pending_more: Option<u64>,

    policy: VisibilityPolicy,
    commands: Vec<ControllerCommand>,
    notices: Vec<FeedNotice>,
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new(&FeedConfig::default())
    }
}

impl PlaybackController {
    pub fn new(config: &FeedConfig) -> Self {
        Self {
            items: Vec::new(),
            active_index: None,
            playback: HashMap::new(),
            has_more_data: true,
            next_cursor: None,
            page_size_threshold: config.page_size.max(1),
            is_initial_loading: false,
            is_refreshing: false,
            is_loading_more: false,
            next_request_id: 0,
            pending_reload: None,
            pending_more: None,
            policy: VisibilityPolicy::from_config(config),
            commands: Vec::new(),
            notices: Vec::new(),
        }
    }

    // =============================================================================
    // LOADING
    // =============================================================================

    /// Requests the first page. Nothing plays until the next visibility report.
    pub fn load_initial(&mut self) {
        // On a populated list this behaves as a refresh
        self.is_initial_loading = self.items.is_empty();
        self.is_refreshing = !self.is_initial_loading;
        self.request_reload(FetchKind::Initial);
    }

    /// Requests the first page again, keeping the current list visible meanwhile.
    pub fn refresh(&mut self) {
        self.is_refreshing = true;
        self.request_reload(FetchKind::Refresh);
    }

    /// Requests the next page if pagination allows it.
    pub fn load_more(&mut self) {
        if self.pending_reload.is_some() {
            log::debug!("Load more ignored: the list is being reloaded");
            return;
        }
        if self.is_loading_more {
            log::debug!("Load more ignored: a page is already in flight");
            return;
        }
        if !self.has_more_data {
            log::debug!("Load more ignored: source reported no more data");
            return;
        }
        let Some(cursor) = self.next_cursor else {
            log::debug!("Load more ignored: no cursor for the next page");
            return;
        };

        let id = self.next_request_id();
        self.is_loading_more = true;
        self.pending_more = Some(id);
        log::info!("Loading more meals from offset {}", cursor.offset());
        self.commands.push(ControllerCommand::Fetch(FetchRequest {
            id,
            kind: FetchKind::More,
            cursor: Some(cursor),
        }));
    }

    fn request_reload(&mut self, kind: FetchKind) {
        let id = self.next_request_id();
        self.pending_reload = Some(id);

        // A replaced list makes any in-flight page meaningless
        if self.pending_more.take().is_some() {
            log::debug!("Abandoning in-flight load more for {:?}", kind);
        }
        self.is_loading_more = false;

        log::info!("Loading meals ({:?}, request {})", kind, id);
        self.commands.push(ControllerCommand::Fetch(FetchRequest { id, kind, cursor: None }));
    }

    fn next_request_id(&mut self) -> u64 {
        self.next_request_id += 1;
        self.next_request_id
    }

    /// Applies a finished fetch, ignoring anything superseded since it was issued.
    pub fn on_fetch_completed(&mut self, completed: FetchResult) {
        let FetchResult { request, result } = completed;

        if request.kind.replaces_list() {
            if self.pending_reload != Some(request.id) {
                log::debug!("Discarding stale {:?} result (request {})", request.kind, request.id);
                return;
            }
            self.pending_reload = None;
            self.is_initial_loading = false;
            self.is_refreshing = false;

            match result {
                Ok(page) => self.replace_items(page),
                Err(error) => self.report_fetch_failure(request.kind, error),
            }
        } else {
            if self.pending_more != Some(request.id) {
                log::debug!("Discarding stale page (request {})", request.id);
                return;
            }
            self.pending_more = None;
            self.is_loading_more = false;

            match result {
                Ok(page) => self.append_items(page),
                Err(error) => self.report_fetch_failure(request.kind, error),
            }
        }
    }

    fn report_fetch_failure(&mut self, kind: FetchKind, error: DataFetchError) {
        log::error!("Error loading meals ({:?}): {}", kind, error);
        self.notices.push(FeedNotice::FetchFailed { kind, error });
    }

    fn update_pagination(&mut self, row_count: usize, next_cursor: Option<PageCursor>) {
        self.next_cursor = next_cursor;
        self.has_more_data = row_count >= self.page_size_threshold && next_cursor.is_some();
    }

    fn replace_items(&mut self, page: FeedPage) {
        let FeedPage { items, next_cursor, row_count } = page;

        if let Some(index) = self.active_index {
            let previous = &self.items[index];
            let preserved = items.get(index).map(|item| item.id == previous.id).unwrap_or(false);

            if !preserved {
                log::debug!("Active meal {} did not survive the reload", previous.id);
                self.pause_item(index);
                self.active_index = None;
            }
        }

        let ids: HashSet<&str> = items.iter().map(|item| item.id.as_str()).collect();
        self.playback.retain(|id, _| ids.contains(id.as_str()));

        log::info!("Loaded {} meals", items.len());
        self.items = items;
        self.update_pagination(row_count, next_cursor);
    }

    fn append_items(&mut self, page: FeedPage) {
        let FeedPage { items, next_cursor, row_count } = page;

        let mut known: HashSet<String> = self.items.iter().map(|item| item.id.clone()).collect();
        let before = self.items.len();
        for item in items {
            if known.insert(item.id.clone()) {
                self.items.push(item);
            } else {
                log::debug!("Skipping duplicate meal {}", item.id);
            }
        }

        log::info!("Appended {} meals ({} total)", self.items.len() - before, self.items.len());
        self.update_pagination(row_count, next_cursor);
    }

    // =============================================================================
    // VISIBILITY
    // =============================================================================

    /// Re-evaluates the active item from the items currently on screen.
    pub fn on_visibility_changed(&mut self, visible: &[ViewableItem]) {
        for item in visible {
            if let Some(meal) = self.items.get(item.index) {
                self.playback.entry(meal.id.clone()).or_default();
            }
        }

        let next = self.policy.select_active(visible, self.items.len());
        self.set_active(next);
    }

    /// Convenience for views that already applied the visibility threshold.
    pub fn on_visible_indices(&mut self, indices: &[usize]) {
        let visible: Vec<ViewableItem> = indices.iter().map(|&i| ViewableItem::fully(i)).collect();
        self.on_visibility_changed(&visible);
    }

    /// Loads more once the scroll position nears the end of the list.
    pub fn on_scrolled(&mut self, scroll: ScrollMetrics) {
        if self.policy.should_load_more(scroll, self.items.len()) {
            self.load_more();
        }
    }

    fn set_active(&mut self, next: Option<usize>) {
        if next == self.active_index {
            return;
        }

        if let Some(previous) = self.active_index {
            self.pause_item(previous);
        }
        self.active_index = next;
        if let Some(index) = next {
            log::debug!("Active meal is now #{} ({})", index, self.items[index].id);
            self.play_item(index);
        }
    }

    fn pause_item(&mut self, index: usize) {
        let Some(item) = self.items.get(index) else { return };
        let has_video = item.has_video();
        let key = ItemKey::new(index, item.id.clone());

        if let Some(state) = self.playback.get_mut(&key.id) {
            state.is_playing = false;
        }
        if has_video {
            self.push_media(key, MediaAction::Pause);
        }
    }

    fn play_item(&mut self, index: usize) {
        let Some(item) = self.items.get(index) else { return };
        if !item.has_video() {
            log::debug!("Meal {} has no video, nothing to play", item.id);
            return;
        }
        let key = ItemKey::new(index, item.id.clone());

        let state = self.playback.entry(key.id.clone()).or_default();
        if state.has_error() {
            log::debug!("Not playing meal {}: media previously failed", key.id);
            return;
        }
        state.is_playing = true;
        let muted = state.is_muted;
        self.push_media(key, MediaAction::Play { muted });
    }

    // =============================================================================
    // MEDIA EVENTS
    // =============================================================================

    pub fn handle_media_event(&mut self, key: &ItemKey, event: MediaEvent) {
        match event {
            MediaEvent::LoadStart => self.on_item_load_start(key),
            MediaEvent::Loaded { duration } => self.on_item_loaded(key, duration),
            MediaEvent::Error { reason } => self.on_item_error(key, reason),
            MediaEvent::Progress { ratio, duration_known } => {
                self.on_item_progress(key, ratio, duration_known)
            }
            MediaEvent::Finished => self.on_item_finished(key),
        }
    }

    /// Index of the item the key still refers to, if it does.
    fn resolve(&self, key: &ItemKey) -> Option<usize> {
        match self.items.get(key.index) {
            Some(item) if item.id == key.id => Some(key.index),
            _ => {
                log::debug!("Dropping media event for untracked item #{} ({})", key.index, key.id);
                None
            }
        }
    }

    pub fn on_item_load_start(&mut self, key: &ItemKey) {
        let Some(index) = self.resolve(key) else { return };
        let state = self.playback.entry(key.id.clone()).or_default();
        let retrying = state.has_error();
        state.phase = ItemPhase::Loading;
        state.error = None;

        if retrying && self.active_index == Some(index) {
            log::info!("Retrying media for active meal {}", key.id);
            self.play_item(index);
        }
    }

    pub fn on_item_loaded(&mut self, key: &ItemKey, duration: Option<Duration>) {
        let Some(index) = self.resolve(key) else { return };
        let is_active = self.active_index == Some(index);
        let state = self.playback.entry(key.id.clone()).or_default();
        state.phase = ItemPhase::Ready;
        state.error = None;
        state.duration = duration;
        if !is_active {
            state.is_playing = false;
        }
    }

    pub fn on_item_error(&mut self, key: &ItemKey, reason: String) {
        if self.resolve(key).is_none() {
            return;
        }
        log::error!("Video error for meal {}: {}", key.id, reason);
        let state = self.playback.entry(key.id.clone()).or_default();
        state.phase = ItemPhase::Errored;
        state.is_playing = false;
        state.error = Some(reason.clone());

        self.notices.push(FeedNotice::MediaFailed(MediaLoadError {
            item_id: key.id.clone(),
            reason,
        }));
    }

    pub fn on_item_progress(&mut self, key: &ItemKey, ratio: f32, duration_known: bool) {
        if self.resolve(key).is_none() || !duration_known || !ratio.is_finite() {
            return;
        }
        let state = self.playback.entry(key.id.clone()).or_default();
        state.position_ratio = ratio.clamp(0.0, 1.0);
    }

    /// Loops the active item; completions from anything else are stale.
    pub fn on_item_finished(&mut self, key: &ItemKey) {
        let Some(index) = self.resolve(key) else { return };
        let is_active = self.active_index == Some(index);
        let state = self.playback.entry(key.id.clone()).or_default();

        if !is_active {
            log::debug!("Ignoring completion of inactive meal {}", key.id);
            state.is_playing = false;
            return;
        }

        state.position_ratio = 0.0;
        if state.is_playing {
            self.push_media(key.clone(), MediaAction::ReplayFromStart);
        }
    }

    // =============================================================================
    // USER OVERRIDES
    // =============================================================================

    /// Returns false when the tap was rejected.
    pub fn toggle_play_pause(&mut self, index: usize) -> bool {
        if self.active_index != Some(index) {
            log::warn!("Play/pause tap on inactive item #{} rejected", index);
            return false;
        }
        let Some(item) = self.items.get(index) else { return false };
        if !item.has_video() {
            return false;
        }
        let key = ItemKey::new(index, item.id.clone());

        let state = self.playback.entry(key.id.clone()).or_default();
        if state.has_error() {
            log::warn!("Play/pause tap on failed meal {} rejected", key.id);
            return false;
        }
        state.is_playing = !state.is_playing;
        let action = if state.is_playing {
            MediaAction::Play { muted: state.is_muted }
        } else {
            MediaAction::Pause
        };
        self.push_media(key, action);
        true
    }

    /// Mute is remembered per item and carried into later `Play` commands.
    /// Only the active item accepts the tap.
    pub fn toggle_mute(&mut self, index: usize) -> bool {
        if self.active_index != Some(index) {
            log::warn!("Mute tap on inactive item #{} rejected", index);
            return false;
        }
        let Some(item) = self.items.get(index) else { return false };
        if !item.has_video() {
            return false;
        }
        let key = ItemKey::new(index, item.id.clone());

        let state = self.playback.entry(key.id.clone()).or_default();
        state.is_muted = !state.is_muted;
        let muted = state.is_muted;
        self.push_media(key, MediaAction::SetMuted(muted));
        true
    }

    /// Routes a view event. Order taps hand the meal back to the caller.
    pub fn dispatch(&mut self, intent: FeedIntent) -> Option<FeedItem> {
        match intent {
            FeedIntent::VisibilityChanged(visible) => self.on_visibility_changed(&visible),
            FeedIntent::Scrolled(scroll) => self.on_scrolled(scroll),
            FeedIntent::EndReached => self.load_more(),
            FeedIntent::RefreshRequested => self.refresh(),
            FeedIntent::PlayPauseTapped(index) => {
                self.toggle_play_pause(index);
            }
            FeedIntent::MuteTapped(index) => {
                self.toggle_mute(index);
            }
            FeedIntent::OrderRequested(index) => {
                let item = self.items.get(index).cloned();
                if item.is_none() {
                    log::warn!("Order tap on unknown item #{}", index);
                }
                return item;
            }
        }
        None
    }

    fn push_media(&mut self, target: ItemKey, action: MediaAction) {
        self.commands.push(ControllerCommand::Media(MediaCommand::new(target, action)));
    }

    // =============================================================================
    // STATE QUERIES
    // =============================================================================

    pub fn drain_commands(&mut self) -> Vec<ControllerCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn drain_notices(&mut self) -> Vec<FeedNotice> {
        std::mem::take(&mut self.notices)
    }

    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active_index
    }

    pub fn key_for(&self, index: usize) -> Option<ItemKey> {
        self.items.get(index).map(|item| ItemKey::new(index, item.id.clone()))
    }

    /// State of the item at `index`; untouched items report the default.
    pub fn item_state(&self, index: usize) -> ItemPlaybackState {
        self.items
            .get(index)
            .and_then(|item| self.playback.get(&item.id))
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_tracked(&self, index: usize) -> bool {
        self.items
            .get(index)
            .map(|item| self.playback.contains_key(&item.id))
            .unwrap_or(false)
    }

    pub fn playing_count(&self) -> usize {
        self.playback.values().filter(|state| state.is_playing).count()
    }

    pub fn is_initial_loading(&self) -> bool {
        self.is_initial_loading
    }

    pub fn is_refreshing(&self) -> bool {
        self.is_refreshing
    }

    pub fn is_loading_more(&self) -> bool {
        self.is_loading_more
    }

    pub fn has_more_data(&self) -> bool {
        self.has_more_data
    }

    pub fn has_pending_fetch(&self) -> bool {
        self.pending_reload.is_some() || self.pending_more.is_some()
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            items: self.items.clone(),
            active_index: self.active_index,
            playback: self
                .playback
                .iter()
                .map(|(id, state)| (id.clone(), state.clone()))
                .collect(),
            is_initial_loading: self.is_initial_loading,
            is_refreshing: self.is_refreshing,
            is_loading_more: self.is_loading_more,
            has_more_data: self.has_more_data,
        }
    }
}
