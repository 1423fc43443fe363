#[cfg(test)]
mod tests {

    use crate::core::{DataFetchError, FeedConfig, FeedItem, FeedPage, PageCursor};
    use crate::feed::controller::{
        ControllerCommand, FeedIntent, FeedNotice, FetchKind, FetchRequest, FetchResult,
        PlaybackController,
    };
    use crate::feed::playback::{
        ItemKey, ItemPhase, ItemPlaybackState, MediaAction, MediaCommand, MediaEvent,
    };
    use crate::feed::visibility::{ScrollMetrics, ViewableItem};
    use std::time::Duration;

    fn meal(id: &str) -> FeedItem {
        FeedItem::new(id, format!("Meal {}", id), 9.5)
            .with_video(format!("https://cdn.example/{}.mp4", id))
            .with_restaurant("r1", "Test Kitchen")
    }

    fn meals(ids: &[&str]) -> Vec<FeedItem> {
        ids.iter().map(|id| meal(id)).collect()
    }

    fn fetch_requests(controller: &mut PlaybackController) -> Vec<FetchRequest> {
        controller
            .drain_commands()
            .into_iter()
            .filter_map(|c| match c {
                ControllerCommand::Fetch(request) => Some(request),
                ControllerCommand::Media(_) => None,
            })
            .collect()
    }

    fn media_commands(controller: &mut PlaybackController) -> Vec<MediaCommand> {
        controller
            .drain_commands()
            .into_iter()
            .filter_map(|c| match c {
                ControllerCommand::Media(command) => Some(command),
                ControllerCommand::Fetch(_) => None,
            })
            .collect()
    }

    fn complete(controller: &mut PlaybackController, request: FetchRequest, page: FeedPage) {
        controller.on_fetch_completed(FetchResult { request, result: Ok(page) });
    }

    /// Controller with `ids` loaded through the initial fetch, no cursor.
    fn loaded(ids: &[&str]) -> PlaybackController {
        let mut controller = PlaybackController::default();
        controller.load_initial();
        let request = fetch_requests(&mut controller).remove(0);
        complete(&mut controller, request, FeedPage::new(meals(ids), None));
        controller
    }

    fn key(controller: &PlaybackController, index: usize) -> ItemKey {
        controller.key_for(index).expect("index should be loaded")
    }

    fn cmd(controller: &PlaybackController, index: usize, action: MediaAction) -> MediaCommand {
        MediaCommand::new(key(controller, index), action)
    }

    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    #[test]
    fn test_load_initial_replaces_list_without_playing() {
        let mut controller = PlaybackController::default();
        controller.load_initial();
        assert!(controller.is_initial_loading());

        let requests = fetch_requests(&mut controller);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].kind, FetchKind::Initial);
        assert!(requests[0].cursor.is_none());

        complete(&mut controller, requests[0].clone(), FeedPage::new(meals(&["a", "b"]), None));

        assert!(!controller.is_initial_loading());
        assert_eq!(controller.items().len(), 2);
        assert_eq!(controller.active_index(), None);
        assert!(controller.drain_commands().is_empty());
        assert_eq!(controller.playing_count(), 0);
    }

    #[test]
    fn test_initial_failure_leaves_empty_list_and_reports_once() {
        let mut controller = PlaybackController::default();
        controller.load_initial();
        let request = fetch_requests(&mut controller).remove(0);

        controller.on_fetch_completed(FetchResult {
            request,
            result: Err(DataFetchError::Transport("offline".to_string())),
        });

        assert!(controller.items().is_empty());
        assert!(!controller.is_initial_loading());
        assert!(controller.drain_commands().is_empty(), "no automatic retry");

        let notices = controller.drain_notices();
        assert_eq!(notices.len(), 1);
        assert!(matches!(notices[0], FeedNotice::FetchFailed { kind: FetchKind::Initial, .. }));
        assert!(controller.drain_notices().is_empty());
    }

    #[test]
    fn test_has_more_data_follows_page_size() {
        let ids: Vec<String> = (0..20).map(|i| format!("m{}", i)).collect();
        let full_page: Vec<FeedItem> = ids.iter().map(|id| meal(id)).collect();

        let mut controller = PlaybackController::default();
        controller.load_initial();
        let request = fetch_requests(&mut controller).remove(0);
        complete(&mut controller, request, FeedPage::new(full_page, Some(PageCursor::at(20))));
        assert!(controller.has_more_data());

        let short = loaded(&["a", "b"]);
        assert!(!short.has_more_data());
    }

    #[test]
    fn test_full_page_without_cursor_ends_pagination() {
        let ids: Vec<String> = (0..25).map(|i| format!("m{}", i)).collect();
        let refs: Vec<&str> = ids.iter().map(|s| s.as_str()).collect();
        let mut controller = loaded(&refs);

        assert!(!controller.has_more_data());
        controller.load_more();
        assert!(fetch_requests(&mut controller).is_empty());
        assert!(!controller.is_loading_more());
    }

    // -------------------------------------------------------------------------
    // Scenarios
    // -------------------------------------------------------------------------

    #[test]
    fn test_first_visibility_report_plays_topmost_item() {
        let mut controller = loaded(&["a", "b"]);
        controller.on_visible_indices(&[0]);

        assert_eq!(controller.active_index(), Some(0));
        assert!(controller.item_state(0).is_playing);
        assert!(!controller.is_tracked(1));
        assert_eq!(controller.item_state(1).phase, ItemPhase::Unloaded);
        assert_eq!(
            media_commands(&mut controller),
            vec![cmd(&controller, 0, MediaAction::Play { muted: false })]
        );
    }

    #[test]
    fn test_swipe_pauses_old_and_plays_new() {
        let mut controller = loaded(&["a", "b"]);
        controller.on_visible_indices(&[0]);
        controller.drain_commands();

        controller.on_visible_indices(&[1]);

        assert_eq!(controller.active_index(), Some(1));
        assert!(!controller.item_state(0).is_playing);
        assert!(controller.item_state(1).is_playing);
        assert_eq!(
            media_commands(&mut controller),
            vec![
                cmd(&controller, 0, MediaAction::Pause),
                cmd(&controller, 1, MediaAction::Play { muted: false }),
            ]
        );
    }

    #[test]
    fn test_finished_active_item_loops() {
        let mut controller = loaded(&["a", "b"]);
        controller.on_visible_indices(&[0]);
        controller.drain_commands();

        let k = key(&controller, 0);
        controller.handle_media_event(&k, MediaEvent::Progress { ratio: 1.0, duration_known: true });
        controller.handle_media_event(&k, MediaEvent::Finished);

        assert_eq!(media_commands(&mut controller), vec![MediaCommand::new(k, MediaAction::ReplayFromStart)]);
        assert!(controller.item_state(0).is_playing);
        assert_eq!(controller.item_state(0).position_ratio, 0.0);
    }

    #[test]
    fn test_finished_event_for_inactive_item_is_ignored() {
        let mut controller = loaded(&["a", "b"]);
        controller.on_visible_indices(&[0]);
        controller.on_visible_indices(&[1]);
        controller.drain_commands();

        let stale = key(&controller, 0);
        controller.handle_media_event(&stale, MediaEvent::Finished);

        assert!(controller.drain_commands().is_empty());
        assert!(!controller.item_state(0).is_playing);
        assert!(controller.item_state(1).is_playing);
    }

    #[test]
    fn test_load_more_while_loading_is_noop() {
        let ids: Vec<String> = (0..20).map(|i| format!("m{}", i)).collect();
        let page: Vec<FeedItem> = ids.iter().map(|id| meal(id)).collect();

        let mut controller = PlaybackController::default();
        controller.load_initial();
        let request = fetch_requests(&mut controller).remove(0);
        complete(&mut controller, request, FeedPage::new(page, Some(PageCursor::at(20))));

        controller.load_more();
        assert_eq!(fetch_requests(&mut controller).len(), 1);
        assert!(controller.is_loading_more());

        let before = controller.snapshot();
        controller.load_more();
        controller.dispatch(FeedIntent::EndReached);

        assert!(controller.drain_commands().is_empty());
        assert!(controller.is_loading_more());
        assert_eq!(controller.items().len(), before.items.len());
    }

    #[test]
    fn test_refresh_without_active_item_resets_active() {
        let mut controller = loaded(&["a", "b"]);
        controller.on_visible_indices(&[1]);
        controller.drain_commands();

        controller.refresh();
        assert!(controller.is_refreshing());
        let request = fetch_requests(&mut controller).remove(0);
        assert_eq!(request.kind, FetchKind::Refresh);
        complete(&mut controller, request, FeedPage::new(meals(&["a", "c"]), None));

        assert!(!controller.is_refreshing());
        assert_eq!(controller.active_index(), None);
        assert_eq!(controller.playing_count(), 0);

        let commands = media_commands(&mut controller);
        assert!(commands.iter().all(|c| !matches!(c.action, MediaAction::Play { .. })));
        assert_eq!(commands, vec![MediaCommand::new(ItemKey::new(1, "b"), MediaAction::Pause)]);

        controller.on_visible_indices(&[1]);
        assert_eq!(
            media_commands(&mut controller),
            vec![MediaCommand::new(ItemKey::new(1, "c"), MediaAction::Play { muted: false })]
        );
    }

    #[test]
    fn test_refresh_keeps_active_item_at_same_position() {
        let mut controller = loaded(&["a", "b"]);
        controller.on_visible_indices(&[1]);
        controller.toggle_mute(1);
        controller.drain_commands();

        controller.refresh();
        let request = fetch_requests(&mut controller).remove(0);
        complete(&mut controller, request, FeedPage::new(meals(&["z", "b", "c"]), None));

        assert_eq!(controller.active_index(), Some(1));
        assert!(controller.item_state(1).is_playing);
        assert!(controller.item_state(1).is_muted);
        assert!(controller.drain_commands().is_empty());
    }

    #[test]
    fn test_refresh_failure_keeps_previous_list() {
        let mut controller = loaded(&["a", "b"]);
        controller.on_visible_indices(&[0]);
        controller.drain_commands();

        controller.refresh();
        let request = fetch_requests(&mut controller).remove(0);
        controller.on_fetch_completed(FetchResult {
            request,
            result: Err(DataFetchError::Status { status: 503, body: "down".to_string() }),
        });

        assert_eq!(controller.items().len(), 2);
        assert_eq!(controller.active_index(), Some(0));
        assert!(controller.item_state(0).is_playing);
        assert!(!controller.is_refreshing());
        assert_eq!(controller.drain_notices().len(), 1);
    }

    // -------------------------------------------------------------------------
    // Invariants and boundaries
    // -------------------------------------------------------------------------

    #[test]
    fn test_repeated_visibility_report_is_idempotent() {
        let mut controller = loaded(&["a", "b"]);
        controller.on_visible_indices(&[1]);
        assert_eq!(controller.drain_commands().len(), 1);

        controller.on_visible_indices(&[1]);
        assert!(controller.drain_commands().is_empty());
        assert_eq!(controller.active_index(), Some(1));
    }

    #[test]
    fn test_nothing_visible_pauses_active_item() {
        let mut controller = loaded(&["a", "b"]);
        controller.on_visible_indices(&[0]);
        controller.drain_commands();

        controller.on_visibility_changed(&[]);

        assert_eq!(controller.active_index(), None);
        assert_eq!(controller.playing_count(), 0);
        assert_eq!(media_commands(&mut controller), vec![cmd(&controller, 0, MediaAction::Pause)]);
    }

    #[test]
    fn test_below_threshold_items_do_not_activate() {
        let mut controller = loaded(&["a", "b"]);
        controller.on_visibility_changed(&[ViewableItem::new(0, 40.0), ViewableItem::new(1, 60.0)]);

        assert_eq!(controller.active_index(), None);
        assert!(controller.drain_commands().is_empty());
        // Still tracked because they were on screen
        assert!(controller.is_tracked(0));
        assert!(controller.is_tracked(1));
    }

    #[test]
    fn test_fast_scroll_settles_on_single_playing_item() {
        let ids = ["a", "b", "c", "d", "e"];
        let mut controller = loaded(&ids);

        for index in 0..ids.len() {
            controller.on_visible_indices(&[index]);
            assert!(controller.playing_count() <= 1);
        }
        controller.on_visible_indices(&[2, 3]);

        assert_eq!(controller.active_index(), Some(2));
        assert_eq!(controller.playing_count(), 1);
        assert!(controller.item_state(2).is_playing);
    }

    #[test]
    fn test_out_of_range_visibility_is_ignored() {
        let mut controller = loaded(&["a"]);
        controller.on_visible_indices(&[5]);
        assert_eq!(controller.active_index(), None);
        assert!(controller.drain_commands().is_empty());
    }

    // -------------------------------------------------------------------------
    // User overrides
    // -------------------------------------------------------------------------

    #[test]
    fn test_mute_round_trip_on_active_item() {
        let mut controller = loaded(&["a", "b"]);
        controller.on_visible_indices(&[0]);
        controller.drain_commands();

        let original = controller.item_state(0).is_muted;
        assert!(controller.toggle_mute(0));
        assert!(controller.toggle_mute(0));

        assert_eq!(controller.item_state(0).is_muted, original);
        assert_eq!(
            media_commands(&mut controller),
            vec![
                cmd(&controller, 0, MediaAction::SetMuted(true)),
                cmd(&controller, 0, MediaAction::SetMuted(false)),
            ]
        );
    }

    #[test]
    fn test_mute_preference_survives_visibility_changes() {
        let mut controller = loaded(&["a", "b"]);
        controller.on_visible_indices(&[0]);
        controller.toggle_mute(0);
        controller.on_visible_indices(&[1]);
        controller.drain_commands();

        controller.on_visible_indices(&[0]);

        assert!(controller.item_state(0).is_muted);
        assert!(media_commands(&mut controller)
            .contains(&cmd(&controller, 0, MediaAction::Play { muted: true })));
    }

    #[test]
    fn test_mute_on_inactive_item_is_rejected() {
        let mut controller = loaded(&["a", "b"]);
        controller.on_visible_indices(&[0]);
        controller.drain_commands();

        assert!(!controller.toggle_mute(1));
        assert!(!controller.item_state(1).is_muted);
        assert!(!controller.toggle_mute(7));
        assert!(controller.drain_commands().is_empty());

        // Nothing leaks into the next activation either
        controller.on_visible_indices(&[1]);
        assert!(media_commands(&mut controller)
            .contains(&cmd(&controller, 1, MediaAction::Play { muted: false })));
    }

    #[test]
    fn test_mute_without_active_item_is_rejected() {
        let mut controller = loaded(&["a"]);

        assert!(!controller.toggle_mute(0));
        assert!(!controller.item_state(0).is_muted);
        assert!(controller.drain_commands().is_empty());
    }

    #[test]
    fn test_toggle_play_pause_on_active_item() {
        let mut controller = loaded(&["a", "b"]);
        controller.on_visible_indices(&[0]);
        controller.drain_commands();

        assert!(controller.toggle_play_pause(0));
        assert!(!controller.item_state(0).is_playing);
        assert!(controller.toggle_play_pause(0));
        assert!(controller.item_state(0).is_playing);

        assert_eq!(
            media_commands(&mut controller),
            vec![
                cmd(&controller, 0, MediaAction::Pause),
                cmd(&controller, 0, MediaAction::Play { muted: false }),
            ]
        );
    }

    #[test]
    fn test_toggle_play_pause_on_inactive_item_is_rejected() {
        let mut controller = loaded(&["a", "b"]);
        controller.on_visible_indices(&[0]);
        controller.drain_commands();

        assert!(!controller.toggle_play_pause(1));
        assert!(controller.drain_commands().is_empty());
        assert_eq!(controller.playing_count(), 1);
    }

    #[test]
    fn test_paused_item_does_not_loop() {
        let mut controller = loaded(&["a"]);
        controller.on_visible_indices(&[0]);
        controller.toggle_play_pause(0);
        controller.drain_commands();

        let k = key(&controller, 0);
        controller.on_item_finished(&k);

        assert!(controller.drain_commands().is_empty());
        assert!(!controller.item_state(0).is_playing);
    }

    // -------------------------------------------------------------------------
    // Media events
    // -------------------------------------------------------------------------

    #[test]
    fn test_media_lifecycle_updates_only_target_item() {
        let mut controller = loaded(&["a", "b"]);
        controller.on_visible_indices(&[0]);

        let k = key(&controller, 0);
        controller.handle_media_event(&k, MediaEvent::LoadStart);
        assert!(controller.item_state(0).is_loading());

        controller.handle_media_event(&k, MediaEvent::Loaded { duration: None });
        assert_eq!(controller.item_state(0).phase, ItemPhase::Ready);

        controller.handle_media_event(&k, MediaEvent::Progress { ratio: 0.25, duration_known: true });
        assert_eq!(controller.item_state(0).position_ratio, 0.25);

        controller.handle_media_event(&k, MediaEvent::Progress { ratio: 0.75, duration_known: false });
        assert_eq!(controller.item_state(0).position_ratio, 0.25);

        controller.handle_media_event(&k, MediaEvent::Progress { ratio: 3.0, duration_known: true });
        assert_eq!(controller.item_state(0).position_ratio, 1.0);

        assert_eq!(controller.item_state(1), ItemPlaybackState::default());
    }

    #[test]
    fn test_media_error_is_isolated() {
        let mut controller = loaded(&["a", "b"]);
        controller.on_visible_indices(&[0]);
        controller.drain_commands();

        let k = key(&controller, 0);
        controller.handle_media_event(&k, MediaEvent::Error { reason: "decode failed".to_string() });

        let state = controller.item_state(0);
        assert!(state.has_error());
        assert!(!state.is_loading());
        assert!(!state.is_playing);
        assert_eq!(state.error.as_deref(), Some("decode failed"));

        let notices = controller.drain_notices();
        assert!(matches!(&notices[..], [FeedNotice::MediaFailed(e)] if e.item_id == "a"));

        // The neighbour still plays normally
        controller.on_visible_indices(&[1]);
        assert!(controller.item_state(1).is_playing);
        assert!(!controller.toggle_play_pause(0));
    }

    #[test]
    fn test_errored_active_item_plays_after_retry() {
        let mut controller = loaded(&["a"]);
        controller.on_visible_indices(&[0]);
        let k = key(&controller, 0);
        controller.on_item_error(&k, "timeout".to_string());
        controller.drain_commands();

        controller.on_item_load_start(&k);

        assert!(controller.item_state(0).is_loading());
        assert!(controller.item_state(0).is_playing);
        assert_eq!(
            media_commands(&mut controller),
            vec![MediaCommand::new(k, MediaAction::Play { muted: false })]
        );
    }

    #[test]
    fn test_loaded_after_error_clears_error() {
        let mut controller = loaded(&["a", "b"]);
        controller.on_visible_indices(&[0]);
        let k = key(&controller, 0);

        controller.handle_media_event(&k, MediaEvent::Error { reason: "stalled".to_string() });
        assert!(controller.item_state(0).has_error());

        controller.handle_media_event(&k, MediaEvent::Loaded { duration: Some(Duration::from_secs(12)) });

        let state = controller.item_state(0);
        assert_eq!(state.phase, ItemPhase::Ready);
        assert!(!state.has_error());
        assert!(state.error.is_none());
        assert_eq!(state.duration, Some(Duration::from_secs(12)));
    }

    #[test]
    fn test_events_for_replaced_items_are_dropped() {
        let mut controller = loaded(&["a", "b"]);
        controller.on_visible_indices(&[0]);
        let old = key(&controller, 0);

        controller.refresh();
        let request = fetch_requests(&mut controller).remove(0);
        complete(&mut controller, request, FeedPage::new(meals(&["x", "y"]), None));

        controller.handle_media_event(&old, MediaEvent::Error { reason: "late".to_string() });
        controller.handle_media_event(&ItemKey::new(9, "ghost"), MediaEvent::Finished);

        assert!(!controller.item_state(0).has_error());
        assert!(controller.drain_notices().is_empty());
    }

    #[test]
    fn test_item_without_video_activates_without_commands() {
        let mut controller = PlaybackController::default();
        controller.load_initial();
        let request = fetch_requests(&mut controller).remove(0);
        let items = vec![FeedItem::new("plain", "Bread", 2.0), meal("b")];
        complete(&mut controller, request, FeedPage::new(items, None));

        controller.on_visible_indices(&[0]);
        assert_eq!(controller.active_index(), Some(0));
        assert!(controller.drain_commands().is_empty());
        assert!(!controller.toggle_play_pause(0));
        assert!(!controller.toggle_mute(0));

        controller.on_visible_indices(&[1]);
        assert_eq!(
            media_commands(&mut controller),
            vec![cmd(&controller, 1, MediaAction::Play { muted: false })]
        );
    }

    // -------------------------------------------------------------------------
    // Stale fetches and pagination
    // -------------------------------------------------------------------------

    #[test]
    fn test_older_reload_result_is_discarded() {
        let mut controller = PlaybackController::default();
        controller.load_initial();
        let first = fetch_requests(&mut controller).remove(0);
        controller.refresh();
        let second = fetch_requests(&mut controller).remove(0);
        assert!(second.id > first.id);

        complete(&mut controller, second, FeedPage::new(meals(&["new"]), None));
        complete(&mut controller, first, FeedPage::new(meals(&["old1", "old2"]), None));

        assert_eq!(controller.items().len(), 1);
        assert_eq!(controller.items()[0].id, "new");
        assert!(!controller.has_pending_fetch());
    }

    #[test]
    fn test_load_more_appends_and_skips_duplicates() {
        let config = FeedConfig { page_size: 2, ..FeedConfig::default() };
        let mut controller = PlaybackController::new(&config);
        controller.load_initial();
        let request = fetch_requests(&mut controller).remove(0);
        complete(&mut controller, request, FeedPage::new(meals(&["a", "b"]), Some(PageCursor::at(2))));

        controller.dispatch(FeedIntent::EndReached);
        let more = fetch_requests(&mut controller).remove(0);
        assert_eq!(more.kind, FetchKind::More);
        assert_eq!(more.cursor, Some(PageCursor::at(2)));

        complete(&mut controller, more, FeedPage::new(meals(&["b", "c"]), Some(PageCursor::at(4))));

        let ids: Vec<&str> = controller.items().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(!controller.is_loading_more());
        assert!(controller.has_more_data());
    }

    #[test]
    fn test_refresh_abandons_in_flight_load_more() {
        let config = FeedConfig { page_size: 2, ..FeedConfig::default() };
        let mut controller = PlaybackController::new(&config);
        controller.load_initial();
        let request = fetch_requests(&mut controller).remove(0);
        complete(&mut controller, request, FeedPage::new(meals(&["a", "b"]), Some(PageCursor::at(2))));

        controller.load_more();
        let more = fetch_requests(&mut controller).remove(0);
        controller.refresh();
        assert!(!controller.is_loading_more());
        let reload = fetch_requests(&mut controller).remove(0);

        complete(&mut controller, reload, FeedPage::new(meals(&["x"]), None));
        complete(&mut controller, more, FeedPage::new(meals(&["c", "d"]), Some(PageCursor::at(4))));

        let ids: Vec<&str> = controller.items().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["x"]);
    }

    #[test]
    fn test_load_more_waits_for_pending_refresh() {
        let config = FeedConfig { page_size: 4, ..FeedConfig::default() };
        let mut controller = PlaybackController::new(&config);
        controller.load_initial();
        let request = fetch_requests(&mut controller).remove(0);
        complete(&mut controller, request, FeedPage::new(meals(&["a", "b", "c", "d"]), Some(PageCursor::at(4))));
        assert!(controller.has_more_data());

        controller.refresh();
        let reload = fetch_requests(&mut controller).remove(0);

        controller.load_more();
        controller.dispatch(FeedIntent::EndReached);
        assert!(fetch_requests(&mut controller).is_empty());
        assert!(!controller.is_loading_more());

        // Once the reload lands, paging resumes from the fresh cursor
        complete(&mut controller, reload, FeedPage::new(meals(&["w", "x", "y", "z"]), Some(PageCursor::at(4))));
        controller.load_more();
        let more = fetch_requests(&mut controller);
        assert_eq!(more.len(), 1);
        assert_eq!(more[0].kind, FetchKind::More);
        assert_eq!(more[0].cursor, Some(PageCursor::at(4)));
    }

    #[test]
    fn test_dropped_rows_do_not_end_pagination() {
        let config = FeedConfig { page_size: 3, ..FeedConfig::default() };
        let mut controller = PlaybackController::new(&config);
        controller.load_initial();
        let request = fetch_requests(&mut controller).remove(0);

        let mut rows = meals(&["a", "b"]);
        rows.insert(1, FeedItem::new("bad", "Broken", -1.0));
        let page = FeedPage::new(rows, Some(PageCursor::at(3))).retain_well_formed();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.row_count, 3);

        complete(&mut controller, request, page);

        assert_eq!(controller.items().len(), 2);
        assert!(controller.has_more_data());
        controller.load_more();
        assert_eq!(fetch_requests(&mut controller)[0].cursor, Some(PageCursor::at(3)));
    }

    #[test]
    fn test_load_initial_on_populated_list_shows_refreshing() {
        let mut controller = loaded(&["a", "b"]);
        controller.on_visible_indices(&[0]);

        controller.load_initial();
        assert!(!controller.is_initial_loading());
        assert!(controller.is_refreshing());
        assert!(controller.snapshot().is_refreshing);
        assert!(controller.has_pending_fetch());

        let request = fetch_requests(&mut controller).remove(0);
        assert_eq!(request.kind, FetchKind::Initial);
        complete(&mut controller, request, FeedPage::new(meals(&["a", "b"]), None));

        assert!(!controller.is_refreshing());
        assert!(!controller.snapshot().is_refreshing);
        assert_eq!(controller.active_index(), Some(0));
    }

    #[test]
    fn test_scrolling_near_end_requests_more() {
        let config = FeedConfig { page_size: 2, ..FeedConfig::default() };
        let mut controller = PlaybackController::new(&config);
        controller.load_initial();
        let request = fetch_requests(&mut controller).remove(0);
        complete(&mut controller, request, FeedPage::new(meals(&["a", "b"]), Some(PageCursor::at(2))));

        controller.dispatch(FeedIntent::Scrolled(ScrollMetrics::paged(0, 100.0)));
        assert!(fetch_requests(&mut controller).is_empty());

        controller.dispatch(FeedIntent::Scrolled(ScrollMetrics::paged(1, 100.0)));
        assert_eq!(fetch_requests(&mut controller).len(), 1);
    }

    #[test]
    fn test_order_request_returns_meal() {
        let mut controller = loaded(&["a", "b"]);
        let item = controller.dispatch(FeedIntent::OrderRequested(1)).expect("meal should exist");
        assert_eq!(item.id, "b");
        assert!(controller.dispatch(FeedIntent::OrderRequested(7)).is_none());
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let mut controller = loaded(&["a", "b"]);
        controller.on_visible_indices(&[0]);

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.active_index, Some(0));
        assert_eq!(snapshot.items.len(), 2);
        assert!(snapshot.playback["a"].is_playing);
        assert!(!snapshot.is_initial_loading);

        let json = serde_json::to_value(&snapshot).expect("snapshot should serialize");
        assert_eq!(json["active_index"], 0);
    }
}
