use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::backend::FeedDataSource;
use crate::core::{FeedConfig, FeedItem};
use crate::feed::controller::{ControllerCommand, FeedIntent, FeedNotice, PlaybackController};
use crate::feed::loader::AsyncFeedLoader;
use crate::feed::playback::{ItemKey, MediaEvent, MediaSink};

/// Glue between the controller, the background loader and the media resource.
///
/// Meant to be driven from the UI thread: forward view events through
/// `handle` / `media_event` and call `pump` once per frame.
pub struct FeedSession<S: MediaSink> {
    controller: PlaybackController,
    loader: AsyncFeedLoader,
    sink: S,
}

impl<S: MediaSink> FeedSession<S> {
    pub fn new(config: &FeedConfig, source: Arc<dyn FeedDataSource>, sink: S) -> Self {
        Self {
            controller: PlaybackController::new(config),
            loader: AsyncFeedLoader::new(source),
            sink,
        }
    }

    /// Kick off the initial load.
    pub fn start(&mut self) -> Vec<FeedNotice> {
        self.controller.load_initial();
        self.pump()
    }

    pub fn handle(&mut self, intent: FeedIntent) -> Option<FeedItem> {
        let ordered = self.controller.dispatch(intent);
        self.pump();
        ordered
    }

    pub fn media_event(&mut self, key: &ItemKey, event: MediaEvent) {
        self.controller.handle_media_event(key, event);
        self.pump();
    }

    /// Feeds finished fetches in, routes outgoing commands, returns new notices.
    pub fn pump(&mut self) -> Vec<FeedNotice> {
        for result in self.loader.completed() {
            self.controller.on_fetch_completed(result);
        }
        self.route_commands();
        self.controller.drain_notices()
    }

    /// Pumps until no fetch is outstanding or `timeout` passes.
    pub fn settle(&mut self, timeout: Duration) -> Vec<FeedNotice> {
        let deadline = Instant::now() + timeout;
        let mut notices = self.pump();

        while self.controller.has_pending_fetch() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                log::warn!("Feed fetch still pending after {:?}", timeout);
                break;
            }
            for result in self.loader.wait_for_completed(remaining) {
                self.controller.on_fetch_completed(result);
            }
            self.route_commands();
            notices.extend(self.controller.drain_notices());
        }

        notices
    }

    fn route_commands(&mut self) {
        for command in self.controller.drain_commands() {
            match command {
                ControllerCommand::Fetch(request) => self.loader.submit(request),
                ControllerCommand::Media(media) => self.sink.apply(&media),
            }
        }
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}
