use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::backend::FeedDataSource;
use crate::feed::controller::{FetchRequest, FetchResult};

/// Runs feed fetches off the UI thread.
///
/// Requests go to a worker thread hosting a tokio runtime; each blocking
/// `fetch_page` call runs in `spawn_blocking` and its result comes back tagged
/// with the originating request so the controller can drop stale ones.
pub struct AsyncFeedLoader {
    request_sender: mpsc::UnboundedSender<FetchRequest>,
    result_receiver: Mutex<mpsc::UnboundedReceiver<FetchResult>>,
}

impl AsyncFeedLoader {
    pub fn new(source: Arc<dyn FeedDataSource>) -> Self {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<FetchRequest>();
        let (result_tx, result_rx) = mpsc::unbounded_channel::<FetchResult>();

        thread::spawn(move || {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    log::error!("Failed to create async runtime, fetching inline: {}", e);
                    while let Some(request) = request_rx.blocking_recv() {
                        run_fetch(source.as_ref(), request, &result_tx);
                    }
                    return;
                }
            };

            // Not `move`: the source must be dropped outside the runtime
            rt.block_on(async {
                while let Some(request) = request_rx.recv().await {
                    let source = source.clone();
                    let result_tx = result_tx.clone();

                    tokio::task::spawn_blocking(move || {
                        run_fetch(source.as_ref(), request, &result_tx);
                    });
                }
            });
        });

        Self {
            request_sender: request_tx,
            result_receiver: Mutex::new(result_rx),
        }
    }

    /// Queue a fetch (non-blocking)
    pub fn submit(&self, request: FetchRequest) {
        if let Err(e) = self.request_sender.send(request) {
            log::error!("Failed to send fetch request: {}", e);
        }
    }

    /// Get completed fetches (non-blocking)
    pub fn completed(&self) -> Vec<FetchResult> {
        let mut results = Vec::new();

        if let Ok(mut receiver) = self.result_receiver.lock() {
            while let Ok(result) = receiver.try_recv() {
                results.push(result);
            }
        }

        results
    }

    /// Blocks until at least one fetch completes or `timeout` passes.
    pub fn wait_for_completed(&self, timeout: Duration) -> Vec<FetchResult> {
        let deadline = Instant::now() + timeout;
        loop {
            let results = self.completed();
            if !results.is_empty() || Instant::now() >= deadline {
                return results;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }
}

fn run_fetch(
    source: &dyn FeedDataSource,
    request: FetchRequest,
    result_tx: &mpsc::UnboundedSender<FetchResult>,
) {
    log::debug!("Fetching {:?} page (request {})", request.kind, request.id);

    let result = source.fetch_page(request.cursor);
    match &result {
        Ok(page) => log::debug!("Request {} returned {} meals", request.id, page.items.len()),
        Err(e) => log::debug!("Request {} failed: {}", request.id, e),
    }

    if let Err(e) = result_tx.send(FetchResult { request, result }) {
        log::error!("Failed to send fetch result: {}", e);
    }
}
