use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use meal_feed::backend::{BackendClient, FeedDataSource, RestFeedSource, StaticFeedSource};
use meal_feed::core::AppConfig;
use meal_feed::feed::{FeedIntent, FeedNotice, FeedSession, LoggingSink, MediaEvent, ViewableItem};
use meal_feed::order::{MemoryOrderPlacer, OrderForm, OrderPlacer, OrderRequest, OrderTotals};

const SETTLE_TIMEOUT: Duration = Duration::from_secs(20);

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = AppConfig::load()?;
    let feed_file = std::env::args().nth(1).map(PathBuf::from).or_else(|| config.feed_file.clone());
    let source = build_source(&config, feed_file)?;

    let mut session = FeedSession::new(&config.feed, source, LoggingSink);
    session.start();
    report(session.settle(SETTLE_TIMEOUT));

    let count = session.controller().items().len();
    if count == 0 {
        println!("No meals available. Check back later for amazing meal videos!");
        return Ok(());
    }

    // Swipe through the first few meals, looping each once
    for index in 0..count.min(3) {
        session.handle(FeedIntent::VisibilityChanged(vec![ViewableItem::fully(index)]));
        if let Some(key) = session.controller().key_for(index) {
            session.media_event(&key, MediaEvent::LoadStart);
            session.media_event(&key, MediaEvent::Loaded { duration: Some(Duration::from_secs(15)) });
            session.media_event(&key, MediaEvent::Progress { ratio: 1.0, duration_known: true });
            session.media_event(&key, MediaEvent::Finished);
        }
        if index == 0 {
            session.handle(FeedIntent::MuteTapped(0));
        }
    }

    session.handle(FeedIntent::EndReached);
    session.handle(FeedIntent::RefreshRequested);
    report(session.settle(SETTLE_TIMEOUT));

    if let Some(active) = session.controller().active_index() {
        if let Some(meal) = session.handle(FeedIntent::OrderRequested(active)) {
            let totals = OrderTotals::for_price(meal.price);
            log::info!("Checkout for {}: total {:.2}", meal.name, totals.total);

            let placer = MemoryOrderPlacer::new();
            let form = OrderForm::new("221B Baker Street, London", "+44 20 7946 0958");
            match OrderRequest::from_form(&meal, "demo-buyer", &form).and_then(|r| placer.place(&r)) {
                Ok(order) => log::info!("Order {} placed ({:?})", order.id, order.status),
                Err(e) => log::warn!("Order failed: {}", e),
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&session.controller().snapshot())?);
    Ok(())
}

fn build_source(config: &AppConfig, feed_file: Option<PathBuf>) -> anyhow::Result<Arc<dyn FeedDataSource>> {
    if let Some(path) = feed_file {
        return Ok(Arc::new(StaticFeedSource::from_json_file(&path, config.feed.page_size)?));
    }

    let client = BackendClient::new(&config.backend)
        .map_err(|e| anyhow::anyhow!("Backend unavailable: {}", e))?;
    Ok(Arc::new(RestFeedSource::new(Arc::new(client), config.feed.page_size)))
}

fn report(notices: Vec<FeedNotice>) {
    for notice in notices {
        match notice {
            FeedNotice::FetchFailed { kind, error } => eprintln!("Error loading meals ({:?}): {}", kind, error),
            FeedNotice::MediaFailed(error) => eprintln!("{}", error),
        }
    }
}
