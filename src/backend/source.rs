use std::path::Path;
use std::sync::Arc;

use crate::backend::BackendClient;
use crate::core::{DataFetchError, FeedItem, FeedPage, PageCursor};

/// Supplies pages of feed items in display order.
pub trait FeedDataSource: Send + Sync {
    fn fetch_page(&self, cursor: Option<PageCursor>) -> Result<FeedPage, DataFetchError>;
}

const MEAL_SELECT: &str = "*,restaurant:users!restaurant_id(name,user_type)";

/// Newest-first meals from the backend `meals` table, paged by offset.
pub struct RestFeedSource {
    client: Arc<BackendClient>,
    page_size: usize,
}

impl RestFeedSource {
    pub fn new(client: Arc<BackendClient>, page_size: usize) -> Self {
        Self {
            client,
            page_size: page_size.max(1),
        }
    }

    pub fn page_query(&self, cursor: Option<PageCursor>) -> Vec<(&'static str, String)> {
        let offset = cursor.map(|c| c.offset()).unwrap_or(0);
        vec![
            ("select", MEAL_SELECT.to_string()),
            ("order", "created_at.desc".to_string()),
            ("limit", self.page_size.to_string()),
            ("offset", offset.to_string()),
        ]
    }

    /// A full page means the backend may hold more rows after it.
    pub fn next_cursor(&self, cursor: Option<PageCursor>, returned: usize) -> Option<PageCursor> {
        let offset = cursor.map(|c| c.offset()).unwrap_or(0);
        (returned >= self.page_size).then(|| PageCursor::at(offset + returned as u64))
    }
}

impl FeedDataSource for RestFeedSource {
    fn fetch_page(&self, cursor: Option<PageCursor>) -> Result<FeedPage, DataFetchError> {
        let items: Vec<FeedItem> = self.client.select("meals", &self.page_query(cursor))?;
        let next_cursor = self.next_cursor(cursor, items.len());
        Ok(FeedPage::new(items, next_cursor).retain_well_formed())
    }
}

/// Serves a fixed list of meals, in pages when a page size is set.
pub struct StaticFeedSource {
    items: Vec<FeedItem>,
    page_size: Option<usize>,
}

impl StaticFeedSource {
    pub fn new(items: Vec<FeedItem>, page_size: usize) -> Self {
        Self {
            items,
            page_size: Some(page_size.max(1)),
        }
    }

    /// Everything in one page with no cursor, so load-more never fires.
    pub fn unpaged(items: Vec<FeedItem>) -> Self {
        Self { items, page_size: None }
    }

    /// Reads a JSON array of meal rows, as exported from the `meals` table.
    pub fn from_json_file(path: &Path, page_size: usize) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read feed file {}: {}", path.display(), e))?;
        let items: Vec<FeedItem> = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse feed file {}: {}", path.display(), e))?;

        log::info!("Loaded {} meals from {}", items.len(), path.display());
        Ok(Self::new(items, page_size))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FeedDataSource for StaticFeedSource {
    fn fetch_page(&self, cursor: Option<PageCursor>) -> Result<FeedPage, DataFetchError> {
        let Some(page_size) = self.page_size else {
            return Ok(FeedPage::new(self.items.clone(), None).retain_well_formed());
        };

        let start = (cursor.map(|c| c.offset()).unwrap_or(0) as usize).min(self.items.len());
        let end = (start + page_size).min(self.items.len());
        let next_cursor = (end < self.items.len()).then(|| PageCursor::at(end as u64));

        Ok(FeedPage::new(self.items[start..end].to_vec(), next_cursor).retain_well_formed())
    }
}
