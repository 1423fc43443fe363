use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account kinds known to the backend `users` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Normal,
    Restaurant,
    Influencer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
}

/// One orderable meal with its (optional) playable video.
///
/// Field names follow the backend `meals` row so a page can be decoded
/// straight from the REST response, including the embedded `restaurant`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default, rename = "video_url")]
    pub video_ref: Option<String>,
    #[serde(default)]
    pub restaurant_id: Option<String>,
    #[serde(default)]
    pub restaurant: Option<RestaurantRef>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl FeedItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            price,
            video_ref: None,
            restaurant_id: None,
            restaurant: None,
            created_at: None,
        }
    }

    pub fn with_video(mut self, uri: impl Into<String>) -> Self {
        self.video_ref = Some(uri.into());
        self
    }

    pub fn with_restaurant(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.restaurant_id = Some(id.into());
        self.restaurant = Some(RestaurantRef {
            name: name.into(),
            user_type: Some(UserType::Restaurant),
        });
        self
    }

    /// A blank or missing video reference means "no video available".
    pub fn has_video(&self) -> bool {
        self.video_ref
            .as_deref()
            .map(|uri| !uri.trim().is_empty())
            .unwrap_or(false)
    }

    pub fn restaurant_name(&self) -> Option<&str> {
        self.restaurant.as_ref().map(|r| r.name.as_str())
    }

    /// Rows with an empty id or a negative/non-finite price are not displayable.
    pub fn is_well_formed(&self) -> bool {
        !self.id.trim().is_empty() && self.price.is_finite() && self.price >= 0.0
    }
}

/// Opaque position in the backend's meal ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor(u64);

impl PageCursor {
    pub fn at(offset: u64) -> Self {
        Self(offset)
    }

    pub fn offset(&self) -> u64 {
        self.0
    }
}

/// One page returned by a feed data source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedPage {
    pub items: Vec<FeedItem>,
    pub next_cursor: Option<PageCursor>,
    /// Rows the source returned, counting ones later dropped as malformed
    pub row_count: usize,
}

impl FeedPage {
    pub fn new(items: Vec<FeedItem>, next_cursor: Option<PageCursor>) -> Self {
        let row_count = items.len();
        Self { items, next_cursor, row_count }
    }

    /// Drops malformed rows, logging each one. `row_count` is left as fetched.
    pub fn retain_well_formed(mut self) -> Self {
        self.items.retain(|item| {
            let ok = item.is_well_formed();
            if !ok {
                log::warn!("Dropping malformed meal row {:?} (price {})", item.id, item.price);
            }
            ok
        });
        self
    }
}
