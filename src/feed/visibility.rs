use crate::core::FeedConfig;

/// One item the list reports as (partly) on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewableItem {
    pub index: usize,
    pub percent_visible: f32,
}

impl ViewableItem {
    pub fn new(index: usize, percent_visible: f32) -> Self {
        Self { index, percent_visible }
    }

    pub fn fully(index: usize) -> Self {
        Self::new(index, 100.0)
    }
}

/// Scroll geometry along the feed axis, in the view's own units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub offset: f32,
    pub viewport_extent: f32,
    pub item_extent: f32,
}

impl ScrollMetrics {
    /// Paged layout where every item fills the viewport.
    pub fn paged(page: usize, item_extent: f32) -> Self {
        Self {
            offset: page as f32 * item_extent,
            viewport_extent: item_extent,
            item_extent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityPolicy {
    pub activation_threshold_percent: f32,
    pub end_reached_fraction: f32,
}

impl Default for VisibilityPolicy {
    fn default() -> Self {
        Self::from_config(&FeedConfig::default())
    }
}

impl VisibilityPolicy {
    pub fn from_config(config: &FeedConfig) -> Self {
        Self {
            activation_threshold_percent: config.activation_threshold_percent,
            end_reached_fraction: config.end_reached_fraction,
        }
    }

    pub fn qualifies(&self, item: &ViewableItem) -> bool {
        item.percent_visible >= self.activation_threshold_percent
    }

    /// Topmost qualifying item within `len`, if any.
    pub fn select_active(&self, visible: &[ViewableItem], len: usize) -> Option<usize> {
        visible
            .iter()
            .filter(|item| item.index < len && self.qualifies(item))
            .map(|item| item.index)
            .min()
    }

    /// True once the end of the loaded content is within the trailing threshold.
    pub fn should_load_more(&self, scroll: ScrollMetrics, len: usize) -> bool {
        if len == 0 || scroll.item_extent <= 0.0 {
            return false;
        }
        let content_end = len as f32 * scroll.item_extent;
        let remaining = content_end - (scroll.offset + scroll.viewport_extent);
        remaining <= self.end_reached_fraction * scroll.item_extent
    }
}
