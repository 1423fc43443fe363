//! Vertically swiping meal-video feed: playback coordination, paging against
//! the hosted data service, and the checkout collaborator.

pub mod backend;
pub mod core;
pub mod feed;
pub mod order;
