pub mod controller;
pub mod loader;
pub mod playback;
pub mod session;
pub mod visibility;

#[cfg(test)]
mod controller_test;

pub use controller::*;
pub use loader::AsyncFeedLoader;
pub use playback::*;
pub use session::FeedSession;
pub use visibility::*;
