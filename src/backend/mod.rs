pub mod client;
pub mod source;

pub use client::BackendClient;
pub use source::*;
