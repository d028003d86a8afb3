//! Identifier resolution: local directories first, then the model hub.

mod fetcher;

pub use fetcher::HubFetcher;
