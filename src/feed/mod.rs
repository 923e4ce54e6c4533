mod classify;
mod entry;
mod fetcher;

pub use classify::{is_broad_category, Classifier};
pub use entry::EntryParser;
pub use fetcher::{FeedFetcher, FetchError};
