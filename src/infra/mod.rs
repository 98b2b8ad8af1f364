pub mod api;

pub use api::{CacheStatus, CachedPayload, ClientBuildError, HarvtechClient};
