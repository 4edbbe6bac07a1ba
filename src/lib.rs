pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod projector;
pub mod routes;
pub mod services;

pub use errors::{FetchError, GatewayError, RateLimitExceeded, StoreError};
pub use models::{AppState, CacheEntry, CacheStatus, CatalogItem, FavoriteEntry};
pub use services::{FavoritesStore, RateLimiter, RemoteResourceCache};
