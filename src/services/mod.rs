mod catalog;
mod favorites;
mod rate_limiter;
mod transport;

pub use catalog::{Catalog, CatalogSubscription, FetchPolicy, RemoteResourceCache};
pub use favorites::FavoritesStore;
pub use rate_limiter::RateLimiter;
pub use transport::{CatalogTransport, HttpTransport, TransportResponse};
