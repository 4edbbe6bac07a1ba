use std::sync::Arc;

use starship_catalog::{
    config::Settings,
    routes::routes,
    services::{FavoritesStore, HttpTransport, RateLimiter, RemoteResourceCache},
    AppState,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("starship_catalog=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let settings = Settings::load()?;
    let limiter = Arc::new(RateLimiter::new(settings.min_request_interval()));
    let transport = HttpTransport::new()?;
    let catalog = RemoteResourceCache::new(
        transport,
        limiter,
        settings.catalog_url.clone(),
        settings.fetch_policy(),
    );
    let favorites = FavoritesStore::open(settings.favorites_path());

    let state = Arc::new(AppState::new(catalog, favorites));

    tracing::info!(
        catalog_url = %settings.catalog_url,
        "starship catalog running on http://{}",
        settings.bind_addr
    );
    warp::serve(routes(state)).run(settings.bind_addr).await;
    Ok(())
}
