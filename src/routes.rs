use std::convert::Infallible;
use std::sync::Arc;

use warp::http::StatusCode;
use warp::{Filter, Reply};

use crate::handlers::{self, handle_rejection};
use crate::middleware::cors_headers;
use crate::models::{AppState, CatalogItem};
use crate::services::CatalogTransport;

const MAX_BODY_BYTES: u64 = 64 * 1024;

/// The HTTP surface the UI talks to.
pub fn routes<T: CatalogTransport>(
    state: Arc<AppState<T>>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let state_filter = warp::any().map(move || state.clone());

    let health_check = warp::path("health").and(warp::get()).map(|| "OK");

    // CORS preflight; the allow-* headers are added to every response below.
    let preflight = warp::path("api")
        .and(warp::options())
        .map(|| StatusCode::NO_CONTENT);

    let starships = warp::path!("api" / "starships")
        .and(warp::get())
        .and(warp::query::<handlers::CatalogQuery>())
        .and(state_filter.clone())
        .and_then(handlers::list_starships::<T>);

    let list_favorites = warp::path!("api" / "favorites")
        .and(warp::get())
        .and(warp::query::<handlers::FavoritesQuery>())
        .and(state_filter.clone())
        .and_then(handlers::list_favorites::<T>);

    let get_favorite = warp::path!("api" / "favorites" / "entry")
        .and(warp::get())
        .and(warp::query::<handlers::EntryQuery>())
        .and(state_filter.clone())
        .and_then(handlers::get_favorite::<T>);

    let add_favorite = warp::path!("api" / "favorites")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json::<CatalogItem>())
        .and(state_filter.clone())
        .and_then(handlers::add_favorite::<T>);

    let remove_favorite = warp::path!("api" / "favorites")
        .and(warp::delete())
        .and(warp::query::<handlers::EntryQuery>())
        .and(state_filter.clone())
        .and_then(handlers::remove_favorite::<T>);

    let update_notes = warp::path!("api" / "favorites" / "notes")
        .and(warp::put())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json::<handlers::NotesUpdate>())
        .and(state_filter)
        .and_then(handlers::update_notes::<T>);

    let access_log = warp::log::custom(|info| {
        tracing::info!(
            "{} {} {} {}ms",
            info.method(),
            info.path(),
            info.status().as_u16(),
            info.elapsed().as_millis()
        );
    });

    health_check
        .or(preflight)
        .or(starships)
        .or(list_favorites)
        .or(get_favorite)
        .or(add_favorite)
        .or(remove_favorite)
        .or(update_notes)
        .recover(handle_rejection)
        .with(warp::reply::with::headers(cors_headers()))
        .with(access_log)
}
