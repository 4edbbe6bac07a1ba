use std::convert::Infallible;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use warp::http::StatusCode;
use warp::{Rejection, Reply};

use crate::errors::{FetchError, GatewayError};
use crate::middleware::sanitize_search;
use crate::models::{AppState, CatalogItem, FavoriteEntry};
use crate::projector::{project_catalog, project_favorites, PageMarker, Projection, ViewState};
use crate::services::{CatalogTransport, FavoritesStore};


fn first_page() -> usize {
    1
}

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default = "first_page")]
    pub page: usize,
}

#[derive(Debug, Deserialize)]
pub struct FavoritesQuery {
    #[serde(default)]
    pub search: String,
}

#[derive(Debug, Deserialize)]
pub struct EntryQuery {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct NotesUpdate {
    pub url: String,
    pub notes: String,
}

/// A catalog item plus the display fields a card needs.
#[derive(Debug, Serialize)]
pub struct StarshipCard {
    #[serde(flatten)]
    pub item: CatalogItem,
    pub star_rating: u8,
    pub passengers_display: String,
    pub is_favorite: bool,
}

impl StarshipCard {
    fn new(item: CatalogItem, favorites: &FavoritesStore) -> Self {
        Self {
            star_rating: item.star_rating(),
            passengers_display: item.passengers_display(),
            is_favorite: favorites.is_member(&item.url),
            item,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FavoriteCard {
    #[serde(flatten)]
    pub entry: FavoriteEntry,
    pub star_rating: u8,
    pub passengers_display: String,
}

impl From<FavoriteEntry> for FavoriteCard {
    fn from(entry: FavoriteEntry) -> Self {
        Self {
            star_rating: entry.item.star_rating(),
            passengers_display: entry.item.passengers_display(),
            entry,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogPage {
    pub search: String,
    pub items: Vec<StarshipCard>,
    pub current_page: usize,
    pub total_pages: usize,
    pub pages: Vec<PageMarker>,
    pub has_previous: bool,
    pub has_next: bool,
    pub show_pagination: bool,
    pub state: ViewState,
}

impl CatalogPage {
    fn new(search: String, page: usize, projection: Projection<CatalogItem>, favorites: &FavoritesStore) -> Self {
        Self {
            pages: projection.visible_pages(),
            has_previous: projection.has_previous(),
            has_next: projection.has_next(),
            show_pagination: projection.show_pagination(),
            current_page: page,
            total_pages: projection.total_pages,
            state: projection.state,
            items: projection
                .items
                .into_iter()
                .map(|item| StarshipCard::new(item, favorites))
                .collect(),
            search,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FavoritesView {
    pub search: String,
    pub items: Vec<FavoriteCard>,
    pub state: ViewState,
}

pub async fn list_starships<T: CatalogTransport>(
    query: CatalogQuery,
    state: Arc<AppState<T>>,
) -> Result<impl Reply, Rejection> {
    let search = sanitize_search(&query.search);
    let _subscription = state.catalog.subscribe();

    let items = state
        .catalog
        .fetch_catalog()
        .await
        .map_err(|e| warp::reject::custom(GatewayError::from(e)))?;

    let projection = project_catalog(&items, &search, query.page);
    Ok(warp::reply::json(&CatalogPage::new(
        search,
        query.page,
        projection,
        &state.favorites,
    )))
}

pub async fn list_favorites<T: CatalogTransport>(
    query: FavoritesQuery,
    state: Arc<AppState<T>>,
) -> Result<impl Reply, Rejection> {
    let search = sanitize_search(&query.search);
    let projection = project_favorites(&state.favorites.list(), &search);

    Ok(warp::reply::json(&FavoritesView {
        items: projection.items.into_iter().map(FavoriteCard::from).collect(),
        state: projection.state,
        search,
    }))
}

pub async fn get_favorite<T: CatalogTransport>(
    query: EntryQuery,
    state: Arc<AppState<T>>,
) -> Result<impl Reply, Rejection> {
    match state.favorites.get(&query.url) {
        Some(entry) => Ok(warp::reply::json(&FavoriteCard::from(entry))),
        None => Err(warp::reject::custom(GatewayError::NotFound(query.url))),
    }
}

pub async fn add_favorite<T: CatalogTransport>(
    item: CatalogItem,
    state: Arc<AppState<T>>,
) -> Result<impl Reply, Rejection> {
    let url = item.url.clone();
    let added = state.favorites.add(item).map_err(store_rejection)?;
    let entry = state
        .favorites
        .get(&url)
        .ok_or_else(|| warp::reject::custom(GatewayError::NotFound(url)))?;

    let code = if added { StatusCode::CREATED } else { StatusCode::OK };
    Ok(warp::reply::with_status(
        warp::reply::json(&FavoriteCard::from(entry)),
        code,
    ))
}

pub async fn remove_favorite<T: CatalogTransport>(
    query: EntryQuery,
    state: Arc<AppState<T>>,
) -> Result<impl Reply, Rejection> {
    let removed = state.favorites.remove(&query.url).map_err(store_rejection)?;
    Ok(warp::reply::json(&serde_json::json!({ "removed": removed })))
}

pub async fn update_notes<T: CatalogTransport>(
    update: NotesUpdate,
    state: Arc<AppState<T>>,
) -> Result<impl Reply, Rejection> {
    let updated = state
        .favorites
        .update_notes(&update.url, update.notes)
        .map_err(store_rejection)?;

    match state.favorites.get(&update.url) {
        Some(entry) if updated => Ok(warp::reply::json(&FavoriteCard::from(entry))),
        _ => Err(warp::reject::custom(GatewayError::NotFound(update.url))),
    }
}

fn store_rejection(e: crate::errors::StoreError) -> Rejection {
    warp::reject::custom(GatewayError::from(e))
}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found")
    } else if let Some(e) = err.find::<GatewayError>() {
        match e {
            GatewayError::Fetch(FetchError::RateLimitExceeded) => {
                (StatusCode::TOO_MANY_REQUESTS, "Too many requests. Please wait.")
            }
            GatewayError::Fetch(FetchError::Timeout) => {
                (StatusCode::GATEWAY_TIMEOUT, "Request timeout. Please try again.")
            }
            GatewayError::Fetch(_) => (StatusCode::BAD_GATEWAY, "Failed to fetch starships"),
            GatewayError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to save favorites"),
            GatewayError::NotFound(_) => (StatusCode::NOT_FOUND, "Favorite not found"),
        }
    } else if err.find::<warp::filters::body::BodyDeserializeError>().is_some()
        || err.find::<warp::reject::InvalidQuery>().is_some()
    {
        (StatusCode::BAD_REQUEST, "Bad request")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    } else {
        tracing::error!("unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    };

    Ok(warp::reply::with_status(message.to_string(), code))
}
