use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::errors::FetchError;
use crate::services::{CatalogTransport, FavoritesStore, RemoteResourceCache};

/// A starship as served by the catalog endpoint. Identity is `url`.
///
/// Numeric-looking fields are free-form strings upstream ("unknown", "n/a",
/// "1,000") and are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CatalogItem {
    pub name: String,
    pub model: String,
    pub manufacturer: String,
    pub cost_in_credits: String,
    pub length: String,
    pub max_atmosphering_speed: String,
    pub crew: String,
    pub passengers: String,
    pub cargo_capacity: String,
    pub consumables: String,
    pub hyperdrive_rating: String,
    #[serde(rename = "MGLT")]
    pub mglt: String,
    pub starship_class: String,
    pub pilots: Vec<String>,
    pub films: Vec<String>,
    pub created: String,
    pub edited: String,
    pub url: String,
}

const UNKNOWN_STAR_RATING: u8 = 4;

impl CatalogItem {
    /// Star rating derived from the hyperdrive class; lower classes are faster.
    pub fn star_rating(&self) -> u8 {
        match parse_float_prefix(&self.hyperdrive_rating) {
            None => UNKNOWN_STAR_RATING,
            Some(h) if h <= 1.0 => 5,
            Some(h) if h <= 2.0 => 4,
            Some(h) if h <= 3.0 => 3,
            Some(h) if h <= 4.0 => 2,
            Some(_) => 1,
        }
    }

    pub fn passengers_display(&self) -> String {
        match self.passengers.as_str() {
            "n/a" | "unknown" => "Unknown".to_string(),
            other => other.replace(',', ""),
        }
    }
}

/// Lenient float parsing: reads the longest numeric prefix after leading
/// whitespace, so `"2.0 (class)"` yields `2.0` and `"unknown"` yields `None`.
pub fn parse_float_prefix(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}

/// A catalog item the user selected, with free-text notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    #[serde(flatten)]
    pub item: CatalogItem,
    #[serde(default)]
    pub notes: String,
}

impl FavoriteEntry {
    pub fn new(item: CatalogItem) -> Self {
        Self {
            item,
            notes: String::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.item.url
    }
}

/// Body shapes the catalog endpoint may return. Both normalize to a flat list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CatalogPayload {
    List(Vec<CatalogItem>),
    /// `{count, next, previous, results}` as served by paginated APIs.
    Envelope {
        #[serde(default)]
        next: Option<String>,
        results: Vec<CatalogItem>,
    },
}

impl CatalogPayload {
    pub fn parse(body: &[u8]) -> Result<Vec<CatalogItem>, FetchError> {
        let payload: CatalogPayload =
            serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))?;
        Ok(payload.into_items())
    }

    pub fn into_items(self) -> Vec<CatalogItem> {
        match self {
            Self::List(items) => items,
            Self::Envelope { next, results } => {
                if next.is_some() {
                    tracing::warn!(
                        next = ?next,
                        "catalog envelope is paginated upstream; only the first page is kept"
                    );
                }
                results
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    Empty,
    Loading,
    Fresh,
    Stale,
    Error,
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub status: CacheStatus,
    pub payload: Option<Arc<Vec<CatalogItem>>>,
    pub fetched_at: Option<Instant>,
    /// Attempt number of the in-flight fetch (0 when idle).
    pub attempt: u32,
    pub error: Option<FetchError>,
    /// Incremented every time a fetch sequence finishes, successfully or not.
    pub generation: u64,
    pub observers: usize,
    pub idle_since: Option<Instant>,
    /// Set by `invalidate` so the next read treats fresh data as stale.
    pub invalidated: bool,
}

impl CacheEntry {
    pub fn new() -> Self {
        Self {
            status: CacheStatus::Empty,
            payload: None,
            fetched_at: None,
            attempt: 0,
            error: None,
            generation: 0,
            observers: 0,
            idle_since: None,
            invalidated: false,
        }
    }
}

impl Default for CacheEntry {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide services handed to the HTTP boundary.
pub struct AppState<T> {
    pub catalog: RemoteResourceCache<T>,
    pub favorites: FavoritesStore,
}

impl<T: CatalogTransport> AppState<T> {
    pub fn new(catalog: RemoteResourceCache<T>, favorites: FavoritesStore) -> Self {
        Self { catalog, favorites }
    }
}
