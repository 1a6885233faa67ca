use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    cache::{CacheService, CacheStats},
    docs::ApiDoc,
    error::{AppError, AppResult},
    utils::{format_ttl, normalize_param, parse_ttl, require_key, Envelope, TtlStatus, ValidationError},
    weather::{
        service::WeatherService,
        types::{SourcedTimeline, SourcedWeather, TimelineParams},
    },
};

const DEFAULT_SEARCH_PATTERN: &str = "weather:*";

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub cache: CacheService,
    pub weather: Arc<WeatherService>,
}

// Request/Response types
#[derive(Debug, Deserialize)]
pub struct TimelinePath {
    pub location: String,
    #[serde(default)]
    pub date1: Option<String>,
    #[serde(default)]
    pub date2: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub pattern: Option<String>,
}

/// Body of `PUT /api/cache/{key}/ttl`. `ttl` stays untyped so a wrong type
/// reaches [`parse_ttl`] and gets its validation message.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTtlRequest {
    /// New time-to-live in seconds, greater than 0.
    #[schema(value_type = u64, minimum = 1)]
    pub ttl: Option<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    #[schema(value_type = String)]
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExistsData {
    pub exists: bool,
    pub key: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TtlData {
    pub key: String,
    pub ttl: i64,
    pub status: TtlStatus,
    pub human_readable: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateTtlData {
    pub updated: bool,
    pub key: String,
    #[serde(rename = "newTTL")]
    pub new_ttl: u64,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteData {
    pub deleted: bool,
    pub key: String,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct KeyInfoData {
    pub key: String,
    pub exists: bool,
    #[schema(value_type = Option<Object>)]
    pub value: Option<Value>,
    pub ttl: i64,
    pub size: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SearchData {
    pub pattern: String,
    pub keys: Vec<String>,
    pub count: usize,
}

// Route handlers
pub async fn root() -> &'static str {
    "Weather API Wrapper is running!"
}

#[utoipa::path(get, path = "/health", tag = "system",
    responses((status = 200, description = "Service is up", body = HealthResponse)))]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[utoipa::path(get, path = "/weather/{city}", tag = "weather",
    params(("city" = String, Path, description = "City name")),
    responses(
        (status = 200, description = "Current weather, tagged with its source", body = SourcedWeather),
        (status = 400, description = "City missing"),
        (status = 404, description = "No weather data for the city"),
    ))]
pub async fn get_weather(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> AppResult<Json<Envelope<SourcedWeather>>> {
    if city.trim().is_empty() {
        return Err(ValidationError::MissingCity.into());
    }

    let weather = state.weather.get_weather(&city).await?;
    Ok(Json(Envelope::success(weather)))
}

#[utoipa::path(get, path = "/weather/timeline/{location}", tag = "weather",
    params(("location" = String, Path, description = "Location to forecast")),
    responses(
        (status = 200, description = "Upstream timeline payload plus `source`"),
        (status = 400, description = "Location missing"),
    ))]
pub async fn get_timeline(
    State(state): State<AppState>,
    Path(path): Path<TimelinePath>,
) -> AppResult<Json<Envelope<SourcedTimeline>>> {
    if path.location.trim().is_empty() {
        return Err(ValidationError::MissingLocation.into());
    }

    let params = TimelineParams::new(path.location)
        .with_dates(normalize_param(path.date1), normalize_param(path.date2));

    let timeline = state.weather.get_timeline(&params).await?;
    Ok(Json(Envelope::success(timeline)))
}

#[utoipa::path(get, path = "/api/cache/keys/search", tag = "cache",
    params(("pattern" = Option<String>, Query, description = "Glob pattern, defaults to `weather:*`")),
    responses((status = 200, description = "Matching keys", body = SearchData)))]
pub async fn search_keys(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Envelope<SearchData>>> {
    let pattern = query
        .pattern
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_SEARCH_PATTERN.to_string());

    let keys = state.cache.search_keys(&pattern).await?;

    Ok(Json(Envelope::success(SearchData {
        pattern,
        count: keys.len(),
        keys,
    })))
}

#[utoipa::path(get, path = "/api/cache/stats", tag = "cache",
    responses((status = 200, description = "Key counts", body = CacheStats)))]
pub async fn cache_stats(State(state): State<AppState>) -> AppResult<Json<Envelope<CacheStats>>> {
    let stats = state.cache.stats().await?;
    Ok(Json(Envelope::success(stats)))
}

#[utoipa::path(get, path = "/api/cache/{key}/exists", tag = "cache",
    params(("key" = String, Path, description = "Cache key")),
    responses(
        (status = 200, description = "Whether the key exists", body = ExistsData),
        (status = 400, description = "Empty key"),
    ))]
pub async fn key_exists(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<Envelope<ExistsData>>> {
    let key = require_key(&key)?;
    let exists = state.cache.exists(key).await?;

    Ok(Json(Envelope::success(ExistsData {
        exists,
        key: key.to_string(),
    })))
}

#[utoipa::path(get, path = "/api/cache/{key}/ttl", tag = "cache",
    params(("key" = String, Path, description = "Cache key")),
    responses(
        (status = 200, description = "Remaining TTL and its status", body = TtlData),
        (status = 400, description = "Empty key"),
    ))]
pub async fn get_ttl(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<Envelope<TtlData>>> {
    let key = require_key(&key)?;
    let ttl = state.cache.get_ttl(key).await?;

    Ok(Json(Envelope::success(TtlData {
        key: key.to_string(),
        ttl,
        status: TtlStatus::from_ttl(ttl),
        human_readable: format_ttl(ttl),
    })))
}

#[utoipa::path(put, path = "/api/cache/{key}/ttl", tag = "cache",
    params(("key" = String, Path, description = "Cache key")),
    request_body = UpdateTtlRequest,
    responses(
        (status = 200, description = "Expiry updated", body = UpdateTtlData),
        (status = 400, description = "Empty key or invalid TTL"),
        (status = 404, description = "Key not found"),
    ))]
pub async fn update_ttl(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Option<Json<UpdateTtlRequest>>,
) -> AppResult<Json<Envelope<UpdateTtlData>>> {
    let key = require_key(&key)?;
    let ttl = parse_ttl(body.as_ref().and_then(|Json(b)| b.ttl.as_ref()))?;

    if !state.cache.exists(key).await? {
        return Err(AppError::NotFound("Cache key not found".to_string()));
    }

    let updated = state.cache.update_ttl(key, ttl).await?;
    let message = if updated {
        "TTL updated successfully"
    } else {
        "Failed to update TTL"
    };

    Ok(Json(Envelope::success(UpdateTtlData {
        updated,
        key: key.to_string(),
        new_ttl: ttl,
        message: message.to_string(),
    })))
}

#[utoipa::path(delete, path = "/api/cache/{key}", tag = "cache",
    params(("key" = String, Path, description = "Cache key")),
    responses(
        (status = 200, description = "Delete attempted; `deleted` tells whether anything was removed", body = DeleteData),
        (status = 400, description = "Empty key"),
    ))]
pub async fn delete_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<Envelope<DeleteData>>> {
    let key = require_key(&key)?;
    let deleted = state.cache.delete(key).await?;
    let message = if deleted {
        "Cache entry deleted successfully"
    } else {
        "Cache entry not found"
    };

    Ok(Json(Envelope::success(DeleteData {
        deleted,
        key: key.to_string(),
        message: message.to_string(),
    })))
}

#[utoipa::path(get, path = "/api/cache/{key}", tag = "cache",
    params(("key" = String, Path, description = "Cache key")),
    responses(
        (status = 200, description = "Existence, value, TTL and payload size", body = KeyInfoData),
        (status = 400, description = "Empty key"),
    ))]
pub async fn key_info(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<Envelope<KeyInfoData>>> {
    let key = require_key(&key)?;

    let (exists, value, ttl) = tokio::join!(
        state.cache.exists(key),
        state.cache.get::<Value>(key),
        state.cache.get_ttl(key),
    );
    let value = value?;
    let size = match &value {
        Some(v) => serde_json::to_string(v).map_err(anyhow::Error::from)?.len(),
        None => 0,
    };

    Ok(Json(Envelope::success(KeyInfoData {
        key: key.to_string(),
        exists: exists?,
        value,
        ttl: ttl?,
        size,
    })))
}

fn cache_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(cache_stats))
        .route("/keys/search", get(search_keys))
        .route("/:key/exists", get(key_exists))
        .route("/:key/ttl", get(get_ttl).put(update_ttl))
        .route("/:key", get(key_info).delete(delete_key))
}

// Create the router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/weather/:city", get(get_weather))
        .route("/weather/timeline/:location", get(get_timeline))
        .route("/weather/timeline/:location/:date1", get(get_timeline))
        .route("/weather/timeline/:location/:date1/:date2", get(get_timeline))
        .nest("/api/cache", cache_routes())
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
}
