use utoipa::OpenApi;

use crate::cache::CacheStats;
use crate::routes;
use crate::utils::{ResponseStatus, TtlStatus};
use crate::weather::types::{Source, SourcedWeather, WeatherData};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Weather Cache API",
        description = "Weather lookups fronted by a Redis cache, plus cache management endpoints. \
                       Every JSON response is wrapped as `{status, data?, message?}`."
    ),
    paths(
        routes::health,
        routes::get_weather,
        routes::get_timeline,
        routes::search_keys,
        routes::cache_stats,
        routes::key_exists,
        routes::get_ttl,
        routes::update_ttl,
        routes::delete_key,
        routes::key_info,
    ),
    components(schemas(
        routes::HealthResponse,
        routes::ExistsData,
        routes::TtlData,
        routes::UpdateTtlRequest,
        routes::UpdateTtlData,
        routes::DeleteData,
        routes::KeyInfoData,
        routes::SearchData,
        CacheStats,
        ResponseStatus,
        TtlStatus,
        Source,
        SourcedWeather,
        WeatherData,
    )),
    tags(
        (name = "weather", description = "Cached weather lookups"),
        (name = "cache", description = "Direct cache management"),
        (name = "system", description = "Liveness"),
    )
)]
pub struct ApiDoc;
