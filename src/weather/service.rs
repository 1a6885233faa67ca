//! Cache-then-upstream retrieval for current and timeline weather.
//!
//! Concurrent misses on the same key each call upstream; the last write wins.

use super::client::WeatherApiClient;
use super::types::{Source, SourcedTimeline, SourcedWeather, TimelineParams, TimelinePayload, WeatherData};
use super::WeatherError;
use crate::cache::CacheService;

const KEY_PREFIX: &str = "weather";
const TIMELINE_SEGMENT: &str = "timeline";
const FORECAST_PLACEHOLDER: &str = "forecast";

pub fn current_cache_key(city: &str) -> String {
    format!("{KEY_PREFIX}:{}", escape_key_part(&city.to_lowercase()))
}

/// `weather:timeline:<location>:<date1|forecast>:<date2|>`.
pub fn timeline_cache_key(params: &TimelineParams) -> String {
    [
        KEY_PREFIX.to_string(),
        TIMELINE_SEGMENT.to_string(),
        escape_key_part(&params.location.to_lowercase()),
        params
            .date1
            .as_deref()
            .map_or_else(|| FORECAST_PLACEHOLDER.to_string(), escape_key_part),
        params.date2.as_deref().map(escape_key_part).unwrap_or_default(),
    ]
    .join(":")
}

// Keeps the separator unambiguous when user input contains ':'.
fn escape_key_part(part: &str) -> String {
    part.replace('%', "%25").replace(':', "%3A")
}

pub struct WeatherService {
    cache: CacheService,
    client: WeatherApiClient,
}

impl WeatherService {
    pub fn new(cache: CacheService, client: WeatherApiClient) -> Self {
        Self { cache, client }
    }

    pub async fn get_weather(&self, city: &str) -> Result<SourcedWeather, WeatherError> {
        let key = current_cache_key(city);

        if let Some(weather) = self.cache.get::<WeatherData>(&key).await? {
            tracing::debug!(%key, "Cache hit");
            return Ok(SourcedWeather { weather, source: Source::Cache });
        }
        tracing::debug!(%key, "Cache miss");

        let forecast = self.client.get_forecast(city).await?;
        let weather = forecast
            .current()
            .ok_or_else(|| WeatherError::DataUnavailable(city.to_string()))?;

        self.cache.set(&key, &weather, None).await?;

        Ok(SourcedWeather { weather, source: Source::Api })
    }

    pub async fn get_timeline(&self, params: &TimelineParams) -> Result<SourcedTimeline, WeatherError> {
        let key = timeline_cache_key(params);

        if let Some(payload) = self.cache.get::<TimelinePayload>(&key).await? {
            tracing::debug!(%key, "Cache hit");
            return Ok(SourcedTimeline { payload, source: Source::Cache });
        }
        tracing::debug!(%key, "Cache miss");

        let payload = self
            .client
            .get_timeline(
                &params.location,
                params.date1.as_deref(),
                params.date2.as_deref(),
            )
            .await?;

        self.cache.set(&key, &payload, None).await?;

        Ok(SourcedTimeline { payload, source: Source::Api })
    }
}
