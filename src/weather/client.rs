use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use super::types::{ForecastResponse, TimelinePayload};
use super::WeatherError;
use crate::config::Config;

/// Client for the upstream timeline weather API.
pub struct WeatherApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl WeatherApiClient {
    pub fn new(config: &Config) -> Result<Self, WeatherError> {
        let mut builder = Client::builder().user_agent("WeatherCacheServer/1.0");
        if let Some(secs) = config.weather_api_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.weather_api_url.clone(),
            api_key: config.weather_api_key.clone(),
        })
    }

    /// Builds `{base}/{location}[/{date1}][/{date2}]`, without the query string.
    pub fn timeline_url(&self, location: &str, date1: Option<&str>, date2: Option<&str>) -> String {
        let mut url = format!("{}/{}", self.base_url, urlencoding::encode(location));
        for date in [date1, date2].into_iter().flatten() {
            url.push('/');
            url.push_str(&urlencoding::encode(date));
        }
        url
    }

    pub async fn get_forecast(&self, city: &str) -> Result<ForecastResponse, WeatherError> {
        let url = self.timeline_url(city, None, None);
        let response = self.make_request(&url).await?;
        Ok(serde_json::from_value(response)?)
    }

    pub async fn get_timeline(
        &self,
        location: &str,
        date1: Option<&str>,
        date2: Option<&str>,
    ) -> Result<TimelinePayload, WeatherError> {
        let url = self.timeline_url(location, date1, date2);
        let response = self.make_request(&url).await?;
        Ok(serde_json::from_value(response)?)
    }

    async fn make_request(&self, url: &str) -> Result<Value, WeatherError> {
        tracing::debug!(url, "Requesting weather API");

        let response = self
            .client
            .get(url)
            .query(&[
                ("unitGroup", "metric"),
                ("key", self.api_key.as_str()),
                ("include", "days"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let status_text = status.canonical_reason().unwrap_or("Unknown").to_string();
            tracing::warn!(status = status.as_u16(), %status_text, "Weather API returned an error");
            return Err(WeatherError::Upstream {
                status: status.as_u16(),
                status_text,
            });
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_timeline_url_segments() {
        let client = WeatherApiClient::new(&Config::for_tests("http://api.test/timeline")).unwrap();

        assert_eq!(
            client.timeline_url("paris", None, None),
            "http://api.test/timeline/paris"
        );
        assert_eq!(
            client.timeline_url("New York", Some("2026-01-26"), None),
            "http://api.test/timeline/New%20York/2026-01-26"
        );
        assert_eq!(
            client.timeline_url("paris", Some("2026-01-26"), Some("2026-01-27")),
            "http://api.test/timeline/paris/2026-01-26/2026-01-27"
        );
        assert_eq!(
            client.timeline_url("a/b?c", None, None),
            "http://api.test/timeline/a%2Fb%3Fc"
        );
    }

    #[tokio::test]
    async fn test_get_forecast_sends_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/London"))
            .and(query_param("unitGroup", "metric"))
            .and(query_param("key", "test-key"))
            .and(query_param("include", "days"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "resolvedAddress": "London, England, United Kingdom",
                "days": [{ "datetime": "2026-01-25", "temp": 8.5, "humidity": 81.2, "conditions": "Rain" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = WeatherApiClient::new(&Config::for_tests(&server.uri())).unwrap();
        let forecast = client.get_forecast("London").await.unwrap();

        assert_eq!(forecast.resolved_address, "London, England, United Kingdom");
        assert_eq!(forecast.days.len(), 1);
        assert_eq!(forecast.days[0].conditions, "Rain");
    }

    #[tokio::test]
    async fn test_upstream_status_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("No account found"))
            .mount(&server)
            .await;

        let client = WeatherApiClient::new(&Config::for_tests(&server.uri())).unwrap();
        let err = client.get_timeline("paris", None, None).await.unwrap_err();

        match err {
            WeatherError::Upstream { status, status_text } => {
                assert_eq!(status, 401);
                assert_eq!(status_text, "Unauthorized");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
