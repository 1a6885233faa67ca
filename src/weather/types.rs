use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Normalized current-weather record, as cached under `weather:<city>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WeatherData {
    pub temp: f64,
    pub humidity: f64,
    pub description: String,
    pub city: String,
}

/// Where a returned record came from. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Cache,
    Api,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SourcedWeather {
    #[serde(flatten)]
    pub weather: WeatherData,
    pub source: Source,
}

/// Upstream timeline payload, kept verbatim.
pub type TimelinePayload = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct SourcedTimeline {
    pub payload: TimelinePayload,
    pub source: Source,
}

/// Payload fields followed by `source`, which replaces any upstream field of
/// the same name.
impl Serialize for SourcedTimeline {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in self.payload.iter().filter(|(key, _)| key.as_str() != "source") {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("source", &self.source)?;
        map.end()
    }
}

/// The subset of the upstream response the current-weather lookup reads.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResponse {
    #[serde(default)]
    pub resolved_address: String,
    #[serde(default)]
    pub days: Vec<DayEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DayEntry {
    pub temp: f64,
    pub humidity: f64,
    pub conditions: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimelineParams {
    pub location: String,
    pub date1: Option<String>,
    pub date2: Option<String>,
}

impl TimelineParams {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..Default::default()
        }
    }

    pub fn with_dates(mut self, date1: Option<String>, date2: Option<String>) -> Self {
        self.date1 = date1;
        self.date2 = date2;
        self
    }
}

impl ForecastResponse {
    /// Normalizes the first day entry, if any.
    pub fn current(&self) -> Option<WeatherData> {
        self.days.first().map(|today| WeatherData {
            temp: today.temp,
            humidity: today.humidity,
            description: today.conditions.clone(),
            city: self.resolved_address.clone(),
        })
    }
}
