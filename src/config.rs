use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

pub const DEFAULT_TTL_SECONDS: u64 = 43_200;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub redis_url: String,
    pub redis_ttl_seconds: u64,
    pub weather_api_url: String,
    pub weather_api_key: String,
    pub weather_api_timeout_secs: Option<u64>,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source. Fails when the upstream API
    /// or the Redis URL is not configured.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let present = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let (weather_api_url, weather_api_key) =
            match (present("WEATHER_API_URL"), present("WEATHER_API_KEY")) {
                (Some(url), Some(key)) => (url, key),
                _ => anyhow::bail!("Missing WEATHER_API_KEY or WEATHER_API_URL in environment"),
            };

        Ok(Config {
            redis_url: present("REDIS_URL").ok_or_else(|| anyhow::anyhow!("REDIS_URL not set"))?,
            redis_ttl_seconds: parse_var(&lookup, "REDIS_TTL_SECONDS")?
                .unwrap_or(DEFAULT_TTL_SECONDS),
            weather_api_url: weather_api_url.trim_end_matches('/').to_string(),
            weather_api_key,
            weather_api_timeout_secs: parse_var(&lookup, "WEATHER_API_TIMEOUT_SECS")?,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_var(&lookup, "PORT")?.unwrap_or(3000),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> anyhow::Result<Option<T>> {
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("{name} must be a valid number, got {raw:?}")),
        None => Ok(None),
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests(weather_api_url: &str) -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            redis_ttl_seconds: DEFAULT_TTL_SECONDS,
            weather_api_url: weather_api_url.to_string(),
            weather_api_key: "test-key".to_string(),
            weather_api_timeout_secs: Some(5),
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("REDIS_URL", "redis://localhost:6379"),
        ("WEATHER_API_URL", "https://weather.example/timeline/"),
        ("WEATHER_API_KEY", "secret"),
    ];

    fn without(name: &str) -> Vec<(&'static str, &'static str)> {
        REQUIRED.into_iter().filter(|(k, _)| *k != name).collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(config.redis_url, "redis://localhost:6379");
        assert_eq!(config.redis_ttl_seconds, DEFAULT_TTL_SECONDS);
        assert_eq!(config.weather_api_url, "https://weather.example/timeline");
        assert_eq!(config.weather_api_key, "secret");
        assert_eq!(config.weather_api_timeout_secs, None);
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_missing_weather_settings_fail_fast() {
        for name in ["WEATHER_API_URL", "WEATHER_API_KEY"] {
            let err = Config::from_lookup(lookup(&without(name))).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Missing WEATHER_API_KEY or WEATHER_API_URL in environment"
            );

            let mut blank = without(name);
            blank.push((name, ""));
            assert!(Config::from_lookup(lookup(&blank)).is_err());
        }
    }

    #[test]
    fn test_missing_redis_url_fails() {
        let err = Config::from_lookup(lookup(&without("REDIS_URL"))).unwrap_err();
        assert_eq!(err.to_string(), "REDIS_URL not set");
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("REDIS_TTL_SECONDS", "600"),
            ("WEATHER_API_TIMEOUT_SECS", " 10 "),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
        ]);
        let config = Config::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.redis_ttl_seconds, 600);
        assert_eq!(config.weather_api_timeout_secs, Some(10));
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");

        let mut vars = REQUIRED.to_vec();
        vars.push(("PORT", "twelve"));
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("PORT must be a valid number"));
    }
}
