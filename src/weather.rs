//! Weather Lookup
//!
//! Thin client for the OpenWeatherMap 5-day / 3-hour forecast endpoint.
//! Only the first few 3-hour slots are shown on the dashboard.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Forecast slots returned per lookup
pub const FORECAST_SLOTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Provider-formatted local timestamp, e.g. "2024-06-01 12:00:00"
    pub time: String,
    pub temperature_c: f64,
    pub description: String,
}

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather API key is not configured")]
    NotConfigured,

    #[error("city name is empty")]
    EmptyCity,

    #[error("weather request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("weather provider returned HTTP {0}")]
    Status(u16),
}

#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn forecast(&self, city: &str) -> Result<Vec<ForecastEntry>, WeatherError>;
}

// ============================================================================
// OpenWeatherMap wire format
// ============================================================================

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastItem>,
}

#[derive(Debug, Deserialize)]
struct ForecastItem {
    dt_txt: String,
    main: MainReadings,
    #[serde(default)]
    weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

impl From<ForecastItem> for ForecastEntry {
    fn from(item: ForecastItem) -> Self {
        ForecastEntry {
            time: item.dt_txt,
            temperature_c: item.main.temp,
            description: item
                .weather
                .into_iter()
                .next()
                .map(|c| c.description)
                .unwrap_or_default(),
        }
    }
}

fn first_slots(response: ForecastResponse) -> Vec<ForecastEntry> {
    response
        .list
        .into_iter()
        .take(FORECAST_SLOTS)
        .map(ForecastEntry::from)
        .collect()
}

// ============================================================================
// Client
// ============================================================================

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenWeatherClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, WeatherError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn forecast(&self, city: &str) -> Result<Vec<ForecastEntry>, WeatherError> {
        let api_key = self.api_key.as_deref().ok_or(WeatherError::NotConfigured)?;
        let city = city.trim();
        if city.is_empty() {
            return Err(WeatherError::EmptyCity);
        }

        let url = format!("{}/data/2.5/forecast", self.base_url);
        tracing::debug!("Fetching forecast for '{}'", city);

        let response = self
            .http
            .get(&url)
            .query(&[("q", city), ("appid", api_key), ("units", "metric")])
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!("Forecast for '{}' failed with HTTP {}", city, response.status());
            return Err(WeatherError::Status(response.status().as_u16()));
        }

        let body: ForecastResponse = response.json().await?;
        Ok(first_slots(body))
    }
}
