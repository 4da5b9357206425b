//! Daily forecasts for the stay window, from Open-Meteo when reachable.
//!
//! Exactly one live request is made per plan. Any transport or decode
//! failure falls back to a simulated forecast so planning never blocks on
//! the network.

use std::time::Duration;

use chrono::{Duration as ChronoDuration, NaiveDate};
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use wayfarer_core::gazetteer::coordinates;
use wayfarer_core::models::{DayForecast, WeatherReport};

const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("no coordinates on file for city '{0}'")]
    UnknownCity(String),
    #[error("failed to build the http client: {0}")]
    Client(#[from] reqwest::Error),
}

pub struct WeatherService {
    client: reqwest::Client,
    base_url: String,
}

impl WeatherService {
    pub fn new() -> Result<Self, WeatherError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Forecast for `num_days` starting at `start`. Fails only when the city
    /// has no coordinates; a live-source failure degrades to simulated data.
    pub async fn forecast(
        &self,
        city: &str,
        start: NaiveDate,
        num_days: u8,
    ) -> Result<WeatherReport, WeatherError> {
        let (latitude, longitude) =
            coordinates(city).ok_or_else(|| WeatherError::UnknownCity(city.to_string()))?;

        let forecast = match self.fetch_live(latitude, longitude, start, num_days).await {
            Ok(forecast) => forecast,
            Err(error) => {
                warn!(%city, %error, "live forecast failed, simulating");
                return Ok(simulated_report(city, start, num_days));
            }
        };

        Ok(build_report(city, forecast, false))
    }

    async fn fetch_live(
        &self,
        latitude: f64,
        longitude: f64,
        start: NaiveDate,
        num_days: u8,
    ) -> Result<Vec<DayForecast>, reqwest::Error> {
        let end = start + ChronoDuration::days(i64::from(num_days.max(1)) - 1);
        let url = format!("{}/v1/forecast", self.base_url);
        let response: OpenMeteoResponse = self
            .client
            .get(url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                (
                    "daily",
                    "weathercode,temperature_2m_max,temperature_2m_min,precipitation_probability_max"
                        .to_string(),
                ),
                ("timezone", "auto".to_string()),
                ("start_date", start.to_string()),
                ("end_date", end.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.into_days())
    }
}

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    daily: OpenMeteoDaily,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoDaily {
    time: Vec<NaiveDate>,
    weathercode: Vec<u16>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
    #[serde(default)]
    precipitation_probability_max: Vec<u8>,
}

impl OpenMeteoResponse {
    fn into_days(self) -> Vec<DayForecast> {
        let daily = self.daily;
        daily
            .time
            .iter()
            .enumerate()
            .map(|(idx, date)| DayForecast {
                date: *date,
                condition: condition_from_code(daily.weathercode.get(idx).copied().unwrap_or(0))
                    .to_string(),
                temperature_max: daily.temperature_2m_max.get(idx).copied().unwrap_or(30.0),
                temperature_min: daily.temperature_2m_min.get(idx).copied().unwrap_or(22.0),
                precipitation_chance: daily
                    .precipitation_probability_max
                    .get(idx)
                    .copied()
                    .unwrap_or(0),
            })
            .collect()
    }
}

/// WMO weather interpretation codes, grouped to display strings.
fn condition_from_code(code: u16) -> &'static str {
    match code {
        0 => "Clear",
        1 => "Mainly Clear",
        2 => "Partly Cloudy",
        3 => "Overcast",
        45 | 48 => "Foggy",
        51 | 53 | 55 => "Drizzle",
        61 | 63 => "Light Rain",
        65 => "Heavy Rain",
        80 | 81 | 82 => "Rain Showers",
        95 | 96 | 99 => "Thunderstorm",
        _ => "Partly Cloudy",
    }
}

/// Plausible stand-in forecast when the live source is unreachable.
pub fn simulated_report(city: &str, start: NaiveDate, num_days: u8) -> WeatherReport {
    const PATTERNS: [(&str, f64, f64); 4] = [
        ("Sunny", 33.0, 24.0),
        ("Partly Cloudy", 30.0, 23.0),
        ("Overcast", 28.0, 22.0),
        ("Light Rain", 27.0, 21.0),
    ];

    let mut rng = rand::rng();
    let forecast: Vec<DayForecast> = (0..i64::from(num_days.max(1)))
        .map(|offset| {
            let (condition, max, min) = PATTERNS[rng.random_range(0..PATTERNS.len())];
            DayForecast {
                date: start + ChronoDuration::days(offset),
                condition: condition.to_string(),
                temperature_max: max + rng.random_range(-2.0..=2.0),
                temperature_min: min + rng.random_range(-2.0..=2.0),
                precipitation_chance: if condition.contains("Rain") {
                    rng.random_range(40..=70)
                } else {
                    rng.random_range(0..=30)
                },
            }
        })
        .collect();

    build_report(city, forecast, true)
}

fn build_report(city: &str, forecast: Vec<DayForecast>, simulated: bool) -> WeatherReport {
    let summary = summarize(&forecast);
    let recommendations = recommendations(&forecast);
    WeatherReport {
        city: city.to_string(),
        forecast,
        summary,
        recommendations,
        simulated,
    }
}

fn summarize(forecast: &[DayForecast]) -> String {
    if forecast.is_empty() {
        return "No forecast available.".to_string();
    }

    let avg_high =
        forecast.iter().map(|d| d.temperature_max).sum::<f64>() / forecast.len() as f64;
    let avg_low = forecast.iter().map(|d| d.temperature_min).sum::<f64>() / forecast.len() as f64;

    // Most frequent condition across the window, ties broken by first seen.
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for day in forecast {
        match counts.iter_mut().find(|(name, _)| *name == day.condition) {
            Some((_, count)) => *count += 1,
            None => counts.push((&day.condition, 1)),
        }
    }
    let dominant = counts
        .iter()
        .max_by_key(|(_, count)| *count)
        .map(|(name, _)| *name)
        .unwrap_or("Partly Cloudy");

    format!("Mostly {dominant}, highs around {avg_high:.1}°C and lows around {avg_low:.1}°C.")
}

fn recommendations(forecast: &[DayForecast]) -> Vec<String> {
    let mut notes = Vec::new();

    if forecast.iter().any(|d| d.temperature_max > 30.0) {
        notes.push("Hot afternoons expected: carry sunscreen and stay hydrated.".to_string());
    }
    if forecast.iter().any(|d| d.temperature_min < 20.0) {
        notes.push("Cool evenings expected: pack a light jacket.".to_string());
    }
    if forecast.iter().any(|d| is_rainy(&d.condition)) {
        notes.push("Rain is likely on some days: keep an umbrella handy.".to_string());
    }
    if forecast.iter().any(|d| is_clear(&d.condition)) {
        notes.push("Clear skies on some days: great for outdoor sightseeing.".to_string());
    }
    if notes.is_empty() {
        notes.push("Pleasant weather expected throughout the stay.".to_string());
    }

    notes
}

fn is_rainy(condition: &str) -> bool {
    let lower = condition.to_lowercase();
    ["rain", "drizzle", "shower", "thunder"]
        .iter()
        .any(|word| lower.contains(word))
}

fn is_clear(condition: &str) -> bool {
    let lower = condition.to_lowercase();
    lower.contains("clear") || lower.contains("sunny")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(condition: &str, max: f64, min: f64) -> DayForecast {
        DayForecast {
            date: NaiveDate::from_ymd_opt(2026, 9, 15).unwrap(),
            condition: condition.to_string(),
            temperature_max: max,
            temperature_min: min,
            precipitation_chance: 10,
        }
    }

    #[test]
    fn wmo_codes_map_to_display_conditions() {
        assert_eq!(condition_from_code(0), "Clear");
        assert_eq!(condition_from_code(3), "Overcast");
        assert_eq!(condition_from_code(61), "Light Rain");
        assert_eq!(condition_from_code(95), "Thunderstorm");
        assert_eq!(condition_from_code(42), "Partly Cloudy");
    }

    #[test]
    fn recommendation_thresholds() {
        let notes = recommendations(&[day("Clear", 34.0, 25.0)]);
        assert!(notes.iter().any(|n| n.contains("sunscreen")));
        assert!(notes.iter().any(|n| n.contains("outdoor")));

        let notes = recommendations(&[day("Light Rain", 26.0, 18.0)]);
        assert!(notes.iter().any(|n| n.contains("umbrella")));
        assert!(notes.iter().any(|n| n.contains("jacket")));

        let notes = recommendations(&[day("Overcast", 28.0, 22.0)]);
        assert_eq!(notes.len(), 1);
        assert!(notes[0].contains("Pleasant"));
    }

    #[test]
    fn simulated_forecast_covers_the_whole_stay() {
        let start = NaiveDate::from_ymd_opt(2026, 9, 15).unwrap();
        let report = simulated_report("Goa", start, 4);
        assert!(report.simulated);
        assert_eq!(report.forecast.len(), 4);
        assert_eq!(report.forecast[0].date, start);
        assert_eq!(report.forecast[3].date, start + ChronoDuration::days(3));
        assert!(!report.recommendations.is_empty());
    }

    #[tokio::test]
    async fn unknown_city_is_an_error() {
        let service = WeatherService::new().expect("client builds");
        let start = NaiveDate::from_ymd_opt(2026, 9, 15).unwrap();
        let result = service.forecast("Atlantis", start, 3).await;
        assert!(matches!(result, Err(WeatherError::UnknownCity(_))));
    }
}
