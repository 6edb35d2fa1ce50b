//! Current weather from Open-Meteo and the WMO code table.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::decode;
use crate::error::FetchError;
use crate::io::HttpClient;

// ---

/// Which icon set to use for a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPhase {
    Day,
    Night,
}

/// A coarse condition derived from a WMO weather code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condition {
    pub text: &'static str,
    pub icon: &'static str,
    pub phase: DayPhase,
}

/// (codes, text, day icon, night icon)
const WMO_TABLE: &[(&[u16], &str, &str, &str)] = &[
    (&[0], "Clear", "Sun", "Moon"),
    (&[1, 2], "Partly Cloudy", "CloudSun", "CloudMoon"),
    (&[3], "Cloudy", "Cloud", "Cloud"),
    (&[45, 48], "Fog", "CloudFog", "CloudFog"),
    (&[51, 53, 55], "Drizzle", "CloudDrizzle", "CloudDrizzle"),
    (&[56, 57], "Freezing Drizzle", "CloudDrizzle", "CloudDrizzle"),
    (&[61, 63, 65], "Rain", "CloudRain", "CloudRain"),
    (&[66, 67], "Freezing Rain", "CloudRain", "CloudRain"),
    (&[71, 73, 75, 77], "Snow", "CloudSnow", "CloudSnow"),
    (&[80, 81, 82], "Rain Showers", "CloudRain", "CloudRain"),
    (&[85, 86], "Snow Showers", "CloudSnow", "CloudSnow"),
    (&[95, 96, 99], "Thunderstorm", "CloudLightning", "CloudLightning"),
];

/// Map a WMO weather code to condition text and icon.
///
/// Unknown codes fall back to "Clear".
pub fn condition_for(code: u16, is_day: bool) -> Condition {
    // ---
    let phase = if is_day { DayPhase::Day } else { DayPhase::Night };
    let (text, day_icon, night_icon) = WMO_TABLE
        .iter()
        .find(|(codes, ..)| codes.contains(&code))
        .map(|(_, text, day, night)| (*text, *day, *night))
        .unwrap_or(("Clear", "Sun", "Moon"));

    Condition {
        text,
        icon: if is_day { day_icon } else { night_icon },
        phase,
    }
}

/// Irrigation advice derived from the chance of rain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Postpone,
    Monitor,
    SafeToIrrigate,
}

impl Recommendation {
    pub fn from_rain_probability(percent: u8) -> Self {
        match percent {
            p if p > 60 => Recommendation::Postpone,
            p if p > 30 => Recommendation::Monitor,
            _ => Recommendation::SafeToIrrigate,
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            Recommendation::Postpone => "Postpone Irrigation",
            Recommendation::Monitor => "Monitor Weather",
            Recommendation::SafeToIrrigate => "Safe to Irrigate",
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Recommendation::Postpone => "High probability of rain expected",
            Recommendation::Monitor => "Moderate rain probability, check forecast before irrigating",
            Recommendation::SafeToIrrigate => "Low rain probability, proceed with scheduled irrigation",
        }
    }
}

/// Display-ready current weather, cached under `dashboard_weather`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature_c: f64,
    pub weather_code: u16,
    pub is_day: bool,
    pub rain_probability: Option<u8>,
    pub condition: String,
    pub icon: String,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl Default for WeatherSnapshot {
    fn default() -> Self {
        let condition = condition_for(0, true);
        Self {
            temperature_c: 0.0,
            weather_code: 0,
            is_day: true,
            rain_probability: None,
            condition: condition.text.to_string(),
            icon: condition.icon.to_string(),
            fetched_at: None,
        }
    }
}

impl WeatherSnapshot {
    /// `None` until the provider has reported a rain probability.
    pub fn recommendation(&self) -> Option<Recommendation> {
        self.rain_probability
            .map(Recommendation::from_rain_probability)
    }
}

/// Raw Open-Meteo `current` block
#[derive(Debug, Deserialize)]
struct RawCurrent {
    temperature_2m: f64,
    weather_code: u16,
    is_day: u8,
    #[serde(default)]
    precipitation_probability: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawForecast {
    current: RawCurrent,
}

impl RawCurrent {
    fn to_view(&self, fetched_at: DateTime<Utc>) -> WeatherSnapshot {
        // ---
        let is_day = self.is_day != 0;
        let condition = condition_for(self.weather_code, is_day);
        WeatherSnapshot {
            temperature_c: self.temperature_2m,
            weather_code: self.weather_code,
            is_day,
            rain_probability: self
                .precipitation_probability
                .map(|p| p.round().clamp(0.0, 100.0) as u8),
            condition: condition.text.to_string(),
            icon: condition.icon.to_string(),
            fetched_at: Some(fetched_at),
        }
    }
}

/// Farm coordinates for the weather lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Open-Meteo client
#[derive(Clone)]
pub struct WeatherClient {
    base_url: String,
    location: Option<Location>,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for WeatherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherClient")
            .field("base_url", &self.base_url)
            .field("location", &self.location)
            .finish()
    }
}

impl WeatherClient {
    pub fn new(base_url: &str, location: Option<Location>, http: Arc<dyn HttpClient>) -> Self {
        Self {
            base_url: base_url.to_string(),
            location,
            http,
        }
    }

    /// Fetch current conditions for the configured location.
    pub async fn current(&self) -> Result<WeatherSnapshot, FetchError> {
        // ---
        let location = self.location.ok_or_else(|| {
            FetchError::LocationUnavailable(
                "set WEATHER_LATITUDE and WEATHER_LONGITUDE to enable weather".to_string(),
            )
        })?;

        let url = format!(
            "{}?latitude={}&longitude={}&current=temperature_2m,weather_code,is_day,precipitation_probability",
            self.base_url, location.latitude, location.longitude
        );

        let response = self.http.get(&url).await?;
        let raw: RawForecast = decode(&url, response)?;
        Ok(raw.current.to_view(Utc::now()))
    }
}
