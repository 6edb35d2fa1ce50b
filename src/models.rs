//! Wire and display models for the irrigation backend.
//!
//! `Raw*` types mirror the backend's JSON field names exactly. Each one has a
//! `to_view()` mapping into the display-ready type that view models cache and
//! render. Keeping the two apart means a renamed backend field breaks one
//! mapping function and its tests, not every page.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ---

/// Parse a backend timestamp.
///
/// RFC 3339 is preferred. The backend also stores naive datetimes and sends
/// them without an offset (`2025-03-26T19:00:00.123000`); those are UTC.
pub fn parse_backend_time(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

fn backend_time<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(d)?;
    parse_backend_time(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
}

fn optional_backend_time<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    match Option::<String>::deserialize(d)? {
        None => Ok(None),
        Some(raw) => parse_backend_time(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'"))),
    }
}

/// Pump state as reported by the field controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PumpStatus {
    On,
    #[default]
    Off,
}

impl fmt::Display for PumpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PumpStatus::On => write!(f, "ON"),
            PumpStatus::Off => write!(f, "OFF"),
        }
    }
}

/// Raw sensor reading from `GET /api/sensors`.
///
/// The backend's row id is not displayed and is ignored when decoding.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSensorReading {
    // ---
    #[serde(deserialize_with = "backend_time")]
    pub timestamp: DateTime<Utc>,
    pub soil_moisture: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub pump_status: PumpStatus,
}

/// Display-ready sensor reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    // ---
    pub timestamp: DateTime<Utc>,
    pub soil_moisture_percent: f64,
    pub temperature_c: f64,
    pub humidity_percent: f64,
    pub pump_status: PumpStatus,
}

impl RawSensorReading {
    // ---
    pub fn to_view(&self) -> SensorReading {
        SensorReading {
            timestamp: self.timestamp,
            soil_moisture_percent: self.soil_moisture,
            temperature_c: self.temperature,
            humidity_percent: self.humidity,
            pump_status: self.pump_status,
        }
    }
}

/// Irrigation configuration, exchanged with `GET`/`POST /api/config`.
///
/// The record is replaced wholesale on every save. There is no version
/// token, so two operators saving at once will silently overwrite each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationConfig {
    // ---
    pub auto_mode: bool,

    #[serde(rename = "moisture_threshold")]
    pub moisture_threshold_percent: f64,

    pub manual_pump_state: bool,

    #[serde(default)]
    pub alert_mobile: String,

    #[serde(default)]
    pub alert_email: String,

    #[serde(default)]
    pub enable_sms: bool,

    #[serde(default)]
    pub enable_email: bool,

    /// Set by the backend; echoed back on save.
    #[serde(
        default,
        deserialize_with = "optional_backend_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for IrrigationConfig {
    /// Matches what the backend serves before any config was ever saved.
    fn default() -> Self {
        Self {
            auto_mode: true,
            moisture_threshold_percent: 40.0,
            manual_pump_state: false,
            alert_mobile: String::new(),
            alert_email: String::new(),
            enable_sms: false,
            enable_email: false,
            updated_at: None,
        }
    }
}

impl IrrigationConfig {
    /// What the pump panel shows: `AUTO`, or the manual pump state.
    pub fn pump_label(&self) -> &'static str {
        match (self.auto_mode, self.manual_pump_state) {
            (true, _) => "AUTO",
            (false, true) => "ON",
            (false, false) => "OFF",
        }
    }
}

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertType {
    #[serde(alias = "info")]
    Info,
    #[serde(alias = "warning")]
    Warning,
    #[serde(alias = "critical")]
    Critical,
}

impl AlertType {
    pub const ALL: [AlertType; 3] = [AlertType::Info, AlertType::Warning, AlertType::Critical];
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertType::Info => write!(f, "Info"),
            AlertType::Warning => write!(f, "Warning"),
            AlertType::Critical => write!(f, "Critical"),
        }
    }
}

/// Alert ids arrive as numbers from some backends and strings from others.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawAlertId {
    Number(u64),
    Text(String),
}

impl fmt::Display for RawAlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawAlertId::Number(n) => write!(f, "{n}"),
            RawAlertId::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Raw alert from `GET /api/alerts`
#[derive(Debug, Clone, Deserialize)]
pub struct RawAlert {
    // ---
    pub id: RawAlertId,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub message: String,
    #[serde(deserialize_with = "backend_time")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

/// Display-ready alert.
///
/// `read` is the backend's acknowledgement flag. It is not a "resolved"
/// state and is never treated as one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    // ---
    pub id: String,
    pub severity: AlertType,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

impl RawAlert {
    // ---
    pub fn to_view(&self) -> Alert {
        Alert {
            id: self.id.to_string(),
            severity: self.alert_type,
            message: self.message.clone(),
            timestamp: self.timestamp,
            read: self.read,
        }
    }
}

/// Reachability of one subsystem
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Health {
    #[serde(alias = "online", alias = "ONLINE")]
    Online,
    #[default]
    #[serde(alias = "offline", alias = "OFFLINE")]
    Offline,
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Health::Online => write!(f, "Online"),
            Health::Offline => write!(f, "Offline"),
        }
    }
}

/// System health snapshot from `GET /api/status`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemHealth {
    pub database: Health,
    pub esp32: Health,
    pub api: Health,
}
