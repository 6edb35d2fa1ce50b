//! Threshold-based status classification shared by every page.
//!
//! The dashboard stat cards, the sensor table badges and the sensor status
//! filter all go through [`Thresholds::classify`], so a value is never shown
//! as "Normal" on one page and "Critical" on another.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::SensorReading;

// ---

/// Status category of a single metric or a whole reading.
///
/// Ordered by severity so `max()` picks the worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorStatus {
    Normal,
    Warning,
    Critical,
}

impl SensorStatus {
    pub const ALL: [SensorStatus; 3] = [
        SensorStatus::Normal,
        SensorStatus::Warning,
        SensorStatus::Critical,
    ];
}

impl fmt::Display for SensorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorStatus::Normal => write!(f, "Normal"),
            SensorStatus::Warning => write!(f, "Warning"),
            SensorStatus::Critical => write!(f, "Critical"),
        }
    }
}

/// Acceptable band for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
    /// How far outside `[min, max]` a value may drift before it is critical.
    pub margin: f64,
}

impl Band {
    pub const fn new(min: f64, max: f64, margin: f64) -> Self {
        Self { min, max, margin }
    }

    pub fn classify(&self, value: f64) -> SensorStatus {
        // ---
        if value < self.min - self.margin || value > self.max + self.margin {
            SensorStatus::Critical
        } else if value < self.min || value > self.max {
            SensorStatus::Warning
        } else {
            SensorStatus::Normal
        }
    }
}

/// Which metric a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    SoilMoisture,
    Temperature,
    Humidity,
}

/// Calibration bands for every metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub soil_moisture: Band,
    pub temperature: Band,
    pub humidity: Band,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            soil_moisture: Band::new(30.0, 70.0, 10.0),
            temperature: Band::new(20.0, 35.0, 5.0),
            humidity: Band::new(50.0, 80.0, 10.0),
        }
    }
}

impl Thresholds {
    pub fn band(&self, metric: Metric) -> &Band {
        match metric {
            Metric::SoilMoisture => &self.soil_moisture,
            Metric::Temperature => &self.temperature,
            Metric::Humidity => &self.humidity,
        }
    }

    pub fn classify(&self, metric: Metric, value: f64) -> SensorStatus {
        self.band(metric).classify(value)
    }

    /// Worst status across the three metrics of a reading.
    pub fn reading_status(&self, reading: &SensorReading) -> SensorStatus {
        [
            self.classify(Metric::SoilMoisture, reading.soil_moisture_percent),
            self.classify(Metric::Temperature, reading.temperature_c),
            self.classify(Metric::Humidity, reading.humidity_percent),
        ]
        .into_iter()
        .max()
        .unwrap_or(SensorStatus::Normal)
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::PumpStatus;
    use chrono::Utc;

    fn reading(moisture: f64, temp: f64, humidity: f64) -> SensorReading {
        // ---
        SensorReading {
            timestamp: Utc::now(),
            soil_moisture_percent: moisture,
            temperature_c: temp,
            humidity_percent: humidity,
            pump_status: PumpStatus::Off,
        }
    }

    #[test]
    fn test_band_edges() {
        // ---
        let band = Band::new(20.0, 35.0, 5.0);

        // Inclusive bounds
        assert_eq!(band.classify(20.0), SensorStatus::Normal);
        assert_eq!(band.classify(35.0), SensorStatus::Normal);

        assert_eq!(band.classify(36.0), SensorStatus::Warning);
        assert_eq!(band.classify(40.0), SensorStatus::Warning);
        assert_eq!(band.classify(40.1), SensorStatus::Critical);

        assert_eq!(band.classify(15.0), SensorStatus::Warning);
        assert_eq!(band.classify(14.9), SensorStatus::Critical);
    }

    #[test]
    fn test_hot_temperature_is_critical() {
        // ---
        let t = Thresholds::default();
        assert_eq!(t.classify(Metric::Temperature, 42.1), SensorStatus::Critical);
        assert_eq!(t.classify(Metric::Temperature, 28.5), SensorStatus::Normal);
    }

    #[test]
    fn test_reading_status_is_worst_metric() {
        // ---
        let t = Thresholds::default();
        assert_eq!(t.reading_status(&reading(45.0, 28.0, 65.0)), SensorStatus::Normal);
        assert_eq!(t.reading_status(&reading(25.0, 28.0, 65.0)), SensorStatus::Warning);
        assert_eq!(t.reading_status(&reading(25.0, 42.1, 65.0)), SensorStatus::Critical);
    }
}
