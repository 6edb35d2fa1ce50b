//! Plain-text rendering of each page.
//!
//! Renderers are pure: they take snapshots and return a `String`, so the
//! binary decides where it goes and tests can assert on it directly.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::cache::Theme;
use crate::models::{Alert, AlertType, Health, IrrigationConfig, SensorReading, SystemHealth};
use crate::pages::analytics::{self, DateRange};
use crate::pages::dashboard::{stat_cards, DashboardStats};
use crate::pages::irrigation::{Toast, ToastLevel};
use crate::pages::sensors::{sensor_rows, status_counts};
use crate::poller::FeedStatus;
use crate::status::{Metric, SensorStatus, Thresholds};
use crate::weather::WeatherSnapshot;

// ---

/// Colour settings for one render pass.
#[derive(Debug, Clone, Copy)]
pub struct Style {
    pub color: bool,
    pub theme: Theme,
}

#[derive(Debug, Clone, Copy)]
enum Tone {
    Good,
    Warn,
    Bad,
    Muted,
}

impl Style {
    pub fn plain() -> Self {
        Self {
            color: false,
            theme: Theme::Light,
        }
    }

    fn paint(&self, tone: Tone, text: &str) -> String {
        // ---
        if !self.color {
            return text.to_string();
        }
        let code = match (tone, self.theme) {
            (Tone::Good, Theme::Light) => "32",
            (Tone::Good, Theme::Dark) => "92",
            (Tone::Warn, Theme::Light) => "33",
            (Tone::Warn, Theme::Dark) => "93",
            (Tone::Bad, Theme::Light) => "31",
            (Tone::Bad, Theme::Dark) => "91",
            (Tone::Muted, Theme::Light) => "90",
            (Tone::Muted, Theme::Dark) => "37",
        };
        format!("\x1b[{code}m{text}\x1b[0m")
    }

    fn status(&self, status: SensorStatus) -> String {
        let tone = match status {
            SensorStatus::Normal => Tone::Good,
            SensorStatus::Warning => Tone::Warn,
            SensorStatus::Critical => Tone::Bad,
        };
        self.paint(tone, &status.to_string())
    }

    fn severity(&self, severity: AlertType) -> String {
        let tone = match severity {
            AlertType::Info => Tone::Muted,
            AlertType::Warning => Tone::Warn,
            AlertType::Critical => Tone::Bad,
        };
        self.paint(tone, &severity.to_string())
    }

    fn health(&self, health: Health) -> String {
        let tone = match health {
            Health::Online => Tone::Good,
            Health::Offline => Tone::Bad,
        };
        self.paint(tone, &health.to_string())
    }
}

fn heading(out: &mut String, title: &str, status: Option<&FeedStatus>) {
    // ---
    let freshness = match status {
        Some(FeedStatus { last_error: Some(_), has_data: true, .. }) => " (stale)",
        Some(FeedStatus { has_data: false, .. }) => " (no data yet)",
        _ => "",
    };
    let _ = writeln!(out, "== {title}{freshness} ==");
}

fn stamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

pub fn dashboard(
    stats: &DashboardStats,
    stats_status: &FeedStatus,
    recent: &[Alert],
    weather: &WeatherSnapshot,
    thresholds: &Thresholds,
    style: &Style,
) -> String {
    // ---
    let mut out = String::new();
    heading(&mut out, "Dashboard", Some(stats_status));

    for card in stat_cards(stats, thresholds) {
        let badge = card
            .status
            .map(|s| format!(" [{}]", style.status(s)))
            .unwrap_or_default();
        let _ = writeln!(out, "{:<14} {}{}", card.title, card.value, badge);
    }

    let _ = writeln!(
        out,
        "{:<14} {:.1}°C {} ({})",
        "Weather", weather.temperature_c, weather.condition, weather.icon
    );
    if let Some(rec) = weather.recommendation() {
        let _ = writeln!(out, "{:<14} {}: {}", "Irrigation", rec.action(), rec.reason());
    }

    let _ = writeln!(out, "Recent alerts:");
    if recent.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for alert in recent {
        let _ = writeln!(
            out,
            "  {} {} {}",
            stamp(alert.timestamp),
            style.severity(alert.severity),
            alert.message
        );
    }
    out
}

pub fn sensors(history: &[SensorReading], thresholds: &Thresholds, style: &Style) -> String {
    // ---
    let mut out = String::new();
    heading(&mut out, "Sensors", None);

    let counts = status_counts(history, thresholds);
    let _ = writeln!(
        out,
        "All ({}) | Normal ({}) | Warning ({}) | Critical ({})",
        counts.all, counts.normal, counts.warning, counts.critical
    );

    let rows = sensor_rows(history, thresholds);
    if rows.is_empty() {
        let _ = writeln!(out, "No sensors found");
    }
    for row in rows {
        let _ = writeln!(
            out,
            "{:<22} {:>7.1} {:<3} {} {}",
            row.name,
            row.value,
            row.unit,
            style.status(row.status),
            stamp(row.last_updated)
        );
    }
    out
}

pub fn analytics(history: &[SensorReading], range: DateRange, now: DateTime<Utc>) -> String {
    // ---
    let mut out = String::new();
    heading(&mut out, "Analytics", None);

    let in_range = analytics::filter_by_range(history, range, now);
    for (label, metric, unit) in [
        ("Soil Moisture", Metric::SoilMoisture, "%"),
        ("Temperature", Metric::Temperature, "°C"),
        ("Humidity", Metric::Humidity, "%"),
    ] {
        match analytics::summarize(&analytics::series(&in_range, metric)) {
            Some(s) => {
                let _ = writeln!(
                    out,
                    "{label:<14} min {:.1}{unit}  avg {:.1}{unit}  max {:.1}{unit}",
                    s.min, s.mean, s.max
                );
            }
            None => {
                let _ = writeln!(out, "{label:<14} no readings in range");
            }
        }
    }

    let _ = writeln!(out, "Recent readings:");
    for r in analytics::most_recent(&in_range, 5) {
        let _ = writeln!(
            out,
            "  {}  {:.1}%  {:.1}°C  {:.1}%",
            stamp(r.timestamp),
            r.soil_moisture_percent,
            r.temperature_c,
            r.humidity_percent
        );
    }
    out
}

pub fn alerts(all: &[Alert], shown: &[Alert], style: &Style) -> String {
    // ---
    let mut out = String::new();
    heading(&mut out, "Alerts", None);

    let counts = crate::pages::alerts::severity_counts(all);
    let _ = writeln!(
        out,
        "Total {} | Critical {} | Warning {} | Info {} | Unread {}",
        counts.all, counts.critical, counts.warning, counts.info, counts.unread
    );
    for alert in shown {
        let marker = if alert.read { " " } else { "*" };
        let _ = writeln!(
            out,
            "{marker} {} {} {}",
            stamp(alert.timestamp),
            style.severity(alert.severity),
            alert.message
        );
    }
    out
}

pub fn health(health: &SystemHealth, style: &Style) -> String {
    // ---
    let mut out = String::new();
    heading(&mut out, "System Health", None);
    let _ = writeln!(out, "Database: {}", style.health(health.database));
    let _ = writeln!(out, "ESP32:    {}", style.health(health.esp32));
    let _ = writeln!(out, "API:      {}", style.health(health.api));
    out
}

pub fn irrigation(config: &IrrigationConfig, toasts: &[Toast], style: &Style) -> String {
    // ---
    let mut out = String::new();
    heading(&mut out, "Irrigation Control", None);
    let _ = writeln!(out, "Pump:       {}", config.pump_label());
    let _ = writeln!(
        out,
        "Mode:       {}",
        if config.auto_mode { "Automatic" } else { "Manual Override" }
    );
    let _ = writeln!(out, "Threshold:  {}%", config.moisture_threshold_percent);

    for toast in toasts {
        let tone = match toast.level {
            ToastLevel::Success => Tone::Good,
            ToastLevel::Info => Tone::Muted,
            ToastLevel::Error => Tone::Bad,
        };
        let _ = writeln!(out, "> {}", style.paint(tone, &toast.message));
    }
    out
}
