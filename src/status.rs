//! ==============================================================================
//! status.rs - sensor status classification
//! ==============================================================================
//!
//! purpose:
//!     maps raw readings to the label/color pairs shown on the parameter
//!     cards. pure functions only: every input path returns a valid status,
//!     first matching rule wins, fallback is "Normal".
//!
//! thresholds follow the deployment's husbandry targets for grown broilers
//! (temperature setpoint 25-26C, humidity 60-80%, NH3 warning above 20 ppm).
//!
//! ==============================================================================

use crate::domain::SensorReading;
use serde::Serialize;

// card palette
const GREEN: &str = "#10b981";
const AMBER: &str = "#f59e0b";
const RED: &str = "#ef4444";
const BLUE: &str = "#3b82f6";
const GRAY: &str = "#9ca3af";
const SLATE: &str = "#6b7280";

/// seconds after which a cached reading no longer counts as live
pub const STALE_AFTER_SECS: i64 = 60;

/// classified status of a single metric
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MetricStatus {
    pub label: &'static str,
    pub color: &'static str,
}

impl MetricStatus {
    const fn new(label: &'static str, color: &'static str) -> Self {
        Self { label, color }
    }
}

/// shared "No data" status for absent channels
pub const NO_DATA: MetricStatus = MetricStatus::new("No data", GRAY);

/// status shown for every metric once the reading has gone stale
pub const NO_RECENT_DATA: MetricStatus = MetricStatus::new("No recent data", GRAY);

pub fn temperature(celsius: Option<f64>) -> MetricStatus {
    let Some(t) = celsius else { return NO_DATA };
    if (24.0..=26.0).contains(&t) {
        MetricStatus::new("Optimal", GREEN)
    } else if t > 26.0 && t < 29.0 {
        MetricStatus::new("Warning", AMBER)
    } else if t >= 29.0 {
        MetricStatus::new("Critical", RED)
    } else if t < 22.0 {
        MetricStatus::new("Too Cold", BLUE)
    } else {
        MetricStatus::new("Normal", GREEN)
    }
}

pub fn humidity(percent: Option<f64>) -> MetricStatus {
    let Some(h) = percent else { return NO_DATA };
    if (60.0..=80.0).contains(&h) {
        MetricStatus::new("Optimal", GREEN)
    } else if h > 80.0 && h < 85.0 {
        MetricStatus::new("Warning", AMBER)
    } else if h >= 85.0 {
        MetricStatus::new("Critical", RED)
    } else if h < 55.0 {
        MetricStatus::new("Too Dry", AMBER)
    } else {
        MetricStatus::new("Normal", GREEN)
    }
}

pub fn ammonia(ppm: Option<f64>) -> MetricStatus {
    let Some(a) = ppm else { return NO_DATA };
    if (0.0..=5.0).contains(&a) {
        MetricStatus::new("Safe", GREEN)
    } else if a > 5.0 && a <= 20.0 {
        MetricStatus::new("Elevated", AMBER)
    } else if a > 20.0 {
        MetricStatus::new("Dangerous", RED)
    } else {
        // negative readings from a miscalibrated probe
        MetricStatus::new("Normal", GREEN)
    }
}

pub fn methane(ppm: Option<f64>) -> MetricStatus {
    let Some(m) = ppm else { return NO_DATA };
    if (0.0..=2.0).contains(&m) {
        MetricStatus::new("Safe", GREEN)
    } else if m > 2.0 && m <= 5.0 {
        MetricStatus::new("Elevated", AMBER)
    } else if m > 5.0 {
        MetricStatus::new("Dangerous", RED)
    } else {
        MetricStatus::new("Normal", GREEN)
    }
}

/// fan health from tach + PWM; zero rpm against a driven duty line is a fault
pub fn fan(rpm: Option<f64>, duty: Option<f64>) -> MetricStatus {
    let Some(rpm) = rpm else { return NO_DATA };
    if rpm == 0.0 && duty.unwrap_or(0.0) > 50.0 {
        MetricStatus::new("Fault", RED)
    } else if rpm > 0.0 {
        MetricStatus::new("Running", GREEN)
    } else {
        MetricStatus::new("Stopped", SLATE)
    }
}

pub fn light(status: Option<&str>) -> MetricStatus {
    match status {
        None | Some("") => NO_DATA,
        Some("ON") => MetricStatus::new("Active", GREEN),
        Some(_) => MetricStatus::new("Off", SLATE),
    }
}

/// card statuses for a full reading, with the staleness override applied
///
/// a stale (or absent) reading pins every card to "No recent data",
/// regardless of what the raw classifiers would say.
pub fn classify_all(reading: Option<&SensorReading>, stale: bool) -> [MetricStatus; 6] {
    let Some(r) = reading else { return [NO_RECENT_DATA; 6] };
    if stale {
        return [NO_RECENT_DATA; 6];
    }
    [
        temperature(r.temperature),
        humidity(r.humidity),
        ammonia(r.ammonia),
        methane(r.methane),
        fan(r.fan_intake_rpm, r.fan_intake_duty),
        light(r.light_status.as_deref()),
    ]
}
