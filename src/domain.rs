use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// latest environment snapshot as published by the poultry backend
///
/// every channel is optional: the backend reports whatever the ESP32 has
/// delivered so far, and channels that never reported are simply absent.
/// a reading is immutable once fetched and is replaced wholesale by the
/// next poll.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    /// house temperature in celsius
    pub temperature: Option<f64>,
    /// relative humidity (0-100%)
    pub humidity: Option<f64>,
    /// ammonia concentration in ppm
    pub ammonia: Option<f64>,
    /// methane concentration in ppm
    pub methane: Option<f64>,
    /// intake fan tachometer reading
    pub fan_intake_rpm: Option<f64>,
    /// intake fan PWM duty cycle (0-100%)
    pub fan_intake_duty: Option<f64>,
    /// "ON" / "OFF" as reported by the light relay
    pub light_status: Option<String>,
    /// "ON" / "OFF" as reported by the washer relay
    pub pressure_washer_status: Option<String>,
    /// capture time, used for the staleness clock
    pub created_at: Option<DateTime<Utc>>,
}

/// one hourly sample of the 24-hour trend window, oldest first
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub ammonia: Option<f64>,
}

/// backend device identifiers accepted by POST /api/control
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    Light,
    /// the single shared ventilation fan, named for the positive-pressure line
    FanPositive,
    PressureWasher,
}

/// forced override mode; suspends the backend's automatic logic for a device
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForcedMode {
    ForceOn,
    ForceOff,
}

/// manual override payload, constructed locally and sent exactly once
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlCommand {
    pub device: Device,
    pub mode: ForcedMode,
    /// cycle length in seconds, only attached when starting the washer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer_duration: Option<u32>,
}

/// ON/OFF switch position as shown on the control panels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwitchState {
    On,
    #[default]
    Off,
}

impl SwitchState {
    pub fn is_on(self) -> bool {
        self == SwitchState::On
    }
}

/// 24-hour trend series backing the dashboard charts
///
/// each fetch replaces the whole struct; series are never merged.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TrendSeries {
    pub temperature: Vec<f64>,
    pub humidity: Vec<f64>,
    pub ammonia: Vec<f64>,
}

impl TrendSeries {
    /// split a history response into per-metric columns, missing samples as 0
    pub fn from_history(points: &[HistoryPoint]) -> Self {
        Self {
            temperature: points.iter().map(|p| p.temperature.unwrap_or(0.0)).collect(),
            humidity: points.iter().map(|p| p.humidity.unwrap_or(0.0)).collect(),
            ammonia: points.iter().map(|p| p.ammonia.unwrap_or(0.0)).collect(),
        }
    }
}

/// optimistic actuator panel state
///
/// written by the dispatcher on command success and reconciled from the
/// latest reading on every successful poll; last poll wins.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ActuatorPanel {
    pub lights: SwitchState,
    pub fan: SwitchState,
    pub washer_running: bool,
    /// seconds left in the current washer cycle
    pub washer_remaining: u32,
}

/// shared console state
///
/// each polling task only overwrites the slice it owns: the latest loop
/// writes `latest`/`fetch_error`, the history loop writes `trends`, the
/// staleness ticker writes `age_seconds`.
#[derive(Clone, Debug, Serialize)]
pub struct ConsoleState {
    /// most recent reading, None until the backend has one
    pub latest: Option<SensorReading>,
    /// visible banner text for the last failed latest-reading fetch
    pub fetch_error: Option<String>,
    /// seconds since the cached reading was captured
    pub age_seconds: Option<i64>,
    pub trends: TrendSeries,
    pub actuators: ActuatorPanel,
    /// configured staleness cutoff; readings older than this are not live
    #[serde(skip)]
    pub stale_after_secs: i64,
}

impl Default for ConsoleState {
    fn default() -> Self {
        Self {
            latest: None,
            fetch_error: None,
            age_seconds: None,
            trends: TrendSeries::default(),
            actuators: ActuatorPanel::default(),
            stale_after_secs: crate::status::STALE_AFTER_SECS,
        }
    }
}

impl ConsoleState {
    /// true once the cached reading's age exceeds the staleness cutoff
    pub fn is_stale(&self) -> bool {
        matches!(self.age_seconds, Some(age) if age > self.stale_after_secs)
    }

    /// recompute the staleness clock from the cached reading only
    pub fn refresh_age(&mut self, now: DateTime<Utc>) {
        self.age_seconds = self
            .latest
            .as_ref()
            .and_then(|r| r.created_at)
            .map(|created| (now - created).num_seconds());
    }

    /// adopt a fresh reading and reconcile actuator flags from it
    pub fn adopt_reading(&mut self, reading: SensorReading, now: DateTime<Utc>) {
        if let Some(light) = reading.light_status.as_deref() {
            self.actuators.lights = if light == "ON" { SwitchState::On } else { SwitchState::Off };
        }
        if let Some(washer) = reading.pressure_washer_status.as_deref() {
            self.actuators.washer_running = washer == "ON";
        }
        self.latest = Some(reading);
        self.fetch_error = None;
        self.refresh_age(now);
    }

    /// 404 from the backend: no reading exists yet, which is not an error
    pub fn clear_reading(&mut self) {
        self.latest = None;
        self.age_seconds = None;
        self.fetch_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn control_command_omits_absent_timer() {
        let cmd = ControlCommand {
            device: Device::FanPositive,
            mode: ForcedMode::ForceOn,
            timer_duration: None,
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"device": "fan_positive", "mode": "FORCE_ON"})
        );
    }

    #[test]
    fn control_command_carries_washer_timer() {
        let cmd = ControlCommand {
            device: Device::PressureWasher,
            mode: ForcedMode::ForceOn,
            timer_duration: Some(45),
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "device": "pressure_washer",
                "mode": "FORCE_ON",
                "timerDuration": 45
            })
        );
    }

    #[test]
    fn reading_parses_camel_case_payload() {
        let reading: SensorReading = serde_json::from_str(
            r#"{
                "temperature": 25.4,
                "humidity": 71.0,
                "ammonia": 3.2,
                "methane": 1.1,
                "fanIntakeRpm": 1800.0,
                "fanIntakeDuty": 60.0,
                "lightStatus": "ON",
                "pressureWasherStatus": "OFF",
                "createdAt": "2025-12-27T08:30:00Z"
            }"#,
        )
        .unwrap();
        assert_eq!(reading.temperature, Some(25.4));
        assert_eq!(reading.fan_intake_rpm, Some(1800.0));
        assert_eq!(reading.light_status.as_deref(), Some("ON"));
        assert!(reading.created_at.is_some());
    }

    #[test]
    fn adopt_reading_reconciles_actuators_and_age() {
        let now = Utc.with_ymd_and_hms(2025, 12, 27, 8, 30, 42).unwrap();
        let reading = SensorReading {
            light_status: Some("ON".into()),
            pressure_washer_status: Some("ON".into()),
            created_at: Some(now - chrono::Duration::seconds(12)),
            ..Default::default()
        };

        let mut state = ConsoleState {
            fetch_error: Some("boom".into()),
            ..Default::default()
        };
        state.adopt_reading(reading, now);

        assert!(state.actuators.lights.is_on());
        assert!(state.actuators.washer_running);
        assert_eq!(state.age_seconds, Some(12));
        assert!(state.fetch_error.is_none());
    }

    #[test]
    fn clear_reading_is_an_empty_state_not_an_error() {
        let mut state = ConsoleState::default();
        state.latest = Some(SensorReading::default());
        state.age_seconds = Some(5);

        state.clear_reading();

        assert!(state.latest.is_none());
        assert!(state.age_seconds.is_none());
        assert!(state.fetch_error.is_none());
    }

    #[test]
    fn staleness_cutoff_is_exclusive() {
        let mut state = ConsoleState::default();
        assert!(!state.is_stale());
        state.age_seconds = Some(60);
        assert!(!state.is_stale());
        state.age_seconds = Some(61);
        assert!(state.is_stale());
    }

    #[test]
    fn trend_series_fills_missing_samples_with_zero() {
        let points = vec![
            HistoryPoint { temperature: Some(24.0), humidity: None, ammonia: Some(2.0) },
            HistoryPoint { temperature: None, humidity: Some(70.0), ammonia: None },
        ];
        let trends = TrendSeries::from_history(&points);
        assert_eq!(trends.temperature, vec![24.0, 0.0]);
        assert_eq!(trends.humidity, vec![0.0, 70.0]);
        assert_eq!(trends.ammonia, vec![2.0, 0.0]);
    }
}
