//! ==============================================================================
//! render.rs - server-side dashboard rendering
//! ==============================================================================
//!
//! purpose:
//!     builds the console HTML from the shared state snapshot: sidebar,
//!     header with the system status pill, live parameter cards, manual
//!     control panels, setpoint list, 24-hour trend bars, and the four
//!     auxiliary pages. value/status formatting all funnels through the
//!     classifiers in status.rs.
//!
//! the page refreshes itself every 5 seconds so the countdown and the
//! staleness clock stay current without client-side polling.
//!
//! ==============================================================================

use crate::domain::ConsoleState;
use crate::shell::{Page, Shell};
use crate::status::{self, MetricStatus};

/// one dashboard metric card, pre-formatted for display
struct Card {
    icon: &'static str,
    title: &'static str,
    value: String,
    status: MetricStatus,
    bg: &'static str,
    note: &'static str,
}

/// "—" when the channel is absent or the reading is stale
fn fmt_metric(value: Option<f64>, stale: bool, f: impl Fn(f64) -> String) -> String {
    match value {
        Some(v) if !stale => f(v),
        _ => "—".to_string(),
    }
}

fn cards(state: &ConsoleState) -> Vec<Card> {
    let stale = state.latest.is_none() || state.is_stale();
    let reading = state.latest.clone().unwrap_or_default();
    let [temp, hum, nh3, ch4, fan, light] =
        status::classify_all(state.latest.as_ref(), state.is_stale());

    vec![
        Card {
            icon: "🌡️",
            title: "Temperature",
            value: fmt_metric(reading.temperature, stale, |v| format!("{v:.1}°C")),
            status: temp,
            bg: "#e0f2fe",
            note: "Target: 24–26°C",
        },
        Card {
            icon: "💧",
            title: "Humidity",
            value: fmt_metric(reading.humidity, stale, |v| format!("{v:.0}%")),
            status: hum,
            bg: "#dcfce7",
            note: "Target: 60–80%",
        },
        Card {
            icon: "☁️",
            title: "Ammonia (NH₃)",
            value: fmt_metric(reading.ammonia, stale, |v| format!("{v:.1} ppm")),
            status: nh3,
            bg: "#fef3c7",
            note: "Optimal: 0–5 ppm",
        },
        Card {
            icon: "💨",
            title: "Methane (CH₄)",
            value: fmt_metric(reading.methane, stale, |v| format!("{v:.1} ppm")),
            status: ch4,
            bg: "#fecaca",
            note: "Optimal: 0–2 ppm",
        },
        Card {
            icon: "🌀",
            title: "Ventilation Fan",
            value: fmt_metric(reading.fan_intake_rpm, stale, |v| format!("{v:.0} rpm")),
            status: fan,
            bg: "#cffafe",
            note: "Single shared fan (tach + PWM on same line)",
        },
        Card {
            icon: "☀️",
            title: "Lighting",
            value: if stale {
                "—".to_string()
            } else {
                reading.light_status.clone().unwrap_or_else(|| "—".to_string())
            },
            status: light,
            bg: "#fef08a",
            note: "20–40 lux",
        },
    ]
}

// ---- batch statistics helpers -------------------------------------------------

pub fn mortality_rate(total_birds: u32, birds_died: u32) -> f64 {
    if total_birds == 0 {
        0.0
    } else {
        f64::from(birds_died) / f64::from(total_birds) * 100.0
    }
}

pub fn survival_rate(total_birds: u32, birds_died: u32) -> f64 {
    if total_birds == 0 {
        0.0
    } else {
        f64::from(total_birds.saturating_sub(birds_died)) / f64::from(total_birds) * 100.0
    }
}

pub fn healthy_birds(total_birds: u32, birds_died: u32) -> u32 {
    total_birds.saturating_sub(birds_died)
}

// ---- page assembly ------------------------------------------------------------

pub fn page(shell: &Shell, state: &ConsoleState) -> String {
    let sidebar = sidebar_html(shell);
    let pill = status_pill(state);
    let menu_toggle = if shell.is_mobile() {
        format!(
            r#"<a href="/?toggle=1" style="font-size:24px;text-decoration:none;color:#111827;margin-right:12px;">{}</a>"#,
            if shell.sidebar_open { "✕" } else { "☰" }
        )
    } else {
        String::new()
    };
    let shell_script = shell_script(shell);
    let content = match shell.active {
        Page::Dashboard => dashboard_html(state),
        Page::Batch => batch_html(),
        Page::Alerts => alerts_html(),
        Page::Profile => profile_html(),
        Page::Settings => settings_html(),
    };

    format!(
        r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<meta http-equiv="refresh" content="5">
<title>Poultry Monitoring &amp; Control</title>
<style>
body {{ margin: 0; display: flex; min-height: 100vh; font-family: 'Segoe UI', Arial, sans-serif; background: linear-gradient(135deg, #f0fdf4 0%, #ecfdf5 100%); }}
.sidebar {{ width: 260px; background: linear-gradient(135deg, #064e3b 0%, #0a4d39 100%); color: white; padding: 24px 16px; }}
.sidebar.closed {{ display: none; }}
.sidebar a {{ display: block; padding: 11px 12px; border-radius: 8px; color: white; text-decoration: none; font-size: 13px; margin-bottom: 6px; }}
.sidebar a.active {{ background: #10b981; font-weight: 600; }}
main {{ flex: 1; }}
header {{ background: white; padding: 20px 24px; border-bottom: 1px solid #e5e7eb; display: flex; justify-content: space-between; align-items: center; }}
.pill {{ padding: 8px 14px; border-radius: 999px; font-size: 12px; font-weight: 600; white-space: nowrap; }}
.content {{ padding: 24px; max-width: 1400px; margin: 0 auto; }}
.grid {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(180px, 1fr)); gap: 12px; }}
.card {{ border: 1px solid rgba(0,0,0,0.08); border-radius: 10px; padding: 14px; }}
.card .value {{ font-size: 22px; font-weight: 700; color: #111827; margin: 6px 0; }}
.card .badge {{ font-size: 11px; font-weight: 600; padding: 4px 8px; border-radius: 4px; display: inline-block; color: white; }}
.card .note {{ font-size: 10px; color: #9ca3af; margin-top: 4px; }}
.panel {{ background: white; border: 1px solid #e5e7eb; border-radius: 10px; padding: 16px; box-shadow: 0 1px 3px rgba(0,0,0,0.08); }}
.banner {{ background: #fee2e2; border: 1px solid #fca5a5; border-radius: 8px; padding: 12px; margin-bottom: 16px; font-size: 13px; color: #991b1b; }}
.bars {{ height: 150px; display: flex; align-items: flex-end; gap: 4px; }}
.bars div {{ flex: 1; border-radius: 2px 2px 0 0; min-height: 2px; }}
button {{ padding: 10px 12px; border: 2px solid #e5e7eb; border-radius: 6px; background: white; font-size: 12px; font-weight: 600; cursor: pointer; }}
button.on {{ border-color: #10b981; background: #10b981; color: white; }}
h2 {{ font-size: 16px; color: #111827; }}
h3 {{ font-size: 14px; color: #111827; }}
</style>
</head>
<body>
{sidebar}
<main>
<header>
  <div style="display:flex;align-items:center;">
  {menu_toggle}
  <div>
    <h1 style="margin:0;font-size:24px;color:#111827;">Poultry Monitoring &amp; Control System</h1>
    <p style="margin:6px 0 0;font-size:12px;color:#6b7280;">Environmental monitoring, early warning detection, and automated control</p>
  </div>
  </div>
  {pill}
</header>
<div class="content">
{content}
</div>
</main>
{shell_script}
</body>
</html>"#
    )
}

/// reports viewport changes and mobile click-outside back to the shell
///
/// the state machine itself lives server-side; the browser only forwards
/// the two events it alone can observe.
fn shell_script(shell: &Shell) -> String {
    format!(
        r#"<script>
(function () {{
  var serverMobile = {server_mobile};
  var breakpoint = {breakpoint};
  function mobileNow() {{ return window.innerWidth < breakpoint; }}
  if (mobileNow() !== serverMobile) {{
    window.location.replace('/?vw=' + window.innerWidth);
    return;
  }}
  window.addEventListener('resize', function () {{
    if (mobileNow() !== serverMobile) {{
      window.location.replace('/?vw=' + window.innerWidth);
    }}
  }});
  document.addEventListener('click', function (e) {{
    if (serverMobile && !e.target.closest('.sidebar') && !e.target.closest('header a') && !e.target.closest('form')) {{
      window.location.replace('/?outside=1');
    }}
  }});
}})();
</script>"#,
        server_mobile = shell.is_mobile(),
        breakpoint = crate::shell::MOBILE_BREAKPOINT_PX,
    )
}

fn sidebar_html(shell: &Shell) -> String {
    let mut nav = String::new();
    for page in Page::ALL {
        let class = if page == shell.active { " class=\"active\"" } else { "" };
        nav.push_str(&format!(
            "<a href=\"/?page={}\"{}>{}</a>\n",
            page.slug(),
            class,
            page.title()
        ));
    }
    let closed = if shell.sidebar_open { "" } else { " closed" };
    format!(
        r#"<aside class="sidebar{closed}">
<div style="display:flex;align-items:center;margin-bottom:28px;">
  <div style="width:44px;height:44px;border-radius:50%;background:#10b981;display:flex;align-items:center;justify-content:center;font-size:24px;margin-right:12px;">🐔</div>
  <div><div style="font-size:14px;font-weight:700;">Poultry</div><div style="font-size:12px;opacity:0.85;">Monitoring System</div></div>
</div>
<nav>{nav}</nav>
</aside>"#
    )
}

fn status_pill(state: &ConsoleState) -> String {
    let (bg, fg, text) = if state.fetch_error.is_some() {
        ("#fee2e2", "#991b1b", "✗ System: Error")
    } else {
        ("#dcfce7", "#166534", "✓ System: Normal")
    };
    format!(r#"<div class="pill" style="background:{bg};color:{fg};">{text}</div>"#)
}

fn dashboard_html(state: &ConsoleState) -> String {
    let mut out = String::new();

    if let Some(err) = &state.fetch_error {
        out.push_str(&format!(
            r#"<div class="banner">⚠️ Sensor error: {}</div>"#,
            escape(err)
        ));
    }

    out.push_str("<section><h2>🌡️ Live Environment Parameters</h2><div class=\"grid\">");
    for card in cards(state) {
        out.push_str(&format!(
            r#"<div class="card" style="background:{bg};">
<div style="font-size:24px;">{icon} <span style="font-size:12px;color:#6b7280;">{title}</span></div>
<p class="value">{value}</p>
<span class="badge" style="background:{color};">{label}</span>
<p class="note">{note}</p>
</div>"#,
            bg = card.bg,
            icon = card.icon,
            title = card.title,
            value = card.value,
            color = card.status.color,
            label = card.status.label,
            note = card.note,
        ));
    }
    out.push_str("</div></section>");

    out.push_str(&controls_html(state));
    out.push_str(&setpoints_html());
    out.push_str(&trends_html(state));
    out
}

fn controls_html(state: &ConsoleState) -> String {
    let a = &state.actuators;
    let washer = if a.washer_running {
        format!(
            r#"<div style="font-size:12px;color:#ef4444;font-weight:600;margin-top:8px;">Running: {}s</div>"#,
            a.washer_remaining
        )
    } else {
        String::new()
    };
    format!(
        r#"<section><h2>🎮 Manual Controls (Testing)</h2>
<div class="grid" style="grid-template-columns:repeat(auto-fit,minmax(280px,1fr));gap:16px;">
<div class="panel"><h3>💡 Lighting Control</h3>
  {}
</div>
<div class="panel"><h3>🌀 Fan Control</h3>
  {}
</div>
<div class="panel"><h3>💨 Pressure Washer</h3>
  <span style="font-size:12px;font-weight:600;">45 Second Cycle</span>
  <form method="post" action="/controls" style="display:flex;gap:8px;margin-top:8px;">
    <button name="cmd" value="pressureWasher:ON" class="{}">START</button>
    <button name="cmd" value="pressureWasher:OFF" class="{}">STOP</button>
  </form>
  {washer}
</div>
</div></section>"#,
        toggle_row("Growing Phase Lights", "light", a.lights.is_on()),
        toggle_row("Ventilation Fan (override)", "fan", a.fan.is_on()),
        if a.washer_running { "on" } else { "" },
        if a.washer_running { "" } else { "on" },
    )
}

fn toggle_row(label: &str, target: &str, on: bool) -> String {
    format!(
        r#"<span style="font-size:12px;font-weight:600;">{label}</span>
<form method="post" action="/controls" style="display:flex;gap:8px;margin-top:8px;">
  <button name="cmd" value="{target}:ON" class="{}">ON</button>
  <button name="cmd" value="{target}:OFF" class="{}">OFF</button>
</form>"#,
        if on { "on" } else { "" },
        if on { "" } else { "on" },
    )
}

fn setpoints_html() -> String {
    let items = [
        ("Temperature Setpoint (PID):", "25–26°C"),
        ("Humidity Target:", "60–80%"),
        ("Light ON / OFF:", "20 lux / 40 lux"),
        ("Ammonia Warning:", ">20 ppm"),
        ("Methane Optimal:", "0–2 ppm"),
    ];
    let rows: String = items
        .iter()
        .map(|(label, value)| {
            format!(
                r#"<div style="display:flex;justify-content:space-between;padding:10px 0;border-bottom:1px solid #e5e7eb;font-size:13px;"><span style="font-weight:600;">{label}</span><span style="color:#10b981;font-weight:600;">{value}</span></div>"#
            )
        })
        .collect();
    format!(r#"<section><h2>⚙️ Current Setpoints</h2><div class="panel">{rows}</div></section>"#)
}

fn trends_html(state: &ConsoleState) -> String {
    format!(
        r#"<section><h2>📊 Environmental Trends (24-Hour)</h2>
<div class="grid" style="grid-template-columns:repeat(auto-fit,minmax(300px,1fr));gap:16px;">
{}{}{}
</div></section>"#,
        chart_html("🌡️ Temperature Trend", &state.trends.temperature, 35.0, "#3b82f6"),
        chart_html("💧 Humidity Trend", &state.trends.humidity, 100.0, "#0ea5e9"),
        chart_html("☁️ Ammonia Level Trend", &state.trends.ammonia, 25.0, "#f97316"),
    )
}

fn chart_html(title: &str, series: &[f64], max_value: f64, color: &str) -> String {
    let bars: String = if series.is_empty() {
        r#"<div style="width:100%;text-align:center;color:#9ca3af;font-size:12px;padding:60px 0;">No data yet - waiting for ESP32...</div>"#.to_string()
    } else {
        series
            .iter()
            .map(|v| {
                let height = ((v / max_value) * 100.0).max(2.0);
                format!(
                    r#"<div style="height:{height:.0}%;background:{color};" title="{v:.1}"></div>"#
                )
            })
            .collect()
    };
    format!(r#"<div class="panel"><h3>{title}</h3><div class="bars">{bars}</div></div>"#)
}

fn batch_html() -> String {
    // deployment figures from the pilot flock; editing is client-local in the
    // browser drafts and stays display-only here
    let total_birds = 2448;
    let birds_died = 0;
    format!(
        r#"<section><h2>📊 Farm Statistics Dashboard</h2>
<div class="grid" style="grid-template-columns:repeat(auto-fit,minmax(160px,1fr));">
{}{}{}{}
</div>
<div class="panel" style="margin-top:16px;"><h3>📊 Flock Summary</h3>
<p style="font-size:13px;">Healthy birds: <strong>{}</strong> ({:.1}% survival) · Lost last 7 days: <strong>{}</strong></p>
</div>
<div class="panel" style="margin-top:16px;"><h3>📅 Expected Harvest &amp; Batch Planning</h3>
<p style="font-size:13px;">Batch start: 2025-12-27 · Expected harvest: 2026-02-14 · Phase: Growing (15-28 days)</p>
</div></section>"#,
        stat_card("Total Birds", &total_birds.to_string(), "in coop"),
        stat_card("Mortality Rate", &format!("{:.1}%", mortality_rate(total_birds, birds_died)), "last 7 days"),
        stat_card("Avg Weight", "2.1", "kg per bird"),
        stat_card("Days to Market", "18", "days remaining"),
        healthy_birds(total_birds, birds_died),
        survival_rate(total_birds, birds_died),
        birds_died,
    )
}

fn stat_card(label: &str, value: &str, unit: &str) -> String {
    format!(
        r#"<div class="panel" style="text-align:center;"><div style="font-size:12px;color:#6b7280;">{label}</div><div style="font-size:28px;font-weight:700;color:#10b981;">{value}</div><div style="font-size:11px;color:#6b7280;">{unit}</div></div>"#
    )
}

fn alerts_html() -> String {
    r#"<section><h2>⚠️ Early Warning Notifications</h2>
<div class="panel">
<div style="background:#dcfce7;border-left:4px solid #16a34a;padding:16px;margin-bottom:12px;border-radius:8px;">
  <h4 style="margin:0 0 4px;font-size:13px;color:#166534;">Current System State</h4>
  <p style="margin:0;font-size:12px;color:#166534;">✓ Healthy - All parameters within normal range</p>
</div>
<div style="background:#dbeafe;border-left:4px solid #3b82f6;padding:16px;border-radius:8px;">
  <h4 style="margin:0 0 4px;font-size:13px;color:#1e40af;">Waiting for ESP32 data</h4>
  <p style="margin:0;font-size:12px;color:#1e40af;">Connect your ESP32 to start receiving real-time alerts and warnings.</p>
</div>
</div></section>"#
        .to_string()
}

fn profile_html() -> String {
    r#"<section><h2>👤 Farmer Profile</h2>
<div class="panel" style="max-width:600px;">
<p style="font-size:13px;"><strong>Name:</strong> Kuya Emil</p>
<p style="font-size:13px;"><strong>Location:</strong> El Pueblo, Caypombo, Sta. Maria, Bulacan</p>
<p style="font-size:13px;"><strong>Experience:</strong> 2 years broiler poultry house owner</p>
<p style="font-size:13px;"><strong>About:</strong> Primary deployment site for the monitoring and control system; operational feedback drives validation for broiler production in tropical environments.</p>
</div></section>"#
        .to_string()
}

fn settings_html() -> String {
    let sections: [(&str, &[(&str, &str)]); 6] = [
        ("🌡️ Temperature Control (PID-based)", &[
            ("Setpoint:", "25–26°C (grown birds)"),
            ("Optimal:", "24–26°C"),
            ("Warning:", "27–29°C"),
            ("Critical:", ">29°C or <22°C"),
        ]),
        ("💧 Humidity Monitoring", &[
            ("Optimal:", "60–80%"),
            ("Warning:", "81–85%"),
            ("Critical:", ">85% or <55%"),
        ]),
        ("☁️ Ammonia & Gas Control", &[
            ("Optimal:", "0–5 ppm (fan: 20–30%)"),
            ("Normal:", "6–20 ppm (fan: 40–80%)"),
            ("Critical:", ">20 ppm (fan: 100%)"),
        ]),
        ("☀️ Lighting Control", &[
            ("Growing:", "ON <20 lux, OFF >40 lux"),
            ("Brooding:", "ON <80 lux, OFF >100 lux"),
        ]),
        ("🌀 Fan Monitoring (RPM)", &[
            ("Normal:", "RPM matches PWM relationship"),
            ("Warning:", "Δ RPM >1500 (bearing wear)"),
            ("Critical:", "RPM = 0 at PWM >50%"),
        ]),
        ("💨 Methane Thresholds", &[
            ("Optimal:", "0–2 ppm (litter dry)"),
            ("Elevated:", "3–5 ppm (fan: 40–60%)"),
            ("Critical:", ">5 ppm (fan: 90–100%)"),
        ]),
    ];

    let panels: String = sections
        .iter()
        .map(|(title, items)| {
            let rows: String = items
                .iter()
                .map(|(label, value)| {
                    format!(
                        r#"<div style="display:flex;justify-content:space-between;padding:8px 0;border-bottom:1px solid #f3f4f6;font-size:12px;"><span style="font-weight:600;color:#6b7280;">{}</span><span>{}</span></div>"#,
                        label,
                        escape(value)
                    )
                })
                .collect();
            format!(r#"<div class="panel"><h3>{title}</h3>{rows}</div>"#)
        })
        .collect();

    format!(
        r#"<section><h2>⚙️ System Settings &amp; Thresholds</h2>
<div class="grid" style="grid-template-columns:repeat(auto-fit,minmax(280px,1fr));gap:16px;">{panels}</div></section>"#
    )
}

/// error page shown when a control command is rejected; the console
/// equivalent of the browser drafts' blocking alert
pub fn command_error_page(message: &str) -> String {
    format!(
        r#"<!doctype html>
<html>
<head><title>Command failed</title></head>
<body style="font-family: system-ui; padding: 2rem; background: #1a1a2e; color: #eee;">
    <h1 style="color: #ff6b6b;">⚠️ Failed to send command</h1>
    <pre style="background: #16213e; padding: 1rem; border-radius: 8px; overflow-x: auto;">{}</pre>
    <p><a href="/" style="color: #10b981;">Back to dashboard</a></p>
</body>
</html>"#,
        escape(message)
    )
}

/// escape html special characters to prevent xss
fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SensorReading;

    fn state_with(reading: SensorReading, age: Option<i64>) -> ConsoleState {
        ConsoleState {
            latest: Some(reading),
            age_seconds: age,
            ..Default::default()
        }
    }

    #[test]
    fn live_reading_renders_value_and_status() {
        let state = state_with(
            SensorReading {
                temperature: Some(25.4),
                ..Default::default()
            },
            Some(5),
        );
        let html = dashboard_html(&state);
        assert!(html.contains("25.4°C"));
        assert!(html.contains("Optimal"));
    }

    #[test]
    fn stale_reading_renders_placeholders_everywhere() {
        let state = state_with(
            SensorReading {
                temperature: Some(32.0),
                humidity: Some(90.0),
                ..Default::default()
            },
            Some(120),
        );
        let html = dashboard_html(&state);
        assert!(html.contains("No recent data"));
        assert!(!html.contains("Critical"));
        assert!(!html.contains("32.0"));
    }

    #[test]
    fn missing_reading_shows_no_error_banner() {
        let state = ConsoleState::default();
        let html = dashboard_html(&state);
        assert!(!html.contains("Sensor error"));
        assert!(html.contains("—"));
    }

    #[test]
    fn fetch_error_raises_the_banner() {
        let state = ConsoleState {
            fetch_error: Some("backend returned 500: boom".into()),
            ..Default::default()
        };
        let html = dashboard_html(&state);
        assert!(html.contains("Sensor error"));
        assert!(html.contains("boom"));
    }

    #[test]
    fn command_error_page_escapes_backend_text() {
        let html = command_error_page("<script>alert(1)</script> device busy");
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("device busy"));
    }

    #[test]
    fn batch_math() {
        assert_eq!(mortality_rate(0, 10), 0.0);
        assert!((mortality_rate(2000, 100) - 5.0).abs() < 1e-9);
        assert!((survival_rate(2000, 100) - 95.0).abs() < 1e-9);
        assert_eq!(healthy_birds(2000, 100), 1900);
        assert_eq!(healthy_birds(100, 200), 0);
    }

    #[test]
    fn sidebar_marks_active_page_and_closed_state() {
        let mut shell = Shell::default();
        shell.navigate(Page::Alerts);
        let html = sidebar_html(&shell);
        assert!(html.contains(r#"href="/?page=alerts" class="active""#));
        assert!(!html.contains("sidebar closed"));

        shell.viewport_resized(500);
        let html = sidebar_html(&shell);
        assert!(html.contains("sidebar closed"));
    }
}
