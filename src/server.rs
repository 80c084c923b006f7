//! ==============================================================================
//! server.rs - local dashboard web server
//! ==============================================================================
//!
//! purpose:
//!     serves the operator console and the local JSON API:
//!     - GET  /              server-rendered dashboard (page/vw/toggle query
//!                           events feed the shell state machine)
//!     - GET  /api/state     JSON snapshot of the console state
//!     - POST /api/actuators JSON control intent {target, state}
//!     - POST /controls      form-encoded control intent from the dashboard
//!
//! control failures surface the backend's own error text to the operator
//! (502 + message); no retry, no optimistic rollback.
//!
//! ==============================================================================

use crate::control::{Dispatcher, Target};
use crate::domain::{ConsoleState, SwitchState};
use crate::render;
use crate::shell::{Page, Shell};
use anyhow::Result;
use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppCtx {
    pub state: Arc<RwLock<ConsoleState>>,
    pub shell: Arc<RwLock<Shell>>,
    pub dispatcher: Arc<Dispatcher>,
}

pub async fn run(ctx: AppCtx, listen_addr: &str) -> Result<()> {
    let app = Router::new()
        .route("/", get(dashboard_handler))
        .route("/api/state", get(state_handler))
        .route("/api/actuators", post(actuators_handler))
        .route("/controls", post(controls_form_handler))
        .layer(CorsLayer::permissive())
        .with_state(ctx);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!("dashboard live at http://{listen_addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

/// shell events carried in the dashboard URL
#[derive(Deserialize)]
struct ShellQuery {
    /// navigate to a page
    page: Option<String>,
    /// reported viewport width in px
    vw: Option<u32>,
    /// toggle the sidebar
    toggle: Option<u8>,
    /// click outside the sidebar (mobile dismiss)
    outside: Option<u8>,
}

async fn dashboard_handler(
    State(ctx): State<AppCtx>,
    Query(query): Query<ShellQuery>,
) -> Response {
    let one_shot = query.vw.is_some() || query.toggle.is_some() || query.outside.is_some();

    let shell = {
        let mut shell = ctx.shell.write().await;
        if let Some(vw) = query.vw {
            shell.viewport_resized(vw);
        }
        if query.toggle.is_some() {
            shell.toggle_sidebar();
        }
        if query.outside.is_some() {
            shell.click_outside();
        }
        // the page param is a navigation event only when it actually changes
        // pages; redirects and the meta refresh echo the active page back,
        // and replaying navigate() there would re-close a toggled mobile
        // sidebar
        if let Some(page) = query.page.as_deref().and_then(Page::from_slug) {
            if page != shell.active {
                shell.navigate(page);
            }
        }
        *shell
    };

    // one-shot events must not survive in the URL, or the page's own
    // refresh would replay them
    if one_shot {
        return Redirect::to(&format!("/?page={}", shell.active.slug())).into_response();
    }

    let state = ctx.state.read().await.clone();
    Html(render::page(&shell, &state)).into_response()
}

/// json snapshot for programmatic access
async fn state_handler(State(ctx): State<AppCtx>) -> Json<ConsoleState> {
    let state = ctx.state.read().await.clone();
    Json(state)
}

/// json control intent, e.g. {"target": "pressureWasher", "state": "ON"}
#[derive(Deserialize)]
struct ControlIntent {
    target: Target,
    state: SwitchState,
}

async fn actuators_handler(
    State(ctx): State<AppCtx>,
    Json(intent): Json<ControlIntent>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    match ctx.dispatcher.dispatch(intent.target, intent.state).await {
        Ok(ack) => Ok(Json(ack)),
        Err(e) => Err((StatusCode::BAD_GATEWAY, e.to_string())),
    }
}

/// dashboard buttons post "target:state" as a single form field
#[derive(Deserialize)]
struct ControlForm {
    cmd: String,
}

async fn controls_form_handler(
    State(ctx): State<AppCtx>,
    Form(form): Form<ControlForm>,
) -> Result<Redirect, (StatusCode, Html<String>)> {
    let (target, state) = parse_cmd(&form.cmd).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Html(render::command_error_page(&format!(
                "unknown control: {}",
                form.cmd
            ))),
        )
    })?;

    match ctx.dispatcher.dispatch(target, state).await {
        Ok(_) => Ok(Redirect::to("/?page=dashboard")),
        Err(e) => Err((
            StatusCode::BAD_GATEWAY,
            Html(render::command_error_page(&e.to_string())),
        )),
    }
}

/// split a "target:state" button value into a control intent
fn parse_cmd(cmd: &str) -> Option<(Target, SwitchState)> {
    let (target, state) = cmd.split_once(':')?;
    let target = match target {
        "light" => Target::Light,
        "fan" => Target::Fan,
        "pressureWasher" => Target::PressureWasher,
        _ => return None,
    };
    let state = match state {
        "ON" => SwitchState::On,
        "OFF" => SwitchState::Off,
        _ => return None,
    };
    Some((target, state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendClient;

    fn ctx() -> AppCtx {
        let state = Arc::new(RwLock::new(ConsoleState::default()));
        AppCtx {
            state: state.clone(),
            shell: Arc::new(RwLock::new(Shell::default())),
            dispatcher: Arc::new(Dispatcher::new(
                BackendClient::new("http://127.0.0.1:9"),
                state,
                45,
            )),
        }
    }

    fn events(page: Option<&str>, toggle: Option<u8>) -> ShellQuery {
        ShellQuery {
            page: page.map(str::to_string),
            vw: None,
            toggle,
            outside: None,
        }
    }

    #[tokio::test]
    async fn mobile_sidebar_toggle_survives_the_follow_up_request() {
        let ctx = ctx();
        ctx.shell.write().await.viewport_resized(500);
        assert!(!ctx.shell.read().await.sidebar_open);

        // toggle request, then the redirect target it produces, then the
        // page's own refresh echoing the active page again
        dashboard_handler(State(ctx.clone()), Query(events(None, Some(1)))).await;
        assert!(ctx.shell.read().await.sidebar_open);

        dashboard_handler(State(ctx.clone()), Query(events(Some("dashboard"), None))).await;
        assert!(ctx.shell.read().await.sidebar_open);

        dashboard_handler(State(ctx.clone()), Query(events(Some("dashboard"), None))).await;
        assert!(ctx.shell.read().await.sidebar_open);
    }

    #[tokio::test]
    async fn mobile_navigation_to_another_page_still_closes_sidebar() {
        let ctx = ctx();
        ctx.shell.write().await.viewport_resized(500);
        dashboard_handler(State(ctx.clone()), Query(events(None, Some(1)))).await;
        assert!(ctx.shell.read().await.sidebar_open);

        dashboard_handler(State(ctx.clone()), Query(events(Some("alerts"), None))).await;
        let shell = *ctx.shell.read().await;
        assert_eq!(shell.active, Page::Alerts);
        assert!(!shell.sidebar_open);
    }

    #[test]
    fn cmd_values_parse() {
        assert_eq!(
            parse_cmd("light:ON"),
            Some((Target::Light, SwitchState::On))
        );
        assert_eq!(
            parse_cmd("pressureWasher:OFF"),
            Some((Target::PressureWasher, SwitchState::Off))
        );
        assert_eq!(parse_cmd("light"), None);
        assert_eq!(parse_cmd("heater:ON"), None);
        assert_eq!(parse_cmd("fan:on"), None);
    }
}
