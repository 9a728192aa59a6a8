//! HTTP entry point.
//!
//! `POST /` runs one plugin invocation. `/manifest.json` serves the
//! capability manifest on `GET` and validates settings on `POST`. Every other
//! method on these routes is answered with `405`.

mod manifest;

pub use manifest::{CommandEntry, LISTENED_EVENTS, Manifest, PLUGIN_NAME};

use crate::config::{EnvValues, PluginEnv, SettingsError, StartStopSettings};
use crate::plugin::{PluginInputs, RunnerConfig, run_plugin};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::fmt::Display;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Path of the manifest route.
pub const MANIFEST_PATH: &str = "/manifest.json";

/// Immutable configuration shared by all requests.
#[derive(Debug, Clone)]
pub struct ServerState {
    /// Outbound connection options.
    pub runner: RunnerConfig,
    /// Environment values used when a request does not supply its own.
    pub default_env: EnvValues,
}

/// Builds the plugin router.
pub fn build_router(state: ServerState) -> Router {
    Router::new()
        .route("/", post(handle_invocation).fallback(method_not_allowed))
        .route(
            MANIFEST_PATH,
            get(handle_manifest)
                .post(handle_manifest_validation)
                .fallback(method_not_allowed),
        )
        .with_state(Arc::new(state))
}

/// Serves the router on `listener` until Ctrl-C is received.
///
/// # Errors
///
/// Returns the I/O error that stopped the server.
pub async fn serve(listener: TcpListener, state: ServerState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "start/stop plugin listening");
    }
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_err() {
                warn!("failed to install Ctrl-C handler");
            }
        })
        .await
}

async fn handle_invocation(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(response) = require_json(&headers) {
        return response;
    }
    let inputs: PluginInputs = match serde_json::from_slice(&body) {
        Ok(inputs) => inputs,
        Err(err) => return internal_error(&err),
    };
    let (settings, env) =
        match validate(&inputs.settings, inputs.env.as_ref(), &state.default_env) {
            Ok(validated) => validated,
            Err(err) => return invalid_configuration(&err),
        };
    match run_plugin(&inputs, settings, &env, &state.runner).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "message": "OK" }))).into_response(),
        Err(err) => internal_error(&err),
    }
}

async fn handle_manifest() -> Json<Manifest> {
    Json(Manifest::current())
}

async fn handle_manifest_validation(headers: HeaderMap, body: Bytes) -> Response {
    if let Err(response) = require_json(&headers) {
        return response;
    }
    let document: Value = match serde_json::from_slice(&body) {
        Ok(document) => document,
        Err(err) => return internal_error(&err),
    };
    let settings = document.get("settings").unwrap_or(&Value::Null);
    match StartStopSettings::from_value(settings) {
        Ok(_) => (StatusCode::OK, Json(json!({ "message": "Schema is valid" }))).into_response(),
        Err(err) => invalid_configuration(&err),
    }
}

async fn method_not_allowed() -> Response {
    let mut response = (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "message": "Only POST requests are supported." })),
    )
        .into_response();
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static("POST"));
    response
}

fn require_json(headers: &HeaderMap) -> Result<(), Response> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    match content_type {
        Some(value) if value.starts_with("application/json") => Ok(()),
        other => {
            let shown = other.unwrap_or("null");
            warn!(content_type = shown, "rejected request content type");
            Err((
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": format!("Error: {shown} is not a valid content type") })),
            )
                .into_response())
        }
    }
}

fn validate(
    settings: &Value,
    env: Option<&Value>,
    defaults: &EnvValues,
) -> Result<(StartStopSettings, PluginEnv), SettingsError> {
    match (
        StartStopSettings::from_value(settings),
        PluginEnv::resolve(env, defaults),
    ) {
        (Ok(decoded), Ok(resolved)) => Ok((decoded, resolved)),
        (Err(mut first), Err(second)) => {
            first.merge(second);
            Err(first)
        }
        (Err(err), Ok(_)) | (Ok(_), Err(err)) => Err(err),
    }
}

fn invalid_configuration(err: &SettingsError) -> Response {
    warn!(errors = err.errors().len(), "invalid configuration");
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "message": "Bad Request: invalid configuration.",
            "errors": err.errors(),
        })),
    )
        .into_response()
}

fn internal_error(err: &impl Display) -> Response {
    error!(error = %err, "invocation failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": err.to_string() })),
    )
        .into_response()
}
