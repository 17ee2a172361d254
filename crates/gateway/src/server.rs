use std::{any::Any, sync::Arc};

use {
    axum::{
        Router,
        body::Bytes,
        extract::{Path, State},
        http::{HeaderMap, HeaderValue, Method, StatusCode},
        response::{IntoResponse, Json, Response},
        routing::{get, post},
    },
    decoy_config::DecoyConfig,
    decoy_protocol::{AnalyzeResponse, HealthResponse},
    decoy_sessions::SessionStore,
    tower_http::{
        catch_panic::CatchPanicLayer,
        cors::{AllowOrigin, Any as AnyOrigin, CorsLayer},
        trace::TraceLayer,
    },
    tracing::{error, info, warn},
};

use crate::{auth::AuthError, engage, state::GatewayState};

// ── Errors ───────────────────────────────────────────────────────────────────

enum ApiError {
    Unauthorized(AuthError),
    NotFound,
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        Self::Unauthorized(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized(e) => e.into_response(),
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "detail": "Session not found" })),
            )
                .into_response(),
        }
    }
}

// ── Router ───────────────────────────────────────────────────────────────────

/// Build the gateway router (shared between production startup and tests).
pub fn build_gateway_app(state: Arc<GatewayState>, cors_origins: &[String]) -> Router {
    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/", get(root_handler).post(analyze_handler))
        .route("/analyze", post(analyze_handler))
        .route(
            "/session/{id}",
            get(get_session_handler).delete(end_session_handler),
        )
        .with_state(state);
    with_http_layers(router, cors_origins)
}

fn with_http_layers(router: Router, cors_origins: &[String]) -> Router {
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() || origins.iter().any(|o| o == "*") {
        AllowOrigin::from(AnyOrigin)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!(origin = %o, error = %e, "ignoring invalid CORS origin");
                    None
                },
            })
            .collect();
        AllowOrigin::list(parsed)
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(AnyOrigin)
}

/// A panicking handler still answers with a well-formed result.
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = %detail, "request handler panicked");
    Json(AnalyzeResponse::fallback(
        String::new(),
        "Request processed with fallback after an internal error",
    ))
    .into_response()
}

// ── Server startup ───────────────────────────────────────────────────────────

/// Start the HTTP gateway and run until Ctrl-C. Pending callback dispatches
/// are awaited before returning.
pub async fn start_gateway(config: &DecoyConfig) -> anyhow::Result<()> {
    let state = Arc::new(GatewayState::from_config(config).await?);
    if !state.auth.is_enabled() {
        warn!("no API key configured, all endpoints are open");
    }

    let app = build_gateway_app(Arc::clone(&state), &config.server.cors_origins);
    let listener =
        tokio::net::TcpListener::bind((config.server.bind.as_str(), config.server.port)).await?;
    let addr = listener.local_addr()?;

    // Startup banner.
    let slots = state.chain.slot_names();
    let lines = [
        format!("decoy gateway v{}", state.version),
        format!("listening on {addr}"),
        format!(
            "persona: {}, {} provider slot(s){}",
            state.persona.name,
            slots.len(),
            if slots.is_empty() {
                " (fallback replies only)".to_string()
            } else {
                format!(": {}", slots.join(", "))
            }
        ),
        format!(
            "callback: {}",
            state
                .dispatcher
                .as_ref()
                .map_or("disabled", |d| d.url())
        ),
    ];
    let width = lines.iter().map(|l| l.len()).max().unwrap_or(0) + 4;
    info!("┌{}┐", "─".repeat(width));
    for line in &lines {
        info!("│  {:<w$}│", line, w = width - 2);
    }
    info!("└{}┘", "─".repeat(width));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.tasks.close();
    if !state.tasks.is_empty() {
        info!(pending = state.tasks.len(), "waiting for callback dispatches");
    }
    state.tasks.wait().await;
    info!("gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("received shutdown signal");
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

async fn root_handler(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "decoy scam-engagement honeypot",
        "version": state.version,
        "endpoints": {
            "analyze": "POST /analyze",
            "session": "GET /session/{id}",
            "end": "DELETE /session/{id}",
            "health": "GET /health",
        },
    }))
}

async fn analyze_handler(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    state.auth.check_headers(&headers)?;

    let raw = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|e| {
            warn!(error = %e, "unparseable request body, using defaults");
            serde_json::Value::Null
        })
    };
    let request = decoy_protocol::normalize(raw);
    Ok(Json(engage::process(&state, request).await))
}

async fn get_session_handler(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.auth.check_headers(&headers)?;
    let session = state.store.get(&id).await.ok_or(ApiError::NotFound)?;
    Ok(Json(engage::session_view(&session)))
}

async fn end_session_handler(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.auth.check_headers(&headers)?;
    let ended = engage::end_session(&state, &id)
        .await
        .ok_or(ApiError::NotFound)?;
    Ok(Json(serde_json::json!({
        "status": "terminated",
        "sessionId": ended.id,
        "callbackSent": ended.callback_sent,
    })))
}
