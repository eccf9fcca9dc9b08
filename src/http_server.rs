// HTTP server - exposes the submission, verification, and audit boundaries

use axum::{
    extract::{ConnectInfo, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::audit::{AuditEntry, AuditLedger};
use crate::db::Database;
use crate::privacy::placeholders::{Category, PlaceholderEngine, RedactionResult};
use crate::privacy::sanitized_logger::SanitizedLogger;
use crate::providers::{provider_from_settings, CompletionProvider};
use crate::rate_limit::{IdempotencyCache, RateLimiter};
use crate::receipts::{
    issue_receipt, utc_now_iso, verify_deletion, Attestation, IssuedReceipt, KeyRegistry,
    ReceiptSigner, VerificationOutcome,
};
use crate::settings::{Settings, VaultMode};
use crate::vault::{MemoryVaultStore, PresenceVault};

const RATE_LIMIT_MAX: usize = 30;
const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);
const IDEMPOTENCY_TTL: Duration = Duration::from_secs(600);

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub engine: Arc<PlaceholderEngine>,
    pub signer: Arc<ReceiptSigner>,
    pub vault: Arc<PresenceVault>,
    pub ledger: Arc<AuditLedger>,
    pub limiter: Arc<RateLimiter>,
    pub idempotency: Arc<IdempotencyCache>,
    pub provider: Arc<dyn CompletionProvider>,
    pub logger: SanitizedLogger,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn from_settings(settings: Settings, db: Database) -> Self {
        let registry = KeyRegistry::new(
            &settings.key_version,
            &settings.signing_secret,
            settings.retired_secrets.clone(),
        );
        let vault = match settings.vault_mode {
            VaultMode::Memory => PresenceVault::new(Some(Arc::new(MemoryVaultStore::new()))),
            VaultMode::Off => PresenceVault::unconfigured(),
        };
        let provider = provider_from_settings(&settings);

        AppState {
            db: db.clone(),
            engine: Arc::new(PlaceholderEngine::new()),
            signer: Arc::new(ReceiptSigner::new(registry)),
            vault: Arc::new(vault),
            ledger: Arc::new(AuditLedger::new(db)),
            limiter: Arc::new(RateLimiter::new(RATE_LIMIT_MAX, RATE_LIMIT_WINDOW)),
            idempotency: Arc::new(IdempotencyCache::new(IDEMPOTENCY_TTL)),
            provider,
            logger: SanitizedLogger::new(),
            settings: Arc::new(settings),
        }
    }
}

pub async fn run_http_server(state: AppState, port: u16) {
    let origins: Vec<HeaderValue> = state
        .settings
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/redact", post(redact))
        .route("/ai/complete", post(ai_complete))
        .route("/receipts/process", post(process_receipt))
        .route("/receipts/verify", post(verify_receipt))
        .route("/audit/export", get(export_audit))
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind HTTP server to port {}: {}", port, e);
            eprintln!("Try setting CAPSULE_HTTP_PORT to a different port, e.g.:");
            eprintln!("  CAPSULE_HTTP_PORT=8001 cargo run --bin capsule-server");
            return;
        }
    };
    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        eprintln!("HTTP server error: {}", e);
    }
}

// Root route - shows API info and available endpoints
async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "Capsule API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "health": "GET /health",
            "redact": "POST /redact",
            "complete": "POST /ai/complete",
            "receipts": {
                "process": "POST /receipts/process",
                "verify": "POST /receipts/verify"
            },
            "audit": "GET /audit/export?format=csv&from=&to="
        }
    }))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(serde::Deserialize)]
pub struct RedactRequest {
    pub text: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

async fn redact(State(state): State<AppState>, Json(req): Json<RedactRequest>) -> impl IntoResponse {
    let result = redact_impl(&state, &req.text, &req.categories);
    (StatusCode::OK, Json(result)).into_response()
}

pub fn redact_impl(state: &AppState, text: &str, category_names: &[String]) -> RedactionResult {
    let categories = Category::parse_list(category_names);
    state.engine.detect_and_substitute(text, &categories)
}

#[derive(serde::Deserialize)]
pub struct CompleteRequest {
    pub prompt: String,
}

async fn ai_complete(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<CompleteRequest>,
) -> impl IntoResponse {
    let idempotency_key = headers
        .get("Idempotency-Key")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let client_ip = addr.ip().to_string();

    match ai_complete_impl(&state, &req.prompt, idempotency_key, &client_ip).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err((status, e)) => (status, Json(serde_json::json!({ "error": e }))).into_response(),
    }
}

/// Submission path: replay from the idempotency cache, rate limit, redact
/// with the configured category policy, call the provider with sanitized
/// text only, then append the audit row (a hard failure, unlike the vault).
pub async fn ai_complete_impl(
    state: &AppState,
    prompt: &str,
    idempotency_key: Option<String>,
    client_ip: &str,
) -> Result<serde_json::Value, (StatusCode, String)> {
    let started = Instant::now();

    if let Some(key) = &idempotency_key {
        if let Some(cached) = state.idempotency.get(key) {
            return Ok(cached);
        }
    }

    if !state.limiter.check(client_ip) {
        state.logger.log_warn(
            "rate_limited",
            &SanitizedLogger::fields().event_type("ai_complete").build(),
        );
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded".to_string(),
        ));
    }

    let request_id = idempotency_key
        .clone()
        .unwrap_or_else(|| format!("req-{}", Uuid::new_v4()));

    let redaction = state
        .engine
        .detect_and_substitute(prompt, &state.settings.redact_categories);

    let completion = state
        .provider
        .complete(&redaction.sanitized_text)
        .await
        .map_err(|e| {
            state.logger.log_error(
                "provider_error",
                "provider_unreachable",
                &SanitizedLogger::fields().request_id(&request_id).build(),
            );
            (
                StatusCode::BAD_GATEWAY,
                state.logger.sanitize_error_message(&e.to_string()),
            )
        })?;

    let entry = AuditEntry {
        request_id: request_id.clone(),
        ts: utc_now_iso(),
        text_redactions: redaction
            .matched_categories()
            .iter()
            .map(|c| c.label().to_string())
            .collect(),
        image_masks: vec![],
        placeholders_used: redaction.placeholder_map.tokens(),
        policy_snapshot: serde_json::json!({
            "text": {
                "redact": state
                    .settings
                    .redact_categories
                    .iter()
                    .map(|c| c.label())
                    .collect::<Vec<_>>()
            }
        }),
    };
    state
        .ledger
        .append(&entry)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    state.logger.log_info(
        "ai_complete",
        &SanitizedLogger::fields()
            .request_id(&request_id)
            .redaction_count(redaction.placeholder_map.len())
            .latency_ms(started.elapsed().as_millis() as u64)
            .build(),
    );

    let response = serde_json::json!({ "completion": completion });
    if let Some(key) = &idempotency_key {
        state.idempotency.put(key, response.clone());
    }
    Ok(response)
}

#[derive(serde::Deserialize)]
pub struct ProcessRequest {
    pub input_hash: String,
}

async fn process_receipt(
    State(state): State<AppState>,
    Json(req): Json<ProcessRequest>,
) -> impl IntoResponse {
    match process_receipt_impl(&state, &req.input_hash) {
        Ok(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e })),
        )
            .into_response(),
    }
}

pub fn process_receipt_impl(state: &AppState, input_hash: &str) -> Result<IssuedReceipt, String> {
    issue_receipt(
        &state.signer,
        &state.vault,
        &state.db,
        input_hash,
        state.settings.receipt_ttl_seconds,
    )
    .map_err(|e| e.to_string())
}

#[derive(serde::Deserialize)]
pub struct VerifyRequest {
    pub receipt: Attestation,
}

async fn verify_receipt(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> impl IntoResponse {
    let outcome = verify_receipt_impl(&state, &req.receipt);
    (StatusCode::OK, Json(outcome)).into_response()
}

pub fn verify_receipt_impl(state: &AppState, attestation: &Attestation) -> VerificationOutcome {
    verify_deletion(&state.signer, &state.vault, attestation)
}

#[derive(serde::Deserialize)]
pub struct ExportParams {
    pub format: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

async fn export_audit(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> impl IntoResponse {
    if params.format.as_deref().unwrap_or("csv") != "csv" {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "Only csv export is supported" })),
        )
            .into_response();
    }
    match state
        .ledger
        .export_csv(params.from.as_deref(), params.to.as_deref())
    {
        Ok(csv) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv")],
            csv,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}
