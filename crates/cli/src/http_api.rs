//! JSON-over-HTTP surface of the workbench.
//!
//! Every `/api/*` route except login resolves `Authorization: Bearer <token>`
//! into a [`SessionContext`]. Ingestion and the raw knowledge base are admin
//! views; query and options are open to any session. Errors always use the
//! `{"error":{"code","message","hint"}}` envelope.

use crate::server_security::bearer_token;
use crate::workbench::{IngestSummary, ServiceError, ServiceResult, Workbench};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use cmc_auth::{AuthError, CredentialStore, SessionContext, SessionRegistry, View};
use cmc_protocol::{CqaRecord, ErrorEnvelope, ErrorResponse, ReasoningRow};
use cmc_reasoning::QueryOptions;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

pub const REPORT_FILE_NAME: &str = "reasoning_results.pdf";
pub const EXPORT_FILE_NAME: &str = "CQA_KnowledgeBase_Master.csv";

#[derive(Clone)]
pub struct AppState {
    workbench: Arc<Workbench>,
    credentials: Arc<CredentialStore>,
    sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(workbench: Workbench, credentials: CredentialStore) -> Self {
        let sessions = workbench
            .config()
            .session_idle()
            .map(SessionRegistry::with_idle_timeout)
            .unwrap_or_default();
        Self {
            workbench: Arc::new(workbench),
            credentials: Arc::new(credentials),
            sessions: Arc::new(sessions),
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/session", get(session))
        .route("/api/session/view", post(switch_view))
        .route("/api/options", get(options))
        .route("/api/query", get(query))
        .route("/api/query.pdf", get(query_pdf))
        .route("/api/ingest", post(ingest))
        .route("/api/knowledge-base", get(knowledge_base))
        .route("/api/knowledge-base.csv", get(knowledge_base_csv))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// A [`ServiceError`] on its way out as an HTTP response.
pub struct ApiError(ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            ServiceError::InvalidCredentials | ServiceError::SessionRequired => {
                StatusCode::UNAUTHORIZED
            }
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::InvalidRequest(_) | ServiceError::MalformedDocument(_) => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::Storage(_) | ServiceError::Report(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("Request failed: {}", self.0);
        }

        let mut envelope = ErrorEnvelope::new(self.0.code(), self.0.to_string());
        if let Some(hint) = self.0.hint() {
            envelope = envelope.with_hint(hint);
        }
        let body = Json(ErrorResponse { error: envelope });

        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// Session context plus the menu of views its role may open.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionPayload {
    #[serde(flatten)]
    pub session: SessionContext,
    pub views: Vec<View>,
}

impl From<SessionContext> for SessionPayload {
    fn from(session: SessionContext) -> Self {
        let views = session.views().to_vec();
        Self { session, views }
    }
}

#[derive(Debug, Deserialize)]
struct ViewRequest {
    view: View,
}

#[derive(Debug, Default, Deserialize)]
struct QueryParams {
    #[serde(default)]
    modality: Option<String>,
    #[serde(default)]
    phase: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

impl QueryParams {
    fn selection(&self) -> ServiceResult<(String, String)> {
        let modality = self.modality.as_deref().map(str::trim).unwrap_or_default();
        let phase = self.phase.as_deref().map(str::trim).unwrap_or_default();
        if modality.is_empty() || phase.is_empty() {
            return Err(ServiceError::InvalidRequest(
                "Select a modality and a phase.".to_string(),
            ));
        }
        Ok((modality.to_string(), phase.to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RowsPayload<T> {
    pub rows: Vec<T>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IngestPayload {
    pub added: usize,
    pub message: String,
}

impl From<IngestSummary> for IngestPayload {
    fn from(summary: IngestSummary) -> Self {
        Self {
            added: summary.added,
            message: summary.message,
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn login(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<SessionPayload>> {
    let request: LoginRequest = serde_json::from_slice(&body).map_err(|err| {
        ServiceError::InvalidRequest(format!("Invalid JSON login request: {err}"))
    })?;

    let credentials = state.credentials.clone();
    let username = request.username.clone();
    let identity = run_blocking(move || {
        Ok(credentials.authenticate(&request.username, &request.password))
    })
    .await?;

    let Some(identity) = identity else {
        log::warn!("Login failed for user '{username}'");
        return Err(ServiceError::InvalidCredentials.into());
    };
    let session = state.sessions.login(identity);
    log::info!("User '{}' logged in as {}", session.username, session.role);
    Ok(Json(session.into()))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<StatusCode> {
    let session = require_session(&state, &headers)?;
    state.sessions.logout(&session.token);
    log::info!("User '{}' logged out", session.username);
    Ok(StatusCode::NO_CONTENT)
}

async fn session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<SessionPayload>> {
    Ok(Json(require_session(&state, &headers)?.into()))
}

async fn switch_view(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<SessionPayload>> {
    let session = require_session(&state, &headers)?;
    let request: ViewRequest = serde_json::from_slice(&body)
        .map_err(|err| ServiceError::InvalidRequest(format!("Invalid view request: {err}")))?;

    match state.sessions.switch_view(&session.token, request.view) {
        Ok(Some(updated)) => Ok(Json(updated.into())),
        Ok(None) => Err(ServiceError::SessionRequired.into()),
        Err(err @ AuthError::ViewNotAllowed(_)) => {
            Err(ServiceError::Forbidden(err.to_string()).into())
        }
        Err(err) => Err(ServiceError::InvalidRequest(err.to_string()).into()),
    }
}

async fn options(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<QueryOptions>> {
    require_session(&state, &headers)?;
    let workbench = state.workbench.clone();
    Ok(Json(run_blocking(move || workbench.options()).await?))
}

async fn query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<QueryParams>,
) -> ApiResult<Json<RowsPayload<ReasoningRow>>> {
    require_session(&state, &headers)?;
    let (modality, phase) = params.selection()?;
    let workbench = state.workbench.clone();
    let rows = run_blocking(move || workbench.query(&modality, &phase)).await?;
    Ok(Json(RowsPayload { rows }))
}

async fn query_pdf(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<QueryParams>,
) -> ApiResult<Response> {
    require_session(&state, &headers)?;
    let (modality, phase) = params.selection()?;
    let title = params.title;
    let workbench = state.workbench.clone();
    let pdf = run_blocking(move || workbench.query_pdf(&modality, &phase, title.as_deref())).await?;
    Ok(attachment("application/pdf", REPORT_FILE_NAME, pdf))
}

async fn ingest(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<QueryParams>,
    body: Bytes,
) -> ApiResult<Json<IngestPayload>> {
    let session = require_session(&state, &headers)?;
    require_view(&session, View::Ingest)?;

    let modality = params.modality.unwrap_or_default();
    let phase = params.phase.unwrap_or_default();
    let workbench = state.workbench.clone();
    let summary = run_blocking(move || workbench.ingest(&body, &modality, &phase)).await?;
    Ok(Json(summary.into()))
}

async fn knowledge_base(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<RowsPayload<CqaRecord>>> {
    let session = require_session(&state, &headers)?;
    require_view(&session, View::KnowledgeBase)?;
    let workbench = state.workbench.clone();
    let rows = run_blocking(move || workbench.records()).await?;
    Ok(Json(RowsPayload { rows }))
}

async fn knowledge_base_csv(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let session = require_session(&state, &headers)?;
    require_view(&session, View::KnowledgeBase)?;
    let workbench = state.workbench.clone();
    let csv = run_blocking(move || workbench.export_csv()).await?;
    Ok(attachment("text/csv; charset=utf-8", EXPORT_FILE_NAME, csv))
}

fn require_session(state: &AppState, headers: &HeaderMap) -> ServiceResult<SessionContext> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .and_then(|token| state.sessions.resolve(token))
        .ok_or(ServiceError::SessionRequired)
}

fn require_view(session: &SessionContext, view: View) -> ServiceResult<()> {
    if session.can_access(view) {
        return Ok(());
    }
    log::warn!(
        "User '{}' ({}) denied access to {}",
        session.username,
        session.role,
        view.as_str()
    );
    Err(ServiceError::Forbidden(format!(
        "The {} view is not available for role {}",
        view.as_str(),
        session.role
    )))
}

async fn run_blocking<T, F>(work: F) -> ApiResult<T>
where
    F: FnOnce() -> ServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| ServiceError::Internal(format!("Blocking task failed: {err}")))?
        .map_err(ApiError::from)
}

fn attachment(content_type: &str, file_name: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}
