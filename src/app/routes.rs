// ==========================================
// 停电抢修调度系统 - HTTP 路由
// ==========================================
// 职责: 将 API 层暴露为 JSON over HTTP
// 错误: 统一渲染为 {code, message, details}
// ==========================================

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::api::crew_api::parse_status_filter;
use crate::api::{
    ApiError, ApiResult, DispatchRequest, EmergencyDispatchRequest, EmergencyDispatchResponse,
    MovementStepRequest,
};
use crate::app::state::AppState;
use crate::domain::action_log::CrewActionLog;
use crate::domain::crew::{Crew, CrewWithAvailability};
use crate::domain::overtime_log::OvertimeLogEntry;
use crate::engine::dispatch_scorer::ScoreBreakdown;

/// 操作人请求头（缺省为 operator）
pub const ACTOR_HEADER: &str = "x-actor";

const DEFAULT_ACTION_LIMIT: i32 = 50;

// ==========================================
// 错误响应
// ==========================================

/// 错误响应结构
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,

    /// 错误消息
    pub message: String,

    /// 详细信息（可选）
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "请求处理失败");
        }

        let body = ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        };
        (status, Json(body)).into_response()
    }
}

// ==========================================
// 查询参数
// ==========================================

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct OvertimeQuery {
    pub crew_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetConfigRequest {
    pub key: String,
    pub value: String,
}

// ==========================================
// 路由
// ==========================================

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        // 班组
        .route("/crews", get(list_crews))
        .route("/crews/availability", get(list_crews_with_availability))
        .route("/crews/:id", get(get_crew))
        .route("/crews/:id/actions", get(list_crew_actions))
        .route("/crews/:id/dispatch", post(dispatch))
        .route("/crews/:id/emergency-dispatch", post(emergency_dispatch))
        .route("/crews/:id/movement-step", post(movement_step))
        .route("/crews/:id/advance", post(advance_to_assigned_event))
        .route("/crews/:id/return", post(start_return))
        .route("/crews/:id/mark-available", post(mark_available))
        // 事件推荐
        .route("/events/:id/recommendations", get(recommendations))
        // 审计
        .route("/overtime-logs", get(list_overtime_logs))
        // 配置
        .route("/config", get(get_config).put(set_config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 在阻塞线程池执行 API 调用（SQLite 为同步 IO）
async fn run_blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::InternalError(format!("任务执行失败: {}", e)))?
}

fn actor_from(headers: &HeaderMap) -> String {
    headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("operator")
        .to_string()
}

// ==========================================
// Handlers
// ==========================================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
    }))
}

async fn list_crews(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<Vec<Crew>>> {
    let status = parse_status_filter(query.status.as_deref())?;
    let api = state.crew_api.clone();
    run_blocking(move || api.list_crews(status)).await.map(Json)
}

async fn list_crews_with_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<Vec<CrewWithAvailability>>> {
    let status = parse_status_filter(query.status.as_deref())?;
    let api = state.crew_api.clone();
    run_blocking(move || api.list_crews_with_availability(status))
        .await
        .map(Json)
}

async fn get_crew(
    State(state): State<Arc<AppState>>,
    Path(crew_id): Path<String>,
) -> ApiResult<Json<Crew>> {
    let api = state.crew_api.clone();
    run_blocking(move || api.get_crew(&crew_id)).await.map(Json)
}

async fn list_crew_actions(
    State(state): State<Arc<AppState>>,
    Path(crew_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<CrewActionLog>>> {
    let limit = match query.limit {
        Some(n) => i32::try_from(n).map_err(|_| ApiError::InvalidInput("limit过大".to_string()))?,
        None => DEFAULT_ACTION_LIMIT,
    };
    let api = state.crew_api.clone();
    run_blocking(move || api.list_crew_actions(&crew_id, limit))
        .await
        .map(Json)
}

async fn dispatch(
    State(state): State<Arc<AppState>>,
    Path(crew_id): Path<String>,
    Json(request): Json<DispatchRequest>,
) -> ApiResult<Json<Crew>> {
    let api = state.crew_api.clone();
    run_blocking(move || api.dispatch(&crew_id, &request))
        .await
        .map(Json)
}

async fn emergency_dispatch(
    State(state): State<Arc<AppState>>,
    Path(crew_id): Path<String>,
    Json(request): Json<EmergencyDispatchRequest>,
) -> ApiResult<Json<EmergencyDispatchResponse>> {
    let api = state.crew_api.clone();
    run_blocking(move || api.emergency_dispatch(&crew_id, &request))
        .await
        .map(Json)
}

async fn movement_step(
    State(state): State<Arc<AppState>>,
    Path(crew_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<MovementStepRequest>,
) -> ApiResult<Json<Crew>> {
    let actor = actor_from(&headers);
    let api = state.crew_api.clone();
    run_blocking(move || api.movement_step(&crew_id, &request, &actor))
        .await
        .map(Json)
}

async fn advance_to_assigned_event(
    State(state): State<Arc<AppState>>,
    Path(crew_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Crew>> {
    let actor = actor_from(&headers);
    let api = state.crew_api.clone();
    run_blocking(move || api.movement_step_to_assigned_event(&crew_id, &actor))
        .await
        .map(Json)
}

async fn start_return(
    State(state): State<Arc<AppState>>,
    Path(crew_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Crew>> {
    let actor = actor_from(&headers);
    let api = state.crew_api.clone();
    run_blocking(move || api.start_return(&crew_id, &actor))
        .await
        .map(Json)
}

async fn mark_available(
    State(state): State<Arc<AppState>>,
    Path(crew_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Crew>> {
    let actor = actor_from(&headers);
    let api = state.crew_api.clone();
    run_blocking(move || api.mark_available(&crew_id, &actor))
        .await
        .map(Json)
}

async fn recommendations(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<ScoreBreakdown>>> {
    let api = state.recommendation_api.clone();
    run_blocking(move || api.get_recommendations(&event_id, query.limit))
        .await
        .map(Json)
}

async fn list_overtime_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OvertimeQuery>,
) -> ApiResult<Json<Vec<OvertimeLogEntry>>> {
    let api = state.crew_api.clone();
    run_blocking(move || api.list_overtime_logs(query.crew_id.as_deref()))
        .await
        .map(Json)
}

async fn get_config(State(state): State<Arc<AppState>>) -> ApiResult<Json<serde_json::Value>> {
    let manager = state.config_manager.clone();
    let snapshot = run_blocking(move || Ok(manager.get_config_snapshot()?)).await?;
    let value = serde_json::from_str(&snapshot)
        .map_err(|e| ApiError::InternalError(format!("配置快照解析失败: {}", e)))?;
    Ok(Json(value))
}

/// 写入配置（服务重启后生效）
async fn set_config(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetConfigRequest>,
) -> ApiResult<StatusCode> {
    let manager = state.config_manager.clone();
    run_blocking(move || Ok(manager.set_config_value(&request.key, &request.value)?)).await?;
    Ok(StatusCode::NO_CONTENT)
}
