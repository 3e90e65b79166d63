// ==========================================
// 停电抢修调度系统 - 班组调度 API
// ==========================================
// 职责: 班组查询、派遣、紧急派遣、移动推进、返回、恢复待命
// 并发: 每次写入为一次完整的 读-改-写,revision 冲突时有限次重试
// 红线: 被拒绝的操作不改变班组记录;所有写入记录操作日志
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::error::{ApiError, ApiResult};
use crate::clock::Clock;
use crate::config::DispatchConfig;
use crate::domain::action_log::{ActionType, CrewActionLog};
use crate::domain::crew::{Crew, CrewWithAvailability};
use crate::domain::event::{GeoPoint, OutageEvent};
use crate::domain::overtime_log::OvertimeLogEntry;
use crate::domain::types::{CrewStatus, DutyStatus};
use crate::engine::crew_state_machine::{
    CrewAction, CrewStateMachine, DispatchOrder, EmergencyAuthorization, TransitionError,
};
use crate::engine::geo;
use crate::engine::movement::{MovementParams, MovementSimulator, MovementStep};
use crate::engine::shift_availability;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::crew_repo::CrewStore;
use crate::repository::error::RepositoryError;
use crate::repository::event_repo::EventStore;
use crate::repository::overtime_log_repo::OvertimeLogStore;

/// 自动推进时使用的操作人
pub const SYSTEM_ACTOR: &str = "system";

// ==========================================
// 请求 / 响应
// ==========================================

/// 普通派遣请求
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRequest {
    pub event_id: String,
    #[serde(default)]
    pub dispatched_by: Option<String>,
}

/// 紧急派遣请求
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyDispatchRequest {
    pub event_id: String,
    pub authorized_by: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// 移动推进请求
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementStepRequest {
    pub target_lat: f64,
    pub target_lng: f64,
}

/// 紧急派遣结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyDispatchResponse {
    pub crew: Crew,
    pub overtime_log: OvertimeLogEntry,
}

/// 解析状态过滤参数（空串视为不过滤）
pub fn parse_status_filter(raw: Option<&str>) -> ApiResult<Option<CrewStatus>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => CrewStatus::from_db_str(s)
            .map(Some)
            .ok_or_else(|| ApiError::InvalidInput(format!("未知班组状态: {}", s))),
    }
}

// ==========================================
// CrewApi - 班组调度 API
// ==========================================

/// 班组调度API
///
/// 职责：
/// 1. 班组查询（含在岗视图）
/// 2. 状态流转（派遣/紧急派遣/推进/返回/恢复待命）
/// 3. 加班记录与操作日志
pub struct CrewApi {
    crew_store: Arc<dyn CrewStore>,
    event_store: Arc<dyn EventStore>,
    overtime_store: Arc<dyn OvertimeLogStore>,
    action_log_repo: Arc<ActionLogRepository>,
    clock: Arc<dyn Clock>,
    config: DispatchConfig,
    simulator: MovementSimulator,
}

impl CrewApi {
    /// 创建新的CrewApi实例
    pub fn new(
        crew_store: Arc<dyn CrewStore>,
        event_store: Arc<dyn EventStore>,
        overtime_store: Arc<dyn OvertimeLogStore>,
        action_log_repo: Arc<ActionLogRepository>,
        clock: Arc<dyn Clock>,
        config: DispatchConfig,
    ) -> Self {
        let simulator = MovementSimulator::new(MovementParams {
            step_fraction: config.movement_step_fraction,
            arrival_threshold_km: config.arrival_threshold_km,
            speed_kmh: config.average_speed_kmh,
        });

        Self {
            crew_store,
            event_store,
            overtime_store,
            action_log_repo,
            clock,
            config,
            simulator,
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 查询班组列表（按 crew_id 升序）
    pub fn list_crews(&self, status: Option<CrewStatus>) -> ApiResult<Vec<Crew>> {
        Ok(self.crew_store.list_crews(status)?)
    }

    /// 查询单个班组
    pub fn get_crew(&self, crew_id: &str) -> ApiResult<Crew> {
        if crew_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("班组ID不能为空".to_string()));
        }
        self.load_crew(crew_id)
    }

    /// 查询班组列表,附带当前时刻的在岗判定（每次重新计算）
    pub fn list_crews_with_availability(
        &self,
        status: Option<CrewStatus>,
    ) -> ApiResult<Vec<CrewWithAvailability>> {
        let crews = self.crew_store.list_crews(status)?;
        Ok(crews
            .into_iter()
            .map(|crew| shift_availability::annotate(crew, self.clock.as_ref()))
            .collect())
    }

    /// 查询加班派遣记录
    pub fn list_overtime_logs(&self, crew_id: Option<&str>) -> ApiResult<Vec<OvertimeLogEntry>> {
        let crew_id = crew_id.map(str::trim).filter(|s| !s.is_empty());
        Ok(self.overtime_store.list_overtime_logs(crew_id)?)
    }

    /// 查询班组操作日志（按时间倒序）
    pub fn list_crew_actions(&self, crew_id: &str, limit: i32) -> ApiResult<Vec<CrewActionLog>> {
        if limit <= 0 {
            return Err(ApiError::InvalidInput("limit必须大于0".to_string()));
        }
        self.load_crew(crew_id)?;
        Ok(self.action_log_repo.find_by_crew(crew_id, limit)?)
    }

    // ==========================================
    // 状态流转
    // ==========================================

    /// 普通派遣: available → dispatched
    ///
    /// # 错误
    /// - NotFound: 班组或事件不存在
    /// - InvalidGeometry: 事件缺少地理中心
    /// - IllegalTransition: 班组不在 available
    /// - BusinessRuleViolation: 班组非在岗且配置要求走紧急派遣
    /// - StoreConflict: 重试耗尽
    pub fn dispatch(&self, crew_id: &str, request: &DispatchRequest) -> ApiResult<Crew> {
        let event_id = request.event_id.trim();
        if event_id.is_empty() {
            return Err(ApiError::InvalidInput("事件ID不能为空".to_string()));
        }
        let actor = request
            .dispatched_by
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("operator");

        self.with_conflict_retry(crew_id, CrewAction::Dispatch, || {
            let crew = self.load_crew(crew_id)?;
            let (event, center) = self.load_event_with_center(event_id)?;
            let now = self.clock.now();

            let distance_km = geo::distance_between(crew.position(), center);
            let eta = geo::eta_minutes(distance_km, self.config.average_speed_kmh);
            let order = DispatchOrder {
                event_id: &event.event_id,
                eta_minutes: eta,
                now,
            };

            let mut next = CrewStateMachine::dispatch(&crew, &order)
                .map_err(|e| self.reject(&crew, e))?;

            let duty = shift_availability::evaluate(&crew.schedule, now).duty_status;
            if duty == DutyStatus::OffDuty && self.config.require_emergency_for_off_duty {
                tracing::warn!(
                    crew_id = %crew.crew_id,
                    event_id = %event.event_id,
                    "班组非在岗,普通派遣被拒绝"
                );
                return Err(ApiError::BusinessRuleViolation(format!(
                    "班组{}当前非在岗,请使用紧急派遣并提供授权人",
                    crew.crew_id
                )));
            }

            next.updated_at = now;
            let stored = self.crew_store.update_crew(&next)?;

            tracing::info!(
                crew_id = %stored.crew_id,
                event_id = %event.event_id,
                from = %crew.status,
                to = %stored.status,
                eta_minutes = eta,
                "班组已派遣"
            );
            self.record_action(
                CrewActionLog::new(&stored.crew_id, ActionType::Dispatch, actor, now)
                    .with_event(Some(&event.event_id))
                    .with_transition(crew.status, stored.status)
                    .with_payload(&json!({
                        "eta_minutes": eta,
                        "distance_km": distance_km,
                        "duty_status": duty,
                    })),
            );

            Ok(stored)
        })
    }

    /// 紧急派遣: 非在岗班组 available → dispatched,并追加一条加班记录
    ///
    /// 班组写回与加班记录在同一事务内提交,任一失败则都不落库
    pub fn emergency_dispatch(
        &self,
        crew_id: &str,
        request: &EmergencyDispatchRequest,
    ) -> ApiResult<EmergencyDispatchResponse> {
        let event_id = request.event_id.trim();
        let authorized_by = request.authorized_by.trim();
        if event_id.is_empty() {
            return Err(ApiError::InvalidInput("事件ID不能为空".to_string()));
        }
        if authorized_by.is_empty() {
            return Err(ApiError::InvalidInput("紧急派遣必须提供授权人".to_string()));
        }

        self.with_conflict_retry(crew_id, CrewAction::EmergencyDispatch, || {
            let crew = self.load_crew(crew_id)?;
            let (event, center) = self.load_event_with_center(event_id)?;
            let now = self.clock.now();

            let duty = shift_availability::evaluate(&crew.schedule, now).duty_status;
            let distance_km = geo::distance_between(crew.position(), center);
            let eta = geo::eta_minutes(distance_km, self.config.average_speed_kmh);
            let order = DispatchOrder {
                event_id: &event.event_id,
                eta_minutes: eta,
                now,
            };
            let auth = EmergencyAuthorization {
                authorized_by,
                reason: request.reason.clone(),
                notes: request.notes.clone(),
            };

            let (mut next, entry) = CrewStateMachine::emergency_dispatch(&crew, duty, &order, &auth)
                .map_err(|e| self.reject(&crew, e))?;

            next.updated_at = now;
            let stored = self
                .crew_store
                .update_crew_with_overtime(&next, &entry)
                .map_err(|e| {
                    // revision 冲突交给外层重试
                    if matches!(e, RepositoryError::OptimisticLockFailure { .. }) {
                        return e;
                    }
                    tracing::error!(
                        crew_id = %crew.crew_id,
                        event_id = %event.event_id,
                        error = %e,
                        "紧急派遣写入失败,班组与加班记录均未提交"
                    );
                    e
                })?;

            tracing::warn!(
                crew_id = %stored.crew_id,
                event_id = %event.event_id,
                authorized_by = authorized_by,
                from = %crew.status,
                to = %stored.status,
                log_id = %entry.log_id,
                "非在岗班组紧急派遣"
            );
            self.record_action(
                CrewActionLog::new(
                    &stored.crew_id,
                    ActionType::EmergencyDispatch,
                    authorized_by,
                    now,
                )
                .with_event(Some(&event.event_id))
                .with_transition(crew.status, stored.status)
                .with_payload(&json!({
                    "eta_minutes": eta,
                    "distance_km": distance_km,
                    "overtime_log_id": entry.log_id,
                })),
            );

            Ok(EmergencyDispatchResponse {
                crew: stored,
                overtime_log: entry,
            })
        })
    }

    /// 向指定目标点推进一步
    pub fn movement_step(
        &self,
        crew_id: &str,
        request: &MovementStepRequest,
        actor: &str,
    ) -> ApiResult<Crew> {
        let target = validate_target(request.target_lat, request.target_lng)?;

        self.with_conflict_retry(crew_id, CrewAction::MovementTick, || {
            let crew = self.load_crew(crew_id)?;
            self.advance(&crew, target, actor)
        })
    }

    /// 向已分配事件的地理中心推进一步
    ///
    /// # 错误
    /// - IllegalTransition: 班组没有已分配事件或不在移动状态
    /// - InvalidGeometry: 事件缺少地理中心
    pub fn movement_step_to_assigned_event(&self, crew_id: &str, actor: &str) -> ApiResult<Crew> {
        self.with_conflict_retry(crew_id, CrewAction::MovementTick, || {
            let crew = self.load_crew(crew_id)?;
            let event_id = match crew.assigned_event_id.as_deref() {
                Some(id) => id,
                None => {
                    return Err(self.reject(
                        &crew,
                        TransitionError::IllegalTransition {
                            from: crew.status,
                            action: CrewAction::MovementTick,
                        },
                    ))
                }
            };
            let (_, center) = self.load_event_with_center(event_id)?;
            self.advance(&crew, center, actor)
        })
    }

    /// 开始返回: on_site → returning
    pub fn start_return(&self, crew_id: &str, actor: &str) -> ApiResult<Crew> {
        self.with_conflict_retry(crew_id, CrewAction::StartReturn, || {
            let crew = self.load_crew(crew_id)?;
            let now = self.clock.now();

            let mut next =
                CrewStateMachine::start_return(&crew).map_err(|e| self.reject(&crew, e))?;
            next.updated_at = now;
            let stored = self.crew_store.update_crew(&next)?;

            tracing::info!(
                crew_id = %stored.crew_id,
                event_id = ?stored.assigned_event_id,
                from = %crew.status,
                to = %stored.status,
                "班组开始返回"
            );
            self.record_action(
                CrewActionLog::new(&stored.crew_id, ActionType::StartReturn, actor, now)
                    .with_event(stored.assigned_event_id.as_deref())
                    .with_transition(crew.status, stored.status),
            );

            Ok(stored)
        })
    }

    /// 恢复待命: on_site/returning → available,清空任务字段
    pub fn mark_available(&self, crew_id: &str, actor: &str) -> ApiResult<Crew> {
        self.with_conflict_retry(crew_id, CrewAction::MarkAvailable, || {
            let crew = self.load_crew(crew_id)?;
            let now = self.clock.now();

            let mut next =
                CrewStateMachine::mark_available(&crew).map_err(|e| self.reject(&crew, e))?;
            next.updated_at = now;
            let stored = self.crew_store.update_crew(&next)?;

            tracing::info!(
                crew_id = %stored.crew_id,
                event_id = ?crew.assigned_event_id,
                from = %crew.status,
                to = %stored.status,
                "班组恢复待命"
            );
            self.record_action(
                CrewActionLog::new(&stored.crew_id, ActionType::MarkAvailable, actor, now)
                    .with_event(crew.assigned_event_id.as_deref())
                    .with_transition(crew.status, stored.status),
            );

            Ok(stored)
        })
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn load_crew(&self, crew_id: &str) -> ApiResult<Crew> {
        self.crew_store
            .get_crew(crew_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Crew(id={})不存在", crew_id)))
    }

    fn load_event_with_center(&self, event_id: &str) -> ApiResult<(OutageEvent, GeoPoint)> {
        let event = self
            .event_store
            .get_event(event_id)?
            .ok_or_else(|| ApiError::NotFound(format!("OutageEvent(id={})不存在", event_id)))?;

        match event.geo_center {
            Some(center) => Ok((event, center)),
            None => Err(ApiError::InvalidGeometry {
                event_id: event.event_id,
            }),
        }
    }

    /// 单步推进并写回
    fn advance(&self, crew: &Crew, target: GeoPoint, actor: &str) -> ApiResult<Crew> {
        let now = self.clock.now();
        let step: MovementStep = self.simulator.step(crew.position(), target);

        let mut next = CrewStateMachine::apply_movement(crew, &step)
            .map_err(|e| self.reject(crew, e))?;
        next.updated_at = now;
        let stored = self.crew_store.update_crew(&next)?;

        let action_type = if step.arrived {
            tracing::info!(
                crew_id = %stored.crew_id,
                event_id = ?stored.assigned_event_id,
                from = %crew.status,
                to = %stored.status,
                "班组已到达现场"
            );
            ActionType::Arrive
        } else {
            tracing::debug!(
                crew_id = %stored.crew_id,
                remaining_km = step.remaining_km,
                eta_minutes = step.eta_minutes,
                "班组移动推进"
            );
            ActionType::MovementStep
        };

        self.record_action(
            CrewActionLog::new(&stored.crew_id, action_type, actor, now)
                .with_event(stored.assigned_event_id.as_deref())
                .with_transition(crew.status, stored.status)
                .with_payload(&step),
        );

        Ok(stored)
    }

    /// 加班记录失败后恢复班组原字段
    /// 流转被拒绝: 记录告警并转换错误
    fn reject(&self, crew: &Crew, err: TransitionError) -> ApiError {
        tracing::warn!(
            crew_id = %crew.crew_id,
            status = %crew.status,
            error = %err,
            "班组操作被拒绝"
        );
        err.into()
    }

    /// 写入操作日志;失败只告警,不影响已提交的班组写入
    fn record_action(&self, log: CrewActionLog) {
        if let Err(e) = self.action_log_repo.insert(&log) {
            tracing::warn!(
                crew_id = %log.crew_id,
                action_type = %log.action_type,
                error = %e,
                "操作日志写入失败"
            );
        }
    }

    /// revision 冲突时重试整个 读-改-写 周期
    fn with_conflict_retry<T>(
        &self,
        crew_id: &str,
        action: CrewAction,
        mut attempt: impl FnMut() -> ApiResult<T>,
    ) -> ApiResult<T> {
        let max_retries = self.config.max_conflict_retries;
        let mut retries = 0;

        loop {
            match attempt() {
                Err(ApiError::StoreConflict(msg)) => {
                    if retries >= max_retries {
                        tracing::warn!(
                            crew_id = crew_id,
                            action = %action,
                            retries = retries,
                            "并发冲突重试耗尽"
                        );
                        return Err(ApiError::StoreConflict(msg));
                    }
                    retries += 1;
                    tracing::debug!(
                        crew_id = crew_id,
                        action = %action,
                        retry = retries,
                        "并发冲突,重试"
                    );
                }
                other => return other,
            }
        }
    }
}

fn validate_target(lat: f64, lng: f64) -> ApiResult<GeoPoint> {
    if !lat.is_finite() || !lng.is_finite() || lat.abs() > 90.0 || lng.abs() > 180.0 {
        return Err(ApiError::InvalidInput(format!(
            "目标坐标无效: lat={}, lng={}",
            lat, lng
        )));
    }
    Ok(GeoPoint::new(lat, lng))
}
