// ==========================================
// 停电抢修调度系统 - 班组状态机
// ==========================================
// 职责: 班组运行状态的唯一权威流转表
// 红线: 非法流转被拒绝时,输入记录保持不变（纯函数,返回新记录）
// ==========================================
//
// 流转表:
// | From                 | Event              | To         |
// |----------------------|--------------------|------------|
// | available            | dispatch           | dispatched |
// | available (off duty) | emergency_dispatch | dispatched |
// | dispatched/en_route  | tick (未到达)       | en_route   |
// | dispatched/en_route  | tick (到达)         | on_site    |
// | on_site              | start_return       | returning  |
// | on_site/returning    | mark_available     | available  |

use crate::domain::crew::Crew;
use crate::domain::overtime_log::OvertimeLogEntry;
use crate::domain::types::{CrewStatus, DutyStatus};
use crate::engine::movement::MovementStep;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

// ==========================================
// CrewAction - 触发流转的动作
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrewAction {
    Dispatch,
    EmergencyDispatch,
    MovementTick,
    StartReturn,
    MarkAvailable,
}

impl CrewAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrewAction::Dispatch => "dispatch",
            CrewAction::EmergencyDispatch => "emergency_dispatch",
            CrewAction::MovementTick => "movement_tick",
            CrewAction::StartReturn => "start_return",
            CrewAction::MarkAvailable => "mark_available",
        }
    }
}

impl fmt::Display for CrewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// TransitionError - 流转错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("非法状态流转: status={from}, action={action}")]
    IllegalTransition { from: CrewStatus, action: CrewAction },

    #[error("紧急派遣仅适用于非在岗班组: 当前在岗状态={duty}")]
    NotOffDuty { duty: DutyStatus },
}

pub type TransitionResult<T> = Result<T, TransitionError>;

/// 派遣参数
#[derive(Debug, Clone)]
pub struct DispatchOrder<'a> {
    pub event_id: &'a str,
    pub eta_minutes: i64,
    pub now: NaiveDateTime,
}

/// 紧急派遣授权信息
#[derive(Debug, Clone)]
pub struct EmergencyAuthorization<'a> {
    pub authorized_by: &'a str,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

// ==========================================
// CrewStateMachine
// ==========================================
// 无状态,所有方法接收当前记录并返回新记录
pub struct CrewStateMachine;

impl CrewStateMachine {
    fn require(crew: &Crew, allowed: &[CrewStatus], action: CrewAction) -> TransitionResult<()> {
        if allowed.contains(&crew.status) {
            Ok(())
        } else {
            Err(TransitionError::IllegalTransition {
                from: crew.status,
                action,
            })
        }
    }

    /// 普通派遣: available → dispatched
    ///
    /// 说明: 状态机本身不检查在岗状态,非在岗拦截由 API 层按配置执行
    pub fn dispatch(crew: &Crew, order: &DispatchOrder<'_>) -> TransitionResult<Crew> {
        Self::require(crew, &[CrewStatus::Available], CrewAction::Dispatch)?;

        let mut next = crew.clone();
        next.status = CrewStatus::Dispatched;
        next.assigned_event_id = Some(order.event_id.to_string());
        next.eta_minutes = Some(order.eta_minutes);
        next.dispatch_time = Some(order.now);
        Ok(next)
    }

    /// 紧急派遣: available (off duty) → dispatched,同时生成加班记录
    pub fn emergency_dispatch(
        crew: &Crew,
        duty: DutyStatus,
        order: &DispatchOrder<'_>,
        auth: &EmergencyAuthorization<'_>,
    ) -> TransitionResult<(Crew, OvertimeLogEntry)> {
        Self::require(crew, &[CrewStatus::Available], CrewAction::EmergencyDispatch)?;
        if duty != DutyStatus::OffDuty {
            return Err(TransitionError::NotOffDuty { duty });
        }

        let next = Self::dispatch(crew, order)?;
        let entry = OvertimeLogEntry::new(
            &crew.crew_id,
            order.event_id,
            auth.reason.clone(),
            auth.authorized_by,
            auth.notes.clone(),
            order.now,
        );
        Ok((next, entry))
    }

    /// 移动推进: dispatched/en_route → en_route 或 on_site
    pub fn apply_movement(crew: &Crew, step: &MovementStep) -> TransitionResult<Crew> {
        Self::require(
            crew,
            &[CrewStatus::Dispatched, CrewStatus::EnRoute],
            CrewAction::MovementTick,
        )?;

        let mut next = crew.clone();
        next.current_lat = step.new_lat;
        next.current_lng = step.new_lng;
        if step.arrived {
            next.status = CrewStatus::OnSite;
            next.eta_minutes = Some(0);
        } else {
            next.status = CrewStatus::EnRoute;
            next.eta_minutes = Some(step.eta_minutes);
        }
        Ok(next)
    }

    /// 开始返回: on_site → returning（保留任务关联,清空 ETA）
    pub fn start_return(crew: &Crew) -> TransitionResult<Crew> {
        Self::require(crew, &[CrewStatus::OnSite], CrewAction::StartReturn)?;

        let mut next = crew.clone();
        next.status = CrewStatus::Returning;
        next.eta_minutes = None;
        Ok(next)
    }

    /// 恢复待命: on_site/returning → available,无条件清空任务字段
    pub fn mark_available(crew: &Crew) -> TransitionResult<Crew> {
        Self::require(
            crew,
            &[CrewStatus::OnSite, CrewStatus::Returning],
            CrewAction::MarkAvailable,
        )?;

        let mut next = crew.clone();
        next.status = CrewStatus::Available;
        next.assigned_event_id = None;
        next.eta_minutes = None;
        next.dispatch_time = None;
        Ok(next)
    }
}
