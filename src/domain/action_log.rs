// ==========================================
// 停电抢修调度系统 - 班组操作日志领域模型
// ==========================================
// 红线: 所有班组写入必须记录
// 用途: 审计追踪,状态流转回放
// 对齐: crew_action_log 表
// ==========================================

use crate::domain::types::CrewStatus;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// CrewActionLog - 班组操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewActionLog {
    pub action_id: String,
    pub crew_id: String,
    pub event_id: Option<String>,
    pub action_type: String, // 存储为字符串,见 ActionType::as_str
    pub action_ts: NaiveDateTime,
    pub actor: String,

    // ===== 状态流转 =====
    pub from_status: Option<String>,
    pub to_status: Option<String>,

    // ===== 操作负载 =====
    pub payload_json: Option<JsonValue>,
    pub detail: Option<String>,
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    Dispatch,
    EmergencyDispatch,
    MovementStep,
    Arrive,
    StartReturn,
    MarkAvailable,
}

impl ActionType {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Dispatch => "Dispatch",
            ActionType::EmergencyDispatch => "EmergencyDispatch",
            ActionType::MovementStep => "MovementStep",
            ActionType::Arrive => "Arrive",
            ActionType::StartReturn => "StartReturn",
            ActionType::MarkAvailable => "MarkAvailable",
        }
    }

    /// 从字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Dispatch" => Some(ActionType::Dispatch),
            "EmergencyDispatch" => Some(ActionType::EmergencyDispatch),
            "MovementStep" => Some(ActionType::MovementStep),
            "Arrive" => Some(ActionType::Arrive),
            "StartReturn" => Some(ActionType::StartReturn),
            "MarkAvailable" => Some(ActionType::MarkAvailable),
            _ => None,
        }
    }
}

// ==========================================
// CrewActionLog 辅助方法
// ==========================================
impl CrewActionLog {
    /// 创建新的操作日志
    ///
    /// # 参数
    /// - `crew_id`: 班组ID
    /// - `action_type`: 操作类型
    /// - `actor`: 操作人（自动推进时为 "system"）
    /// - `action_ts`: 操作时间（由注入时钟提供）
    pub fn new(
        crew_id: &str,
        action_type: ActionType,
        actor: &str,
        action_ts: NaiveDateTime,
    ) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            crew_id: crew_id.to_string(),
            event_id: None,
            action_type: action_type.as_str().to_string(),
            action_ts,
            actor: actor.to_string(),
            from_status: None,
            to_status: None,
            payload_json: None,
            detail: None,
        }
    }

    /// 设置状态流转
    pub fn with_transition(mut self, from: CrewStatus, to: CrewStatus) -> Self {
        self.from_status = Some(from.to_db_str().to_string());
        self.to_status = Some(to.to_db_str().to_string());
        self
    }

    /// 设置关联事件
    pub fn with_event(mut self, event_id: Option<&str>) -> Self {
        self.event_id = event_id.map(|s| s.to_string());
        self
    }

    /// 设置操作负载 (转换为JSON)
    pub fn with_payload<T: Serialize>(mut self, payload: &T) -> Self {
        self.payload_json = serde_json::to_value(payload).ok();
        self
    }

    pub fn with_detail(mut self, detail: String) -> Self {
        self.detail = Some(detail);
        self
    }

    /// 操作类型（解析失败返回 None）
    pub fn parsed_action_type(&self) -> Option<ActionType> {
        ActionType::from_str(&self.action_type)
    }
}
