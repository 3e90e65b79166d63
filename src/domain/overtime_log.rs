// ==========================================
// 停电抢修调度系统 - 加班派遣审计记录
// ==========================================
// 红线: 非在岗班组的每一次紧急派遣都必须产生一条记录
// 红线: 记录只追加,本核心不修改、不删除
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 默认派遣原因
pub const DEFAULT_OVERTIME_REASON: &str = "Emergency dispatch outside scheduled shift";

// ==========================================
// OvertimeLogEntry - 加班派遣记录
// ==========================================
// 对齐: overtime_log 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OvertimeLogEntry {
    pub log_id: String,
    pub crew_id: String,
    pub event_id: String,
    pub reason: String,
    pub authorized_by: String,
    pub notes: Option<String>,
    pub dispatch_time: NaiveDateTime,
}

impl OvertimeLogEntry {
    /// 创建新的加班派遣记录（log_id 使用 UUID v4）
    pub fn new(
        crew_id: &str,
        event_id: &str,
        reason: Option<String>,
        authorized_by: &str,
        notes: Option<String>,
        dispatch_time: NaiveDateTime,
    ) -> Self {
        Self {
            log_id: uuid::Uuid::new_v4().to_string(),
            crew_id: crew_id.to_string(),
            event_id: event_id.to_string(),
            reason: reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_OVERTIME_REASON.to_string()),
            authorized_by: authorized_by.to_string(),
            notes: notes.filter(|n| !n.trim().is_empty()),
            dispatch_time,
        }
    }
}
