// ==========================================
// 停电抢修调度系统 - 班组领域模型
// ==========================================
// 职责: 班组实体、排班、带可用性的派生视图
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

use crate::domain::event::GeoPoint;
use crate::domain::types::{CrewStatus, DutyStatus, Specialization};
use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

// ==========================================
// ShiftSchedule - 排班
// ==========================================
// 支持跨夜班次 (shift_start > shift_end)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftSchedule {
    pub shift_start: NaiveTime,
    pub shift_end: NaiveTime,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
    pub work_days: Vec<String>, // 星期缩写: "Mon".."Sun"
}

impl ShiftSchedule {
    /// 工作日字段的存储格式: "Mon,Tue,Wed"
    pub fn work_days_to_db(&self) -> String {
        self.work_days.join(",")
    }

    pub fn work_days_from_db(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect()
    }
}

// ==========================================
// Crew - 抢修班组
// ==========================================
// 对齐: crew 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crew {
    // ===== 标识 =====
    pub crew_id: String,
    pub crew_name: String, // 班组代号/名称

    // ===== 能力 =====
    pub vehicle_type: String,
    pub team_size: u32, // 正整数
    pub specialization: Option<Specialization>,

    // ===== 排班 =====
    pub schedule: ShiftSchedule,

    // ===== 实时状态 =====
    pub current_lat: f64,
    pub current_lng: f64,
    pub status: CrewStatus,
    pub assigned_event_id: Option<String>,
    pub eta_minutes: Option<i64>,
    pub dispatch_time: Option<NaiveDateTime>,

    // ===== 并发控制 =====
    pub revision: i32, // 乐观锁版本号,每次写入 +1
    pub updated_at: NaiveDateTime,
}

impl Crew {
    /// 当前位置
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.current_lat, self.current_lng)
    }
}

// ==========================================
// ShiftEvaluation - 在岗判定结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftEvaluation {
    pub is_work_day: bool,
    pub is_on_break: bool,
    pub duty_status: DutyStatus,
}

// ==========================================
// CrewWithAvailability - 带可用性的派生视图
// ==========================================
// 说明: 每次查询时由 Crew + 时钟计算,不落库
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewWithAvailability {
    #[serde(flatten)]
    pub crew: Crew,
    pub availability: ShiftEvaluation,
}
