// ==========================================
// 停电抢修调度系统 - 领域类型定义
// ==========================================
// 职责: 班组运行状态、在岗状态、专业类型、停电类型
// 约束: 所有枚举都带数据库字符串互转,存储值保持稳定
// ==========================================

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 运行状态 (Operational Status)
// ==========================================
// 派遣生命周期,无终态,班组无限循环
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrewStatus {
    Available,  // 待命
    Dispatched, // 已派遣
    EnRoute,    // 途中
    OnSite,     // 到场
    Returning,  // 返回中
}

impl CrewStatus {
    /// 转换为数据库字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            CrewStatus::Available => "available",
            CrewStatus::Dispatched => "dispatched",
            CrewStatus::EnRoute => "en_route",
            CrewStatus::OnSite => "on_site",
            CrewStatus::Returning => "returning",
        }
    }

    /// 从数据库字符串解析
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "available" => Some(CrewStatus::Available),
            "dispatched" => Some(CrewStatus::Dispatched),
            "en_route" => Some(CrewStatus::EnRoute),
            "on_site" => Some(CrewStatus::OnSite),
            "returning" => Some(CrewStatus::Returning),
            _ => None,
        }
    }

    /// 是否处于有任务的状态（通常 assigned_event 非空）
    pub fn is_assigned(&self) -> bool {
        matches!(
            self,
            CrewStatus::Dispatched | CrewStatus::EnRoute | CrewStatus::OnSite | CrewStatus::Returning
        )
    }

    /// 是否可以接受移动推进
    pub fn is_moving(&self) -> bool {
        matches!(self, CrewStatus::Dispatched | CrewStatus::EnRoute)
    }
}

impl fmt::Display for CrewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 在岗状态 (Duty Status)
// ==========================================
// 由排班和当前时间派生,不落库
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DutyStatus {
    OnShift,
    OnBreak,
    OffDuty,
}

impl DutyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DutyStatus::OnShift => "on_shift",
            DutyStatus::OnBreak => "on_break",
            DutyStatus::OffDuty => "off_duty",
        }
    }
}

impl fmt::Display for DutyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 专业类型 (Specialization)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Specialization {
    #[serde(rename = "Storm Response")]
    StormResponse,
    #[serde(rename = "Emergency Response")]
    EmergencyResponse,
    #[serde(rename = "Line Crew")]
    LineCrew,
    #[serde(rename = "Transformer")]
    Transformer,
    #[serde(rename = "Substation")]
    Substation,
    #[serde(rename = "Underground")]
    Underground,
    #[serde(rename = "Vegetation")]
    Vegetation,
    #[serde(rename = "General")]
    General,
}

impl Specialization {
    /// 显示名称（同时作为存储值）
    pub fn label(&self) -> &'static str {
        match self {
            Specialization::StormResponse => "Storm Response",
            Specialization::EmergencyResponse => "Emergency Response",
            Specialization::LineCrew => "Line Crew",
            Specialization::Transformer => "Transformer",
            Specialization::Substation => "Substation",
            Specialization::Underground => "Underground",
            Specialization::Vegetation => "Vegetation",
            Specialization::General => "General",
        }
    }

    /// 从存储值解析（未知值返回 None,视为无专业）
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim() {
            "Storm Response" => Some(Specialization::StormResponse),
            "Emergency Response" => Some(Specialization::EmergencyResponse),
            "Line Crew" => Some(Specialization::LineCrew),
            "Transformer" => Some(Specialization::Transformer),
            "Substation" => Some(Specialization::Substation),
            "Underground" => Some(Specialization::Underground),
            "Vegetation" => Some(Specialization::Vegetation),
            "General" => Some(Specialization::General),
            _ => None,
        }
    }
}

impl fmt::Display for Specialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ==========================================
// 停电类型 (Outage Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutageType {
    Storm,
    EquipmentFailure,
    Vegetation,
    Underground,
    Planned,
    Unknown,
}

impl OutageType {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            OutageType::Storm => "Storm",
            OutageType::EquipmentFailure => "Equipment Failure",
            OutageType::Vegetation => "Vegetation",
            OutageType::Underground => "Underground",
            OutageType::Planned => "Planned",
            OutageType::Unknown => "Unknown",
        }
    }

    /// 宽松解析: 大小写不敏感,未识别的类型归为 Unknown
    pub fn from_db_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "storm" | "weather" => OutageType::Storm,
            "equipment failure" | "equipment" | "transformer" => OutageType::EquipmentFailure,
            "vegetation" | "tree" => OutageType::Vegetation,
            "underground" | "cable" => OutageType::Underground,
            "planned" | "planned maintenance" => OutageType::Planned,
            _ => OutageType::Unknown,
        }
    }

    /// 专业偏好列表（按优先级从高到低）
    pub fn preferred_specializations(&self) -> &'static [Specialization] {
        use Specialization::*;
        match self {
            OutageType::Storm => &[StormResponse, EmergencyResponse, LineCrew, General],
            OutageType::EquipmentFailure => &[Transformer, Substation, LineCrew, General],
            OutageType::Vegetation => &[Vegetation, LineCrew, StormResponse],
            OutageType::Underground => &[Underground, LineCrew],
            OutageType::Planned => &[LineCrew, Transformer, General],
            OutageType::Unknown => &[EmergencyResponse, LineCrew],
        }
    }
}

impl fmt::Display for OutageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 星期缩写
// ==========================================

/// chrono::Weekday → 排班使用的缩写 ("Mon".."Sun")
pub fn weekday_abbr(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}
