// ==========================================
// 停电抢修调度系统 - 停电事件领域模型
// ==========================================
// 说明: 事件由外部系统维护,本核心只读
// ==========================================

use crate::domain::types::OutageType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// WGS-84 经纬度坐标（度）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

// ==========================================
// OutageEvent - 停电事件
// ==========================================
// 对齐: outage_event 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutageEvent {
    pub event_id: String,
    pub geo_center: Option<GeoPoint>, // 无地理中心时无法评分/派遣
    pub outage_type: OutageType,
    pub customers_impacted: i64,
    pub priority: Option<String>,
}
