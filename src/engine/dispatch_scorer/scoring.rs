use crate::domain::types::{DutyStatus, OutageType, Specialization};

/// 距离分满分
const PROXIMITY_MAX: f64 = 40.0;
/// 距离分衰减到 0 的距离（公里）
const PROXIMITY_RANGE_KM: f64 = 50.0;

/// 专业完全匹配得分（偏好列表首位）
const SPEC_EXACT: f64 = 35.0;
/// 次级匹配基准分: 25 - 5 * position
const SPEC_SECONDARY_BASE: f64 = 25.0;
const SPEC_SECONDARY_STEP: f64 = 5.0;
/// 通用班组兜底分（不在偏好列表中时）
const SPEC_GENERAL_FALLBACK: f64 = 10.0;

/// 人数加成触发阈值（受影响用户数,严格大于）
pub const LARGE_EVENT_CUSTOMER_THRESHOLD: i64 = 1000;
const TEAM_BONUS_PER_MEMBER: f64 = 2.0;
const TEAM_BONUS_MAX: f64 = 10.0;

/// 距离分: 50km 内线性衰减
pub fn proximity_score(distance_km: f64) -> f64 {
    (PROXIMITY_MAX - (distance_km / PROXIMITY_RANGE_KM) * PROXIMITY_MAX).max(0.0)
}

pub(super) fn proximity_reason(distance_km: f64) -> String {
    if distance_km < 5.0 {
        "Very close".to_string()
    } else if distance_km < 15.0 {
        "Nearby".to_string()
    } else {
        format!("{:.1} km away", distance_km)
    }
}

/// 专业分
///
/// # 返回
/// (得分, 原因)；无匹配时原因为 None
pub fn specialization_score(
    specialization: Option<Specialization>,
    outage_type: OutageType,
) -> (f64, Option<String>) {
    let spec = match specialization {
        Some(s) => s,
        None => return (0.0, None),
    };

    let prefs = outage_type.preferred_specializations();
    match prefs.iter().position(|p| *p == spec) {
        Some(0) => (SPEC_EXACT, Some(format!("{} specialist", spec.label()))),
        Some(pos) => {
            let score = (SPEC_SECONDARY_BASE - SPEC_SECONDARY_STEP * pos as f64).max(0.0);
            (score, Some(format!("{} capable", spec.label())))
        }
        None if spec == Specialization::General => {
            (SPEC_GENERAL_FALLBACK, Some("General crew".to_string()))
        }
        None => (0.0, None),
    }
}

/// 在岗分
pub fn availability_score(duty: DutyStatus) -> f64 {
    match duty {
        DutyStatus::OnShift => 25.0,
        DutyStatus::OnBreak => 15.0,
        DutyStatus::OffDuty => 5.0,
    }
}

pub(super) fn duty_reason(duty: DutyStatus) -> &'static str {
    match duty {
        DutyStatus::OnShift => "On shift",
        DutyStatus::OnBreak => "On break",
        DutyStatus::OffDuty => "Off duty (emergency only)",
    }
}

/// 人数加成: 仅大规模事件（受影响用户 > 1000）
pub fn team_size_bonus(team_size: u32, customers_impacted: i64) -> f64 {
    if customers_impacted > LARGE_EVENT_CUSTOMER_THRESHOLD {
        (team_size as f64 * TEAM_BONUS_PER_MEMBER).min(TEAM_BONUS_MAX)
    } else {
        0.0
    }
}
