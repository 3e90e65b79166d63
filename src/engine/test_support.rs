// ==========================================
// 引擎层测试辅助
// ==========================================

use crate::domain::crew::{Crew, ShiftSchedule};
use crate::domain::event::{GeoPoint, OutageEvent};
use crate::domain::types::{CrewStatus, OutageType, Specialization};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// 2026-03-02（周一）指定时刻
pub(crate) fn monday_at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 2)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

/// 周一至周五 08:00-18:00,12:00-12:30 休息
pub(crate) fn weekday_schedule() -> ShiftSchedule {
    ShiftSchedule {
        shift_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        shift_end: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        break_start: Some(NaiveTime::from_hms_opt(12, 0, 0).unwrap()),
        break_end: Some(NaiveTime::from_hms_opt(12, 30, 0).unwrap()),
        work_days: ["Mon", "Tue", "Wed", "Thu", "Fri"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }
}

pub(crate) fn make_crew(
    crew_id: &str,
    at: GeoPoint,
    specialization: Option<Specialization>,
    team_size: u32,
) -> Crew {
    Crew {
        crew_id: crew_id.to_string(),
        crew_name: format!("Crew {}", crew_id),
        vehicle_type: "Bucket Truck".to_string(),
        team_size,
        specialization,
        schedule: weekday_schedule(),
        current_lat: at.lat,
        current_lng: at.lng,
        status: CrewStatus::Available,
        assigned_event_id: None,
        eta_minutes: None,
        dispatch_time: None,
        revision: 0,
        updated_at: monday_at(7, 0),
    }
}

pub(crate) fn make_event(
    event_id: &str,
    center: Option<GeoPoint>,
    outage_type: OutageType,
    customers_impacted: i64,
) -> OutageEvent {
    OutageEvent {
        event_id: event_id.to_string(),
        geo_center: center,
        outage_type,
        customers_impacted,
        priority: Some("high".to_string()),
    }
}
