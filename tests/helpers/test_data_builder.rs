// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use crew_dispatch::domain::{
    Crew, CrewStatus, GeoPoint, OutageEvent, OutageType, ShiftSchedule, Specialization,
};

// ==========================================
// 时间辅助
// ==========================================

/// 2026-03-02 为周一
pub fn monday_at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 2)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

/// 2026-03-01 为周日
pub fn sunday_at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 1)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

pub fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

// ==========================================
// Crew 构建器
// ==========================================

pub struct CrewBuilder {
    crew: Crew,
}

impl CrewBuilder {
    /// 默认: 周一至周五 08:00-18:00,午休 12:00-12:30,待命
    pub fn new(crew_id: &str) -> Self {
        Self {
            crew: Crew {
                crew_id: crew_id.to_string(),
                crew_name: format!("Crew {}", crew_id),
                vehicle_type: "Bucket Truck".to_string(),
                team_size: 3,
                specialization: None,
                schedule: ShiftSchedule {
                    shift_start: hm(8, 0),
                    shift_end: hm(18, 0),
                    break_start: Some(hm(12, 0)),
                    break_end: Some(hm(12, 30)),
                    work_days: ["Mon", "Tue", "Wed", "Thu", "Fri"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                },
                current_lat: 40.0,
                current_lng: -75.0,
                status: CrewStatus::Available,
                assigned_event_id: None,
                eta_minutes: None,
                dispatch_time: None,
                revision: 0,
                updated_at: monday_at(7, 0),
            },
        }
    }

    pub fn at(mut self, lat: f64, lng: f64) -> Self {
        self.crew.current_lat = lat;
        self.crew.current_lng = lng;
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.crew.crew_name = name.to_string();
        self
    }

    pub fn specialization(mut self, spec: Specialization) -> Self {
        self.crew.specialization = Some(spec);
        self
    }

    pub fn team_size(mut self, size: u32) -> Self {
        self.crew.team_size = size;
        self
    }

    pub fn shift(mut self, start: NaiveTime, end: NaiveTime) -> Self {
        self.crew.schedule.shift_start = start;
        self.crew.schedule.shift_end = end;
        self
    }

    pub fn no_break(mut self) -> Self {
        self.crew.schedule.break_start = None;
        self.crew.schedule.break_end = None;
        self
    }

    pub fn work_days(mut self, days: &[&str]) -> Self {
        self.crew.schedule.work_days = days.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn status(mut self, status: CrewStatus) -> Self {
        self.crew.status = status;
        self
    }

    pub fn assigned(mut self, event_id: &str, eta_minutes: i64, dispatch_time: NaiveDateTime) -> Self {
        self.crew.assigned_event_id = Some(event_id.to_string());
        self.crew.eta_minutes = Some(eta_minutes);
        self.crew.dispatch_time = Some(dispatch_time);
        self
    }

    pub fn build(self) -> Crew {
        self.crew
    }
}

// ==========================================
// OutageEvent 构建器
// ==========================================

pub struct EventBuilder {
    event: OutageEvent,
}

impl EventBuilder {
    pub fn new(event_id: &str) -> Self {
        Self {
            event: OutageEvent {
                event_id: event_id.to_string(),
                geo_center: Some(GeoPoint::new(40.1, -75.0)),
                outage_type: OutageType::Storm,
                customers_impacted: 500,
                priority: Some("high".to_string()),
            },
        }
    }

    pub fn center(mut self, lat: f64, lng: f64) -> Self {
        self.event.geo_center = Some(GeoPoint::new(lat, lng));
        self
    }

    pub fn no_center(mut self) -> Self {
        self.event.geo_center = None;
        self
    }

    pub fn outage_type(mut self, outage_type: OutageType) -> Self {
        self.event.outage_type = outage_type;
        self
    }

    pub fn customers(mut self, customers: i64) -> Self {
        self.event.customers_impacted = customers;
        self
    }

    pub fn build(self) -> OutageEvent {
        self.event
    }
}
