use chrono::{Local, NaiveTime};
use rusqlite::Connection;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crew_dispatch::app::get_default_db_path;
use crew_dispatch::db::{init_schema, open_sqlite_connection};
use crew_dispatch::domain::{
    Crew, CrewStatus, GeoPoint, OutageEvent, OutageType, ShiftSchedule, Specialization,
};
use crew_dispatch::repository::{CrewRepository, CrewStore, OutageEventRepository};

const WEEKDAYS: [&str; 5] = ["Mon", "Tue", "Wed", "Thu", "Fri"];
const ALL_DAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

struct CrewSeed {
    id: &'static str,
    name: &'static str,
    vehicle: &'static str,
    team_size: u32,
    specialization: Option<Specialization>,
    shift: (u32, u32),
    brk: Option<u32>,
    days: &'static [&'static str],
    position: (f64, f64),
}

fn main() -> Result<(), Box<dyn Error>> {
    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);

    backup_and_reset_db(&db_path)?;

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    seed_crews(conn.clone())?;
    seed_events(conn.clone())?;

    print_quick_counts(conn)?;
    eprintln!("Seeded {}", db_path);
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn hm(h: u32, m: u32) -> Result<NaiveTime, Box<dyn Error>> {
    NaiveTime::from_hms_opt(h, m, 0).ok_or_else(|| format!("invalid time {}:{}", h, m).into())
}

fn seed_crews(conn: Arc<Mutex<Connection>>) -> Result<(), Box<dyn Error>> {
    let repo = CrewRepository::new(conn);
    let now = Local::now().naive_local();

    let seeds = [
        CrewSeed {
            id: "CRW-101",
            name: "Storm Alpha",
            vehicle: "Bucket Truck",
            team_size: 4,
            specialization: Some(Specialization::StormResponse),
            shift: (7, 19),
            brk: Some(12),
            days: &ALL_DAYS,
            position: (39.9526, -75.1652),
        },
        CrewSeed {
            id: "CRW-102",
            name: "Line Bravo",
            vehicle: "Line Truck",
            team_size: 3,
            specialization: Some(Specialization::LineCrew),
            shift: (8, 18),
            brk: Some(12),
            days: &WEEKDAYS,
            position: (40.0012, -75.1180),
        },
        CrewSeed {
            id: "CRW-103",
            name: "Transformer Charlie",
            vehicle: "Crane Truck",
            team_size: 2,
            specialization: Some(Specialization::Transformer),
            shift: (6, 14),
            brk: None,
            days: &WEEKDAYS,
            position: (39.9100, -75.2300),
        },
        CrewSeed {
            id: "CRW-104",
            name: "Night Delta",
            vehicle: "Bucket Truck",
            team_size: 3,
            specialization: Some(Specialization::EmergencyResponse),
            shift: (22, 6),
            brk: Some(2),
            days: &ALL_DAYS,
            position: (39.9800, -75.2000),
        },
        CrewSeed {
            id: "CRW-105",
            name: "Vegetation Echo",
            vehicle: "Chipper Truck",
            team_size: 5,
            specialization: Some(Specialization::Vegetation),
            shift: (7, 15),
            brk: Some(11),
            days: &WEEKDAYS,
            position: (40.0500, -75.0500),
        },
        CrewSeed {
            id: "CRW-106",
            name: "Underground Foxtrot",
            vehicle: "Vault Truck",
            team_size: 4,
            specialization: Some(Specialization::Underground),
            shift: (9, 17),
            brk: Some(13),
            days: &WEEKDAYS,
            position: (39.9400, -75.1500),
        },
        CrewSeed {
            id: "CRW-107",
            name: "General Golf",
            vehicle: "Pickup",
            team_size: 2,
            specialization: Some(Specialization::General),
            shift: (8, 16),
            brk: None,
            days: &["Sat", "Sun"],
            position: (39.8700, -75.3000),
        },
        CrewSeed {
            id: "CRW-108",
            name: "Substation Hotel",
            vehicle: "Service Van",
            team_size: 3,
            specialization: Some(Specialization::Substation),
            shift: (8, 18),
            brk: Some(12),
            days: &WEEKDAYS,
            position: (40.1200, -75.3400),
        },
    ];

    for seed in seeds {
        let (break_start, break_end) = match seed.brk {
            Some(h) => (Some(hm(h, 0)?), Some(hm(h, 30)?)),
            None => (None, None),
        };
        let crew = Crew {
            crew_id: seed.id.to_string(),
            crew_name: seed.name.to_string(),
            vehicle_type: seed.vehicle.to_string(),
            team_size: seed.team_size,
            specialization: seed.specialization,
            schedule: ShiftSchedule {
                shift_start: hm(seed.shift.0, 0)?,
                shift_end: hm(seed.shift.1, 0)?,
                break_start,
                break_end,
                work_days: seed.days.iter().map(|d| d.to_string()).collect(),
            },
            current_lat: seed.position.0,
            current_lng: seed.position.1,
            status: CrewStatus::Available,
            assigned_event_id: None,
            eta_minutes: None,
            dispatch_time: None,
            revision: 0,
            updated_at: now,
        };
        repo.insert_crew(&crew)?;
    }

    Ok(())
}

fn seed_events(conn: Arc<Mutex<Connection>>) -> Result<(), Box<dyn Error>> {
    let repo = OutageEventRepository::new(conn);

    let events = [
        ("EVT-2001", Some((39.9650, -75.1800)), OutageType::Storm, 2400, "critical"),
        ("EVT-2002", Some((39.9200, -75.2100)), OutageType::EquipmentFailure, 650, "high"),
        ("EVT-2003", Some((40.0400, -75.0700)), OutageType::Vegetation, 180, "medium"),
        ("EVT-2004", Some((39.9450, -75.1550)), OutageType::Underground, 1200, "high"),
        ("EVT-2005", None, OutageType::Unknown, 40, "low"),
    ];

    for (id, center, outage_type, customers, priority) in events {
        repo.upsert_event(&OutageEvent {
            event_id: id.to_string(),
            geo_center: center.map(|(lat, lng)| GeoPoint::new(lat, lng)),
            outage_type,
            customers_impacted: customers,
            priority: Some(priority.to_string()),
        })?;
    }

    Ok(())
}

fn print_quick_counts(conn: Arc<Mutex<Connection>>) -> Result<(), Box<dyn Error>> {
    let conn = conn.lock().map_err(|e| e.to_string())?;
    let tables = [
        "crew",
        "outage_event",
        "overtime_log",
        "crew_action_log",
        "config_kv",
    ];

    eprintln!("Row counts:");
    for t in tables {
        let sql = format!("SELECT COUNT(*) FROM {}", t);
        let c: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        eprintln!("  {:<28} {}", t, c);
    }
    Ok(())
}
