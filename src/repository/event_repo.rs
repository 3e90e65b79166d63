// ==========================================
// 停电抢修调度系统 - 停电事件数据仓储
// ==========================================
// 对齐: outage_event 表
// 说明: 对本核心只读; upsert_event 仅供种子数据与测试使用
// ==========================================

use crate::domain::event::{GeoPoint, OutageEvent};
use crate::domain::types::OutageType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// EventStore Trait
// ==========================================
pub trait EventStore: Send + Sync {
    /// 按ID查询事件
    fn get_event(&self, event_id: &str) -> RepositoryResult<Option<OutageEvent>>;
}

// ==========================================
// OutageEventRepository - SQLite 实现
// ==========================================
pub struct OutageEventRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OutageEventRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入或覆盖事件
    pub fn upsert_event(&self, event: &OutageEvent) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO outage_event (event_id, center_lat, center_lng, outage_type, customers_impacted, priority)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(event_id) DO UPDATE SET
                center_lat = ?2, center_lng = ?3, outage_type = ?4,
                customers_impacted = ?5, priority = ?6
            "#,
            params![
                event.event_id,
                event.geo_center.map(|c| c.lat),
                event.geo_center.map(|c| c.lng),
                event.outage_type.to_db_str(),
                event.customers_impacted,
                event.priority,
            ],
        )?;
        Ok(())
    }

    fn map_row(row: &Row) -> rusqlite::Result<OutageEvent> {
        let lat: Option<f64> = row.get(1)?;
        let lng: Option<f64> = row.get(2)?;
        let outage_type: String = row.get(3)?;

        Ok(OutageEvent {
            event_id: row.get(0)?,
            // 经纬度需同时存在
            geo_center: match (lat, lng) {
                (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
                _ => None,
            },
            outage_type: OutageType::from_db_str(&outage_type),
            customers_impacted: row.get(4)?,
            priority: row.get(5)?,
        })
    }
}

impl EventStore for OutageEventRepository {
    fn get_event(&self, event_id: &str) -> RepositoryResult<Option<OutageEvent>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT event_id, center_lat, center_lng, outage_type, customers_impacted, priority
               FROM outage_event
               WHERE event_id = ?"#,
            params![event_id],
            Self::map_row,
        ) {
            Ok(event) => Ok(Some(event)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
