// ==========================================
// 停电抢修调度系统 - 加班派遣记录仓储
// ==========================================
// 对齐: overtime_log 表
// 红线: 只追加,不提供更新/删除
// ==========================================

use crate::domain::overtime_log::OvertimeLogEntry;
use crate::repository::crew_repo::{parse_ts, TS_FORMAT};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// OvertimeLogStore Trait
// ==========================================
pub trait OvertimeLogStore: Send + Sync {
    /// 追加一条加班派遣记录
    fn append_overtime_log(&self, entry: &OvertimeLogEntry) -> RepositoryResult<()>;

    /// 查询记录（按派遣时间倒序,可按班组过滤）
    fn list_overtime_logs(&self, crew_id: Option<&str>) -> RepositoryResult<Vec<OvertimeLogEntry>>;
}

/// 写入一条加班记录;紧急派遣时与班组写回共用同一事务
pub(crate) fn insert_overtime_entry(conn: &Connection, entry: &OvertimeLogEntry) -> RepositoryResult<()> {
    conn.execute(
        r#"
        INSERT INTO overtime_log (log_id, crew_id, event_id, reason, authorized_by, notes, dispatch_time)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            entry.log_id,
            entry.crew_id,
            entry.event_id,
            entry.reason,
            entry.authorized_by,
            entry.notes,
            entry.dispatch_time.format(TS_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

// ==========================================
// OvertimeLogRepository - SQLite 实现
// ==========================================
pub struct OvertimeLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OvertimeLogRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row) -> rusqlite::Result<OvertimeLogEntry> {
        Ok(OvertimeLogEntry {
            log_id: row.get(0)?,
            crew_id: row.get(1)?,
            event_id: row.get(2)?,
            reason: row.get(3)?,
            authorized_by: row.get(4)?,
            notes: row.get(5)?,
            dispatch_time: parse_ts(6, &row.get::<_, String>(6)?)?,
        })
    }
}

impl OvertimeLogStore for OvertimeLogRepository {
    fn append_overtime_log(&self, entry: &OvertimeLogEntry) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        insert_overtime_entry(&conn, entry)
    }

    fn list_overtime_logs(&self, crew_id: Option<&str>) -> RepositoryResult<Vec<OvertimeLogEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT log_id, crew_id, event_id, reason, authorized_by, notes, dispatch_time
            FROM overtime_log
            WHERE (?1 IS NULL OR crew_id = ?1)
            ORDER BY dispatch_time DESC, log_id
            "#,
        )?;
        let entries = stmt
            .query_map(params![crew_id], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }
}
