use super::core::ActionLogRepository;
use crate::domain::action_log::CrewActionLog;
use crate::repository::crew_repo::parse_ts;
use crate::repository::error::RepositoryResult;
use rusqlite::{params, Result as SqliteResult, Row};

const SELECT_COLUMNS: &str = r#"
    SELECT action_id, crew_id, event_id, action_type, action_ts, actor,
           from_status, to_status, payload_json, detail
    FROM crew_action_log
"#;

impl ActionLogRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 action_id 查询单个日志
    pub fn find_by_id(&self, action_id: &str) -> RepositoryResult<Option<CrewActionLog>> {
        let conn = self.get_conn()?;

        let sql = format!("{} WHERE action_id = ?", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;

        match stmt.query_row(params![action_id], Self::map_row) {
            Ok(log) => Ok(Some(log)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询指定班组的操作日志（按时间倒序）
    pub fn find_by_crew(&self, crew_id: &str, limit: i32) -> RepositoryResult<Vec<CrewActionLog>> {
        let conn = self.get_conn()?;

        let sql = format!(
            "{} WHERE crew_id = ? ORDER BY action_ts DESC, rowid DESC LIMIT ?",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let logs = stmt
            .query_map(params![crew_id, limit], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }

    /// 查询指定事件相关的操作日志（按时间正序,便于回放）
    pub fn find_by_event(&self, event_id: &str) -> RepositoryResult<Vec<CrewActionLog>> {
        let conn = self.get_conn()?;

        let sql = format!(
            "{} WHERE event_id = ? ORDER BY action_ts ASC, rowid ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let logs = stmt
            .query_map(params![event_id], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }

    /// 查询最近的操作日志
    pub fn find_recent(&self, limit: i32) -> RepositoryResult<Vec<CrewActionLog>> {
        let conn = self.get_conn()?;

        let sql = format!("{} ORDER BY action_ts DESC, rowid DESC LIMIT ?", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;

        let logs = stmt
            .query_map(params![limit], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    /// 将数据库行映射为 CrewActionLog
    fn map_row(row: &Row) -> SqliteResult<CrewActionLog> {
        let action_ts: String = row.get(4)?;
        let payload_raw: Option<String> = row.get(8)?;

        // payload 损坏时不阻断查询,丢弃该字段
        let payload_json = payload_raw.and_then(|s| serde_json::from_str(&s).ok());

        Ok(CrewActionLog {
            action_id: row.get(0)?,
            crew_id: row.get(1)?,
            event_id: row.get(2)?,
            action_type: row.get(3)?,
            action_ts: parse_ts(4, &action_ts)?,
            actor: row.get(5)?,
            from_status: row.get(6)?,
            to_status: row.get(7)?,
            payload_json,
            detail: row.get(9)?,
        })
    }
}
