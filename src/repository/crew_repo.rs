// ==========================================
// 停电抢修调度系统 - 班组数据仓储
// ==========================================
// 对齐: crew 表
// 红线: Repository 不含业务规则，只做数据映射
// 并发: revision 乐观锁,保证单班组同一时刻最多一个写入生效
// ==========================================

use crate::domain::crew::{Crew, ShiftSchedule};
use crate::domain::overtime_log::OvertimeLogEntry;
use crate::domain::types::{CrewStatus, Specialization};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::overtime_log_repo::insert_overtime_entry;
use chrono::{NaiveDateTime, NaiveTime};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

pub(crate) const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TIME_FORMAT: &str = "%H:%M";

// ==========================================
// CrewStore Trait
// ==========================================
// 用途: 班组读写接口（注入到 API 层,不使用全局单例）
// 实现者: CrewRepository（使用 rusqlite）
pub trait CrewStore: Send + Sync {
    /// 按ID查询班组
    fn get_crew(&self, crew_id: &str) -> RepositoryResult<Option<Crew>>;

    /// 查询班组列表（按 crew_id 升序）
    fn list_crews(&self, status: Option<CrewStatus>) -> RepositoryResult<Vec<Crew>>;

    /// 写回实时状态（位置/状态/任务/ETA/派遣时间）
    ///
    /// # 并发控制
    /// 以 `crew.revision` 作为期望版本;成功后返回 revision+1 的新记录
    ///
    /// # 错误
    /// - `RepositoryError::OptimisticLockFailure`: 期间已被其他写入修改
    /// - `RepositoryError::NotFound`: crew_id 不存在
    fn update_crew(&self, crew: &Crew) -> RepositoryResult<Crew>;

    /// 紧急派遣写入: 班组状态与加班记录在同一事务内提交
    ///
    /// revision 检查同 `update_crew`;任一步失败则两者都不落库
    fn update_crew_with_overtime(
        &self,
        crew: &Crew,
        entry: &OvertimeLogEntry,
    ) -> RepositoryResult<Crew>;

    /// 新增班组
    fn insert_crew(&self, crew: &Crew) -> RepositoryResult<()>;
}

// ==========================================
// CrewRepository - SQLite 实现
// ==========================================
pub struct CrewRepository {
    conn: Arc<Mutex<Connection>>,
}

const SELECT_COLUMNS: &str = r#"
    SELECT crew_id, crew_name, vehicle_type, team_size, specialization,
           shift_start, shift_end, break_start, break_end, work_days,
           current_lat, current_lng, status, assigned_event_id, eta_minutes,
           dispatch_time, revision, updated_at
    FROM crew
"#;

impl CrewRepository {
    /// 创建新的班组仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 映射数据库行到 Crew 对象
    fn map_row(row: &Row) -> rusqlite::Result<Crew> {
        let status_str: String = row.get(12)?;
        let status = CrewStatus::from_db_str(&status_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                12,
                rusqlite::types::Type::Text,
                format!("未知班组状态: {}", status_str).into(),
            )
        })?;

        let team_size: i64 = row.get(3)?;

        Ok(Crew {
            crew_id: row.get(0)?,
            crew_name: row.get(1)?,
            vehicle_type: row.get(2)?,
            team_size: u32::try_from(team_size)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        3,
                        rusqlite::types::Type::Integer,
                        Box::new(e),
                    )
                })?
                .max(1),
            specialization: row
                .get::<_, Option<String>>(4)?
                .as_deref()
                .and_then(Specialization::from_label),
            schedule: ShiftSchedule {
                shift_start: parse_time(5, &row.get::<_, String>(5)?)?,
                shift_end: parse_time(6, &row.get::<_, String>(6)?)?,
                break_start: row
                    .get::<_, Option<String>>(7)?
                    .map(|s| parse_time(7, &s))
                    .transpose()?,
                break_end: row
                    .get::<_, Option<String>>(8)?
                    .map(|s| parse_time(8, &s))
                    .transpose()?,
                work_days: ShiftSchedule::work_days_from_db(&row.get::<_, String>(9)?),
            },
            current_lat: row.get(10)?,
            current_lng: row.get(11)?,
            status,
            assigned_event_id: row.get(13)?,
            eta_minutes: row.get(14)?,
            dispatch_time: row
                .get::<_, Option<String>>(15)?
                .map(|s| parse_ts(15, &s))
                .transpose()?,
            revision: row.get(16)?,
            updated_at: parse_ts(17, &row.get::<_, String>(17)?)?,
        })
    }
}

fn parse_time(idx: usize, raw: &str) -> rusqlite::Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

pub(crate) fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TS_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// 带 revision 检查的状态写回,连接或事务由调用方提供
fn update_with_revision(conn: &Connection, crew: &Crew) -> RepositoryResult<Crew> {
    // 执行更新，带revision检查
    let rows_affected = conn.execute(
        r#"UPDATE crew
           SET current_lat = ?, current_lng = ?, status = ?,
               assigned_event_id = ?, eta_minutes = ?, dispatch_time = ?,
               updated_at = ?, revision = revision + 1
           WHERE crew_id = ? AND revision = ?"#,
        params![
            crew.current_lat,
            crew.current_lng,
            crew.status.to_db_str(),
            crew.assigned_event_id,
            crew.eta_minutes,
            crew.dispatch_time.map(|t| t.format(TS_FORMAT).to_string()),
            crew.updated_at.format(TS_FORMAT).to_string(),
            crew.crew_id,
            crew.revision,
        ],
    )?;

    if rows_affected == 0 {
        // 判断是记录不存在还是revision冲突
        let actual: Result<i32, _> = conn.query_row(
            "SELECT revision FROM crew WHERE crew_id = ?",
            params![crew.crew_id],
            |row| row.get(0),
        );

        return match actual {
            Ok(actual_revision) => Err(RepositoryError::OptimisticLockFailure {
                crew_id: crew.crew_id.clone(),
                expected: crew.revision,
                actual: actual_revision,
            }),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                Err(RepositoryError::not_found("Crew", &crew.crew_id))
            }
            Err(e) => Err(e.into()),
        };
    }

    let mut stored = crew.clone();
    stored.revision += 1;
    Ok(stored)
}

impl CrewStore for CrewRepository {
    fn get_crew(&self, crew_id: &str) -> RepositoryResult<Option<Crew>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE crew_id = ?", SELECT_COLUMNS);

        match conn.query_row(&sql, params![crew_id], Self::map_row) {
            Ok(crew) => Ok(Some(crew)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list_crews(&self, status: Option<CrewStatus>) -> RepositoryResult<Vec<Crew>> {
        let conn = self.get_conn()?;

        let crews = match status {
            Some(s) => {
                let sql = format!("{} WHERE status = ? ORDER BY crew_id", SELECT_COLUMNS);
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![s.to_db_str()], Self::map_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let sql = format!("{} ORDER BY crew_id", SELECT_COLUMNS);
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map([], Self::map_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };

        Ok(crews)
    }

    fn update_crew(&self, crew: &Crew) -> RepositoryResult<Crew> {
        let conn = self.get_conn()?;
        update_with_revision(&conn, crew)
    }

    fn update_crew_with_overtime(
        &self,
        crew: &Crew,
        entry: &OvertimeLogEntry,
    ) -> RepositoryResult<Crew> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let stored = update_with_revision(&tx, crew)?;
        insert_overtime_entry(&tx, entry)?;

        tx.commit()?;
        Ok(stored)
    }

    fn insert_crew(&self, crew: &Crew) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let fmt_time = |t: NaiveTime| t.format(TIME_FORMAT).to_string();

        conn.execute(
            r#"
            INSERT INTO crew (
                crew_id, crew_name, vehicle_type, team_size, specialization,
                shift_start, shift_end, break_start, break_end, work_days,
                current_lat, current_lng, status, assigned_event_id, eta_minutes,
                dispatch_time, revision, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                crew.crew_id,
                crew.crew_name,
                crew.vehicle_type,
                crew.team_size,
                crew.specialization.map(|s| s.label()),
                fmt_time(crew.schedule.shift_start),
                fmt_time(crew.schedule.shift_end),
                crew.schedule.break_start.map(fmt_time),
                crew.schedule.break_end.map(fmt_time),
                crew.schedule.work_days_to_db(),
                crew.current_lat,
                crew.current_lng,
                crew.status.to_db_str(),
                crew.assigned_event_id,
                crew.eta_minutes,
                crew.dispatch_time.map(|t| t.format(TS_FORMAT).to_string()),
                crew.revision,
                crew.updated_at.format(TS_FORMAT).to_string(),
            ],
        )?;

        Ok(())
    }
}
