// ==========================================
// 停电抢修调度系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 幂等建表（CREATE TABLE IF NOT EXISTS）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS crew (
    crew_id TEXT PRIMARY KEY,
    crew_name TEXT NOT NULL,
    vehicle_type TEXT NOT NULL,
    team_size INTEGER NOT NULL CHECK (team_size > 0),
    specialization TEXT,
    shift_start TEXT NOT NULL,
    shift_end TEXT NOT NULL,
    break_start TEXT,
    break_end TEXT,
    work_days TEXT NOT NULL DEFAULT '',
    current_lat REAL NOT NULL,
    current_lng REAL NOT NULL,
    status TEXT NOT NULL DEFAULT 'available',
    assigned_event_id TEXT,
    eta_minutes INTEGER,
    dispatch_time TEXT,
    revision INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_crew_status ON crew(status);

CREATE TABLE IF NOT EXISTS outage_event (
    event_id TEXT PRIMARY KEY,
    center_lat REAL,
    center_lng REAL,
    outage_type TEXT NOT NULL,
    customers_impacted INTEGER NOT NULL DEFAULT 0,
    priority TEXT
);

CREATE TABLE IF NOT EXISTS overtime_log (
    log_id TEXT PRIMARY KEY,
    crew_id TEXT NOT NULL,
    event_id TEXT NOT NULL,
    reason TEXT NOT NULL,
    authorized_by TEXT NOT NULL,
    notes TEXT,
    dispatch_time TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_overtime_log_crew ON overtime_log(crew_id, dispatch_time);

CREATE TABLE IF NOT EXISTS crew_action_log (
    action_id TEXT PRIMARY KEY,
    crew_id TEXT NOT NULL,
    event_id TEXT,
    action_type TEXT NOT NULL,
    action_ts TEXT NOT NULL,
    actor TEXT NOT NULL,
    from_status TEXT,
    to_status TEXT,
    payload_json TEXT,
    detail TEXT
);

CREATE INDEX IF NOT EXISTS idx_crew_action_log_crew_ts ON crew_action_log(crew_id, action_ts);
CREATE INDEX IF NOT EXISTS idx_crew_action_log_event ON crew_action_log(event_id);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 幂等初始化 schema,并登记当前 schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
