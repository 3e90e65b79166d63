// ==========================================
// 停电抢修调度系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::engine::geo::DEFAULT_SPEED_KMH;
use crate::engine::movement::{DEFAULT_ARRIVAL_THRESHOLD_KM, DEFAULT_STEP_FRACTION};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// DispatchConfig - 调度参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    pub average_speed_kmh: f64,
    pub arrival_threshold_km: f64,
    pub movement_step_fraction: f64,
    pub recommendation_limit: usize,
    pub max_conflict_retries: u32,
    pub require_emergency_for_off_duty: bool,
    pub movement_tick_secs: u64,
    pub movement_loop_enabled: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            average_speed_kmh: DEFAULT_SPEED_KMH,
            arrival_threshold_km: DEFAULT_ARRIVAL_THRESHOLD_KM,
            movement_step_fraction: DEFAULT_STEP_FRACTION,
            recommendation_limit: 5,
            max_conflict_retries: 3,
            require_emergency_for_off_duty: true,
            movement_tick_secs: 5,
            movement_loop_enabled: false,
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入 global scope 配置（存在则覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(RepositoryError::FieldValueError {
                field: "key".to_string(),
                message: "配置键不能为空".to_string(),
            });
        }

        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at) VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;

        tracing::info!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON格式,按 key 排序）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        serde_json::to_string(&json!(config_map))
            .map_err(|e| RepositoryError::InternalError(e.to_string()))
    }

    /// 读取并解析配置;缺失用默认值,格式错误告警后用默认值
    fn parse_or_default<T>(&self, key: &str, default: T) -> RepositoryResult<T>
    where
        T: FromStr + Copy + std::fmt::Debug,
    {
        let raw = match self.get_global_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };

        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = ?default,
                    "配置值格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }

    /// 读取调度参数
    pub fn get_dispatch_config(&self) -> RepositoryResult<DispatchConfig> {
        let defaults = DispatchConfig::default();

        let mut config = DispatchConfig {
            average_speed_kmh: self
                .parse_or_default(config_keys::AVERAGE_SPEED_KMH, defaults.average_speed_kmh)?,
            arrival_threshold_km: self
                .parse_or_default(config_keys::ARRIVAL_THRESHOLD_KM, defaults.arrival_threshold_km)?,
            movement_step_fraction: self.parse_or_default(
                config_keys::MOVEMENT_STEP_FRACTION,
                defaults.movement_step_fraction,
            )?,
            recommendation_limit: self
                .parse_or_default(config_keys::RECOMMENDATION_LIMIT, defaults.recommendation_limit)?,
            max_conflict_retries: self
                .parse_or_default(config_keys::MAX_CONFLICT_RETRIES, defaults.max_conflict_retries)?,
            require_emergency_for_off_duty: self.parse_or_default(
                config_keys::REQUIRE_EMERGENCY_FOR_OFF_DUTY,
                defaults.require_emergency_for_off_duty,
            )?,
            movement_tick_secs: self
                .parse_or_default(config_keys::MOVEMENT_TICK_SECS, defaults.movement_tick_secs)?,
            movement_loop_enabled: self
                .parse_or_default(config_keys::MOVEMENT_LOOP_ENABLED, defaults.movement_loop_enabled)?,
        };

        // 数值越界同样回退
        if !(config.average_speed_kmh > 0.0) {
            tracing::warn!(value = config.average_speed_kmh, "average_speed_kmh 非正，使用默认值");
            config.average_speed_kmh = defaults.average_speed_kmh;
        }
        if !(config.arrival_threshold_km > 0.0) {
            tracing::warn!(value = config.arrival_threshold_km, "arrival_threshold_km 非正，使用默认值");
            config.arrival_threshold_km = defaults.arrival_threshold_km;
        }
        if config.recommendation_limit == 0 {
            config.recommendation_limit = defaults.recommendation_limit;
        }
        if config.movement_tick_secs == 0 {
            config.movement_tick_secs = defaults.movement_tick_secs;
        }

        Ok(config)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 行驶与到达
    pub const AVERAGE_SPEED_KMH: &str = "dispatch.average_speed_kmh";
    pub const ARRIVAL_THRESHOLD_KM: &str = "dispatch.arrival_threshold_km";
    pub const MOVEMENT_STEP_FRACTION: &str = "dispatch.movement_step_fraction";

    // 推荐
    pub const RECOMMENDATION_LIMIT: &str = "dispatch.recommendation_limit";

    // 并发
    pub const MAX_CONFLICT_RETRIES: &str = "dispatch.max_conflict_retries";

    // 派遣策略
    pub const REQUIRE_EMERGENCY_FOR_OFF_DUTY: &str = "dispatch.require_emergency_for_off_duty";

    // 后台推进
    pub const MOVEMENT_TICK_SECS: &str = "dispatch.movement_tick_secs";
    pub const MOVEMENT_LOOP_ENABLED: &str = "dispatch.movement_loop_enabled";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_empty() {
        let manager = setup_manager();
        assert_eq!(manager.get_dispatch_config().unwrap(), DispatchConfig::default());
        assert_eq!(manager.get_config_snapshot().unwrap(), "{}");
    }

    #[test]
    fn test_overrides_are_applied() {
        let manager = setup_manager();
        manager.set_config_value(config_keys::AVERAGE_SPEED_KMH, "60").unwrap();
        manager.set_config_value(config_keys::REQUIRE_EMERGENCY_FOR_OFF_DUTY, "false").unwrap();
        manager.set_config_value(config_keys::RECOMMENDATION_LIMIT, "3").unwrap();

        let config = manager.get_dispatch_config().unwrap();
        assert_eq!(config.average_speed_kmh, 60.0);
        assert!(!config.require_emergency_for_off_duty);
        assert_eq!(config.recommendation_limit, 3);
        assert_eq!(config.max_conflict_retries, 3);
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let manager = setup_manager();
        manager.set_config_value(config_keys::AVERAGE_SPEED_KMH, "fast").unwrap();
        manager.set_config_value(config_keys::ARRIVAL_THRESHOLD_KM, "-1").unwrap();
        manager.set_config_value(config_keys::MOVEMENT_LOOP_ENABLED, "yes").unwrap();

        let config = manager.get_dispatch_config().unwrap();
        assert_eq!(config.average_speed_kmh, DEFAULT_SPEED_KMH);
        assert_eq!(config.arrival_threshold_km, DEFAULT_ARRIVAL_THRESHOLD_KM);
        assert!(!config.movement_loop_enabled);
    }

    #[test]
    fn test_set_overwrites_and_snapshot_sorted() {
        let manager = setup_manager();
        manager.set_config_value("b.key", "1").unwrap();
        manager.set_config_value("a.key", "2").unwrap();
        manager.set_config_value("b.key", "3").unwrap();

        assert_eq!(
            manager.get_config_snapshot().unwrap(),
            r#"{"a.key":"2","b.key":"3"}"#
        );
        assert!(manager.set_config_value("  ", "x").is_err());
    }
}
