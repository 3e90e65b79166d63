// ==========================================
// 停电抢修调度系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{CrewApi, RecommendationApi};
use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigManager, DispatchConfig};
use crate::db::{init_schema, open_sqlite_connection};
use crate::repository::{
    ActionLogRepository, CrewRepository, CrewStore, EventStore, OutageEventRepository,
    OvertimeLogRepository, OvertimeLogStore,
};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "CREW_DISPATCH_DB_PATH";

/// 应用状态
///
/// 包含所有API实例和共享资源,由 HTTP 路由与后台推进任务共享
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 班组调度API
    pub crew_api: Arc<CrewApi>,

    /// 派遣推荐API
    pub recommendation_api: Arc<RecommendationApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 启动时读取的调度参数
    pub dispatch_config: DispatchConfig,
}

impl AppState {
    /// 创建新的AppState实例（系统时钟）
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开共享连接并幂等建表
    /// 2. 读取调度参数
    /// 3. 初始化所有Repository与API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::with_clock(db_path, Arc::new(SystemClock))
    }

    /// 使用指定时钟创建（测试/回放用）
    pub fn with_clock(db_path: String, clock: Arc<dyn Clock>) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("schema 初始化失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化配置
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let dispatch_config = config_manager
            .get_dispatch_config()
            .map_err(|e| format!("读取调度参数失败: {}", e))?;
        tracing::info!(?dispatch_config, "调度参数已加载");

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let crew_store: Arc<dyn CrewStore> = Arc::new(CrewRepository::new(conn.clone()));
        let event_store: Arc<dyn EventStore> = Arc::new(OutageEventRepository::new(conn.clone()));
        let overtime_store: Arc<dyn OvertimeLogStore> =
            Arc::new(OvertimeLogRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn));

        // ==========================================
        // 初始化API层
        // ==========================================
        let crew_api = Arc::new(CrewApi::new(
            crew_store.clone(),
            event_store.clone(),
            overtime_store,
            action_log_repo,
            clock.clone(),
            dispatch_config.clone(),
        ));
        let recommendation_api = Arc::new(RecommendationApi::new(
            crew_store,
            event_store,
            clock,
            &dispatch_config,
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            crew_api,
            recommendation_api,
            config_manager,
            dispatch_config,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 CREW_DISPATCH_DB_PATH（非空时优先）
/// - 否则: 用户数据目录/outage-crew-dispatch/crew_dispatch.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./crew_dispatch.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("outage-crew-dispatch");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("crew_dispatch.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_new_initializes_schema_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("state.db").to_string_lossy().to_string();

        let state = AppState::new(db_path.clone()).unwrap();
        assert_eq!(state.get_db_path(), db_path);
        assert_eq!(state.dispatch_config, DispatchConfig::default());
        assert!(state.crew_api.list_crews(None).unwrap().is_empty());
    }
}
