// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 组装基于临时数据库与固定时钟的 API 实例
// ==========================================

use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use rusqlite::Connection;
use tempfile::NamedTempFile;

use crew_dispatch::api::{CrewApi, RecommendationApi};
use crew_dispatch::clock::{Clock, FixedClock};
use crew_dispatch::config::DispatchConfig;
use crew_dispatch::domain::{Crew, OutageEvent};
use crew_dispatch::repository::{
    ActionLogRepository, CrewRepository, CrewStore, EventStore, OutageEventRepository,
    OvertimeLogRepository, OvertimeLogStore,
};

use crate::test_helpers::{create_test_db, open_test_connection};

/// API测试环境
pub struct TestEnv {
    pub _temp_file: NamedTempFile,
    pub db_path: String,
    pub clock: Arc<FixedClock>,
    pub crew_repo: Arc<CrewRepository>,
    pub event_repo: Arc<OutageEventRepository>,
    pub overtime_repo: Arc<OvertimeLogRepository>,
    pub action_log_repo: Arc<ActionLogRepository>,
    pub crew_api: Arc<CrewApi>,
    pub recommendation_api: Arc<RecommendationApi>,
}

impl TestEnv {
    pub fn insert_crew(&self, crew: &Crew) {
        self.crew_repo.insert_crew(crew).unwrap();
    }

    pub fn insert_event(&self, event: &OutageEvent) {
        self.event_repo.upsert_event(event).unwrap();
    }

    pub fn crew(&self, crew_id: &str) -> Crew {
        self.crew_repo.get_crew(crew_id).unwrap().unwrap()
    }
}

/// 默认配置的测试环境
pub fn setup_env(now: NaiveDateTime) -> TestEnv {
    build_env(now, DispatchConfig::default())
}

/// 指定配置的测试环境
pub fn setup_env_with_config(now: NaiveDateTime, config: DispatchConfig) -> TestEnv {
    build_env(now, config)
}

fn build_env(now: NaiveDateTime, config: DispatchConfig) -> TestEnv {
    let (temp_file, db_path) = create_test_db().unwrap();
    let conn: Arc<Mutex<Connection>> = Arc::new(Mutex::new(open_test_connection(&db_path).unwrap()));

    let clock = Arc::new(FixedClock::new(now));
    let crew_repo = Arc::new(CrewRepository::new(conn.clone()));
    let event_repo = Arc::new(OutageEventRepository::new(conn.clone()));
    let overtime_repo = Arc::new(OvertimeLogRepository::new(conn.clone()));
    let action_log_repo = Arc::new(ActionLogRepository::new(conn));

    let overtime_store: Arc<dyn OvertimeLogStore> = overtime_repo.clone();
    let crew_store: Arc<dyn CrewStore> = crew_repo.clone();
    let event_store: Arc<dyn EventStore> = event_repo.clone();
    let dyn_clock: Arc<dyn Clock> = clock.clone();

    let crew_api = Arc::new(CrewApi::new(
        crew_store.clone(),
        event_store.clone(),
        overtime_store,
        action_log_repo.clone(),
        dyn_clock.clone(),
        config.clone(),
    ));
    let recommendation_api = Arc::new(RecommendationApi::new(
        crew_store,
        event_store,
        dyn_clock,
        &config,
    ));

    TestEnv {
        _temp_file: temp_file,
        db_path,
        clock,
        crew_repo,
        event_repo,
        overtime_repo,
        action_log_repo,
        crew_api,
        recommendation_api,
    }
}
