// ==========================================
// 停电抢修调度系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + axum
// 系统定位: 抢修班组派遣与可用性管理核心
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 时钟抽象
pub mod clock;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 距离、在岗、评分、状态机、移动模拟
pub mod engine;

// 配置层 - 调度参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - HTTP 与后台任务
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CrewStatus, DutyStatus, OutageType, Specialization};

// 领域实体
pub use domain::{
    ActionType, Crew, CrewActionLog, CrewWithAvailability, GeoPoint, OutageEvent,
    OvertimeLogEntry, ShiftEvaluation, ShiftSchedule,
};

// 时钟
pub use clock::{Clock, FixedClock, SystemClock};

// 引擎
pub use engine::{
    CrewAction, CrewStateMachine, DispatchScorer, MovementParams, MovementSimulator, MovementStep,
    ScoreBreakdown, TransitionError,
};

// API
pub use api::{ApiError, ApiResult, CrewApi, RecommendationApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "停电抢修调度系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
