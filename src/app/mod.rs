// ==========================================
// 停电抢修调度系统 - 应用层
// ==========================================
// 职责: 组装仓储与API,提供 HTTP 接口与后台推进任务
// ==========================================

pub mod movement_loop;
pub mod routes;
pub mod state;

// 重导出
pub use movement_loop::{run_tick, spawn_movement_loop, MovementLoopHandle, TickSummary};
pub use routes::create_router;
pub use state::{get_default_db_path, AppState};
