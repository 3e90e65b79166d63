// ==========================================
// 停电抢修调度系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod crew;
pub mod event;
pub mod overtime_log;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionType, CrewActionLog};
pub use crew::{Crew, CrewWithAvailability, ShiftEvaluation, ShiftSchedule};
pub use event::{GeoPoint, OutageEvent};
pub use overtime_log::OvertimeLogEntry;
pub use types::{CrewStatus, DutyStatus, OutageType, Specialization};
