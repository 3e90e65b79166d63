// ==========================================
// 停电抢修调度系统 - 班组操作日志数据仓储
// ==========================================
// 对齐: crew_action_log 表
// 红线: 所有班组写入必须记录
// ==========================================

mod core;
mod queries;


pub use core::ActionLogRepository;
