// ==========================================
// 停电抢修调度系统 - 配置层
// ==========================================
// 职责: 调度参数管理,数据库配置覆写默认值
// 存储: config_kv 表
// ==========================================

pub mod config_manager;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, DispatchConfig};
