// ==========================================
// 停电抢修调度系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供 HTTP 路由与后台任务调用
// ==========================================

pub mod crew_api;
pub mod error;
pub mod recommendation_api;

// 重导出核心类型
pub use crew_api::{
    CrewApi, DispatchRequest, EmergencyDispatchRequest, EmergencyDispatchResponse,
    MovementStepRequest, SYSTEM_ACTOR,
};
pub use error::{ApiError, ApiResult};
pub use recommendation_api::RecommendationApi;
