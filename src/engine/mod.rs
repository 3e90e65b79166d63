// ==========================================
// 停电抢修调度系统 - 引擎层
// ==========================================
// 职责: 距离估算、在岗判定、派遣评分、状态流转、移动模拟
// 红线: Engine 不拼 SQL, 所有评分必须输出 reason
// ==========================================

pub mod crew_state_machine;
pub mod dispatch_scorer;
pub mod geo;
pub mod movement;
pub mod shift_availability;

#[cfg(test)]
pub(crate) mod test_support;

// 重导出核心引擎
pub use crew_state_machine::{
    CrewAction, CrewStateMachine, DispatchOrder, EmergencyAuthorization, TransitionError,
};
pub use dispatch_scorer::{DispatchScorer, ScoreBreakdown};
pub use movement::{MovementParams, MovementSimulator, MovementStep};
