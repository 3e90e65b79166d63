// ==========================================
// 停电抢修调度系统 - 派遣推荐 API
// ==========================================
// 职责: 针对事件给出排序后的候选班组（Top N）
// 说明: 只读;事件无地理中心时返回空列表
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::clock::Clock;
use crate::config::DispatchConfig;
use crate::domain::types::CrewStatus;
use crate::engine::dispatch_scorer::{DispatchScorer, ScoreBreakdown};
use crate::repository::crew_repo::CrewStore;
use crate::repository::event_repo::EventStore;

/// 单次推荐的上限
pub const MAX_RECOMMENDATION_LIMIT: usize = 100;

pub struct RecommendationApi {
    crew_store: Arc<dyn CrewStore>,
    event_store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
    scorer: DispatchScorer,
    default_limit: usize,
}

impl RecommendationApi {
    pub fn new(
        crew_store: Arc<dyn CrewStore>,
        event_store: Arc<dyn EventStore>,
        clock: Arc<dyn Clock>,
        config: &DispatchConfig,
    ) -> Self {
        Self {
            crew_store,
            event_store,
            clock,
            scorer: DispatchScorer::new(config.average_speed_kmh),
            default_limit: config.recommendation_limit,
        }
    }

    /// 查询事件的推荐班组
    ///
    /// # 参数
    /// - event_id: 事件ID
    /// - limit: 返回数量（None 使用配置默认值）
    ///
    /// # 返回
    /// - Ok(Vec<ScoreBreakdown>): 按总分降序
    /// - Err(ApiError::NotFound): 事件不存在
    pub fn get_recommendations(
        &self,
        event_id: &str,
        limit: Option<usize>,
    ) -> ApiResult<Vec<ScoreBreakdown>> {
        if event_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("事件ID不能为空".to_string()));
        }
        let limit = match limit {
            Some(0) => return Err(ApiError::InvalidInput("limit必须大于0".to_string())),
            Some(n) => n.min(MAX_RECOMMENDATION_LIMIT),
            None => self.default_limit,
        };

        let event = self
            .event_store
            .get_event(event_id)?
            .ok_or_else(|| ApiError::NotFound(format!("OutageEvent(id={})不存在", event_id)))?;

        let candidates = self.crew_store.list_crews(Some(CrewStatus::Available))?;
        let mut ranked = self.scorer.rank(&candidates, &event, self.clock.now());
        ranked.truncate(limit);

        tracing::debug!(
            event_id = %event.event_id,
            candidates = candidates.len(),
            returned = ranked.len(),
            "生成派遣推荐"
        );

        Ok(ranked)
    }
}
