// ==========================================
// 停电抢修调度系统 - 派遣评分引擎
// ==========================================
// 职责: 针对目标事件,对待命班组按距离、专业、在岗状态、人数打分排序
// 输入: 候选班组列表 + 事件 + 当前时间
// 输出: 排序后的 ScoreBreakdown 列表（含可解释原因）
// 红线: 所有评分必须输出 reason
// ==========================================
//
// 总分 = 距离分(0-40) + 专业分(0-35) + 在岗分(0-25) + 人数加成(0-10)

mod scoring;


use crate::domain::crew::Crew;
use crate::domain::event::OutageEvent;
use crate::domain::types::{CrewStatus, DutyStatus, Specialization};
use crate::engine::{geo, shift_availability};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub use scoring::{
    availability_score, proximity_score, specialization_score, team_size_bonus,
    LARGE_EVENT_CUSTOMER_THRESHOLD,
};

// ==========================================
// ScoreBreakdown - 单个班组的评分明细
// ==========================================
// 临时结果,不落库,按需重算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub crew_id: String,
    pub crew_name: String,
    pub specialization: Option<Specialization>,
    pub distance_km: f64,
    pub eta_minutes: i64,
    pub duty_status: DutyStatus,

    // ===== 分项得分 =====
    pub proximity_score: f64,
    pub specialization_score: f64,
    pub availability_score: f64,
    pub team_size_bonus: f64,
    pub total_score: f64,

    // ===== 可解释性 =====
    pub reasons: Vec<String>,
    pub requires_emergency: bool, // 非在岗,只能走紧急派遣
}

// ==========================================
// DispatchScorer - 派遣评分引擎
// ==========================================
pub struct DispatchScorer {
    speed_kmh: f64,
}

impl DispatchScorer {
    /// 构造函数
    ///
    /// # 参数
    /// - `speed_kmh`: ETA 估算速度
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    /// 对候选班组排序
    ///
    /// 规则:
    /// 1) 仅 status=available 的班组参与（在岗状态不影响资格,非在岗班组用于紧急推荐）
    /// 2) 事件无地理中心时返回空列表,不报错
    /// 3) 按总分降序稳定排序,同分保持输入顺序
    pub fn rank(
        &self,
        candidates: &[Crew],
        event: &OutageEvent,
        now: NaiveDateTime,
    ) -> Vec<ScoreBreakdown> {
        let center = match event.geo_center {
            Some(c) => c,
            None => {
                tracing::debug!(event_id = %event.event_id, "事件无地理中心,跳过评分");
                return Vec::new();
            }
        };

        let mut results: Vec<ScoreBreakdown> = candidates
            .iter()
            .filter(|c| c.status == CrewStatus::Available)
            .map(|crew| {
                let distance = geo::distance_between(crew.position(), center);
                self.score(crew, event, distance, now)
            })
            .collect();

        // sort_by 为稳定排序
        results.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
        results
    }

    /// 计算单个班组得分
    fn score(
        &self,
        crew: &Crew,
        event: &OutageEvent,
        distance_km: f64,
        now: NaiveDateTime,
    ) -> ScoreBreakdown {
        let duty = shift_availability::evaluate(&crew.schedule, now).duty_status;
        let mut reasons = Vec::new();

        let proximity = proximity_score(distance_km);
        reasons.push(scoring::proximity_reason(distance_km));

        let (specialization, spec_reason) =
            specialization_score(crew.specialization, event.outage_type);
        if let Some(r) = spec_reason {
            reasons.push(r);
        }

        let availability = availability_score(duty);
        reasons.push(scoring::duty_reason(duty).to_string());

        let team_bonus = team_size_bonus(crew.team_size, event.customers_impacted);
        if team_bonus > 0.0 {
            reasons.push(format!(
                "Team of {} for {} customers",
                crew.team_size, event.customers_impacted
            ));
        }

        ScoreBreakdown {
            crew_id: crew.crew_id.clone(),
            crew_name: crew.crew_name.clone(),
            specialization: crew.specialization,
            distance_km,
            eta_minutes: geo::eta_minutes(distance_km, self.speed_kmh),
            duty_status: duty,
            proximity_score: proximity,
            specialization_score: specialization,
            availability_score: availability,
            team_size_bonus: team_bonus,
            total_score: proximity + specialization + availability + team_bonus,
            reasons,
            requires_emergency: duty == DutyStatus::OffDuty,
        }
    }
}

impl Default for DispatchScorer {
    fn default() -> Self {
        Self::new(geo::DEFAULT_SPEED_KMH)
    }
}
