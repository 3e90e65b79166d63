// ==========================================
// RecommendationApi 集成测试
// ==========================================

mod helpers;

use crew_dispatch::api::ApiError;
use crew_dispatch::config::DispatchConfig;
use crew_dispatch::domain::{CrewStatus, DutyStatus, OutageType, Specialization};

use helpers::api_test_helper::{setup_env, setup_env_with_config, TestEnv};
use helpers::test_data_builder::{monday_at, CrewBuilder, EventBuilder};

/// 风暴事件 (40.1, -75.0),1500 户受影响
fn storm_env(config: DispatchConfig) -> TestEnv {
    let env = setup_env_with_config(monday_at(10, 0), config);
    env.insert_event(
        &EventBuilder::new("E1")
            .outage_type(OutageType::Storm)
            .customers(1500)
            .build(),
    );

    // 近距离、专业首选、大班组
    env.insert_crew(
        &CrewBuilder::new("C-STORM")
            .at(40.09, -75.0)
            .specialization(Specialization::StormResponse)
            .team_size(5)
            .build(),
    );
    // 次级专业,稍远
    env.insert_crew(
        &CrewBuilder::new("C-LINE")
            .at(40.0, -75.0)
            .specialization(Specialization::LineCrew)
            .build(),
    );
    // 周末班组,周一非在岗
    env.insert_crew(
        &CrewBuilder::new("C-WEEKEND")
            .at(40.1, -75.01)
            .specialization(Specialization::General)
            .work_days(&["Sat", "Sun"])
            .build(),
    );
    // 已有任务,不参与推荐
    env.insert_crew(
        &CrewBuilder::new("C-BUSY")
            .at(40.1, -75.0)
            .specialization(Specialization::StormResponse)
            .status(CrewStatus::EnRoute)
            .assigned("E0", 3, monday_at(9, 30))
            .build(),
    );
    env
}

#[test]
fn test_recommendations_ranked_by_total_score() {
    let env = storm_env(DispatchConfig::default());

    let ranked = env.recommendation_api.get_recommendations("E1", None).unwrap();
    let ids: Vec<&str> = ranked.iter().map(|r| r.crew_id.as_str()).collect();

    assert_eq!(ranked.len(), 3);
    assert!(!ids.contains(&"C-BUSY"));
    assert_eq!(ids[0], "C-STORM");
    for pair in ranked.windows(2) {
        assert!(pair[0].total_score >= pair[1].total_score);
    }

    let top = &ranked[0];
    assert_eq!(top.duty_status, DutyStatus::OnShift);
    assert_eq!(top.specialization_score, 35.0);
    assert_eq!(top.team_size_bonus, 10.0);
    assert!(!top.requires_emergency);
    assert!(top.reasons.iter().any(|r| r == "Very close"));
    assert!(top.reasons.iter().any(|r| r == "Storm Response specialist"));
}

#[test]
fn test_off_duty_candidate_flagged_for_emergency() {
    let env = storm_env(DispatchConfig::default());

    let ranked = env.recommendation_api.get_recommendations("E1", None).unwrap();
    let weekend = ranked
        .iter()
        .find(|r| r.crew_id == "C-WEEKEND")
        .expect("周末班组应出现在候选中");

    assert_eq!(weekend.duty_status, DutyStatus::OffDuty);
    assert!(weekend.requires_emergency);
    assert_eq!(weekend.availability_score, 5.0);
    assert!(weekend
        .reasons
        .iter()
        .any(|r| r == "Off duty (emergency only)"));
}

#[test]
fn test_recommendation_limit() {
    let config = DispatchConfig {
        recommendation_limit: 2,
        ..DispatchConfig::default()
    };
    let env = storm_env(config);

    assert_eq!(
        env.recommendation_api
            .get_recommendations("E1", None)
            .unwrap()
            .len(),
        2
    );
    assert_eq!(
        env.recommendation_api
            .get_recommendations("E1", Some(1))
            .unwrap()
            .len(),
        1
    );
    assert!(matches!(
        env.recommendation_api
            .get_recommendations("E1", Some(0))
            .unwrap_err(),
        ApiError::InvalidInput(_)
    ));
}

#[test]
fn test_event_without_center_yields_empty_list() {
    let env = setup_env(monday_at(10, 0));
    env.insert_crew(&CrewBuilder::new("C1").build());
    env.insert_event(&EventBuilder::new("E-NOGEO").no_center().build());

    let ranked = env
        .recommendation_api
        .get_recommendations("E-NOGEO", None)
        .unwrap();
    assert!(ranked.is_empty());
}

#[test]
fn test_unknown_event_is_not_found() {
    let env = setup_env(monday_at(10, 0));
    env.insert_crew(&CrewBuilder::new("C1").build());

    assert!(matches!(
        env.recommendation_api
            .get_recommendations("E404", None)
            .unwrap_err(),
        ApiError::NotFound(_)
    ));
}

#[test]
fn test_recommendations_follow_clock() {
    let env = storm_env(DispatchConfig::default());

    // 周一 12:15 午休
    env.clock.set(monday_at(12, 15));
    let ranked = env.recommendation_api.get_recommendations("E1", None).unwrap();
    let storm = ranked.iter().find(|r| r.crew_id == "C-STORM").unwrap();
    assert_eq!(storm.duty_status, DutyStatus::OnBreak);
    assert_eq!(storm.availability_score, 15.0);
}
