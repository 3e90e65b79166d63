// ==========================================
// 停电抢修调度系统 - 在岗状态判定
// ==========================================
// 职责: 由排班 + 当前时间派生 on_shift / on_break / off_duty
// 红线: 纯函数,不缓存,每次查询重新计算
// ==========================================

use crate::clock::Clock;
use crate::domain::crew::{Crew, CrewWithAvailability, ShiftEvaluation, ShiftSchedule};
use crate::domain::types::{weekday_abbr, DutyStatus};
use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike};

/// 一天中的分钟数
fn minutes_of_day(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}

/// 时间区间包含判定（支持跨夜）
///
/// - start <= end: start <= t < end
/// - start > end (跨夜): t >= start 或 t < end
pub fn time_in_range(start: NaiveTime, end: NaiveTime, t: NaiveTime) -> bool {
    let (s, e, m) = (minutes_of_day(start), minutes_of_day(end), minutes_of_day(t));
    if s <= e {
        s <= m && m < e
    } else {
        m >= s || m < e
    }
}

/// 判定在岗状态
pub fn evaluate(schedule: &ShiftSchedule, now: NaiveDateTime) -> ShiftEvaluation {
    let today = weekday_abbr(now.weekday());
    let is_work_day = schedule
        .work_days
        .iter()
        .any(|d| d.eq_ignore_ascii_case(today));

    let t = now.time();
    let in_shift = time_in_range(schedule.shift_start, schedule.shift_end, t);

    let is_on_break = match (schedule.break_start, schedule.break_end) {
        (Some(bs), Some(be)) => time_in_range(bs, be, t),
        _ => false,
    };

    let duty_status = if !is_work_day || !in_shift {
        DutyStatus::OffDuty
    } else if is_on_break {
        DutyStatus::OnBreak
    } else {
        DutyStatus::OnShift
    };

    ShiftEvaluation {
        is_work_day,
        is_on_break,
        duty_status,
    }
}

/// 生成带可用性的派生视图
pub fn annotate(crew: Crew, clock: &dyn Clock) -> CrewWithAvailability {
    let availability = evaluate(&crew.schedule, clock.now());
    CrewWithAvailability { crew, availability }
}
