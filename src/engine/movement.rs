// ==========================================
// 停电抢修调度系统 - 移动模拟
// ==========================================
// 职责: 每次推进剩余直线距离的固定比例（默认 20%）,判定到达
// 说明: 指数逼近,先快后慢;从不直接跳到目标点,需要多次调用才能到达
// ==========================================

use crate::domain::event::GeoPoint;
use crate::engine::geo;
use serde::Serialize;

/// 每次推进的剩余距离比例
pub const DEFAULT_STEP_FRACTION: f64 = 0.2;

/// 到达判定容差（公里）
pub const DEFAULT_ARRIVAL_THRESHOLD_KM: f64 = 0.5;

// ==========================================
// MovementParams - 模拟参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementParams {
    pub step_fraction: f64,
    pub arrival_threshold_km: f64,
    pub speed_kmh: f64,
}

impl Default for MovementParams {
    fn default() -> Self {
        Self {
            step_fraction: DEFAULT_STEP_FRACTION,
            arrival_threshold_km: DEFAULT_ARRIVAL_THRESHOLD_KM,
            speed_kmh: geo::DEFAULT_SPEED_KMH,
        }
    }
}

// ==========================================
// MovementStep - 单步结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MovementStep {
    pub new_lat: f64,
    pub new_lng: f64,
    pub remaining_km: f64,
    pub eta_minutes: i64,
    pub arrived: bool,
}

// ==========================================
// MovementSimulator
// ==========================================
pub struct MovementSimulator {
    params: MovementParams,
}

impl MovementSimulator {
    pub fn new(params: MovementParams) -> Self {
        // 比例必须落在 (0, 1) 内,否则退回默认值（0 不收敛,1 会直接跳到目标）
        let step_fraction = if params.step_fraction > 0.0 && params.step_fraction < 1.0 {
            params.step_fraction
        } else {
            tracing::warn!(
                step_fraction = params.step_fraction,
                "移动比例非法,使用默认值"
            );
            DEFAULT_STEP_FRACTION
        };
        Self {
            params: MovementParams {
                step_fraction,
                ..params
            },
        }
    }

    pub fn params(&self) -> &MovementParams {
        &self.params
    }

    /// 推进一步
    ///
    /// # 参数
    /// - `from`: 当前位置
    /// - `target`: 目标位置
    ///
    /// # 返回
    /// 新位置、剩余距离、ETA 与到达标志;到达时由调用方流转为 on_site
    pub fn step(&self, from: GeoPoint, target: GeoPoint) -> MovementStep {
        let f = self.params.step_fraction;
        let new_lat = from.lat + (target.lat - from.lat) * f;
        let new_lng = geo::normalize_lng(from.lng + geo::lng_delta(from.lng, target.lng) * f);

        let remaining_km = geo::distance_km(new_lat, new_lng, target.lat, target.lng);
        let arrived = remaining_km < self.params.arrival_threshold_km;
        let eta_minutes = if arrived {
            0
        } else {
            geo::eta_minutes(remaining_km, self.params.speed_kmh)
        };

        MovementStep {
            new_lat,
            new_lng,
            remaining_km,
            eta_minutes,
            arrived,
        }
    }
}

impl Default for MovementSimulator {
    fn default() -> Self {
        Self::new(MovementParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_until_arrived(sim: &MovementSimulator, start: GeoPoint, target: GeoPoint) -> (usize, Vec<f64>) {
        let mut pos = start;
        let mut trace = vec![geo::distance_between(start, target)];
        for n in 1..=200 {
            let step = sim.step(pos, target);
            trace.push(step.remaining_km);
            if step.arrived {
                return (n, trace);
            }
            pos = GeoPoint::new(step.new_lat, step.new_lng);
        }
        (usize::MAX, trace)
    }

    #[test]
    fn test_single_step_moves_twenty_percent() {
        let sim = MovementSimulator::default();
        let from = GeoPoint::new(40.0, -75.0);
        let target = GeoPoint::new(40.5, -74.5);
        let step = sim.step(from, target);

        assert!((step.new_lat - 40.1).abs() < 1e-12);
        assert!((step.new_lng - (-74.9)).abs() < 1e-12);
        assert!(!step.arrived);

        let before = geo::distance_between(from, target);
        assert!(step.remaining_km < before);
        assert!((step.remaining_km / before - 0.8).abs() < 0.01);
    }

    #[test]
    fn test_never_jumps_to_target_in_one_step() {
        let sim = MovementSimulator::default();
        let from = GeoPoint::new(40.0, -75.0);
        let target = GeoPoint::new(40.05, -75.0); // 约 5.6 km
        let step = sim.step(from, target);
        assert!(!step.arrived);
        assert!(step.new_lat < target.lat);
    }

    #[test]
    fn test_monotonic_convergence_within_sixty_steps() {
        let sim = MovementSimulator::default();
        let cases = [
            (GeoPoint::new(40.0, -75.0), GeoPoint::new(40.01, -75.01)),
            (GeoPoint::new(40.0, -75.0), GeoPoint::new(40.3, -74.6)),
            (GeoPoint::new(40.0, -75.0), GeoPoint::new(44.0, -71.0)), // 约 560 km
            (GeoPoint::new(30.0, -90.0), GeoPoint::new(36.0, -84.0)), // 约 870 km
            (GeoPoint::new(52.0, 179.0), GeoPoint::new(52.0, -179.0)), // 跨 180° 经线,约 137 km
            (GeoPoint::new(-16.0, -179.5), GeoPoint::new(-18.0, 178.0)), // 反方向跨线
        ];
        for (start, target) in cases {
            assert!(geo::distance_between(start, target) < 1000.0);
            let (steps, trace) = run_until_arrived(&sim, start, target);
            assert!(steps <= 60, "未在 60 步内到达: steps={}", steps);
            for w in trace.windows(2) {
                assert!(w[1] < w[0], "剩余距离未单调下降: {:?}", w);
            }
        }
    }

    #[test]
    fn test_step_across_antimeridian_takes_short_side() {
        let sim = MovementSimulator::default();
        let from = GeoPoint::new(52.0, 179.0);
        let target = GeoPoint::new(52.0, -179.0);
        let step = sim.step(from, target);

        assert!((step.new_lng - 179.4).abs() < 1e-9);
        assert!(step.remaining_km < geo::distance_between(from, target));

        // 越线后经度回到 [-180, 180]
        let mut pos = from;
        for _ in 0..10 {
            let s = sim.step(pos, target);
            assert!((-180.0..=180.0).contains(&s.new_lng), "经度越界: {}", s.new_lng);
            pos = GeoPoint::new(s.new_lat, s.new_lng);
        }
        assert!(pos.lng < 0.0);
    }

    #[test]
    fn test_arrival_sets_zero_eta() {
        let sim = MovementSimulator::default();
        let target = GeoPoint::new(40.0, -75.0);
        let step = sim.step(GeoPoint::new(40.001, -75.0), target);
        assert!(step.arrived);
        assert_eq!(step.eta_minutes, 0);
    }

    #[test]
    fn test_invalid_fraction_falls_back_to_default() {
        let sim = MovementSimulator::new(MovementParams {
            step_fraction: 1.5,
            ..MovementParams::default()
        });
        assert_eq!(sim.params().step_fraction, DEFAULT_STEP_FRACTION);
    }
}
