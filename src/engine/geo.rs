// ==========================================
// 停电抢修调度系统 - 地理距离
// ==========================================
// 职责: 球面大圆距离 (haversine) 与到达时间估算
// 说明: 直线距离近似,不是路径规划
// ==========================================

use crate::domain::event::GeoPoint;

/// 地球平均半径（公里）
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// 抢修车辆平均速度（公里/小时,含城区延误）
pub const DEFAULT_SPEED_KMH: f64 = 48.0;

/// Haversine 大圆距离（公里）
pub fn distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// 两点间距离（公里）
pub fn distance_between(a: GeoPoint, b: GeoPoint) -> f64 {
    distance_km(a.lat, a.lng, b.lat, b.lng)
}

/// 经度差折算到 [-180, 180],跨越 ±180° 经线时取短的一侧
pub fn lng_delta(from_lng: f64, to_lng: f64) -> f64 {
    let mut d = to_lng - from_lng;
    if d > 180.0 {
        d -= 360.0;
    } else if d < -180.0 {
        d += 360.0;
    }
    d
}

/// 经度归一化到 [-180, 180]
pub fn normalize_lng(lng: f64) -> f64 {
    if lng > 180.0 {
        lng - 360.0
    } else if lng < -180.0 {
        lng + 360.0
    } else {
        lng
    }
}

/// 到达时间估算（分钟,四舍五入）
///
/// 速度非正时按默认速度计算
pub fn eta_minutes(distance_km: f64, speed_kmh: f64) -> i64 {
    let speed = if speed_kmh > 0.0 { speed_kmh } else { DEFAULT_SPEED_KMH };
    (distance_km / speed * 60.0).round() as i64
}
