// crates/adc_geo/src/geometry.rs
//! 几何类型定义
//!
//! 提供二维点类型以及网格工具使用的距离计算。
//!
//! # 距离计算
//!
//! - `distance_to`: 欧几里得距离（适用于投影坐标）
//! - `geodesic_distance_to`: Haversine 公式，地球半径取两点平均纬度处的椭球半径

use serde::{Deserialize, Serialize};

// ============================================================================
// 地球物理常量
// ============================================================================

/// 赤道半径 (米)
pub const EQUATORIAL_RADIUS: f64 = 6_378_137.0;

/// 极半径 (米)
pub const POLAR_RADIUS: f64 = 6_356_752.3;

/// 给定纬度处的地球半径 (米)
///
/// 椭球在该纬度处的地心距离：
/// `sqrt((a^4 cos^2 + b^4 sin^2) / (a^2 cos^2 + b^2 sin^2))`
#[must_use]
pub fn radius_earth(latitude: f64) -> f64 {
    let l = latitude.to_radians();
    let (s, c) = (l.sin(), l.cos());
    let a = EQUATORIAL_RADIUS;
    let b = POLAR_RADIUS;
    ((a.powi(4) * c * c + b.powi(4) * s * s) / (a * a * c * c + b * b * s * s)).sqrt()
}

/// 两点距离
///
/// `geodesic` 为真时按经纬度计算大圆距离，否则为平面距离。
#[inline]
#[must_use]
pub fn distance(p1: &Point2D, p2: &Point2D, geodesic: bool) -> f64 {
    if geodesic {
        p1.geodesic_distance_to(p2)
    } else {
        p1.distance_to(p2)
    }
}

// ============================================================================
// Point2D
// ============================================================================

/// 2D点
///
/// 投影坐标下 `x`/`y` 为东向/北向坐标，
/// 地理坐标下 `x` 为经度、`y` 为纬度（度）。
///
/// ```
/// use adc_geo::geometry::Point2D;
///
/// let p1 = Point2D::new(-90.0, 30.0);
/// let p2 = Point2D::new(-90.0, 31.0);
/// let dist_km = p1.geodesic_distance_to(&p2) / 1000.0; // 约 111 km
/// assert!((dist_km - 111.0).abs() < 1.0);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    /// X坐标（或经度）
    pub x: f64,
    /// Y坐标（或纬度）
    pub y: f64,
}

impl Point2D {
    /// 零点常量
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// 创建新的2D点
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// 欧几里得距离
    #[inline]
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx.hypot(dy)
    }

    /// 距离平方
    #[inline]
    #[must_use]
    pub fn distance_squared_to(&self, other: &Self) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    /// 大圆距离 (米)
    ///
    /// Haversine 公式，半径取平均纬度处的 [`radius_earth`]。
    #[must_use]
    pub fn geodesic_distance_to(&self, other: &Self) -> f64 {
        let lat1 = self.y.to_radians();
        let lat2 = other.y.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (other.x - self.x).to_radians();
        let r = radius_earth((self.y + other.y) / 2.0);

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * r * a.sqrt().asin()
    }

    /// 中点
    #[inline]
    #[must_use]
    pub fn midpoint(&self, other: &Self) -> Self {
        Self::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }

    /// 转换为数组
    #[inline]
    #[must_use]
    pub const fn to_array(self) -> [f64; 2] {
        [self.x, self.y]
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<[f64; 2]> for Point2D {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}
