// crates/adc_geo/src/projection.rs
//! 投影转换
//!
//! 网格坐标重投影委托给外部投影引擎，此处只定义引擎接口。
//! [`BuiltinProjection`] 提供不依赖外部库的 WGS84 (EPSG:4326) 与
//! Web Mercator (EPSG:3857) 互转；更多坐标系需由调用方接入自己的引擎。
//!
//! 另外提供 ADCIRC 使用的 CPP（等距圆柱）投影及其逆变换。

use crate::error::{GeoError, GeoResult};
use crate::geometry::{radius_earth, Point2D, EQUATORIAL_RADIUS};
use std::f64::consts::PI;

/// WGS84 地理坐标
pub const EPSG_WGS84: u32 = 4326;

/// Web Mercator
pub const EPSG_WEB_MERCATOR: u32 = 3857;

/// Web Mercator 最大纬度 (度)
pub const WEB_MERCATOR_MAX_LAT: f64 = 85.051_128_779;

/// 投影引擎接口
///
/// 将一组点从 `src_epsg` 转换到 `dst_epsg`，同时返回目标坐标系是否为地理坐标。
pub trait ProjectionEngine: Send + Sync {
    /// 批量坐标转换
    ///
    /// # Errors
    /// - [`GeoError::NoSuchProjection`]: 引擎不支持该 EPSG 组合
    /// - [`GeoError::Internal`]: 引擎内部失败
    fn transform(
        &self,
        src_epsg: u32,
        dst_epsg: u32,
        points: &[Point2D],
    ) -> GeoResult<(Vec<Point2D>, bool)>;
}

/// 内置投影引擎
///
/// 仅支持 EPSG:4326 与 EPSG:3857 之间的转换，以及同一坐标系的恒等转换。
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinProjection;

impl BuiltinProjection {
    fn is_geographic(epsg: u32) -> Option<bool> {
        match epsg {
            EPSG_WGS84 => Some(true),
            EPSG_WEB_MERCATOR => Some(false),
            _ => None,
        }
    }
}

impl ProjectionEngine for BuiltinProjection {
    fn transform(
        &self,
        src_epsg: u32,
        dst_epsg: u32,
        points: &[Point2D],
    ) -> GeoResult<(Vec<Point2D>, bool)> {
        let (Some(_), Some(dst_geographic)) =
            (Self::is_geographic(src_epsg), Self::is_geographic(dst_epsg))
        else {
            return Err(GeoError::no_such_projection(src_epsg, dst_epsg));
        };

        let out = match (src_epsg, dst_epsg) {
            (EPSG_WGS84, EPSG_WEB_MERCATOR) => points
                .iter()
                .map(|p| geographic_to_web_mercator(p.x, p.y))
                .collect(),
            (EPSG_WEB_MERCATOR, EPSG_WGS84) => points
                .iter()
                .map(|p| web_mercator_to_geographic(p.x, p.y))
                .collect(),
            _ => points.to_vec(),
        };
        Ok((out, dst_geographic))
    }
}

/// 地理坐标 -> Web Mercator
///
/// 纬度被裁剪到 Web Mercator 有效范围。
#[must_use]
pub fn geographic_to_web_mercator(lon: f64, lat: f64) -> Point2D {
    let lat = lat.clamp(-WEB_MERCATOR_MAX_LAT, WEB_MERCATOR_MAX_LAT);
    let x = EQUATORIAL_RADIUS * lon.to_radians();
    let y = EQUATORIAL_RADIUS * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
    Point2D::new(x, y)
}

/// Web Mercator -> 地理坐标
#[must_use]
pub fn web_mercator_to_geographic(x: f64, y: f64) -> Point2D {
    let lon = (x / EQUATORIAL_RADIUS).to_degrees();
    let lat = (2.0 * (y / EQUATORIAL_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    Point2D::new(lon, lat)
}

// ============================================================
// CPP 投影
// ============================================================

/// CPP 正投影
///
/// `(lambda0, phi0)` 为投影中心经纬度（度），输入点为经纬度，输出单位为米：
/// `x = R(phi0) (lon - lambda0) cos(phi0)`，`y = R(phi0) lat`（角度取弧度）。
#[must_use]
pub fn cpp(lambda0: f64, phi0: f64, points: &[Point2D]) -> Vec<Point2D> {
    let slam0 = lambda0.to_radians();
    let sfea0 = phi0.to_radians();
    let r = radius_earth(phi0);
    points
        .iter()
        .map(|p| {
            Point2D::new(
                r * (p.x.to_radians() - slam0) * sfea0.cos(),
                r * p.y.to_radians(),
            )
        })
        .collect()
}

/// CPP 逆投影
///
/// 将 [`cpp`] 输出的平面坐标还原为经纬度。
#[must_use]
pub fn inverse_cpp(lambda0: f64, phi0: f64, points: &[Point2D]) -> Vec<Point2D> {
    let slam0 = lambda0.to_radians();
    let sfea0 = phi0.to_radians();
    let r = radius_earth(phi0);
    points
        .iter()
        .map(|p| {
            Point2D::new(
                (slam0 + p.x / (r * sfea0.cos())).to_degrees(),
                (p.y / r).to_degrees(),
            )
        })
        .collect()
}
