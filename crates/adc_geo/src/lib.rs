// crates/adc_geo/src/lib.rs
//! ADCIRC 网格工具的地理空间基础模块
//!
//! 提供点类型、距离计算以及投影引擎接口。
//!
//! # 模块
//!
//! - `geometry`: 二维点类型、平面距离与大圆距离、地球半径模型
//! - `projection`: 外部投影引擎接口、内置 4326/3857 引擎与 CPP 投影
//! - `error`: 地理空间错误类型
//!
//! # 示例
//!
//! ```
//! use adc_geo::geometry::{Point2D, distance};
//!
//! let a = Point2D::new(0.0, 0.0);
//! let b = Point2D::new(3.0, 4.0);
//! assert!((distance(&a, &b, false) - 5.0).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod geometry;
pub mod projection;

// 重导出常用类型
pub use error::{GeoError, GeoResult};
pub use geometry::Point2D;
pub use projection::{BuiltinProjection, ProjectionEngine};
