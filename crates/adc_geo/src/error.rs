// crates/adc_geo/src/error.rs
//! 地理空间处理错误类型
//!
//! 投影引擎与坐标转换返回的错误。

use thiserror::Error;

/// Geo 模块结果类型
pub type GeoResult<T> = Result<T, GeoError>;

/// 地理空间处理错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeoError {
    /// 投影引擎不支持的 EPSG 转换
    #[error("不支持的投影: EPSG:{src} -> EPSG:{dst}")]
    NoSuchProjection {
        /// 源坐标系
        src: u32,
        /// 目标坐标系
        dst: u32,
    },

    /// 投影引擎内部错误
    #[error("投影引擎内部错误: {message}")]
    Internal {
        /// 错误描述
        message: String,
    },

    /// 输入数组长度不一致
    #[error("数组长度不匹配: {name} 期望 {expected}, 实际 {actual}")]
    SizeMismatch {
        /// 数组名称
        name: &'static str,
        /// 期望长度
        expected: usize,
        /// 实际长度
        actual: usize,
    },
}

impl GeoError {
    /// 不支持的投影
    pub fn no_such_projection(src: u32, dst: u32) -> Self {
        Self::NoSuchProjection { src, dst }
    }

    /// 内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// 长度不匹配
    pub fn size_mismatch(name: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name,
            expected,
            actual,
        }
    }
}
