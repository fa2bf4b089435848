// crates/adc_mesh/src/error.rs
//! 网格处理错误类型
//!
//! 访问器在校验失败时立即返回错误，不返回哨兵值。
//! 解析失败会中止整个读取过程，调用方不会得到部分网格。

use adc_geo::GeoError;
use thiserror::Error;

/// 网格模块结果类型
pub type MeshResult<T> = Result<T, MeshError>;

/// 网格错误枚举
#[derive(Error, Debug)]
pub enum MeshError {
    /// 索引或标识超出当前存储范围
    #[error("索引越界: {what} 索引 {index}, 长度 {len}")]
    OutOfBounds {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// 查找结构中不存在该标识、点或实体
    #[error("未找到: {what} {key}")]
    NotFound { what: &'static str, key: String },

    /// 边界类型不定义该字段
    #[error("无效属性: 边界类型 {code} 不包含字段 {attribute}")]
    InvalidAttribute { attribute: &'static str, code: i32 },

    /// 输入行或字段格式错误
    #[error("网格格式错误: {format}, {file}, 行 {line}: {message}")]
    FormatError {
        format: &'static str,
        file: String,
        line: usize,
        message: String,
    },

    /// 输入数组长度不一致
    #[error("尺寸不匹配: {name} 期望 {expected}, 实际 {actual}")]
    SizeMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    /// 不支持的几何（顶点数不为 3/4 或退化单元）
    #[error("不支持的几何: {message}")]
    UnsupportedGeometry { message: String },

    /// 配置错误
    #[error("配置错误: {message}")]
    Config { message: String },

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 投影错误
    #[error(transparent)]
    Geo(#[from] GeoError),
}

impl MeshError {
    /// 索引越界
    pub fn out_of_bounds(what: &'static str, index: usize, len: usize) -> Self {
        Self::OutOfBounds { what, index, len }
    }

    /// 未找到
    pub fn not_found(what: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            what,
            key: key.to_string(),
        }
    }

    /// 无效属性
    pub fn invalid_attribute(attribute: &'static str, code: i32) -> Self {
        Self::InvalidAttribute { attribute, code }
    }

    /// 格式错误
    pub fn format(
        format: &'static str,
        file: impl Into<String>,
        line: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::FormatError {
            format,
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    /// 尺寸不匹配
    pub fn size_mismatch(name: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name,
            expected,
            actual,
        }
    }

    /// 不支持的几何
    pub fn unsupported_geometry(message: impl Into<String>) -> Self {
        Self::UnsupportedGeometry {
            message: message.into(),
        }
    }

    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 是否为未找到错误
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
