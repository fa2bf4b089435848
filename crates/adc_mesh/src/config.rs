// crates/adc_mesh/src/config.rs
//! 网格处理配置
//!
//! 支持 YAML 文件与 JSON 字符串两种形式，缺省字段取默认值。
//!
//! ```yaml
//! search_depth: 40
//! hash_type: sha256
//! geodesic_distances: true
//! ```

use crate::error::{MeshError, MeshResult};
use crate::hash::HashType;
use crate::locator::{LocateTolerance, DEFAULT_SEARCH_DEPTH};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_search_depth() -> usize {
    DEFAULT_SEARCH_DEPTH
}

fn default_min_nodal_elevation() -> f64 {
    -200.0
}

fn default_min_crest_over_topography() -> f64 {
    0.2
}

/// 网格处理配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshConfig {
    /// 点定位时测试的最近单元数
    #[serde(default = "default_search_depth")]
    pub search_depth: usize,

    /// 内容哈希算法
    #[serde(default)]
    pub hash_type: HashType,

    /// 单元尺度是否按大圆距离计算
    #[serde(default)]
    pub geodesic_distances: bool,

    /// 几何判断容差
    #[serde(default)]
    pub tolerance: LocateTolerance,

    /// 网格检查：节点高程下限（高于地面为负）
    #[serde(default = "default_min_nodal_elevation")]
    pub min_nodal_elevation: f64,

    /// 网格检查：堰顶高出地形的最小值
    #[serde(default = "default_min_crest_over_topography")]
    pub min_crest_over_topography: f64,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            search_depth: default_search_depth(),
            hash_type: HashType::default(),
            geodesic_distances: false,
            tolerance: LocateTolerance::default(),
            min_nodal_elevation: default_min_nodal_elevation(),
            min_crest_over_topography: default_min_crest_over_topography(),
        }
    }
}

impl MeshConfig {
    /// 从YAML文件加载
    pub fn load(path: impl AsRef<Path>) -> MeshResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| MeshError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 保存到YAML文件
    pub fn save(&self, path: impl AsRef<Path>) -> MeshResult<()> {
        let content = serde_yaml::to_string(self).map_err(|e| MeshError::config(e.to_string()))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// 从JSON字符串解析
    pub fn from_json(json: &str) -> MeshResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| MeshError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 转换为JSON字符串
    pub fn to_json(&self) -> MeshResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| MeshError::config(e.to_string()))
    }

    /// 验证配置有效性
    pub fn validate(&self) -> MeshResult<()> {
        if self.search_depth == 0 {
            return Err(MeshError::config("search_depth 必须大于 0"));
        }
        let tol = &self.tolerance;
        if tol.boundary_tol < 0.0 || tol.inside_tol < 0.0 || tol.degenerate_tol < 0.0 {
            return Err(MeshError::config("tolerance 各项不能为负"));
        }
        if !self.min_nodal_elevation.is_finite() || !self.min_crest_over_topography.is_finite() {
            return Err(MeshError::config("网格检查阈值必须为有限值"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = MeshConfig::default();
        assert_eq!(c.search_depth, 20);
        assert_eq!(c.hash_type, HashType::Md5);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let c = MeshConfig::from_json(r#"{"search_depth": 40, "hash_type": "sha256"}"#).unwrap();
        assert_eq!(c.search_depth, 40);
        assert_eq!(c.hash_type, HashType::Sha256);
        assert_eq!(c.tolerance, LocateTolerance::STANDARD);
        assert!((c.min_nodal_elevation + 200.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid() {
        assert!(MeshConfig::from_json(r#"{"search_depth": 0}"#).is_err());
        assert!(MeshConfig::from_json(r#"{"hash_type": "crc"}"#).is_err());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mesh.yaml");
        let mut c = MeshConfig::default();
        c.geodesic_distances = true;
        c.tolerance = LocateTolerance::RELAXED;
        c.save(&path).unwrap();
        assert_eq!(MeshConfig::load(&path).unwrap(), c);
    }

    #[test]
    fn test_json_roundtrip() {
        let c = MeshConfig::default();
        let json = c.to_json().unwrap();
        assert_eq!(MeshConfig::from_json(&json).unwrap(), c);
    }
}
