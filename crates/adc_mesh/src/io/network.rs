// crates/adc_mesh/src/io/network.rs

//! 网格化网络（netCDF 方言）
//!
//! 维度 `node`、`nele`、`nvertex`，变量 `x`、`y`、`depth`（按 `node`）与
//! `element`（按 `nele × nvertex`，1 起始）。三角形在四顶点数组中的第 4 个槽位
//! 填 `_FillValue`。
//!
//! [`GriddedNetwork`] 是与文件无关的内存表示，总是可用；
//! 实际的 netCDF 文件读写需要启用 `netcdf` 特性。

use crate::config::MeshConfig;
use crate::element::Element;
use crate::error::{MeshError, MeshResult};
use crate::mesh::Mesh;
use crate::node::Node;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// netCDF 整型默认填充值
pub const DEFAULT_FILL_VALUE: i32 = -2_147_483_647;

/// 网格化网络数组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GriddedNetwork {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub depth: Vec<f64>,
    /// 单元连接，行优先展开，长度为 `nele * nvertex`
    pub element: Vec<i32>,
    pub nvertex: usize,
    pub fill_value: i32,
}

impl GriddedNetwork {
    /// 节点数
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.x.len()
    }

    /// 单元数
    #[inline]
    pub fn num_elements(&self) -> usize {
        if self.nvertex == 0 {
            0
        } else {
            self.element.len() / self.nvertex
        }
    }

    /// 检查数组尺寸
    pub fn validate(&self) -> MeshResult<()> {
        let n = self.x.len();
        if self.y.len() != n {
            return Err(MeshError::size_mismatch("y", n, self.y.len()));
        }
        if self.depth.len() != n {
            return Err(MeshError::size_mismatch("depth", n, self.depth.len()));
        }
        if self.nvertex < 3 {
            return Err(MeshError::unsupported_geometry(format!(
                "nvertex = {}",
                self.nvertex
            )));
        }
        if self.element.len() % self.nvertex != 0 {
            let expected = self.num_elements() * self.nvertex;
            return Err(MeshError::size_mismatch("element", expected, self.element.len()));
        }
        Ok(())
    }
}

impl Mesh {
    /// 由网格化网络数组构建
    ///
    /// 节点与单元按数组顺序编号（逻辑编号）。
    pub fn from_gridded_network(net: &GriddedNetwork, config: MeshConfig) -> MeshResult<Self> {
        net.validate()?;
        let n_nodes = net.num_nodes();

        let nodes: Vec<Node> = (0..n_nodes)
            .map(|i| Node::new(i + 1, net.x[i], net.y[i], net.depth[i]))
            .collect();

        let elements = net
            .element
            .chunks(net.nvertex)
            .enumerate()
            .map(|(e, row)| {
                let vertices = row
                    .iter()
                    .filter(|&&v| v != net.fill_value)
                    .map(|&v| {
                        usize::try_from(v)
                            .ok()
                            .filter(|&v| v >= 1 && v <= n_nodes)
                            .map(|v| v - 1)
                            .ok_or_else(|| MeshError::out_of_bounds("单元顶点", v.max(0) as usize, n_nodes))
                    })
                    .collect::<MeshResult<Vec<usize>>>()?;
                Element::new(e + 1, vertices)
            })
            .collect::<MeshResult<Vec<Element>>>()?;

        let mut mesh = Self::from_parts("", nodes, elements, Vec::new(), Vec::new())?;
        mesh.set_config(config);
        Ok(mesh)
    }

    /// 转换为网格化网络数组
    pub fn to_gridded_network(&self) -> MeshResult<GriddedNetwork> {
        let nvertex = self.max_nodes_per_element().max(3);
        let mut element = Vec::with_capacity(self.num_elements() * nvertex);
        for e in self.elements() {
            for &n in e.nodes() {
                let v = i32::try_from(n + 1)
                    .map_err(|_| MeshError::out_of_bounds("节点", n, i32::MAX as usize))?;
                element.push(v);
            }
            element.extend(std::iter::repeat(DEFAULT_FILL_VALUE).take(nvertex - e.n()));
        }
        Ok(GriddedNetwork {
            x: self.x(),
            y: self.y(),
            depth: self.z(),
            element,
            nvertex,
            fill_value: DEFAULT_FILL_VALUE,
        })
    }
}

// ============================================================
// 文件读写
// ============================================================

#[cfg(feature = "netcdf")]
pub(crate) fn read_file(path: &Path, config: MeshConfig) -> MeshResult<Mesh> {
    let source = path.display().to_string();
    let err = |message: String| MeshError::format("netcdf", source.clone(), 0, message);

    let file = netcdf::open(path).map_err(|e| err(e.to_string()))?;

    let dim = |name: &str| {
        file.dimension(name)
            .map(|d| d.len())
            .ok_or_else(|| err(format!("缺少维度 {name}")))
    };
    let n_nodes = dim("node")?;
    let n_elements = dim("nele")?;
    let nvertex = dim("nvertex")?;

    let var = |name: &str| {
        file.variable(name)
            .ok_or_else(|| err(format!("缺少变量 {name}")))
    };
    let read_f64 = |name: &str| -> MeshResult<Vec<f64>> {
        var(name)?
            .values::<f64, _>(..)
            .map_err(|e| err(format!("读取 {name} 失败: {e}")))
    };

    let x = read_f64("x")?;
    let y = read_f64("y")?;
    let depth = read_f64("depth")?;

    let element_var = var("element")?;
    let element = element_var
        .values::<i32, _>(..)
        .map_err(|e| err(format!("读取 element 失败: {e}")))?;
    let fill_value = element_var
        .attribute("_FillValue")
        .and_then(|a| a.value().ok())
        .and_then(|v| match v {
            netcdf::AttrValue::Int(i) => Some(i),
            _ => None,
        })
        .unwrap_or(DEFAULT_FILL_VALUE);

    if x.len() != n_nodes {
        return Err(MeshError::size_mismatch("x", n_nodes, x.len()));
    }
    if element.len() != n_elements * nvertex {
        return Err(MeshError::size_mismatch("element", n_elements * nvertex, element.len()));
    }

    let net = GriddedNetwork {
        x,
        y,
        depth,
        element,
        nvertex,
        fill_value,
    };
    Mesh::from_gridded_network(&net, config)
}

#[cfg(feature = "netcdf")]
pub(crate) fn write_file(mesh: &Mesh, path: &Path) -> MeshResult<()> {
    let source = path.display().to_string();
    let err = |e: netcdf::error::Error| MeshError::format("netcdf", source.clone(), 0, e.to_string());

    let net = mesh.to_gridded_network()?;
    let mut file = netcdf::create(path).map_err(err)?;
    file.add_dimension("node", net.num_nodes()).map_err(err)?;
    file.add_dimension("nele", net.num_elements()).map_err(err)?;
    file.add_dimension("nvertex", net.nvertex).map_err(err)?;

    for (name, values) in [("x", &net.x), ("y", &net.y), ("depth", &net.depth)] {
        let mut var = file.add_variable::<f64>(name, &["node"]).map_err(err)?;
        var.put_values(values, ..).map_err(err)?;
    }

    let mut var = file
        .add_variable::<i32>("element", &["nele", "nvertex"])
        .map_err(err)?;
    var.set_fill_value(net.fill_value).map_err(err)?;
    var.put_values(&net.element, ..).map_err(err)?;
    Ok(())
}

#[cfg(not(feature = "netcdf"))]
pub(crate) fn read_file(path: &Path, _config: MeshConfig) -> MeshResult<Mesh> {
    Err(MeshError::format(
        "netcdf",
        path.display().to_string(),
        0,
        "未启用 netcdf 特性",
    ))
}

#[cfg(not(feature = "netcdf"))]
pub(crate) fn write_file(_mesh: &Mesh, path: &Path) -> MeshResult<()> {
    Err(MeshError::format(
        "netcdf",
        path.display().to_string(),
        0,
        "未启用 netcdf 特性",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed() -> GriddedNetwork {
        GriddedNetwork {
            x: vec![0.0, 1.0, 1.0, 0.0, 2.0],
            y: vec![0.0, 0.0, 1.0, 1.0, 0.5],
            depth: vec![1.0, 2.0, 3.0, 4.0, 5.0],
            element: vec![1, 2, 3, 4, 2, 5, 3, DEFAULT_FILL_VALUE],
            nvertex: 4,
            fill_value: DEFAULT_FILL_VALUE,
        }
    }

    #[test]
    fn test_to_mesh() {
        let mesh = Mesh::from_gridded_network(&mixed(), MeshConfig::default()).unwrap();
        assert_eq!(mesh.num_nodes(), 5);
        assert_eq!(mesh.num_elements(), 2);
        assert_eq!(mesh.element(0).unwrap().nodes(), &[0, 1, 2, 3]);
        assert_eq!(mesh.element(1).unwrap().nodes(), &[1, 4, 2]);
        assert_eq!(mesh.node_by_id(5).unwrap().z, 5.0);
    }

    #[test]
    fn test_back_to_network() {
        let net = mixed();
        let mesh = Mesh::from_gridded_network(&net, MeshConfig::default()).unwrap();
        assert_eq!(mesh.to_gridded_network().unwrap(), net);
    }

    #[test]
    fn test_invalid_arrays() {
        let mut net = mixed();
        net.depth.pop();
        assert!(matches!(
            Mesh::from_gridded_network(&net, MeshConfig::default()),
            Err(MeshError::SizeMismatch { .. })
        ));

        let mut net = mixed();
        net.element[1] = 9;
        assert!(matches!(
            Mesh::from_gridded_network(&net, MeshConfig::default()),
            Err(MeshError::OutOfBounds { .. })
        ));

        let mut net = mixed();
        net.element.pop();
        assert!(net.validate().is_err());
    }
}
