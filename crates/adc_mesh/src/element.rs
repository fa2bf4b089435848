// crates/adc_mesh/src/element.rs
//! 网格单元
//!
//! 单元只保存节点在网格节点数组中的下标（不持有节点）。
//! 几何量都以节点切片为参数计算，下标失效时返回 `OutOfBounds`。

use crate::error::{MeshError, MeshResult};
use crate::hash::{HashType, Hasher};
use crate::locator::{self, LocateTolerance};
use crate::node::Node;
use adc_geo::geometry::distance;
use adc_geo::Point2D;
use serde::{Deserialize, Serialize};

/// 网格单元（三角形或四边形）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// 外部标识
    pub id: usize,
    nodes: Vec<usize>,
}

impl Element {
    /// 创建单元
    ///
    /// # Errors
    /// 顶点数不为 3 或 4 时返回 [`MeshError::UnsupportedGeometry`]。
    pub fn new(id: usize, nodes: Vec<usize>) -> MeshResult<Self> {
        check_vertex_count(id, nodes.len())?;
        Ok(Self { id, nodes })
    }

    /// 三角形
    pub fn triangle(id: usize, n1: usize, n2: usize, n3: usize) -> Self {
        Self {
            id,
            nodes: vec![n1, n2, n3],
        }
    }

    /// 四边形
    pub fn quad(id: usize, n1: usize, n2: usize, n3: usize, n4: usize) -> Self {
        Self {
            id,
            nodes: vec![n1, n2, n3, n4],
        }
    }

    /// 顶点数
    #[inline]
    pub fn n(&self) -> usize {
        self.nodes.len()
    }

    /// 顶点节点下标
    #[inline]
    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    /// 第 i 个顶点的节点下标
    pub fn node(&self, i: usize) -> MeshResult<usize> {
        self.nodes
            .get(i)
            .copied()
            .ok_or_else(|| MeshError::out_of_bounds("单元顶点", i, self.nodes.len()))
    }

    /// 替换第 i 个顶点
    pub fn set_node(&mut self, i: usize, node: usize) -> MeshResult<()> {
        let len = self.nodes.len();
        let slot = self
            .nodes
            .get_mut(i)
            .ok_or_else(|| MeshError::out_of_bounds("单元顶点", i, len))?;
        *slot = node;
        Ok(())
    }

    /// 替换全部顶点
    pub fn set_nodes(&mut self, nodes: Vec<usize>) -> MeshResult<()> {
        check_vertex_count(self.id, nodes.len())?;
        self.nodes = nodes;
        Ok(())
    }

    /// 是否含有某节点
    pub fn contains_node(&self, node: usize) -> bool {
        self.nodes.contains(&node)
    }

    /// 单元各边（首尾闭合），按顶点顺序
    pub fn faces(&self) -> Vec<(usize, usize)> {
        let n = self.nodes.len();
        (0..n)
            .map(|i| (self.nodes[i], self.nodes[(i + 1) % n]))
            .collect()
    }

    /// 第 i 条边
    pub fn leg(&self, i: usize) -> MeshResult<(usize, usize)> {
        let n = self.nodes.len();
        if i >= n {
            return Err(MeshError::out_of_bounds("单元边", i, n));
        }
        Ok((self.nodes[i], self.nodes[(i + 1) % n]))
    }

    // ============================================================
    // 几何
    // ============================================================

    /// 顶点坐标
    pub fn vertices(&self, nodes: &[Node]) -> MeshResult<Vec<Point2D>> {
        self.nodes
            .iter()
            .map(|&i| {
                nodes
                    .get(i)
                    .map(Node::position)
                    .ok_or_else(|| MeshError::out_of_bounds("节点", i, nodes.len()))
            })
            .collect()
    }

    /// 中心（顶点坐标均值）
    pub fn centroid(&self, nodes: &[Node]) -> MeshResult<Point2D> {
        Ok(locator::coordinate_mean(&self.vertices(nodes)?))
    }

    /// 面积
    ///
    /// 鞋带公式，按绕中心排序后的顶点环计算，与顶点存储顺序无关。
    pub fn area(&self, nodes: &[Node]) -> MeshResult<f64> {
        let pts = self.vertices(nodes)?;
        let center = locator::coordinate_mean(&pts);
        let order = locator::sort_about_center(&pts, center, false);
        let n = order.len();
        let twice: f64 = (0..n)
            .map(|k| {
                let a = &pts[order[k]];
                let b = &pts[order[(k + 1) % n]];
                a.x * b.y - b.x * a.y
            })
            .sum();
        Ok(twice.abs() * 0.5)
    }

    /// 单元尺度：各边长的平均值
    pub fn element_size(&self, nodes: &[Node], geodesic: bool) -> MeshResult<f64> {
        let pts = self.vertices(nodes)?;
        let n = pts.len();
        let total: f64 = (0..n)
            .map(|i| distance(&pts[i], &pts[(i + 1) % n], geodesic))
            .sum();
        Ok(total / n as f64)
    }

    /// 点是否在单元内（含边界）
    pub fn contains(&self, nodes: &[Node], x: f64, y: f64, tol: &LocateTolerance) -> MeshResult<bool> {
        let pts = self.vertices(nodes)?;
        let ring = if pts.len() > 3 {
            let center = locator::coordinate_mean(&pts);
            locator::sort_about_center(&pts, center, false)
                .into_iter()
                .map(|i| pts[i])
                .collect()
        } else {
            pts
        };
        Ok(locator::point_in_polygon(&ring, x, y, tol.boundary_tol))
    }

    /// 插值权重，与顶点存储顺序一一对应
    ///
    /// # Errors
    /// 退化三角形返回 [`MeshError::UnsupportedGeometry`]。
    pub fn interpolation_weights(
        &self,
        nodes: &[Node],
        x: f64,
        y: f64,
        tol: &LocateTolerance,
    ) -> MeshResult<Vec<f64>> {
        let pts = self.vertices(nodes)?;
        match pts.as_slice() {
            [a, b, c] => Ok(locator::triangle_weights([*a, *b, *c], x, y, tol)?.to_vec()),
            _ => locator::polygon_weights(&pts, x, y, tol),
        }
    }

    /// 按绕中心的极角重排顶点
    pub fn sort_vertices_about_center(&mut self, nodes: &[Node], clockwise: bool) -> MeshResult<()> {
        let pts = self.vertices(nodes)?;
        let center = locator::coordinate_mean(&pts);
        let order = locator::sort_about_center(&pts, center, clockwise);
        self.nodes = order.into_iter().map(|i| self.nodes[i]).collect();
        Ok(())
    }

    // ============================================================
    // 哈希与输出
    // ============================================================

    /// 单元哈希：各顶点位置哈希的顺序摘要
    ///
    /// 与绕向有关，不含高程。
    pub fn hash(&self, nodes: &[Node], hash_type: HashType) -> MeshResult<String> {
        let mut h = Hasher::new(hash_type);
        for &i in &self.nodes {
            let node = nodes
                .get(i)
                .ok_or_else(|| MeshError::out_of_bounds("节点", i, nodes.len()))?;
            h.update(node.position_hash(hash_type));
        }
        Ok(h.finalize())
    }

    fn node_ids(&self, nodes: &[Node]) -> MeshResult<Vec<usize>> {
        self.nodes
            .iter()
            .map(|&i| {
                nodes
                    .get(i)
                    .map(|n| n.id)
                    .ok_or_else(|| MeshError::out_of_bounds("节点", i, nodes.len()))
            })
            .collect()
    }

    /// ADCIRC 单元行，顶点写节点标识
    pub fn to_adcirc_line(&self, nodes: &[Node]) -> MeshResult<String> {
        let mut line = format!("{:11} {:3}", self.id, self.n());
        for id in self.node_ids(nodes)? {
            line.push_str(&format!(" {id:11}"));
        }
        Ok(line)
    }

    /// 2dm `E3T`/`E4Q` 行
    pub fn to_2dm_line(&self, nodes: &[Node]) -> MeshResult<String> {
        let ids = self.node_ids(nodes)?;
        let line = match ids.as_slice() {
            [a, b, c] => format!("E3T {} {} {} {} 1", self.id, a, b, c),
            [a, b, c, d] => format!("E4Q {} {} {} {} {} 1", self.id, a, b, c, d),
            _ => {
                return Err(MeshError::unsupported_geometry(format!(
                    "单元 {} 顶点数 {}",
                    self.id,
                    ids.len()
                )))
            }
        };
        Ok(line)
    }
}

fn check_vertex_count(id: usize, n: usize) -> MeshResult<()> {
    if n == 3 || n == 4 {
        Ok(())
    } else {
        Err(MeshError::unsupported_geometry(format!(
            "单元 {id} 顶点数 {n}，只支持 3 或 4"
        )))
    }
}
