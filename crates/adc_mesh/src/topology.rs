// crates/adc_mesh/src/topology.rs

//! 网格连接表
//!
//! - [`ElementTable`]: 节点 -> 相邻单元（CSR 存储）
//! - [`FaceTable`]: 边 -> 所属单元，以及单元之间的相邻关系
//!
//! 两者都是构建时网格的快照，增删节点或单元后需要重新构建。

use crate::element::Element;
use crate::error::{MeshError, MeshResult};
use serde::{Deserialize, Serialize};

// ============================================================
// CSR 存储
// ============================================================

/// 压缩稀疏行存储
///
/// `offsets[i]..offsets[i+1]` 是第 i 行在 `indices` 中的范围。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Csr {
    offsets: Vec<usize>,
    indices: Vec<usize>,
}

impl Csr {
    /// 由每行的条目计数和 (行, 值) 对构建，值在行内保持输入顺序
    fn from_pairs(n_rows: usize, pairs: &[(usize, usize)]) -> Self {
        let mut offsets = vec![0usize; n_rows + 1];
        for &(row, _) in pairs {
            offsets[row + 1] += 1;
        }
        for i in 0..n_rows {
            offsets[i + 1] += offsets[i];
        }

        let mut cursor = offsets.clone();
        let mut indices = vec![0usize; pairs.len()];
        for &(row, value) in pairs {
            indices[cursor[row]] = value;
            cursor[row] += 1;
        }
        Self { offsets, indices }
    }

    /// 行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// 第 row 行
    #[inline]
    pub fn row(&self, row: usize) -> Option<&[usize]> {
        if row >= self.n_rows() {
            return None;
        }
        Some(&self.indices[self.offsets[row]..self.offsets[row + 1]])
    }
}

// ============================================================
// ElementTable
// ============================================================

/// 节点 -> 相邻单元表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementTable {
    csr: Csr,
}

impl ElementTable {
    /// 遍历一次全部单元构建
    ///
    /// 每个节点的单元按单元下标递增排列。
    ///
    /// # Errors
    /// 单元引用的节点下标不小于 `n_nodes` 时返回 [`MeshError::OutOfBounds`]。
    pub fn build(n_nodes: usize, elements: &[Element]) -> MeshResult<Self> {
        let mut pairs = Vec::with_capacity(elements.len() * 4);
        for (e, element) in elements.iter().enumerate() {
            for &n in element.nodes() {
                if n >= n_nodes {
                    return Err(MeshError::out_of_bounds("节点", n, n_nodes));
                }
                pairs.push((n, e));
            }
        }
        log::debug!("构建节点-单元表: {} 节点, {} 单元", n_nodes, elements.len());
        Ok(Self {
            csr: Csr::from_pairs(n_nodes, &pairs),
        })
    }

    /// 构建时的节点数
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.csr.n_rows()
    }

    /// 节点周围的单元
    ///
    /// # Errors
    /// 构建时不存在该节点返回 [`MeshError::NotFound`]。
    pub fn element_list(&self, node: usize) -> MeshResult<&[usize]> {
        self.csr
            .row(node)
            .ok_or_else(|| MeshError::not_found("节点-单元表中的节点", node))
    }

    /// 节点周围的单元数
    pub fn num_elements_around_node(&self, node: usize) -> MeshResult<usize> {
        Ok(self.element_list(node)?.len())
    }

    /// 节点周围的第 i 个单元
    pub fn element_table(&self, node: usize, i: usize) -> MeshResult<usize> {
        let list = self.element_list(node)?;
        list.get(i)
            .copied()
            .ok_or_else(|| MeshError::out_of_bounds("节点周围单元", i, list.len()))
    }
}

// ============================================================
// FaceTable
// ============================================================

/// 网格边
///
/// `node1 < node2`；`element2` 为 `None` 表示网格边界边。
/// 被两个以上单元共享时只记录前两个单元，`count` 保留实际单元数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Face {
    pub node1: usize,
    pub node2: usize,
    pub element1: usize,
    pub element2: Option<usize>,
    pub count: usize,
}

impl Face {
    /// 是否为边界边
    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.element2.is_none()
    }

    /// 边的重数（所属单元数）
    #[inline]
    pub fn multiplicity(&self) -> usize {
        self.count
    }
}

/// 边表与单元相邻表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceTable {
    /// 按 (node1, node2) 排序
    faces: Vec<Face>,
    neighbors: Csr,
    /// 被两个以上单元共享的边 (node1, node2, 单元数)
    overlapping: Vec<(usize, usize, usize)>,
}

impl FaceTable {
    /// 构建边表
    ///
    /// 把每个单元的顶点环分解为 (小下标, 大下标, 单元) 三元组，
    /// 全局排序后扫描相邻重复项：出现一次为边界边，两次为共享边。
    pub fn build(elements: &[Element]) -> Self {
        let mut triples: Vec<(usize, usize, usize)> = elements
            .iter()
            .enumerate()
            .flat_map(|(e, element)| {
                element
                    .faces()
                    .into_iter()
                    .map(move |(a, b)| (a.min(b), a.max(b), e))
            })
            .collect();
        triples.sort_unstable();

        let mut faces = Vec::new();
        let mut overlapping = Vec::new();
        let mut adjacency = Vec::new();

        for group in triples.chunk_by(|p, q| p.0 == q.0 && p.1 == q.1) {
            let (n1, n2, e1) = group[0];
            let element2 = group.get(1).map(|t| t.2);
            if let Some(e2) = element2 {
                adjacency.push((e1, e2));
                adjacency.push((e2, e1));
            }
            if group.len() > 2 {
                overlapping.push((n1, n2, group.len()));
            }
            faces.push(Face {
                node1: n1,
                node2: n2,
                element1: e1,
                element2,
                count: group.len(),
            });
        }
        adjacency.sort_unstable();
        adjacency.dedup();

        log::debug!(
            "构建边表: {} 条边, {} 条重叠边",
            faces.len(),
            overlapping.len()
        );
        Self {
            faces,
            neighbors: Csr::from_pairs(elements.len(), &adjacency),
            overlapping,
        }
    }

    /// 全部边
    #[inline]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// 边界边
    pub fn boundary_faces(&self) -> impl Iterator<Item = &Face> {
        self.faces.iter().filter(|f| f.is_boundary())
    }

    /// 共享边
    pub fn interior_faces(&self) -> impl Iterator<Item = &Face> {
        self.faces.iter().filter(|f| !f.is_boundary())
    }

    /// 被两个以上单元共享的边
    #[inline]
    pub fn overlapping_edges(&self) -> &[(usize, usize, usize)] {
        &self.overlapping
    }

    /// 查找两节点间的边（节点顺序无关）
    pub fn face(&self, a: usize, b: usize) -> Option<&Face> {
        let key = (a.min(b), a.max(b));
        self.faces
            .binary_search_by(|f| (f.node1, f.node2).cmp(&key))
            .ok()
            .map(|i| &self.faces[i])
    }

    /// 单元的相邻单元
    pub fn neighbors(&self, element: usize) -> MeshResult<&[usize]> {
        self.neighbors
            .row(element)
            .ok_or_else(|| MeshError::out_of_bounds("单元", element, self.neighbors.n_rows()))
    }

    /// 两单元是否共享一条边
    pub fn are_neighbors(&self, a: usize, b: usize) -> bool {
        self.neighbors
            .row(a)
            .map_or(false, |row| row.binary_search(&b).is_ok())
    }

    /// 网格边界节点：所有边界边的端点，升序去重
    pub fn boundary_nodes(&self) -> Vec<usize> {
        let mut nodes: Vec<usize> = self
            .boundary_faces()
            .flat_map(|f| [f.node1, f.node2])
            .collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }
}
