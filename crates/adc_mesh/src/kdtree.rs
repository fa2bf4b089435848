// crates/adc_mesh/src/kdtree.rs

//! 二维最近邻索引
//!
//! 基于 R-Tree 的点索引，用于节点坐标或单元中心的最近邻与 k 近邻查询。
//!
//! 索引是构建时坐标的快照：之后修改节点坐标或增删节点/单元不会
//! 自动更新索引，必须显式 `invalidate` 后重建。[`SearchTree`]
//! 把“是否已构建”变成类型上可见的状态。

use crate::error::{MeshError, MeshResult};
use adc_geo::Point2D;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// 带下标的索引点
#[derive(Debug, Clone, Copy, PartialEq)]
struct IndexedPoint {
    index: usize,
    point: [f64; 2],
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// 最近邻索引
#[derive(Debug, Clone, Default)]
pub struct Kdtree {
    tree: RTree<IndexedPoint>,
    initialized: bool,
}

impl Kdtree {
    /// 从坐标数组构建
    ///
    /// # Errors
    /// `xs` 与 `ys` 长度不同时返回 [`MeshError::SizeMismatch`]。
    pub fn build(xs: &[f64], ys: &[f64]) -> MeshResult<Self> {
        if xs.len() != ys.len() {
            return Err(MeshError::size_mismatch("ys", xs.len(), ys.len()));
        }
        let items = xs
            .iter()
            .zip(ys)
            .enumerate()
            .map(|(index, (&x, &y))| IndexedPoint { index, point: [x, y] })
            .collect();
        Ok(Self::from_items(items))
    }

    /// 从点列表构建
    pub fn from_points(points: &[Point2D]) -> Self {
        let items = points
            .iter()
            .enumerate()
            .map(|(index, p)| IndexedPoint {
                index,
                point: p.to_array(),
            })
            .collect();
        Self::from_items(items)
    }

    fn from_items(items: Vec<IndexedPoint>) -> Self {
        log::debug!("构建 KD 树: {} 个点", items.len());
        Self {
            tree: RTree::bulk_load(items),
            initialized: true,
        }
    }

    /// 是否已构建
    #[inline]
    pub fn initialized(&self) -> bool {
        self.initialized
    }

    /// 点数
    #[inline]
    pub fn size(&self) -> usize {
        self.tree.size()
    }

    /// 最近点下标
    ///
    /// # Errors
    /// 索引为空时返回 [`MeshError::NotFound`]。
    pub fn find_nearest(&self, x: f64, y: f64) -> MeshResult<usize> {
        self.tree
            .nearest_neighbor(&[x, y])
            .map(|p| p.index)
            .ok_or_else(|| MeshError::not_found("最近点", format!("({x}, {y})")))
    }

    /// 最近的 k 个点，按距离递增
    ///
    /// 返回 `min(k, size)` 个下标。
    pub fn find_x_nearest(&self, x: f64, y: f64, k: usize) -> Vec<usize> {
        self.tree
            .nearest_neighbor_iter(&[x, y])
            .take(k)
            .map(|p| p.index)
            .collect()
    }

    /// 半径内的所有点，按距离递增
    pub fn find_within_radius(&self, x: f64, y: f64, radius: f64) -> Vec<usize> {
        let r2 = radius * radius;
        self.tree
            .nearest_neighbor_iter_with_distance_2(&[x, y])
            .take_while(|(_, d2)| *d2 <= r2)
            .map(|(p, _)| p.index)
            .collect()
    }
}

// ============================================================
// 状态包装
// ============================================================

/// 可失效的索引槽
///
/// 网格持有两个独立的槽：节点索引与单元中心索引。
#[derive(Debug, Clone, Default)]
pub struct SearchTree {
    tree: Option<Kdtree>,
}

impl SearchTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已构建的索引
    #[inline]
    pub fn built(&self) -> Option<&Kdtree> {
        self.tree.as_ref()
    }

    /// 是否已构建
    #[inline]
    pub fn is_built(&self) -> bool {
        self.tree.is_some()
    }

    /// 丢弃索引
    pub fn invalidate(&mut self) {
        self.tree = None;
    }

    /// 从点快照重建
    pub fn rebuild(&mut self, points: &[Point2D]) -> &Kdtree {
        self.tree.insert(Kdtree::from_points(points))
    }

    /// 已构建则直接返回，否则先构建
    pub fn get_or_build(&mut self, points: impl FnOnce() -> Vec<Point2D>) -> &Kdtree {
        self.tree
            .get_or_insert_with(|| Kdtree::from_points(&points()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Kdtree {
        let xs = [0.0, 1.0, 2.0, 0.0, 1.0, 2.0];
        let ys = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        Kdtree::build(&xs, &ys).unwrap()
    }

    #[test]
    fn test_build_size_mismatch() {
        let err = Kdtree::build(&[0.0, 1.0], &[0.0]).unwrap_err();
        assert!(matches!(err, MeshError::SizeMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn test_find_nearest() {
        let tree = grid();
        assert!(tree.initialized());
        assert_eq!(tree.size(), 6);
        assert_eq!(tree.find_nearest(1.9, 0.9).unwrap(), 5);
        assert_eq!(tree.find_nearest(-5.0, -5.0).unwrap(), 0);
    }

    #[test]
    fn test_find_nearest_empty() {
        let tree = Kdtree::default();
        assert!(!tree.initialized());
        assert!(tree.find_nearest(0.0, 0.0).unwrap_err().is_not_found());
    }

    #[test]
    fn test_find_x_nearest_ordered() {
        let tree = grid();
        let near = tree.find_x_nearest(0.1, 0.2, 3);
        assert_eq!(near, vec![0, 3, 1]);
        assert_eq!(tree.find_x_nearest(0.0, 0.0, 100).len(), 6);
    }

    #[test]
    fn test_find_within_radius() {
        let tree = grid();
        let found = tree.find_within_radius(0.0, 0.0, 1.01);
        assert_eq!(found[0], 0);
        let mut rest = found[1..].to_vec();
        rest.sort_unstable();
        assert_eq!(rest, vec![1, 3]);
    }

    #[test]
    fn test_search_tree_state() {
        let mut slot = SearchTree::new();
        assert!(!slot.is_built());
        slot.rebuild(&[Point2D::new(0.0, 0.0)]);
        assert!(slot.is_built());
        assert_eq!(slot.built().unwrap().size(), 1);
        slot.invalidate();
        assert!(slot.built().is_none());

        let tree = slot.get_or_build(|| vec![Point2D::new(1.0, 1.0), Point2D::new(2.0, 2.0)]);
        assert_eq!(tree.size(), 2);
    }
}
