// crates/adc_mesh/src/locator.rs

//! 点定位与插值
//!
//! - 三角形：闭式重心坐标
//! - 四边形：绕坐标均值中心扇形剖分为子三角形，
//!   在包含查询点的子三角形上插值，再把中心点权重平均分给所有顶点
//! - 单元查找：在单元中心 KD 树上取 k 个最近候选，按距离依次做包含测试
//!
//! k 个最近候选只是近似搜索：对强凹或尺度极不均匀的网格，
//! 包含查询点的单元可能不在候选集中，此时需要调大搜索深度。

use crate::element::Element;
use crate::error::{MeshError, MeshResult};
use crate::kdtree::Kdtree;
use crate::node::Node;
use adc_geo::Point2D;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// 默认搜索深度
pub const DEFAULT_SEARCH_DEPTH: usize = 20;

// ============================================================
// 容差配置
// ============================================================

/// 定位容差配置
///
/// 控制各种几何判断的容差阈值，用于处理浮点精度问题。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocateTolerance {
    /// 边界判断容差
    ///
    /// 点到单元边的距离小于此值时认为点在边上（算作包含）。
    /// 默认值: 1e-8
    pub boundary_tol: f64,

    /// 内部点判断容差
    ///
    /// 重心坐标大于 -inside_tol 时认为点在子三角形内。
    /// 默认值: 1e-10
    pub inside_tol: f64,

    /// 退化单元判断容差
    ///
    /// 三角形两倍有向面积的绝对值小于此值时认为退化。
    /// 默认值: 1e-12
    pub degenerate_tol: f64,
}

impl Default for LocateTolerance {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl LocateTolerance {
    /// 高精度容差
    pub const HIGH_PRECISION: Self = Self {
        boundary_tol: 1e-12,
        inside_tol: 1e-14,
        degenerate_tol: 1e-15,
    };

    /// 标准容差（默认设置）
    pub const STANDARD: Self = Self {
        boundary_tol: 1e-8,
        inside_tol: 1e-10,
        degenerate_tol: 1e-12,
    };

    /// 宽松容差
    pub const RELAXED: Self = Self {
        boundary_tol: 1e-6,
        inside_tol: 1e-8,
        degenerate_tol: 1e-10,
    };
}

// ============================================================
// 包含测试
// ============================================================

/// 点到线段的距离
fn distance_to_segment(x: f64, y: f64, a: &Point2D, b: &Point2D) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return (x - a.x).hypot(y - a.y);
    }
    let t = (((x - a.x) * dx + (y - a.y) * dy) / len2).clamp(0.0, 1.0);
    (x - (a.x + t * dx)).hypot(y - (a.y + t * dy))
}

/// 点是否在多边形内（含边界）
///
/// 先检查点是否落在某条边上，再用射线法判断内部：
/// 从待测点向右发射水平射线，奇数个交点为内部。
pub fn point_in_polygon(vertices: &[Point2D], x: f64, y: f64, boundary_tol: f64) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }

    let mut j = n - 1;
    for i in 0..n {
        if distance_to_segment(x, y, &vertices[j], &vertices[i]) <= boundary_tol {
            return true;
        }
        j = i;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let vi = &vertices[i];
        let vj = &vertices[j];
        if ((vi.y > y) != (vj.y > y)) && (x < (vj.x - vi.x) * (y - vi.y) / (vj.y - vi.y) + vi.x) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

// ============================================================
// 插值权重
// ============================================================

/// 三角形重心坐标
///
/// 在三个顶点处分别精确等于 `(1,0,0)`、`(0,1,0)`、`(0,0,1)`，
/// 任意点上三者之和为 1。
///
/// # Errors
/// 两倍有向面积小于 `degenerate_tol` 时返回 [`MeshError::UnsupportedGeometry`]。
pub fn triangle_weights(
    p: [Point2D; 3],
    x: f64,
    y: f64,
    tol: &LocateTolerance,
) -> MeshResult<[f64; 3]> {
    let [a, b, c] = p;
    let denom = (b.y - c.y) * (a.x - c.x) + (c.x - b.x) * (a.y - c.y);
    if !(denom.abs() > tol.degenerate_tol) {
        return Err(MeshError::unsupported_geometry(format!(
            "退化三角形: ({}, {}), ({}, {}), ({}, {})",
            a.x, a.y, b.x, b.y, c.x, c.y
        )));
    }

    let w0 = ((b.y - c.y) * (x - c.x) + (c.x - b.x) * (y - c.y)) / denom;
    let w1 = ((c.y - a.y) * (x - c.x) + (a.x - c.x) * (y - c.y)) / denom;
    let w2 = 1.0 - w0 - w1;
    Ok([w0, w1, w2])
}

/// 顶点绕中心的排序
///
/// 返回原顶点下标的新顺序。按极角排序（`clockwise` 决定方向），
/// 极角相同时离中心近的在前，保证扇形剖分不自交。
pub fn sort_about_center(points: &[Point2D], center: Point2D, clockwise: bool) -> Vec<usize> {
    let key = |i: usize| {
        let p = &points[i];
        let angle = (p.y - center.y).atan2(p.x - center.x);
        let d2 = p.distance_squared_to(&center);
        (angle, d2)
    };

    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&i, &j| {
        let (ai, di) = key(i);
        let (aj, dj) = key(j);
        let by_angle = if clockwise {
            aj.partial_cmp(&ai)
        } else {
            ai.partial_cmp(&aj)
        };
        by_angle
            .unwrap_or(Ordering::Equal)
            .then(di.partial_cmp(&dj).unwrap_or(Ordering::Equal))
    });
    order
}

/// 坐标均值中心
pub fn coordinate_mean(points: &[Point2D]) -> Point2D {
    let n = points.len().max(1) as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point2D::new(sx / n, sy / n)
}

/// 多边形插值权重
///
/// 权重按输入顶点顺序返回。在各扇形子三角形中选择最小重心坐标最大的一个，
/// 点在单元内时即为包含它的子三角形。
pub fn polygon_weights(
    points: &[Point2D],
    x: f64,
    y: f64,
    tol: &LocateTolerance,
) -> MeshResult<Vec<f64>> {
    let n = points.len();
    if n < 3 {
        return Err(MeshError::unsupported_geometry(format!("多边形顶点数 {n} < 3")));
    }

    let mid = coordinate_mean(points);
    let order = sort_about_center(points, mid, true);

    let mut best: Option<(usize, usize, [f64; 3])> = None;
    for k in 0..n {
        let a = order[k];
        let b = order[(k + 1) % n];
        let w = triangle_weights([points[a], points[b], mid], x, y, tol)?;
        let min_w = w[0].min(w[1]).min(w[2]);
        let better = best.map_or(true, |(_, _, bw)| min_w > bw[0].min(bw[1]).min(bw[2]));
        if better {
            best = Some((a, b, w));
        }
        if min_w >= -tol.inside_tol {
            break;
        }
    }

    let (a, b, w) = best.ok_or_else(|| MeshError::not_found("子三角形", format!("({x}, {y})")))?;
    let share = w[2] / n as f64;
    let mut weights = vec![share; n];
    weights[a] += w[0];
    weights[b] += w[1];
    Ok(weights)
}

// ============================================================
// 单元查找
// ============================================================

/// 插值模板：所在单元及其顶点权重
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stencil {
    /// 单元下标
    pub element: usize,
    /// 顶点对应的节点下标
    pub nodes: Vec<usize>,
    /// 顶点权重，与 `nodes` 一一对应
    pub weights: Vec<f64>,
}

impl Stencil {
    /// 用节点标量场插值
    pub fn interpolate(&self, values: &[f64]) -> MeshResult<f64> {
        self.nodes
            .iter()
            .zip(&self.weights)
            .try_fold(0.0, |acc, (&n, &w)| {
                values
                    .get(n)
                    .map(|v| acc + w * v)
                    .ok_or_else(|| MeshError::out_of_bounds("节点值", n, values.len()))
            })
    }
}

/// 在单元中心索引上查找包含点的单元
///
/// 按距离递增依次测试 `search_depth` 个最近单元，返回第一个包含点的单元。
///
/// # Errors
/// 候选中没有单元包含该点时返回 [`MeshError::NotFound`]。
pub fn find_element(
    tree: &Kdtree,
    elements: &[Element],
    nodes: &[Node],
    x: f64,
    y: f64,
    search_depth: usize,
    tol: &LocateTolerance,
) -> MeshResult<usize> {
    for candidate in tree.find_x_nearest(x, y, search_depth) {
        let element = elements
            .get(candidate)
            .ok_or_else(|| MeshError::out_of_bounds("单元", candidate, elements.len()))?;
        if element.contains(nodes, x, y, tol)? {
            return Ok(candidate);
        }
    }
    Err(MeshError::not_found("包含点的单元", format!("({x}, {y})")))
}

/// 查找单元并计算插值模板
pub fn find_stencil(
    tree: &Kdtree,
    elements: &[Element],
    nodes: &[Node],
    x: f64,
    y: f64,
    search_depth: usize,
    tol: &LocateTolerance,
) -> MeshResult<Stencil> {
    let element = find_element(tree, elements, nodes, x, y, search_depth, tol)?;
    let e = &elements[element];
    let weights = e.interpolation_weights(nodes, x, y, tol)?;
    Ok(Stencil {
        element,
        nodes: e.nodes().to_vec(),
        weights,
    })
}
