// crates/adc_mesh/src/checker.rs

//! 网格检查
//!
//! 检查项：
//!
//! - 节点、单元是否按 1..n 顺序编号
//! - 节点高程是否低于下限
//! - 堰顶是否高出相邻地形足够的余量
//! - 是否存在被两个以上单元共享的边（重叠单元）
//!
//! 高程沿用 ADCIRC 约定：`z` 为向下为正的水深，地形高程为 `-z`。

use crate::boundary::BoundaryRecords;
use crate::mesh::Mesh;
use crate::topology::FaceTable;
use std::collections::HashSet;

/// 检查发现的问题
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CheckIssue {
    /// 节点编号不连续
    #[error("节点编号不连续: 位置 {index} 的标识为 {id}")]
    NodeNumbering { index: usize, id: usize },

    /// 单元编号不连续
    #[error("单元编号不连续: 位置 {index} 的标识为 {id}")]
    ElementNumbering { index: usize, id: usize },

    /// 节点高程低于下限
    #[error("节点 {node_id} 高程 {z:.2} 低于下限 {minimum:.2}")]
    NodalElevation { node_id: usize, z: f64, minimum: f64 },

    /// 堰顶不足以高出地形
    #[error(
        "陆地边界 {boundary} 成员 {member}: 节点 {node_id} 地形 {topography:.2} 高于堰顶 {crest:.2} 减余量 {margin:.2}"
    )]
    LeveeHeight {
        boundary: usize,
        member: usize,
        node_id: usize,
        topography: f64,
        crest: f64,
        margin: f64,
    },

    /// 重叠单元
    #[error("单元 {element_id} 与其他单元重叠")]
    OverlappingElement { element_id: usize },
}

/// 检查报告
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckReport {
    issues: Vec<CheckIssue>,
}

impl CheckReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否全部通过
    #[inline]
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }

    #[inline]
    pub fn issues(&self) -> &[CheckIssue] {
        &self.issues
    }

    pub fn add(&mut self, issue: CheckIssue) {
        log::warn!("{issue}");
        self.issues.push(issue);
    }

    /// 合并另一份报告
    pub fn merge(&mut self, other: CheckReport) {
        self.issues.extend(other.issues);
    }
}

/// 网格检查器
///
/// 阈值默认取自网格配置的 `min_nodal_elevation` 与
/// `min_crest_over_topography`。
pub struct MeshChecker<'a> {
    mesh: &'a Mesh,
    min_nodal_elevation: f64,
    min_crest_over_topography: f64,
}

impl<'a> MeshChecker<'a> {
    pub fn new(mesh: &'a Mesh) -> Self {
        let config = mesh.config();
        Self {
            mesh,
            min_nodal_elevation: config.min_nodal_elevation,
            min_crest_over_topography: config.min_crest_over_topography,
        }
    }

    /// 覆盖阈值
    pub fn with_thresholds(mut self, min_nodal_elevation: f64, min_crest_over_topography: f64) -> Self {
        self.min_nodal_elevation = min_nodal_elevation;
        self.min_crest_over_topography = min_crest_over_topography;
        self
    }

    /// 运行全部检查
    pub fn check(&self) -> CheckReport {
        let mut report = self.check_node_numbering();
        report.merge(self.check_element_numbering());
        report.merge(self.check_nodal_elevations());
        report.merge(self.check_levee_heights());
        report.merge(self.check_overlapping_elements());
        log::info!(
            "网格检查完成: {} 个问题",
            report.issues().len()
        );
        report
    }

    /// 节点编号，只报告第一处不连续
    pub fn check_node_numbering(&self) -> CheckReport {
        let mut report = CheckReport::new();
        if let Some((index, node)) = self
            .mesh
            .nodes()
            .iter()
            .enumerate()
            .find(|(i, n)| n.id != i + 1)
        {
            report.add(CheckIssue::NodeNumbering { index, id: node.id });
        }
        report
    }

    /// 单元编号，只报告第一处不连续
    pub fn check_element_numbering(&self) -> CheckReport {
        let mut report = CheckReport::new();
        if let Some((index, element)) = self
            .mesh
            .elements()
            .iter()
            .enumerate()
            .find(|(i, e)| e.id != i + 1)
        {
            report.add(CheckIssue::ElementNumbering {
                index,
                id: element.id,
            });
        }
        report
    }

    pub fn check_nodal_elevations(&self) -> CheckReport {
        let mut report = CheckReport::new();
        for node in self.mesh.nodes() {
            if node.z < self.min_nodal_elevation {
                report.add(CheckIssue::NodalElevation {
                    node_id: node.id,
                    z: node.z,
                    minimum: self.min_nodal_elevation,
                });
            }
        }
        report
    }

    /// 堰顶高度
    ///
    /// 外堰检查唯一节点，内堰（含管道）检查两侧节点。
    /// 越界的节点下标视为缺失，不参与检查。
    pub fn check_levee_heights(&self) -> CheckReport {
        let mut report = CheckReport::new();
        let nodes = self.mesh.nodes();
        let margin = self.min_crest_over_topography;

        for (b, boundary) in self.mesh.land_boundaries().iter().enumerate() {
            let members: Vec<(usize, f64)> = match boundary.records() {
                BoundaryRecords::ExternalWeir(v) => {
                    v.iter().map(|r| (r.node, r.crest_elevation)).collect()
                }
                BoundaryRecords::InternalWeir(v) => v
                    .iter()
                    .flat_map(|r| [(r.node1, r.crest_elevation), (r.node2, r.crest_elevation)])
                    .collect(),
                BoundaryRecords::InternalWeirWithPipes(v) => v
                    .iter()
                    .flat_map(|r| {
                        [
                            (r.weir.node1, r.weir.crest_elevation),
                            (r.weir.node2, r.weir.crest_elevation),
                        ]
                    })
                    .collect(),
                BoundaryRecords::Open(_) | BoundaryRecords::SingleNode(_) => continue,
            };
            let per_member = if boundary.kind().is_internal_weir() { 2 } else { 1 };

            for (k, (node, crest)) in members.into_iter().enumerate() {
                let Some(node) = nodes.get(node) else { continue };
                let topography = -node.z;
                if topography > crest - margin {
                    report.add(CheckIssue::LeveeHeight {
                        boundary: b,
                        member: k / per_member,
                        node_id: node.id,
                        topography,
                        crest,
                        margin,
                    });
                }
            }
        }
        report
    }

    /// 重叠单元：某条边被两个以上单元共享时，报告所有含该边的单元
    pub fn check_overlapping_elements(&self) -> CheckReport {
        let mut report = CheckReport::new();
        let table = FaceTable::build(self.mesh.elements());
        let overlapping: HashSet<(usize, usize)> = table
            .overlapping_edges()
            .iter()
            .map(|&(a, b, _)| (a, b))
            .collect();
        if overlapping.is_empty() {
            return report;
        }

        for element in self.mesh.elements() {
            let hit = element
                .faces()
                .into_iter()
                .any(|(a, b)| overlapping.contains(&(a.min(b), a.max(b))));
            if hit {
                report.add(CheckIssue::OverlappingElement {
                    element_id: element.id,
                });
            }
        }
        report
    }
}
