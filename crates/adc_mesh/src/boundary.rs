// crates/adc_mesh/src/boundary.rs
//! 网格边界
//!
//! 边界由类型码和一组成员记录组成。不同类型码的成员字段不同，
//! 用 [`BoundaryRecords`] 的各个分支分别承载：
//!
//! | 类型码 | 分支 | 字段 |
//! |---|---|---|
//! | -1 | `Open` | 节点 |
//! | 3, 13, 23 | `ExternalWeir` | 节点、堰顶高程、超临界系数 |
//! | 4, 24 | `InternalWeir` | 两节点、堰顶高程、亚/超临界系数 |
//! | 5, 25 | `InternalWeirWithPipes` | 另加管道高度、系数、直径 |
//! | 其余 | `SingleNode` | 节点 |
//!
//! 访问当前类型不具备的字段返回 [`MeshError::InvalidAttribute`]。

use crate::error::{MeshError, MeshResult};
use crate::hash::{fmt_code, fmt_coefficient, HashType, Hasher};
use crate::node::Node;
use serde::{Deserialize, Serialize};

/// 开边界类型码
pub const OPEN_BOUNDARY_CODE: i32 = -1;

/// 边界类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundaryKind {
    Open,
    SingleNode,
    ExternalWeir,
    InternalWeir,
    InternalWeirWithPipes,
}

impl BoundaryKind {
    /// 由类型码判断类别
    pub fn from_code(code: i32) -> Self {
        match code {
            OPEN_BOUNDARY_CODE => Self::Open,
            3 | 13 | 23 => Self::ExternalWeir,
            4 | 24 => Self::InternalWeir,
            5 | 25 => Self::InternalWeirWithPipes,
            _ => Self::SingleNode,
        }
    }

    /// 是否为堰
    pub fn is_weir(&self) -> bool {
        matches!(
            self,
            Self::ExternalWeir | Self::InternalWeir | Self::InternalWeirWithPipes
        )
    }

    /// 是否为内堰（成对节点）
    pub fn is_internal_weir(&self) -> bool {
        matches!(self, Self::InternalWeir | Self::InternalWeirWithPipes)
    }
}

/// 外堰成员
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExternalWeirNode {
    pub node: usize,
    pub crest_elevation: f64,
    pub supercritical_coefficient: f64,
}

/// 内堰成员
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InternalWeirPair {
    pub node1: usize,
    pub node2: usize,
    pub crest_elevation: f64,
    pub subcritical_coefficient: f64,
    pub supercritical_coefficient: f64,
}

/// 带管道的内堰成员
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PipedWeirPair {
    pub weir: InternalWeirPair,
    pub pipe_height: f64,
    pub pipe_coefficient: f64,
    pub pipe_diameter: f64,
}

/// 边界成员记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BoundaryRecords {
    Open(Vec<usize>),
    SingleNode(Vec<usize>),
    ExternalWeir(Vec<ExternalWeirNode>),
    InternalWeir(Vec<InternalWeirPair>),
    InternalWeirWithPipes(Vec<PipedWeirPair>),
}

impl BoundaryRecords {
    fn with_length(kind: BoundaryKind, length: usize) -> Self {
        match kind {
            BoundaryKind::Open => Self::Open(vec![0; length]),
            BoundaryKind::SingleNode => Self::SingleNode(vec![0; length]),
            BoundaryKind::ExternalWeir => Self::ExternalWeir(vec![Default::default(); length]),
            BoundaryKind::InternalWeir => Self::InternalWeir(vec![Default::default(); length]),
            BoundaryKind::InternalWeirWithPipes => {
                Self::InternalWeirWithPipes(vec![Default::default(); length])
            }
        }
    }

    /// 记录所属类别
    pub fn kind(&self) -> BoundaryKind {
        match self {
            Self::Open(_) => BoundaryKind::Open,
            Self::SingleNode(_) => BoundaryKind::SingleNode,
            Self::ExternalWeir(_) => BoundaryKind::ExternalWeir,
            Self::InternalWeir(_) => BoundaryKind::InternalWeir,
            Self::InternalWeirWithPipes(_) => BoundaryKind::InternalWeirWithPipes,
        }
    }

    /// 成员数
    pub fn len(&self) -> usize {
        match self {
            Self::Open(v) | Self::SingleNode(v) => v.len(),
            Self::ExternalWeir(v) => v.len(),
            Self::InternalWeir(v) => v.len(),
            Self::InternalWeirWithPipes(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn resize(&mut self, length: usize) {
        match self {
            Self::Open(v) | Self::SingleNode(v) => v.resize(length, 0),
            Self::ExternalWeir(v) => v.resize(length, Default::default()),
            Self::InternalWeir(v) => v.resize(length, Default::default()),
            Self::InternalWeirWithPipes(v) => v.resize(length, Default::default()),
        }
    }
}

/// 网格边界
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    code: i32,
    records: BoundaryRecords,
}

impl Boundary {
    /// 按类型码创建指定长度的边界，成员字段为零值
    pub fn new(code: i32, length: usize) -> Self {
        Self {
            code,
            records: BoundaryRecords::with_length(BoundaryKind::from_code(code), length),
        }
    }

    /// 由已有记录创建
    ///
    /// # Errors
    /// 记录类别与类型码不符时返回 [`MeshError::InvalidAttribute`]。
    pub fn with_records(code: i32, records: BoundaryRecords) -> MeshResult<Self> {
        if BoundaryKind::from_code(code) != records.kind() {
            return Err(MeshError::invalid_attribute("records", code));
        }
        Ok(Self { code, records })
    }

    /// 开边界
    pub fn open(nodes: Vec<usize>) -> Self {
        Self {
            code: OPEN_BOUNDARY_CODE,
            records: BoundaryRecords::Open(nodes),
        }
    }

    #[inline]
    pub fn code(&self) -> i32 {
        self.code
    }

    #[inline]
    pub fn kind(&self) -> BoundaryKind {
        self.records.kind()
    }

    /// 成员数
    #[inline]
    pub fn length(&self) -> usize {
        self.records.len()
    }

    /// 改变成员数，所有字段一起伸缩
    pub fn set_length(&mut self, length: usize) {
        self.records.resize(length);
    }

    #[inline]
    pub fn records(&self) -> &BoundaryRecords {
        &self.records
    }

    #[inline]
    pub fn records_mut(&mut self) -> &mut BoundaryRecords {
        &mut self.records
    }

    /// 边界涉及的节点下标（内堰含两侧节点）
    pub fn node_indices(&self) -> Vec<usize> {
        match &self.records {
            BoundaryRecords::Open(v) | BoundaryRecords::SingleNode(v) => v.clone(),
            BoundaryRecords::ExternalWeir(v) => v.iter().map(|r| r.node).collect(),
            BoundaryRecords::InternalWeir(v) => v.iter().flat_map(|r| [r.node1, r.node2]).collect(),
            BoundaryRecords::InternalWeirWithPipes(v) => v
                .iter()
                .flat_map(|r| [r.weir.node1, r.weir.node2])
                .collect(),
        }
    }

    fn check(&self, i: usize) -> MeshResult<()> {
        if i < self.length() {
            Ok(())
        } else {
            Err(MeshError::out_of_bounds("边界成员", i, self.length()))
        }
    }

    fn internal(&self, i: usize, attribute: &'static str) -> MeshResult<&InternalWeirPair> {
        self.check(i)?;
        match &self.records {
            BoundaryRecords::InternalWeir(v) => Ok(&v[i]),
            BoundaryRecords::InternalWeirWithPipes(v) => Ok(&v[i].weir),
            _ => Err(MeshError::invalid_attribute(attribute, self.code)),
        }
    }

    fn internal_mut(&mut self, i: usize, attribute: &'static str) -> MeshResult<&mut InternalWeirPair> {
        self.check(i)?;
        let code = self.code;
        match &mut self.records {
            BoundaryRecords::InternalWeir(v) => Ok(&mut v[i]),
            BoundaryRecords::InternalWeirWithPipes(v) => Ok(&mut v[i].weir),
            _ => Err(MeshError::invalid_attribute(attribute, code)),
        }
    }

    fn piped(&self, i: usize, attribute: &'static str) -> MeshResult<&PipedWeirPair> {
        self.check(i)?;
        match &self.records {
            BoundaryRecords::InternalWeirWithPipes(v) => Ok(&v[i]),
            _ => Err(MeshError::invalid_attribute(attribute, self.code)),
        }
    }

    fn piped_mut(&mut self, i: usize, attribute: &'static str) -> MeshResult<&mut PipedWeirPair> {
        self.check(i)?;
        let code = self.code;
        match &mut self.records {
            BoundaryRecords::InternalWeirWithPipes(v) => Ok(&mut v[i]),
            _ => Err(MeshError::invalid_attribute(attribute, code)),
        }
    }

    // ============================================================
    // 字段访问
    // ============================================================

    /// 第一个节点（所有类型都有）
    pub fn node1(&self, i: usize) -> MeshResult<usize> {
        self.check(i)?;
        Ok(match &self.records {
            BoundaryRecords::Open(v) | BoundaryRecords::SingleNode(v) => v[i],
            BoundaryRecords::ExternalWeir(v) => v[i].node,
            BoundaryRecords::InternalWeir(v) => v[i].node1,
            BoundaryRecords::InternalWeirWithPipes(v) => v[i].weir.node1,
        })
    }

    pub fn set_node1(&mut self, i: usize, node: usize) -> MeshResult<()> {
        self.check(i)?;
        match &mut self.records {
            BoundaryRecords::Open(v) | BoundaryRecords::SingleNode(v) => v[i] = node,
            BoundaryRecords::ExternalWeir(v) => v[i].node = node,
            BoundaryRecords::InternalWeir(v) => v[i].node1 = node,
            BoundaryRecords::InternalWeirWithPipes(v) => v[i].weir.node1 = node,
        }
        Ok(())
    }

    /// 第二个节点（仅内堰）
    pub fn node2(&self, i: usize) -> MeshResult<usize> {
        Ok(self.internal(i, "node2")?.node2)
    }

    pub fn set_node2(&mut self, i: usize, node: usize) -> MeshResult<()> {
        self.internal_mut(i, "node2")?.node2 = node;
        Ok(())
    }

    /// 堰顶高程（仅堰）
    pub fn crest_elevation(&self, i: usize) -> MeshResult<f64> {
        self.check(i)?;
        match &self.records {
            BoundaryRecords::ExternalWeir(v) => Ok(v[i].crest_elevation),
            _ => Ok(self.internal(i, "crest_elevation")?.crest_elevation),
        }
    }

    pub fn set_crest_elevation(&mut self, i: usize, value: f64) -> MeshResult<()> {
        self.check(i)?;
        if let BoundaryRecords::ExternalWeir(v) = &mut self.records {
            v[i].crest_elevation = value;
            return Ok(());
        }
        self.internal_mut(i, "crest_elevation")?.crest_elevation = value;
        Ok(())
    }

    /// 超临界堰流系数（仅堰）
    pub fn supercritical_weir_coefficient(&self, i: usize) -> MeshResult<f64> {
        self.check(i)?;
        match &self.records {
            BoundaryRecords::ExternalWeir(v) => Ok(v[i].supercritical_coefficient),
            _ => Ok(self
                .internal(i, "supercritical_weir_coefficient")?
                .supercritical_coefficient),
        }
    }

    pub fn set_supercritical_weir_coefficient(&mut self, i: usize, value: f64) -> MeshResult<()> {
        self.check(i)?;
        if let BoundaryRecords::ExternalWeir(v) = &mut self.records {
            v[i].supercritical_coefficient = value;
            return Ok(());
        }
        self.internal_mut(i, "supercritical_weir_coefficient")?
            .supercritical_coefficient = value;
        Ok(())
    }

    /// 亚临界堰流系数（仅内堰）
    pub fn subcritical_weir_coefficient(&self, i: usize) -> MeshResult<f64> {
        Ok(self
            .internal(i, "subcritical_weir_coefficient")?
            .subcritical_coefficient)
    }

    pub fn set_subcritical_weir_coefficient(&mut self, i: usize, value: f64) -> MeshResult<()> {
        self.internal_mut(i, "subcritical_weir_coefficient")?
            .subcritical_coefficient = value;
        Ok(())
    }

    /// 管道高度（仅带管道内堰）
    pub fn pipe_height(&self, i: usize) -> MeshResult<f64> {
        Ok(self.piped(i, "pipe_height")?.pipe_height)
    }

    pub fn set_pipe_height(&mut self, i: usize, value: f64) -> MeshResult<()> {
        self.piped_mut(i, "pipe_height")?.pipe_height = value;
        Ok(())
    }

    /// 管道系数（仅带管道内堰）
    pub fn pipe_coefficient(&self, i: usize) -> MeshResult<f64> {
        Ok(self.piped(i, "pipe_coefficient")?.pipe_coefficient)
    }

    pub fn set_pipe_coefficient(&mut self, i: usize, value: f64) -> MeshResult<()> {
        self.piped_mut(i, "pipe_coefficient")?.pipe_coefficient = value;
        Ok(())
    }

    /// 管道直径（仅带管道内堰）
    pub fn pipe_diameter(&self, i: usize) -> MeshResult<f64> {
        Ok(self.piped(i, "pipe_diameter")?.pipe_diameter)
    }

    pub fn set_pipe_diameter(&mut self, i: usize, value: f64) -> MeshResult<()> {
        self.piped_mut(i, "pipe_diameter")?.pipe_diameter = value;
        Ok(())
    }

    // ============================================================
    // 哈希与输出
    // ============================================================

    /// 边界哈希
    ///
    /// 类型码，加上每个成员的节点位置哈希与适用的系数。
    pub fn hash(&self, nodes: &[Node], hash_type: HashType) -> MeshResult<String> {
        let position = |i: usize| {
            nodes
                .get(i)
                .map(|n| n.position_hash(hash_type))
                .ok_or_else(|| MeshError::out_of_bounds("节点", i, nodes.len()))
        };

        let mut h = Hasher::new(hash_type);
        h.update(fmt_code(self.code));
        match &self.records {
            BoundaryRecords::Open(v) | BoundaryRecords::SingleNode(v) => {
                for &n in v {
                    h.update(position(n)?);
                }
            }
            BoundaryRecords::ExternalWeir(v) => {
                for r in v {
                    h.update(position(r.node)?);
                    h.update(fmt_coefficient(r.crest_elevation));
                    h.update(fmt_coefficient(r.supercritical_coefficient));
                }
            }
            BoundaryRecords::InternalWeir(v) => {
                for r in v {
                    hash_internal(&mut h, r, &position)?;
                }
            }
            BoundaryRecords::InternalWeirWithPipes(v) => {
                for r in v {
                    hash_internal(&mut h, &r.weir, &position)?;
                    h.update(fmt_coefficient(r.pipe_diameter));
                    h.update(fmt_coefficient(r.pipe_height));
                    h.update(fmt_coefficient(r.pipe_coefficient));
                }
            }
        }
        Ok(h.finalize())
    }

    /// ADCIRC 边界块：首行为长度（陆边界另带类型码），随后每成员一行
    pub fn to_adcirc_lines(&self, nodes: &[Node]) -> MeshResult<Vec<String>> {
        let id = |i: usize| {
            nodes
                .get(i)
                .map(|n| n.id)
                .ok_or_else(|| MeshError::out_of_bounds("节点", i, nodes.len()))
        };

        let mut lines = Vec::with_capacity(self.length() + 1);
        if self.code == OPEN_BOUNDARY_CODE {
            lines.push(format!("{:11}", self.length()));
        } else {
            lines.push(format!("{:11} {:11}", self.length(), self.code));
        }

        match &self.records {
            BoundaryRecords::Open(v) | BoundaryRecords::SingleNode(v) => {
                for &n in v {
                    lines.push(format!("{:11}", id(n)?));
                }
            }
            BoundaryRecords::ExternalWeir(v) => {
                for r in v {
                    lines.push(format!(
                        "{:11} {:6.3} {:6.3}",
                        id(r.node)?,
                        r.crest_elevation,
                        r.supercritical_coefficient
                    ));
                }
            }
            BoundaryRecords::InternalWeir(v) => {
                for r in v {
                    lines.push(format!(
                        "{:11} {:11} {:6.3} {:6.3} {:6.3}",
                        id(r.node1)?,
                        id(r.node2)?,
                        r.crest_elevation,
                        r.subcritical_coefficient,
                        r.supercritical_coefficient
                    ));
                }
            }
            BoundaryRecords::InternalWeirWithPipes(v) => {
                for r in v {
                    let w = &r.weir;
                    lines.push(format!(
                        "{:11} {:11} {:6.3} {:6.3} {:6.3} {:6.3} {:6.3} {:6.3}",
                        id(w.node1)?,
                        id(w.node2)?,
                        w.crest_elevation,
                        w.subcritical_coefficient,
                        w.supercritical_coefficient,
                        r.pipe_height,
                        r.pipe_coefficient,
                        r.pipe_diameter
                    ));
                }
            }
        }
        Ok(lines)
    }
}

fn hash_internal(
    h: &mut Hasher,
    r: &InternalWeirPair,
    position: &impl Fn(usize) -> MeshResult<String>,
) -> MeshResult<()> {
    h.update(position(r.node1)?);
    h.update(position(r.node2)?);
    h.update(fmt_coefficient(r.crest_elevation));
    h.update(fmt_coefficient(r.supercritical_coefficient));
    h.update(fmt_coefficient(r.subcritical_coefficient));
    Ok(())
}
