// crates/adc_mesh/src/mesh.rs

//! 网格容器
//!
//! [`Mesh`] 独占节点、单元与边界存储，负责标识解析与各类索引的一致性。
//!
//! # 索引失效约定
//!
//! - 增删节点/单元会重建标识解析表并丢弃连接表
//! - 空间索引（节点、单元中心）是构建时坐标的快照，修改坐标或增删记录
//!   后**不会**自动失效，调用方需要 `delete_*_search_tree` 后重建
//! - 内容哈希在首次计算后缓存，修改网格后需要 `hash(true)` 才会重新计算
//! - 整体改变坐标的操作（重投影、CPP）会同时丢弃两个空间索引和哈希缓存
//!
//! 单元和边界只保存节点下标。删除节点不会重映射这些下标，
//! 可用 [`Mesh::validate_references`] 检查。

use crate::boundary::Boundary;
use crate::config::MeshConfig;
use crate::element::Element;
use crate::error::{MeshError, MeshResult};
use crate::hash::{HashType, Hasher};
use crate::kdtree::{Kdtree, SearchTree};
use crate::locator::{self, Stencil};
use crate::node::Node;
use crate::resolver::IdResolver;
use crate::topology::{ElementTable, FaceTable};
use adc_geo::projection::{self, ProjectionEngine};
use adc_geo::Point2D;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 默认坐标系：WGS84 经纬度
pub const DEFAULT_EPSG: u32 = 4326;

/// 投影描述
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionDescriptor {
    pub epsg: u32,
    pub is_geographic: bool,
}

impl Default for ProjectionDescriptor {
    fn default() -> Self {
        Self {
            epsg: DEFAULT_EPSG,
            is_geographic: true,
        }
    }
}

/// 网格范围
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    pub zmin: f64,
    pub zmax: f64,
}

/// 共享边正交性
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orthogonality {
    /// 边与两单元中心连线夹角余弦的绝对值，0 为完全正交
    pub value: f64,
    /// 边中点
    pub midpoint: Point2D,
}

/// 网格容器
#[derive(Debug, Clone)]
pub struct Mesh {
    header: String,
    filename: Option<PathBuf>,
    nodes: Vec<Node>,
    elements: Vec<Element>,
    open_boundaries: Vec<Boundary>,
    land_boundaries: Vec<Boundary>,
    projection: ProjectionDescriptor,
    node_resolver: IdResolver,
    element_resolver: IdResolver,
    node_tree: SearchTree,
    element_tree: SearchTree,
    element_table: Option<ElementTable>,
    face_table: Option<FaceTable>,
    config: MeshConfig,
    hash: Option<String>,
}

impl Default for Mesh {
    fn default() -> Self {
        Self::with_config(MeshConfig::default())
    }
}

/// 读取器交给容器的完整内容
pub(crate) struct MeshParts {
    pub header: String,
    pub nodes: Vec<Node>,
    pub elements: Vec<Element>,
    pub open_boundaries: Vec<Boundary>,
    pub land_boundaries: Vec<Boundary>,
    pub node_resolver: IdResolver,
    pub element_resolver: IdResolver,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用指定配置创建空网格
    pub fn with_config(config: MeshConfig) -> Self {
        Self {
            header: String::new(),
            filename: None,
            nodes: Vec::new(),
            elements: Vec::new(),
            open_boundaries: Vec::new(),
            land_boundaries: Vec::new(),
            projection: ProjectionDescriptor::default(),
            node_resolver: IdResolver::new("节点"),
            element_resolver: IdResolver::new("单元"),
            node_tree: SearchTree::new(),
            element_tree: SearchTree::new(),
            element_table: None,
            face_table: None,
            config,
            hash: None,
        }
    }

    /// 由节点与单元直接构建
    ///
    /// 标识解析表按给定标识构建，并检查所有节点下标。
    pub fn from_parts(
        header: impl Into<String>,
        nodes: Vec<Node>,
        elements: Vec<Element>,
        open_boundaries: Vec<Boundary>,
        land_boundaries: Vec<Boundary>,
    ) -> MeshResult<Self> {
        let mut mesh = Self::new();
        mesh.header = header.into();
        mesh.nodes = nodes;
        mesh.elements = elements;
        mesh.open_boundaries = open_boundaries;
        mesh.land_boundaries = land_boundaries;
        mesh.rebuild_resolvers();
        mesh.validate_references()?;
        Ok(mesh)
    }

    pub(crate) fn from_loaded(parts: MeshParts, config: MeshConfig) -> Self {
        let mut mesh = Self::with_config(config);
        mesh.header = parts.header;
        mesh.nodes = parts.nodes;
        mesh.elements = parts.elements;
        mesh.open_boundaries = parts.open_boundaries;
        mesh.land_boundaries = parts.land_boundaries;
        mesh.node_resolver = parts.node_resolver;
        mesh.element_resolver = parts.element_resolver;
        mesh
    }

    // ============================================================
    // 基本属性
    // ============================================================

    #[inline]
    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    /// 替换配置；哈希类型变化时丢弃哈希缓存
    pub fn set_config(&mut self, config: MeshConfig) {
        if config.hash_type != self.config.hash_type {
            self.hash = None;
        }
        self.config = config;
    }

    #[inline]
    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn set_header(&mut self, header: impl Into<String>) {
        self.header = header.into();
    }

    #[inline]
    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub(crate) fn set_filename(&mut self, path: &Path) {
        self.filename = Some(path.to_path_buf());
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn num_open_boundaries(&self) -> usize {
        self.open_boundaries.len()
    }

    #[inline]
    pub fn num_land_boundaries(&self) -> usize {
        self.land_boundaries.len()
    }

    /// 开边界节点总数
    pub fn total_open_boundary_nodes(&self) -> usize {
        self.open_boundaries.iter().map(Boundary::length).sum()
    }

    /// 陆边界成员总数
    pub fn total_land_boundary_nodes(&self) -> usize {
        self.land_boundaries.iter().map(Boundary::length).sum()
    }

    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    #[inline]
    pub fn open_boundaries(&self) -> &[Boundary] {
        &self.open_boundaries
    }

    #[inline]
    pub fn land_boundaries(&self) -> &[Boundary] {
        &self.land_boundaries
    }

    pub fn node(&self, index: usize) -> MeshResult<&Node> {
        self.nodes
            .get(index)
            .ok_or_else(|| MeshError::out_of_bounds("节点", index, self.nodes.len()))
    }

    /// 可变节点
    ///
    /// 修改坐标不会使空间索引或哈希缓存失效；修改 `id` 后需调用
    /// [`Mesh::rebuild_resolvers`]。
    pub fn node_mut(&mut self, index: usize) -> MeshResult<&mut Node> {
        let len = self.nodes.len();
        self.nodes
            .get_mut(index)
            .ok_or_else(|| MeshError::out_of_bounds("节点", index, len))
    }

    pub fn element(&self, index: usize) -> MeshResult<&Element> {
        self.elements
            .get(index)
            .ok_or_else(|| MeshError::out_of_bounds("单元", index, self.elements.len()))
    }

    pub fn element_mut(&mut self, index: usize) -> MeshResult<&mut Element> {
        let len = self.elements.len();
        self.elements
            .get_mut(index)
            .ok_or_else(|| MeshError::out_of_bounds("单元", index, len))
    }

    pub fn open_boundary(&self, index: usize) -> MeshResult<&Boundary> {
        self.open_boundaries
            .get(index)
            .ok_or_else(|| MeshError::out_of_bounds("开边界", index, self.open_boundaries.len()))
    }

    pub fn open_boundary_mut(&mut self, index: usize) -> MeshResult<&mut Boundary> {
        let len = self.open_boundaries.len();
        self.open_boundaries
            .get_mut(index)
            .ok_or_else(|| MeshError::out_of_bounds("开边界", index, len))
    }

    pub fn land_boundary(&self, index: usize) -> MeshResult<&Boundary> {
        self.land_boundaries
            .get(index)
            .ok_or_else(|| MeshError::out_of_bounds("陆边界", index, self.land_boundaries.len()))
    }

    pub fn land_boundary_mut(&mut self, index: usize) -> MeshResult<&mut Boundary> {
        let len = self.land_boundaries.len();
        self.land_boundaries
            .get_mut(index)
            .ok_or_else(|| MeshError::out_of_bounds("陆边界", index, len))
    }

    // ============================================================
    // 结构修改
    // ============================================================

    /// 调整存储大小
    ///
    /// 新增槽位为零值记录。新增单元是占位三角形 `(0, 0, 0)`，引用节点下标 0；
    /// 节点数为零时它是悬空引用，[`Mesh::validate_references`] 会报告该单元，
    /// 依赖引用检查的操作（哈希、建表）在填入真实单元前都会失败。
    /// 不重新运行标识解析。
    pub fn resize(&mut self, n_nodes: usize, n_elements: usize, n_open: usize, n_land: usize) {
        self.nodes.resize(n_nodes, Node::default());
        self.elements.resize(n_elements, Element::triangle(0, 0, 0, 0));
        self.open_boundaries.resize(n_open, Boundary::open(Vec::new()));
        self.land_boundaries.resize(n_land, Boundary::new(0, 0));
        self.invalidate_connectivity();
    }

    /// 放置节点：`index < len` 替换，`index == len` 追加
    pub fn add_node(&mut self, index: usize, node: Node) -> MeshResult<()> {
        let id = node.id;
        let replaced = place(&mut self.nodes, index, node, "节点")?;
        let labels = self.nodes.iter().map(|n| n.id);
        match replaced {
            Some(old) => self.node_resolver.replace(index, old.id, id, labels),
            None => self.node_resolver.push(index, id, labels),
        }
        self.invalidate_connectivity();
        Ok(())
    }

    /// 删除节点，其后的节点前移
    ///
    /// 单元与边界中的节点下标不会重映射。
    pub fn delete_node(&mut self, index: usize) -> MeshResult<Node> {
        let node = take(&mut self.nodes, index, "节点")?;
        let labels: Vec<usize> = self.nodes.iter().map(|n| n.id).collect();
        self.node_resolver.rebuild(&labels);
        self.invalidate_connectivity();
        Ok(node)
    }

    /// 放置单元：`index < len` 替换，`index == len` 追加
    pub fn add_element(&mut self, index: usize, element: Element) -> MeshResult<()> {
        let id = element.id;
        let replaced = place(&mut self.elements, index, element, "单元")?;
        let labels = self.elements.iter().map(|e| e.id);
        match replaced {
            Some(old) => self.element_resolver.replace(index, old.id, id, labels),
            None => self.element_resolver.push(index, id, labels),
        }
        self.invalidate_connectivity();
        Ok(())
    }

    pub fn delete_element(&mut self, index: usize) -> MeshResult<Element> {
        let element = take(&mut self.elements, index, "单元")?;
        let labels: Vec<usize> = self.elements.iter().map(|e| e.id).collect();
        self.element_resolver.rebuild(&labels);
        self.invalidate_connectivity();
        Ok(element)
    }

    pub fn add_open_boundary(&mut self, index: usize, boundary: Boundary) -> MeshResult<()> {
        place(&mut self.open_boundaries, index, boundary, "开边界").map(|_| ())
    }

    pub fn delete_open_boundary(&mut self, index: usize) -> MeshResult<Boundary> {
        take(&mut self.open_boundaries, index, "开边界")
    }

    pub fn add_land_boundary(&mut self, index: usize, boundary: Boundary) -> MeshResult<()> {
        place(&mut self.land_boundaries, index, boundary, "陆边界").map(|_| ())
    }

    pub fn delete_land_boundary(&mut self, index: usize) -> MeshResult<Boundary> {
        take(&mut self.land_boundaries, index, "陆边界")
    }

    fn invalidate_connectivity(&mut self) {
        self.element_table = None;
        self.face_table = None;
    }

    /// 按当前标识重建节点与单元的解析表
    pub fn rebuild_resolvers(&mut self) {
        let labels: Vec<usize> = self.nodes.iter().map(|n| n.id).collect();
        self.node_resolver.rebuild(&labels);
        let labels: Vec<usize> = self.elements.iter().map(|e| e.id).collect();
        self.element_resolver.rebuild(&labels);
    }

    /// 检查所有单元与边界的节点下标均小于节点数
    ///
    /// # Errors
    /// 单元引用越界返回 `what` 为 "单元节点" 的 [`MeshError::OutOfBounds`]，
    /// 边界引用越界为 "边界节点"；出错的单元或边界位置写入 warn 日志。
    pub fn validate_references(&self) -> MeshResult<()> {
        let len = self.nodes.len();
        for (position, e) in self.elements.iter().enumerate() {
            if let Some(&i) = e.nodes().iter().find(|&&i| i >= len) {
                log::warn!("单元 {} (位置 {position}) 引用节点下标 {i}，节点数 {len}", e.id);
                return Err(MeshError::out_of_bounds("单元节点", i, len));
            }
        }
        for (position, b) in self.open_boundaries.iter().chain(&self.land_boundaries).enumerate() {
            if let Some(i) = b.node_indices().into_iter().find(|&i| i >= len) {
                log::warn!("边界 (位置 {position}) 引用节点下标 {i}，节点数 {len}");
                return Err(MeshError::out_of_bounds("边界节点", i, len));
            }
        }
        Ok(())
    }

    /// 所有单元绕中心重排顶点
    pub fn reorient_elements(&mut self, clockwise: bool) -> MeshResult<()> {
        for e in &mut self.elements {
            e.sort_vertices_about_center(&self.nodes, clockwise)?;
        }
        self.face_table = None;
        Ok(())
    }

    // ============================================================
    // 标识解析
    // ============================================================

    /// 节点编号是否为逻辑编号
    #[inline]
    pub fn node_ordering_is_logical(&self) -> bool {
        self.node_resolver.is_logical()
    }

    #[inline]
    pub fn element_ordering_is_logical(&self) -> bool {
        self.element_resolver.is_logical()
    }

    /// 标识对应的节点下标
    pub fn node_index_by_id(&self, id: usize) -> MeshResult<usize> {
        self.node_resolver.index_of(id, self.nodes.len())
    }

    /// 标识对应的单元下标
    pub fn element_index_by_id(&self, id: usize) -> MeshResult<usize> {
        self.element_resolver.index_of(id, self.elements.len())
    }

    pub fn node_by_id(&self, id: usize) -> MeshResult<&Node> {
        self.node(self.node_index_by_id(id)?)
    }

    pub fn element_by_id(&self, id: usize) -> MeshResult<&Element> {
        self.element(self.element_index_by_id(id)?)
    }

    /// 位置与高程相同的节点下标
    pub fn contains_node(&self, node: &Node) -> Option<usize> {
        self.nodes.iter().position(|n| n == node)
    }

    /// 顶点相同的单元下标
    pub fn contains_element(&self, element: &Element) -> Option<usize> {
        self.elements.iter().position(|e| e.nodes() == element.nodes())
    }

    // ============================================================
    // 批量视图
    // ============================================================

    pub fn x(&self) -> Vec<f64> {
        self.nodes.iter().map(|n| n.x).collect()
    }

    pub fn y(&self) -> Vec<f64> {
        self.nodes.iter().map(|n| n.y).collect()
    }

    pub fn z(&self) -> Vec<f64> {
        self.nodes.iter().map(|n| n.z).collect()
    }

    pub fn xyz(&self) -> Vec<[f64; 3]> {
        self.nodes.iter().map(|n| [n.x, n.y, n.z]).collect()
    }

    /// 批量设置高程
    pub fn set_z(&mut self, values: &[f64]) -> MeshResult<()> {
        if values.len() != self.nodes.len() {
            return Err(MeshError::size_mismatch("z", self.nodes.len(), values.len()));
        }
        for (n, &z) in self.nodes.iter_mut().zip(values) {
            n.z = z;
        }
        Ok(())
    }

    /// 单元连接（节点标识）
    pub fn connectivity(&self) -> MeshResult<Vec<Vec<usize>>> {
        self.elements
            .iter()
            .map(|e| {
                e.nodes()
                    .iter()
                    .map(|&i| self.node(i).map(|n| n.id))
                    .collect()
            })
            .collect()
    }

    /// 单元最大顶点数
    pub fn max_nodes_per_element(&self) -> usize {
        self.elements.iter().map(Element::n).max().unwrap_or(0)
    }

    /// 网格范围
    pub fn extent(&self) -> MeshResult<Extent> {
        let first = self.nodes.first().ok_or_else(|| MeshError::not_found("节点", "空网格"))?;
        let init = Extent {
            xmin: first.x,
            ymin: first.y,
            xmax: first.x,
            ymax: first.y,
            zmin: first.z,
            zmax: first.z,
        };
        Ok(self.nodes.iter().fold(init, |e, n| Extent {
            xmin: e.xmin.min(n.x),
            ymin: e.ymin.min(n.y),
            xmax: e.xmax.max(n.x),
            ymax: e.ymax.max(n.y),
            zmin: e.zmin.min(n.z),
            zmax: e.zmax.max(n.z),
        }))
    }

    fn positions(&self) -> Vec<Point2D> {
        self.nodes.iter().map(Node::position).collect()
    }

    fn centroids(&self) -> MeshResult<Vec<Point2D>> {
        self.elements.iter().map(|e| e.centroid(&self.nodes)).collect()
    }

    // ============================================================
    // 空间索引
    // ============================================================

    /// 重建节点索引
    pub fn build_nodal_search_tree(&mut self) -> &Kdtree {
        let points = self.positions();
        self.node_tree.rebuild(&points)
    }

    pub fn delete_nodal_search_tree(&mut self) {
        self.node_tree.invalidate();
    }

    #[inline]
    pub fn nodal_search_tree_initialized(&self) -> bool {
        self.node_tree.is_built()
    }

    /// 重建单元中心索引
    pub fn build_elemental_search_tree(&mut self) -> MeshResult<&Kdtree> {
        let points = self.centroids()?;
        Ok(self.element_tree.rebuild(&points))
    }

    pub fn delete_elemental_search_tree(&mut self) {
        self.element_tree.invalidate();
    }

    #[inline]
    pub fn elemental_search_tree_initialized(&self) -> bool {
        self.element_tree.is_built()
    }

    fn nodal_tree(&mut self) -> &Kdtree {
        let nodes = &self.nodes;
        self.node_tree
            .get_or_build(|| nodes.iter().map(Node::position).collect())
    }

    fn ensure_elemental_tree(&mut self) -> MeshResult<()> {
        if !self.element_tree.is_built() {
            self.build_elemental_search_tree()?;
        }
        Ok(())
    }

    /// 最近节点下标（未构建索引时自动构建）
    pub fn find_nearest_node(&mut self, x: f64, y: f64) -> MeshResult<usize> {
        self.nodal_tree().find_nearest(x, y)
    }

    /// 半径内的节点，按距离递增
    pub fn find_nodes_within_radius(&mut self, x: f64, y: f64, radius: f64) -> Vec<usize> {
        self.nodal_tree().find_within_radius(x, y, radius)
    }

    /// 中心最近的单元下标
    pub fn find_nearest_element(&mut self, x: f64, y: f64) -> MeshResult<usize> {
        self.ensure_elemental_tree()?;
        self.elemental_tree()?.find_nearest(x, y)
    }

    fn elemental_tree(&self) -> MeshResult<&Kdtree> {
        self.element_tree
            .built()
            .ok_or_else(|| MeshError::not_found("单元索引", "未构建"))
    }

    /// 包含点的单元下标
    ///
    /// 在 `search_depth` 个最近单元中查找；找不到时返回 `NotFound`。
    pub fn find_element(&mut self, x: f64, y: f64) -> MeshResult<usize> {
        self.ensure_elemental_tree()?;
        let result = locator::find_element(
            self.elemental_tree()?,
            &self.elements,
            &self.nodes,
            x,
            y,
            self.config.search_depth,
            &self.config.tolerance,
        );
        if let Err(MeshError::NotFound { .. }) = &result {
            log::warn!(
                "点 ({x}, {y}) 不在最近的 {} 个单元内",
                self.config.search_depth
            );
        }
        result
    }

    /// 包含点的单元及插值权重
    pub fn find_element_with_weights(&mut self, x: f64, y: f64) -> MeshResult<Stencil> {
        self.ensure_elemental_tree()?;
        locator::find_stencil(
            self.elemental_tree()?,
            &self.elements,
            &self.nodes,
            x,
            y,
            self.config.search_depth,
            &self.config.tolerance,
        )
    }

    /// 用节点标量场在 (x, y) 处插值
    pub fn interpolate(&mut self, x: f64, y: f64, values: &[f64]) -> MeshResult<f64> {
        if values.len() != self.nodes.len() {
            return Err(MeshError::size_mismatch("values", self.nodes.len(), values.len()));
        }
        self.find_element_with_weights(x, y)?.interpolate(values)
    }

    /// 一组点的插值模板，网格外的点为 `None`
    pub fn raster_stencils(&mut self, points: &[Point2D]) -> MeshResult<Vec<Option<Stencil>>> {
        self.ensure_elemental_tree()?;
        let tree = self.elemental_tree()?;
        points
            .iter()
            .map(|p| {
                match locator::find_stencil(
                    tree,
                    &self.elements,
                    &self.nodes,
                    p.x,
                    p.y,
                    self.config.search_depth,
                    &self.config.tolerance,
                ) {
                    Ok(s) => Ok(Some(s)),
                    Err(MeshError::NotFound { .. }) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .collect()
    }

    /// 并行定位一组点
    ///
    /// 需要先构建单元中心索引；执行期间网格不可修改。
    #[cfg(feature = "parallel")]
    pub fn locate_batch_parallel(&self, points: &[Point2D]) -> MeshResult<Vec<Option<usize>>> {
        use rayon::prelude::*;

        let tree = self.elemental_tree()?;
        points
            .par_iter()
            .map(|p| {
                match locator::find_element(
                    tree,
                    &self.elements,
                    &self.nodes,
                    p.x,
                    p.y,
                    self.config.search_depth,
                    &self.config.tolerance,
                ) {
                    Ok(e) => Ok(Some(e)),
                    Err(MeshError::NotFound { .. }) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .collect()
    }

    // ============================================================
    // 连接表
    // ============================================================

    /// 构建节点-单元表
    pub fn build_element_table(&mut self) -> MeshResult<&ElementTable> {
        let table = ElementTable::build(self.nodes.len(), &self.elements)?;
        Ok(self.element_table.insert(table))
    }

    /// 已构建的节点-单元表
    #[inline]
    pub fn element_table(&self) -> Option<&ElementTable> {
        self.element_table.as_ref()
    }

    pub fn delete_element_table(&mut self) {
        self.element_table = None;
    }

    /// 构建边表
    pub fn build_face_table(&mut self) -> MeshResult<&FaceTable> {
        self.validate_references()?;
        Ok(self.face_table.insert(FaceTable::build(&self.elements)))
    }

    /// 已构建的边表
    #[inline]
    pub fn face_table(&self) -> Option<&FaceTable> {
        self.face_table.as_ref()
    }

    pub fn delete_face_table(&mut self) {
        self.face_table = None;
    }

    fn ensure_face_table(&mut self) -> MeshResult<&FaceTable> {
        if self.face_table.is_none() {
            self.build_face_table()?;
        }
        self.face_table
            .as_ref()
            .ok_or_else(|| MeshError::not_found("边表", "未构建"))
    }

    /// 网格边界节点下标（升序）
    pub fn boundary_nodes(&mut self) -> MeshResult<Vec<usize>> {
        Ok(self.ensure_face_table()?.boundary_nodes())
    }

    /// 每个节点周围单元尺度的平均值
    ///
    /// 不属于任何单元的节点为 0。
    pub fn compute_mesh_size(&mut self) -> MeshResult<Vec<f64>> {
        if self.element_table.is_none() {
            self.build_element_table()?;
        }
        let table = self
            .element_table
            .as_ref()
            .ok_or_else(|| MeshError::not_found("节点-单元表", "未构建"))?;
        let geodesic = self.config.geodesic_distances;

        let sizes = self
            .elements
            .iter()
            .map(|e| e.element_size(&self.nodes, geodesic))
            .collect::<MeshResult<Vec<f64>>>()?;

        (0..self.nodes.len())
            .map(|n| {
                let list = table.element_list(n)?;
                if list.is_empty() {
                    return Ok(0.0);
                }
                Ok(list.iter().map(|&e| sizes[e]).sum::<f64>() / list.len() as f64)
            })
            .collect()
    }

    /// 每条共享边的正交性
    pub fn orthogonality(&mut self) -> MeshResult<Vec<Orthogonality>> {
        self.ensure_face_table()?;
        let centroids = self.centroids()?;
        let faces = self
            .face_table
            .as_ref()
            .ok_or_else(|| MeshError::not_found("边表", "未构建"))?;

        faces
            .interior_faces()
            .map(|f| {
                let p1 = self.node(f.node1)?.position();
                let p2 = self.node(f.node2)?.position();
                let c1 = centroids[f.element1];
                let c2 = f.element2.map_or(c1, |e| centroids[e]);

                let (ex, ey) = (p2.x - p1.x, p2.y - p1.y);
                let (cx, cy) = (c2.x - c1.x, c2.y - c1.y);
                let denom = ex.hypot(ey) * cx.hypot(cy);
                let value = if denom > 0.0 {
                    ((ex * cx + ey * cy) / denom).abs()
                } else {
                    0.0
                };
                Ok(Orthogonality {
                    value,
                    midpoint: p1.midpoint(&p2),
                })
            })
            .collect()
    }

    // ============================================================
    // 投影
    // ============================================================

    /// 声明坐标系，不改变坐标
    pub fn define_projection(&mut self, epsg: u32, is_geographic: bool) {
        self.projection = ProjectionDescriptor { epsg, is_geographic };
    }

    #[inline]
    pub fn projection(&self) -> ProjectionDescriptor {
        self.projection
    }

    #[inline]
    pub fn is_geographic(&self) -> bool {
        self.projection.is_geographic
    }

    /// 用外部投影引擎重投影全部节点
    ///
    /// 失败时网格保持不变。
    pub fn reproject(&mut self, engine: &dyn ProjectionEngine, epsg: u32) -> MeshResult<()> {
        let (points, is_geographic) =
            engine.transform(self.projection.epsg, epsg, &self.positions())?;
        if points.len() != self.nodes.len() {
            return Err(MeshError::size_mismatch("投影结果", self.nodes.len(), points.len()));
        }
        log::debug!("重投影 EPSG:{} -> EPSG:{}", self.projection.epsg, epsg);
        self.set_positions(&points);
        self.projection = ProjectionDescriptor { epsg, is_geographic };
        Ok(())
    }

    /// CPP 正投影，投影后为平面坐标
    pub fn cpp(&mut self, lambda0: f64, phi0: f64) {
        let points = projection::cpp(lambda0, phi0, &self.positions());
        self.set_positions(&points);
        self.projection.is_geographic = false;
    }

    /// CPP 逆投影，还原为经纬度
    pub fn inverse_cpp(&mut self, lambda0: f64, phi0: f64) {
        let points = projection::inverse_cpp(lambda0, phi0, &self.positions());
        self.set_positions(&points);
        self.projection.is_geographic = true;
    }

    fn set_positions(&mut self, points: &[Point2D]) {
        for (n, p) in self.nodes.iter_mut().zip(points) {
            n.x = p.x;
            n.y = p.y;
        }
        self.node_tree.invalidate();
        self.element_tree.invalidate();
        self.hash = None;
    }

    // ============================================================
    // 内容哈希
    // ============================================================

    #[inline]
    pub fn hash_type(&self) -> HashType {
        self.config.hash_type
    }

    /// 设置哈希算法，丢弃缓存
    pub fn set_hash_type(&mut self, hash_type: HashType) {
        self.config.hash_type = hash_type;
        self.hash = None;
    }

    /// 网格哈希
    ///
    /// 依次摘要全部节点、单元、开边界、陆边界的哈希。
    /// 结果被缓存：修改网格后不传 `force` 会得到修改前的值。
    pub fn hash(&mut self, force: bool) -> MeshResult<String> {
        if let (Some(h), false) = (&self.hash, force) {
            return Ok(h.clone());
        }
        let h = self.compute_hash()?;
        self.hash = Some(h.clone());
        Ok(h)
    }

    fn compute_hash(&self) -> MeshResult<String> {
        let ht = self.config.hash_type;
        let mut h = Hasher::new(ht);
        for n in &self.nodes {
            h.update(n.hash(ht));
        }
        for e in &self.elements {
            h.update(e.hash(&self.nodes, ht)?);
        }
        for b in self.open_boundaries.iter().chain(&self.land_boundaries) {
            h.update(b.hash(&self.nodes, ht)?);
        }
        Ok(h.finalize())
    }

    /// 单个节点的哈希
    pub fn node_hash(&self, index: usize) -> MeshResult<String> {
        Ok(self.node(index)?.hash(self.config.hash_type))
    }

    /// 单个单元的哈希
    pub fn element_hash(&self, index: usize) -> MeshResult<String> {
        self.element(index)?.hash(&self.nodes, self.config.hash_type)
    }

    pub fn open_boundary_hash(&self, index: usize) -> MeshResult<String> {
        self.open_boundary(index)?.hash(&self.nodes, self.config.hash_type)
    }

    pub fn land_boundary_hash(&self, index: usize) -> MeshResult<String> {
        self.land_boundary(index)?.hash(&self.nodes, self.config.hash_type)
    }
}

/// 替换时返回被替换的记录
fn place<T>(items: &mut Vec<T>, index: usize, item: T, what: &'static str) -> MeshResult<Option<T>> {
    match index.cmp(&items.len()) {
        std::cmp::Ordering::Less => Ok(Some(std::mem::replace(&mut items[index], item))),
        std::cmp::Ordering::Equal => {
            items.push(item);
            Ok(None)
        }
        std::cmp::Ordering::Greater => Err(MeshError::out_of_bounds(what, index, items.len())),
    }
}

fn take<T>(items: &mut Vec<T>, index: usize, what: &'static str) -> MeshResult<T> {
    if index >= items.len() {
        return Err(MeshError::out_of_bounds(what, index, items.len()));
    }
    Ok(items.remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use adc_geo::BuiltinProjection;

    /// 单位正方形剖分为两个三角形：
    ///
    /// ```text
    /// 4---3
    /// | \ |
    /// 1---2
    /// ```
    fn square() -> Mesh {
        let nodes = vec![
            Node::new(1, 0.0, 0.0, 1.0),
            Node::new(2, 1.0, 0.0, 2.0),
            Node::new(3, 1.0, 1.0, 3.0),
            Node::new(4, 0.0, 1.0, 4.0),
        ];
        let elements = vec![Element::triangle(1, 0, 1, 3), Element::triangle(2, 1, 2, 3)];
        Mesh::from_parts("square", nodes, elements, Vec::new(), Vec::new()).unwrap()
    }

    #[test]
    fn test_from_parts_rejects_bad_reference() {
        let nodes = vec![Node::new(1, 0.0, 0.0, 0.0)];
        let elements = vec![Element::triangle(1, 0, 1, 2)];
        let err = Mesh::from_parts("", nodes, elements, Vec::new(), Vec::new()).unwrap_err();
        assert!(matches!(err, MeshError::OutOfBounds { .. }));
    }

    #[test]
    fn test_add_node_bounds() {
        let mut mesh = square();
        assert!(mesh.add_node(10, Node::new(5, 2.0, 2.0, 0.0)).is_err());
        mesh.add_node(4, Node::new(5, 2.0, 2.0, 0.0)).unwrap();
        assert_eq!(mesh.num_nodes(), 5);
        mesh.add_node(0, Node::new(1, -1.0, 0.0, 0.0)).unwrap();
        assert_eq!(mesh.num_nodes(), 5);
        assert_eq!(mesh.node(0).unwrap().x, -1.0);
    }

    #[test]
    fn test_delete_node_flips_ordering() {
        let mut mesh = square();
        assert!(mesh.node_ordering_is_logical());
        let removed = mesh.delete_node(1).unwrap();
        assert_eq!(removed.id, 2);
        assert!(!mesh.node_ordering_is_logical());
        assert_eq!(mesh.node_index_by_id(4).unwrap(), 2);
        assert!(mesh.node_by_id(2).unwrap_err().is_not_found());
        // 单元下标未重映射
        assert!(mesh.validate_references().is_err());
        assert!(mesh.delete_node(9).is_err());
    }

    #[test]
    fn test_resize() {
        let mut mesh = square();
        mesh.resize(6, 1, 2, 3);
        assert_eq!(mesh.num_nodes(), 6);
        assert_eq!(mesh.num_elements(), 1);
        assert_eq!(mesh.num_open_boundaries(), 2);
        assert_eq!(mesh.num_land_boundaries(), 3);
        // 不重新解析标识
        assert!(mesh.node_ordering_is_logical());
    }

    #[test]
    fn test_resize_placeholder_element() {
        let mut mesh = Mesh::new();
        mesh.resize(0, 1, 0, 0);
        assert_eq!(mesh.element(0).unwrap().nodes(), &[0, 0, 0]);
        let err = mesh.validate_references().unwrap_err();
        assert!(
            matches!(err, MeshError::OutOfBounds { what: "单元节点", index: 0, len: 0 }),
            "{err}"
        );
        assert!(mesh.hash(true).is_err());

        mesh.add_node(0, Node::new(1, 0.0, 0.0, 0.0)).unwrap();
        mesh.validate_references().unwrap();
    }

    #[test]
    fn test_replace_keeps_resolver_current() {
        let mut mesh = square();
        mesh.add_node(1, Node::new(20, 1.0, 0.0, 2.0)).unwrap();
        assert!(!mesh.node_ordering_is_logical());
        assert_eq!(mesh.node_index_by_id(20).unwrap(), 1);
        assert!(mesh.node_by_id(2).unwrap_err().is_not_found());

        mesh.add_node(1, Node::new(2, 1.0, 0.0, 2.0)).unwrap();
        assert!(mesh.node_ordering_is_logical());
        assert_eq!(mesh.node_index_by_id(2).unwrap(), 1);
        assert!(mesh.node_by_id(20).unwrap_err().is_not_found());

        mesh.add_element(2, Element::triangle(7, 0, 1, 2)).unwrap();
        assert!(!mesh.element_ordering_is_logical());
        assert_eq!(mesh.element_index_by_id(7).unwrap(), 2);
        mesh.delete_element(2).unwrap();
        assert!(mesh.element_ordering_is_logical());
    }

    #[test]
    fn test_extent_and_views() {
        let mesh = square();
        let e = mesh.extent().unwrap();
        assert_eq!((e.xmin, e.xmax, e.zmin, e.zmax), (0.0, 1.0, 1.0, 4.0));
        assert_eq!(mesh.z(), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(mesh.connectivity().unwrap(), vec![vec![1, 2, 4], vec![2, 3, 4]]);
        assert_eq!(mesh.max_nodes_per_element(), 3);
        assert!(Mesh::new().extent().is_err());
    }

    #[test]
    fn test_set_z() {
        let mut mesh = square();
        assert!(matches!(mesh.set_z(&[1.0]), Err(MeshError::SizeMismatch { .. })));
        mesh.set_z(&[0.0; 4]).unwrap();
        assert_eq!(mesh.z(), vec![0.0; 4]);
    }

    #[test]
    fn test_find_element_and_interpolate() {
        let mut mesh = square();
        assert_eq!(mesh.find_element(0.2, 0.2).unwrap(), 0);
        assert_eq!(mesh.find_element(0.9, 0.8).unwrap(), 1);
        assert!(mesh.find_element(5.0, 5.0).unwrap_err().is_not_found());

        // 线性场 f = x + 2y 被精确插值
        let values: Vec<f64> = mesh.nodes().iter().map(|n| n.x + 2.0 * n.y).collect();
        let v = mesh.interpolate(0.3, 0.6, &values).unwrap();
        assert!((v - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_raster_stencils() {
        let mut mesh = square();
        let pts = [Point2D::new(0.5, 0.25), Point2D::new(-1.0, 0.0)];
        let stencils = mesh.raster_stencils(&pts).unwrap();
        assert!(stencils[0].is_some());
        assert!(stencils[1].is_none());
    }

    #[test]
    fn test_mesh_size_and_boundary_nodes() {
        let mut mesh = square();
        let sizes = mesh.compute_mesh_size().unwrap();
        let tri = (1.0 + 1.0 + 2f64.sqrt()) / 3.0;
        assert!((sizes[0] - tri).abs() < 1e-12);
        assert!((sizes[1] - tri).abs() < 1e-12);
        assert_eq!(mesh.boundary_nodes().unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_orthogonality() {
        let mut mesh = square();
        let ortho = mesh.orthogonality().unwrap();
        assert_eq!(ortho.len(), 1);
        // 对角线与中心连线正交
        assert!(ortho[0].value < 1e-12);
        assert_eq!(ortho[0].midpoint, Point2D::new(0.5, 0.5));
    }

    #[test]
    fn test_reproject_invalidates_indexes() {
        let mut mesh = square();
        mesh.build_nodal_search_tree();
        mesh.build_elemental_search_tree().unwrap();
        let before = mesh.hash(false).unwrap();

        mesh.reproject(&BuiltinProjection, 3857).unwrap();
        assert!(!mesh.is_geographic());
        assert_eq!(mesh.projection().epsg, 3857);
        assert!(!mesh.nodal_search_tree_initialized());
        assert!(!mesh.elemental_search_tree_initialized());
        assert_ne!(before, mesh.hash(false).unwrap());

        assert!(mesh.reproject(&BuiltinProjection, 32615).is_err());
        assert_eq!(mesh.projection().epsg, 3857);
    }

    #[test]
    fn test_cpp_roundtrip() {
        let mut mesh = square();
        let x0 = mesh.x();
        mesh.cpp(0.5, 0.5);
        assert!(!mesh.is_geographic());
        mesh.inverse_cpp(0.5, 0.5);
        for (a, b) in x0.iter().zip(mesh.x()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_contains() {
        let mesh = square();
        assert_eq!(mesh.contains_node(&Node::new(99, 1.0, 1.0, 3.0)), Some(2));
        assert_eq!(mesh.contains_node(&Node::new(3, 1.0, 1.0, 0.0)), None);
        assert_eq!(mesh.contains_element(&Element::triangle(0, 1, 2, 3)), Some(1));
    }
}
