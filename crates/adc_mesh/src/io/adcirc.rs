// crates/adc_mesh/src/io/adcirc.rs

//! ADCIRC ASCII 网格读写 (fort.14)
//!
//! ```text
//! 标题行
//! <单元数> <节点数>
//! <id> <x> <y> <z>                       × 节点数
//! <id> <顶点数> <v1> <v2> <v3> [<v4>]     × 单元数
//! <开边界数>
//! <开边界节点总数>
//! <长度>, 随后每行一个节点             × 开边界数
//! <陆边界数>
//! <陆边界成员总数>
//! <长度> <类型码>, 随后每成员一行       × 陆边界数
//! ```
//!
//! 陆边界成员行随类型码变化：普通节点只有节点标识；外堰加堰顶高程和超临界系数；
//! 内堰为两个节点、堰顶高程、亚/超临界系数；带管道内堰再加管道高度、系数、直径。
//! 行尾多余字段（通常是注释）被忽略。

use super::{open_lines, LineReader};
use crate::boundary::{
    Boundary, BoundaryKind, BoundaryRecords, ExternalWeirNode, InternalWeirPair, PipedWeirPair,
};
use crate::config::MeshConfig;
use crate::element::Element;
use crate::error::{MeshError, MeshResult};
use crate::mesh::{Mesh, MeshParts};
use crate::node::Node;
use crate::resolver::IdResolver;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

const FORMAT: &str = "adcirc";

/// 按文件声明的数量预分配的上限，超出部分随读取增长
const MAX_PREALLOC: usize = 1 << 20;

/// ADCIRC 网格读取器
pub struct AdcircReader;

impl AdcircReader {
    /// 读取文件
    pub fn load(path: impl AsRef<Path>, config: MeshConfig) -> MeshResult<Mesh> {
        Self::parse(open_lines(path.as_ref(), FORMAT)?, config)
    }

    /// 从 reader 读取，`source` 用于错误信息
    pub fn load_from_reader<R: BufRead>(reader: R, source: &str, config: MeshConfig) -> MeshResult<Mesh> {
        Self::parse(LineReader::new(reader, FORMAT, source), config)
    }

    fn parse<R: BufRead>(mut r: LineReader<R>, config: MeshConfig) -> MeshResult<Mesh> {
        let header = r.next_line("网格标题")?.trim_end().to_string();

        let line = r.next_line("单元数与节点数")?;
        let mut t = line.split_whitespace();
        let n_elements: usize = r.parse(t.next(), "单元数")?;
        let n_nodes: usize = r.parse(t.next(), "节点数")?;

        let (nodes, node_resolver) = Self::read_nodes(&mut r, n_nodes)?;
        let (elements, element_resolver) =
            Self::read_elements(&mut r, n_elements, &nodes, &node_resolver)?;

        let mut open_boundaries = Vec::new();
        let mut land_boundaries = Vec::new();

        // 边界段可以整体缺省，末尾空行不算
        if let Some(line) = r.try_next_nonblank()? {
            let n_open: usize = r.parse(line.split_whitespace().next(), "开边界数")?;
            let line = r.next_line("开边界节点总数")?;
            let total_open: usize = r.parse(line.split_whitespace().next(), "开边界节点总数")?;
            for _ in 0..n_open {
                open_boundaries.push(Self::read_open_boundary(&mut r, &nodes, &node_resolver)?);
            }
            check_total(&r, "开边界", total_open, &open_boundaries);

            if let Some(line) = r.try_next_nonblank()? {
                let n_land: usize = r.parse(line.split_whitespace().next(), "陆边界数")?;
                let line = r.next_line("陆边界成员总数")?;
                let total_land: usize =
                    r.parse(line.split_whitespace().next(), "陆边界成员总数")?;
                for _ in 0..n_land {
                    land_boundaries.push(Self::read_land_boundary(&mut r, &nodes, &node_resolver)?);
                }
                check_total(&r, "陆边界", total_land, &land_boundaries);
            }
        }

        Ok(Mesh::from_loaded(
            MeshParts {
                header,
                nodes,
                elements,
                open_boundaries,
                land_boundaries,
                node_resolver,
                element_resolver,
            },
            config,
        ))
    }

    fn read_nodes<R: BufRead>(r: &mut LineReader<R>, n: usize) -> MeshResult<(Vec<Node>, IdResolver)> {
        let mut nodes = Vec::with_capacity(n.min(MAX_PREALLOC));
        let mut resolver = IdResolver::new("节点");
        for i in 0..n {
            let line = r.next_line("节点行")?;
            let mut t = line.split_whitespace();
            let id: usize = r.parse(t.next(), "节点标识")?;
            let x: f64 = r.parse(t.next(), "x")?;
            let y: f64 = r.parse(t.next(), "y")?;
            let z: f64 = r.parse(t.next(), "z")?;
            resolver.observe(i, id);
            nodes.push(Node::new(id, x, y, z));
        }
        resolver.finish(nodes.iter().map(|n| n.id));
        Ok((nodes, resolver))
    }

    fn read_elements<R: BufRead>(
        r: &mut LineReader<R>,
        n: usize,
        nodes: &[Node],
        node_resolver: &IdResolver,
    ) -> MeshResult<(Vec<Element>, IdResolver)> {
        let mut elements = Vec::with_capacity(n.min(MAX_PREALLOC));
        let mut resolver = IdResolver::new("单元");
        for i in 0..n {
            let line = r.next_line("单元行")?;
            let mut t = line.split_whitespace();
            let id: usize = r.parse(t.next(), "单元标识")?;
            let nv: usize = r.parse(t.next(), "顶点数")?;
            if nv != 3 && nv != 4 {
                return Err(MeshError::unsupported_geometry(format!(
                    "{}: 单元 {id} 顶点数 {nv}",
                    r.location()
                )));
            }
            let mut vertices = Vec::with_capacity(nv);
            for _ in 0..nv {
                let label: usize = r.parse(t.next(), "单元顶点")?;
                vertices.push(resolve(r, node_resolver, nodes, label)?);
            }
            resolver.observe(i, id);
            elements.push(Element::new(id, vertices)?);
        }
        resolver.finish(elements.iter().map(|e| e.id));
        Ok((elements, resolver))
    }

    fn read_open_boundary<R: BufRead>(
        r: &mut LineReader<R>,
        nodes: &[Node],
        resolver: &IdResolver,
    ) -> MeshResult<Boundary> {
        let line = r.next_line("开边界长度")?;
        let length: usize = r.parse(line.split_whitespace().next(), "开边界长度")?;
        let mut members = Vec::with_capacity(length.min(MAX_PREALLOC));
        for _ in 0..length {
            let line = r.next_line("开边界节点")?;
            let label: usize = r.parse(line.split_whitespace().next(), "开边界节点")?;
            members.push(resolve(r, resolver, nodes, label)?);
        }
        Ok(Boundary::open(members))
    }

    fn read_land_boundary<R: BufRead>(
        r: &mut LineReader<R>,
        nodes: &[Node],
        resolver: &IdResolver,
    ) -> MeshResult<Boundary> {
        let line = r.next_line("陆边界长度与类型码")?;
        let mut t = line.split_whitespace();
        let length: usize = r.parse(t.next(), "陆边界长度")?;
        let code: i32 = r.parse(t.next(), "陆边界类型码")?;
        let kind = BoundaryKind::from_code(code);

        let records = match kind {
            BoundaryKind::Open | BoundaryKind::SingleNode => {
                let mut v = Vec::with_capacity(length.min(MAX_PREALLOC));
                for _ in 0..length {
                    let line = r.next_line("陆边界节点")?;
                    let label: usize = r.parse(line.split_whitespace().next(), "陆边界节点")?;
                    v.push(resolve(r, resolver, nodes, label)?);
                }
                if kind == BoundaryKind::Open {
                    BoundaryRecords::Open(v)
                } else {
                    BoundaryRecords::SingleNode(v)
                }
            }
            BoundaryKind::ExternalWeir => {
                let mut v = Vec::with_capacity(length.min(MAX_PREALLOC));
                for _ in 0..length {
                    let line = r.next_line("外堰成员")?;
                    let mut t = line.split_whitespace();
                    let label: usize = r.parse(t.next(), "外堰节点")?;
                    v.push(ExternalWeirNode {
                        node: resolve(r, resolver, nodes, label)?,
                        crest_elevation: r.parse(t.next(), "堰顶高程")?,
                        supercritical_coefficient: r.parse(t.next(), "超临界系数")?,
                    });
                }
                BoundaryRecords::ExternalWeir(v)
            }
            BoundaryKind::InternalWeir => {
                let mut v = Vec::with_capacity(length.min(MAX_PREALLOC));
                for _ in 0..length {
                    let line = r.next_line("内堰成员")?;
                    let mut t = line.split_whitespace();
                    v.push(read_weir_pair(r, &mut t, resolver, nodes)?);
                }
                BoundaryRecords::InternalWeir(v)
            }
            BoundaryKind::InternalWeirWithPipes => {
                let mut v = Vec::with_capacity(length.min(MAX_PREALLOC));
                for _ in 0..length {
                    let line = r.next_line("带管道内堰成员")?;
                    let mut t = line.split_whitespace();
                    let weir = read_weir_pair(r, &mut t, resolver, nodes)?;
                    v.push(PipedWeirPair {
                        weir,
                        pipe_height: r.parse(t.next(), "管道高度")?,
                        pipe_coefficient: r.parse(t.next(), "管道系数")?,
                        pipe_diameter: r.parse(t.next(), "管道直径")?,
                    });
                }
                BoundaryRecords::InternalWeirWithPipes(v)
            }
        };
        Boundary::with_records(code, records)
    }
}

/// 把节点标识解析为下标，失败时报告所在行
fn resolve<R: BufRead>(
    r: &LineReader<R>,
    resolver: &IdResolver,
    nodes: &[Node],
    label: usize,
) -> MeshResult<usize> {
    resolver
        .index_of(label, nodes.len())
        .map_err(|_| r.error(format!("引用不存在的节点 {label}")))
}

fn read_weir_pair<'a, R: BufRead>(
    r: &LineReader<R>,
    t: &mut impl Iterator<Item = &'a str>,
    resolver: &IdResolver,
    nodes: &[Node],
) -> MeshResult<InternalWeirPair> {
    let n1: usize = r.parse(t.next(), "内堰节点1")?;
    let n2: usize = r.parse(t.next(), "内堰节点2")?;
    Ok(InternalWeirPair {
        node1: resolve(r, resolver, nodes, n1)?,
        node2: resolve(r, resolver, nodes, n2)?,
        crest_elevation: r.parse(t.next(), "堰顶高程")?,
        subcritical_coefficient: r.parse(t.next(), "亚临界系数")?,
        supercritical_coefficient: r.parse(t.next(), "超临界系数")?,
    })
}

fn check_total<R: BufRead>(r: &LineReader<R>, what: &str, expected: usize, boundaries: &[Boundary]) {
    let actual: usize = boundaries.iter().map(Boundary::length).sum();
    if actual != expected {
        log::warn!(
            "{}: {what}成员总数声明为 {expected}, 实际 {actual}",
            r.location()
        );
    }
}

/// ADCIRC 网格写出器
pub struct AdcircWriter;

impl AdcircWriter {
    /// 写出文件
    pub fn write(mesh: &Mesh, path: impl AsRef<Path>) -> MeshResult<()> {
        let mut w = BufWriter::new(File::create(path.as_ref())?);
        Self::write_to(mesh, &mut w)?;
        w.flush()?;
        Ok(())
    }

    /// 写入 writer
    ///
    /// 地理坐标网格的节点坐标写 10 位小数，投影坐标写 4 位。
    pub fn write_to<W: Write>(mesh: &Mesh, w: &mut W) -> MeshResult<()> {
        let nodes = mesh.nodes();
        writeln!(w, "{}", mesh.header())?;
        writeln!(w, "{:11} {:11}", mesh.num_elements(), mesh.num_nodes())?;

        let geographic = mesh.is_geographic();
        for n in nodes {
            writeln!(w, "{}", n.to_adcirc_line(geographic))?;
        }
        for e in mesh.elements() {
            writeln!(w, "{}", e.to_adcirc_line(nodes)?)?;
        }

        writeln!(w, "{:11}", mesh.num_open_boundaries())?;
        writeln!(w, "{:11}", mesh.total_open_boundary_nodes())?;
        for b in mesh.open_boundaries() {
            for line in b.to_adcirc_lines(nodes)? {
                writeln!(w, "{line}")?;
            }
        }

        writeln!(w, "{:11}", mesh.num_land_boundaries())?;
        writeln!(w, "{:11}", mesh.total_land_boundary_nodes())?;
        for b in mesh.land_boundaries() {
            for line in b.to_adcirc_lines(nodes)? {
                writeln!(w, "{line}")?;
            }
        }
        Ok(())
    }
}
