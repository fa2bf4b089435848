// crates/adc_mesh/src/io/sms2dm.rs

//! SMS 2dm 网格读写
//!
//! 只处理 `MESH2D`、`MESHNAME`、`ND`、`E3T`、`E4Q` 卡片，其余卡片忽略。
//! 2dm 不携带边界条件，读入的网格没有边界。
//! 单元卡片可以出现在节点之前，节点引用在读完全部卡片后统一解析。

use super::{open_lines, LineReader};
use crate::config::MeshConfig;
use crate::element::Element;
use crate::error::MeshResult;
use crate::mesh::{Mesh, MeshParts};
use crate::node::Node;
use crate::resolver::IdResolver;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

const FORMAT: &str = "2dm";

/// 缺省网格名
const DEFAULT_NAME: &str = "Mesh";

/// 待解析的单元卡片
struct PendingElement {
    id: usize,
    labels: Vec<usize>,
    line: usize,
}

/// 2dm 读取器
pub struct Sms2dmReader;

impl Sms2dmReader {
    pub fn load(path: impl AsRef<Path>, config: MeshConfig) -> MeshResult<Mesh> {
        Self::parse(open_lines(path.as_ref(), FORMAT)?, config)
    }

    pub fn load_from_reader<R: BufRead>(reader: R, source: &str, config: MeshConfig) -> MeshResult<Mesh> {
        Self::parse(LineReader::new(reader, FORMAT, source), config)
    }

    fn parse<R: BufRead>(mut r: LineReader<R>, config: MeshConfig) -> MeshResult<Mesh> {
        let first = r.next_line("MESH2D")?;
        if first.split_whitespace().next() != Some("MESH2D") {
            return Err(r.error("首行应为 MESH2D"));
        }

        let mut header = DEFAULT_NAME.to_string();
        let mut nodes = Vec::new();
        let mut node_resolver = IdResolver::new("节点");
        let mut pending = Vec::new();

        while let Some(line) = r.try_next()? {
            let mut t = line.split_whitespace();
            match t.next() {
                Some("MESHNAME") => {
                    let name = line.trim_start()["MESHNAME".len()..].trim().replace('"', "");
                    if !name.is_empty() {
                        header = name;
                    }
                }
                Some("ND") => {
                    let id: usize = r.parse(t.next(), "节点标识")?;
                    let x: f64 = r.parse(t.next(), "x")?;
                    let y: f64 = r.parse(t.next(), "y")?;
                    let z: f64 = r.parse(t.next(), "z")?;
                    node_resolver.observe(nodes.len(), id);
                    nodes.push(Node::new(id, x, y, z));
                }
                Some(card @ ("E3T" | "E4Q")) => {
                    let nv = if card == "E3T" { 3 } else { 4 };
                    let id: usize = r.parse(t.next(), "单元标识")?;
                    let labels = (0..nv)
                        .map(|_| r.parse(t.next(), "单元顶点"))
                        .collect::<MeshResult<Vec<usize>>>()?;
                    pending.push(PendingElement {
                        id,
                        labels,
                        line: r.line(),
                    });
                }
                _ => {}
            }
        }
        node_resolver.finish(nodes.iter().map(|n| n.id));

        let mut elements = Vec::with_capacity(pending.len());
        let mut element_resolver = IdResolver::new("单元");
        for (i, p) in pending.into_iter().enumerate() {
            let vertices = p
                .labels
                .iter()
                .map(|&label| {
                    node_resolver
                        .index_of(label, nodes.len())
                        .map_err(|_| r.error_at(p.line, format!("引用不存在的节点 {label}")))
                })
                .collect::<MeshResult<Vec<usize>>>()?;
            element_resolver.observe(i, p.id);
            elements.push(Element::new(p.id, vertices)?);
        }
        element_resolver.finish(elements.iter().map(|e| e.id));

        Ok(Mesh::from_loaded(
            MeshParts {
                header,
                nodes,
                elements,
                open_boundaries: Vec::new(),
                land_boundaries: Vec::new(),
                node_resolver,
                element_resolver,
            },
            config,
        ))
    }
}

/// 2dm 写出器
///
/// 边界不写出。
pub struct Sms2dmWriter;

impl Sms2dmWriter {
    pub fn write(mesh: &Mesh, path: impl AsRef<Path>) -> MeshResult<()> {
        let mut w = BufWriter::new(File::create(path.as_ref())?);
        Self::write_to(mesh, &mut w)?;
        w.flush()?;
        Ok(())
    }

    pub fn write_to<W: Write>(mesh: &Mesh, w: &mut W) -> MeshResult<()> {
        writeln!(w, "MESH2D")?;
        writeln!(w, "MESHNAME \"{}\"", mesh.header())?;
        for e in mesh.elements() {
            writeln!(w, "{}", e.to_2dm_line(mesh.nodes())?)?;
        }
        for n in mesh.nodes() {
            writeln!(w, "{}", n.to_2dm_line())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MeshError;
    use std::io::Cursor;

    const QUAD: &str = "\
MESH2D
MESHNAME \"quad mesh\"
E4Q 1 1 2 3 4 1
E3T 2 2 5 3 1
ND 1 0.0 0.0 -1.0
ND 2 1.0 0.0 -1.0
ND 3 1.0 1.0 -1.0
ND 4 0.0 1.0 -1.0
ND 5 2.0 0.5 -2.0
NS 1 2 -5
";

    fn load(text: &str) -> MeshResult<Mesh> {
        Sms2dmReader::load_from_reader(Cursor::new(text), "test", MeshConfig::default())
    }

    #[test]
    fn test_read() {
        let mesh = load(QUAD).unwrap();
        assert_eq!(mesh.header(), "quad mesh");
        assert_eq!(mesh.num_nodes(), 5);
        assert_eq!(mesh.num_elements(), 2);
        assert_eq!(mesh.element(0).unwrap().n(), 4);
        assert_eq!(mesh.element(1).unwrap().nodes(), &[1, 4, 2]);
        assert_eq!(mesh.max_nodes_per_element(), 4);
        assert_eq!(mesh.num_open_boundaries(), 0);
    }

    #[test]
    fn test_default_name() {
        let mesh = load("MESH2D\nE3T 1 1 2 3 1\nND 1 0 0 0\nND 2 1 0 0\nND 3 0 1 0\n").unwrap();
        assert_eq!(mesh.header(), "Mesh");
    }

    #[test]
    fn test_missing_node() {
        let err = load(&QUAD.replace("E3T 2 2 5 3 1", "E3T 2 2 9 3 1")).unwrap_err();
        assert!(matches!(err, MeshError::FormatError { line: 4, .. }), "{err}");
    }

    #[test]
    fn test_not_2dm() {
        assert!(load("hello\n").is_err());
    }

    #[test]
    fn test_write_then_read() {
        let mesh = load(QUAD).unwrap();
        let mut buf = Vec::new();
        Sms2dmWriter::write_to(&mesh, &mut buf).unwrap();
        let again = load(&String::from_utf8(buf).unwrap()).unwrap();
        assert_eq!(again.header(), mesh.header());
        assert_eq!(again.nodes(), mesh.nodes());
        assert_eq!(again.elements(), mesh.elements());
    }
}
