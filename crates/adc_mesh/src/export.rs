// crates/adc_mesh/src/export.rs

//! 导出接口
//!
//! 矢量导出（点 + 属性记录）和栅格导出（逐像素插值模板）只定义接口，
//! 具体的 GIS 格式由调用方实现。这里附带两个文本实现，便于命令行和测试使用。

use crate::error::{MeshError, MeshResult};
use crate::locator::Stencil;
use crate::mesh::Mesh;
use adc_geo::Point2D;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

/// 属性值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
        }
    }
}

/// 一个要素的属性记录，字段按插入顺序保存
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeRecord {
    fields: Vec<(String, AttributeValue)>,
}

impl AttributeRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加字段
    pub fn with(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.fields.push((name.into(), value));
        self
    }

    #[inline]
    pub fn fields(&self) -> &[(String, AttributeValue)] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// 矢量（点要素）导出
pub trait VectorExport {
    /// 写出点与对应属性，两者长度必须一致
    fn write(&mut self, points: &[Point2D], records: &[AttributeRecord]) -> MeshResult<()>;
}

/// 栅格导出，接收每个像素中心的插值模板（网格外为 `None`）
pub trait RasterExport {
    fn write(&mut self, stencils: &[Option<Stencil>]) -> MeshResult<()>;
}

// ============================================================
// 文本实现
// ============================================================

/// 以分隔文本写出点要素，表头取自第一条记录
pub struct DelimitedPointWriter<W: Write> {
    inner: W,
    delimiter: char,
}

impl<W: Write> DelimitedPointWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            delimiter: ',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> VectorExport for DelimitedPointWriter<W> {
    fn write(&mut self, points: &[Point2D], records: &[AttributeRecord]) -> MeshResult<()> {
        if points.len() != records.len() {
            return Err(MeshError::size_mismatch("records", points.len(), records.len()));
        }
        let d = self.delimiter;

        let mut header = format!("x{d}y");
        if let Some(first) = records.first() {
            for (name, _) in first.fields() {
                header.push(d);
                header.push_str(name);
            }
        }
        writeln!(self.inner, "{header}")?;

        for (p, record) in points.iter().zip(records) {
            let mut line = format!("{}{d}{}", p.x, p.y);
            for (_, value) in record.fields() {
                line.push(d);
                line.push_str(&value.to_string());
            }
            writeln!(self.inner, "{line}")?;
        }
        self.inner.flush()?;
        Ok(())
    }
}

/// 逐行写出插值模板：`像素 单元 (节点 权重)...`，网格外像素单元为 -1
pub struct StencilTableWriter<W: Write> {
    inner: W,
}

impl<W: Write> StencilTableWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> RasterExport for StencilTableWriter<W> {
    fn write(&mut self, stencils: &[Option<Stencil>]) -> MeshResult<()> {
        for (i, stencil) in stencils.iter().enumerate() {
            match stencil {
                Some(s) => {
                    write!(self.inner, "{i} {}", s.element)?;
                    for (n, w) in s.nodes.iter().zip(&s.weights) {
                        write!(self.inner, " {n} {w:.10}")?;
                    }
                    writeln!(self.inner)?;
                }
                None => writeln!(self.inner, "{i} -1")?,
            }
        }
        self.inner.flush()?;
        Ok(())
    }
}

// ============================================================
// 网格导出
// ============================================================

impl Mesh {
    /// 导出全部节点，属性为 `id`、`z`
    pub fn export_nodes(&self, exporter: &mut dyn VectorExport) -> MeshResult<()> {
        let points: Vec<Point2D> = self.nodes().iter().map(|n| n.position()).collect();
        let records: Vec<AttributeRecord> = self
            .nodes()
            .iter()
            .map(|n| {
                AttributeRecord::new()
                    .with("id", AttributeValue::Int(n.id as i64))
                    .with("z", AttributeValue::Float(n.z))
            })
            .collect();
        log::debug!("导出 {} 个节点", points.len());
        exporter.write(&points, &records)
    }

    /// 导出开边界与陆地边界上的节点
    ///
    /// 属性为 `id`、`boundary`（开边界与陆地边界连续编号）、`code`。
    pub fn export_boundary_nodes(&self, exporter: &mut dyn VectorExport) -> MeshResult<()> {
        let mut points = Vec::new();
        let mut records = Vec::new();

        let boundaries = self.open_boundaries().iter().chain(self.land_boundaries());
        for (b, boundary) in boundaries.enumerate() {
            for index in boundary.node_indices() {
                let node = self.node(index)?;
                points.push(node.position());
                records.push(
                    AttributeRecord::new()
                        .with("id", AttributeValue::Int(node.id as i64))
                        .with("boundary", AttributeValue::Int(b as i64))
                        .with("code", AttributeValue::Int(i64::from(boundary.code()))),
                );
            }
        }
        log::debug!("导出 {} 个边界节点", points.len());
        exporter.write(&points, &records)
    }

    /// 计算像素中心的插值模板并交给栅格导出
    pub fn export_stencils(
        &mut self,
        points: &[Point2D],
        exporter: &mut dyn RasterExport,
    ) -> MeshResult<()> {
        let stencils = self.raster_stencils(points)?;
        exporter.write(&stencils)
    }
}
