// crates/adc_mesh/src/io/mod.rs

//! 网格 IO 模块
//!
//! - ADCIRC ASCII (.14, .grd)
//! - SMS 2dm (.2dm)
//! - 网格化网络 (.nc)：内存数组与网格互转；文件读写需启用 `netcdf` 特性
//!
//! 读取为单遍流式解析，任何格式错误都会中止读取并返回带行号的
//! [`MeshError::FormatError`]，不会返回部分网格。

pub mod adcirc;
pub mod network;
pub mod sms2dm;

use crate::config::MeshConfig;
use crate::error::{MeshError, MeshResult};
use crate::mesh::Mesh;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

pub use adcirc::{AdcircReader, AdcircWriter};
pub use network::GriddedNetwork;
pub use sms2dm::{Sms2dmReader, Sms2dmWriter};

/// 网格文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Adcirc,
    Sms2dm,
    GriddedNetwork,
    Unknown,
}

impl MeshFormat {
    /// 按扩展名判断格式
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("14" | "grd") => Self::Adcirc,
            Some("2dm") => Self::Sms2dm,
            Some("nc") => Self::GriddedNetwork,
            _ => Self::Unknown,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Adcirc => "adcirc",
            Self::Sms2dm => "2dm",
            Self::GriddedNetwork => "netcdf",
            Self::Unknown => "unknown",
        }
    }
}

impl Mesh {
    /// 按扩展名读取网格文件
    pub fn read(path: impl AsRef<Path>) -> MeshResult<Self> {
        Self::read_with_config(path, MeshConfig::default())
    }

    /// 按扩展名读取网格文件，使用指定配置
    pub fn read_with_config(path: impl AsRef<Path>, config: MeshConfig) -> MeshResult<Self> {
        let path = path.as_ref();
        let format = MeshFormat::from_path(path);
        let mut mesh = match format {
            MeshFormat::Adcirc => AdcircReader::load(path, config)?,
            MeshFormat::Sms2dm => Sms2dmReader::load(path, config)?,
            MeshFormat::GriddedNetwork => network::read_file(path, config)?,
            MeshFormat::Unknown => {
                return Err(MeshError::format(
                    format.name(),
                    path.display().to_string(),
                    0,
                    "无法由扩展名识别网格格式",
                ))
            }
        };
        mesh.set_filename(path);
        log::debug!(
            "读取网格 {}: {} 节点, {} 单元",
            path.display(),
            mesh.num_nodes(),
            mesh.num_elements()
        );
        Ok(mesh)
    }

    /// 从 reader 读取指定格式
    pub fn read_from<R: BufRead>(reader: R, format: MeshFormat, config: MeshConfig) -> MeshResult<Self> {
        match format {
            MeshFormat::Adcirc => AdcircReader::load_from_reader(reader, "<stream>", config),
            MeshFormat::Sms2dm => Sms2dmReader::load_from_reader(reader, "<stream>", config),
            MeshFormat::GriddedNetwork | MeshFormat::Unknown => Err(MeshError::format(
                format.name(),
                "<stream>",
                0,
                "该格式不支持流式读取",
            )),
        }
    }

    /// 按扩展名写出网格文件
    pub fn write(&self, path: impl AsRef<Path>) -> MeshResult<()> {
        let path = path.as_ref();
        let format = MeshFormat::from_path(path);
        match format {
            MeshFormat::GriddedNetwork => network::write_file(self, path)?,
            MeshFormat::Unknown => {
                return Err(MeshError::format(
                    format.name(),
                    path.display().to_string(),
                    0,
                    "无法由扩展名识别网格格式",
                ))
            }
            _ => {
                let mut w = BufWriter::new(File::create(path)?);
                self.write_to(&mut w, format)?;
                w.flush()?;
            }
        }
        log::debug!("写出网格 {}", path.display());
        Ok(())
    }

    /// 以指定格式写入 writer
    pub fn write_to<W: Write>(&self, writer: &mut W, format: MeshFormat) -> MeshResult<()> {
        match format {
            MeshFormat::Adcirc => AdcircWriter::write_to(self, writer),
            MeshFormat::Sms2dm => Sms2dmWriter::write_to(self, writer),
            MeshFormat::GriddedNetwork | MeshFormat::Unknown => Err(MeshError::format(
                format.name(),
                "<stream>",
                0,
                "该格式不支持流式写出",
            )),
        }
    }
}

// ============================================================
// 行读取
// ============================================================

/// 带行号的行读取器
pub(crate) struct LineReader<R> {
    lines: std::io::Lines<R>,
    format: &'static str,
    source: String,
    line: usize,
}

/// 打开文件并创建行读取器
pub(crate) fn open_lines(path: &Path, format: &'static str) -> MeshResult<LineReader<BufReader<File>>> {
    let file = File::open(path)?;
    Ok(LineReader::new(
        BufReader::new(file),
        format,
        path.display().to_string(),
    ))
}

impl<R: BufRead> LineReader<R> {
    pub(crate) fn new(reader: R, format: &'static str, source: impl Into<String>) -> Self {
        Self {
            lines: reader.lines(),
            format,
            source: source.into(),
            line: 0,
        }
    }

    /// 下一行；文件结束返回 `None`
    pub(crate) fn try_next(&mut self) -> MeshResult<Option<String>> {
        match self.lines.next() {
            Some(line) => {
                self.line += 1;
                Ok(Some(line?))
            }
            None => Ok(None),
        }
    }

    /// 跳过空白行后的下一行；文件结束返回 `None`
    pub(crate) fn try_next_nonblank(&mut self) -> MeshResult<Option<String>> {
        while let Some(line) = self.try_next()? {
            if !line.trim().is_empty() {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }

    /// 下一行；文件结束为格式错误
    pub(crate) fn next_line(&mut self, expecting: &str) -> MeshResult<String> {
        self.try_next()?
            .ok_or_else(|| self.error(format!("意外的文件结尾，期望{expecting}")))
    }

    /// 当前位置 `来源:行号`
    pub(crate) fn location(&self) -> String {
        format!("{}:{}", self.source, self.line)
    }

    /// 当前行的格式错误
    pub(crate) fn error(&self, message: impl Into<String>) -> MeshError {
        MeshError::format(self.format, self.source.clone(), self.line, message)
    }

    /// 指定行的格式错误
    pub(crate) fn error_at(&self, line: usize, message: impl Into<String>) -> MeshError {
        MeshError::format(self.format, self.source.clone(), line, message)
    }

    /// 当前行号
    #[inline]
    pub(crate) fn line(&self) -> usize {
        self.line
    }

    /// 解析字段
    pub(crate) fn parse<T: FromStr>(&self, token: Option<&str>, what: &str) -> MeshResult<T> {
        let token = token.ok_or_else(|| self.error(format!("缺少字段 {what}")))?;
        token
            .parse()
            .map_err(|_| self.error(format!("无法解析 {what}: '{token}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_format_from_path() {
        assert_eq!(MeshFormat::from_path("fort.14"), MeshFormat::Adcirc);
        assert_eq!(MeshFormat::from_path("mesh.GRD"), MeshFormat::Adcirc);
        assert_eq!(MeshFormat::from_path("a/b/mesh.2dm"), MeshFormat::Sms2dm);
        assert_eq!(MeshFormat::from_path("net.nc"), MeshFormat::GriddedNetwork);
        assert_eq!(MeshFormat::from_path("mesh.txt"), MeshFormat::Unknown);
    }

    #[test]
    fn test_line_reader_errors_carry_line() {
        let mut r = LineReader::new(Cursor::new("1 2\nabc\n"), "adcirc", "test");
        let l = r.next_line("首行").unwrap();
        assert_eq!(l, "1 2");
        let l = r.next_line("第二行").unwrap();
        let err = r.parse::<usize>(l.split_whitespace().next(), "数量").unwrap_err();
        assert!(matches!(err, MeshError::FormatError { line: 2, .. }));
        assert!(r.next_line("第三行").is_err());
        assert!(r.try_next().unwrap().is_none());
    }

    #[test]
    fn test_unknown_extension() {
        let err = Mesh::read("mesh.unknown").unwrap_err();
        assert!(matches!(err, MeshError::FormatError { .. }));
    }
}
