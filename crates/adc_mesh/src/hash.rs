// crates/adc_mesh/src/hash.rs
//! 内容哈希
//!
//! 无状态摘要函数：输入一组字节串，输出小写十六进制摘要。
//! 哈希仅用于相等判断与变更检测，不用于安全场景。
//!
//! 数值先格式化为定宽定精度文本再参与摘要，
//! 因此同一网格在不同平台上得到相同结果。

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::str::FromStr;

/// 摘要算法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashType {
    /// MD5（默认）
    #[default]
    Md5,
    /// SHA-1
    Sha1,
    /// SHA-256
    Sha256,
}

impl HashType {
    /// 算法名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }
}

impl FromStr for HashType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            other => Err(format!("未知的哈希类型: {other}")),
        }
    }
}

/// 增量摘要器
///
/// 按顺序吸收字节串，`finalize` 输出十六进制摘要。
#[derive(Clone)]
pub enum Hasher {
    Md5(Md5),
    Sha1(Sha1),
    Sha256(Sha256),
}

impl Hasher {
    /// 创建摘要器
    pub fn new(hash_type: HashType) -> Self {
        match hash_type {
            HashType::Md5 => Self::Md5(Md5::new()),
            HashType::Sha1 => Self::Sha1(Sha1::new()),
            HashType::Sha256 => Self::Sha256(Sha256::new()),
        }
    }

    /// 吸收一段数据
    pub fn update(&mut self, data: impl AsRef<[u8]>) {
        match self {
            Self::Md5(h) => h.update(data),
            Self::Sha1(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
        }
    }

    /// 结束并输出小写十六进制摘要
    pub fn finalize(self) -> String {
        match self {
            Self::Md5(h) => to_hex(&h.finalize()),
            Self::Sha1(h) => to_hex(&h.finalize()),
            Self::Sha256(h) => to_hex(&h.finalize()),
        }
    }
}

fn to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// 对一组字节串做顺序摘要
///
/// ```
/// use adc_mesh::hash::{digest, HashType};
///
/// let h = digest(HashType::Md5, ["a", "b"]);
/// assert_eq!(h, digest(HashType::Md5, ["ab"]));
/// assert_eq!(h.len(), 32);
/// ```
pub fn digest<I, B>(hash_type: HashType, parts: I) -> String
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    let mut hasher = Hasher::new(hash_type);
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize()
}

// ============================================================
// 定精度格式
// ============================================================

/// 坐标/高程：宽 16，小数 10 位
#[inline]
pub fn fmt_coordinate(v: f64) -> String {
    format!("{v:16.10}")
}

/// 系数/堰顶高程：宽 6，小数 3 位
#[inline]
pub fn fmt_coefficient(v: f64) -> String {
    format!("{v:6.3}")
}

/// 边界类型码：至少 3 位数字，补零
#[inline]
pub fn fmt_code(code: i32) -> String {
    if code < 0 {
        format!("-{:03}", code.unsigned_abs())
    } else {
        format!("{code:03}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digests() {
        assert_eq!(digest(HashType::Md5, [""]), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(
            digest(HashType::Sha1, ["abc"]),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            digest(HashType::Sha256, ["abc"]),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_sequential_is_concatenation() {
        let parts = ["node", "element", "boundary"];
        assert_eq!(
            digest(HashType::Sha256, parts),
            digest(HashType::Sha256, ["nodeelementboundary"])
        );
    }

    #[test]
    fn test_formatting() {
        assert_eq!(fmt_coordinate(1.5), "    1.5000000000");
        assert_eq!(fmt_coefficient(-0.25), "-0.250");
        assert_eq!(fmt_code(4), "004");
        assert_eq!(fmt_code(-1), "-001");
    }

    #[test]
    fn test_hash_type_parse() {
        assert_eq!("SHA256".parse::<HashType>().unwrap(), HashType::Sha256);
        assert!("crc32".parse::<HashType>().is_err());
        assert_eq!(HashType::default(), HashType::Md5);
    }
}
