// crates/adc_mesh/src/node.rs
//! 网格节点
//!
//! 节点标识 `id` 只是元数据；相等判断与哈希只看位置和高程。

use crate::hash::{digest, fmt_coordinate, HashType};
use adc_geo::Point2D;
use serde::{Deserialize, Serialize};

/// 网格节点
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Node {
    /// 外部标识
    pub id: usize,
    pub x: f64,
    pub y: f64,
    /// 高程（ADCIRC 约定为水深，向下为正）
    pub z: f64,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y && self.z == other.z
    }
}

impl Node {
    pub const fn new(id: usize, x: f64, y: f64, z: f64) -> Self {
        Self { id, x, y, z }
    }

    /// 平面位置
    #[inline]
    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    /// 位置与高程的哈希
    pub fn hash(&self, hash_type: HashType) -> String {
        digest(
            hash_type,
            [
                fmt_coordinate(self.x),
                fmt_coordinate(self.y),
                fmt_coordinate(self.z),
            ],
        )
    }

    /// 仅平面位置的哈希
    ///
    /// 两个仅高程不同的网格在结构上比较相等。
    pub fn position_hash(&self, hash_type: HashType) -> String {
        digest(hash_type, [fmt_coordinate(self.x), fmt_coordinate(self.y)])
    }

    /// ADCIRC 节点行
    ///
    /// 地理坐标使用 10 位小数，投影坐标使用 4 位。
    pub fn to_adcirc_line(&self, geographic: bool) -> String {
        if geographic {
            format!(
                "{:11}   {:14.10}   {:14.10}  {:14.10}",
                self.id, self.x, self.y, self.z
            )
        } else {
            format!(
                "{:11}   {:14.4}   {:14.4}  {:14.4}",
                self.id, self.x, self.y, self.z
            )
        }
    }

    /// 2dm `ND` 行
    pub fn to_2dm_line(&self) -> String {
        format!("ND {} {:14.8e} {:14.8e} {:14.8e}", self.id, self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_id() {
        let a = Node::new(1, 1.0, 2.0, 3.0);
        let b = Node::new(99, 1.0, 2.0, 3.0);
        assert_eq!(a, b);
        assert_ne!(a, Node::new(1, 1.0, 2.0, 3.5));
    }

    #[test]
    fn test_position_hash_ignores_z() {
        let a = Node::new(1, 1.0, 2.0, 3.0);
        let mut b = a;
        b.z = -10.0;
        assert_eq!(a.position_hash(HashType::Md5), b.position_hash(HashType::Md5));
        assert_ne!(a.hash(HashType::Md5), b.hash(HashType::Md5));
    }

    #[test]
    fn test_adcirc_line() {
        let n = Node::new(3, -75.5, 35.25, 4.0);
        let line = n.to_adcirc_line(true);
        let fields: Vec<&str> = line.split_whitespace().collect();
        assert_eq!(fields, ["3", "-75.5000000000", "35.2500000000", "4.0000000000"]);

        let line = n.to_adcirc_line(false);
        assert!(line.ends_with("4.0000"));
    }
}
