// crates/adc_mesh/src/lib.rs

//! ADCIRC 非结构网格引擎
//!
//! 读取、索引、查询、变换并写出海岸/海洋环流模型使用的非结构网格。
//!
//! # 核心类型
//!
//! - [`Mesh`]: 网格容器，独占节点、单元与边界存储
//! - [`Node`] / [`Element`] / [`Boundary`]: 几何记录，单元与边界只保存节点下标
//! - [`IdResolver`]: 非连续标识到存储位置的映射
//! - [`Kdtree`] / [`SearchTree`]: 节点与单元中心的最近邻索引
//! - [`ElementTable`] / [`FaceTable`]: 节点-单元表、边表与单元相邻关系
//! - [`Stencil`]: 点定位得到的单元与插值权重
//!
//! # 模块结构
//!
//! - [`io`]: ADCIRC、2dm 与网格化网络格式
//! - [`checker`]: 编号、高程、堰顶与重叠单元检查
//! - [`export`]: 矢量/栅格导出接口
//! - [`hash`]: 内容哈希
//!
//! # 示例
//!
//! ```
//! use adc_mesh::{Element, Mesh, Node};
//!
//! let nodes = vec![
//!     Node::new(1, 0.0, 0.0, 1.0),
//!     Node::new(2, 1.0, 0.0, 2.0),
//!     Node::new(3, 0.0, 1.0, 3.0),
//! ];
//! let elements = vec![Element::triangle(1, 0, 1, 2)];
//! let mut mesh = Mesh::from_parts("demo", nodes, elements, vec![], vec![]).unwrap();
//!
//! let z = mesh.z();
//! let value = mesh.interpolate(0.25, 0.25, &z).unwrap();
//! assert!((value - 1.75).abs() < 1e-9);
//! ```

pub mod boundary;
pub mod checker;
pub mod config;
pub mod element;
pub mod error;
pub mod export;
pub mod hash;
pub mod io;
pub mod kdtree;
pub mod locator;
pub mod mesh;
pub mod node;
pub mod resolver;
pub mod topology;

// 重导出
pub use boundary::{Boundary, BoundaryKind, BoundaryRecords, OPEN_BOUNDARY_CODE};
pub use checker::{CheckIssue, CheckReport, MeshChecker};
pub use config::MeshConfig;
pub use element::Element;
pub use error::{MeshError, MeshResult};
pub use export::{AttributeRecord, AttributeValue, RasterExport, VectorExport};
pub use hash::HashType;
pub use io::{GriddedNetwork, MeshFormat};
pub use kdtree::{Kdtree, SearchTree};
pub use locator::{LocateTolerance, Stencil};
pub use mesh::{Extent, Mesh, Orthogonality, ProjectionDescriptor};
pub use node::Node;
pub use resolver::IdResolver;
pub use topology::{ElementTable, Face, FaceTable};
