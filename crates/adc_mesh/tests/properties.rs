// crates/adc_mesh/tests/properties.rs

//! 网格核心性质测试
//!
//! 标识解析、重心权重、内容哈希缓存、边表多重度与空间索引快照语义。

use adc_geo::Point2D;
use adc_mesh::locator::{triangle_weights, LocateTolerance};
use adc_mesh::{Boundary, Element, HashType, Mesh, MeshError, Node};

/// 单位正方形剖分为两个三角形，左边两节点为开边界
fn square() -> Mesh {
    let nodes = vec![
        Node::new(1, 0.0, 0.0, 1.0),
        Node::new(2, 1.0, 0.0, 2.0),
        Node::new(3, 1.0, 1.0, 3.0),
        Node::new(4, 0.0, 1.0, 4.0),
    ];
    let elements = vec![Element::triangle(1, 0, 1, 3), Element::triangle(2, 1, 2, 3)];
    let open = vec![Boundary::open(vec![0, 3])];
    Mesh::from_parts("square", nodes, elements, open, Vec::new()).unwrap()
}

/// 节点标识为 {5,3,1,4,2} 的网格
fn shuffled() -> Mesh {
    let nodes = vec![
        Node::new(5, 0.0, 0.0, 0.0),
        Node::new(3, 1.0, 0.0, 0.0),
        Node::new(1, 1.0, 1.0, 0.0),
        Node::new(4, 0.0, 1.0, 0.0),
        Node::new(2, 0.5, 2.0, 0.0),
    ];
    let elements = vec![
        Element::triangle(10, 0, 1, 3),
        Element::triangle(20, 1, 2, 3),
        Element::triangle(30, 3, 2, 4),
    ];
    Mesh::from_parts("", nodes, elements, Vec::new(), Vec::new()).unwrap()
}

// ============================================================
// 标识解析
// ============================================================

#[test]
fn test_id_round_trip_logical() {
    let mesh = square();
    assert!(mesh.node_ordering_is_logical());
    assert!(mesh.element_ordering_is_logical());
    for node in mesh.nodes() {
        let i = mesh.node_index_by_id(node.id).unwrap();
        assert_eq!(mesh.node(i).unwrap().id, node.id);
    }
    for element in mesh.elements() {
        let i = mesh.element_index_by_id(element.id).unwrap();
        assert_eq!(mesh.element_by_id(element.id).unwrap().id, element.id);
        assert_eq!(mesh.element(i).unwrap().id, element.id);
    }
    assert!(mesh.node_by_id(5).unwrap_err().is_not_found());
    assert!(mesh.node_by_id(0).unwrap_err().is_not_found());
}

#[test]
fn test_id_round_trip_shuffled() {
    let mesh = shuffled();
    assert!(!mesh.node_ordering_is_logical());
    assert!(!mesh.element_ordering_is_logical());

    let n3 = mesh.node_by_id(3).unwrap();
    assert_eq!((n3.x, n3.y), (1.0, 0.0));

    for label in [5, 3, 1, 4, 2] {
        let i = mesh.node_index_by_id(label).unwrap();
        assert_eq!(mesh.node(i).unwrap().id, label);
    }
    for label in [10, 20, 30] {
        let i = mesh.element_index_by_id(label).unwrap();
        assert_eq!(mesh.element(i).unwrap().id, label);
    }
    assert!(matches!(mesh.node_by_id(6), Err(MeshError::NotFound { .. })));
    assert!(matches!(mesh.element_by_id(1), Err(MeshError::NotFound { .. })));
}

#[test]
fn test_append_many_nodes_logical() {
    const N: usize = 10_000;
    let mut mesh = Mesh::new();
    for i in 0..N {
        mesh.add_node(i, Node::new(i + 1, i as f64, 0.0, 0.0)).unwrap();
    }
    assert!(mesh.node_ordering_is_logical());
    for i in (0..N).step_by(97) {
        assert_eq!(mesh.node_index_by_id(i + 1).unwrap(), i);
    }
    assert!(mesh.node_by_id(N + 1).unwrap_err().is_not_found());
}

#[test]
fn test_append_many_nodes_shuffled() {
    const N: usize = 10_000;
    // 7919 与 N 互素，i -> 7919 i mod N 是一个置换
    let label = |i: usize| (i * 7919) % N + 1;
    let mut mesh = Mesh::new();
    for i in 0..N {
        mesh.add_node(i, Node::new(label(i), i as f64, 0.0, 0.0)).unwrap();
    }
    assert!(!mesh.node_ordering_is_logical());
    for i in 0..N {
        assert_eq!(mesh.node_index_by_id(label(i)).unwrap(), i);
    }
    assert!(mesh.node_by_id(N + 1).unwrap_err().is_not_found());

    mesh.delete_node(0).unwrap();
    assert_eq!(mesh.node_index_by_id(label(1)).unwrap(), 0);
    assert!(mesh.node_by_id(label(0)).unwrap_err().is_not_found());
}

// ============================================================
// 插值权重
// ============================================================

#[test]
fn test_triangle_weights_at_vertices() {
    let tol = LocateTolerance::default();
    let p = [
        Point2D::new(2.0, 1.0),
        Point2D::new(5.5, 1.5),
        Point2D::new(3.0, 4.0),
    ];
    let expected = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
    for (v, e) in p.iter().zip(expected) {
        assert_eq!(triangle_weights(p, v.x, v.y, &tol).unwrap(), e);
    }
}

#[test]
fn test_triangle_weights_sum_to_one() {
    let tol = LocateTolerance::default();
    let p = [
        Point2D::new(-1.0, 0.0),
        Point2D::new(3.0, 0.5),
        Point2D::new(0.5, 2.0),
    ];
    for &(x, y) in &[(0.0, 0.0), (0.7, 1.1), (10.0, -4.0), (-3.0, 7.5)] {
        let w = triangle_weights(p, x, y, &tol).unwrap();
        assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }
}

#[test]
fn test_unit_triangle_centroid() {
    let tol = LocateTolerance::default();
    let p = [
        Point2D::new(0.0, 0.0),
        Point2D::new(1.0, 0.0),
        Point2D::new(0.0, 1.0),
    ];
    let w = triangle_weights(p, 1.0 / 3.0, 1.0 / 3.0, &tol).unwrap();
    for wi in w {
        assert!((wi - 1.0 / 3.0).abs() < 1e-12);
    }
}

#[test]
fn test_degenerate_triangle_rejected() {
    let tol = LocateTolerance::default();
    let p = [
        Point2D::new(0.0, 0.0),
        Point2D::new(1.0, 1.0),
        Point2D::new(2.0, 2.0),
    ];
    assert!(matches!(
        triangle_weights(p, 0.5, 0.5, &tol),
        Err(MeshError::UnsupportedGeometry { .. })
    ));
}

#[test]
fn test_quad_weights_keep_vertex_order() {
    let nodes = vec![
        Node::new(1, 0.0, 0.0, 0.0),
        Node::new(2, 2.0, 0.0, 0.0),
        Node::new(3, 2.0, 2.0, 0.0),
        Node::new(4, 0.0, 2.0, 0.0),
    ];
    let tol = LocateTolerance::default();
    let quad = Element::quad(1, 0, 1, 2, 3);
    let w = quad.interpolation_weights(&nodes, 0.0, 0.0, &tol).unwrap();
    assert!((w[0] - 1.0).abs() < 1e-12);
    assert!(w[1..].iter().all(|v| v.abs() < 1e-12));

    // 打乱存储顺序后权重仍跟随原顶点
    let reordered = Element::quad(1, 2, 0, 3, 1);
    let w = reordered.interpolation_weights(&nodes, 2.0, 2.0, &tol).unwrap();
    assert!((w[0] - 1.0).abs() < 1e-12);

    let w = quad.interpolation_weights(&nodes, 1.0, 1.0, &tol).unwrap();
    for wi in &w {
        assert!((wi - 0.25).abs() < 1e-12);
    }
}

// ============================================================
// 内容哈希
// ============================================================

#[test]
fn test_hash_idempotent() {
    let mut mesh = square();
    let h1 = mesh.hash(false).unwrap();
    let h2 = mesh.hash(false).unwrap();
    assert_eq!(h1, h2);
    assert_eq!(h1.len(), 32);

    // 无实际变化的修改
    let z = mesh.node(0).unwrap().z;
    mesh.node_mut(0).unwrap().z = z;
    assert_eq!(mesh.hash(true).unwrap(), h1);
}

#[test]
fn test_hash_cache_is_stale_until_forced() {
    let mut mesh = square();
    let before = mesh.hash(false).unwrap();
    mesh.node_mut(2).unwrap().x = 1.5;
    assert_eq!(mesh.hash(false).unwrap(), before);
    let after = mesh.hash(true).unwrap();
    assert_ne!(after, before);
    assert_eq!(mesh.hash(false).unwrap(), after);
}

#[test]
fn test_z_change_keeps_structure_hashes() {
    let mut mesh = square();
    let node_before = mesh.node_hash(0).unwrap();
    let elements_before: Vec<String> = (0..2).map(|i| mesh.element_hash(i).unwrap()).collect();
    let boundary_before = mesh.open_boundary_hash(0).unwrap();
    let position_before = mesh.node(0).unwrap().position_hash(HashType::Md5);

    mesh.node_mut(0).unwrap().z = 42.0;

    assert_ne!(mesh.node_hash(0).unwrap(), node_before);
    assert_eq!(mesh.node(0).unwrap().position_hash(HashType::Md5), position_before);
    for (i, h) in elements_before.iter().enumerate() {
        assert_eq!(&mesh.element_hash(i).unwrap(), h);
    }
    assert_eq!(mesh.open_boundary_hash(0).unwrap(), boundary_before);
}

#[test]
fn test_winding_changes_element_hash() {
    let mesh = square();
    let nodes = mesh.nodes();
    let a = Element::triangle(1, 0, 1, 3).hash(nodes, HashType::Md5).unwrap();
    let b = Element::triangle(1, 0, 3, 1).hash(nodes, HashType::Md5).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_hash_type_switch() {
    let mut mesh = square();
    let md5 = mesh.hash(false).unwrap();
    mesh.set_hash_type(HashType::Sha256);
    let sha = mesh.hash(false).unwrap();
    assert_eq!(sha.len(), 64);
    assert_ne!(md5, sha);
}

// ============================================================
// 边表
// ============================================================

#[test]
fn test_face_table_single_triangle() {
    let nodes = vec![
        Node::new(1, 0.0, 0.0, 0.0),
        Node::new(2, 1.0, 0.0, 0.0),
        Node::new(3, 0.0, 1.0, 0.0),
    ];
    let mut mesh =
        Mesh::from_parts("", nodes, vec![Element::triangle(1, 0, 1, 2)], vec![], vec![]).unwrap();
    let table = mesh.build_face_table().unwrap();
    assert_eq!(table.num_faces(), 3);
    assert!(table.faces().iter().all(|f| f.multiplicity() == 1));
    assert!(table.neighbors(0).unwrap().is_empty());
}

#[test]
fn test_face_table_two_triangles() {
    let mut mesh = square();
    let table = mesh.build_face_table().unwrap();
    assert_eq!(table.num_faces(), 5);

    let shared: Vec<_> = table.faces().iter().filter(|f| f.multiplicity() == 2).collect();
    assert_eq!(shared.len(), 1);
    assert_eq!((shared[0].node1, shared[0].node2), (1, 3));
    assert!(table.are_neighbors(0, 1));
    assert_eq!(table.neighbors(0).unwrap(), &[1]);
    assert_eq!(table.neighbors(1).unwrap(), &[0]);
}

#[test]
fn test_element_table() {
    let mut mesh = square();
    let table = mesh.build_element_table().unwrap();
    assert_eq!(table.element_list(1).unwrap(), &[0, 1]);
    assert_eq!(table.num_elements_around_node(0).unwrap(), 1);
    assert_eq!(table.element_table(3, 1).unwrap(), 1);
    assert!(table.element_table(0, 1).is_err());
    assert!(table.element_list(4).unwrap_err().is_not_found());
}

// ============================================================
// 空间索引
// ============================================================

#[test]
fn test_stale_nodal_index_until_rebuild() {
    let mut mesh = square();
    mesh.build_nodal_search_tree();
    assert_eq!(mesh.find_nearest_node(0.9, 0.9).unwrap(), 2);

    // 把节点 0 移到查询点附近，但不重建索引
    {
        let n = mesh.node_mut(0).unwrap();
        n.x = 0.91;
        n.y = 0.91;
    }
    assert!(mesh.nodal_search_tree_initialized());
    assert_eq!(mesh.find_nearest_node(0.9, 0.9).unwrap(), 2);

    mesh.delete_nodal_search_tree();
    mesh.build_nodal_search_tree();
    assert_eq!(mesh.find_nearest_node(0.9, 0.9).unwrap(), 0);
}

#[test]
fn test_stale_elemental_index_until_rebuild() {
    let mut mesh = square();
    mesh.build_elemental_search_tree().unwrap();
    assert_eq!(mesh.find_nearest_element(-0.6, -0.6).unwrap(), 0);

    // 单元 1 的形心移到 (-2/3, -2/3)，索引仍是旧形心
    {
        let n = mesh.node_mut(2).unwrap();
        n.x = -3.0;
        n.y = -3.0;
    }
    assert!(mesh.elemental_search_tree_initialized());
    assert_eq!(mesh.find_nearest_element(-0.6, -0.6).unwrap(), 0);

    mesh.delete_elemental_search_tree();
    mesh.build_elemental_search_tree().unwrap();
    assert_eq!(mesh.find_nearest_element(-0.6, -0.6).unwrap(), 1);
}

#[test]
fn test_indexes_invalidate_independently() {
    let mut mesh = square();
    mesh.build_nodal_search_tree();
    mesh.build_elemental_search_tree().unwrap();
    mesh.delete_elemental_search_tree();
    assert!(mesh.nodal_search_tree_initialized());
    assert!(!mesh.elemental_search_tree_initialized());
    assert_eq!(mesh.find_nearest_element(0.9, 0.9).unwrap(), 1);
}
