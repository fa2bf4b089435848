// crates/adc_mesh/tests/io_roundtrip.rs

//! 网格文件读写往返测试

use adc_mesh::{BoundaryKind, Mesh, MeshConfig, MeshError, MeshFormat};
use std::io::Cursor;

/// 含开边界、普通陆地边界、外堰、内堰与带管道内堰的小网格，节点标识不连续
const WEIR_MESH: &str = "\
weir mesh
3 5
10 -90.0 29.0 2.0
20 -89.0 29.0 3.0
30 -89.0 30.0 -1.0
40 -90.0 30.0 -1.5
50 -89.5 30.5 -2.0
1 3 10 20 40
2 3 20 30 40
3 3 40 30 50
1
2
2
10
20
4
5
2 0
20
30
1 3
50 2.5 1.0
1 24
40 30 3.0 1.0 0.9
1 25
10 50 3.5 1.0 0.9 0.5 0.75 0.25
";

fn load(text: &str) -> Mesh {
    Mesh::read_from(Cursor::new(text), MeshFormat::Adcirc, MeshConfig::default()).unwrap()
}

#[test]
fn test_read_weir_mesh() {
    let mesh = load(WEIR_MESH);
    assert!(!mesh.node_ordering_is_logical());
    assert!(mesh.element_ordering_is_logical());
    assert_eq!(mesh.node_by_id(30).unwrap().z, -1.0);
    assert_eq!(mesh.total_open_boundary_nodes(), 2);
    assert_eq!(mesh.total_land_boundary_nodes(), 5);

    let kinds: Vec<BoundaryKind> = mesh.land_boundaries().iter().map(|b| b.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            BoundaryKind::SingleNode,
            BoundaryKind::ExternalWeir,
            BoundaryKind::InternalWeir,
            BoundaryKind::InternalWeirWithPipes,
        ]
    );

    let internal = mesh.land_boundary(2).unwrap();
    assert_eq!(internal.node1(0).unwrap(), 3);
    assert_eq!(internal.node2(0).unwrap(), 2);
    assert!((internal.subcritical_weir_coefficient(0).unwrap() - 1.0).abs() < 1e-12);
    assert!(matches!(
        internal.pipe_height(0),
        Err(MeshError::InvalidAttribute { code: 24, .. })
    ));
    assert!(matches!(
        mesh.land_boundary(0).unwrap().crest_elevation(0),
        Err(MeshError::InvalidAttribute { .. })
    ));
}

#[test]
fn test_adcirc_round_trip_in_memory() {
    let mut mesh = load(WEIR_MESH);
    let mut buf = Vec::new();
    mesh.write_to(&mut buf, MeshFormat::Adcirc).unwrap();

    let mut again = Mesh::read_from(Cursor::new(buf), MeshFormat::Adcirc, MeshConfig::default()).unwrap();
    assert_eq!(again.num_nodes(), mesh.num_nodes());
    assert_eq!(again.num_elements(), mesh.num_elements());
    assert_eq!(again.num_open_boundaries(), mesh.num_open_boundaries());
    assert_eq!(again.num_land_boundaries(), mesh.num_land_boundaries());
    assert_eq!(again.hash(false).unwrap(), mesh.hash(false).unwrap());
}

#[test]
fn test_piped_weir_round_trip() {
    let mesh = load(WEIR_MESH);
    let mut buf = Vec::new();
    mesh.write_to(&mut buf, MeshFormat::Adcirc).unwrap();
    let again = Mesh::read_from(Cursor::new(buf), MeshFormat::Adcirc, MeshConfig::default()).unwrap();

    let piped = again.land_boundary(3).unwrap();
    assert_eq!(piped.code(), 25);
    assert_eq!(piped.kind(), BoundaryKind::InternalWeirWithPipes);
    assert_eq!(again.node(piped.node1(0).unwrap()).unwrap().id, 10);
    assert_eq!(again.node(piped.node2(0).unwrap()).unwrap().id, 50);
    assert!((piped.crest_elevation(0).unwrap() - 3.5).abs() < 1e-12);
    assert!((piped.subcritical_weir_coefficient(0).unwrap() - 1.0).abs() < 1e-12);
    assert!((piped.supercritical_weir_coefficient(0).unwrap() - 0.9).abs() < 1e-12);
    assert!((piped.pipe_height(0).unwrap() - 0.5).abs() < 1e-12);
    assert!((piped.pipe_coefficient(0).unwrap() - 0.75).abs() < 1e-12);
    assert!((piped.pipe_diameter(0).unwrap() - 0.25).abs() < 1e-12);
    assert_eq!(piped, mesh.land_boundary(3).unwrap());
}

#[test]
fn test_adcirc_round_trip_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weir.14");

    let mut mesh = load(WEIR_MESH);
    mesh.write(&path).unwrap();

    let mut again = Mesh::read(&path).unwrap();
    assert_eq!(again.filename(), Some(path.as_path()));
    assert_eq!(again.header(), "weir mesh");
    assert_eq!(again.hash(true).unwrap(), mesh.hash(true).unwrap());
}

#[test]
fn test_2dm_round_trip_drops_boundaries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weir.2dm");

    let mesh = load(WEIR_MESH);
    mesh.write(&path).unwrap();
    let again = Mesh::read(&path).unwrap();

    assert_eq!(again.num_nodes(), 5);
    assert_eq!(again.num_elements(), 3);
    assert_eq!(again.num_open_boundaries(), 0);
    assert_eq!(again.num_land_boundaries(), 0);
    assert_eq!(again.header(), "weir mesh");
    for (a, b) in mesh.elements().iter().zip(again.elements()) {
        assert_eq!(a.nodes(), b.nodes());
    }
    for label in [10, 20, 30, 40, 50] {
        let a = mesh.node_by_id(label).unwrap();
        let b = again.node_by_id(label).unwrap();
        assert!((a.x - b.x).abs() < 1e-6 && (a.z - b.z).abs() < 1e-6);
    }
}

#[test]
fn test_gridded_network_round_trip() {
    let mut mesh = load(WEIR_MESH);
    let net = mesh.to_gridded_network().unwrap();
    assert_eq!(net.nvertex, 3);
    assert_eq!(net.element.len(), 9);

    let mut again = Mesh::from_gridded_network(&net, MeshConfig::default()).unwrap();
    // 标识重新按顺序编号，只比较几何与拓扑
    assert!(again.node_ordering_is_logical());
    assert_eq!(again.num_elements(), 3);
    for i in 0..mesh.num_elements() {
        assert_eq!(again.element_hash(i).unwrap(), mesh.element_hash(i).unwrap());
    }
    assert_ne!(again.hash(false).unwrap(), String::new());
}

#[test]
fn test_unknown_extension() {
    let err = Mesh::read("mesh.xyz").unwrap_err();
    assert!(matches!(err, MeshError::FormatError { .. }));
}

#[test]
fn test_parse_error_returns_no_mesh() {
    let text = WEIR_MESH.replace("2 3 20 30 40", "2 3 20 30");
    let err = Mesh::read_from(Cursor::new(text), MeshFormat::Adcirc, MeshConfig::default())
        .unwrap_err();
    assert!(matches!(err, MeshError::FormatError { line: 9, .. }), "{err}");
}
