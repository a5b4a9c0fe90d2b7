mod common;

use arbor::stl::{encoded_len, export_scale, triangle_count};
use arbor::{
    ArborError, ErrorTag, FoliageParams, GeneratorMode, Request, Response, Session, Stage,
    TreeParams,
};
use common::{BoxKernel, FailingKernel};

fn small_tree() -> TreeParams {
    TreeParams {
        height: 8.0,
        max_depth: Some(3),
        ..TreeParams::default()
    }
}

#[test]
fn test_export_before_generate_is_no_mesh() {
    let session = Session::<BoxKernel>::new();
    let err = session.export(None).unwrap_err();
    assert!(matches!(err, ArborError::NoMesh));
    assert_eq!(err.to_string(), "no mesh generated");
}

#[test]
fn test_generate_then_export() {
    let mut session = Session::<BoxKernel>::new();
    assert!(session.is_ready());
    let triangles = session.generate(&small_tree()).unwrap().num_triangles();
    assert!(triangles > 0);

    let bytes = session.export(None).unwrap();
    assert_eq!(bytes.len(), encoded_len(triangles));
    assert_eq!(bytes.len(), 84 + 50 * triangles);
    assert_eq!(triangle_count(&bytes), Some(triangles as u32));
}

#[test]
fn test_export_scale_falls_back_to_params() {
    let mut session = Session::<BoxKernel>::new();
    let params = TreeParams {
        export_scale: Some(export_scale(200.0)),
        ..small_tree()
    };
    session.generate(&params).unwrap();
    let scaled = session.export(None).unwrap();
    let explicit = session.export(Some(export_scale(200.0))).unwrap();
    let unscaled = session.export(Some(1.0)).unwrap();
    assert_eq!(scaled, explicit);
    assert_ne!(scaled, unscaled);
}

#[test]
fn test_invalid_params_clear_previous_mesh() {
    let mut session = Session::<BoxKernel>::new();
    session.generate(&small_tree()).unwrap();
    assert!(session.mesh().is_some());

    let bad = TreeParams {
        height: -1.0,
        ..small_tree()
    };
    let err = session.generate(&bad).unwrap_err();
    assert_eq!(err.stage(), Stage::Config);
    assert_eq!(err.tag(), ErrorTag::InvalidConfig);
    assert!(session.mesh().is_none());
    assert!(matches!(session.export(None), Err(ArborError::NoMesh)));
}

#[test]
fn test_no_geometry_clears_previous_mesh() {
    let mut session = Session::<BoxKernel>::new();
    session.generate(&small_tree()).unwrap();

    // Height too small for the trunk to survive the minimum length.
    let empty = TreeParams {
        height: 1e-9,
        ..small_tree()
    };
    let err = session.generate(&empty).unwrap_err();
    assert_eq!(err.tag(), ErrorTag::NoGeometry);
    assert_eq!(err.stage(), Stage::Assemble);
    assert!(session.mesh().is_none());
}

#[test]
fn test_kernel_init_failure_poisons_session() {
    let mut session = Session::<FailingKernel>::new();
    assert!(!session.is_ready());

    let first = session.generate(&small_tree()).unwrap_err();
    let second = session.generate(&small_tree()).unwrap_err();
    let export = session.export(None).unwrap_err();
    for err in [&first, &second, &export] {
        assert_eq!(err.tag(), ErrorTag::KernelInit);
        assert_eq!(err.stage(), Stage::Init);
    }
    assert_eq!(first.to_string(), second.to_string());
    assert!(first.to_string().contains("native library missing"));

    assert!(session.reinitialize().is_err());
    assert!(!session.is_ready());
}

#[test]
fn test_reinitialize_drops_mesh() {
    let mut session = Session::<BoxKernel>::new();
    session.generate(&small_tree()).unwrap();
    session.reinitialize().unwrap();
    assert!(session.is_ready());
    assert!(session.mesh().is_none());
}

#[test]
fn test_handle_requests() {
    let mut session = Session::<BoxKernel>::new();

    let resp = session.handle(Request::Export { scale: None });
    assert_eq!(resp.error_tag(), Some(ErrorTag::NoMesh));

    let resp = session.handle(Request::Generate(small_tree()));
    let (vertices, indices) = match resp {
        Response::Mesh { vertices, indices } => (vertices, indices),
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(vertices.len() % 3, 0);
    assert_eq!(indices.len() % 3, 0);

    match session.handle(Request::Export { scale: None }) {
        Response::Exported { bytes } => {
            assert_eq!(bytes.len(), 84 + 50 * (indices.len() / 3));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_every_mode_assembles() {
    for mode in [
        GeneratorMode::Realistic,
        GeneratorMode::LSystem,
        GeneratorMode::Organic,
        GeneratorMode::Connected,
        GeneratorMode::Abstract,
    ] {
        let mut session = Session::<BoxKernel>::new();
        let params = TreeParams {
            mode,
            ..small_tree()
        };
        let mesh = session.generate(&params).unwrap();
        assert!(mesh.num_triangles() > 0, "{mode:?}");
    }
}

#[test]
fn test_foliage_adds_geometry() {
    let mut bare = Session::<BoxKernel>::new();
    let bare_tris = bare.generate(&small_tree()).unwrap().num_triangles();

    let mut leafy = Session::<BoxKernel>::new();
    let params = TreeParams {
        foliage: Some(FoliageParams::default()),
        ..small_tree()
    };
    let leafy_tris = leafy.generate(&params).unwrap().num_triangles();
    assert!(leafy_tris > bare_tris);
}

#[test]
fn test_fallback_names_match_defaults() {
    let mut a = Session::<BoxKernel>::new();
    let mut b = Session::<BoxKernel>::new();
    let unknown = TreeParams {
        species: "dragon-tree".into(),
        age: "primordial".into(),
        ..small_tree()
    };
    let ma = a.generate(&unknown).unwrap().clone();
    let mb = b.generate(&small_tree()).unwrap().clone();
    assert_eq!(ma, mb);
}
