//! End-to-end checks of the kernel's structural guarantees.

#![allow(clippy::unwrap_used)]

use approx::assert_relative_eq;
use proptest::prelude::*;

use topolis::classify::compute_face_plane;
use topolis::error::{GeometryError, PlaneError};
use topolis::euler::{make_region, split_edgeuse};
use topolis::math::{Point3, Vector3};
use topolis::operations::{
    glue_faces, make_face_from_vertices, make_face_with_vertices, shell_split_touching_loops,
    split_loop_at_touching_jaunt, CoplanarFaceMerge,
};
use topolis::topology::{FaceUseId, ShellId, VertexId};
use topolis::{DebugFlags, Model, Tolerance, TopolisError};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

fn tol() -> Tolerance {
    Tolerance::new(0.005, 1e-6)
}

fn vertices(model: &mut Model, points: &[(f64, f64, f64)]) -> Vec<Option<VertexId>> {
    points
        .iter()
        .map(|&(x, y, z)| Some(model.add_vertex(Some(Point3::new(x, y, z)))))
        .collect()
}

/// `n` unit squares in a row along +X, each sharing its left side with the
/// square before it.
fn strip(model: &mut Model, n: usize) -> (ShellId, Vec<FaceUseId>) {
    let (_, s) = make_region(model).unwrap();
    let bottom = vertices(model, &(0..=n).map(|i| (i as f64, 0.0, 0.0)).collect::<Vec<_>>());
    let top = vertices(model, &(0..=n).map(|i| (i as f64, 1.0, 0.0)).collect::<Vec<_>>());
    let mut faces = Vec::with_capacity(n);
    for i in 0..n {
        let mut verts = [bottom[i], bottom[i + 1], top[i + 1], top[i]];
        let fu = make_face_from_vertices(model, s, &mut verts).unwrap();
        compute_face_plane(model, fu, &tol()).unwrap();
        faces.push(fu);
    }
    (s, faces)
}

#[test]
fn unit_square_plane_faces_up() {
    init_tracing();
    let mut model = Model::new();
    let (_, s) = make_region(&mut model).unwrap();
    let mut verts = vertices(
        &mut model,
        &[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (1.0, 1.0, 0.0), (0.0, 1.0, 0.0)],
    );
    let fu = make_face_with_vertices(&mut model, s, &mut verts).unwrap();

    let plane = compute_face_plane(&mut model, fu, &tol()).unwrap();
    assert_relative_eq!(plane.normal, Vector3::z(), epsilon = 1e-9);
    assert_relative_eq!(plane.dist, 0.0, epsilon = 1e-9);

    let mate = model.faceuse(fu).unwrap().mate;
    let under = model.faceuse_plane(mate).unwrap().unwrap();
    assert_relative_eq!(under.normal, -Vector3::z(), epsilon = 1e-9);
    model.verify().unwrap();
}

#[test]
fn adjacent_squares_merge_into_a_rectangle() {
    init_tracing();
    let mut model = Model::new();
    let (s, _) = strip(&mut model, 2);

    let merged = CoplanarFaceMerge::new(s, tol())
        .with_simplify(true)
        .execute(&mut model)
        .unwrap();
    assert_eq!(merged, 1);
    assert_eq!(model.face_count(), 1);

    let fu = model.shell(s).unwrap().faceuses[0];
    let loops = model.faceuse(fu).unwrap().loopuses.clone();
    assert_eq!(loops.len(), 1);
    assert_eq!(model.loop_vertices(loops[0]).unwrap().len(), 6);
    assert_eq!(model.edge_count(), 6);
    model.verify().unwrap();
}

#[test]
fn touching_jaunt_split_conserves_edges() {
    init_tracing();
    let mut model = Model::new();
    let (_, s) = make_region(&mut model).unwrap();
    let v = vertices(
        &mut model,
        &[
            (0.0, 0.0, 0.0),
            (4.0, 0.0, 0.0),
            (4.0, 4.0, 0.0),
            (0.0, 4.0, 0.0),
            (2.0, 2.0, 0.0),
        ],
    );
    let (a, b, c, d, t) = (v[0], v[1], v[2], v[3], v[4]);
    let fu = make_face_with_vertices(&mut model, s, &mut [a, b, t, b, c, t, d]).unwrap();
    let lu = model.faceuse(fu).unwrap().loopuses[0];
    let before = model.loop_edge_count(lu).unwrap();

    assert_eq!(split_loop_at_touching_jaunt(&mut model, lu).unwrap(), 1);
    let loops = model.faceuse(fu).unwrap().loopuses.clone();
    assert_eq!(loops.len(), 2);
    let after: usize = loops.iter().map(|&l| model.loop_edge_count(l).unwrap()).sum();
    assert_eq!(after, before);
    for l in loops {
        assert!(!model.is_crack_loop(l).unwrap());
    }
    model.verify().unwrap();
}

#[test]
fn verifying_model_checks_each_shell_pass() {
    init_tracing();
    let mut model = Model::with_diagnostics(DebugFlags::VERIFY | DebugFlags::CUTLOOP);
    let (_, s) = make_region(&mut model).unwrap();
    let v = vertices(
        &mut model,
        &[
            (0.0, 0.0, 0.0),
            (6.0, 0.0, 0.0),
            (6.0, 6.0, 0.0),
            (0.0, 6.0, 0.0),
            (3.0, 2.0, 0.0),
            (3.0, 4.0, 0.0),
        ],
    );
    let (a, b, c, d, t, u) = (v[0], v[1], v[2], v[3], v[4], v[5]);
    let fu = make_face_with_vertices(&mut model, s, &mut [a, b, t, b, c, u, c, d, u, t]).unwrap();
    compute_face_plane(&mut model, fu, &tol()).unwrap();

    assert_eq!(shell_split_touching_loops(&mut model, s).unwrap(), 2);
    assert_eq!(model.faceuse(fu).unwrap().loopuses.len(), 3);
}

#[test]
fn collinear_loop_has_no_plane() {
    init_tracing();
    let mut model = Model::new();
    let (_, s) = make_region(&mut model).unwrap();
    let mut verts = vertices(&mut model, &[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (2.0, 0.0, 0.0)]);
    let fu = make_face_with_vertices(&mut model, s, &mut verts).unwrap();

    let err = compute_face_plane(&mut model, fu, &tol()).unwrap_err();
    let TopolisError::Geometry(GeometryError::Plane(plane_err)) = err else {
        panic!("expected a plane error, got {err}");
    };
    assert!(plane_err.code() < 0);
    assert_eq!(plane_err, PlaneError::NoDistinctPoints);
    let face = model.faceuse(fu).unwrap().face;
    assert!(model.face(face).unwrap().geom.is_none());
}

#[test]
fn book_of_pages_keeps_radial_closure() {
    init_tracing();
    let mut model = Model::new();
    let (_, s) = make_region(&mut model).unwrap();
    let spine = vertices(&mut model, &[(0.0, 0.0, 0.0), (0.0, 0.0, 1.0)]);
    let pages = 5;
    let mut faces = Vec::with_capacity(pages);
    for k in 0..pages {
        let angle = std::f64::consts::TAU * k as f64 / pages as f64;
        let tip = vertices(&mut model, &[(angle.cos(), angle.sin(), 0.5)]);
        let mut verts = [spine[0], spine[1], tip[0]];
        faces.push(make_face_with_vertices(&mut model, s, &mut verts).unwrap());
    }
    glue_faces(&mut model, &faces).unwrap();

    let a = spine[0].unwrap();
    let b = spine[1].unwrap();
    let eu = model.find_edge_between(s, a, b).unwrap().unwrap();
    let pairs = model.radial_pairs(eu).unwrap();
    assert_eq!(pairs.len(), pages);
    let edge = model.edgeuse(eu).unwrap().edge;
    assert_eq!(model.edge_use_count(edge), 2 * pages);
    assert_eq!(model.edge_count(), 2 * pages + 1);
    model.verify().unwrap();
}

proptest! {
    #[test]
    fn split_adds_exactly_one_edge(n in 3usize..12, at in 0usize..12, share in any::<bool>()) {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let ring: Vec<_> = (0..n)
            .map(|i| {
                let angle = std::f64::consts::TAU * i as f64 / n as f64;
                (angle.cos(), angle.sin(), 0.0)
            })
            .collect();
        let mut verts = vertices(&mut model, &ring);
        let fu = make_face_with_vertices(&mut model, s, &mut verts).unwrap();
        let lu = model.faceuse(fu).unwrap().loopuses[0];
        let eu = model.loop_edgeuses(lu).unwrap()[at % n];
        let edges = model.edge_count();

        let m = model.add_vertex(None);
        split_edgeuse(&mut model, Some(m), eu, share).unwrap();
        prop_assert_eq!(model.edge_count(), edges + 1);
        prop_assert_eq!(model.vertex(m).unwrap().uses.len(), 2);
        prop_assert_eq!(model.loop_edge_count(lu).unwrap(), n + 1);
        prop_assert!(model.verify().is_ok());
    }

    #[test]
    fn coplanar_merge_is_idempotent(n in 1usize..6) {
        let mut model = Model::new();
        let (s, _) = strip(&mut model, n);

        let first = CoplanarFaceMerge::new(s, tol()).with_simplify(true).execute(&mut model).unwrap();
        prop_assert_eq!(first, n - 1);
        prop_assert_eq!(model.face_count(), 1);
        let second = CoplanarFaceMerge::new(s, tol()).with_simplify(true).execute(&mut model).unwrap();
        prop_assert_eq!(second, 0);
        prop_assert_eq!(model.face_count(), 1);
        prop_assert!(model.verify().is_ok());
    }
}
