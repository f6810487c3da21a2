//! Integration tests for loading, animating and skinning AMO models

use std::io::Write;
use std::sync::Arc;

use amo_model::geometry::FaceKind;
use amo_model::{
    AmoError, AmoModel, AnimatedModel, DiagnosticKind, FsResolver, LoadOptions, PlaybackState,
};
use glam::{Quat, Vec3};
use pretty_assertions::assert_eq;
use test_case::test_case;

/// Two joints, a triangle bound fully to the hand and a raise animation
const HAND: &str = "\
# skeleton
j root -1
j hand 0

# geometry
v 0 0 0
v 1 0 0
v 0 0 1
vn 0 1 0
vt 0 0
vj 2
vw 1.0

ao arm
f 1/1/1/1/1 2/1/1/1/1 3/1/1/1/1

# animation
a raise
ap 0.0 2 0 0 0
ap 1.0 2 0 1 0
";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn load(content: &str) -> Arc<AmoModel> {
    init_logging();
    Arc::new(content.parse().unwrap())
}

fn assert_close(actual: Vec3, expected: Vec3) {
    assert!(
        (actual - expected).length() < 1e-5,
        "expected {expected:?}, got {actual:?}"
    );
}

#[test]
fn test_two_joint_scenario() {
    let model = load(HAND);
    assert!(model.diagnostics().is_empty());

    let mut instance = AnimatedModel::new(Arc::clone(&model));
    assert!(instance.play("raise"));
    instance.update(0.5);

    let hand = instance.skeleton().joint(1).unwrap();
    assert_close(hand.local_position(), Vec3::new(0.0, 0.5, 0.0));
    assert_close(hand.world_position(), Vec3::new(0.0, 0.5, 0.0));

    let mut positions = Vec::new();
    instance.skin_positions_into(&mut positions);
    assert_eq!(positions.len(), 3);
    assert_close(positions[0], Vec3::new(0.0, 0.5, 0.0));
    assert_close(positions[1], Vec3::new(1.0, 0.5, 0.0));
    assert_close(positions[2], Vec3::new(0.0, 0.5, 1.0));

    let mut normals = Vec::new();
    instance.skin_normals_into(&mut normals);
    assert_eq!(normals, vec![Vec3::Y; 3]);
}

#[test]
fn test_zero_weight_vertices_hold_bind_pose_while_animating() {
    let content = "\
j root -1
v 1 0 0
v 0 0 1
v 0 1 0
vj 1
vw 1
vw 0 0 0 0
o mixed
f 1///1/1 2///1/2 3///1/2
a slide
ap 0 1 0 0 0
ap 1 1 2 0 0
";
    let model = load(content);
    assert_eq!(
        model.diagnostics().iter().map(|d| d.kind).collect::<Vec<_>>(),
        vec![DiagnosticKind::WeightLint]
    );

    let mut instance = AnimatedModel::new(model);
    assert!(instance.play("slide"));
    instance.update(0.5);
    assert_close(instance.skeleton().joint(0).unwrap().world_position(), Vec3::X);

    let mut positions = Vec::new();
    instance.skin_positions_into(&mut positions);
    assert_close(positions[0], Vec3::new(2.0, 0.0, 0.0));
    assert_close(positions[1], Vec3::new(0.0, 0.0, 1.0));
    assert_close(positions[2], Vec3::new(0.0, 1.0, 0.0));
}

#[test]
fn test_hierarchy_propagates_translation() {
    let model = load("j root -1\nj child 0\nj grandchild 1\na move\nap 0 1 1 0 0\n");
    let mut instance = AnimatedModel::new(model);

    // Identity locals give identity world
    for joint in instance.skeleton().joints() {
        assert_eq!(joint.world_position(), Vec3::ZERO);
    }

    instance.play("move");
    instance.update(0.0);
    for joint in instance.skeleton().joints() {
        assert_close(joint.world_position(), Vec3::X);
    }
}

#[test]
fn test_rotation_keyframes_slerp() {
    let content = "\
j root -1
a turn
ar 0 1 0 0 0 1
ar 1 1 0 0.70710677 0 0.70710677
";
    let model = load(content);
    let mut instance = AnimatedModel::new(model);
    instance.play("turn");
    instance.update(0.5);

    let rotation = instance.skeleton().joint(0).unwrap().local_rotation();
    let expected = Quat::from_rotation_y(std::f32::consts::FRAC_PI_4);
    assert!(rotation.is_normalized());
    assert!(rotation.dot(expected).abs() > 0.9999);
}

#[test]
fn test_polygon_decomposition() {
    let content = "\
v 0 0 0
v 1 0 0
v 2 1 0
v 1 2 0
v 0 2 0
v -1 1 0
o hexagon
f 1 2 3 4 5 6
o quad
f 1 2 3 4
";
    let model = load(content);
    let hexagon = &model.object("hexagon").unwrap().faces[0];
    assert_eq!(hexagon.kind(), FaceKind::Polygon(6));
    let triangles = hexagon.decompose();
    assert_eq!(triangles.len(), 4);
    assert!(triangles.iter().all(|t| t.kind() == FaceKind::Triangle));

    let quad = &model.object("quad").unwrap().faces[0];
    assert_eq!(quad.decompose().len(), 1);
    assert_eq!(model.stats().triangles, 6);
}

#[test]
fn test_unknown_animation_is_ignored() {
    let model = load(HAND);
    let mut instance = AnimatedModel::new(model);
    assert!(!instance.play("dance"));
    assert_eq!(instance.state(), PlaybackState::Stopped);
    assert_eq!(instance.controller().current(), None);
}

#[test_case(0.0, 0.0 ; "start")]
#[test_case(0.25, 0.25 ; "quarter")]
#[test_case(1.0, 1.0 ; "end")]
#[test_case(5.0, 1.0 ; "past the end clamps")]
#[test_case(-3.0, 0.0 ; "before the start clamps")]
fn test_seek_samples_track(time: f32, expected_y: f32) {
    let model = load(HAND);
    let mut instance = AnimatedModel::new(model);
    instance.play("raise");
    instance.pause();
    assert!(instance.seek(time));

    let hand = instance.skeleton().joint(1).unwrap();
    assert_close(hand.local_position(), Vec3::new(0.0, expected_y, 0.0));
    assert_eq!(instance.state(), PlaybackState::Paused);
}

#[test_case(&[2.5], 0.5 ; "single step")]
#[test_case(&[0.75, 0.75, 0.75], 0.25 ; "accumulated steps")]
#[test_case(&[4.0], 0.0 ; "whole cycles")]
fn test_looping_wraps(steps: &[f32], expected: f32) {
    let model = load("j root -1\na cycle\nap 0 1 0 0 0\nap 2 1 1 0 0\n");
    let mut instance = AnimatedModel::new(model);
    instance.play("cycle");
    for &dt in steps {
        instance.update(dt);
    }
    assert!((instance.controller().time() - expected).abs() < 1e-5);
    assert_eq!(instance.state(), PlaybackState::Playing);
}

#[test]
fn test_once_animation_stops_at_end() {
    let model = load("j root -1\na once_only once\nap 0 1 0 0 0\nap 1 1 1 0 0\n");
    let mut instance = AnimatedModel::new(model);
    instance.play("once_only");
    instance.update(0.6);
    instance.update(0.6);

    assert_eq!(instance.controller().time(), 1.0);
    assert_eq!(instance.state(), PlaybackState::Stopped);
    assert_close(instance.skeleton().joint(0).unwrap().world_position(), Vec3::X);

    // Playing again restarts from the beginning
    instance.play("once_only");
    assert_eq!(instance.controller().time(), 0.0);
    assert!(instance.controller().is_playing());
}

#[test]
fn test_lenient_load_collects_diagnostics() {
    let content = "\
v 0 0 0
v 1 0 0
v 0 1 0
vw 0.3 0.3
bogus line
j root -1
j orphan 5
o mesh
f 1 2
f 1 2 3
a anim
ap 0 9 0 0 0
";
    let model = load(content);
    let kinds: Vec<DiagnosticKind> = model.diagnostics().iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![
            DiagnosticKind::WeightLint,
            DiagnosticKind::FormatError,
            DiagnosticKind::DegenerateFace,
            DiagnosticKind::ReferenceWarning,
            DiagnosticKind::ReferenceWarning,
        ]
    );
    assert!(model.has_errors());

    // Best-effort model still usable
    assert_eq!(model.object("mesh").unwrap().faces.len(), 1);
    assert!(model.skeleton().joint(1).unwrap().is_root());

    let mut instance = AnimatedModel::new(model);
    assert!(instance.play("anim"));
    instance.update(0.1);
}

#[test]
fn test_strict_load_fails_fast() {
    init_logging();
    let err = AmoModel::parse_str("v 0 0 0\nf 1 1\n", &LoadOptions::strict()).unwrap_err();
    assert!(matches!(err, AmoError::Format { line: 2, .. }));
    assert_eq!(err.to_string(), "Format error at line 2: face has 2 vertices, at least 3 are required");
}

#[test]
fn test_load_from_filesystem() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let mut file = std::fs::File::create(dir.path().join("hand.amo")).unwrap();
    file.write_all(HAND.as_bytes()).unwrap();
    drop(file);

    let resolver = FsResolver::new(dir.path());
    let model = AmoModel::from_resolver(&resolver, "hand.amo", &LoadOptions::default()).unwrap();
    assert_eq!(model.stats().joints, 2);

    let background = AmoModel::load_in_background(resolver.clone(), "hand.amo", LoadOptions::default());
    let loaded = background.join().unwrap();
    assert_eq!(loaded.stats(), model.stats());

    let missing = AmoModel::load_in_background(resolver, "missing.amo", LoadOptions::default());
    assert!(matches!(missing.join(), Err(AmoError::ResourceNotFound { .. })));
}

#[test]
fn test_update_all_instances() {
    let model = load(HAND);
    let mut instances: Vec<AnimatedModel> = (0..16)
        .map(|_| {
            let mut instance = AnimatedModel::new(Arc::clone(&model));
            instance.play("raise");
            instance
        })
        .collect();

    amo_model::parallel::update_all(&mut instances, 0.25);
    for instance in &instances {
        assert_close(
            instance.skeleton().joint(1).unwrap().world_position(),
            Vec3::new(0.0, 0.25, 0.0),
        );
    }
}
