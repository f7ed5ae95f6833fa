mod common;

use glam::DVec3;
use pose_bootstrap::Error;
use pose_bootstrap::geometry::{GeometryError, angle_at_vertex, angle_between_vectors};
use pose_bootstrap::landmark::{JointAngle, LANDMARK_COUNT, Landmark, Pose, PoseLandmark};

#[test]
fn test_right_angle_at_origin() {
    let angle = angle_at_vertex(DVec3::ZERO, DVec3::X, DVec3::Y).unwrap();
    assert_eq!(angle, 90);
}

#[test]
fn test_same_limb_is_zero() {
    let vertex = DVec3::new(0.4, 0.5, -0.1);
    let b = DVec3::new(0.6, 0.2, 0.05);
    assert_eq!(angle_at_vertex(vertex, b, b).unwrap(), 0);
}

#[test]
fn test_identical_and_opposite_vectors() {
    for v in [
        DVec3::new(0.3, 0.7, -0.2),
        DVec3::new(0.51, 0.12, 0.33),
        DVec3::new(1.0, 2.0, 3.0),
        DVec3::new(-4.0, 0.0, 1e-3),
    ] {
        assert_eq!(angle_between_vectors(v, v).unwrap(), 0, "{:?}", v);
        assert_eq!(angle_between_vectors(v, -v).unwrap(), 180, "{:?}", v);
    }
}

#[test]
fn test_truncates_to_whole_degrees() {
    let theta = 30.7f64.to_radians();
    let b = DVec3::new(theta.cos(), theta.sin(), 0.0);
    assert_eq!(angle_between_vectors(DVec3::X, b).unwrap(), 30);
    assert_eq!(
        angle_between_vectors(DVec3::X, DVec3::new(1.0, 1.0, 0.0)).unwrap(),
        45
    );
}

#[test]
fn test_truncation_does_not_round_up() {
    for (degrees, expected) in [(59.99995f64, 59), (89.9999, 89), (179.999, 179), (0.0009, 0)] {
        let theta = degrees.to_radians();
        let b = DVec3::new(theta.cos(), theta.sin(), 0.0);
        assert_eq!(
            angle_between_vectors(DVec3::X, b).unwrap(),
            expected,
            "{}",
            degrees
        );
    }
}

#[test]
fn test_vertex_is_origin_of_both_limbs() {
    let vertex = DVec3::new(5.0, 5.0, 5.0);
    let a = angle_at_vertex(vertex, vertex + DVec3::X, vertex + DVec3::Z).unwrap();
    assert_eq!(a, 90);
    let b = angle_at_vertex(vertex, vertex + DVec3::X, vertex - DVec3::X).unwrap();
    assert_eq!(b, 180);
}

#[test]
fn test_commutative_and_bounded_over_pose() {
    let pose = common::synthetic_pose();
    for a in 0..LANDMARK_COUNT {
        for b in 0..LANDMARK_COUNT {
            let ab = pose.angle_between(a, b).unwrap();
            let ba = pose.angle_between(b, a).unwrap();
            assert_eq!(ab, ba, "({}, {})", a, b);
            assert!(ab <= 180);
        }
    }
}

#[test]
fn test_zero_vector_is_domain_error() {
    assert_eq!(
        angle_between_vectors(DVec3::ZERO, DVec3::X),
        Err(GeometryError::ZeroMagnitude)
    );
    let v = DVec3::new(0.2, 0.3, 0.4);
    assert_eq!(
        angle_at_vertex(v, v, DVec3::ONE),
        Err(GeometryError::ZeroMagnitude)
    );
    assert_eq!(
        angle_between_vectors(DVec3::new(f64::NAN, 0.0, 0.0), DVec3::X),
        Err(GeometryError::NonFinite)
    );
}

#[test]
fn test_pose_index_out_of_range() {
    let pose = common::synthetic_pose();
    assert_eq!(
        pose.angle_at(0, 1, LANDMARK_COUNT),
        Err(GeometryError::LandmarkOutOfRange {
            index: LANDMARK_COUNT,
            len: LANDMARK_COUNT
        })
    );
}

#[test]
fn test_pose_requires_full_schema() {
    let result = Pose::new(vec![Landmark::default(); 17]);
    assert!(matches!(
        result,
        Err(Error::LandmarkCount {
            expected: 33,
            found: 17
        })
    ));
}

#[test]
fn test_joint_angle_on_pose() {
    let mut landmarks = vec![Landmark::new(0.5, 0.5, 0.0, 1.0); LANDMARK_COUNT];
    landmarks[PoseLandmark::LeftShoulder as usize] = Landmark::new(0.5, 0.3, 0.0, 1.0);
    landmarks[PoseLandmark::LeftElbow as usize] = Landmark::new(0.5, 0.5, 0.0, 1.0);
    landmarks[PoseLandmark::LeftWrist as usize] = Landmark::new(0.7, 0.5, 0.0, 1.0);
    let pose = Pose::new(landmarks).unwrap();

    assert_eq!(JointAngle::LeftElbow.measure(&pose), Some(90));
    assert_eq!(pose.angle_at(13, 11, 15), Ok(90));
    assert_eq!(pose.landmark(PoseLandmark::LeftWrist).x, 0.7);
    // right arm collapses onto one point
    assert_eq!(JointAngle::RightElbow.measure(&pose), None);
}
