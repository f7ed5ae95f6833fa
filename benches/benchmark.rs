use criterion::{Criterion, black_box, criterion_group, criterion_main};
use glam::DVec3;
use pose_bootstrap::config::CoordinateSpace;
use pose_bootstrap::geometry::angle_at_vertex;
use pose_bootstrap::landmark::{JointAngle, LANDMARK_COUNT, Landmark, Pose};
use pose_bootstrap::store::EmbeddingRow;

fn bench_pose() -> Pose {
    let landmarks = (0..LANDMARK_COUNT)
        .map(|i| {
            let t = i as f32 / LANDMARK_COUNT as f32;
            Landmark::new(0.2 + 0.6 * t, 0.9 - 0.7 * t, 0.05 * t, 1.0)
        })
        .collect();
    Pose::new(landmarks).unwrap()
}

fn bench_angle_at_vertex(c: &mut Criterion) {
    let vertex = DVec3::new(0.5, 0.5, -0.1);
    let b = DVec3::new(0.5, 0.3, -0.05);
    let d = DVec3::new(0.7, 0.52, 0.0);
    c.bench_function("angle_at_vertex", |bench| {
        bench.iter(|| angle_at_vertex(black_box(vertex), black_box(b), black_box(d)))
    });
}

fn bench_joint_angles(c: &mut Criterion) {
    let pose = bench_pose();
    c.bench_function("all_joint_angles", |b| {
        b.iter(|| {
            JointAngle::ALL
                .iter()
                .map(|j| j.measure(black_box(&pose)))
                .collect::<Vec<_>>()
        })
    });
}

fn bench_embedding_row(c: &mut Criterion) {
    let pose = bench_pose();
    c.bench_function("embedding_row_record", |b| {
        b.iter(|| {
            EmbeddingRow::from_pose("img.png", black_box(&pose), 640, 480, CoordinateSpace::Pixel)
                .to_record()
        })
    });
}

criterion_group!(
    benches,
    bench_angle_at_vertex,
    bench_joint_angles,
    bench_embedding_row
);
criterion_main!(benches);
