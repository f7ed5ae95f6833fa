use std::io::Cursor;

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rerun::{RecordingStream, TimeCell};

use crate::config::AnnotationConfig;
use crate::landmark::{POSE_CONNECTIONS, Pose};

/// Stable pseudo-random color for an id.
pub fn id_to_color(id: usize) -> (u8, u8, u8, u8) {
    let mut rng = ChaCha8Rng::seed_from_u64(id as u64);
    let color_num = rng.random_range(0..2u32.pow(24));
    (
        ((color_num >> 16) % 256) as u8,
        ((color_num >> 8) % 256) as u8,
        (color_num % 256) as u8,
        255,
    )
}

/// Red for invisible through green for fully visible landmarks.
pub fn visibility_color(visibility: f32) -> (u8, u8, u8) {
    let c = colorous::RED_YELLOW_GREEN.eval_continuous(visibility.clamp(0.0, 1.0) as f64);
    (c.r, c.g, c.b)
}

/// Draws the skeleton and landmarks of `pose` onto `img` in place.
pub fn draw_pose(img: &mut RgbImage, pose: &Pose, style: &AnnotationConfig) {
    let (w, h) = img.dimensions();
    let landmarks = pose.landmarks();
    let visible = |i: usize| landmarks[i].visibility >= style.min_visibility;

    if style.draw_connections {
        for (edge_idx, &(a, b)) in POSE_CONNECTIONS.iter().enumerate() {
            if !visible(a) || !visible(b) {
                continue;
            }
            let (r, g, b_, _) = id_to_color(edge_idx);
            draw_line_segment_mut(
                img,
                landmarks[a].to_pixel(w, h),
                landmarks[b].to_pixel(w, h),
                Rgb([r, g, b_]),
            );
        }
    }
    for (i, landmark) in landmarks.iter().enumerate() {
        if !visible(i) {
            continue;
        }
        let (x, y) = landmark.to_pixel(w, h);
        let (r, g, b) = visibility_color(landmark.visibility);
        draw_filled_circle_mut(
            img,
            (x.round() as i32, y.round() as i32),
            style.landmark_radius,
            Rgb([r, g, b]),
        );
    }
}

/// rerun use top left corner as (0, 0)
pub fn rerun_shift(p2ds: &[(f32, f32)]) -> Vec<(f32, f32)> {
    p2ds.iter().map(|(x, y)| (*x + 0.5, *y + 0.5)).collect()
}

/// Logs one processed image and its landmarks at sequence step `step`.
pub fn log_annotated(
    recording: &RecordingStream,
    topic: &str,
    step: i64,
    img: &RgbImage,
    pose: Option<&Pose>,
) {
    recording.set_time("image", TimeCell::from_sequence(step));

    let mut bytes: Vec<u8> = Vec::new();
    if let Err(e) = img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png) {
        log::warn!("cannot encode {} for rerun: {}", topic, e);
        return;
    }
    let image = rerun::Image::from_file_contents(bytes, None);
    if let Err(e) = recording.log(format!("{}/image", topic), &image) {
        log::warn!("rerun log failed: {}", e);
    }

    let Some(pose) = pose else {
        recording.log(format!("{}/pts", topic), &rerun::Clear::flat()).ok();
        return;
    };
    let (w, h) = img.dimensions();
    let (pts, colors_labels): (Vec<_>, Vec<_>) = pose
        .landmarks()
        .iter()
        .enumerate()
        .map(|(id, l)| {
            let (r, g, b) = visibility_color(l.visibility);
            (l.to_pixel(w, h), ((r, g, b, 255), id.to_string()))
        })
        .unzip();
    let (colors, labels): (Vec<_>, Vec<_>) = colors_labels.into_iter().unzip();
    let pts = rerun_shift(&pts);
    if let Err(e) = recording.log(
        format!("{}/pts", topic),
        &rerun::Points2D::new(pts)
            .with_colors(colors)
            .with_labels(labels)
            .with_radii([rerun::Radius::new_ui_points(5.0)]),
    ) {
        log::warn!("rerun log failed: {}", e);
    }
}
