#![allow(dead_code)]

use std::collections::HashSet;
use std::path::Path;

use image::{Rgb, RgbImage};
use pose_bootstrap::config::BootstrapConfig;
use pose_bootstrap::landmark::{LANDMARK_COUNT, Landmark, Pose};
use pose_bootstrap::model::{InputImage, LandmarkModel};

pub const IMAGE_W: u32 = 20;
pub const IMAGE_H: u32 = 10;

pub fn write_image(path: &Path) {
    RgbImage::from_pixel(IMAGE_W, IMAGE_H, Rgb([120, 120, 120]))
        .save(path)
        .unwrap();
}

/// `<root>/<class>/img_<i>.png` for every (class, count).
pub fn make_corpus(root: &Path, classes: &[(&str, usize)]) {
    for (class, count) in classes {
        let dir = root.join(class);
        std::fs::create_dir_all(&dir).unwrap();
        for i in 0..*count {
            write_image(&dir.join(format!("img_{}.png", i)));
        }
    }
}

pub fn synthetic_pose() -> Pose {
    let landmarks = (0..LANDMARK_COUNT)
        .map(|i| {
            let t = i as f32 / (LANDMARK_COUNT - 1) as f32;
            let u = ((i * 7) % LANDMARK_COUNT) as f32 / (LANDMARK_COUNT - 1) as f32;
            Landmark::new(0.1 + 0.8 * t, 0.2 + 0.6 * u, -0.1 + 0.01 * i as f32, 0.9)
        })
        .collect();
    Pose::new(landmarks).unwrap()
}

/// Detects [`synthetic_pose`] everywhere except on the listed (class, id) pairs.
#[derive(Default)]
pub struct ScriptedModel {
    misses: HashSet<(String, String)>,
}

impl ScriptedModel {
    pub fn missing(pairs: &[(&str, &str)]) -> ScriptedModel {
        ScriptedModel {
            misses: pairs
                .iter()
                .map(|(c, i)| (c.to_string(), i.to_string()))
                .collect(),
        }
    }
}

impl LandmarkModel for ScriptedModel {
    fn name(&self) -> String {
        "scripted".to_string()
    }

    fn detect(&self, image: &InputImage) -> Option<Pose> {
        if self.misses.contains(&(image.class.clone(), image.id.clone())) {
            None
        } else {
            Some(synthetic_pose())
        }
    }
}

pub fn quiet_config(root: &Path) -> BootstrapConfig {
    let mut config = BootstrapConfig::with_folders(
        root.join("images_in"),
        root.join("images_out"),
        root.join("csvs_out"),
    );
    config.show_progress = false;
    config
}
