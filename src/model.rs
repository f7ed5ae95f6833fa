use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::io::load_pose;
use crate::landmark::Pose;

/// One decoded corpus image handed to a [`LandmarkModel`].
pub struct InputImage {
    pub class: String,
    /// File name, unique within the class.
    pub id: String,
    pub path: PathBuf,
    pub pixels: DynamicImage,
}

/// Anything that can find a body pose in an image.
///
/// A `None` is a miss, not an error: the pipeline records it and moves on
/// without retrying.
pub trait LandmarkModel: Send + Sync {
    fn name(&self) -> String;
    fn detect(&self, image: &InputImage) -> Option<Pose>;
}

/// Reads landmarks precomputed by an external detector.
///
/// For an image `<class>/<stem>.<ext>` the landmarks are expected at
/// `<root>/<class>/<stem>.json`.
pub struct SidecarModel {
    root: PathBuf,
}

impl SidecarModel {
    pub fn new(root: impl Into<PathBuf>) -> SidecarModel {
        SidecarModel { root: root.into() }
    }

    pub fn sidecar_path(&self, class: &str, image_path: &Path) -> PathBuf {
        let stem = image_path.file_stem().unwrap_or_default().to_string_lossy();
        self.root.join(class).join(format!("{}.json", stem))
    }
}

impl LandmarkModel for SidecarModel {
    fn name(&self) -> String {
        format!("sidecar({})", self.root.display())
    }

    fn detect(&self, image: &InputImage) -> Option<Pose> {
        let path = self.sidecar_path(&image.class, &image.path);
        if !path.is_file() {
            log::trace!("no landmarks for {}", image.path.display());
            return None;
        }
        match load_pose(&path) {
            Ok(pose) => pose,
            Err(e) => {
                log::warn!("ignoring landmarks for {}: {}", image.id, e);
                None
            }
        }
    }
}
