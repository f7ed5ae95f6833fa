use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::io::object_from_json;

/// Space the flattened coordinates of an embedding row are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSpace {
    /// `x * width`, `y * height`, `z * width`
    #[default]
    Pixel,
    /// Raw model output.
    Normalized,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    pub landmark_radius: i32,
    pub draw_connections: bool,
    /// Landmarks below this visibility are not drawn.
    pub min_visibility: f32,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            landmark_radius: 4,
            draw_connections: true,
            min_visibility: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub images_in: PathBuf,
    pub images_out: PathBuf,
    pub csvs_out: PathBuf,
    /// Caps the number of images taken from each class. `None` takes all.
    pub per_class_limit: Option<usize>,
    /// Expected classes. `None` discovers every subdirectory of `images_in`.
    pub classes: Option<Vec<String>>,
    pub coordinates: CoordinateSpace,
    pub parallel_classes: bool,
    pub show_progress: bool,
    pub annotation: AnnotationConfig,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            images_in: PathBuf::from("fitness_poses_images_in"),
            images_out: PathBuf::from("fitness_poses_images_out"),
            csvs_out: PathBuf::from("fitness_poses_csvs_out"),
            per_class_limit: None,
            classes: None,
            coordinates: CoordinateSpace::default(),
            parallel_classes: false,
            show_progress: true,
            annotation: AnnotationConfig::default(),
        }
    }
}

impl BootstrapConfig {
    pub fn from_json_file(path: &Path) -> Result<BootstrapConfig> {
        object_from_json(path)
    }

    pub fn with_folders(
        images_in: impl Into<PathBuf>,
        images_out: impl Into<PathBuf>,
        csvs_out: impl Into<PathBuf>,
    ) -> BootstrapConfig {
        BootstrapConfig {
            images_in: images_in.into(),
            images_out: images_out.into(),
            csvs_out: csvs_out.into(),
            ..Default::default()
        }
    }
}
