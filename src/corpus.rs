use std::path::{Path, PathBuf};

use glob::glob;
use serde::Serialize;
use thiserror::Error;

use crate::error::{Error, Result};
use crate::stats::Statistics;

pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// A class directory that is missing or cannot be listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("class `{class}`: {reason}")]
pub struct CorpusStructureError {
    pub class: String,
    pub reason: String,
}

pub(crate) fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().starts_with('.'))
        .unwrap_or(true)
}

pub fn is_image_file(path: &Path) -> bool {
    if is_hidden(path) || !path.is_file() {
        return false;
    }
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// File name used as the image identifier across both output stores.
pub fn image_id(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Sorted image files directly inside `dir`.
pub(crate) fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    // surfaces permission errors that glob would silently swallow
    std::fs::read_dir(dir).map_err(Error::io(dir))?;
    let pattern = format!("{}/*", glob::Pattern::escape(&dir.to_string_lossy()));
    let mut paths = Vec::new();
    for entry in glob(&pattern)? {
        let path = entry.map_err(|e| Error::Io {
            path: e.path().to_path_buf(),
            source: e.into(),
        })?;
        if is_image_file(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Sorted names of the non-hidden subdirectories of `root`.
pub(crate) fn list_subdirs(root: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(root).map_err(Error::io(root))? {
        let path = entry.map_err(Error::io(root))?.path();
        if path.is_dir() && !is_hidden(&path) {
            names.push(image_id(&path));
        }
    }
    names.sort();
    Ok(names)
}

#[derive(Debug, Clone)]
pub struct ClassImages {
    pub label: String,
    pub dir: PathBuf,
    pub images: Vec<PathBuf>,
}

impl ClassImages {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Read-only view of `<root>/<class>/<image>`.
#[derive(Debug, Clone)]
pub struct ImageCorpus {
    root: PathBuf,
    classes: Vec<ClassImages>,
    issues: Vec<CorpusStructureError>,
}

impl ImageCorpus {
    /// Lists the corpus under `root`.
    ///
    /// With `expected` set only those classes are considered, in the given
    /// order with repeats dropped, and a missing one is recorded as an issue;
    /// otherwise every subdirectory is a class. Only an unreadable `root` is
    /// an error.
    pub fn discover(root: &Path, expected: Option<&[String]>) -> Result<ImageCorpus> {
        let labels = match expected {
            Some(labels) => {
                std::fs::read_dir(root).map_err(Error::io(root))?;
                let mut unique: Vec<String> = Vec::with_capacity(labels.len());
                for label in labels {
                    if unique.contains(label) {
                        log::warn!("class `{}` listed more than once", label);
                    } else {
                        unique.push(label.clone());
                    }
                }
                unique
            }
            None => list_subdirs(root)?,
        };

        let mut classes = Vec::new();
        let mut issues = Vec::new();
        for label in labels {
            let dir = root.join(&label);
            if !dir.is_dir() {
                log::warn!("class `{}` has no directory at {}", label, dir.display());
                issues.push(CorpusStructureError {
                    class: label,
                    reason: format!("missing directory {}", dir.display()),
                });
                continue;
            }
            match list_images(&dir) {
                Ok(images) => {
                    if images.is_empty() {
                        log::warn!("class `{}` has no images", label);
                    }
                    log::debug!("class `{}`: {} images", label, images.len());
                    classes.push(ClassImages { label, dir, images });
                }
                Err(e) => {
                    log::warn!("cannot list class `{}`: {}", label, e);
                    issues.push(CorpusStructureError {
                        class: label,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(ImageCorpus {
            root: root.to_path_buf(),
            classes,
            issues,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn classes(&self) -> &[ClassImages] {
        &self.classes
    }

    pub fn class(&self, label: &str) -> Option<&ClassImages> {
        self.classes.iter().find(|c| c.label == label)
    }

    pub fn issues(&self) -> &[CorpusStructureError] {
        &self.issues
    }

    pub fn total(&self) -> usize {
        self.classes.iter().map(ClassImages::len).sum()
    }

    /// "images in" counts.
    pub fn statistics(&self) -> Statistics {
        let mut stats = Statistics::new("Images in");
        for class in &self.classes {
            stats.insert(class.label.clone(), class.len());
        }
        stats
    }
}
