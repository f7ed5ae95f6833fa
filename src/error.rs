use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::geometry::GeometryError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("image error at {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("json error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("no embedding CSV at {0}")]
    MissingEmbeddings(PathBuf),

    #[error("output folder {output} overlaps input folder {input}")]
    OverlappingFolders { input: PathBuf, output: PathBuf },

    #[error("pose has {found} landmarks, expected {expected}")]
    LandmarkCount { expected: usize, found: usize },

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

impl Error {
    /// Returns a `map_err` adapter that tags an io error with `path`.
    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
        move |source| Error::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn csv(path: &Path) -> impl FnOnce(csv::Error) -> Error + '_ {
        move |source| Error::Csv {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn image(path: &Path) -> impl FnOnce(image::ImageError) -> Error + '_ {
        move |source| Error::Image {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn json(path: &Path) -> impl FnOnce(serde_json::Error) -> Error + '_ {
        move |source| Error::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}
