//! The two output stores of a bootstrap run.
//!
//! Both are keyed by (class, image id): [`ImageStore`] holds the annotated
//! images under `<root>/<class>/<id>`, [`EmbeddingStore`] holds one
//! header-free CSV per class at `<root>/<class>.csv`.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use glob::glob;
use image::RgbImage;
use serde::Serialize;

use crate::config::CoordinateSpace;
use crate::corpus::{image_id, is_hidden, list_images, list_subdirs};
use crate::error::{Error, Result};
use crate::landmark::{LANDMARK_COUNT, Pose};
use crate::stats::Statistics;

/// One CSV record: the image id followed by x, y, z of every landmark.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddingRow {
    pub image_id: String,
    pub coordinates: Vec<f32>,
}

impl EmbeddingRow {
    pub const FIELD_COUNT: usize = 1 + 3 * LANDMARK_COUNT;

    pub fn from_pose(
        image_id: impl Into<String>,
        pose: &Pose,
        width: u32,
        height: u32,
        space: CoordinateSpace,
    ) -> EmbeddingRow {
        let (sx, sy, sz) = match space {
            CoordinateSpace::Pixel => (width as f32, height as f32, width as f32),
            CoordinateSpace::Normalized => (1.0, 1.0, 1.0),
        };
        let coordinates = pose
            .landmarks()
            .iter()
            .flat_map(|l| [l.x * sx, l.y * sy, l.z * sz])
            .collect();
        EmbeddingRow {
            image_id: image_id.into(),
            coordinates,
        }
    }

    pub fn to_record(&self) -> Vec<String> {
        std::iter::once(self.image_id.clone())
            .chain(self.coordinates.iter().map(|c| c.to_string()))
            .collect()
    }

    /// `None` for records of the wrong width or with unparsable numbers.
    pub fn from_record(record: &csv::StringRecord) -> Option<EmbeddingRow> {
        if record.len() != Self::FIELD_COUNT {
            return None;
        }
        let image_id = record.get(0)?.to_string();
        let coordinates = record
            .iter()
            .skip(1)
            .map(|f| f.trim().parse::<f32>().ok())
            .collect::<Option<Vec<_>>>()?;
        Some(EmbeddingRow {
            image_id,
            coordinates,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> ImageStore {
        ImageStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn create(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root).map_err(Error::io(&self.root))
    }

    pub fn class_dir(&self, class: &str) -> PathBuf {
        self.root.join(class)
    }

    pub fn image_path(&self, class: &str, id: &str) -> PathBuf {
        self.class_dir(class).join(id)
    }

    /// Classes with an output folder. Empty before the first run.
    pub fn classes(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        list_subdirs(&self.root)
    }

    pub fn ids(&self, class: &str) -> Result<BTreeSet<String>> {
        let dir = self.class_dir(class);
        if !dir.exists() {
            return Ok(BTreeSet::new());
        }
        Ok(list_images(&dir)?.iter().map(|p| image_id(p)).collect())
    }

    /// Empties the class folder, creating it if needed.
    pub fn reset_class(&self, class: &str) -> Result<()> {
        let dir = self.class_dir(class);
        if dir.exists() {
            std::fs::remove_dir_all(&dir).map_err(Error::io(&dir))?;
        }
        std::fs::create_dir_all(&dir).map_err(Error::io(&dir))
    }

    pub fn save(&self, class: &str, id: &str, img: &RgbImage) -> Result<PathBuf> {
        let path = self.image_path(class, id);
        img.save(&path).map_err(Error::image(&path))?;
        Ok(path)
    }

    pub fn remove(&self, class: &str, id: &str) -> Result<PathBuf> {
        let path = self.image_path(class, id);
        std::fs::remove_file(&path).map_err(Error::io(&path))?;
        Ok(path)
    }

    /// "images out" counts.
    pub fn statistics(&self) -> Result<Statistics> {
        let mut stats = Statistics::new("Images out");
        for class in self.classes()? {
            let n = self.ids(&class)?.len();
            stats.insert(class, n);
        }
        Ok(stats)
    }
}

#[derive(Debug, Clone)]
pub struct EmbeddingStore {
    root: PathBuf,
}

impl EmbeddingStore {
    pub fn new(root: impl Into<PathBuf>) -> EmbeddingStore {
        EmbeddingStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn create(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root).map_err(Error::io(&self.root))
    }

    pub fn csv_path(&self, class: &str) -> PathBuf {
        self.root.join(format!("{}.csv", class))
    }

    pub fn classes(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let pattern = format!("{}/*.csv", glob::Pattern::escape(&self.root.to_string_lossy()));
        let mut classes = Vec::new();
        for entry in glob(&pattern)? {
            let path = entry.map_err(|e| Error::Io {
                path: e.path().to_path_buf(),
                source: e.into(),
            })?;
            if path.is_file() && !is_hidden(&path) {
                if let Some(stem) = path.file_stem() {
                    classes.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        classes.sort();
        Ok(classes)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.csv_path(class).is_file()
    }

    /// Rows of `class` in file order. A missing CSV is an error, not an empty
    /// class.
    pub fn rows(&self, class: &str) -> Result<Vec<EmbeddingRow>> {
        let path = self.csv_path(class);
        if !path.is_file() {
            return Err(Error::MissingEmbeddings(path));
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)
            .map_err(Error::csv(&path))?;
        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(Error::csv(&path))?;
            match EmbeddingRow::from_record(&record) {
                Some(row) => rows.push(row),
                None => log::warn!(
                    "skipping malformed row {} in {} ({} fields)",
                    line + 1,
                    path.display(),
                    record.len()
                ),
            }
        }
        Ok(rows)
    }

    pub fn ids(&self, class: &str) -> Result<BTreeSet<String>> {
        Ok(self
            .rows(class)?
            .into_iter()
            .map(|row| row.image_id)
            .collect())
    }

    /// Truncates the class CSV and returns a writer appending to it.
    pub fn start_class(&self, class: &str) -> Result<EmbeddingWriter> {
        let path = self.csv_path(class);
        let file = File::create(&path).map_err(Error::io(&path))?;
        Ok(EmbeddingWriter { path, file })
    }

    /// Row counts per class.
    pub fn statistics(&self) -> Result<Statistics> {
        let mut stats = Statistics::new("Embeddings");
        for class in self.classes()? {
            let n = self.rows(&class)?.len();
            stats.insert(class, n);
        }
        Ok(stats)
    }
}

pub struct EmbeddingWriter {
    path: PathBuf,
    file: File,
}

impl EmbeddingWriter {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes one row with a single `write_all`, never a partial record.
    pub fn append(&mut self, row: &EmbeddingRow) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer
            .write_record(row.to_record())
            .map_err(Error::csv(&self.path))?;
        let bytes = writer
            .into_inner()
            .map_err(|e| Error::io(&self.path)(e.into_error()))?;
        self.file.write_all(&bytes).map_err(Error::io(&self.path))?;
        self.file.flush().map_err(Error::io(&self.path))
    }
}
