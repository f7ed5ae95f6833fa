//! Runs a landmark model over an image corpus and fills the output stores.
//!
//! Re-running is a full rebuild per class: a class's output folder and CSV
//! are emptied before its images are processed, so repeated runs never
//! duplicate rows. Classes outside the corpus are left alone.

use std::path::{Path, PathBuf};

use image::ImageReader;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use rayon::prelude::*;
use rerun::RecordingStream;
use serde::Serialize;

use crate::config::BootstrapConfig;
use crate::corpus::{ClassImages, CorpusStructureError, ImageCorpus, image_id};
use crate::error::{Error, Result};
use crate::model::{InputImage, LandmarkModel};
use crate::store::{EmbeddingRow, EmbeddingStore, EmbeddingWriter, ImageStore};
use crate::visualization::{draw_pose, log_annotated};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOutcome {
    /// Annotated image and embedding row written.
    Detected,
    /// Plain image written for inspection, no row.
    Missed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassReport {
    pub class: String,
    /// Images taken from the class after applying the limit.
    pub processed: usize,
    pub detected: usize,
    pub missed: usize,
    /// Images that could not be decoded or written.
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BootstrapReport {
    pub model: String,
    pub classes: Vec<ClassReport>,
    /// Classes skipped because their input or output could not be prepared.
    pub class_errors: Vec<CorpusStructureError>,
}

impl BootstrapReport {
    pub fn class(&self, label: &str) -> Option<&ClassReport> {
        self.classes.iter().find(|c| c.class == label)
    }

    pub fn detected(&self) -> usize {
        self.classes.iter().map(|c| c.detected).sum()
    }

    pub fn missed(&self) -> usize {
        self.classes.iter().map(|c| c.missed).sum()
    }
}

/// Resolves symlinks and `..` for the existing part of `path`.
fn resolve(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut existing = absolute.as_path();
    let mut rest = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => return absolute,
        }
    }
    let mut resolved = existing
        .canonicalize()
        .unwrap_or_else(|_| existing.to_path_buf());
    resolved.extend(rest.iter().rev());
    resolved
}

/// True if the folders are equal or one contains the other.
fn overlapping(images_in: &Path, images_out: &Path) -> bool {
    let (a, b) = (resolve(images_in), resolve(images_out));
    a.starts_with(&b) || b.starts_with(&a)
}

pub struct BootstrapPipeline<'a> {
    model: &'a dyn LandmarkModel,
    config: BootstrapConfig,
    images_out: ImageStore,
    embeddings: EmbeddingStore,
    recording: Option<&'a RecordingStream>,
}

impl<'a> BootstrapPipeline<'a> {
    /// Creates the output roots. Failing to do so is fatal for the run, as is
    /// an output image folder that overlaps the input folder.
    pub fn new(model: &'a dyn LandmarkModel, config: BootstrapConfig) -> Result<Self> {
        if overlapping(&config.images_in, &config.images_out) {
            return Err(Error::OverlappingFolders {
                input: config.images_in.clone(),
                output: config.images_out.clone(),
            });
        }
        let images_out = ImageStore::new(&config.images_out);
        let embeddings = EmbeddingStore::new(&config.csvs_out);
        images_out.create()?;
        embeddings.create()?;
        Ok(Self {
            model,
            config,
            images_out,
            embeddings,
            recording: None,
        })
    }

    pub fn with_recording(mut self, recording: &'a RecordingStream) -> Self {
        self.recording = Some(recording);
        self
    }

    pub fn image_store(&self) -> &ImageStore {
        &self.images_out
    }

    pub fn embedding_store(&self) -> &EmbeddingStore {
        &self.embeddings
    }

    fn progress(&self) -> MultiProgress {
        if self.config.show_progress {
            MultiProgress::new()
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        }
    }

    fn class_bar(multi: &MultiProgress, class: &ClassImages, len: usize) -> ProgressBar {
        let bar = multi.add(ProgressBar::new(len as u64));
        if let Ok(style) = ProgressStyle::with_template("{prefix:>12} [{bar:40}] {pos}/{len}") {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_prefix(class.label.clone());
        bar
    }

    /// Bootstraps every class of `corpus`.
    ///
    /// Per-image and per-class failures are recorded in the report and never
    /// stop sibling work.
    pub fn run(&self, corpus: &ImageCorpus) -> BootstrapReport {
        log::info!(
            "bootstrapping {} classes from {} with {}",
            corpus.classes().len(),
            corpus.root().display(),
            self.model.name()
        );
        let multi = self.progress();
        let run_class = |class: &ClassImages| {
            let result = self.run_class(class, &multi);
            if let Err(e) = &result {
                log::warn!("class `{}` skipped: {}", class.label, e);
            }
            (class.label.clone(), result)
        };
        let results: Vec<(String, Result<ClassReport>)> = if self.config.parallel_classes {
            corpus.classes().par_iter().map(run_class).collect()
        } else {
            corpus.classes().iter().map(run_class).collect()
        };

        let mut report = BootstrapReport {
            model: self.model.name(),
            class_errors: corpus.issues().to_vec(),
            ..Default::default()
        };
        for (class, result) in results {
            match result {
                Ok(class_report) => report.classes.push(class_report),
                Err(e) => report.class_errors.push(CorpusStructureError {
                    class,
                    reason: e.to_string(),
                }),
            }
        }
        report
    }

    fn run_class(&self, class: &ClassImages, multi: &MultiProgress) -> Result<ClassReport> {
        self.images_out.reset_class(&class.label)?;
        let mut csv = self.embeddings.start_class(&class.label)?;

        let limit = self.config.per_class_limit.unwrap_or(usize::MAX);
        let selected: Vec<_> = class.images.iter().take(limit).collect();
        let bar = Self::class_bar(multi, class, selected.len());

        let mut report = ClassReport {
            class: class.label.clone(),
            processed: selected.len(),
            ..Default::default()
        };
        for (step, path) in selected.into_iter().enumerate() {
            let id = image_id(path);
            match self.process_image(class, path, &id, &mut csv, step) {
                Ok(ImageOutcome::Detected) => report.detected += 1,
                Ok(ImageOutcome::Missed) => report.missed += 1,
                Err(e) => {
                    log::warn!("{}/{}: {}", class.label, id, e);
                    report.failed.push(id);
                }
            }
            bar.inc(1);
        }
        bar.finish();
        log::info!(
            "{}: {} processed, {} detected, {} missed, {} failed",
            report.class,
            report.processed,
            report.detected,
            report.missed,
            report.failed.len()
        );
        Ok(report)
    }

    /// The output image is written before the row so that an interrupted run
    /// can only leave an image without a row, never the reverse.
    fn process_image(
        &self,
        class: &ClassImages,
        path: &Path,
        id: &str,
        csv: &mut EmbeddingWriter,
        step: usize,
    ) -> Result<ImageOutcome> {
        let pixels = ImageReader::open(path)
            .map_err(Error::io(path))?
            .with_guessed_format()
            .map_err(Error::io(path))?
            .decode()
            .map_err(Error::image(path))?;
        let input = InputImage {
            class: class.label.clone(),
            id: id.to_string(),
            path: path.to_path_buf(),
            pixels,
        };

        let pose = self.model.detect(&input);
        let mut annotated = input.pixels.to_rgb8();
        if let Some(pose) = &pose {
            draw_pose(&mut annotated, pose, &self.config.annotation);
        }
        self.images_out.save(&class.label, id, &annotated)?;
        if let Some(recording) = self.recording {
            log_annotated(
                recording,
                &class.label,
                step as i64,
                &annotated,
                pose.as_ref(),
            );
        }

        match pose {
            Some(pose) => {
                let row = EmbeddingRow::from_pose(
                    id,
                    &pose,
                    input.pixels.width(),
                    input.pixels.height(),
                    self.config.coordinates,
                );
                csv.append(&row)?;
                log::trace!("{}/{}: pose detected", class.label, id);
                Ok(ImageOutcome::Detected)
            }
            None => {
                log::debug!("{}/{}: no pose detected", class.label, id);
                Ok(ImageOutcome::Missed)
            }
        }
    }
}
