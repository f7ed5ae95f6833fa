//! Restores the one-to-one match between output images and CSV rows.
//!
//! The pipeline writes an output image for every processed image but a row
//! only for detected poses. Aligning removes every output image whose id has
//! no row in its class CSV. Rows are never deleted: a row without an image
//! is reported and left for the operator. An image folder without a class
//! CSV is reported and left as is.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::Serialize;

use crate::corpus::CorpusStructureError;
use crate::error::{Error, Result};
use crate::store::{EmbeddingStore, ImageStore};

/// Set differences of one class between the two stores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassAlignment {
    pub class: String,
    /// Output images without a row. These get removed.
    pub orphaned_images: BTreeSet<String>,
    /// Rows without an output image. Reported only.
    pub rows_without_image: BTreeSet<String>,
}

impl ClassAlignment {
    pub fn is_consistent(&self) -> bool {
        self.orphaned_images.is_empty() && self.rows_without_image.is_empty()
    }
}

/// What [`ConsistencyReconciler::reconcile`] would do.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcilePlan {
    pub alignments: Vec<ClassAlignment>,
    /// Classes left untouched because they cannot be compared, e.g. an image
    /// folder without a class CSV.
    pub class_errors: Vec<CorpusStructureError>,
}

impl ReconcilePlan {
    pub fn is_consistent(&self) -> bool {
        self.class_errors.is_empty() && self.alignments.iter().all(ClassAlignment::is_consistent)
    }

    pub fn orphaned_count(&self) -> usize {
        self.alignments.iter().map(|a| a.orphaned_images.len()).sum()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
    /// Removed output image files per class.
    pub removed: BTreeMap<String, Vec<PathBuf>>,
    pub rows_without_image: BTreeMap<String, BTreeSet<String>>,
    pub class_errors: Vec<CorpusStructureError>,
}

impl ReconcileReport {
    pub fn removed_count(&self) -> usize {
        self.removed.values().map(Vec::len).sum()
    }
}

pub struct ConsistencyReconciler<'a> {
    images: &'a ImageStore,
    embeddings: &'a EmbeddingStore,
}

impl<'a> ConsistencyReconciler<'a> {
    pub fn new(images: &'a ImageStore, embeddings: &'a EmbeddingStore) -> Self {
        Self { images, embeddings }
    }

    /// Every class present in either store.
    fn classes(&self) -> Result<Vec<String>> {
        let mut classes = self.images.classes()?;
        classes.extend(self.embeddings.classes()?);
        classes.sort();
        classes.dedup();
        Ok(classes)
    }

    /// Fails for a class without a CSV, which must never read as "no rows".
    pub fn align_class(&self, class: &str) -> Result<ClassAlignment> {
        let row_ids = self.embeddings.ids(class)?;
        let image_ids = self.images.ids(class)?;
        Ok(ClassAlignment {
            class: class.to_string(),
            orphaned_images: image_ids.difference(&row_ids).cloned().collect(),
            rows_without_image: row_ids.difference(&image_ids).cloned().collect(),
        })
    }

    /// Computes what [`reconcile`](Self::reconcile) would do, touching nothing.
    ///
    /// A missing embedding root is an error. A class that cannot be compared
    /// is recorded in the plan and skipped.
    pub fn plan(&self) -> Result<ReconcilePlan> {
        let root = self.embeddings.root();
        if !root.is_dir() {
            return Err(Error::MissingEmbeddings(root.to_path_buf()));
        }
        let mut plan = ReconcilePlan::default();
        for class in self.classes()? {
            match self.align_class(&class) {
                Ok(alignment) => plan.alignments.push(alignment),
                Err(e) => {
                    log::warn!("cannot align class `{}`: {}", class, e);
                    plan.class_errors.push(CorpusStructureError {
                        class,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(plan)
    }

    /// Deletes orphaned output images in every class that can be compared.
    pub fn reconcile(&self) -> Result<ReconcileReport> {
        let plan = self.plan()?;
        let mut report = ReconcileReport {
            class_errors: plan.class_errors,
            ..Default::default()
        };
        for alignment in plan.alignments {
            let class = alignment.class;
            let mut removed = Vec::new();
            for id in &alignment.orphaned_images {
                match self.images.remove(&class, id) {
                    Ok(path) => {
                        log::debug!("removed image from folder: {}", path.display());
                        removed.push(path);
                    }
                    Err(e) => {
                        log::warn!("cannot remove {}/{}: {}", class, id, e);
                        report.class_errors.push(CorpusStructureError {
                            class: class.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
            if !alignment.rows_without_image.is_empty() {
                log::warn!(
                    "{}: {} rows have no output image",
                    class,
                    alignment.rows_without_image.len()
                );
                report
                    .rows_without_image
                    .insert(class.clone(), alignment.rows_without_image);
            }
            if !removed.is_empty() {
                log::info!("{}: removed {} orphaned images", class, removed.len());
                report.removed.insert(class, removed);
            }
        }
        Ok(report)
    }
}
