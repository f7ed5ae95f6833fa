mod common;

use std::io::Write;

use common::synthetic_pose;
use pose_bootstrap::Error;
use pose_bootstrap::config::CoordinateSpace;
use pose_bootstrap::stats::Statistics;
use pose_bootstrap::store::{EmbeddingRow, EmbeddingStore};
use tempfile::TempDir;

#[test]
fn test_torn_row_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let store = EmbeddingStore::new(temp_dir.path());
    let mut writer = store.start_class("squat").unwrap();
    let row = EmbeddingRow::from_pose("a.png", &synthetic_pose(), 20, 10, CoordinateSpace::Pixel);
    writer.append(&row).unwrap();
    drop(writer);

    // an externally killed writer leaves half a line behind
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(store.csv_path("squat"))
        .unwrap();
    file.write_all(b"b.png,1.5,2.5").unwrap();

    let rows = store.rows("squat").unwrap();
    assert_eq!(rows, vec![row]);
    assert_eq!(store.statistics().unwrap().get("squat"), 1);
}

#[test]
fn test_classes_from_csv_names() {
    let temp_dir = TempDir::new().unwrap();
    let store = EmbeddingStore::new(temp_dir.path());
    store.start_class("squat").unwrap();
    store.start_class("lunge").unwrap();
    std::fs::write(temp_dir.path().join("notes.txt"), b"x").unwrap();
    assert_eq!(store.classes().unwrap(), vec!["lunge", "squat"]);
    assert!(!store.has_class("pushup"));
    assert!(matches!(
        store.rows("pushup"),
        Err(Error::MissingEmbeddings(path)) if path == store.csv_path("pushup")
    ));
}

#[test]
fn test_statistics_differences() {
    let mut images = Statistics::new("Images out");
    images.insert("squat", 3);
    images.insert("lunge", 2);
    let mut rows = Statistics::new("Embeddings");
    rows.insert("squat", 3);
    rows.insert("lunge", 1);
    rows.insert("plank", 4);

    assert_eq!(images.total(), 5);
    assert_eq!(
        images.differences(&rows),
        vec![("lunge", 2, 1), ("plank", 0, 4)]
    );
}
