use pose_bootstrap::config::{BootstrapConfig, CoordinateSpace};
use pose_bootstrap::io::object_to_json;
use tempfile::TempDir;

#[test]
fn test_partial_config_falls_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"images_in": "poses", "per_class_limit": 3, "coordinates": "normalized",
            "annotation": {"landmark_radius": 2}}"#,
    )
    .unwrap();

    let config = BootstrapConfig::from_json_file(&path).unwrap();
    assert_eq!(config.images_in.to_str(), Some("poses"));
    assert_eq!(config.images_out.to_str(), Some("fitness_poses_images_out"));
    assert_eq!(config.per_class_limit, Some(3));
    assert_eq!(config.coordinates, CoordinateSpace::Normalized);
    assert_eq!(config.annotation.landmark_radius, 2);
    assert!(config.annotation.draw_connections);
    assert!(config.classes.is_none());
}

#[test]
fn test_config_written_back_loads_the_same() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    let mut config = BootstrapConfig::with_folders("in", "out", "csv");
    config.classes = Some(vec!["squat".to_string()]);
    object_to_json(&path, &config).unwrap();

    let loaded = BootstrapConfig::from_json_file(&path).unwrap();
    assert_eq!(loaded.csvs_out.to_str(), Some("csv"));
    assert_eq!(loaded.classes, config.classes);
    assert_eq!(loaded.coordinates, CoordinateSpace::Pixel);
}

#[test]
fn test_missing_config_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    assert!(BootstrapConfig::from_json_file(&temp_dir.path().join("nope.json")).is_err());
}
