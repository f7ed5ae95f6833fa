use std::path::Path;

use serde::{Serialize, de::DeserializeOwned};
use time::OffsetDateTime;

use crate::error::{Error, Result};
use crate::landmark::{Landmark, Pose};

/// Serializes an object to a JSON file.
pub fn object_to_json<T: Serialize>(output_path: &Path, object: &T) -> Result<()> {
    let j = serde_json::to_string_pretty(object).map_err(Error::json(output_path))?;
    std::fs::write(output_path, j).map_err(Error::io(output_path))
}

/// Deserializes an object from a JSON file.
pub fn object_from_json<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(file_path).map_err(Error::io(file_path))?;
    serde_json::from_str(&contents).map_err(Error::json(file_path))
}

#[derive(serde::Serialize, serde::Deserialize)]
struct PoseFile {
    landmarks: Option<Vec<Landmark>>,
}

/// Reads a landmark file written by an external detector.
///
/// `{"landmarks": null}` or an empty list means nothing was detected.
pub fn load_pose(path: &Path) -> Result<Option<Pose>> {
    let file: PoseFile = object_from_json(path)?;
    match file.landmarks {
        Some(landmarks) if !landmarks.is_empty() => Pose::new(landmarks).map(Some),
        _ => Ok(None),
    }
}

pub fn save_pose(path: &Path, pose: &Pose) -> Result<()> {
    object_to_json(
        path,
        &PoseFile {
            landmarks: Some(pose.landmarks().to_vec()),
        },
    )
}

#[derive(serde::Serialize)]
struct Report<'a, T: Serialize> {
    timestamp: String,
    command: &'a str,
    #[serde(flatten)]
    body: &'a T,
}

/// Writes a run report stamped with the local time.
pub fn write_report<T: Serialize>(output_path: &Path, command: &str, body: &T) -> Result<()> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let report = Report {
        timestamp: now.to_string(),
        command,
        body,
    };
    object_to_json(output_path, &report)
}
