//! Joint angle features from landmark positions.
//!
//! Inputs are taken as-is from the landmark space: `x` and `y` are fractions
//! of the frame size while `z` is the model's relative depth. The angles are
//! therefore image-space features, not anatomical angles in metric units.

use glam::DVec3;
use thiserror::Error;

/// Denominators below this are treated as a zero-length vector.
const MIN_DENOMINATOR: f64 = 1e-12;

/// Cosines this close to -1 or 1 are snapped to 180 or 0 degrees, e.g.
/// antiparallel vectors evaluating to 179.9999988.
const PARALLEL_COS_EPSILON: f64 = 1e-12;

/// Absorbs rounding shortfall of exact angles such as 44.99999999999999.
const TRUNCATION_TOLERANCE_DEG: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    #[error("vector has zero magnitude, angle is undefined")]
    ZeroMagnitude,
    #[error("vector has a non-finite component")]
    NonFinite,
    #[error("landmark index {index} out of range for pose of {len} landmarks")]
    LandmarkOutOfRange { index: usize, len: usize },
}

/// Angle in whole degrees between `a` and `b` seen as vectors from the origin.
///
/// Computes `acos(a·b / (|a||b|))` with the cosine clamped to `[-1, 1]` and
/// truncates the result, so the value is always in `0..=180`.
pub fn angle_between_vectors(a: DVec3, b: DVec3) -> Result<u32, GeometryError> {
    if !a.is_finite() || !b.is_finite() {
        return Err(GeometryError::NonFinite);
    }
    let denominator = a.length() * b.length();
    if denominator < MIN_DENOMINATOR {
        return Err(GeometryError::ZeroMagnitude);
    }
    let cos = (a.dot(b) / denominator).clamp(-1.0, 1.0);
    if cos >= 1.0 - PARALLEL_COS_EPSILON {
        return Ok(0);
    }
    if cos <= -1.0 + PARALLEL_COS_EPSILON {
        return Ok(180);
    }
    let degrees = cos.acos().to_degrees() + TRUNCATION_TOLERANCE_DEG;
    Ok(degrees.floor().clamp(0.0, 180.0) as u32)
}

/// Angle at `vertex` between the limbs `vertex -> b` and `vertex -> c`.
pub fn angle_at_vertex(vertex: DVec3, b: DVec3, c: DVec3) -> Result<u32, GeometryError> {
    angle_between_vectors(b - vertex, c - vertex)
}
