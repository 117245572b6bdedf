use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::camera::ProjectionMatrix;
use crate::object::{Annotation, ObjectClass};

/// Error types for the KITTI readers.
#[derive(Debug, thiserror::Error)]
pub enum KittiError {
    /// Error opening or reading a file
    #[error("error reading file: {0}")]
    IoError(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error {0}")]
    ParseError(String),
}

/// The two color-camera projection matrices of a KITTI frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StereoCalibration {
    /// Left color camera (`P2`).
    pub left: ProjectionMatrix,
    /// Right color camera (`P3`).
    pub right: ProjectionMatrix,
}

/// Number of whitespace-separated fields of a ground-truth label row.
const NUM_LABEL_FIELDS: usize = 15;

/// Utility functions for parsing KITTI text files
fn parse_part<T: std::str::FromStr>(s: &str) -> Result<T, KittiError>
where
    T::Err: std::fmt::Display,
{
    s.parse::<T>()
        .map_err(|e| KittiError::ParseError(format!("{}: {}", s, e)))
}

/// Read a calibration file and return the left and right camera matrices.
///
/// # Arguments
///
/// * `path` - The path to the `calib/<frame>.txt` file.
pub fn read_calibration(path: impl AsRef<Path>) -> Result<StereoCalibration, KittiError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut left = None;
    let mut right = None;

    for line in reader.lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("P2:") => left = Some(parse_matrix_row(parts)?),
            Some("P3:") => {
                right = Some(parse_matrix_row(parts)?);
                break;
            }
            _ => continue,
        }
    }

    match (left, right) {
        (Some(left), Some(right)) => Ok(StereoCalibration { left, right }),
        (None, _) => Err(KittiError::ParseError("missing P2 row".to_string())),
        (_, None) => Err(KittiError::ParseError("missing P3 row".to_string())),
    }
}

/// Parse the 12 values following a matrix row label.
fn parse_matrix_row<'a>(parts: impl Iterator<Item = &'a str>) -> Result<ProjectionMatrix, KittiError> {
    let values = parts
        .map(parse_part::<f32>)
        .collect::<Result<Vec<_>, _>>()?;
    let values: [f32; 12] = values.try_into().map_err(|v: Vec<f32>| {
        KittiError::ParseError(format!("expected 12 matrix values, got {}", v.len()))
    })?;
    Ok(ProjectionMatrix::from_row_major(&values))
}

/// Read a label file and return the annotations of the requested classes.
///
/// Rows whose type is not one of `classes` are skipped without being parsed further.
///
/// # Arguments
///
/// * `path` - The path to the `label_2/<frame>.txt` file.
/// * `classes` - The classes to keep.
pub fn read_labels(
    path: impl AsRef<Path>,
    classes: &[ObjectClass],
) -> Result<Vec<Annotation>, KittiError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut annotations = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if let Some(ann) = parse_label_line(&line, classes)? {
            annotations.push(ann);
        }
    }

    Ok(annotations)
}

/// Parse a label row.
/// NOTE: type, truncated, occluded, alpha, bbox(4), dimensions h w l, location x y z, rotation_y
///       and an optional trailing score.
fn parse_label_line(line: &str, classes: &[ObjectClass]) -> Result<Option<Annotation>, KittiError> {
    let parts = line.split_whitespace().collect::<Vec<_>>();

    let class = match parts.first().and_then(|name| ObjectClass::from_name(name)) {
        Some(class) if classes.contains(&class) => class,
        _ => return Ok(None),
    };

    if parts.len() < NUM_LABEL_FIELDS {
        return Err(KittiError::ParseError(format!(
            "Invalid number of parts: {}",
            parts.len()
        )));
    }

    let values = parts[1..NUM_LABEL_FIELDS]
        .iter()
        .map(|s| parse_part::<f32>(s))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(Annotation {
        class,
        truncation: values[0],
        occlusion: values[1],
        alpha: values[2],
        box2d: [values[3], values[4], values[5], values[6]],
        // stored as h, w, l on disk
        dimensions: [values[9], values[7], values[8]],
        location: [values[10], values[11], values[12]],
        rotation_y: values[13],
    }))
}

/// Read an image-set split file and return its frame identifiers.
pub fn read_split(path: impl AsRef<Path>) -> Result<Vec<String>, KittiError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut ids = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let id = line.trim();
        if !id.is_empty() {
            ids.push(id.to_string());
        }
    }

    Ok(ids)
}
