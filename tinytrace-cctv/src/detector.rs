use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::DetectorError;
use crate::video::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Object detector shared read-only by every worker of a process.
pub trait Detector: Send + Sync {
    /// Candidate boxes with a score of at least `confidence`.
    fn detect(&self, frame: &Frame, confidence: f32) -> Result<Vec<Detection>, DetectorError>;
}

/// Score of a frame: the best candidate, or `None` when nothing was found.
pub fn frame_score(detections: &[Detection]) -> Option<f32> {
    detections
        .iter()
        .map(|detection| detection.confidence)
        .reduce(f32::max)
}

/// Recorded detector output for a known clip.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct DetectionSheet {
    #[serde(default)]
    pub model: String,
    /// Candidate boxes keyed by frame index
    #[serde(default)]
    pub frames: BTreeMap<u64, Vec<Detection>>,
    /// Frames the recorded run failed on
    #[serde(default)]
    pub unreadable_frames: BTreeSet<u64>,
}

/// Replays a detection sheet produced offline by the real model, so the
/// confirmation pipeline runs on hosts without an inference runtime.
#[derive(Debug, Clone)]
pub struct ReplayDetector {
    sheet: DetectionSheet,
}

impl ReplayDetector {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DetectorError> {
        let path = path.as_ref();
        let model_load = |reason: String| DetectorError::ModelLoad {
            path: path.to_path_buf(),
            reason,
        };

        let raw = fs::read_to_string(path).map_err(|e| model_load(e.to_string()))?;
        let sheet: DetectionSheet =
            serde_json::from_str(&raw).map_err(|e| model_load(e.to_string()))?;

        tracing::info!(
            "detector {} loaded from {} ({} annotated frames)",
            sheet.model,
            path.display(),
            sheet.frames.len()
        );

        Ok(Self { sheet })
    }

    pub fn from_sheet(sheet: DetectionSheet) -> Self {
        Self { sheet }
    }
}

impl Detector for ReplayDetector {
    fn detect(&self, frame: &Frame, confidence: f32) -> Result<Vec<Detection>, DetectorError> {
        if self.sheet.unreadable_frames.contains(&frame.index) {
            return Err(DetectorError::Frame {
                index: frame.index,
                reason: "malformed frame".to_string(),
            });
        }

        Ok(self
            .sheet
            .frames
            .get(&frame.index)
            .map(|candidates| {
                candidates
                    .iter()
                    .filter(|candidate| candidate.confidence >= confidence)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Loads the detector matching the artifact: an `.onnx` graph runs the model,
/// anything else is read as a detection sheet.
pub fn load_detector(path: impl AsRef<Path>) -> Result<Arc<dyn Detector>, DetectorError> {
    let path = path.as_ref();
    let is_onnx = path
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("onnx"));

    if !is_onnx {
        return Ok(Arc::new(ReplayDetector::load(path)?));
    }

    #[cfg(feature = "onnx")]
    {
        Ok(Arc::new(crate::onnx::OnnxDetector::load(path)?))
    }

    #[cfg(not(feature = "onnx"))]
    {
        Err(DetectorError::ModelLoad {
            path: path.to_path_buf(),
            reason: "built without the onnx feature".to_string(),
        })
    }
}
