use std::path::Path;

use image::RgbImage;
use image::imageops::{self, FilterType};
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::Tensor;

use crate::detector::{BoundingBox, Detection, Detector};
use crate::error::DetectorError;
use crate::video::Frame;

/// Square input edge of the exported YOLOv8 graph.
pub const INPUT_SIZE: u32 = 640;

/// Row of the `person` class score in a COCO-trained YOLOv8 output.
const PERSON_ROW: usize = 4;

/// YOLOv8 person detector running an exported ONNX graph. Frames are
/// expected to hold encoded JPEG or PNG images.
pub struct OnnxDetector {
    session: Session,
}

impl OnnxDetector {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DetectorError> {
        let path = path.as_ref();

        let session = Session::builder()
            .and_then(|builder| builder.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|builder| builder.commit_from_file(path))
            .map_err(|e| DetectorError::ModelLoad {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        tracing::info!("onnx detector loaded from {}", path.display());

        Ok(Self { session })
    }
}

impl Detector for OnnxDetector {
    fn detect(&self, frame: &Frame, confidence: f32) -> Result<Vec<Detection>, DetectorError> {
        let frame_error = |reason: String| DetectorError::Frame {
            index: frame.index,
            reason,
        };

        let image = image::load_from_memory(&frame.data)
            .map_err(|e| frame_error(e.to_string()))?
            .to_rgb8();
        let scale = (
            image.width() as f32 / INPUT_SIZE as f32,
            image.height() as f32 / INPUT_SIZE as f32,
        );

        let input = Tensor::from_array((
            [1usize, 3, INPUT_SIZE as usize, INPUT_SIZE as usize],
            planar_input(&image),
        ))
        .map_err(|e| frame_error(e.to_string()))?;

        let inputs = ort::inputs![input].map_err(|e| frame_error(e.to_string()))?;
        let outputs = self
            .session
            .run(inputs)
            .map_err(|e| frame_error(e.to_string()))?;
        let (shape, data) = outputs[0]
            .try_extract_raw_tensor::<f32>()
            .map_err(|e| frame_error(e.to_string()))?;

        person_detections(&shape, data, confidence, scale).map_err(frame_error)
    }
}

/// Resizes to the model input and lays the pixels out as normalized CHW.
fn planar_input(image: &RgbImage) -> Vec<f32> {
    let resized = imageops::resize(image, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);
    let plane = (INPUT_SIZE * INPUT_SIZE) as usize;

    let mut data = vec![0.0; 3 * plane];
    for (x, y, pixel) in resized.enumerate_pixels() {
        let offset = (y * INPUT_SIZE + x) as usize;
        for channel in 0..3 {
            data[channel * plane + offset] = pixel[channel] as f32 / 255.0;
        }
    }

    data
}

/// Decodes a `[1, 4 + classes, anchors]` output into person boxes scaled
/// back to the source frame.
fn person_detections(
    shape: &[i64],
    output: &[f32],
    confidence: f32,
    (scale_x, scale_y): (f32, f32),
) -> Result<Vec<Detection>, String> {
    let [_, rows, anchors] = shape else {
        return Err(format!("unexpected output shape {shape:?}"));
    };
    let (rows, anchors) = (*rows as usize, *anchors as usize);
    if rows <= PERSON_ROW || output.len() < rows * anchors {
        return Err(format!("unexpected output shape {shape:?}"));
    }

    let value = |row: usize, anchor: usize| output[row * anchors + anchor];

    Ok((0..anchors)
        .filter(|&anchor| value(PERSON_ROW, anchor) >= confidence)
        .map(|anchor| {
            let (cx, cy) = (value(0, anchor), value(1, anchor));
            let (width, height) = (value(2, anchor), value(3, anchor));

            Detection {
                confidence: value(PERSON_ROW, anchor),
                bbox: BoundingBox {
                    x: (cx - width / 2.0) * scale_x,
                    y: (cy - height / 2.0) * scale_y,
                    width: width * scale_x,
                    height: height * scale_y,
                },
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_rows_are_decoded_and_scaled() {
        // Two anchors, four box rows plus person and one other class
        #[rustfmt::skip]
        let output = [
            320.0, 100.0,
            320.0, 100.0,
            64.0, 20.0,
            128.0, 20.0,
            0.8, 0.3,
            0.1, 0.9,
        ];

        let detections = person_detections(&[1, 6, 2], &output, 0.5, (2.0, 1.0)).unwrap();

        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].confidence, 0.8);
        assert_eq!(
            detections[0].bbox,
            BoundingBox {
                x: 576.0,
                y: 256.0,
                width: 128.0,
                height: 128.0,
            }
        );
    }

    #[test]
    fn test_unexpected_output_shape_is_rejected() {
        assert!(person_detections(&[1, 4, 2], &[0.0; 8], 0.5, (1.0, 1.0)).is_err());
        assert!(person_detections(&[6, 2], &[0.0; 12], 0.5, (1.0, 1.0)).is_err());
        assert!(person_detections(&[1, 6, 4], &[0.0; 12], 0.5, (1.0, 1.0)).is_err());
    }

    #[test]
    fn test_planar_input_is_normalized_chw() {
        let image = RgbImage::from_pixel(8, 8, image::Rgb([255, 0, 51]));
        let data = planar_input(&image);
        let plane = (INPUT_SIZE * INPUT_SIZE) as usize;

        assert_eq!(data.len(), 3 * plane);
        assert_eq!(data[0], 1.0);
        assert_eq!(data[plane], 0.0);
        assert!((data[2 * plane] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_missing_model_fails_to_load() {
        assert!(matches!(
            OnnxDetector::load("/nonexistent/yolov8n.onnx"),
            Err(DetectorError::ModelLoad { .. })
        ));
    }
}
