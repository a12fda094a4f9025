#![cfg(feature = "backend-tract")]

//! ONNX backends running YOLOv8-family models through tract.
//!
//! - `TractPoseEstimator`: YOLOv8-pose, output `[1, 56, anchors]`
//!   (box, person score, 17 keypoints as x/y/score).
//! - `TractObjectDetector`: YOLOv8 COCO detection, output `[1, 84, anchors]`
//!   (box, 80 class scores).
//!
//! Frames are resampled (nearest neighbour) to the square model input.
//! Coordinates are reported normalized to 0..1.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::{ObjectDetector, PoseEstimator};
use crate::detect::result::{BodyPart, BoundingBox, DetectedObject, Landmark, LandmarkSet};

pub const COCO_LABELS: [&str; 80] = [
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "airplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "couch",
    "potted plant",
    "bed",
    "dining table",
    "toilet",
    "tv",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];

const POSE_CHANNELS: usize = 56;
const DETECT_CHANNELS: usize = 4 + COCO_LABELS.len();
const NMS_IOU: f32 = 0.45;
const KEYPOINT_MIN_SCORE: f32 = 0.5;

/// Loaded model plus its square input size.
struct OnnxModel {
    plan: TypedRunnableModel<TypedModel>,
    input_size: u32,
}

impl OnnxModel {
    fn load(model_path: &Path, input_size: u32) -> Result<Self> {
        if input_size == 0 {
            return Err(anyhow!("model input size must be > 0"));
        }
        let side = input_size as usize;
        let plan = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, side, side)),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;
        Ok(Self { plan, input_size })
    }

    fn build_input(&self, pixels: &[u8], width: u32, height: u32) -> Result<Tensor> {
        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if width == 0 || height == 0 || pixels.len() != expected_len {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected_len,
                width,
                height,
                pixels.len()
            ));
        }

        let side = self.input_size as usize;
        let (w, h) = (width as usize, height as usize);
        let input = tract_ndarray::Array4::from_shape_fn((1, 3, side, side), |(_, c, y, x)| {
            let src_x = (x * w / side).min(w - 1);
            let src_y = (y * h / side).min(h - 1);
            pixels[(src_y * w + src_x) * 3 + c] as f32 / 255.0
        });
        Ok(input.into_tensor())
    }

    /// Run the model and return its first output as `[channels, anchors]`.
    fn run(&self, pixels: &[u8], width: u32, height: u32) -> Result<tract_ndarray::Array2<f32>> {
        let input = self.build_input(pixels, width, height)?;
        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?
            .into_dimensionality::<tract_ndarray::Ix3>()
            .context("model output was not rank 3")?;
        Ok(view.index_axis(tract_ndarray::Axis(0), 0).to_owned())
    }

    fn normalize_box(&self, cx: f32, cy: f32, w: f32, h: f32) -> BoundingBox {
        let side = self.input_size as f32;
        BoundingBox {
            x: ((cx - w / 2.0) / side).clamp(0.0, 1.0),
            y: ((cy - h / 2.0) / side).clamp(0.0, 1.0),
            w: (w / side).clamp(0.0, 1.0),
            h: (h / side).clamp(0.0, 1.0),
        }
    }
}

/// YOLOv8-pose estimator. Reports the highest-scoring person.
pub struct TractPoseEstimator {
    model: OnnxModel,
    confidence_threshold: f32,
}

impl TractPoseEstimator {
    pub fn new<P: AsRef<Path>>(model_path: P, input_size: u32) -> Result<Self> {
        Ok(Self {
            model: OnnxModel::load(model_path.as_ref(), input_size)?,
            confidence_threshold: 0.5,
        })
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }
}

impl PoseEstimator for TractPoseEstimator {
    fn name(&self) -> &'static str {
        "tract-pose"
    }

    fn estimate(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Option<LandmarkSet>> {
        let output = self.model.run(pixels, width, height)?;
        if output.nrows() != POSE_CHANNELS {
            return Err(anyhow!(
                "pose model produced {} channels, expected {}",
                output.nrows(),
                POSE_CHANNELS
            ));
        }

        let best = (0..output.ncols())
            .map(|anchor| (anchor, output[[4, anchor]]))
            .filter(|(_, score)| *score >= self.confidence_threshold)
            .max_by(|a, b| a.1.total_cmp(&b.1));
        let Some((anchor, _)) = best else {
            return Ok(None);
        };

        let side = self.model.input_size as f32;
        let mut set = LandmarkSet::new();
        for (index, part) in BodyPart::ALL.iter().enumerate() {
            let base = 5 + index * 3;
            let score = output[[base + 2, anchor]];
            if score < KEYPOINT_MIN_SCORE {
                continue;
            }
            let landmark = Landmark::new(
                (output[[base, anchor]] / side).clamp(0.0, 1.0),
                (output[[base + 1, anchor]] / side).clamp(0.0, 1.0),
            )
            .with_visibility(score);
            set.insert(*part, landmark);
        }

        if set.is_empty() {
            Ok(None)
        } else {
            Ok(Some(set))
        }
    }
}

/// YOLOv8 COCO object detector with greedy IoU suppression per class.
pub struct TractObjectDetector {
    model: OnnxModel,
    confidence_threshold: f32,
}

impl TractObjectDetector {
    pub fn new<P: AsRef<Path>>(model_path: P, input_size: u32) -> Result<Self> {
        Ok(Self {
            model: OnnxModel::load(model_path.as_ref(), input_size)?,
            confidence_threshold: 0.5,
        })
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }
}

impl ObjectDetector for TractObjectDetector {
    fn name(&self) -> &'static str {
        "tract-objects"
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<DetectedObject>> {
        let output = self.model.run(pixels, width, height)?;
        if output.nrows() != DETECT_CHANNELS {
            return Err(anyhow!(
                "detection model produced {} channels, expected {}",
                output.nrows(),
                DETECT_CHANNELS
            ));
        }

        let mut candidates: Vec<(usize, DetectedObject)> = Vec::new();
        for anchor in 0..output.ncols() {
            let best = (0..COCO_LABELS.len())
                .map(|class| (class, output[[4 + class, anchor]]))
                .max_by(|a, b| a.1.total_cmp(&b.1));
            let Some((class, score)) = best else {
                continue;
            };
            if score < self.confidence_threshold {
                continue;
            }
            let bbox = self.model.normalize_box(
                output[[0, anchor]],
                output[[1, anchor]],
                output[[2, anchor]],
                output[[3, anchor]],
            );
            candidates.push((
                class,
                DetectedObject::new(COCO_LABELS[class], score).with_bbox(bbox),
            ));
        }

        Ok(suppress_overlaps(candidates))
    }
}

fn suppress_overlaps(mut candidates: Vec<(usize, DetectedObject)>) -> Vec<DetectedObject> {
    candidates.sort_by(|a, b| b.1.confidence.total_cmp(&a.1.confidence));
    let mut kept: Vec<(usize, DetectedObject)> = Vec::new();
    for (class, candidate) in candidates {
        let overlaps = kept
            .iter()
            .any(|(k, obj)| *k == class && obj.bbox.iou(&candidate.bbox) > NMS_IOU);
        if !overlaps {
            kept.push((class, candidate));
        }
    }
    kept.into_iter().map(|(_, obj)| obj).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_label_is_coco_class_67() {
        assert_eq!(COCO_LABELS[67], "cell phone");
    }

    #[test]
    fn suppression_keeps_best_of_overlapping_same_class() {
        let bbox = BoundingBox {
            x: 0.1,
            y: 0.1,
            w: 0.3,
            h: 0.3,
        };
        let kept = suppress_overlaps(vec![
            (67, DetectedObject::new("cell phone", 0.6).with_bbox(bbox)),
            (67, DetectedObject::new("cell phone", 0.9).with_bbox(bbox)),
            (0, DetectedObject::new("person", 0.7).with_bbox(bbox)),
        ]);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].confidence, 0.9);
        assert_eq!(kept[1].label, "person");
    }
}
