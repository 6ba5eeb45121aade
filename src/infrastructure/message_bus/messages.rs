//! Queue Payloads
//!
//! Wire shapes for the three named queues (`frames`, `detections`,
//! `recognitions`). Field names follow the inter-worker contract so a
//! message produced by one worker deserializes unchanged in the next;
//! unknown fields are ignored by `serde` and missing required fields
//! surface as a `PipelineError::MessageData` (poison) at the consumer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Published by the Capture Worker onto the `frames` queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameMessage {
    pub object_key: String,
    pub frame_uuid: Uuid,
    pub tag_video: String,
    pub data_captura_frame: String,
    pub inicio_processamento: f64,
    pub tempo_captura_frame: f64,
    pub timestamp: f64,
    pub fps: Option<f64>,
    pub duracao: Option<f64>,
    pub fim_captura: f64,
}

/// Published by the Detection Worker onto the `detections` queue, once
/// per kept face crop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionMessage {
    pub object_key: String,
    pub frame_uuid: Uuid,
    pub tag_video: String,
    pub data_captura_frame: String,
    pub inicio_processamento: f64,
    pub tempo_captura_frame: f64,
    pub timestamp: f64,
    pub fps: Option<f64>,
    pub duracao: Option<f64>,
    pub tempo_deteccao: f64,
    pub frame_total_faces: u32,
    pub tempo_espera_captura_deteccao: f64,
    pub inicio_deteccao: f64,
    pub fim_deteccao: f64,
}

/// Published by the Recognition Worker onto the `recognitions` queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionMessage {
    pub uuid: Uuid,
    pub tags: Vec<Uuid>,
    pub reconhecimento_path: String,
    pub frame_uuid: Uuid,
    pub tag_video: String,
    pub data_captura_frame: String,
    pub inicio_processamento: f64,
    pub tempo_captura_frame: f64,
    pub timestamp: f64,
    pub fps: Option<f64>,
    pub duracao: Option<f64>,
    pub frame_total_faces: u32,
    pub tempo_deteccao: f64,
    pub tempo_reconhecimento: f64,
    pub tempo_espera_captura_deteccao: f64,
    pub tempo_espera_deteccao_reconhecimento: f64,
    pub inicio_reconhecimento: f64,
    pub fim_reconhecimento: f64,
}
