//! Detect Faces Use Case
//!
//! The Detection Worker's per-frame flow (§4.2): fetch the frame, run the
//! size+landmark filter over the raw detections, crop and upload each
//! kept face, and either publish one `DetectionMessage` per crop or, if
//! none qualify, insert the zero-face `FrameAggregate` placeholder
//! (mirrors `process_image()` / `salvar_frame_sem_faces()`).

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use crate::application::services::EventBus;
use crate::domain::entities::FrameAggregate;
use crate::domain::events::{FaceDetectedEvent, PipelineEvent};
use crate::domain::repositories::{FrameAggregateRepository, SequenceAllocator};
use crate::infrastructure::camera::{crop_face, DetectionInput, FaceDetector};
use crate::infrastructure::config::MessageBusConfig;
use crate::infrastructure::error::PipelineError;
use crate::infrastructure::message_bus::{DetectionMessage, FrameMessage, MessageBus};
use crate::infrastructure::object_store::ObjectStore;

use super::epoch_seconds;

pub struct DetectFacesUseCase {
    object_store: Arc<ObjectStore>,
    message_bus: Arc<MessageBus>,
    detector: Arc<dyn FaceDetector>,
    frame_aggregates: Arc<dyn FrameAggregateRepository>,
    sequence_allocator: Arc<dyn SequenceAllocator>,
    events: Arc<EventBus>,
    frames_bucket: String,
    detections_bucket: String,
    detections_queue: String,
}

impl DetectFacesUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        object_store: Arc<ObjectStore>,
        message_bus: Arc<MessageBus>,
        detector: Arc<dyn FaceDetector>,
        frame_aggregates: Arc<dyn FrameAggregateRepository>,
        sequence_allocator: Arc<dyn SequenceAllocator>,
        events: Arc<EventBus>,
        object_store_config: &crate::infrastructure::config::ObjectStoreConfig,
        bus_config: &MessageBusConfig,
    ) -> Self {
        Self {
            object_store,
            message_bus,
            detector,
            frame_aggregates,
            sequence_allocator,
            events,
            frames_bucket: object_store_config.frames_bucket.clone(),
            detections_bucket: object_store_config.detections_bucket.clone(),
            detections_queue: bus_config.detections_queue.clone(),
        }
    }

    pub async fn execute(&self, msg: FrameMessage) -> Result<(), PipelineError> {
        let inicio_deteccao = Utc::now();

        let png_bytes = self.object_store.get_object(&self.frames_bucket, &msg.object_key).await?;
        let frame_image = image::load_from_memory(&png_bytes)
            .map_err(|e| PipelineError::MessageData(format!("unreadable frame image: {e}")))?
            .to_rgb8();
        let (width, height) = (frame_image.width(), frame_image.height());

        let input = DetectionInput {
            rgb: frame_image.clone().into_raw(),
            width,
            height,
        };
        let detections = self.detector.detect(input);
        let qualifying: Vec<_> = detections.into_iter().filter(|d| d.passes_filter()).collect();

        let tempo_deteccao = epoch_seconds(Utc::now()) - msg.inicio_processamento;

        if qualifying.is_empty() {
            return self.insert_empty_aggregate(&msg).await;
        }

        let tempo_espera_captura_deteccao = epoch_seconds(Utc::now()) - msg.fim_captura;

        // Upload every kept crop first so `frame_total_faces` reflects only
        // the successful subset (§7, "partial storage failure") rather than
        // the pre-upload candidate count.
        let mut uploaded = Vec::with_capacity(qualifying.len());
        for detection in &qualifying {
            let crop = crop_face(frame_image.as_raw(), width, height, detection.bounding_box(), 0.0);
            let mut bytes = Vec::new();
            if let Err(e) = crop.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageOutputFormat::Png) {
                warn!(error = %e, "failed to encode face crop, skipping detection");
                continue;
            }

            let filename = format!("face_{}.png", Utc::now().format("%H%M%S%6f"));
            let object_key = format!("{}/{filename}", msg.data_captura_frame);
            if let Err(e) = self.object_store.put_object(&self.detections_bucket, &object_key, bytes).await {
                warn!(error = %e, "failed to upload face crop, skipping detection");
                continue;
            }

            self.events.publish(PipelineEvent::FaceDetected(FaceDetectedEvent {
                frame_uuid: msg.frame_uuid,
                bounding_box: detection.bounding_box().clone(),
                confidence: detection.confidence(),
                timestamp: Utc::now(),
            }));

            uploaded.push(object_key);
        }

        if uploaded.is_empty() {
            return self.insert_empty_aggregate(&msg).await;
        }

        let frame_total_faces = uploaded.len() as u32;

        for object_key in uploaded {
            let out = DetectionMessage {
                object_key,
                frame_uuid: msg.frame_uuid,
                tag_video: msg.tag_video.clone(),
                data_captura_frame: msg.data_captura_frame.clone(),
                inicio_processamento: msg.inicio_processamento,
                tempo_captura_frame: msg.tempo_captura_frame,
                timestamp: msg.timestamp,
                fps: msg.fps,
                duracao: msg.duracao,
                tempo_deteccao,
                frame_total_faces,
                tempo_espera_captura_deteccao,
                inicio_deteccao: epoch_seconds(inicio_deteccao),
                fim_deteccao: epoch_seconds(Utc::now()),
            };

            self.message_bus.publish(&self.detections_queue, &out).await?;
        }

        Ok(())
    }

    /// The `K == 0` path (§4.2 step 6): allocate `numero_frame` and insert
    /// the zero-count placeholder aggregate, whether zero faces survived
    /// the filter or every surviving crop failed to upload.
    async fn insert_empty_aggregate(&self, msg: &FrameMessage) -> Result<(), PipelineError> {
        let numero_frame = self.sequence_allocator.next_value(&msg.tag_video).await?;
        let aggregate = FrameAggregate::empty(msg.frame_uuid, msg.tag_video.clone(), numero_frame, msg.fps, msg.duracao);
        self.frame_aggregates.insert_empty(&aggregate).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{BoundingBox, Landmarks, Point};
    use crate::domain::entities::Detection;

    fn both_eyes() -> Landmarks {
        Landmarks::new(Some(Point::new(1, 1)), Some(Point::new(2, 2)))
    }

    #[test]
    fn qualifying_detections_are_exactly_those_passing_the_filter() {
        let keep = Detection::new(BoundingBox::new(0, 0, 60, 60), 0.9, both_eyes());
        let drop = Detection::new(BoundingBox::new(0, 0, 10, 10), 0.9, both_eyes());
        let detections = vec![keep, drop];

        let qualifying: Vec<_> = detections.into_iter().filter(|d| d.passes_filter()).collect();
        assert_eq!(qualifying.len(), 1);
    }
}
