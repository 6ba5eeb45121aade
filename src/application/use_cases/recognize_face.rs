//! Recognize Face Use Case
//!
//! The Recognition Worker's per-crop flow (§4.3): embed the face, resolve
//! it against known identities, persist the crop under the identity's
//! folder, and publish a `RecognitionMessage` carrying every timing field
//! collected so far. Mirrors `process_face()`'s embed/match/upload/update
//! sequence.

use std::sync::Arc;

use chrono::Utc;

use crate::application::services::{EventBus, IdentityResolver};
use crate::domain::events::{IdentityCreatedEvent, IdentityResolvedEvent, PipelineEvent};
use crate::infrastructure::camera::Embedder;
use crate::infrastructure::config::MessageBusConfig;
use crate::infrastructure::error::PipelineError;
use crate::infrastructure::message_bus::{DetectionMessage, MessageBus, RecognitionMessage};
use crate::infrastructure::object_store::ObjectStore;

use super::epoch_seconds;

pub struct RecognizeFaceUseCase {
    object_store: Arc<ObjectStore>,
    message_bus: Arc<MessageBus>,
    embedder: Arc<dyn Embedder>,
    resolver: Arc<IdentityResolver>,
    events: Arc<EventBus>,
    detections_bucket: String,
    recognitions_bucket: String,
    recognitions_queue: String,
}

impl RecognizeFaceUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        object_store: Arc<ObjectStore>,
        message_bus: Arc<MessageBus>,
        embedder: Arc<dyn Embedder>,
        resolver: Arc<IdentityResolver>,
        events: Arc<EventBus>,
        object_store_config: &crate::infrastructure::config::ObjectStoreConfig,
        bus_config: &MessageBusConfig,
    ) -> Self {
        Self {
            object_store,
            message_bus,
            embedder,
            resolver,
            events,
            detections_bucket: object_store_config.detections_bucket.clone(),
            recognitions_bucket: object_store_config.recognitions_bucket.clone(),
            recognitions_queue: bus_config.recognitions_queue.clone(),
        }
    }

    pub async fn execute(&self, msg: DetectionMessage) -> Result<(), PipelineError> {
        let inicio_reconhecimento = Utc::now();
        let tempo_espera_deteccao_reconhecimento = epoch_seconds(inicio_reconhecimento) - msg.fim_deteccao;

        let crop_bytes = self.object_store.get_object(&self.detections_bucket, &msg.object_key).await?;
        let face = image::load_from_memory(&crop_bytes)
            .map_err(|e| PipelineError::MessageData(format!("unreadable face crop: {e}")))?
            .to_rgb8();

        let embedding = self
            .embedder
            .embed(&face)
            .map_err(|e| PipelineError::EmbeddingFailed(e.to_string()))?;

        let resolved = self.resolver.resolve(&embedding).await?;

        if resolved.created {
            self.events.publish(PipelineEvent::IdentityCreated(IdentityCreatedEvent {
                identity_uuid: resolved.identity.uuid(),
                timestamp: Utc::now(),
            }));
        } else {
            self.events.publish(PipelineEvent::IdentityResolved(IdentityResolvedEvent {
                identity_uuid: resolved.identity.uuid(),
                votes: resolved.votes,
                candidates: resolved.candidates_scanned,
                timestamp: Utc::now(),
            }));
        }

        let filename = format!("face_{}.png", Utc::now().format("%Y%m%d_%H%M%S%6f"));
        let image_path = format!("{}/{filename}", resolved.identity.uuid());
        self.object_store
            .put_object(&self.recognitions_bucket, &image_path, crop_bytes)
            .await?;

        let now = Utc::now();
        self.resolver
            .record_appearance(resolved.identity.uuid(), &image_path, &embedding, now)
            .await?;

        let tempo_reconhecimento = (now - inicio_reconhecimento).num_milliseconds() as f64 / 1000.0;

        let out = RecognitionMessage {
            uuid: resolved.identity.uuid(),
            tags: resolved.identity.tags().to_vec(),
            reconhecimento_path: image_path,
            frame_uuid: msg.frame_uuid,
            tag_video: msg.tag_video,
            data_captura_frame: msg.data_captura_frame,
            inicio_processamento: msg.inicio_processamento,
            tempo_captura_frame: msg.tempo_captura_frame,
            timestamp: msg.timestamp,
            fps: msg.fps,
            duracao: msg.duracao,
            frame_total_faces: msg.frame_total_faces,
            tempo_deteccao: msg.tempo_deteccao,
            tempo_reconhecimento,
            tempo_espera_captura_deteccao: msg.tempo_espera_captura_deteccao,
            tempo_espera_deteccao_reconhecimento,
            inicio_reconhecimento: epoch_seconds(inicio_reconhecimento),
            fim_reconhecimento: epoch_seconds(Utc::now()),
        };

        self.message_bus.publish(&self.recognitions_queue, &out).await?;

        Ok(())
    }
}
