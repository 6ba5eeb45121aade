//! Capture Frame Use Case
//!
//! One sampled frame's full Capture Worker flow (§4.1): PNG-encode, push
//! to the `frames` bucket under its day-partitioned key, and publish a
//! `FrameMessage` onto the `frames` queue. Mirrors `upload_frame()`'s
//! encode/upload/publish sequence and its timing fields exactly.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::application::services::EventBus;
use crate::domain::events::{FrameCapturedEvent, PipelineEvent};
use crate::infrastructure::camera::{encode_png, DecodedFrame};
use crate::infrastructure::config::MessageBusConfig;
use crate::infrastructure::error::PipelineError;
use crate::infrastructure::message_bus::{FrameMessage, MessageBus};
use crate::infrastructure::object_store::ObjectStore;

use super::epoch_seconds;

pub struct CaptureFrameUseCase {
    object_store: Arc<ObjectStore>,
    message_bus: Arc<MessageBus>,
    events: Arc<EventBus>,
    frames_bucket: String,
    frames_queue: String,
}

impl CaptureFrameUseCase {
    pub fn new(
        object_store: Arc<ObjectStore>,
        message_bus: Arc<MessageBus>,
        events: Arc<EventBus>,
        bucket_config: &crate::infrastructure::config::ObjectStoreConfig,
        bus_config: &MessageBusConfig,
    ) -> Self {
        Self {
            object_store,
            message_bus,
            events,
            frames_bucket: bucket_config.frames_bucket.clone(),
            frames_queue: bus_config.frames_queue.clone(),
        }
    }

    /// Encodes, uploads and publishes one sampled frame. `tag_video`
    /// identifies the capture session; `fps`/`duration_s` are carried
    /// through for the Persistence Worker's `FrameAggregate`.
    pub async fn execute(
        &self,
        frame: DecodedFrame,
        tag_video: String,
        fps: Option<f64>,
        duration_s: Option<f64>,
    ) -> Result<FrameMessage, PipelineError> {
        let inicio_processamento = Utc::now();

        let start_encode = Utc::now();
        let png_bytes = encode_png(&frame)
            .map_err(|e| PipelineError::MessageData(format!("could not encode frame: {e}")))?;
        let _encode_duration = (Utc::now() - start_encode).num_milliseconds() as f64 / 1000.0;

        let today = inicio_processamento.format("%d-%m-%Y").to_string();
        let object_key = format!("{today}/{}.png", inicio_processamento.timestamp_millis());

        self.object_store
            .put_object(&self.frames_bucket, &object_key, png_bytes)
            .await?;

        let fim_processamento = Utc::now();
        let tempo_captura_frame = (fim_processamento - inicio_processamento).num_milliseconds() as f64 / 1000.0;

        let message = FrameMessage {
            object_key,
            frame_uuid: Uuid::new_v4(),
            tag_video,
            data_captura_frame: today,
            inicio_processamento: epoch_seconds(inicio_processamento),
            tempo_captura_frame,
            timestamp: epoch_seconds(Utc::now()),
            fps,
            duracao: duration_s,
            fim_captura: epoch_seconds(Utc::now()),
        };

        self.message_bus.publish(&self.frames_queue, &message).await?;

        self.events.publish(PipelineEvent::FrameCaptured(FrameCapturedEvent {
            frame_uuid: message.frame_uuid,
            tag_video: message.tag_video.clone(),
            object_key: message.object_key.clone(),
            timestamp: Utc::now(),
        }));

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_key_uses_day_partition_and_epoch_millis() {
        let now = Utc::now();
        let today = now.format("%d-%m-%Y").to_string();
        let key = format!("{today}/{}.png", now.timestamp_millis());
        assert!(key.starts_with(&today));
        assert!(key.ends_with(".png"));
    }
}
