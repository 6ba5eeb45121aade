//! Detection Worker
//!
//! Consumes `FrameMessage`s, runs face detection plus the size/landmark
//! filter, and publishes one `DetectionMessage` per qualifying face
//! (§4.2). Acks on success, nacks without requeue on a poison message,
//! and leaves transient failures unacked so the broker redelivers them.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use futures_util::StreamExt;
use presence_pipeline::application::services::EventBus;
use presence_pipeline::application::use_cases::DetectFacesUseCase;
use presence_pipeline::infrastructure::camera::{DetectorConfig, RustfaceDetector};
use presence_pipeline::infrastructure::database::repositories::{MongoFrameAggregateRepository, MongoSequenceAllocator};
use presence_pipeline::infrastructure::object_store::ObjectStore;
use presence_pipeline::infrastructure::{database, logging, message_bus::MessageBus};
use presence_pipeline::PipelineConfig;
use tracing::{error, info, warn};

fn detector_config_from_env() -> DetectorConfig {
    let mut config = DetectorConfig::default();
    if let Ok(path) = std::env::var("FACE_MODEL_PATH") {
        config.model_path = PathBuf::from(path);
    }
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = PipelineConfig::load()?;
    logging::init_tracing(&config.log_level);

    info!("starting detection worker");

    let db = database::connect(&config.mongo).await?;
    let object_store = Arc::new(ObjectStore::connect(&config.object_store).await?);
    let message_bus = Arc::new(MessageBus::connect(&config.message_bus).await?);
    let detector = Arc::new(RustfaceDetector::new(detector_config_from_env())?);
    let frame_aggregates = Arc::new(MongoFrameAggregateRepository::new(&db));
    let sequence_allocator = Arc::new(MongoSequenceAllocator::new(&db));
    let events = Arc::new(EventBus::new());

    let use_case = Arc::new(DetectFacesUseCase::new(
        object_store,
        message_bus.clone(),
        detector,
        frame_aggregates,
        sequence_allocator,
        events,
        &config.object_store,
        &config.message_bus,
    ));

    let mut deliveries = message_bus
        .consume(&config.message_bus.frames_queue, "detection-worker")
        .await?;

    while let Some(delivery) = deliveries.next().await {
        let use_case = use_case.clone();
        let frame_uuid = delivery.payload.frame_uuid;

        match use_case.execute(delivery.payload).await {
            Ok(()) => {
                if let Err(e) = delivery.ack().await {
                    error!(%frame_uuid, error = %e, "failed to ack processed frame");
                }
            }
            Err(e) if e.is_poison() => {
                warn!(%frame_uuid, error = %e, "poison frame message, nacking without requeue");
                if let Err(ack_err) = delivery.nack_no_requeue().await {
                    error!(%frame_uuid, error = %ack_err, "failed to nack poison frame message");
                }
            }
            Err(e) => {
                error!(%frame_uuid, error = %e, "transient failure processing frame, leaving unacked for redelivery");
            }
        }
    }

    Ok(())
}
