//! Recognition Worker
//!
//! Consumes `DetectionMessage`s, embeds each face crop, resolves it
//! against known identities (§4.3), and publishes a `RecognitionMessage`.
//! Same ack/nack/retry discipline as the detection worker (§7).

use std::sync::Arc;

use anyhow::Result;
use futures_util::StreamExt;
use presence_pipeline::application::services::{EventBus, IdentityResolver};
use presence_pipeline::application::use_cases::RecognizeFaceUseCase;
use presence_pipeline::infrastructure::camera::PlaceholderEmbedder;
use presence_pipeline::infrastructure::database::repositories::MongoIdentityRepository;
use presence_pipeline::infrastructure::object_store::ObjectStore;
use presence_pipeline::infrastructure::{database, logging, message_bus::MessageBus};
use presence_pipeline::PipelineConfig;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = PipelineConfig::load()?;
    logging::init_tracing(&config.log_level);

    info!(model = %config.recognition.model_name, "starting recognition worker");

    let db = database::connect(&config.mongo).await?;
    let object_store = Arc::new(ObjectStore::connect(&config.object_store).await?);
    let message_bus = Arc::new(MessageBus::connect(&config.message_bus).await?);
    let embedder = Arc::new(PlaceholderEmbedder::new(config.recognition.embedding_dimension));
    let identities = Arc::new(MongoIdentityRepository::new(&db));
    let resolver = Arc::new(IdentityResolver::new(
        identities,
        config.recognition.cosine_threshold,
        config.recognition.vote_threshold,
    ));

    let events = Arc::new(EventBus::new());

    let use_case = Arc::new(RecognizeFaceUseCase::new(
        object_store,
        message_bus.clone(),
        embedder,
        resolver,
        events,
        &config.object_store,
        &config.message_bus,
    ));

    let mut deliveries = message_bus
        .consume(&config.message_bus.detections_queue, "recognition-worker")
        .await?;

    while let Some(delivery) = deliveries.next().await {
        let use_case = use_case.clone();
        let frame_uuid = delivery.payload.frame_uuid;

        match use_case.execute(delivery.payload).await {
            Ok(()) => {
                if let Err(e) = delivery.ack().await {
                    error!(%frame_uuid, error = %e, "failed to ack processed detection");
                }
            }
            Err(e) if e.is_poison() => {
                warn!(%frame_uuid, error = %e, "poison detection message, nacking without requeue");
                if let Err(ack_err) = delivery.nack_no_requeue().await {
                    error!(%frame_uuid, error = %ack_err, "failed to nack poison detection message");
                }
            }
            Err(e) => {
                error!(%frame_uuid, error = %e, "transient failure processing detection, leaving unacked for redelivery");
            }
        }
    }

    Ok(())
}
