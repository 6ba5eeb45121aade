//! Persistence Worker
//!
//! Consumes `RecognitionMessage`s, inserts the presence event, and
//! updates the frame's aggregate (§4.4). Same ack/nack/retry discipline
//! as the other workers (§7).

use std::sync::Arc;

use anyhow::Result;
use futures_util::StreamExt;
use presence_pipeline::application::services::EventBus;
use presence_pipeline::application::use_cases::PersistPresenceUseCase;
use presence_pipeline::infrastructure::database::repositories::{
    MongoFrameAggregateRepository, MongoPresenceRepository, MongoSequenceAllocator,
};
use presence_pipeline::infrastructure::{database, logging, message_bus::MessageBus};
use presence_pipeline::PipelineConfig;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = PipelineConfig::load()?;
    logging::init_tracing(&config.log_level);

    info!("starting persistence worker");

    let db = database::connect(&config.mongo).await?;
    let message_bus = Arc::new(MessageBus::connect(&config.message_bus).await?);

    let presences = Arc::new(MongoPresenceRepository::new(&db));
    let frame_aggregates = Arc::new(MongoFrameAggregateRepository::new(&db));
    let sequence_allocator = Arc::new(MongoSequenceAllocator::new(&db));

    let events = Arc::new(EventBus::new());
    let use_case = Arc::new(PersistPresenceUseCase::new(presences, frame_aggregates, sequence_allocator, events));

    let mut deliveries = message_bus
        .consume(&config.message_bus.recognitions_queue, "persistence-worker")
        .await?;

    while let Some(delivery) = deliveries.next().await {
        let use_case = use_case.clone();
        let frame_uuid = delivery.payload.frame_uuid;

        match use_case.execute(delivery.payload).await {
            Ok(()) => {
                if let Err(e) = delivery.ack().await {
                    error!(%frame_uuid, error = %e, "failed to ack persisted recognition");
                }
            }
            Err(e) if e.is_poison() => {
                warn!(%frame_uuid, error = %e, "poison recognition message, nacking without requeue");
                if let Err(ack_err) = delivery.nack_no_requeue().await {
                    error!(%frame_uuid, error = %ack_err, "failed to nack poison recognition message");
                }
            }
            Err(e) => {
                error!(%frame_uuid, error = %e, "transient failure processing recognition, leaving unacked for redelivery");
            }
        }
    }

    Ok(())
}
