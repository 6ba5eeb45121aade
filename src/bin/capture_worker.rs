//! Capture Worker
//!
//! Opens a capture source (camera, video file, or network stream — chosen
//! by `CAPTURE_SOURCE_KIND`/`CAPTURE_SOURCE_VALUE`), applies the 1-in-N
//! sampling throttle, and publishes one `FrameMessage` per kept frame
//! (§4.1). Decoding is blocking, so the sampling loop runs on a dedicated
//! blocking thread and feeds the async publish path through a channel.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use presence_pipeline::application::services::EventBus;
use presence_pipeline::application::use_cases::CaptureFrameUseCase;
use presence_pipeline::infrastructure::camera::{open_decoder, CaptureSource, FrameSampler};
use presence_pipeline::infrastructure::object_store::ObjectStore;
use presence_pipeline::infrastructure::{logging, message_bus::MessageBus};
use presence_pipeline::PipelineConfig;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

fn capture_source_from_env() -> Result<CaptureSource> {
    let kind = std::env::var("CAPTURE_SOURCE_KIND").unwrap_or_else(|_| "camera".to_string());
    let value = std::env::var("CAPTURE_SOURCE_VALUE").unwrap_or_else(|_| "0".to_string());

    match kind.as_str() {
        "camera" => {
            let index: u32 = value.parse().context("CAPTURE_SOURCE_VALUE must be a camera index")?;
            Ok(CaptureSource::Camera(index))
        }
        "file" => Ok(CaptureSource::File(PathBuf::from(value))),
        "stream" => Ok(CaptureSource::Stream(value)),
        other => Err(anyhow::anyhow!("unknown CAPTURE_SOURCE_KIND '{other}' (expected camera, file or stream)")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = PipelineConfig::load()?;
    logging::init_tracing(&config.log_level);

    info!("starting capture worker");

    let object_store = Arc::new(ObjectStore::connect(&config.object_store).await?);
    let message_bus = Arc::new(MessageBus::connect(&config.message_bus).await?);
    let events = Arc::new(EventBus::new());
    let use_case = Arc::new(CaptureFrameUseCase::new(
        object_store,
        message_bus,
        events,
        &config.object_store,
        &config.message_bus,
    ));

    let tag_video = std::env::var("TAG_VIDEO").unwrap_or_else(|_| "default".to_string());
    let source = capture_source_from_env()?;
    let frame_skip = config.capture.frame_skip;
    let target_fps = config.capture.target_fps;

    let (tx, mut rx) = mpsc::channel(config.cpu_pool_size.max(1));

    let decode_task = tokio::task::spawn_blocking(move || -> Result<()> {
        let decoder = open_decoder(&source)?;
        let mut sampler = FrameSampler::new(decoder, frame_skip);

        while let Some(frame) = sampler.next_sampled()? {
            if tx.blocking_send(frame).is_err() {
                break;
            }
        }
        Ok(())
    });

    while let Some(frame) = rx.recv().await {
        let use_case = use_case.clone();
        let tag_video = tag_video.clone();
        tokio::spawn(async move {
            match use_case.execute(frame, tag_video, Some(target_fps), None).await {
                Ok(message) => info!(frame_uuid = %message.frame_uuid, "captured and published frame"),
                Err(e) => error!(error = %e, "failed to publish captured frame"),
            }
        });
    }

    match decode_task.await {
        Ok(Ok(())) => info!("capture source exhausted, shutting down"),
        Ok(Err(e)) => warn!(error = %e, "capture source ended with an error"),
        Err(e) => error!(error = %e, "capture decode task panicked"),
    }

    Ok(())
}
