//! Domain Events
//!
//! In-process events published by each worker's use case, for structured
//! observability (consumed by `tracing`-backed subscribers today; see
//! SPEC_FULL.md §6.2). These never cross process boundaries — the
//! Message Bus carries the actual pipeline messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::BoundingBox;

/// An event that can be broadcast to in-process subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    FrameCaptured(FrameCapturedEvent),
    FaceDetected(FaceDetectedEvent),
    IdentityResolved(IdentityResolvedEvent),
    IdentityCreated(IdentityCreatedEvent),
    PresenceRecorded(PresenceRecordedEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameCapturedEvent {
    pub frame_uuid: Uuid,
    pub tag_video: String,
    pub object_key: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceDetectedEvent {
    pub frame_uuid: Uuid,
    pub bounding_box: BoundingBox,
    pub confidence: f32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityResolvedEvent {
    pub identity_uuid: Uuid,
    pub votes: usize,
    pub candidates: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityCreatedEvent {
    pub identity_uuid: Uuid,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceRecordedEvent {
    pub presence_id: Uuid,
    pub identity_uuid: Uuid,
    pub frame_uuid: Uuid,
    pub timestamp: DateTime<Utc>,
}

impl PipelineEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            PipelineEvent::FrameCaptured(e) => e.timestamp,
            PipelineEvent::FaceDetected(e) => e.timestamp,
            PipelineEvent::IdentityResolved(e) => e.timestamp,
            PipelineEvent::IdentityCreated(e) => e.timestamp,
            PipelineEvent::PresenceRecorded(e) => e.timestamp,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            PipelineEvent::FrameCaptured(_) => "frame_captured",
            PipelineEvent::FaceDetected(_) => "face_detected",
            PipelineEvent::IdentityResolved(_) => "identity_resolved",
            PipelineEvent::IdentityCreated(_) => "identity_created",
            PipelineEvent::PresenceRecorded(_) => "presence_recorded",
        }
    }
}
