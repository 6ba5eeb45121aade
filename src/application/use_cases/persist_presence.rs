//! Persist Presence Use Case
//!
//! The Persistence Worker's per-recognition flow (§4.4): insert the
//! presence event, then update its frame's aggregate. Whichever of the
//! Detection or Persistence Worker sees a `frame_uuid` first performs the
//! insert; the other increments it. Both workers reaching this check at
//! once is the documented race in DESIGN.md's Open Question 1 — resolved
//! here by retrying the increment once if the insert loses a duplicate-key
//! race, rather than by a single atomic upsert (`increment_existing` and
//! `insert_first_presence` are each single-document operations, but the
//! two together are check-then-act).

use std::sync::Arc;

use chrono::Utc;

use crate::application::services::EventBus;
use crate::domain::entities::{FrameAggregate, Presence, Timings};
use crate::domain::events::{PipelineEvent, PresenceRecordedEvent};
use crate::domain::repositories::{FrameAggregateRepository, PresenceRepository, RepositoryError, SequenceAllocator};
use crate::infrastructure::error::PipelineError;
use crate::infrastructure::message_bus::RecognitionMessage;

pub struct PersistPresenceUseCase {
    presences: Arc<dyn PresenceRepository>,
    frame_aggregates: Arc<dyn FrameAggregateRepository>,
    sequence_allocator: Arc<dyn SequenceAllocator>,
    events: Arc<EventBus>,
}

impl PersistPresenceUseCase {
    pub fn new(
        presences: Arc<dyn PresenceRepository>,
        frame_aggregates: Arc<dyn FrameAggregateRepository>,
        sequence_allocator: Arc<dyn SequenceAllocator>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            presences,
            frame_aggregates,
            sequence_allocator,
            events,
        }
    }

    pub async fn execute(&self, msg: RecognitionMessage) -> Result<(), PipelineError> {
        let started_at = chrono::DateTime::<Utc>::from_timestamp(msg.inicio_processamento as i64, 0)
            .unwrap_or_else(Utc::now);
        let finished_at = Utc::now();

        let timings = Timings {
            capture_started_at: msg.inicio_processamento,
            capture_duration_s: msg.tempo_captura_frame,
            detection_duration_s: msg.tempo_deteccao,
            recognition_duration_s: msg.tempo_reconhecimento,
            queue_wait_capture_to_detection_s: msg.tempo_espera_captura_deteccao,
            queue_wait_detection_to_recognition_s: msg.tempo_espera_deteccao_reconhecimento,
        };

        let presence = Presence::new(
            msg.uuid,
            msg.tags,
            msg.reconhecimento_path,
            msg.frame_uuid,
            msg.tag_video.clone(),
            msg.data_captura_frame,
            started_at,
            finished_at,
            timings,
        );

        let presence_id = self.presences.insert(&presence).await?;

        self.update_frame_aggregate(msg.frame_uuid, &msg.tag_video, msg.frame_total_faces, presence_id, msg.fps, msg.duracao)
            .await?;

        self.events.publish(PipelineEvent::PresenceRecorded(PresenceRecordedEvent {
            presence_id,
            identity_uuid: msg.uuid,
            frame_uuid: msg.frame_uuid,
            timestamp: finished_at,
        }));

        Ok(())
    }

    async fn update_frame_aggregate(
        &self,
        frame_uuid: uuid::Uuid,
        tag_video: &str,
        frame_total_faces: u32,
        presence_id: uuid::Uuid,
        fps: Option<f64>,
        duration_s: Option<f64>,
    ) -> Result<(), PipelineError> {
        if self.frame_aggregates.increment_existing(frame_uuid, presence_id).await? {
            return Ok(());
        }

        let numero_frame = self.sequence_allocator.next_value(tag_video).await?;
        let aggregate = FrameAggregate::first_presence(
            frame_uuid,
            tag_video.to_string(),
            numero_frame,
            frame_total_faces,
            presence_id,
            fps,
            duration_s,
        );

        match self.frame_aggregates.insert_first_presence(&aggregate).await {
            Ok(()) => Ok(()),
            Err(e) if is_duplicate_key_error(&e) => {
                self.frame_aggregates.increment_existing(frame_uuid, presence_id).await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Whether `err` is a MongoDB duplicate-key write error (code 11000),
/// meaning a concurrent worker already inserted this frame's aggregate
/// between our `increment_existing` miss and our own insert attempt.
fn is_duplicate_key_error(err: &RepositoryError) -> bool {
    match err {
        RepositoryError::Store(e) => matches!(
            e.kind.as_ref(),
            mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(we)) if we.code == 11000
        ),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::FrameAggregate;
    use crate::domain::repositories::RepoResult;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct FakePresenceRepository;

    #[async_trait]
    impl PresenceRepository for FakePresenceRepository {
        async fn insert(&self, _presence: &Presence) -> RepoResult<Uuid> {
            Ok(Uuid::new_v4())
        }
    }

    #[derive(Default)]
    struct FakeFrameAggregateRepository {
        aggregates: Mutex<Vec<FrameAggregate>>,
    }

    #[async_trait]
    impl FrameAggregateRepository for FakeFrameAggregateRepository {
        async fn find_by_frame_uuid(&self, frame_uuid: Uuid) -> RepoResult<Option<FrameAggregate>> {
            Ok(self.aggregates.lock().unwrap().iter().find(|a| a.frame_uuid() == frame_uuid).cloned())
        }

        async fn insert_empty(&self, aggregate: &FrameAggregate) -> RepoResult<()> {
            self.aggregates.lock().unwrap().push(aggregate.clone());
            Ok(())
        }

        async fn increment_existing(&self, frame_uuid: Uuid, _presence_id: Uuid) -> RepoResult<bool> {
            Ok(self.aggregates.lock().unwrap().iter().any(|a| a.frame_uuid() == frame_uuid))
        }

        async fn insert_first_presence(&self, aggregate: &FrameAggregate) -> RepoResult<()> {
            self.aggregates.lock().unwrap().push(aggregate.clone());
            Ok(())
        }
    }

    struct FakeSequenceAllocator;

    #[async_trait]
    impl SequenceAllocator for FakeSequenceAllocator {
        async fn next_value(&self, _tag_video: &str) -> RepoResult<i64> {
            Ok(1)
        }
    }

    fn sample_message() -> RecognitionMessage {
        RecognitionMessage {
            uuid: Uuid::new_v4(),
            tags: vec![],
            reconhecimento_path: "uuid/face_1.png".to_string(),
            frame_uuid: Uuid::new_v4(),
            tag_video: "video-1".to_string(),
            data_captura_frame: "27-07-2026".to_string(),
            inicio_processamento: 0.0,
            tempo_captura_frame: 0.01,
            timestamp: 0.0,
            fps: Some(20.0),
            duracao: None,
            frame_total_faces: 1,
            tempo_deteccao: 0.02,
            tempo_reconhecimento: 0.03,
            tempo_espera_captura_deteccao: 0.1,
            tempo_espera_deteccao_reconhecimento: 0.1,
            inicio_reconhecimento: 0.0,
            fim_reconhecimento: 0.0,
        }
    }

    #[tokio::test]
    async fn first_sighting_of_a_frame_inserts_a_new_aggregate() {
        let use_case = PersistPresenceUseCase::new(
            Arc::new(FakePresenceRepository::default()),
            Arc::new(FakeFrameAggregateRepository::default()),
            Arc::new(FakeSequenceAllocator),
            Arc::new(EventBus::new()),
        );

        use_case.execute(sample_message()).await.unwrap();
    }

    #[tokio::test]
    async fn second_sighting_of_a_frame_increments_instead_of_inserting() {
        let frame_aggregates = Arc::new(FakeFrameAggregateRepository::default());
        let use_case = PersistPresenceUseCase::new(
            Arc::new(FakePresenceRepository::default()),
            frame_aggregates.clone(),
            Arc::new(FakeSequenceAllocator),
            Arc::new(EventBus::new()),
        );

        let msg = sample_message();
        use_case.execute(msg.clone()).await.unwrap();
        let mut second = sample_message();
        second.frame_uuid = msg.frame_uuid;
        use_case.execute(second).await.unwrap();

        assert_eq!(frame_aggregates.aggregates.lock().unwrap().len(), 1);
    }
}
