//! MongoDB Presence Repository
//!
//! Backs `PresenceRepository` against the `presencas` collection. Every
//! presence is an immutable insert; there is no update path (§4.4).

use async_trait::async_trait;
use mongodb::{Collection, Database};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::Presence;
use crate::domain::repositories::{PresenceRepository, RepoResult, RepositoryError};

#[derive(Debug, Serialize, Deserialize)]
struct PresenceDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<bson::oid::ObjectId>,
    presence_uuid: Uuid,
    pessoa: Uuid,
    tags: Vec<Uuid>,
    foto_captura: String,
    frame_uuid: Uuid,
    tag_video: String,
    data_captura_frame: String,
    timestamp_inicial: f64,
    timestamp_final: f64,
    tempo_captura_frame: f64,
    tempo_deteccao: f64,
    tempo_reconhecimento: f64,
    tempo_espera_captura_deteccao: f64,
    tempo_espera_deteccao_reconhecimento: f64,
}

pub struct MongoPresenceRepository {
    collection: Collection<PresenceDocument>,
}

impl MongoPresenceRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("presencas"),
        }
    }
}

#[async_trait]
impl PresenceRepository for MongoPresenceRepository {
    async fn insert(&self, presence: &Presence) -> RepoResult<Uuid> {
        let presence_uuid = Uuid::new_v4();
        let timings = presence.timings();

        let doc = PresenceDocument {
            id: None,
            presence_uuid,
            pessoa: presence.identity_uuid(),
            tags: presence.tags().to_vec(),
            foto_captura: presence.recognition_crop_path().to_string(),
            frame_uuid: presence.frame_uuid(),
            tag_video: presence.tag_video().to_string(),
            data_captura_frame: presence.frame_capture_date().to_string(),
            timestamp_inicial: presence.started_at().timestamp_millis() as f64 / 1000.0,
            timestamp_final: presence.finished_at().timestamp_millis() as f64 / 1000.0,
            tempo_captura_frame: timings.capture_duration_s,
            tempo_deteccao: timings.detection_duration_s,
            tempo_reconhecimento: timings.recognition_duration_s,
            tempo_espera_captura_deteccao: timings.queue_wait_capture_to_detection_s,
            tempo_espera_deteccao_reconhecimento: timings.queue_wait_detection_to_recognition_s,
        };

        self.collection
            .insert_one(doc, None)
            .await
            .map_err(RepositoryError::from)?;

        Ok(presence_uuid)
    }
}
