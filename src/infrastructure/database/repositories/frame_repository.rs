//! MongoDB Frame Aggregate Repository
//!
//! Backs `FrameAggregateRepository` against the `frames` collection.
//! `increment_existing`/`insert_first_presence` together implement the
//! check-then-act upsert the Persistence Worker performs on first sight
//! of a `frame_uuid` (§4.4 step 3); `insert_empty` is the Detection
//! Worker's zero-face placeholder (§4.2 step 5).

use async_trait::async_trait;
use bson::doc;
use mongodb::{Collection, Database};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::FrameAggregate;
use crate::domain::repositories::{FrameAggregateRepository, RepoResult, RepositoryError};

#[derive(Debug, Serialize, Deserialize)]
struct FrameDocument {
    frame_uuid: Uuid,
    tag_video: String,
    numero_frame: i64,
    total_faces_detectadas: u32,
    total_faces_reconhecidas: u32,
    lista_presencas: Vec<Uuid>,
    fps: Option<f64>,
    duracao: Option<f64>,
}

impl From<FrameDocument> for FrameAggregate {
    fn from(doc: FrameDocument) -> Self {
        FrameAggregate::from_db(
            doc.frame_uuid,
            doc.tag_video,
            doc.numero_frame,
            doc.total_faces_detectadas,
            doc.total_faces_reconhecidas,
            doc.lista_presencas,
            doc.fps,
            doc.duracao,
        )
    }
}

pub struct MongoFrameAggregateRepository {
    collection: Collection<FrameDocument>,
}

impl MongoFrameAggregateRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("frames"),
        }
    }
}

#[async_trait]
impl FrameAggregateRepository for MongoFrameAggregateRepository {
    async fn find_by_frame_uuid(&self, frame_uuid: Uuid) -> RepoResult<Option<FrameAggregate>> {
        let doc = self
            .collection
            .find_one(doc! { "frame_uuid": frame_uuid }, None)
            .await?;
        Ok(doc.map(FrameAggregate::from))
    }

    async fn insert_empty(&self, aggregate: &FrameAggregate) -> RepoResult<()> {
        let doc = FrameDocument {
            frame_uuid: aggregate.frame_uuid(),
            tag_video: aggregate.tag_video().to_string(),
            numero_frame: aggregate.numero_frame(),
            total_faces_detectadas: aggregate.total_faces_detected(),
            total_faces_reconhecidas: aggregate.total_faces_recognized(),
            lista_presencas: aggregate.presences().to_vec(),
            fps: aggregate.fps(),
            duracao: aggregate.duration_s(),
        };
        self.collection.insert_one(doc, None).await?;
        Ok(())
    }

    async fn increment_existing(&self, frame_uuid: Uuid, presence_id: Uuid) -> RepoResult<bool> {
        let update = doc! {
            "$inc": { "total_faces_reconhecidas": 1 },
            "$push": { "lista_presencas": presence_id },
        };

        let result = self
            .collection
            .update_one(doc! { "frame_uuid": frame_uuid }, update, None)
            .await?;

        Ok(result.matched_count > 0)
    }

    async fn insert_first_presence(&self, aggregate: &FrameAggregate) -> RepoResult<()> {
        let doc = FrameDocument {
            frame_uuid: aggregate.frame_uuid(),
            tag_video: aggregate.tag_video().to_string(),
            numero_frame: aggregate.numero_frame(),
            total_faces_detectadas: aggregate.total_faces_detected(),
            total_faces_reconhecidas: aggregate.total_faces_recognized(),
            lista_presencas: aggregate.presences().to_vec(),
            fps: aggregate.fps(),
            duracao: aggregate.duration_s(),
        };

        self.collection
            .insert_one(doc, None)
            .await
            .map_err(RepositoryError::from)?;
        Ok(())
    }
}
