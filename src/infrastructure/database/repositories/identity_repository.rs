//! MongoDB Identity Repository
//!
//! Backs `IdentityRepository` against the `pessoas` collection. The
//! recency-ordered candidate scan and the atomic append-both-arrays
//! update are the two operations identity resolution depends on (§4.3).

use async_trait::async_trait;
use bson::{doc, Bson};
use chrono::{DateTime, Utc};
use mongodb::{Collection, Database};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::Identity;
use crate::domain::repositories::{IdentityRepository, RepoResult, RepositoryError};
use crate::domain::value_objects::FaceEmbedding;

#[derive(Debug, Serialize, Deserialize)]
struct IdentityDocument {
    uuid: Uuid,
    image_paths: Vec<String>,
    embeddings: Vec<Vec<f32>>,
    tags: Vec<Uuid>,
    last_appearance: Option<DateTime<Utc>>,
}

impl From<IdentityDocument> for Identity {
    fn from(doc: IdentityDocument) -> Self {
        Identity::from_db(
            doc.uuid,
            doc.image_paths,
            doc.embeddings.into_iter().map(FaceEmbedding::new).collect(),
            doc.tags,
            doc.last_appearance,
        )
    }
}

pub struct MongoIdentityRepository {
    collection: Collection<IdentityDocument>,
}

impl MongoIdentityRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("pessoas"),
        }
    }
}

#[async_trait]
impl IdentityRepository for MongoIdentityRepository {
    async fn find_by_uuid(&self, uuid: Uuid) -> RepoResult<Option<Identity>> {
        let doc = self
            .collection
            .find_one(doc! { "uuid": uuid }, None)
            .await?;
        Ok(doc.map(Identity::from))
    }

    async fn find_candidates_by_recency(&self) -> RepoResult<Vec<Identity>> {
        use futures_util::TryStreamExt;

        let options = mongodb::options::FindOptions::builder()
            .sort(doc! { "last_appearance": -1 })
            .build();

        let filter = doc! {
            "embeddings": { "$exists": true, "$ne": [] }
        };

        let mut cursor = self.collection.find(filter, options).await?;
        let mut identities = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            identities.push(Identity::from(doc));
        }
        Ok(identities)
    }

    async fn create(&self, identity: &Identity) -> RepoResult<()> {
        let doc = IdentityDocument {
            uuid: identity.uuid(),
            image_paths: identity.image_paths().to_vec(),
            embeddings: identity.embeddings().iter().map(|e| e.values().to_vec()).collect(),
            tags: identity.tags().to_vec(),
            last_appearance: identity.last_appearance(),
        };
        self.collection.insert_one(doc, None).await?;
        Ok(())
    }

    async fn record_appearance(
        &self,
        uuid: Uuid,
        image_path: &str,
        embedding: &FaceEmbedding,
        at: DateTime<Utc>,
    ) -> RepoResult<()> {
        let update = doc! {
            "$push": {
                "image_paths": image_path,
                "embeddings": Bson::Array(embedding.values().iter().map(|v| Bson::Double(*v as f64)).collect()),
            },
            "$set": { "last_appearance": at },
        };

        let result = self
            .collection
            .update_one(doc! { "uuid": uuid }, update, None)
            .await?;

        if result.matched_count == 0 {
            return Err(RepositoryError::NotFound(uuid.to_string()));
        }
        Ok(())
    }
}
