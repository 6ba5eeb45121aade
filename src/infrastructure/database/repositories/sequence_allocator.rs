//! MongoDB Sequence Allocator
//!
//! Backs `SequenceAllocator` against the `counters` collection: an
//! atomic `find_one_and_update` with `$inc` and `upsert: true`, returning
//! the post-image (§4.5). Safe under concurrent callers because the
//! increment and the upsert happen as a single store operation.

use async_trait::async_trait;
use bson::doc;
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use mongodb::{Collection, Database};
use serde::{Deserialize, Serialize};

use crate::domain::repositories::{RepoResult, RepositoryError, SequenceAllocator};

#[derive(Debug, Serialize, Deserialize)]
struct CounterDocument {
    #[serde(rename = "_id")]
    tag_video: String,
    sequence_value: i64,
}

pub struct MongoSequenceAllocator {
    collection: Collection<CounterDocument>,
}

impl MongoSequenceAllocator {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("counters"),
        }
    }
}

#[async_trait]
impl SequenceAllocator for MongoSequenceAllocator {
    async fn next_value(&self, tag_video: &str) -> RepoResult<i64> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let doc = self
            .collection
            .find_one_and_update(
                doc! { "_id": tag_video },
                doc! { "$inc": { "sequence_value": 1 } },
                options,
            )
            .await?
            .ok_or_else(|| RepositoryError::NotFound(tag_video.to_string()))?;

        Ok(doc.sequence_value)
    }
}
