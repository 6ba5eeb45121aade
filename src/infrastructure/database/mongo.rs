//! Metadata Store Connection
//!
//! Establishes the `mongodb` client and hands back the configured
//! database handle; repository implementations pull their collections
//! from it.

use bson::doc;
use mongodb::{options::ClientOptions, Client, Database, IndexModel};

use crate::infrastructure::config::MongoConfig;
use crate::infrastructure::error::PipelineError;

pub async fn connect(config: &MongoConfig) -> Result<Database, PipelineError> {
    let mut options = ClientOptions::parse(&config.uri)
        .await
        .map_err(PipelineError::from)?;
    options.app_name = Some("presence-pipeline".to_string());

    let client = Client::with_options(options).map_err(PipelineError::from)?;
    let db = client.database(&config.db_name);
    ensure_indexes(&db).await?;
    Ok(db)
}

/// Creates the indexes the pipeline's concurrency guarantees depend on.
/// No schema migration exists for a document store, but a unique index
/// on `frames.frame_uuid` is load-bearing: it is what turns a concurrent
/// Detection/Persistence Worker race on the same frame into a duplicate
/// key error (code 11000) that `PersistPresenceUseCase` catches and
/// retries as an increment (§4.4, §9 Open Question 1), rather than two
/// silently duplicated aggregate rows.
async fn ensure_indexes(db: &Database) -> Result<(), PipelineError> {
    use mongodb::options::IndexOptions;

    let frames: mongodb::Collection<bson::Document> = db.collection("frames");
    frames
        .create_index(
            IndexModel::builder()
                .keys(doc! { "frame_uuid": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
            None,
        )
        .await
        .map_err(PipelineError::from)?;

    let pessoas: mongodb::Collection<bson::Document> = db.collection("pessoas");
    pessoas
        .create_index(
            IndexModel::builder()
                .keys(doc! { "uuid": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
            None,
        )
        .await
        .map_err(PipelineError::from)?;

    Ok(())
}
