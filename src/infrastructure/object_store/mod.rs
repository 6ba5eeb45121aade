//! Object Store
//!
//! Thin wrapper around an S3-compatible client (MinIO in deployment) for
//! the three named buckets (`frames`, `detections`, `recognitions`).
//! Path-style addressing and static credentials match a local MinIO
//! deployment; a production AWS target would instead rely on the default
//! credential chain, which `aws-config` still supports transparently.

use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::debug;

use crate::infrastructure::config::ObjectStoreConfig;
use crate::infrastructure::error::PipelineError;

#[derive(Clone)]
pub struct ObjectStore {
    client: Client,
}

impl ObjectStore {
    pub async fn connect(config: &ObjectStoreConfig) -> Result<Self, PipelineError> {
        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "pipeline-static",
        );

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .endpoint_url(&config.endpoint)
            .credentials_provider(credentials)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        let store = Self {
            client: Client::from_conf(s3_config),
        };

        for bucket in [
            &config.frames_bucket,
            &config.detections_bucket,
            &config.recognitions_bucket,
        ] {
            store.ensure_bucket(bucket).await?;
        }

        Ok(store)
    }

    async fn ensure_bucket(&self, bucket: &str) -> Result<(), PipelineError> {
        let exists = self.client.head_bucket().bucket(bucket).send().await.is_ok();
        if exists {
            return Ok(());
        }

        self.client
            .create_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| PipelineError::Transient(e.into()))?;
        debug!(bucket, "created object store bucket");
        Ok(())
    }

    /// Uploads `bytes` (PNG-encoded) to `bucket` under `key`.
    pub async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
    ) -> Result<(), PipelineError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type("image/png")
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| PipelineError::Transient(e.into()))?;
        Ok(())
    }

    /// Downloads the object at `key` in `bucket`.
    pub async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, PipelineError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| PipelineError::Transient(e.into()))?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| PipelineError::Transient(e.into()))?
            .into_bytes();

        Ok(bytes.to_vec())
    }
}
