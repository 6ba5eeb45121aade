//! Pipeline Configuration
//!
//! Loads each worker's configuration from environment variables (`.env`
//! supported via `dotenvy`), matching the original deployment's
//! environment-variable surface: metadata store, message bus, object
//! store, embedding model selection, and the concurrency/throttling knobs
//! shared by the workers.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("missing required environment variable {key}"))
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Metadata store connection settings (`pessoas`/`presencas`/`frames`/`counters`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub db_name: String,
}

/// Message bus connection settings and the three named queues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBusConfig {
    pub host: String,
    pub frames_queue: String,
    pub detections_queue: String,
    pub recognitions_queue: String,
    /// Bounded prefetch per consumer (§5).
    pub prefetch_count: u16,
}

/// Object store connection settings and the three named buckets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub frames_bucket: String,
    pub detections_bucket: String,
    pub recognitions_bucket: String,
}

/// Recognition-specific tuning: the selected embedding model, its
/// documented cosine-distance operating point `τ` (§4.3 step 2), the
/// vote ratio an identity must clear to be declared a match (§4.3 step 2,
/// §9 Open Question 2), and the dimensionality of the vectors it emits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    pub model_name: String,
    pub cosine_threshold: f32,
    pub vote_threshold: f32,
    pub embedding_dimension: usize,
}

/// Cosine-distance operating points for the embedding models the external
/// embedding service may be configured with, matching the documented
/// thresholds `original_source`'s `find_threshold(MODEL_NAME, "cosine")`
/// call resolves to. Falls back to the Facenet threshold for an
/// unrecognized name rather than failing start-up.
pub fn cosine_threshold_for_model(model_name: &str) -> f32 {
    match model_name {
        "VGG-Face" => 0.68,
        "Facenet" => 0.40,
        "Facenet512" => 0.30,
        "ArcFace" => 0.68,
        "Dlib" => 0.07,
        "SFace" => 0.593,
        "OpenFace" => 0.10,
        "DeepFace" => 0.23,
        "DeepID" => 0.015,
        _ => 0.40,
    }
}

/// Embedding vector dimensionality for the same model set.
pub fn embedding_dimension_for_model(model_name: &str) -> usize {
    match model_name {
        "VGG-Face" => 4096,
        "Facenet" => 128,
        "Facenet512" => 512,
        "ArcFace" => 512,
        "Dlib" => 128,
        "SFace" => 128,
        "OpenFace" => 128,
        "DeepFace" => 4096,
        "DeepID" => 160,
        _ => 128,
    }
}

/// Capture-specific tuning (sampling rate and throttling).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    pub target_fps: f64,
    pub frame_skip: u32,
}

/// Top-level configuration shared by all four workers. Each binary reads
/// only the sections relevant to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub mongo: MongoConfig,
    pub message_bus: MessageBusConfig,
    pub object_store: ObjectStoreConfig,
    pub recognition: RecognitionConfig,
    pub capture: CaptureConfig,
    /// Size of the bounded pool for CPU-heavy work (PNG codec, detection,
    /// embedding). Defaults to the number of logical CPUs.
    pub cpu_pool_size: usize,
    pub log_level: String,
}

impl PipelineConfig {
    /// Loads configuration from the process environment, falling back to
    /// `.env` in the working directory if present.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            mongo: MongoConfig {
                uri: env_var("MONGO_URI")?,
                db_name: env_var("MONGO_DB_NAME")?,
            },
            message_bus: MessageBusConfig {
                host: env_var("RABBITMQ_HOST")?,
                frames_queue: env_var_or("QUEUE_NAME_FRAMES", "frames"),
                detections_queue: env_var_or("QUEUE_NAME_DETECTIONS", "detections"),
                recognitions_queue: env_var_or("QUEUE_NAME_RECOGNITIONS", "recognitions"),
                prefetch_count: env_parse_or("PREFETCH_COUNT", 10),
            },
            object_store: ObjectStoreConfig {
                endpoint: env_var("MINIO_ENDPOINT")?,
                access_key: env_var("MINIO_ACCESS_KEY")?,
                secret_key: env_var("MINIO_SECRET_KEY")?,
                frames_bucket: env_var_or("BUCKET_FRAMES", "frames"),
                detections_bucket: env_var_or("BUCKET_DETECCOES", "detections"),
                recognitions_bucket: env_var_or("BUCKET_RECONHECIMENTO", "recognitions"),
            },
            recognition: {
                let model_name = env_var_or("MODEL_NAME", "Facenet");
                RecognitionConfig {
                    cosine_threshold: env_parse_or(
                        "COSINE_THRESHOLD",
                        cosine_threshold_for_model(&model_name),
                    ),
                    embedding_dimension: env_parse_or(
                        "EMBEDDING_DIMENSION",
                        embedding_dimension_for_model(&model_name),
                    ),
                    vote_threshold: env_parse_or("VOTE_THRESHOLD", 0.20),
                    model_name,
                }
            },
            capture: CaptureConfig {
                target_fps: env_parse_or("TARGET_FPS", 20.0),
                frame_skip: env_parse_or("FRAME_SKIP", 10),
            },
            cpu_pool_size: env_parse_or("CPU_POOL_SIZE", num_cpus::get()),
            log_level: env_var_or("RUST_LOG", "info"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parse_or_falls_back_on_missing_var() {
        std::env::remove_var("PIPELINE_TEST_MISSING");
        let value: u32 = env_parse_or("PIPELINE_TEST_MISSING", 42);
        assert_eq!(value, 42);
    }

    #[test]
    fn env_parse_or_falls_back_on_unparsable_var() {
        std::env::set_var("PIPELINE_TEST_BAD", "not-a-number");
        let value: u32 = env_parse_or("PIPELINE_TEST_BAD", 7);
        assert_eq!(value, 7);
        std::env::remove_var("PIPELINE_TEST_BAD");
    }

    #[test]
    fn unrecognized_model_falls_back_to_facenet_threshold() {
        assert_eq!(
            cosine_threshold_for_model("NotAModel"),
            cosine_threshold_for_model("Facenet")
        );
    }

    #[test]
    fn facenet512_threshold_matches_documented_operating_point() {
        assert!((cosine_threshold_for_model("Facenet512") - 0.30).abs() < f32::EPSILON);
        assert_eq!(embedding_dimension_for_model("Facenet512"), 512);
    }
}
