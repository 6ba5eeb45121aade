//! Repository Traits
//!
//! Abstractions for the Metadata Store (Dependency Inversion Principle).
//! Concrete implementations live in `infrastructure::database::repositories`
//! against MongoDB; these traits let the use cases and tests stay
//! independent of that choice.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::{FrameAggregate, Identity, Presence};

/// Result type for repository operations.
pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository error types.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("metadata store error: {0}")]
    Store(#[from] mongodb::error::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Identity (`pessoas`) repository interface.
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Finds an identity by its uuid.
    async fn find_by_uuid(&self, uuid: Uuid) -> RepoResult<Option<Identity>>;

    /// Returns every identity with at least one stored embedding, ordered
    /// most-recently-seen first (§4.3 step 2's recency-ordered scan).
    async fn find_candidates_by_recency(&self) -> RepoResult<Vec<Identity>>;

    /// Inserts a brand-new identity (§4.3 step 4, no-match branch).
    async fn create(&self, identity: &Identity) -> RepoResult<()>;

    /// Appends a crop path and embedding to an identity and sets its
    /// `last_appearance`, atomically, in a single store operation
    /// (§4.3 step 5 — see DESIGN.md's Open Question 1/identity-atomicity note).
    async fn record_appearance(
        &self,
        uuid: Uuid,
        image_path: &str,
        embedding: &crate::domain::value_objects::FaceEmbedding,
        at: chrono::DateTime<chrono::Utc>,
    ) -> RepoResult<()>;
}

/// Presence (`presencas`) repository interface.
#[async_trait]
pub trait PresenceRepository: Send + Sync {
    /// Inserts a new presence event, returning its assigned id.
    async fn insert(&self, presence: &Presence) -> RepoResult<Uuid>;
}

/// Frame aggregate (`frames`) repository interface.
#[async_trait]
pub trait FrameAggregateRepository: Send + Sync {
    async fn find_by_frame_uuid(&self, frame_uuid: Uuid) -> RepoResult<Option<FrameAggregate>>;

    /// Inserts the Detection Worker's zero-face placeholder (§4.2 step 5).
    async fn insert_empty(&self, aggregate: &FrameAggregate) -> RepoResult<()>;

    /// Atomically increments `total_faces_reconhecidas` and appends
    /// `presence_id` on an existing aggregate. Returns `false` if no
    /// aggregate exists yet for `frame_uuid`, in which case the caller
    /// must allocate a `numero_frame` and call `insert_first_presence`
    /// instead (§4.4 step 3). The two-step check-then-act is the
    /// documented race in DESIGN.md's Open Question 1.
    async fn increment_existing(&self, frame_uuid: Uuid, presence_id: Uuid) -> RepoResult<bool>;

    /// Inserts a fresh aggregate for a frame seen for the first time by
    /// the Persistence Worker (§4.4 step 3, branch b).
    async fn insert_first_presence(&self, aggregate: &FrameAggregate) -> RepoResult<()>;
}

/// Sequence allocator interface (§4.5): atomic find-and-increment per
/// `tag_video` over the `counters` collection.
#[async_trait]
pub trait SequenceAllocator: Send + Sync {
    async fn next_value(&self, tag_video: &str) -> RepoResult<i64>;
}
