//! Identity Resolution
//!
//! Matches a freshly observed face embedding against previously-seen
//! identities. Candidates are scanned most-recently-seen first; an
//! identity is declared a match once the fraction of its stored
//! embeddings within `vote_threshold` cosine distance of the new one
//! reaches the configured ratio. No match creates a new identity.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::entities::Identity;
use crate::domain::repositories::{IdentityRepository, RepoResult};
use crate::domain::value_objects::FaceEmbedding;

/// Default fraction of an identity's stored embeddings that must vote for
/// a match before the identity is accepted as the match (§9, Open
/// Question 2).
pub const DEFAULT_VOTE_THRESHOLD: f32 = 0.20;

/// Default cosine-distance operating point `τ` (§4.3 step 2) when no
/// model-specific threshold is supplied, matching Facenet's documented
/// value.
pub const DEFAULT_COSINE_THRESHOLD: f32 = 0.40;

/// Outcome of resolving a single observed embedding.
#[derive(Debug, Clone)]
pub struct ResolvedIdentity {
    pub identity: Identity,
    pub created: bool,
    pub votes: usize,
    pub candidates_scanned: usize,
}

/// Stateless resolution service, parameterized by the vote threshold and
/// backed by whatever `IdentityRepository` implementation the caller wires
/// up (MongoDB in production, an in-memory fake in tests).
pub struct IdentityResolver {
    repository: Arc<dyn IdentityRepository>,
    /// `τ`: a stored embedding within this cosine distance of the new one
    /// counts as a hit (§4.3 step 2, strict `<`).
    cosine_threshold: f32,
    /// The fraction of an identity's hits over its total stored embeddings
    /// required to declare a match (§4.3 step 2).
    vote_threshold: f32,
}

impl IdentityResolver {
    pub fn new(repository: Arc<dyn IdentityRepository>, cosine_threshold: f32, vote_threshold: f32) -> Self {
        Self {
            repository,
            cosine_threshold,
            vote_threshold,
        }
    }

    /// Finds the matching identity for `embedding`, creating a new one if
    /// none of the recency-ordered candidates accumulate enough votes.
    /// Does not record the appearance — callers do that once the crop has
    /// been uploaded, so the image path and embedding are appended together.
    pub async fn resolve(&self, embedding: &FaceEmbedding) -> RepoResult<ResolvedIdentity> {
        let candidates = self.repository.find_candidates_by_recency().await?;
        let candidates_scanned = candidates.len();

        for candidate in candidates {
            let total = candidate.embeddings().len();
            if total == 0 {
                continue;
            }

            let votes = candidate
                .embeddings()
                .iter()
                .filter(|stored| stored.cosine_distance(embedding) < self.cosine_threshold)
                .count();

            if votes as f32 / total as f32 >= self.vote_threshold {
                info!(
                    identity_uuid = %candidate.uuid(),
                    votes,
                    total,
                    "face resolved to existing identity"
                );
                return Ok(ResolvedIdentity {
                    identity: candidate,
                    created: false,
                    votes,
                    candidates_scanned,
                });
            }

            debug!(
                identity_uuid = %candidate.uuid(),
                votes,
                total,
                "identity did not reach vote threshold"
            );
        }

        let identity = Identity::new();
        self.repository.create(&identity).await?;
        info!(identity_uuid = %identity.uuid(), "no candidate matched, created new identity");

        Ok(ResolvedIdentity {
            identity,
            created: true,
            votes: 0,
            candidates_scanned,
        })
    }

    /// Records that `embedding` (captured at `image_path`) belongs to
    /// `identity_uuid`, appending to both arrays and updating
    /// `last_appearance` in one store operation.
    pub async fn record_appearance(
        &self,
        identity_uuid: Uuid,
        image_path: &str,
        embedding: &FaceEmbedding,
        at: DateTime<Utc>,
    ) -> RepoResult<()> {
        self.repository
            .record_appearance(identity_uuid, image_path, embedding, at)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::RepositoryError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeIdentityRepository {
        identities: Mutex<Vec<Identity>>,
    }

    #[async_trait]
    impl IdentityRepository for FakeIdentityRepository {
        async fn find_by_uuid(&self, uuid: Uuid) -> RepoResult<Option<Identity>> {
            Ok(self
                .identities
                .lock()
                .unwrap()
                .iter()
                .find(|i| i.uuid() == uuid)
                .cloned())
        }

        async fn find_candidates_by_recency(&self) -> RepoResult<Vec<Identity>> {
            Ok(self.identities.lock().unwrap().clone())
        }

        async fn create(&self, identity: &Identity) -> RepoResult<()> {
            self.identities.lock().unwrap().push(identity.clone());
            Ok(())
        }

        async fn record_appearance(
            &self,
            uuid: Uuid,
            image_path: &str,
            embedding: &FaceEmbedding,
            at: DateTime<Utc>,
        ) -> RepoResult<()> {
            let mut identities = self.identities.lock().unwrap();
            let identity = identities
                .iter_mut()
                .find(|i| i.uuid() == uuid)
                .ok_or_else(|| RepositoryError::NotFound(uuid.to_string()))?;
            identity.record_appearance(image_path.to_string(), embedding.clone(), at);
            Ok(())
        }
    }

    fn embedding(values: &[f32]) -> FaceEmbedding {
        FaceEmbedding::new(values.to_vec())
    }

    #[tokio::test]
    async fn no_candidates_creates_new_identity() {
        let repo = Arc::new(FakeIdentityRepository::default());
        let resolver = IdentityResolver::new(repo, DEFAULT_COSINE_THRESHOLD, DEFAULT_VOTE_THRESHOLD);

        let result = resolver.resolve(&embedding(&[1.0, 0.0, 0.0])).await.unwrap();

        assert!(result.created);
        assert_eq!(result.votes, 0);
    }

    #[tokio::test]
    async fn matching_embedding_votes_for_existing_identity() {
        let repo = Arc::new(FakeIdentityRepository::default());
        let mut identity = Identity::new();
        identity.record_appearance(
            "face_1.png".to_string(),
            embedding(&[1.0, 0.0, 0.0]),
            Utc::now(),
        );
        repo.create(&identity).await.unwrap();

        let resolver = IdentityResolver::new(repo, DEFAULT_COSINE_THRESHOLD, DEFAULT_VOTE_THRESHOLD);
        let result = resolver
            .resolve(&embedding(&[0.99, 0.01, 0.0]))
            .await
            .unwrap();

        assert!(!result.created);
        assert_eq!(result.identity.uuid(), identity.uuid());
        assert_eq!(result.votes, 1);
    }

    #[tokio::test]
    async fn dissimilar_embedding_creates_new_identity_despite_existing_candidate() {
        let repo = Arc::new(FakeIdentityRepository::default());
        let mut identity = Identity::new();
        identity.record_appearance(
            "face_1.png".to_string(),
            embedding(&[1.0, 0.0, 0.0]),
            Utc::now(),
        );
        repo.create(&identity).await.unwrap();

        let resolver = IdentityResolver::new(repo, DEFAULT_COSINE_THRESHOLD, DEFAULT_VOTE_THRESHOLD);
        let result = resolver.resolve(&embedding(&[0.0, 1.0, 0.0])).await.unwrap();

        assert!(result.created);
        assert_ne!(result.identity.uuid(), identity.uuid());
    }

    /// A single stored embedding is a candidate gallery of size one; one
    /// cosine hit gives `h/m = 1.0 >= 0.20`, so it votes (§9, Open
    /// Question 2 resolution).
    #[tokio::test]
    async fn single_stored_embedding_matches_on_its_own_hit() {
        let repo = Arc::new(FakeIdentityRepository::default());
        let mut identity = Identity::new();
        identity.record_appearance("face_1.png".to_string(), embedding(&[1.0, 0.0]), Utc::now());
        repo.create(&identity).await.unwrap();

        let resolver = IdentityResolver::new(repo, DEFAULT_COSINE_THRESHOLD, DEFAULT_VOTE_THRESHOLD);
        let result = resolver.resolve(&embedding(&[1.0, 0.0])).await.unwrap();

        assert!(!result.created);
        assert_eq!(result.votes, 1);
    }

    #[rstest::rstest]
    #[case(0.3999, true)] // just inside tau: counted as a hit
    #[case(0.40, false)] // exactly tau: strict `<` excludes it (§8)
    #[case(0.4001, false)] // just outside tau: not a hit
    #[tokio::test]
    async fn hit_test_is_strict_less_than_tau(#[case] distance_from_reference: f32, #[case] expects_match: bool) {
        // Construct two unit vectors in the xy-plane whose cosine distance
        // is exactly `distance_from_reference` from [1, 0], using
        // d = 1 - cos(theta) => theta = acos(1 - d).
        let theta = (1.0 - distance_from_reference).acos();
        let candidate_embedding = embedding(&[theta.cos(), theta.sin()]);

        let repo = Arc::new(FakeIdentityRepository::default());
        let mut identity = Identity::new();
        identity.record_appearance("face_1.png".to_string(), embedding(&[1.0, 0.0]), Utc::now());
        repo.create(&identity).await.unwrap();

        let resolver = IdentityResolver::new(repo, DEFAULT_COSINE_THRESHOLD, DEFAULT_VOTE_THRESHOLD);
        let result = resolver.resolve(&candidate_embedding).await.unwrap();

        assert_eq!(!result.created, expects_match);
    }
}
