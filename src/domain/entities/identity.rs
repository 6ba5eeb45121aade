//! Identity Entity (`pessoa`)
//!
//! A persistent identity accumulated across recognitions: the set of crop
//! images and embeddings collected for it, and when it was last seen.
//!
//! Invariant: `image_paths.len() == embeddings.len()` always, even under
//! concurrent Recognition Workers (§4.3, §8). `record_appearance` is the
//! only mutator that appends to either array, and it appends to both at
//! once so the invariant cannot be observed broken mid-update.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::FaceEmbedding;

/// A resolved identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    uuid: Uuid,
    image_paths: Vec<String>,
    embeddings: Vec<FaceEmbedding>,
    tags: Vec<Uuid>,
    last_appearance: Option<DateTime<Utc>>,
}

impl Identity {
    /// Mints a brand-new identity (§4.3: no candidate cleared the vote
    /// threshold). `tags` starts as `[uuid]`, matching the reference
    /// behavior where an identity is its own first tag.
    pub fn new() -> Self {
        let uuid = Uuid::new_v4();
        Self {
            uuid,
            image_paths: Vec::new(),
            embeddings: Vec::new(),
            tags: vec![uuid],
            last_appearance: None,
        }
    }

    /// Reconstructs an identity loaded from the metadata store.
    pub fn from_db(
        uuid: Uuid,
        image_paths: Vec<String>,
        embeddings: Vec<FaceEmbedding>,
        tags: Vec<Uuid>,
        last_appearance: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            uuid,
            image_paths,
            embeddings,
            tags,
            last_appearance,
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn image_paths(&self) -> &[String] {
        &self.image_paths
    }

    pub fn embeddings(&self) -> &[FaceEmbedding] {
        &self.embeddings
    }

    pub fn tags(&self) -> &[Uuid] {
        &self.tags
    }

    pub fn last_appearance(&self) -> Option<DateTime<Utc>> {
        self.last_appearance
    }

    pub fn primary_photo(&self) -> Option<&str> {
        self.image_paths.first().map(String::as_str)
    }

    /// Appends a new sighting's crop path and embedding and bumps
    /// `last_appearance`. Kept in-memory for symmetry with the repository
    /// operation of the same name, which performs this as a single atomic
    /// document update.
    pub fn record_appearance(&mut self, image_path: String, embedding: FaceEmbedding, at: DateTime<Utc>) {
        self.image_paths.push(image_path);
        self.embeddings.push(embedding);
        self.last_appearance = Some(at);
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::FaceEmbedding;

    #[test]
    fn new_identity_tags_itself() {
        let identity = Identity::new();
        assert_eq!(identity.tags(), &[identity.uuid()]);
    }

    #[test]
    fn record_appearance_keeps_arrays_in_lockstep() {
        let mut identity = Identity::new();
        identity.record_appearance(
            "uuid/face_1.png".to_string(),
            FaceEmbedding::new(vec![0.1, 0.2]),
            Utc::now(),
        );
        assert_eq!(identity.image_paths().len(), identity.embeddings().len());
        assert!(identity.last_appearance().is_some());
    }

    #[test]
    fn primary_photo_is_first_image_path() {
        let mut identity = Identity::new();
        assert!(identity.primary_photo().is_none());
        identity.record_appearance("a.png".to_string(), FaceEmbedding::new(vec![0.0]), Utc::now());
        identity.record_appearance("b.png".to_string(), FaceEmbedding::new(vec![0.0]), Utc::now());
        assert_eq!(identity.primary_photo(), Some("a.png"));
    }
}
