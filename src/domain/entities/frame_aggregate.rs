//! Frame Aggregate Entity
//!
//! The per-frame rollup document: how many faces were detected versus
//! recognized, the ids of the presences it produced, and the sequence
//! number assigned to it within its video.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rollup of everything known about one captured frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameAggregate {
    frame_uuid: Uuid,
    tag_video: String,
    numero_frame: i64,
    total_faces_detected: u32,
    total_faces_recognized: u32,
    presences: Vec<Uuid>,
    fps: Option<f64>,
    duration_s: Option<f64>,
}

impl FrameAggregate {
    /// Builds the placeholder aggregate the Detection Worker inserts when
    /// a frame yields zero qualifying faces (§4.2 step 5).
    pub fn empty(
        frame_uuid: Uuid,
        tag_video: String,
        numero_frame: i64,
        fps: Option<f64>,
        duration_s: Option<f64>,
    ) -> Self {
        Self {
            frame_uuid,
            tag_video,
            numero_frame,
            total_faces_detected: 0,
            total_faces_recognized: 0,
            presences: Vec::new(),
            fps,
            duration_s,
        }
    }

    /// Builds the aggregate the Persistence Worker inserts on first
    /// presence for a frame it has not seen before (§4.4 step 3, branch b).
    pub fn first_presence(
        frame_uuid: Uuid,
        tag_video: String,
        numero_frame: i64,
        total_faces_detected: u32,
        presence_id: Uuid,
        fps: Option<f64>,
        duration_s: Option<f64>,
    ) -> Self {
        Self {
            frame_uuid,
            tag_video,
            numero_frame,
            total_faces_detected,
            total_faces_recognized: 1,
            presences: vec![presence_id],
            fps,
            duration_s,
        }
    }

    pub fn from_db(
        frame_uuid: Uuid,
        tag_video: String,
        numero_frame: i64,
        total_faces_detected: u32,
        total_faces_recognized: u32,
        presences: Vec<Uuid>,
        fps: Option<f64>,
        duration_s: Option<f64>,
    ) -> Self {
        Self {
            frame_uuid,
            tag_video,
            numero_frame,
            total_faces_detected,
            total_faces_recognized,
            presences,
            fps,
            duration_s,
        }
    }

    pub fn frame_uuid(&self) -> Uuid {
        self.frame_uuid
    }

    pub fn tag_video(&self) -> &str {
        &self.tag_video
    }

    pub fn numero_frame(&self) -> i64 {
        self.numero_frame
    }

    pub fn total_faces_detected(&self) -> u32 {
        self.total_faces_detected
    }

    pub fn total_faces_recognized(&self) -> u32 {
        self.total_faces_recognized
    }

    pub fn presences(&self) -> &[Uuid] {
        &self.presences
    }

    pub fn fps(&self) -> Option<f64> {
        self.fps
    }

    pub fn duration_s(&self) -> Option<f64> {
        self.duration_s
    }

    /// A frame aggregate with no faces recognized is a valid terminal
    /// state, not an error or an incomplete record (§9, Open Question 3).
    pub fn has_presences(&self) -> bool {
        !self.presences.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_aggregate_has_no_presences() {
        let agg = FrameAggregate::empty(Uuid::new_v4(), "video-1".to_string(), 1, Some(20.0), None);
        assert!(!agg.has_presences());
        assert_eq!(agg.total_faces_detected(), 0);
    }

    #[test]
    fn first_presence_aggregate_has_one_presence() {
        let agg = FrameAggregate::first_presence(
            Uuid::new_v4(),
            "video-1".to_string(),
            1,
            2,
            Uuid::new_v4(),
            Some(20.0),
            None,
        );
        assert!(agg.has_presences());
        assert_eq!(agg.total_faces_recognized(), 1);
        assert_eq!(agg.total_faces_detected(), 2);
    }
}
