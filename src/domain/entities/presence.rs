//! Presence Entity (`presenca`)
//!
//! One recognition event: an identity seen in a frame, with the full
//! per-stage latency breakdown carried end-to-end through the pipeline's
//! message contracts (§6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Latency bookkeeping carried from Capture through Persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timings {
    pub capture_started_at: f64,
    pub capture_duration_s: f64,
    pub detection_duration_s: f64,
    pub recognition_duration_s: f64,
    pub queue_wait_capture_to_detection_s: f64,
    pub queue_wait_detection_to_recognition_s: f64,
}

impl Timings {
    pub fn total_queue_wait_s(&self) -> f64 {
        self.queue_wait_capture_to_detection_s + self.queue_wait_detection_to_recognition_s
    }
}

/// A single presence event: an identity recognized in a frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Presence {
    id: Option<Uuid>,
    identity_uuid: Uuid,
    tags: Vec<Uuid>,
    recognition_crop_path: String,
    frame_uuid: Uuid,
    tag_video: String,
    frame_capture_date: String,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    timings: Timings,
}

impl Presence {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        identity_uuid: Uuid,
        tags: Vec<Uuid>,
        recognition_crop_path: String,
        frame_uuid: Uuid,
        tag_video: String,
        frame_capture_date: String,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        timings: Timings,
    ) -> Self {
        Self {
            id: None,
            identity_uuid,
            tags,
            recognition_crop_path,
            frame_uuid,
            tag_video,
            frame_capture_date,
            started_at,
            finished_at,
            timings,
        }
    }

    pub fn from_db(
        id: Uuid,
        identity_uuid: Uuid,
        tags: Vec<Uuid>,
        recognition_crop_path: String,
        frame_uuid: Uuid,
        tag_video: String,
        frame_capture_date: String,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        timings: Timings,
    ) -> Self {
        Self {
            id: Some(id),
            identity_uuid,
            tags,
            recognition_crop_path,
            frame_uuid,
            tag_video,
            frame_capture_date,
            started_at,
            finished_at,
            timings,
        }
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    pub fn identity_uuid(&self) -> Uuid {
        self.identity_uuid
    }

    pub fn tags(&self) -> &[Uuid] {
        &self.tags
    }

    pub fn recognition_crop_path(&self) -> &str {
        &self.recognition_crop_path
    }

    pub fn frame_uuid(&self) -> Uuid {
        self.frame_uuid
    }

    pub fn tag_video(&self) -> &str {
        &self.tag_video
    }

    pub fn frame_capture_date(&self) -> &str {
        &self.frame_capture_date
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    pub fn total_processing_time_s(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_timings() -> Timings {
        Timings {
            capture_started_at: 0.0,
            capture_duration_s: 0.01,
            detection_duration_s: 0.02,
            recognition_duration_s: 0.03,
            queue_wait_capture_to_detection_s: 0.1,
            queue_wait_detection_to_recognition_s: 0.2,
        }
    }

    #[test]
    fn total_queue_wait_sums_both_hops() {
        let t = sample_timings();
        assert!((t.total_queue_wait_s() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn total_processing_time_matches_wall_clock() {
        let started = Utc::now();
        let finished = started + chrono::Duration::milliseconds(500);
        let presence = Presence::new(
            Uuid::new_v4(),
            vec![],
            "uuid/face_1.png".to_string(),
            Uuid::new_v4(),
            "video-1".to_string(),
            "27-07-2026".to_string(),
            started,
            finished,
            sample_timings(),
        );
        assert!((presence.total_processing_time_s() - 0.5).abs() < 1e-6);
    }
}
