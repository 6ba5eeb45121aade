//! Use Cases
//!
//! One use case per worker's per-message flow (§4): each owns exactly the
//! orchestration for its stage and nothing else — the pipeline's forward-
//! only control flow (§2) falls out of these four being composed only by
//! the worker binaries, never by each other.

mod capture_frame;
mod detect_faces;
mod persist_presence;
mod recognize_face;

pub use capture_frame::*;
pub use detect_faces::*;
pub use persist_presence::*;
pub use recognize_face::*;

use chrono::{DateTime, Utc};

/// Epoch seconds as an `f64`, matching every timing field in the
/// pipeline's message contracts (§6).
pub(crate) fn epoch_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 1000.0
}
