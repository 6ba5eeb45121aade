//! Domain Entities
//!
//! Core business objects with identity and lifecycle.

mod detection;
mod frame_aggregate;
mod identity;
mod presence;

pub use detection::*;
pub use frame_aggregate::*;
pub use identity::*;
pub use presence::*;
