//! Database Module
//!
//! Metadata store connection and repository implementations (MongoDB).

mod mongo;
pub mod repositories;

pub use mongo::*;
