//! Presence Pipeline Library
//!
//! Re-exports the domain, application and infrastructure layers shared by
//! the four worker binaries (`capture-worker`, `detection-worker`,
//! `recognition-worker`, `persistence-worker`).

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::services;
pub use application::use_cases;
pub use domain::entities;
pub use domain::events;
pub use domain::repositories;
pub use domain::value_objects;
pub use infrastructure::config::PipelineConfig;
pub use infrastructure::database;
