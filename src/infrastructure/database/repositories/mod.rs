//! Repository Implementations
//!
//! MongoDB implementations of the domain repository interfaces
//! (`pessoas`/`presencas`/`frames`/`counters`).

mod frame_repository;
mod identity_repository;
mod presence_repository;
mod sequence_allocator;

pub use frame_repository::*;
pub use identity_repository::*;
pub use presence_repository::*;
pub use sequence_allocator::*;
