// Domain Layer - Pure business logic and entities

pub mod error;
pub mod job;
pub mod progress;
pub mod result;
pub mod stem;

// Re-exports
pub use error::DomainError;
pub use job::{Job, JobId, JobState};
pub use progress::ProgressSnapshot;
pub use result::ResultReference;
pub use stem::Stem;
