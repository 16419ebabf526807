// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing
pub mod separator;
pub mod stem_publisher;
pub mod time_provider;
pub mod workspace_store;

// Re-exports
pub use id_provider::IdProvider;
pub use separator::{SeparationError, SeparationOutcome, Separator};
pub use stem_publisher::{PublishError, StemPublisher};
pub use time_provider::TimeProvider;
pub use workspace_store::{JobWorkspace, WorkspaceError, WorkspaceStore};
