// Stemflow Infrastructure - System Adapters
// Implements: Separator, WorkspaceStore, StemPublisher (ADR-002)

pub mod demucs_separator;
pub mod stem_publisher;
pub mod workspace_store;

pub use demucs_separator::DemucsSeparator;
pub use stem_publisher::FsStemPublisher;
pub use workspace_store::FsWorkspaceStore;
