// Application Layer - Use Cases and Business Logic

pub mod constants;
pub mod parser;
pub mod progress;
pub mod registry;
pub mod shutdown;
pub mod supervisor;

// Re-exports
pub use progress::ProgressChannel;
pub use registry::{ActiveJob, JobRegistry};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use supervisor::{CompletedJob, JobSupervisor};
