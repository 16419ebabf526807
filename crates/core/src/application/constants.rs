// Application constants (ADR: No magic values)
use std::time::Duration;

/// How long a successful job's workspace is retained before reaping
/// (leak avoidance, not a correctness guarantee: callers are assumed
/// to have downloaded their results within this window)
pub const DEFAULT_RETENTION_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Broadcast buffer per progress subscriber; a listener further behind
/// than this lags and skips ahead instead of blocking the publisher
pub const PROGRESS_CHANNEL_CAPACITY: usize = 64;

/// Buffer for raw diagnostic lines between the separator reader and
/// the parsing task
pub const DIAGNOSTIC_LINE_BUFFER: usize = 64;
