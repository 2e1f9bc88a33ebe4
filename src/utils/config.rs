//! Configuration and constants for the sampler and CLI.

use std::time::Duration;

/// Current output schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

// Synthetic marker frames injected by the instrumentation layer are named
// `<method>$informant$metric$<timer name>$<n>`, with spaces in the timer
// name encoded as `$`.
pub const MARKER_NAMESPACE: &str = "informant";
pub const MARKER_KIND: &str = "metric";

/// Default time between two sampling ticks
pub const DEFAULT_SAMPLING_INTERVAL: Duration = Duration::from_millis(100);

/// Lower bound for the sampling interval, a tighter loop starves the sampled threads
pub const MIN_SAMPLING_INTERVAL: Duration = Duration::from_millis(1);

/// Default number of hot paths written to a profile
pub const DEFAULT_TOP_PATHS: usize = 20;
pub const MAX_TOP_PATHS: usize = 1000;

/// Upper bound for concurrent merge workers in the CLI
pub const MAX_MERGE_WORKERS: usize = 64;

// Field names for recorded sample files (host runtimes dump either spelling)
pub const SAMPLE_LIST_FIELD_NAMES: &[&str] = &["samples", "stackTraces", "stack_traces", "traces"];
pub const FRAME_LIST_FIELD_NAMES: &[&str] = &["frames", "stackTrace", "stack_trace"];
