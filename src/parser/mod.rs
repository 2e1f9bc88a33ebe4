//! Sample parsing, frame normalization and schema definitions.
//!
//! This module handles:
//! - Stack frame, thread state and sample types
//! - Stripping synthetic marker frames and decoding their timer names
//! - Parsing recorded sample dumps
//! - Defining output schema

pub mod frame;
pub mod marker;
pub mod samples;
pub mod schema;

// Re-export main types
pub use frame::{AnnotatedFrame, StackFrame, StackOrder, StackSample, ThreadState};
pub use marker::{strip_synthetic_frames, MarkerPattern};
pub use samples::{parse_samples, read_samples_file, to_profile, validate_samples, ParsedSamples};
pub use schema::{HotPath, Profile};
