//! Parser for recorded stack samples.
//!
//! Parses sample dumps (JSON) produced by a sampling driver into
//! `StackSample`s that can be replayed into a merged stack tree.
//! Handles format detection and both field spellings hosts use.

use super::frame::{StackFrame, StackOrder, StackSample, ThreadState};
use super::schema::{HotPath, Profile};
use crate::aggregator::node::MergedStackTreeNode;
use crate::utils::config::{FRAME_LIST_FIELD_NAMES, SAMPLE_LIST_FIELD_NAMES, SCHEMA_VERSION};
use crate::utils::error::ParseError;
use log::{debug, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Raw sample as recorded by a sampling driver
#[derive(Debug, Clone, Deserialize)]
struct RecordedSample {
    /// Run state name, e.g. "RUNNABLE"
    #[serde(alias = "threadState", alias = "state")]
    thread_state: String,

    #[serde(default, alias = "threadName")]
    thread_name: Option<String>,

    /// Frames, under any of `FRAME_LIST_FIELD_NAMES`
    #[serde(flatten)]
    rest: serde_json::Map<String, serde_json::Value>,
}

/// Parsed sample dump (internal representation)
#[derive(Debug, Clone)]
pub struct ParsedSamples {
    pub source: String,
    pub order: StackOrder,
    pub samples: Vec<StackSample>,
}

impl ParsedSamples {
    pub fn total_frames(&self) -> usize {
        self.samples.iter().map(StackSample::depth).sum()
    }

    pub fn max_depth(&self) -> usize {
        self.samples.iter().map(StackSample::depth).max().unwrap_or(0)
    }
}

/// Read and parse a sample dump from disk
///
/// **Public** - used by the merge command
pub fn read_samples_file(path: impl AsRef<Path>) -> Result<ParsedSamples, ParseError> {
    let path = path.as_ref();
    debug!("Reading samples from: {}", path.display());

    let content = std::fs::read_to_string(path)?;
    let raw: serde_json::Value = serde_json::from_str(&content)?;

    parse_samples(&path.display().to_string(), &raw)
}

/// Parse a raw sample dump
///
/// **Public** - main entry point for parsing
///
/// # Arguments
/// * `source` - Label recorded in the profile (usually the file name)
/// * `raw` - Either an array of samples or an object holding one
///
/// # Errors
/// * `ParseError::InvalidFormat` - Not an array/object, no sample list, or
///   every sample malformed
pub fn parse_samples(source: &str, raw: &serde_json::Value) -> Result<ParsedSamples, ParseError> {
    debug!("Parsing samples from: {}", source);

    let (sample_values, order) = detect_sample_format(raw)?;

    let mut samples = Vec::with_capacity(sample_values.len());
    for (index, value) in sample_values.iter().enumerate() {
        match parse_sample(value, order) {
            Ok(sample) => samples.push(sample),
            Err(e) => {
                // Log but don't fail - a dump may contain a few torn records
                warn!("Failed to parse sample {}: {}", index, e);
            }
        }
    }

    if samples.is_empty() && !sample_values.is_empty() {
        return Err(ParseError::InvalidFormat("All samples failed to parse".to_string()));
    }

    debug!("Parsed {} samples ({:?})", samples.len(), order);

    Ok(ParsedSamples {
        source: source.to_string(),
        order,
        samples,
    })
}

/// Locate the sample list and the frame order of a dump
///
/// **Private** - internal helper for parse_samples
fn detect_sample_format(
    raw: &serde_json::Value,
) -> Result<(&[serde_json::Value], StackOrder), ParseError> {
    match raw {
        serde_json::Value::Array(samples) => {
            debug!("Samples are a bare array, assuming leaf-first frames");
            Ok((samples.as_slice(), StackOrder::default()))
        }

        serde_json::Value::Object(obj) => {
            let order = match obj.get("order") {
                Some(value) => serde_json::from_value::<StackOrder>(value.clone())
                    .map_err(|e| ParseError::InvalidFormat(format!("Invalid frame order: {}", e)))?,
                None => StackOrder::default(),
            };

            let samples = SAMPLE_LIST_FIELD_NAMES
                .iter()
                .find_map(|field| obj.get(*field).and_then(|v| v.as_array()))
                .ok_or_else(|| {
                    ParseError::InvalidFormat(format!(
                        "No sample list found (expected one of {:?})",
                        SAMPLE_LIST_FIELD_NAMES
                    ))
                })?;

            Ok((samples.as_slice(), order))
        }

        _ => Err(ParseError::InvalidFormat(
            "Samples must be a JSON object or array".to_string(),
        )),
    }
}

/// Parse one recorded sample
///
/// **Private** - internal parsing logic
fn parse_sample(value: &serde_json::Value, order: StackOrder) -> Result<StackSample, ParseError> {
    let recorded: RecordedSample = serde_json::from_value(value.clone())?;
    let thread_state: ThreadState = recorded.thread_state.parse()?;

    let frames_value = FRAME_LIST_FIELD_NAMES
        .iter()
        .find_map(|field| recorded.rest.get(*field))
        .cloned()
        .ok_or_else(|| ParseError::InvalidFormat("missing frame list".to_string()))?;
    let frames: Vec<StackFrame> = serde_json::from_value(frames_value)?;

    let mut sample = StackSample::new(frames, order, thread_state);
    sample.thread_name = recorded.thread_name;
    Ok(sample)
}

/// Validate a parsed dump before merging
///
/// **Public** - rejects dumps that would produce an empty profile
pub fn validate_samples(parsed: &ParsedSamples) -> Result<(), ParseError> {
    if parsed.samples.is_empty() {
        return Err(ParseError::InvalidFormat(format!("No samples in {}", parsed.source)));
    }
    if parsed.samples.iter().all(|s| s.frames.is_empty()) {
        return Err(ParseError::InvalidFormat(format!(
            "Every sample in {} has an empty stack",
            parsed.source
        )));
    }
    Ok(())
}

/// Convert a tree snapshot to output profile format
///
/// **Public** - used by commands to create final output
pub fn to_profile(
    source: &str,
    total_samples: u64,
    root: MergedStackTreeNode,
    hot_paths: Vec<HotPath>,
    timer_totals: BTreeMap<String, u64>,
) -> Profile {
    use chrono::Utc;

    Profile {
        version: SCHEMA_VERSION.to_string(),
        source: source.to_string(),
        total_samples,
        node_count: root.node_count(),
        max_depth: root.max_depth(),
        root,
        hot_paths,
        timer_totals,
        generated_at: Utc::now().to_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_bare_array() {
        let raw = json!([
            {
                "thread_state": "RUNNABLE",
                "frames": [
                    {"class_name": "Leaf", "method_name": "spin", "file_name": "Leaf.java", "line_number": 3},
                    {"class_name": "Main", "method_name": "main"}
                ]
            }
        ]);

        let parsed = parse_samples("test", &raw).unwrap();
        assert_eq!(parsed.order, StackOrder::LeafFirst);
        assert_eq!(parsed.samples.len(), 1);
        assert_eq!(parsed.samples[0].frames[1].line_number, -1);
        assert_eq!(parsed.samples[0].frames[1].file_name, None);
        assert_eq!(parsed.total_frames(), 2);
    }

    #[test]
    fn test_parse_camel_case_object() {
        let raw = json!({
            "order": "root_first",
            "stackTraces": [
                {
                    "threadState": "timed_waiting",
                    "threadName": "pool-1",
                    "stackTrace": [
                        {"className": "Main", "methodName": "main", "fileName": "Main.java", "lineNumber": 9}
                    ]
                }
            ]
        });

        let parsed = parse_samples("test", &raw).unwrap();
        assert_eq!(parsed.order, StackOrder::RootFirst);
        let sample = &parsed.samples[0];
        assert_eq!(sample.thread_state, ThreadState::TimedWaiting);
        assert_eq!(sample.thread_name.as_deref(), Some("pool-1"));
        assert_eq!(sample.frames[0].class_name, "Main");
    }

    #[test]
    fn test_malformed_samples_skipped() {
        let raw = json!([
            {"thread_state": "SLEEPING", "frames": []},
            {"thread_state": "BLOCKED", "frames": [{"class_name": "A", "method_name": "b"}]},
            {"thread_state": "RUNNABLE"}
        ]);
        let parsed = parse_samples("test", &raw).unwrap();
        assert_eq!(parsed.samples.len(), 1);
        assert_eq!(parsed.samples[0].thread_state, ThreadState::Blocked);
    }

    #[test]
    fn test_all_samples_malformed() {
        let raw = json!([{"frames": []}]);
        assert!(matches!(parse_samples("test", &raw), Err(ParseError::InvalidFormat(_))));
    }

    #[test]
    fn test_invalid_top_level() {
        assert!(parse_samples("test", &json!("nope")).is_err());
        assert!(parse_samples("test", &json!({"other": []})).is_err());
        assert!(parse_samples("test", &json!({"order": "sideways", "samples": []})).is_err());
    }

    #[test]
    fn test_validate_samples() {
        let empty = parse_samples("empty", &json!([])).unwrap();
        assert!(validate_samples(&empty).is_err());

        let no_frames = parse_samples("bare", &json!([{"thread_state": "NEW"}])).unwrap();
        assert!(validate_samples(&no_frames).is_err());
    }
}
