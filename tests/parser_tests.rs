use pretty_assertions::assert_eq;
use stack_sampler::parser::{
    parse_samples, read_samples_file, strip_synthetic_frames, validate_samples, MarkerPattern,
    StackFrame, StackOrder, ThreadState,
};
use std::io::Write;
use tempfile::NamedTempFile;

fn frame(class: &str, method: &str, line: i32) -> StackFrame {
    StackFrame::new(class, method, Some(format!("{}.java", class)), line)
}

#[test]
fn test_single_marker_collapses_into_call_site() {
    let raw = vec![
        frame("DbClient", "foo$informant$metric$db query$123", 55),
        frame("DbClient", "execute", 20),
        frame("Main", "main", 3),
    ];

    let out = strip_synthetic_frames(&raw, StackOrder::LeafFirst, &MarkerPattern::default());

    assert_eq!(out.len(), 2);
    assert_eq!(out[0].frame.label(), "Main.main");
    assert!(out[0].timer_names.is_empty());
    assert_eq!(out[1].frame.label(), "DbClient.execute");
    assert_eq!(out[1].timer_names, vec!["db query".to_string()]);
}

#[test]
fn test_stacked_markers_keep_encounter_order() {
    let raw = vec![
        frame("DbClient", "execute$informant$metric$db$query$1", 55),
        frame("DbClient", "execute$informant$metric$db$open$2", 54),
        frame("DbClient", "execute", 20),
    ];

    let out = strip_synthetic_frames(&raw, StackOrder::LeafFirst, &MarkerPattern::default());

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].frame.method_name, "execute");
    assert_eq!(out[0].frame.line_number, 55);
    assert_eq!(out[0].timer_names, vec!["db query".to_string(), "db open".to_string()]);
}

#[test]
fn test_root_first_input_strips_the_same_way() {
    let leaf_first = vec![
        frame("DbClient", "execute$informant$metric$db$query$1", 55),
        frame("DbClient", "execute", 20),
        frame("Main", "main", 3),
    ];
    let root_first: Vec<StackFrame> = leaf_first.iter().rev().cloned().collect();
    let pattern = MarkerPattern::default();

    assert_eq!(
        strip_synthetic_frames(&leaf_first, StackOrder::LeafFirst, &pattern),
        strip_synthetic_frames(&root_first, StackOrder::RootFirst, &pattern)
    );
}

#[test]
fn test_near_miss_marker_passes_through() {
    let raw = vec![
        frame("DbClient", "execute$informant$metric$db query$", 55),
        frame("DbClient", "execute", 20),
    ];

    let out = strip_synthetic_frames(&raw, StackOrder::LeafFirst, &MarkerPattern::default());

    assert_eq!(out.len(), 2);
    assert_eq!(out[1].frame.method_name, "execute$informant$metric$db query$");
    assert!(out.iter().all(|f| f.timer_names.is_empty()));
}

#[test]
fn test_outermost_marker_run_is_not_stripped() {
    let raw = vec![
        frame("Worker", "spin", 9),
        frame("Boot", "start$informant$metric$boot$1", 2),
        frame("Boot", "start$informant$metric$init$2", 1),
    ];

    let out = strip_synthetic_frames(&raw, StackOrder::LeafFirst, &MarkerPattern::default());

    assert_eq!(out.len(), 3);
    assert_eq!(out[0].frame.method_name, "start$informant$metric$init$2");
    assert_eq!(out[1].frame.method_name, "start$informant$metric$boot$1");
    assert_eq!(out[2].frame.method_name, "spin");
    assert!(out.iter().all(|f| f.timer_names.is_empty()));
}

#[test]
fn test_read_samples_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "order": "leaf_first",
            "samples": [
                {{"thread_state": "RUNNABLE", "thread_name": "main", "frames": [
                    {{"class_name": "Leaf", "method_name": "spin", "line_number": 4}},
                    {{"class_name": "Main", "method_name": "main", "file_name": "Main.java", "line_number": 1}}
                ]}},
                {{"threadState": "WAITING", "stackTrace": [
                    {{"className": "Object", "methodName": "wait", "lineNumber": -2}}
                ]}}
            ]
        }}"#
    )
    .unwrap();

    let parsed = read_samples_file(file.path()).unwrap();
    assert!(validate_samples(&parsed).is_ok());
    assert_eq!(parsed.samples.len(), 2);
    assert_eq!(parsed.samples[0].thread_name.as_deref(), Some("main"));
    assert_eq!(parsed.samples[1].thread_state, ThreadState::Waiting);
    assert!(parsed.samples[1].frames[0].is_native());
    assert_eq!(parsed.max_depth(), 2);
}

#[test]
fn test_read_samples_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    assert!(read_samples_file(dir.path().join("missing.json")).is_err());
}

#[test]
fn test_parse_samples_rejects_scalar() {
    assert!(parse_samples("inline", &serde_json::json!(42)).is_err());
}
