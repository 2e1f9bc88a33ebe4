use stack_sampler::aggregator::{build_collapsed_stacks, MergedStackTree};
use stack_sampler::output::{
    folded_to_string, read_profile, validate_path, write_folded, write_profile,
};
use stack_sampler::parser::{to_profile, AnnotatedFrame, StackFrame, ThreadState};
use std::collections::BTreeMap;
use std::path::Path;
use tempfile::NamedTempFile;

fn tree() -> MergedStackTree {
    let tree = MergedStackTree::new();
    let frames = |methods: &[&str]| -> Vec<AnnotatedFrame> {
        methods
            .iter()
            .map(|m| AnnotatedFrame::plain(StackFrame::new("App", *m, None, 1)))
            .collect()
    };
    tree.add_to_stack_tree(&frames(&["main", "work"]), ThreadState::Runnable).unwrap();
    tree.add_to_stack_tree(&frames(&["main", "work"]), ThreadState::Runnable).unwrap();
    tree.add_to_stack_tree(&frames(&["main", "sleep"]), ThreadState::TimedWaiting).unwrap();
    tree
}

#[test]
fn test_profile_round_trip_keeps_tree() {
    let tree = tree();
    let root = tree.root_node().unwrap();
    let total = tree.sample_count().unwrap();
    let profile = to_profile("unit", total, root.clone(), Vec::new(), BTreeMap::new());

    let temp_file = NamedTempFile::new().unwrap();
    write_profile(&profile, temp_file.path()).unwrap();
    let loaded = read_profile(temp_file.path()).unwrap();

    assert_eq!(loaded.root, root);
    assert_eq!(loaded.node_count, 3);
    assert_eq!(loaded.max_depth, 2);
    assert_eq!(
        loaded.root.children[0].children[1].leaf_thread_state,
        Some(ThreadState::TimedWaiting)
    );
}

#[test]
fn test_folded_output() {
    let stacks = build_collapsed_stacks(&tree().root_node().unwrap());
    assert_eq!(folded_to_string(&stacks), "App.main;App.work 2\nApp.main;App.sleep 1\n");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/out.folded");
    write_folded(&stacks, &path).unwrap();
    assert!(path.exists());
}

#[test]
fn test_validate_output_path() {
    assert!(validate_path(Path::new("")).is_err());
    let dir = tempfile::tempdir().unwrap();
    assert!(validate_path(dir.path()).is_err());
    assert!(validate_path(&dir.path().join("profile.json")).is_ok());
}
