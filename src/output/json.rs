//! JSON profile output writer.
//!
//! Writes Profile structs to JSON files with proper formatting.

use crate::parser::schema::Profile;
use crate::utils::error::OutputError;
use log::{debug, info};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Write a profile to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Arguments
/// * `profile` - Profile data to write
/// * `output_path` - Path to output JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_profile(profile: &Profile, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing profile to: {}", output_path.display());

    prepare_output_path(output_path)?;

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, profile).map_err(OutputError::SerializationFailed)?;

    info!(
        "Profile written successfully ({} bytes)",
        calculate_file_size(output_path)
    );

    Ok(())
}

/// Serialize a profile to a pretty JSON string (for tests or in-memory use)
pub fn profile_to_string(profile: &Profile) -> Result<String, OutputError> {
    serde_json::to_string_pretty(profile).map_err(OutputError::SerializationFailed)
}

/// Validate that output path is writable
///
/// **Public** - shared by every writer
pub fn validate_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

/// Validate the path and create missing parent directories
pub(crate) fn prepare_output_path(path: &Path) -> Result<(), OutputError> {
    validate_path(path)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    Ok(())
}

fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Read a profile from a JSON file
///
/// **Public** - useful for validation and testing
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_profile(input_path: impl AsRef<Path>) -> Result<Profile, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading profile from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;

    let profile: Profile =
        serde_json::from_reader(BufReader::new(file)).map_err(OutputError::SerializationFailed)?;

    debug!(
        "Profile loaded: version {}, {} samples from {}",
        profile.version, profile.total_samples, profile.source
    );

    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::node::MergedStackTreeNode;
    use crate::parser::schema::HotPath;
    use std::collections::BTreeMap;
    use tempfile::NamedTempFile;

    fn create_test_profile() -> Profile {
        Profile {
            version: "1.0.0".to_string(),
            source: "samples.json".to_string(),
            total_samples: 10,
            node_count: 0,
            max_depth: 0,
            root: MergedStackTreeNode::synthetic_root(Vec::new()),
            hot_paths: vec![HotPath {
                stack: "Main.main;Service.run".to_string(),
                samples: 5,
                percentage: 50.0,
            }],
            timer_totals: BTreeMap::new(),
            generated_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_write_and_read_profile() {
        let profile = create_test_profile();
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path();

        write_profile(&profile, path).unwrap();
        let loaded = read_profile(path).unwrap();

        assert_eq!(loaded.version, profile.version);
        assert_eq!(loaded.source, profile.source);
        assert_eq!(loaded.total_samples, profile.total_samples);
        assert_eq!(loaded.hot_paths, profile.hot_paths);
    }

    #[test]
    fn test_profile_to_string() {
        let json = profile_to_string(&create_test_profile()).unwrap();
        assert!(json.contains("\"total_samples\": 10"));
        // empty synthetic root serializes without frame or children
        assert!(!json.contains("\"frame\""));
    }

    #[test]
    fn test_validate_output_path_empty() {
        assert!(validate_path(Path::new("")).is_err());
    }

    #[test]
    fn test_validate_output_path_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(validate_path(temp_dir.path()).is_err());
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested_path = temp_dir.path().join("nested/dirs/profile.json");

        write_profile(&create_test_profile(), &nested_path).unwrap();

        assert!(nested_path.exists());
    }
}
