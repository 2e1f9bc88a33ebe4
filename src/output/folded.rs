//! Folded (collapsed) stack output.
//!
//! One line per distinct leaf path, `outer;...;leaf weight`, the format
//! consumed by flamegraph tooling.

use super::json::prepare_output_path;
use crate::aggregator::stack_builder::CollapsedStack;
use crate::utils::error::OutputError;
use log::{debug, info};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Render collapsed stacks as folded text
pub fn folded_to_string(stacks: &[CollapsedStack]) -> String {
    let mut out = String::new();
    for stack in stacks {
        out.push_str(&stack.to_line());
        out.push('\n');
    }
    out
}

/// Write collapsed stacks to a folded text file
///
/// **Public** - main entry point for folded output
pub fn write_folded(
    stacks: &[CollapsedStack],
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing {} folded stacks to: {}", stacks.len(), output_path.display());

    prepare_output_path(output_path)?;

    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    for stack in stacks {
        writeln!(writer, "{}", stack.to_line())?;
    }
    writer.flush()?;

    Ok(())
}

/// Read a folded text file back into collapsed stacks
///
/// # Errors
/// * `OutputError::MalformedFolded` - a line without a numeric weight
pub fn read_folded(input_path: impl AsRef<Path>) -> Result<Vec<CollapsedStack>, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading folded stacks from: {}", input_path.display());

    let content = std::fs::read_to_string(input_path)?;
    parse_folded(&content)
}

/// Parse folded text, blank lines are skipped
pub fn parse_folded(content: &str) -> Result<Vec<CollapsedStack>, OutputError> {
    let mut stacks = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        let malformed = |reason: &str| OutputError::MalformedFolded {
            line: index + 1,
            reason: reason.to_string(),
        };

        let (stack, weight) = line.rsplit_once(' ').ok_or_else(|| malformed("missing weight"))?;
        let weight = weight.parse::<u64>().map_err(|_| malformed("weight is not a number"))?;
        if stack.is_empty() {
            return Err(malformed("empty stack"));
        }

        stacks.push(CollapsedStack::new(stack.to_string(), weight));
    }

    Ok(stacks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn stacks() -> Vec<CollapsedStack> {
        vec![
            CollapsedStack::new("Main.main;Db.query".to_string(), 4),
            CollapsedStack::new("Main.main".to_string(), 1),
        ]
    }

    #[test]
    fn test_folded_to_string() {
        assert_eq!(folded_to_string(&stacks()), "Main.main;Db.query 4\nMain.main 1\n");
    }

    #[test]
    fn test_write_and_read_folded() {
        let temp_file = NamedTempFile::new().unwrap();

        write_folded(&stacks(), temp_file.path()).unwrap();
        let loaded = read_folded(temp_file.path()).unwrap();

        assert_eq!(loaded, stacks());
    }

    #[test]
    fn test_parse_folded_errors() {
        assert!(matches!(
            parse_folded("Main.main"),
            Err(OutputError::MalformedFolded { line: 1, .. })
        ));
        assert!(matches!(
            parse_folded("\nMain.main x"),
            Err(OutputError::MalformedFolded { line: 2, .. })
        ));
    }
}
