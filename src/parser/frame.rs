//! Stack frame and sample types shared by the parser, the tree and the sampler.
//!
//! A sample is one captured call stack plus the run state of the sampled
//! thread at the moment of capture.

use crate::utils::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One frame of a captured call stack
///
/// Equality is structural over all four fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StackFrame {
    #[serde(alias = "className")]
    pub class_name: String,

    #[serde(alias = "methodName")]
    pub method_name: String,

    #[serde(default, alias = "fileName", skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    /// Source line, negative when unknown (`-2` marks a native method)
    #[serde(default = "unknown_line", alias = "lineNumber")]
    pub line_number: i32,
}

fn unknown_line() -> i32 {
    -1
}

impl StackFrame {
    pub fn new(
        class_name: impl Into<String>,
        method_name: impl Into<String>,
        file_name: Option<String>,
        line_number: i32,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: method_name.into(),
            file_name,
            line_number,
        }
    }

    /// Short `Class.method` label used in folded stacks and hot paths
    pub fn label(&self) -> String {
        format!("{}.{}", self.class_name, self.method_name)
    }

    pub fn is_native(&self) -> bool {
        self.line_number == -2
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.class_name, self.method_name)?;
        match (&self.file_name, self.line_number) {
            _ if self.is_native() => write!(f, "Native Method)"),
            (Some(file), line) if line >= 0 => write!(f, "{}:{})", file, line),
            (Some(file), _) => write!(f, "{})", file),
            (None, _) => write!(f, "Unknown Source)"),
        }
    }
}

/// Run state of a sampled thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreadState {
    New,
    Runnable,
    Blocked,
    Waiting,
    TimedWaiting,
    Terminated,
}

impl ThreadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreadState::New => "NEW",
            ThreadState::Runnable => "RUNNABLE",
            ThreadState::Blocked => "BLOCKED",
            ThreadState::Waiting => "WAITING",
            ThreadState::TimedWaiting => "TIMED_WAITING",
            ThreadState::Terminated => "TERMINATED",
        }
    }
}

impl fmt::Display for ThreadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThreadState {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "NEW" => Ok(ThreadState::New),
            "RUNNABLE" => Ok(ThreadState::Runnable),
            "BLOCKED" => Ok(ThreadState::Blocked),
            "WAITING" => Ok(ThreadState::Waiting),
            "TIMED_WAITING" => Ok(ThreadState::TimedWaiting),
            "TERMINATED" => Ok(ThreadState::Terminated),
            _ => Err(ParseError::UnknownThreadState(s.to_string())),
        }
    }
}

/// A real frame plus the timer names of the marker frames that wrapped it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedFrame {
    pub frame: StackFrame,

    /// Timer names in encounter order, empty when no marker frame was stripped
    pub timer_names: Vec<String>,
}

impl AnnotatedFrame {
    pub fn new(frame: StackFrame, timer_names: Vec<String>) -> Self {
        Self { frame, timer_names }
    }

    pub fn plain(frame: StackFrame) -> Self {
        Self {
            frame,
            timer_names: Vec::new(),
        }
    }
}

/// Order of the frames in a captured stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackOrder {
    /// Index 0 is the top of the stack, as thread dumps report it
    #[default]
    LeafFirst,
    /// Index 0 is the outermost caller
    RootFirst,
}

/// One captured stack trace and the state of the thread it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackSample {
    pub frames: Vec<StackFrame>,
    pub order: StackOrder,
    pub thread_state: ThreadState,
    pub thread_name: Option<String>,
}

impl StackSample {
    pub fn new(frames: Vec<StackFrame>, order: StackOrder, thread_state: ThreadState) -> Self {
        Self {
            frames,
            order,
            thread_state,
            thread_name: None,
        }
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = Some(name.into());
        self
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Keep only the innermost `max_depth` frames
    pub fn truncate_to_innermost(&mut self, max_depth: usize) {
        if self.frames.len() <= max_depth {
            return;
        }
        match self.order {
            StackOrder::LeafFirst => self.frames.truncate(max_depth),
            StackOrder::RootFirst => {
                let excess = self.frames.len() - max_depth;
                self.frames.drain(..excess);
            }
        }
    }
}
