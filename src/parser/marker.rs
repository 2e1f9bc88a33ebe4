//! Synthetic marker frame detection and stripping.
//!
//! The instrumentation layer wraps every timed method body in a synthetic
//! method named `<method>$informant$metric$<timer name>$<n>`. Those frames
//! show up in captured stacks directly inside the real method that calls
//! them, stacked when several timers wrap the same call site:
//!
//! ```text
//! (leaf first)
//! execute$informant$metric$db$query$1    <- synthetic, timer "db query"
//! execute$informant$metric$db$open$2     <- synthetic, timer "db open"
//! execute                                <- real wrapper
//! Service.handle
//! ```
//!
//! Stripping collapses such a run into a single frame carrying both timer
//! names, as the stack would have looked without instrumentation.

use super::frame::{AnnotatedFrame, StackFrame, StackOrder};
use crate::utils::config::{MARKER_KIND, MARKER_NAMESPACE};
use log::{debug, warn};

/// Precompiled matcher for synthetic marker method names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerPattern {
    /// `$<namespace>$<kind>$`
    infix: String,
}

impl Default for MarkerPattern {
    fn default() -> Self {
        Self::new(MARKER_NAMESPACE, MARKER_KIND)
    }
}

impl MarkerPattern {
    pub fn new(namespace: &str, kind: &str) -> Self {
        Self {
            infix: format!("${}${}$", namespace, kind),
        }
    }

    /// Decode the timer name of a synthetic method, `None` for ordinary methods
    ///
    /// Matches `<anything><infix><encoded>$<digits>` where `<digits>` is at
    /// least one ASCII digit. The last usable occurrence of the infix wins.
    /// `$` inside the encoded name stands for a space.
    pub fn timer_name(&self, method_name: &str) -> Option<String> {
        method_name
            .rmatch_indices(self.infix.as_str())
            .find_map(|(start, _)| {
                let rest = &method_name[start + self.infix.len()..];
                let (encoded, suffix) = rest.rsplit_once('$')?;
                if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                Some(encoded.replace('$', " "))
            })
    }

    pub fn is_synthetic(&self, frame: &StackFrame) -> bool {
        self.timer_name(&frame.method_name).is_some()
    }
}

/// Strip synthetic marker frames from a captured stack
///
/// Returns the normalized frames root first, ready for merging.
///
/// Each run of marker frames is folded into the real frame that wraps it:
/// the method name comes from that wrapper, the class, file and line from
/// the innermost marker frame of the run (the code that was actually
/// executing). A run with no wrapper left (markers at the outermost
/// position) cannot be attributed; those frames are kept unstripped.
pub fn strip_synthetic_frames(
    raw: &[StackFrame],
    order: StackOrder,
    pattern: &MarkerPattern,
) -> Vec<AnnotatedFrame> {
    // markers sit directly inside their wrapper, so walk from the leaf outward
    let leaf_first: Vec<&StackFrame> = match order {
        StackOrder::LeafFirst => raw.iter().collect(),
        StackOrder::RootFirst => raw.iter().rev().collect(),
    };

    let mut normalized = Vec::with_capacity(leaf_first.len());
    let mut i = 0;

    while i < leaf_first.len() {
        let frame = leaf_first[i];
        let Some(first_name) = pattern.timer_name(&frame.method_name) else {
            normalized.push(AnnotatedFrame::plain(frame.clone()));
            i += 1;
            continue;
        };

        let mut timer_names = vec![first_name];
        let mut next = i + 1;
        while let Some(name) = leaf_first
            .get(next)
            .and_then(|f| pattern.timer_name(&f.method_name))
        {
            timer_names.push(name);
            next += 1;
        }

        let Some(wrapper) = leaf_first.get(next) else {
            warn!(
                "Synthetic marker frame {} is the outermost captured frame, keeping {} frame(s) unstripped",
                frame,
                next - i
            );
            normalized.extend(leaf_first[i..].iter().map(|f| AnnotatedFrame::plain((*f).clone())));
            break;
        };

        debug!(
            "Stripped {} marker frame(s) around {}.{}",
            timer_names.len(),
            wrapper.class_name,
            wrapper.method_name
        );

        let original = StackFrame {
            class_name: frame.class_name.clone(),
            method_name: wrapper.method_name.clone(),
            file_name: frame.file_name.clone(),
            line_number: frame.line_number,
        };
        normalized.push(AnnotatedFrame::new(original, timer_names));
        i = next + 1;
    }

    normalized.reverse();
    normalized
}
