//! Periodic stack sampling driver.
//!
//! A `StackSource` captures the stacks of the threads of interest; a
//! `StackSampler` polls it on a background thread and merges every capture
//! into a shared `MergedStackTree`. Several samplers may feed one tree.

use crate::aggregator::merged_tree::MergedStackTree;
use crate::parser::frame::StackSample;
use crate::utils::config::{DEFAULT_SAMPLING_INTERVAL, MIN_SAMPLING_INTERVAL};
use crate::utils::error::SamplerError;
use log::{debug, info, warn};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A pluggable source of stack samples
pub trait StackSource: Send {
    /// Human-readable source name, used for the sampler thread
    fn name(&self) -> &str {
        "stack-source"
    }

    /// Capture one round of samples, one per sampled thread
    fn capture(&mut self) -> Vec<StackSample>;
}

/// Configuration for a background sampler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerConfig {
    /// Time between two ticks
    pub interval: Duration,

    /// Keep only the innermost frames of deeper stacks
    pub max_stack_depth: Option<usize>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SAMPLING_INTERVAL,
            max_stack_depth: None,
        }
    }
}

impl SamplerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_stack_depth(mut self, depth: usize) -> Self {
        self.max_stack_depth = Some(depth);
        self
    }

    pub fn validate(&self) -> Result<(), SamplerError> {
        if self.interval < MIN_SAMPLING_INTERVAL {
            return Err(SamplerError::InvalidConfig(format!(
                "interval {:?} is below the minimum of {:?}",
                self.interval, MIN_SAMPLING_INTERVAL
            )));
        }
        if self.max_stack_depth == Some(0) {
            return Err(SamplerError::InvalidConfig(
                "max_stack_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Run one sampling tick: capture from `source` and merge into `tree`
///
/// Returns the number of samples merged. A failed merge is logged and the
/// remaining samples of the tick are still merged.
pub fn sample_once(
    source: &mut dyn StackSource,
    tree: &MergedStackTree,
    config: &SamplerConfig,
) -> usize {
    let mut merged = 0;
    for mut sample in source.capture() {
        if let Some(max_depth) = config.max_stack_depth {
            sample.truncate_to_innermost(max_depth);
        }
        match tree.add_stack_trace(&sample) {
            Ok(()) => merged += 1,
            Err(e) => warn!(
                "Dropping sample from {} ({}): {}",
                source.name(),
                sample.thread_name.as_deref().unwrap_or("unnamed thread"),
                e
            ),
        }
    }
    merged
}

/// Background thread polling a `StackSource` at a fixed interval
///
/// Stops on `stop()` or when dropped.
#[derive(Debug)]
pub struct StackSampler {
    stop: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl StackSampler {
    pub fn start<S>(
        source: S,
        tree: Arc<MergedStackTree>,
        config: SamplerConfig,
    ) -> Result<Self, SamplerError>
    where
        S: StackSource + 'static,
    {
        config.validate()?;

        let stop = Arc::new(AtomicBool::new(false));
        let ticks = Arc::new(AtomicU64::new(0));
        let thread_name = format!("sampler-{}", source.name());

        info!("Starting sampler {} every {:?}", thread_name, config.interval);

        let handle = {
            let stop = Arc::clone(&stop);
            let ticks = Arc::clone(&ticks);
            thread::Builder::new()
                .name(thread_name)
                .spawn(move || sampler_loop(source, &tree, &config, &stop, &ticks))?
        };

        Ok(Self {
            stop,
            ticks,
            handle: Some(handle),
        })
    }

    /// Completed ticks so far
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the sampler thread and wait for its current tick to finish
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.stop.store(true, Ordering::Release);
        handle.thread().unpark();
        if handle.join().is_err() {
            warn!("Sampler thread panicked");
        }
        debug!("Sampler stopped after {} ticks", self.ticks());
    }
}

impl Drop for StackSampler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn sampler_loop<S: StackSource>(
    mut source: S,
    tree: &MergedStackTree,
    config: &SamplerConfig,
    stop: &AtomicBool,
    ticks: &AtomicU64,
) {
    while !stop.load(Ordering::Acquire) {
        let merged = sample_once(&mut source, tree, config);
        ticks.fetch_add(1, Ordering::AcqRel);
        debug!("Tick merged {} samples from {}", merged, source.name());
        // unparked early by stop()
        thread::park_timeout(config.interval);
    }
}

/// Replays recorded samples, `batch_size` per tick
#[derive(Debug, Clone)]
pub struct ReplaySource {
    name: String,
    pending: VecDeque<StackSample>,
    batch_size: usize,
}

impl ReplaySource {
    pub fn new(name: impl Into<String>, samples: Vec<StackSample>, batch_size: usize) -> Self {
        Self {
            name: name.into(),
            pending: samples.into(),
            batch_size: batch_size.max(1),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl StackSource for ReplaySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn capture(&mut self) -> Vec<StackSample> {
        let take = self.batch_size.min(self.pending.len());
        self.pending.drain(..take).collect()
    }
}
