//! Per-part merge of the copied files into one book.
//!
//! The merge itself is delegated to an external program. Every part gets its
//! own thread; each thread reports exactly one `MergeOutcome` on a channel and
//! the caller waits until it has heard from all of them.

use crossbeam_channel::unbounded;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

use crate::config::MergeConfig;
use crate::error::{Error, Result};
use crate::output::SetlistLayout;

/// Inputs for merging one part folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeJob {
    pub part: String,
    /// Setlist directory the merge program writes into
    pub output_dir: PathBuf,
    /// Part folder holding dividers, copies and placeholders
    pub source_dir: PathBuf,
    pub merged_file: PathBuf,
}

impl MergeJob {
    pub fn for_part(layout: &SetlistLayout, part: &str) -> Self {
        Self {
            part: part.to_string(),
            output_dir: layout.dir.clone(),
            source_dir: layout.part_dir(part),
            merged_file: layout.merged_file(part),
        }
    }
}

/// Something that can turn a part folder into a merged book.
pub trait Merger: Sync {
    fn merge(&self, job: &MergeJob) -> Result<()>;
}

/// Runs the configured merge command once per part.
#[derive(Debug, Clone)]
pub struct ExternalMerger {
    program: String,
    leading_args: Vec<String>,
    cleanup_suffix: String,
}

impl ExternalMerger {
    pub fn new(config: &MergeConfig) -> Result<Self> {
        let (program, leading_args) = config
            .command
            .split_first()
            .ok_or_else(|| Error::InvalidConfig("merge.command is empty".to_string()))?;
        Ok(Self {
            program: program.clone(),
            leading_args: leading_args.to_vec(),
            cleanup_suffix: config.cleanup_suffix.clone(),
        })
    }

    pub fn args(&self, job: &MergeJob) -> Vec<String> {
        let mut args = self.leading_args.clone();
        args.push(format!("-out={}", job.output_dir.display()));
        args.push(format!("-source={}", job.source_dir.display()));
        args.push(format!("-merge={}", job.merged_file.display()));
        args
    }

    fn scratch_file(&self, job: &MergeJob) -> PathBuf {
        PathBuf::from(format!("{}{}", job.merged_file.display(), self.cleanup_suffix))
    }

    fn remove_scratch_file(&self, job: &MergeJob) {
        let scratch = self.scratch_file(job);
        match std::fs::remove_file(&scratch) {
            Ok(()) => debug!("Removed {}", scratch.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove {}: {}", scratch.display(), e),
        }
    }
}

impl Merger for ExternalMerger {
    fn merge(&self, job: &MergeJob) -> Result<()> {
        let output = Command::new(&self.program)
            .args(self.args(job))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| Error::Merge {
                part: job.part.clone(),
                reason: format!("failed to run {}: {}", self.program, e),
            });

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                self.remove_scratch_file(job);
                return Err(e);
            }
        };

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            debug!(part = %job.part, "stdout: {}", line);
        }
        for line in String::from_utf8_lossy(&output.stderr).lines() {
            warn!(part = %job.part, "stderr: {}", line);
        }
        self.remove_scratch_file(job);

        if output.status.success() {
            Ok(())
        } else {
            Err(Error::Merge {
                part: job.part.clone(),
                reason: format!("{} exited with {}", self.program, output.status),
            })
        }
    }
}

/// Terminal signal for one job.
#[derive(Debug)]
pub struct MergeOutcome {
    pub index: usize,
    pub part: String,
    pub result: Result<()>,
}

/// Parts grouped by merge result, in job order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub merged: Vec<String>,
    pub failed: Vec<String>,
}

impl MergeReport {
    pub fn total(&self) -> usize {
        self.merged.len() + self.failed.len()
    }

    pub fn all_merged(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Merge every job concurrently and return once all have finished.
///
/// `on_done` runs on the calling thread as each outcome arrives, in completion
/// order. A merger that panics counts as a failed merge.
pub fn run_merges<M, F>(merger: &M, jobs: &[MergeJob], mut on_done: F) -> MergeReport
where
    M: Merger + ?Sized,
    F: FnMut(&MergeOutcome),
{
    let (tx, rx) = unbounded::<MergeOutcome>();
    let mut outcomes: Vec<Option<bool>> = vec![None; jobs.len()];

    std::thread::scope(|scope| {
        for (index, job) in jobs.iter().enumerate() {
            let tx = tx.clone();
            scope.spawn(move || {
                let result = catch_unwind(AssertUnwindSafe(|| merger.merge(job))).unwrap_or_else(|_| {
                    Err(Error::Merge {
                        part: job.part.clone(),
                        reason: "merge worker panicked".to_string(),
                    })
                });
                let _ = tx.send(MergeOutcome {
                    index,
                    part: job.part.clone(),
                    result,
                });
            });
        }
        drop(tx);

        for _ in 0..jobs.len() {
            let Ok(outcome) = rx.recv() else {
                break;
            };
            match &outcome.result {
                Ok(()) => info!("Merged {}", outcome.part),
                Err(e) => warn!("{}", e),
            }
            outcomes[outcome.index] = Some(outcome.result.is_ok());
            on_done(&outcome);
        }
    });

    let mut report = MergeReport::default();
    for (job, outcome) in jobs.iter().zip(outcomes) {
        match outcome {
            Some(true) => report.merged.push(job.part.clone()),
            _ => report.failed.push(job.part.clone()),
        }
    }
    report
}
