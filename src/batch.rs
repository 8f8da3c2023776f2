//! Batch processing of several chats.
//!
//! A job file is a JSON array with one object per chat:
//!
//! ```json
//! [
//!   {
//!     "staging_dir": "/tmp/export-alice",
//!     "recipient": "Alice",
//!     "output_dir": "/srv/chats",
//!     "group_chat": false,
//!     "chat_title": "Alice",
//!     "header": "templates/header.html"
//!   }
//! ]
//! ```
//!
//! Jobs are validated before anything runs. Malformed jobs end up in
//! [`BatchReport::rejected`] and never reach a worker. Valid jobs run on a
//! bounded thread pool; a job that fails is recorded in
//! [`BatchReport::failed`] and the others carry on.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::attachment::Transcoder;
use crate::config::{RenderContext, RenderOptions, Templates};
use crate::error::{ChatHtmlError, Result};
use crate::render::{RenderStats, render_chat};

/// Upper bound on the default worker count. Each worker may run a
/// transcoder process.
pub const MAX_DEFAULT_WORKERS: usize = 4;

/// One chat to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatJob {
    /// Directory holding the extracted `_chat.txt` and media files.
    pub staging_dir: PathBuf,
    pub recipient: String,
    pub output_dir: PathBuf,
    #[serde(flatten)]
    pub options: RenderOptions,
    /// Header template file (default: built-in).
    #[serde(default)]
    pub header: Option<PathBuf>,
    /// Footer template file (default: built-in).
    #[serde(default)]
    pub footer: Option<PathBuf>,
}

impl ChatJob {
    pub fn new(
        staging_dir: impl Into<PathBuf>,
        recipient: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            recipient: recipient.into(),
            output_dir: output_dir.into(),
            options: RenderOptions::default(),
            header: None,
            footer: None,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_templates(mut self, header: Option<PathBuf>, footer: Option<PathBuf>) -> Self {
        self.header = header;
        self.footer = footer;
        self
    }

    /// The context this job renders under.
    pub fn context(&self) -> RenderContext {
        RenderContext::new(&self.recipient, &self.output_dir, &self.staging_dir)
    }

    /// Path of the HTML file this job writes.
    pub fn html_path(&self) -> PathBuf {
        self.options.html_path(&self.context())
    }

    fn check(&self) -> std::result::Result<(), String> {
        if self.recipient.trim().is_empty() {
            return Err("recipient must not be empty".to_string());
        }
        if self.recipient.contains(['/', '\\']) || self.recipient == ".." {
            return Err(format!(
                "recipient {:?} cannot be used as a directory name",
                self.recipient
            ));
        }
        if let Some(name) = &self.options.html_file_name {
            if name.trim().is_empty() || name.contains(['/', '\\']) {
                return Err(format!("invalid html_file_name {name:?}"));
            }
        }
        Ok(())
    }
}

/// A job refused during validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedJob {
    /// Position in the job list.
    pub index: usize,
    /// The job as submitted.
    pub raw: Value,
    pub reason: String,
}

/// A job that was run and failed.
#[derive(Debug)]
pub struct FailedJob {
    pub index: usize,
    pub recipient: String,
    pub error: ChatHtmlError,
}

/// A job that rendered successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedJob {
    pub index: usize,
    pub recipient: String,
    pub html_path: PathBuf,
    pub stats: RenderStats,
}

/// Outcome of [`process_chats`].
#[derive(Debug, Default)]
pub struct BatchReport {
    pub completed: Vec<CompletedJob>,
    pub failed: Vec<FailedJob>,
    pub rejected: Vec<RejectedJob>,
}

impl BatchReport {
    /// `true` if every submitted job completed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.rejected.is_empty()
    }

    /// Stats summed over completed jobs.
    pub fn total_stats(&self) -> RenderStats {
        let mut total = RenderStats::default();
        for job in &self.completed {
            total.merge(&job.stats);
        }
        total
    }

    /// Turns an incomplete batch into [`ChatHtmlError::BatchIncomplete`].
    pub fn ensure_success(&self) -> Result<()> {
        if self.is_success() {
            return Ok(());
        }
        Err(ChatHtmlError::BatchIncomplete {
            failed: self.failed.len(),
            rejected: self.rejected.len(),
            total: self.completed.len() + self.failed.len() + self.rejected.len(),
        })
    }
}

/// Worker pool settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of chats rendered at once.
    pub workers: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        let cpus = std::thread::available_parallelism().map_or(1, |n| n.get());
        Self {
            workers: cpus.clamp(1, MAX_DEFAULT_WORKERS),
        }
    }
}

impl BatchConfig {
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }
}

/// Reads a job file. The top level must be a JSON array.
pub fn load_jobs(path: &Path) -> Result<Vec<Value>> {
    let content = fs::read_to_string(path)?;
    match serde_json::from_str(&content)? {
        Value::Array(items) => Ok(items),
        other => Err(ChatHtmlError::invalid_format(
            "job file",
            format!("expected a JSON array, found {}", json_kind(&other)),
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Splits raw jobs into valid jobs (with their index) and rejected ones.
///
/// A job is rejected when it is not an object, misses a required field,
/// has a field of the wrong type, names an unusable recipient, or would
/// write the same HTML file as an earlier job.
pub fn parse_jobs(raw: Vec<Value>) -> (Vec<(usize, ChatJob)>, Vec<RejectedJob>) {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    let mut outputs = HashSet::new();

    for (index, value) in raw.into_iter().enumerate() {
        let parsed = if value.is_object() {
            serde_json::from_value::<ChatJob>(value.clone()).map_err(|e| e.to_string())
        } else {
            Err(format!("expected an object, found {}", json_kind(&value)))
        };

        let checked = parsed.and_then(|job| {
            job.check()?;
            if outputs.insert(job.html_path()) {
                Ok(job)
            } else {
                Err(format!(
                    "output {} is already written by another job",
                    job.html_path().display()
                ))
            }
        });

        match checked {
            Ok(job) => accepted.push((index, job)),
            Err(reason) => {
                warn!(index, reason = %reason, "rejected job");
                rejected.push(RejectedJob {
                    index,
                    raw: value,
                    reason,
                });
            }
        }
    }

    (accepted, rejected)
}

/// Renders one job.
pub fn process_chat(job: &ChatJob, transcoder: &dyn Transcoder) -> Result<RenderStats> {
    let templates = Templates::load(job.header.as_deref(), job.footer.as_deref())?;
    render_chat(&job.context(), &job.options, &templates, transcoder)
}

/// Validates and renders a list of raw jobs.
pub fn process_chats(
    raw: Vec<Value>,
    config: &BatchConfig,
    transcoder: &dyn Transcoder,
) -> BatchReport {
    let (jobs, rejected) = parse_jobs(raw);
    info!(
        queued = jobs.len(),
        rejected = rejected.len(),
        workers = config.workers,
        "starting batch"
    );

    let run = |(_, job): &(usize, ChatJob)| process_chat(job, transcoder);

    let results: Vec<Result<RenderStats>> = match rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers.max(1))
        .thread_name(|i| format!("chathtml-{i}"))
        .build()
    {
        Ok(pool) => pool.install(|| jobs.par_iter().map(run).collect()),
        Err(e) => {
            warn!(error = %e, "failed to create thread pool, processing sequentially");
            jobs.iter().map(run).collect()
        }
    };

    let mut report = BatchReport {
        rejected,
        ..Default::default()
    };
    // Results keep the order of `jobs`
    for ((index, job), result) in jobs.into_iter().zip(results) {
        match result {
            Ok(stats) => report.completed.push(CompletedJob {
                index,
                recipient: job.recipient.clone(),
                html_path: job.html_path(),
                stats,
            }),
            Err(error) => {
                warn!(index, recipient = %job.recipient, error = %error, "chat failed");
                report.failed.push(FailedJob {
                    index,
                    recipient: job.recipient.clone(),
                    error,
                });
            }
        }
    }

    info!(
        completed = report.completed.len(),
        failed = report.failed.len(),
        rejected = report.rejected.len(),
        "batch finished"
    );
    report
}
