//! Runtime configuration shared by the server and the CLI.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Module the default launcher runs; see [`JobConfig`].
pub const DEFAULT_JOB_MODULE: &str = "crew.run";

/// Default wall-clock budget for one generation job.
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(300);

/// How the external generation job is launched.
///
/// The job is invoked as `program args… <topic> <workflow_id>`. Topic and
/// workflow id are appended as two discrete argv entries; nothing is ever
/// interpolated into a shell or script string.
///
/// The default runs `python3 -u -m crew.run`. The `crew` package only ships
/// `crew/main.py`, so the job directory needs a `crew/run.py` entry point
/// that reads the two arguments and prints the result:
///
/// ```text
/// import json, sys
/// from crew.main import run_workflow_with_progress
///
/// try:
///     result = run_workflow_with_progress(sys.argv[1], sys.argv[2])
///     print(json.dumps(result))
/// except Exception as e:
///     print(str(e), file=sys.stderr)
///     sys.exit(1)
/// ```
///
/// Any other launcher works as long as it accepts the same two trailing
/// arguments (`--job-program` / `--job-args` on the CLI).
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory for the job (the directory containing the `crew` package).
    pub working_dir: Option<PathBuf>,
    /// Overall wall-clock budget; the process is killed once it elapses.
    pub timeout: Duration,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: vec!["-u".to_string(), "-m".to_string(), DEFAULT_JOB_MODULE.to_string()],
            working_dir: None,
            timeout: DEFAULT_JOB_TIMEOUT,
        }
    }
}

impl JobConfig {
    /// Parse a whitespace-separated argument prefix (as passed through an
    /// environment variable) into discrete argv entries.
    pub fn split_args(raw: &str) -> Vec<String> {
        raw.split_whitespace().map(str::to_string).collect()
    }
}

/// Locations of the keyed-record files the console edits.
///
/// The layout matches what the external job reads, so both sides agree on
/// the same files.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub workflows_file: PathBuf,
    pub providers_file: PathBuf,
    pub workflow_models_file: PathBuf,
}

impl DataPaths {
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            workflows_file: root.join("public").join("workflows.json"),
            providers_file: root.join("config").join("llm-providers.json"),
            workflow_models_file: root.join("config").join("workflow-models.json"),
        }
    }
}

impl Default for DataPaths {
    fn default() -> Self {
        Self::under(".")
    }
}
