//! JobSupervisor - runs one external generation job and relays its progress.
//!
//! Structure of one run:
//!   1. spawn `program args… <topic> <workflow_id>` with both output pipes captured
//!   2. one reader task per pipe pushes whole lines into a shared channel
//!   3. the supervising loop decodes each line and forwards records to the sink
//!      in arrival order, while watching the deadline and the sink's liveness
//!   4. after both pipes close, the exit status selects the terminal record
//!
//! A dropped sink receiver (client gone) or an elapsed deadline kills the
//! process and reaps it before returning.

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{sleep_until, Instant};
use uuid::Uuid;

use super::result::{extract_result, ExtractedResult};
use super::{JobError, JobRequest};
use crate::config::JobConfig;
use crate::progress::{classify_line, JobResult, LineClass, ProgressRecord};

/// Capacity of the record sink handed out by [`JobSupervisor::start`].
pub const RECORD_BUFFER: usize = 64;

const LINE_BUFFER: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Stdout,
    Stderr,
}

impl Channel {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

/// Launches generation jobs. Cheap to clone; holds no per-run state.
#[derive(Debug, Clone)]
pub struct JobSupervisor {
    config: Arc<JobConfig>,
}

impl JobSupervisor {
    pub fn new(config: JobConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Start a run on a background task and return its record stream.
    ///
    /// The stream ends right after the terminal record. Dropping the
    /// receiver cancels the run.
    pub fn start(
        &self,
        request: JobRequest,
    ) -> (
        mpsc::Receiver<ProgressRecord>,
        JoinHandle<Result<JobResult, JobError>>,
    ) {
        let (tx, rx) = mpsc::channel::<ProgressRecord>(RECORD_BUFFER);
        let supervisor = self.clone();
        let handle = tokio::spawn(async move { supervisor.run(request, tx).await });
        (rx, handle)
    }

    /// Run one job to its end, forwarding every record to `sink`.
    ///
    /// Exactly one terminal record is sent unless the sink was closed first.
    pub async fn run(
        &self,
        request: JobRequest,
        sink: mpsc::Sender<ProgressRecord>,
    ) -> Result<JobResult, JobError> {
        let run_id = Uuid::new_v4();
        let deadline = Instant::now() + self.config.timeout;

        tracing::info!(
            "[JobSupervisor:{}] Starting workflow '{}' (topic_len={}, budget={}s)",
            run_id,
            request.workflow_id,
            request.topic.len(),
            self.config.timeout.as_secs()
        );

        let outcome = self.supervise(&request, &sink, deadline, run_id).await;

        let terminal = match &outcome {
            Ok(result) => Some(ProgressRecord::complete(result.clone())),
            Err(JobError::ClientDisconnect) => None,
            Err(e) => Some(ProgressRecord::error(e.to_string())),
        };

        match &outcome {
            Ok(_) => tracing::info!("[JobSupervisor:{}] Completed", run_id),
            Err(JobError::ClientDisconnect) => {
                tracing::info!("[JobSupervisor:{}] Client disconnected; job cancelled", run_id)
            }
            Err(e) => tracing::warn!("[JobSupervisor:{}] Failed: {}", run_id, e),
        }

        // A slow reader still gets the terminal record; only a dropped
        // receiver makes the send fail.
        if let Some(record) = terminal {
            if sink.send(record).await.is_err() {
                tracing::debug!("[JobSupervisor:{}] Terminal record not delivered", run_id);
            }
        }

        outcome
    }

    /// Run a job without a listener and return only its final outcome.
    pub async fn run_to_completion(&self, request: JobRequest) -> Result<JobResult, JobError> {
        let (tx, mut rx) = mpsc::channel::<ProgressRecord>(RECORD_BUFFER);
        let drain = async move {
            while let Some(record) = rx.recv().await {
                tracing::debug!("[JobSupervisor] {} record", record.kind().as_str());
            }
        };
        let (outcome, ()) = tokio::join!(self.run(request, tx), drain);
        outcome
    }

    async fn supervise(
        &self,
        request: &JobRequest,
        sink: &mpsc::Sender<ProgressRecord>,
        deadline: Instant,
        run_id: Uuid,
    ) -> Result<JobResult, JobError> {
        emit(
            sink,
            ProgressRecord::task(format!("Loading workflow '{}'...", request.workflow_id)),
            deadline,
            self.config.timeout,
        )
        .await?;

        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.args)
            .arg(&request.topic)
            .arg(&request.workflow_id)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| {
            JobError::SpawnFailure(format!(
                "Failed to spawn '{}': {}. Is it installed and in PATH?",
                self.config.program, e
            ))
        })?;

        tracing::debug!(
            "[JobSupervisor:{}] Spawned pid={:?}",
            run_id,
            child.id()
        );

        let (line_tx, mut line_rx) = mpsc::channel::<(Channel, String)>(LINE_BUFFER);
        let mut readers = JoinSet::new();
        if let Some(stdout) = child.stdout.take() {
            readers.spawn(pump_lines(stdout, Channel::Stdout, line_tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.spawn(pump_lines(stderr, Channel::Stderr, line_tx.clone()));
        }
        drop(line_tx);

        // Non-progress text per channel: the primary one holds the result,
        // the secondary one becomes the failure message.
        let mut primary = String::new();
        let mut secondary = String::new();

        let drained: Result<(), JobError> = loop {
            tokio::select! {
                _ = sink.closed() => break Err(JobError::ClientDisconnect),
                _ = sleep_until(deadline) => break Err(JobError::Timeout(self.config.timeout)),
                line = line_rx.recv() => {
                    let Some((channel, text)) = line else {
                        break Ok(());
                    };
                    let buffer = match channel {
                        Channel::Stdout => &mut primary,
                        Channel::Stderr => &mut secondary,
                    };
                    let record = match classify_line(&text) {
                        LineClass::Progress(record) => record,
                        LineClass::Diagnostic(diagnostic) => {
                            tracing::trace!("[JobSupervisor:{} {}] {}", run_id, channel.as_str(), diagnostic);
                            buffer.push_str(&text);
                            buffer.push('\n');
                            Some(ProgressRecord::task(diagnostic))
                        }
                        LineClass::Filtered => {
                            buffer.push_str(&text);
                            buffer.push('\n');
                            None
                        }
                    };
                    if let Some(record) = record {
                        if let Err(e) = emit(sink, record, deadline, self.config.timeout).await {
                            break Err(e);
                        }
                    }
                }
            }
        };

        let exited: Result<ExitStatus, JobError> = match drained {
            Ok(()) => tokio::select! {
                _ = sink.closed() => Err(JobError::ClientDisconnect),
                _ = sleep_until(deadline) => Err(JobError::Timeout(self.config.timeout)),
                status = child.wait() => status.map_err(|e| {
                    JobError::RuntimeFailure(format!("Failed to wait for job: {}", e))
                }),
            },
            Err(e) => Err(e),
        };

        let status = match exited {
            Ok(status) => status,
            Err(e) => {
                terminate(&mut child, run_id).await;
                readers.abort_all();
                return Err(e);
            }
        };

        tracing::info!("[JobSupervisor:{}] Job exited: {}", run_id, status);

        if status.success() {
            match extract_result(&primary) {
                Some(ExtractedResult::Success(result)) => Ok(result),
                Some(ExtractedResult::Failure(message)) => Err(JobError::RuntimeFailure(message)),
                None => Err(JobError::ResultParse),
            }
        } else {
            let message = secondary.trim();
            if message.is_empty() {
                Err(JobError::RuntimeFailure(format!("Job failed ({})", status)))
            } else {
                Err(JobError::RuntimeFailure(message.to_string()))
            }
        }
    }
}

/// Forward one record, giving up when the client is gone or the budget runs out.
async fn emit(
    sink: &mpsc::Sender<ProgressRecord>,
    record: ProgressRecord,
    deadline: Instant,
    budget: Duration,
) -> Result<(), JobError> {
    tokio::select! {
        sent = sink.send(record) => sent.map_err(|_| JobError::ClientDisconnect),
        _ = sleep_until(deadline) => Err(JobError::Timeout(budget)),
    }
}

/// Kill the job and reap it so no zombie or orphan is left behind.
async fn terminate(child: &mut Child, run_id: Uuid) {
    let pid = child.id();
    match child.kill().await {
        Ok(()) => tracing::info!("[JobSupervisor:{}] Killed job pid={:?}", run_id, pid),
        Err(e) => tracing::debug!("[JobSupervisor:{}] Kill failed: {}", run_id, e),
    }
}

/// Read whole lines (lossy UTF-8) from one pipe until EOF.
async fn pump_lines<R>(reader: R, channel: Channel, tx: mpsc::Sender<(Channel, String)>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches('\n').trim_end_matches('\r').to_string();
                if tx.send((channel, line)).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::debug!("[JobSupervisor] {} read error: {}", channel.as_str(), e);
                break;
            }
        }
    }
}
