//! `crewdesk run` - Run a generation job and render its transcript.
//!
//! Records come either from an in-process supervisor or from a server's
//! `/api/run_crew_stream` endpoint. Both paths print records live as they
//! arrive and fold them into a `RunState` for the final summary.

use std::io::{self, Write};

use console::style;
use tokio_stream::StreamExt;

use crewdesk_core::config::JobConfig;
use crewdesk_core::job::{JobRequest, JobSupervisor};
use crewdesk_core::progress::{ProgressRecord, SseDecoder};
use crewdesk_core::transcript::{RunState, TranscriptStatus};

/// Run the job in this process.
pub async fn local(job: JobConfig, topic: &str, workflow_id: &str) -> Result<(), String> {
    let request = JobRequest::new(Some(topic), Some(workflow_id)).map_err(|e| e.to_string())?;
    let supervisor = JobSupervisor::new(job);

    println!(
        "{} {} {}",
        style("Running").bold(),
        style(&request.workflow_id).cyan(),
        style(format!("(\"{}\")", request.topic)).dim()
    );

    let (mut records, handle) = supervisor.start(request);
    let mut state = RunState::new();
    state.begin();
    let mut printer = LivePrinter::default();

    loop {
        tokio::select! {
            record = records.recv() => match record {
                Some(record) => {
                    printer.show(&record);
                    if state.apply(&record).is_break() {
                        break;
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                printer.end_stream();
                state.abort("Interrupted");
                break;
            }
        }
    }

    // Dropping the receiver cancels a job that is still running
    drop(records);
    if let Err(e) = handle.await {
        tracing::warn!("[Run] Job task failed: {}", e);
    }

    state.abort("Job ended without a result");
    finish(&state)
}

/// Stream the run from a crewdesk server.
pub async fn remote(server: &str, topic: &str, workflow_id: &str) -> Result<(), String> {
    let url = format!(
        "{}/api/run_crew_stream?topic={}&workflow_id={}",
        server.trim_end_matches('/'),
        urlencoding::encode(topic),
        urlencoding::encode(workflow_id)
    );
    println!("{} {}", style("Streaming from").bold(), style(server).cyan());

    let response = reqwest::Client::new()
        .get(&url)
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await
        .map_err(|e| format!("Failed to connect to {}: {}", server, e))?;

    let status = response.status();
    if !status.is_success() {
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        return Err(format!(
            "Server returned {}: {}",
            status,
            body["error"].as_str().unwrap_or("unknown error")
        ));
    }

    let mut state = RunState::new();
    state.begin();
    let mut printer = LivePrinter::default();
    let mut decoder = SseDecoder::new();
    let mut pending = Vec::new();
    let mut body = response.bytes_stream();

    'read: while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                printer.end_stream();
                state.abort(format!("Connection lost: {}", e));
                break;
            }
        };
        pending.extend_from_slice(&chunk);
        let text = take_utf8(&mut pending);

        for data in decoder.push(&text) {
            match serde_json::from_str::<ProgressRecord>(&data) {
                Ok(record) => {
                    printer.show(&record);
                    if state.apply(&record).is_break() {
                        break 'read;
                    }
                }
                Err(e) => tracing::debug!("[Run] Ignoring malformed event: {}", e),
            }
        }
    }

    state.abort("Connection closed before the run finished");
    finish(&state)
}

/// Split off the longest valid UTF-8 prefix of `buf`, leaving an
/// incomplete trailing sequence for the next chunk.
fn take_utf8(buf: &mut Vec<u8>) -> String {
    let valid = match std::str::from_utf8(&buf[..]) {
        Ok(s) => s.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        // Invalid bytes, not just a cut: decode lossily and move on
        Err(_) => buf.len(),
    };
    let rest = buf.split_off(valid);
    let text = String::from_utf8_lossy(&buf[..]).into_owned();
    *buf = rest;
    text
}

/// Prints records as they arrive.
#[derive(Default)]
struct LivePrinter {
    /// Agent whose stream text is mid-line.
    streaming: Option<String>,
}

impl LivePrinter {
    fn show(&mut self, record: &ProgressRecord) {
        match record {
            ProgressRecord::Task { message, .. } => {
                self.end_stream();
                if let Some(message) = message {
                    println!("{} {}", style("·").dim(), style(message).dim());
                }
            }
            ProgressRecord::Agent { agent, .. } => {
                self.end_stream();
                println!(
                    "\n{} {}",
                    style("▶").cyan().bold(),
                    style(agent.as_deref().unwrap_or("Unknown Agent")).bold()
                );
            }
            ProgressRecord::Stream { agent, message } => {
                if let Some(message) = message {
                    print!("{}", message);
                    io::stdout().flush().ok();
                    self.streaming = Some(agent.clone().unwrap_or_default());
                }
            }
            ProgressRecord::Output { agent, .. } => {
                self.end_stream();
                println!(
                    "{} {} finished",
                    style("✓").green(),
                    agent.as_deref().unwrap_or("agent")
                );
            }
            ProgressRecord::Complete { .. } | ProgressRecord::Error { .. } => self.end_stream(),
        }
    }

    fn end_stream(&mut self) {
        if self.streaming.take().is_some() {
            println!();
        }
    }
}

fn finish(state: &RunState) -> Result<(), String> {
    println!("\n{}", render_summary(state));

    if let Some(error) = &state.error {
        return Err(error.clone());
    }
    if let Some(result) = &state.result {
        println!("\n{}", style(&result.title).bold().underlined());
        if !result.summary.is_empty() {
            println!("\n{}", style(&result.summary).italic());
        }
        println!("\n{}", result.article);
    }
    Ok(())
}

/// One line per transcript entry.
fn render_summary(state: &RunState) -> String {
    if state.entries.is_empty() {
        return "No agent activity.".to_string();
    }
    state
        .entries
        .iter()
        .map(|entry| {
            let marker = match entry.status {
                TranscriptStatus::Completed => "✓",
                TranscriptStatus::Error => "✗",
                TranscriptStatus::Running => "…",
                TranscriptStatus::Waiting => " ",
            };
            format!(
                "{} {:<24} {:>9}  {} chars",
                marker,
                entry.agent,
                entry.status.as_str(),
                entry.content.chars().count()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
