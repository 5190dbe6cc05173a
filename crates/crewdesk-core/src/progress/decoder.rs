//! Line classifier for the job's output streams.
//!
//! A line is structured progress iff, once trimmed, it starts with
//! [`SENTINEL`]; the remainder must be a JSON object matching
//! [`ProgressRecord`]. Malformed payloads are noise and are dropped without
//! ever failing the job. Other non-blank lines are diagnostics and travel as
//! `task` records unless they mention `WARNING`.

use std::sync::OnceLock;

use regex::Regex;

use super::record::ProgressRecord;

/// Marks a line as carrying a structured progress payload.
pub const SENTINEL: &str = "PROGRESS:";

/// Diagnostic lines containing this token (any case) are dropped.
const NOISE_TOKEN: &str = "warning";

const LOG_EXCERPT_CHARS: usize = 200;

/// Classification of one output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    /// Sentinel-prefixed line. `None` when the payload was malformed or the
    /// record was suppressed after preamble stripping.
    Progress(Option<ProgressRecord>),
    /// Free text worth forwarding (already trimmed).
    Diagnostic(String),
    /// Blank or noise-filtered free text.
    Filtered,
}

pub fn classify_line(line: &str) -> LineClass {
    let trimmed = line.trim();

    if let Some(payload) = trimmed.strip_prefix(SENTINEL) {
        let payload = payload.trim();
        return match serde_json::from_str::<ProgressRecord>(payload) {
            Ok(record) => LineClass::Progress(normalize(record)),
            Err(e) => {
                tracing::debug!(
                    "[Decoder] Dropping malformed progress line ({}): {}",
                    e,
                    excerpt(payload, LOG_EXCERPT_CHARS)
                );
                LineClass::Progress(None)
            }
        };
    }

    if trimmed.is_empty() || trimmed.to_lowercase().contains(NOISE_TOKEN) {
        return LineClass::Filtered;
    }

    LineClass::Diagnostic(trimmed.to_string())
}

/// At most `max_chars` leading characters of `text`, cut on a char boundary.
fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Decode one line into the record that should be forwarded, if any.
pub fn decode_line(line: &str) -> Option<ProgressRecord> {
    match classify_line(line) {
        LineClass::Progress(record) => record,
        LineClass::Diagnostic(text) => Some(ProgressRecord::task(text)),
        LineClass::Filtered => None,
    }
}

/// Decode every newline-separated line in `chunk`, in order.
///
/// Stateless: a line cut off at the end of the chunk is decoded as-is. The
/// supervisor avoids that by reading whole lines before decoding.
pub fn decode_chunk(chunk: &str) -> Vec<ProgressRecord> {
    chunk.split('\n').filter_map(decode_line).collect()
}

/// Remove the agent framework's "thought, then final answer" boilerplate.
pub fn strip_reasoning_preamble(message: &str) -> String {
    preamble_patterns()
        .iter()
        .fold(message.to_string(), |text, re| re.replace_all(&text, "").into_owned())
}

fn preamble_patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"(?i)Thought:\s*I now can give a great answer\s*Final Answer:\s*")
                .expect("valid preamble pattern"),
            Regex::new(r"(?i)Thought:\s*I now can give a great answer\s*")
                .expect("valid preamble pattern"),
            Regex::new(r"(?i)Final Answer:\s*").expect("valid preamble pattern"),
        ]
    })
}

/// Apply per-kind rules to a record the job emitted.
///
/// Terminal kinds are reserved for the supervisor, so a job-side
/// `complete`/`error` is downgraded to a `task` carrying its message.
fn normalize(record: ProgressRecord) -> Option<ProgressRecord> {
    match record {
        ProgressRecord::Stream { agent, message } => {
            let stripped = strip_reasoning_preamble(message.as_deref().unwrap_or(""));
            if stripped.trim().is_empty() {
                None
            } else {
                Some(ProgressRecord::Stream {
                    agent,
                    message: Some(stripped),
                })
            }
        }
        ProgressRecord::Complete { message, .. } => Some(ProgressRecord::Task {
            agent: None,
            message,
        }),
        ProgressRecord::Error { message } => Some(ProgressRecord::Task {
            agent: None,
            message: Some(message),
        }),
        other => Some(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::record::RecordKind;

    #[test]
    fn test_progress_line_is_parsed() {
        let record = decode_line(r#"  PROGRESS: {"type":"agent","agent":"Writer","message":"Writer - author"}  "#)
            .unwrap();
        assert_eq!(record.kind(), RecordKind::Agent);
        assert_eq!(record.agent_name(), Some("Writer"));
    }

    #[test]
    fn test_malformed_progress_is_dropped_not_forwarded() {
        assert_eq!(classify_line("PROGRESS:{not json"), LineClass::Progress(None));
        assert_eq!(decode_line("PROGRESS:{\"type\":\"thinking\",\"message\":\"x\"}"), None);
        assert_eq!(decode_line("PROGRESS:"), None);
    }

    #[test]
    fn test_diagnostics_and_filters() {
        assert_eq!(
            decode_line("  Loading crew...  "),
            Some(ProgressRecord::task("Loading crew..."))
        );
        assert_eq!(decode_line("   "), None);
        assert_eq!(decode_line("UserWarning: deprecated"), None);
        assert_eq!(decode_line("WARNING: something"), None);
    }

    #[test]
    fn test_chunk_preserves_order_and_counts() {
        let chunk = concat!(
            "PROGRESS:{\"type\":\"agent\",\"agent\":\"A\"}\n",
            "noise one\n",
            "\n",
            "PROGRESS:{\"type\":\"stream\",\"agent\":\"A\",\"message\":\"hi\"}\n",
            "a WARNING line\n",
            "PROGRESS:{broken\n",
            "noise two\n",
            "PROGRESS:{\"type\":\"output\",\"agent\":\"A\"}",
        );
        let records = decode_chunk(chunk);
        let kinds: Vec<_> = records.iter().map(|r| r.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                RecordKind::Agent,
                RecordKind::Task,
                RecordKind::Stream,
                RecordKind::Task,
                RecordKind::Output,
            ]
        );
        assert_eq!(records[1].message(), Some("noise one"));
        assert_eq!(records[3].message(), Some("noise two"));
    }

    #[test]
    fn test_decode_chunk_is_idempotent() {
        let chunk = "PROGRESS:{\"type\":\"task\",\"message\":\"x\"}\nplain\n";
        assert_eq!(decode_chunk(chunk), decode_chunk(chunk));
    }

    #[test]
    fn test_stream_preamble_is_stripped() {
        let record = decode_line(
            r#"PROGRESS:{"type":"stream","agent":"A","message":"Thought: I now can give a great answer\nFinal Answer: The body"}"#,
        )
        .unwrap();
        assert_eq!(record.message(), Some("The body"));

        let record =
            decode_line(r#"PROGRESS:{"type":"stream","agent":"A","message":"final answer: text"}"#).unwrap();
        assert_eq!(record.message(), Some("text"));
    }

    #[test]
    fn test_stream_emptied_by_stripping_is_suppressed() {
        assert_eq!(
            classify_line(r#"PROGRESS:{"type":"stream","agent":"A","message":"Thought: I now can give a great answer  "}"#),
            LineClass::Progress(None)
        );
        assert_eq!(
            decode_line(r#"PROGRESS:{"type":"stream","agent":"A","message":"   "}"#),
            None
        );
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        let text = format!("{}中文", "a".repeat(199));
        assert_eq!(excerpt(&text, 200), format!("{}中", "a".repeat(199)));
        assert_eq!(excerpt("short", 200), "short");
        assert_eq!(excerpt("中文", 0), "");
    }

    #[test]
    fn test_malformed_multibyte_progress_under_debug_logging() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        let line = format!("PROGRESS:{{{}中文 broken", "a".repeat(198));
        tracing::subscriber::with_default(subscriber, || {
            assert_eq!(classify_line(&line), LineClass::Progress(None));
            assert_eq!(decode_line(&line), None);
        });
    }

    #[test]
    fn test_job_side_terminal_records_are_downgraded() {
        let record = decode_line(r#"PROGRESS:{"type":"error","message":"failed inside"}"#).unwrap();
        assert_eq!(record, ProgressRecord::task("failed inside"));
        assert!(!record.is_terminal());
    }
}
