//! Incremental `text/event-stream` decoder for clients of the streaming
//! endpoint.
//!
//! Only `data` fields matter here; `event`, `id` and `retry` are ignored,
//! as are comment lines (the server's keep-alive pings).

#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: String,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; returns the `data` payload of every event completed
    /// by this chunk.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.pending.push_str(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=pos).collect();
            let line = line.trim_end_matches('\n').trim_end_matches('\r');

            if line.is_empty() {
                if !self.data.is_empty() {
                    events.push(self.data.join("\n"));
                    self.data.clear();
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            if field == "data" {
                self.data.push(value.to_string());
            }
        }
        events
    }

    /// Whether a partially received event is still buffered.
    pub fn has_partial(&self) -> bool {
        !self.data.is_empty() || !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_event() {
        let mut decoder = SseDecoder::new();
        assert_eq!(decoder.push("data: {\"type\":\"task\"}\n\n"), vec!["{\"type\":\"task\"}"]);
        assert!(!decoder.has_partial());
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push("data: {\"type\":").is_empty());
        assert!(decoder.has_partial());
        assert!(decoder.push("\"agent\"}\n").is_empty());
        assert_eq!(decoder.push("\n"), vec!["{\"type\":\"agent\"}"]);
    }

    #[test]
    fn test_comments_and_other_fields_are_ignored() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(": keep-alive\n\nevent: message\nid: 7\ndata: one\r\n\r\ndata:two\n\n");
        assert_eq!(events, vec!["one", "two"]);
    }

    #[test]
    fn test_multiline_data_is_joined() {
        let mut decoder = SseDecoder::new();
        assert_eq!(decoder.push("data: a\ndata: b\n\n"), vec!["a\nb"]);
    }
}
