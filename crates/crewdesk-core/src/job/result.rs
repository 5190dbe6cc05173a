//! Final-result extraction from the job's primary output.

use serde_json::Value;

use crate::progress::JobResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedResult {
    Success(JobResult),
    /// The job reported `{"error": "..."}` instead of a result.
    Failure(String),
}

/// Find the first top-level JSON object in `text` that is either a job
/// result or an error report, tolerating log noise around it.
pub fn extract_result(text: &str) -> Option<ExtractedResult> {
    for (start, _) in text.match_indices('{') {
        let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        let Some(Ok(Value::Object(map))) = values.next() else {
            continue;
        };

        if let Some(error) = map.get("error").and_then(Value::as_str) {
            return Some(ExtractedResult::Failure(error.to_string()));
        }
        if let Ok(result) = serde_json::from_value::<JobResult>(Value::Object(map)) {
            return Some(ExtractedResult::Success(result));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(title: &str, article: &str, summary: &str) -> JobResult {
        JobResult {
            title: title.to_string(),
            article: article.to_string(),
            summary: summary.to_string(),
        }
    }

    #[test]
    fn test_plain_object() {
        assert_eq!(
            extract_result(r#"{"title":"T","article":"A","summary":"S"}"#),
            Some(ExtractedResult::Success(result("T", "A", "S")))
        );
    }

    #[test]
    fn test_object_after_log_noise() {
        let text = "Crew started\n[agent] working {not json}\n{\"title\":\"T\",\"article\":\"x } y\",\"summary\":\"S\"}\ntrailing";
        assert_eq!(
            extract_result(text),
            Some(ExtractedResult::Success(result("T", "x } y", "S")))
        );
    }

    #[test]
    fn test_pretty_printed_object() {
        let text = "{\n  \"title\": \"T\",\n  \"article\": \"A\",\n  \"summary\": \"S\"\n}\n";
        assert_eq!(
            extract_result(text),
            Some(ExtractedResult::Success(result("T", "A", "S")))
        );
    }

    #[test]
    fn test_error_report() {
        assert_eq!(
            extract_result(r#"{"error":"Workflow 'x' not found"}"#),
            Some(ExtractedResult::Failure("Workflow 'x' not found".to_string()))
        );
    }

    #[test]
    fn test_unrelated_objects_are_skipped() {
        assert_eq!(extract_result(r#"{"step":1} done"#), None);
        assert_eq!(extract_result("no json here"), None);
        assert_eq!(extract_result(""), None);
    }
}
