//! Progress protocol - the line-oriented wire format the generation job
//! writes to its output streams, and the typed records relayed to clients.
//!
//! ```text
//! job stdout/stderr ──► decoder::classify_line ──► ProgressRecord ──► SSE `data:` frame
//!                                                                        │
//!                                          sse::SseDecoder (client) ◄───┘
//! ```

pub mod decoder;
pub mod record;
pub mod sse;

pub use decoder::{classify_line, decode_chunk, decode_line, strip_reasoning_preamble, LineClass, SENTINEL};
pub use record::{JobResult, ProgressRecord, RecordKind};
pub use sse::SseDecoder;
