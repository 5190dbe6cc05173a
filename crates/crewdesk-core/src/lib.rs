//! crewdesk Core - transport-agnostic domain logic for the crewdesk console.
//!
//! This crate owns the progress-streaming relay (protocol decoder, job
//! supervisor, transcript reducer) and the configuration records that the
//! admin console edits. It has **no HTTP framework dependency** by default,
//! making it suitable for use in:
//!
//! - HTTP servers (via `crewdesk-server`)
//! - the `crewdesk` CLI (in-process runs and admin commands)
//!
//! # Feature Flags
//!
//! - `axum` - Enables `IntoResponse` impl on `ServerError` for use in axum handlers.

pub mod auth;
pub mod config;
pub mod error;
pub mod job;
pub mod models;
pub mod progress;
pub mod provider_check;
pub mod state;
pub mod store;
pub mod transcript;

// Convenience re-exports
pub use config::{DataPaths, JobConfig};
pub use error::ServerError;
pub use job::{JobError, JobRequest, JobSupervisor};
pub use progress::{JobResult, ProgressRecord};
pub use state::{AppState, AppStateInner};
pub use transcript::RunState;
