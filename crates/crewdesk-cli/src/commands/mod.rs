//! CLI command implementations.
//!
//! Each submodule corresponds to a top-level CLI command and reuses the
//! crewdesk-core domain logic through `AppState`. Configuration commands act
//! as the local operator: they edit the data files directly, the same files
//! the server and the generation job read.

pub mod models;
pub mod provider;
pub mod run;
pub mod server;
pub mod workflow;

use std::path::Path;
use std::sync::Arc;

use crewdesk_core::auth::AdminSecret;
use crewdesk_core::config::{DataPaths, JobConfig};
use crewdesk_core::state::{AppState, AppStateInner};

/// Build an `AppState` over the data files under `data_dir`.
///
/// This mirrors `crewdesk_server::create_app_state` without the HTTP side.
pub fn init_state(data_dir: &Path) -> AppState {
    let paths = DataPaths::under(data_dir);
    Arc::new(AppStateInner::new(
        &paths,
        JobConfig::default(),
        AdminSecret::default(),
    ))
}

/// Pretty-print a serializable value to stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{}", text);
    Ok(())
}
