//! Generation API
//!
//! GET  /api/run_crew_stream?topic=&workflow_id= - run a job, streaming progress as SSE
//! POST /api/run_crew                             - run a job, return only the final result
//!
//! Each request owns one job. The SSE body is fed straight from the
//! supervisor's record channel, so the stream ends right after the terminal
//! record, and a client that goes away drops the receiver, which cancels
//! the job.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::header,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use crewdesk_core::error::ServerError;
use crewdesk_core::job::JobRequest;
use crewdesk_core::progress::{JobResult, ProgressRecord};
use crewdesk_core::state::AppState;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/run_crew_stream", get(run_crew_stream))
        .route("/api/run_crew", post(run_crew))
}

#[derive(Debug, Deserialize)]
struct RunParams {
    topic: Option<String>,
    workflow_id: Option<String>,
}

/// One SSE `data:` frame per record.
fn record_event(record: ProgressRecord) -> Result<Event, Infallible> {
    Ok(Event::default().data(record.to_json()))
}

async fn run_crew_stream(
    State(state): State<AppState>,
    Query(params): Query<RunParams>,
) -> Result<impl IntoResponse, ServerError> {
    let request = JobRequest::new(params.topic.as_deref(), params.workflow_id.as_deref())?;

    tracing::info!(
        "[RunCrew] Streaming run for workflow '{}'",
        request.workflow_id
    );

    let (records, _job) = state.supervisor.start(request);
    let stream = ReceiverStream::new(records).map(record_event);

    let sse = Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL));
    Ok((
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        sse,
    ))
}

#[derive(Debug, Deserialize)]
struct RunBody {
    topic: Option<String>,
    workflow_id: Option<String>,
}

async fn run_crew(
    State(state): State<AppState>,
    Json(body): Json<RunBody>,
) -> Result<Json<JobResult>, ServerError> {
    let request = JobRequest::new(body.topic.as_deref(), body.workflow_id.as_deref())?;
    tracing::info!("[RunCrew] Synchronous run for workflow '{}'", request.workflow_id);

    let result = state.supervisor.run_to_completion(request).await?;
    Ok(Json(result))
}
