//! Headless mode runner - request loop without a web front end

use super::{RequestEnvelope, SessionTable};
use crate::models::{ClientContext, RelayRequest, RelayResponse};
use crate::services::{RelayService, handle_request};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

/// Serve NDJSON requests from `input` until it closes, writing one response
/// line per request to `output`.
///
/// Returns the number of requests answered.
pub async fn run_headless<R, W>(
    service: Arc<RelayService>,
    input: R,
    mut output: W,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("Relay starting in HEADLESS mode");

    let mut sessions = SessionTable::new();
    let mut lines = input.lines();
    let mut answered = 0;

    while let Some(line) = lines.next_line().await.context("Failed to read request")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<RequestEnvelope>(line) {
            Ok(envelope) => serve(&service, &mut sessions, envelope).await?,
            Err(e) => {
                warn!("Malformed request line: {}", e);
                RelayResponse::failed(format!("Invalid request: {}", e))
            }
        };

        let mut json = serde_json::to_string(&response).context("Failed to encode response")?;
        json.push('\n');
        output
            .write_all(json.as_bytes())
            .await
            .context("Failed to write response")?;
        output.flush().await.context("Failed to flush response")?;
        answered += 1;
    }

    info!(
        "Input closed after {} requests, {} authenticated sessions",
        answered,
        sessions.len()
    );
    Ok(answered)
}

async fn serve(
    service: &Arc<RelayService>,
    sessions: &mut SessionTable,
    envelope: RequestEnvelope,
) -> Result<RelayResponse> {
    let key = envelope.session_key().to_string();
    let is_auth = matches!(envelope.request, RelayRequest::Auth { .. });
    let client = ClientContext::new(envelope.client, sessions.is_authenticated(&key));

    // Injection calls block on the host; keep them off the async workers
    let service = Arc::clone(service);
    let request = envelope.request;
    let response = tokio::task::spawn_blocking(move || handle_request(&service, &client, request))
        .await
        .context("Request handler panicked")?;

    if is_auth && response.authenticated == Some(true) {
        sessions.authenticate(&key);
    }
    Ok(response)
}
