//! JSON-lines host loop: one request per input line, one result per output line.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use loregraph_core::LoreError;
use loregraph_store::GraphStore;

use crate::envelope::{ErrorEnvelope, ToolRequest, ToolResult};
use crate::registry::ToolRegistry;

/// Operation name reported for lines that are not a valid request.
const REQUEST_OPERATION: &str = "request";

/// Answer requests from `input` until it is exhausted. Returns the number of
/// requests handled; blank lines are skipped.
pub async fn serve_lines<R, W>(
    registry: &ToolRegistry,
    store: &GraphStore,
    input: R,
    mut output: W,
) -> io::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut handled = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let result = handle_line(registry, store, line).await;
        let mut encoded = serde_json::to_string(&result).map_err(io::Error::other)?;
        encoded.push('\n');
        output.write_all(encoded.as_bytes()).await?;
        output.flush().await?;
        handled += 1;
    }

    tracing::info!(handled, "Input closed");
    Ok(handled)
}

/// Decode one request line and dispatch it.
pub async fn handle_line(registry: &ToolRegistry, store: &GraphStore, line: &str) -> ToolResult {
    match serde_json::from_str::<ToolRequest>(line) {
        Ok(request) => {
            registry
                .dispatch(&request.name, &request.arguments, store)
                .await
        }
        Err(e) => {
            let err = LoreError::validation(REQUEST_OPERATION, e.to_string());
            ToolResult::Error(ErrorEnvelope::from_error(REQUEST_OPERATION, &err))
        }
    }
}
