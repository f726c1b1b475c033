//! Server-sent event decoding for the completion stream.

use futures::stream::{self, BoxStream, StreamExt};
use reqwest::Response;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{DskError, Result};
use crate::models::StreamEvent;

const DATA_PREFIX: &[u8] = b"data: ";

/// Lazy sequence of events from one completion call.
///
/// Dropping it closes the underlying connection.
pub type EventStream = BoxStream<'static, Result<StreamEvent>>;

#[derive(Debug, Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    /// Some deployments report the finish reason next to `choices`
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

/// Decode one line of the event stream.
///
/// Returns `Ok(None)` for blank lines, comments, and any line that is not a
/// `data:` frame carrying a choice delta. A `data:` frame whose payload is not
/// valid JSON is an error.
pub fn decode_line(line: &[u8]) -> Result<Option<StreamEvent>> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Ok(None);
    };

    let chunk: ChunkPayload = serde_json::from_slice(payload).map_err(|e| {
        tracing::error!(
            "Undecodable stream chunk: {}",
            String::from_utf8_lossy(&payload[..payload.len().min(200)])
        );
        DskError::Decode(e.to_string())
    })?;

    let ChunkPayload {
        choices,
        finish_reason,
    } = chunk;
    let Some(choice) = choices.into_iter().next() else {
        return Ok(None);
    };
    let Some(delta) = choice.delta else {
        return Ok(None);
    };

    Ok(Some(StreamEvent {
        content: delta.content.unwrap_or_default(),
        kind: delta.kind.unwrap_or_default(),
        stop: choice.finish_reason.or(finish_reason).as_deref() == Some("stop"),
    }))
}

/// Splits a streaming body into lines and decodes them on demand.
struct LineReader {
    response: Response,
    buffer: Vec<u8>,
    idle_timeout: Option<Duration>,
    eof: bool,
    stopped: bool,
}

impl LineReader {
    fn take_line(&mut self) -> Option<Vec<u8>> {
        if let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            return Some(line);
        }
        if self.eof && !self.buffer.is_empty() {
            return Some(std::mem::take(&mut self.buffer));
        }
        None
    }

    async fn fill(&mut self) -> Result<()> {
        let chunk = match self.idle_timeout {
            Some(limit) => tokio::time::timeout(limit, self.response.chunk())
                .await
                .map_err(|_| DskError::StreamTimeout(limit))??,
            None => self.response.chunk().await?,
        };
        match chunk {
            Some(bytes) => self.buffer.extend_from_slice(&bytes),
            None => self.eof = true,
        }
        Ok(())
    }

    async fn next_event(&mut self) -> Result<Option<StreamEvent>> {
        if self.stopped {
            return Ok(None);
        }
        loop {
            while let Some(line) = self.take_line() {
                if let Some(event) = decode_line(&line)? {
                    self.stopped = event.stop;
                    return Ok(Some(event));
                }
            }
            if self.eof {
                return Err(DskError::IncompleteStream);
            }
            self.fill().await?;
        }
    }
}

/// Turn a successful streaming response into an [`EventStream`].
///
/// The stream ends after the first event with `stop == true`. A decode error,
/// transport error, or premature end of body is yielded once and ends it.
pub fn event_stream(response: Response, idle_timeout: Option<Duration>) -> EventStream {
    let reader = LineReader {
        response,
        buffer: Vec::new(),
        idle_timeout,
        eof: false,
        stopped: false,
    };

    stream::unfold(Some(reader), |reader| async move {
        let mut reader = reader?;
        match reader.next_event().await {
            Ok(Some(event)) => Some((Ok(event), Some(reader))),
            Ok(None) => None,
            Err(e) => Some((Err(e), None)),
        }
    })
    .boxed()
}
