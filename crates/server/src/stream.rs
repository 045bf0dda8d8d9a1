//! Periodic protocols push loop behind `/sse`
//!
//! One spawned task per connection. Each cycle it checks whether the peer is
//! still there, fetches the protocols listing, sends one frame and sleeps.
//! Disconnection is only noticed at the top of a cycle.

use std::sync::Arc;
use std::time::Duration;

use axum::response::sse::Event;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use llama_feed::DataSource;

/// Frames buffered between the loop and the connection
pub const FRAME_BUFFER: usize = 16;

/// One unit of push output
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Payload(Value),
    NoData,
    Error(String),
}

impl Frame {
    pub fn to_json(&self) -> Value {
        match self {
            Frame::Payload(v) => v.clone(),
            Frame::NoData => json!({ "status": "no data available" }),
            Frame::Error(message) => json!({ "error": message }),
        }
    }

    /// `data: <json>` event; axum terminates it with a blank line
    pub fn to_event(&self) -> Event {
        Event::default().data(self.to_json().to_string())
    }
}

/// Why a push loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Disconnected,
    Fault,
}

/// Returned by the push task once it has stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushSummary {
    pub frames: u64,
    pub reason: StopReason,
}

pub type FrameStream = ReceiverStream<Frame>;

/// Push loop over the protocols accessor
pub struct PushLoop {
    source: Arc<dyn DataSource>,
    interval: Duration,
    id: Uuid,
}

impl PushLoop {
    pub fn new(source: Arc<dyn DataSource>, interval: Duration) -> Self {
        Self {
            source,
            interval,
            id: Uuid::new_v4(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Start the loop. Dropping the returned stream stops it at the next cycle.
    pub fn spawn(self) -> (FrameStream, JoinHandle<PushSummary>) {
        let (tx, rx) = mpsc::channel(FRAME_BUFFER);
        let handle = tokio::spawn(self.run(tx));
        (ReceiverStream::new(rx), handle)
    }

    async fn run(self, tx: mpsc::Sender<Frame>) -> PushSummary {
        info!(stream_id = %self.id, "push loop started");
        let mut frames = 0u64;

        let reason = loop {
            if tx.is_closed() {
                break StopReason::Disconnected;
            }

            let frame = match self.source.protocols().await {
                Ok(Some(value)) if has_data(&value) => Frame::Payload(value),
                Ok(_) => Frame::NoData,
                Err(e) => {
                    warn!(stream_id = %self.id, error = %e, "push loop fault");
                    if tx.send(Frame::Error(e.to_string())).await.is_ok() {
                        frames += 1;
                    }
                    break StopReason::Fault;
                }
            };

            if tx.send(frame).await.is_err() {
                break StopReason::Disconnected;
            }
            frames += 1;
            debug!(stream_id = %self.id, frames, "frame sent");

            tokio::time::sleep(self.interval).await;
        };

        info!(stream_id = %self.id, frames, ?reason, "push loop stopped");
        PushSummary { frames, reason }
    }
}

/// Empty listings are reported the same way as an unreachable upstream
fn has_data(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}
