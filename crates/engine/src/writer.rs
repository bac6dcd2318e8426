//! The Response Writer: converts agent output events into broker messages
//! in either streaming or batched mode. Modeled as a trait (the "writer
//! polymorphism" design note) so the agent is coupled to it only through
//! `send`/`end`/`set_session_id`, and tests can substitute an in-memory
//! recorder for a live broker.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use bridge_broker::Publisher;
use bridge_wire::{ResponseContext, ResponseEvent};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::EngineError;

#[async_trait]
pub trait ResponseWriter: Send + Sync {
    /// Consumes one raw agent output event.
    async fn send(&self, event: Value) -> Result<(), EngineError>;

    /// Publishes the terminal `complete` event, carrying elapsed wall time
    /// since construction.
    async fn end(&self) -> Result<(), EngineError>;

    /// Updates the session id attached to subsequent events. Never
    /// observed to be called by the reference agent, but kept for forward
    /// compatibility.
    async fn set_session_id(&self, session_id: String);
}

struct WriterState {
    session_id: String,
    buffer: Vec<Value>,
}

/// Publishes through a live [`Publisher`] onto the configured response
/// topic.
pub struct MqttResponseWriter {
    publisher: Arc<dyn Publisher>,
    topic: String,
    source_device: String,
    streaming: bool,
    start: Instant,
    state: Mutex<WriterState>,
}

impl MqttResponseWriter {
    pub fn new(
        publisher: Arc<dyn Publisher>,
        topic: String,
        session_id: String,
        source_device: String,
        streaming: bool,
    ) -> Self {
        Self {
            publisher,
            topic,
            source_device,
            streaming,
            start: Instant::now(),
            state: Mutex::new(WriterState { session_id, buffer: Vec::new() }),
        }
    }

    async fn context(&self) -> ResponseContext {
        let state = self.state.lock().await;
        ResponseContext {
            session_id: state.session_id.clone(),
            source_device: self.source_device.clone(),
            timestamp: now_ms(),
        }
    }

    async fn publish(&self, event: &ResponseEvent) -> Result<(), EngineError> {
        let payload = serde_json::to_vec(event)?;
        self.publisher.publish(&self.topic, payload, false).await?;
        Ok(())
    }
}

#[async_trait]
impl ResponseWriter for MqttResponseWriter {
    async fn send(&self, event: Value) -> Result<(), EngineError> {
        if self.streaming {
            if let Some(text) = final_result_text(&event) {
                let ctx = self.context().await;
                self.publish(&ResponseEvent::Answer { text, ctx }).await?;
            }
            let ctx = self.context().await;
            self.publish(&ResponseEvent::Chunk { content: event, ctx }).await?;
        } else {
            self.state.lock().await.buffer.push(event);
        }
        Ok(())
    }

    async fn end(&self) -> Result<(), EngineError> {
        let duration_ms = self.start.elapsed().as_millis() as u64;
        let ctx = self.context().await;
        if self.streaming {
            self.publish(&ResponseEvent::Complete { content: None, duration_ms, ctx }).await?;
        } else {
            let content = std::mem::take(&mut self.state.lock().await.buffer);
            self.publish(&ResponseEvent::Complete {
                content: Some(Value::Array(content)),
                duration_ms,
                ctx,
            })
            .await?;
        }
        Ok(())
    }

    async fn set_session_id(&self, session_id: String) {
        self.state.lock().await.session_id = session_id;
    }
}

/// Recognizes the agent's final-result shape: `data.type == "result"` with
/// a non-empty `data.result` string, the voice-synthesizer shortcut.
fn final_result_text(event: &Value) -> Option<String> {
    let data = event.get("data")?;
    if data.get("type")?.as_str()? != "result" {
        return None;
    }
    let result = data.get("result")?.as_str()?;
    if result.is_empty() {
        return None;
    }
    Some(result.to_string())
}

fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;

    /// Records every published [`ResponseEvent`] in order, for assertions
    /// in tests that don't need a live broker.
    pub struct RecordingWriter {
        streaming: bool,
        start: Instant,
        state: Mutex<RecordingState>,
    }

    #[derive(Default)]
    struct RecordingState {
        session_id: String,
        buffer: Vec<Value>,
        published: Vec<Value>,
    }

    impl RecordingWriter {
        pub fn new(session_id: impl Into<String>, streaming: bool) -> Self {
            Self {
                streaming,
                start: Instant::now(),
                state: Mutex::new(RecordingState {
                    session_id: session_id.into(),
                    buffer: Vec::new(),
                    published: Vec::new(),
                }),
            }
        }

        pub async fn published(&self) -> Vec<Value> {
            self.state.lock().await.published.clone()
        }
    }

    #[async_trait]
    impl ResponseWriter for RecordingWriter {
        async fn send(&self, event: Value) -> Result<(), EngineError> {
            let mut state = self.state.lock().await;
            if self.streaming {
                if let Some(text) = final_result_text(&event) {
                    state.published.push(serde_json::json!({"type": "answer", "text": text}));
                }
                state.published.push(serde_json::json!({"type": "chunk", "content": event}));
            } else {
                state.buffer.push(event);
            }
            Ok(())
        }

        async fn end(&self) -> Result<(), EngineError> {
            let duration_ms = self.start.elapsed().as_millis() as u64;
            let mut state = self.state.lock().await;
            if self.streaming {
                state
                    .published
                    .push(serde_json::json!({"type": "complete", "duration_ms": duration_ms}));
            } else {
                let content = std::mem::take(&mut state.buffer);
                state.published.push(serde_json::json!({
                    "type": "complete",
                    "content": content,
                    "duration_ms": duration_ms,
                }));
            }
            Ok(())
        }

        async fn set_session_id(&self, session_id: String) {
            self.state.lock().await.session_id = session_id;
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::RecordingWriter;

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;
