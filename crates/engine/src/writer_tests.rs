use super::*;
use bridge_broker::FakePublisher;
use serde_json::json;

fn decode(call: &bridge_broker::publisher::fake::PublishCall) -> Value {
    serde_json::from_slice(&call.payload).unwrap()
}

#[tokio::test]
async fn batched_mode_buffers_until_end_and_publishes_one_complete() {
    let publisher = Arc::new(FakePublisher::new());
    let writer = MqttResponseWriter::new(
        publisher.clone(),
        "claude/home/response".to_string(),
        "s-1".to_string(),
        "t".to_string(),
        false,
    );

    writer.send(json!({"data": {"type": "result", "result": "4"}})).await.unwrap();
    writer.end().await.unwrap();

    let calls = publisher.calls().await;
    assert_eq!(calls.len(), 1);
    let event = decode(&calls[0]);
    assert_eq!(event["type"], "complete");
    assert_eq!(event["content"][0]["data"]["result"], "4");
    assert!(event["duration_ms"].as_u64().unwrap() < u64::MAX);
}

#[tokio::test]
async fn streaming_mode_publishes_answer_before_chunk_then_a_contentless_complete() {
    let publisher = Arc::new(FakePublisher::new());
    let writer = MqttResponseWriter::new(
        publisher.clone(),
        "claude/home/response".to_string(),
        "s-1".to_string(),
        "t".to_string(),
        true,
    );

    writer.send(json!({"data": {"type": "result", "result": "4"}})).await.unwrap();
    writer.end().await.unwrap();

    let calls = publisher.calls().await;
    assert_eq!(calls.len(), 3);
    assert_eq!(decode(&calls[0])["type"], "answer");
    assert_eq!(decode(&calls[0])["text"], "4");
    assert_eq!(decode(&calls[1])["type"], "chunk");
    assert_eq!(decode(&calls[2])["type"], "complete");
    assert!(decode(&calls[2]).get("content").is_none());
}

#[tokio::test]
async fn streaming_mode_skips_answer_for_non_result_events() {
    let publisher = Arc::new(FakePublisher::new());
    let writer = MqttResponseWriter::new(
        publisher.clone(),
        "claude/home/response".to_string(),
        "s-1".to_string(),
        "t".to_string(),
        true,
    );

    writer.send(json!({"data": {"type": "progress"}})).await.unwrap();
    writer.end().await.unwrap();

    let calls = publisher.calls().await;
    assert_eq!(calls.len(), 2);
    assert_eq!(decode(&calls[0])["type"], "chunk");
    assert_eq!(decode(&calls[1])["type"], "complete");
}

#[tokio::test]
async fn set_session_id_affects_subsequent_events_only() {
    let publisher = Arc::new(FakePublisher::new());
    let writer = MqttResponseWriter::new(
        publisher.clone(),
        "claude/home/response".to_string(),
        "s-1".to_string(),
        "t".to_string(),
        true,
    );

    writer.send(json!({"data": {"type": "progress"}})).await.unwrap();
    writer.set_session_id("s-2".to_string()).await;
    writer.end().await.unwrap();

    let calls = publisher.calls().await;
    assert_eq!(decode(&calls[0])["session_id"], "s-1");
    assert_eq!(decode(&calls[1])["session_id"], "s-2");
}
