use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use courier_core::metrics::prometheus::export_prometheus;
use courier_core::testing::RecordingTracer;
use courier_core::{BoxError, CallContext, Telemetry, TraceContext};
use courier_sqs::{AttributeCarrier, Publisher, SendMessageInput, SendMessageOutput, SqsApi};

/// Queue that stores every message and numbers them
#[derive(Default)]
struct InMemoryQueue {
    messages: Mutex<Vec<SendMessageInput>>,
}

#[async_trait]
impl SqsApi for InMemoryQueue {
    async fn send_message(
        &self,
        _ctx: &CallContext,
        input: &SendMessageInput,
    ) -> Result<SendMessageOutput, BoxError> {
        let mut messages = self.messages.lock().unwrap();
        messages.push(input.clone());
        Ok(SendMessageOutput {
            message_id: Some(format!("msg-{}", messages.len())),
            ..SendMessageOutput::default()
        })
    }
}

#[tokio::test]
async fn consumer_continues_the_producer_trace() {
    let tracer = RecordingTracer::new();
    let telemetry = Telemetry::with_tracer(Arc::new(tracer.clone()));
    let queue = Arc::new(InMemoryQueue::default());
    let publisher = Publisher::new(Some(queue.clone()), &telemetry).unwrap();

    let request = TraceContext::new();
    let ctx = CallContext::new().with_parent(request.clone());
    let id = publisher
        .publish(&ctx, SendMessageInput::new("https://sqs/orders", "{}"))
        .await
        .unwrap();
    assert_eq!(id, "msg-1");

    let mut received = queue.messages.lock().unwrap().remove(0);
    let consumer_ctx = CallContext::from_carrier(&AttributeCarrier::new(&mut received));
    let producer_span = tracer.single();

    assert_eq!(consumer_ctx.parent(), Some(&producer_span.context));
    assert_eq!(producer_span.parent, Some(request));
}

#[tokio::test]
async fn publishes_are_counted_per_queue() {
    let telemetry = Telemetry::with_tracer(Arc::new(RecordingTracer::new()));
    let publisher = Publisher::new(Some(Arc::new(InMemoryQueue::default())), &telemetry).unwrap();
    let ctx = CallContext::new();

    for queue in ["q1", "q1", "q2"] {
        publisher
            .publish(&ctx, SendMessageInput::new(queue, "x"))
            .await
            .unwrap();
    }

    let exported = export_prometheus(telemetry.registry());
    assert!(exported.contains(
        "client_sqs_publish_duration_seconds_count{queue=\"q1\",success=\"true\"} 2"
    ));
    assert!(exported.contains(
        "client_sqs_publish_duration_seconds_count{queue=\"q2\",success=\"true\"} 1"
    ));
}
