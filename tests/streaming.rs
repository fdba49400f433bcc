//! Streaming exchange: framing, termination, failures and cancellation.

mod support;

use std::collections::HashMap;

use futures::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;

use coach_chat::transport::TransportError;
use coach_chat::{collect_reply, ChatStream, ChatTurn, Error, StreamPhase, TurnRole};
use support::{
    client_with, client_with_credentials, delta, LockedCredentialStore, Scripted,
    ScriptedTransport, MESSAGE_STOP, MODEL,
};

async fn drain(mut stream: ChatStream) -> (Vec<String>, Vec<Error>, StreamPhase) {
    let mut chunks = Vec::new();
    let mut errors = Vec::new();
    while let Some(item) = stream.next().await {
        match item {
            Ok(c) => chunks.push(c),
            Err(e) => errors.push(e),
        }
    }
    let phase = stream.phase();
    (chunks, errors, phase)
}

fn turns() -> Vec<ChatTurn> {
    vec![ChatTurn::user("How long should I rest between sets?")]
}

#[tokio::test]
async fn yields_text_deltas_in_order() {
    let transport = ScriptedTransport::new(vec![Scripted::sse(&[
        "event: message_start",
        r#"data: {"type":"message_start","message":{"id":"msg_1"}}"#,
        "",
        &delta("About "),
        &delta("90 seconds."),
        r#"data: {"type":"message_delta","delta":{"stop_reason":"end_turn"}}"#,
        MESSAGE_STOP,
    ])]);
    let client = client_with(transport.clone(), Some("sk-test"));

    let (chunks, errors, phase) =
        drain(client.stream_conversation(&turns(), None, MODEL, 128)).await;
    assert_eq!(chunks, ["About ", "90 seconds."]);
    assert!(errors.is_empty());
    assert_eq!(phase, StreamPhase::Completed);

    let sent = &transport.requests()[0];
    assert_eq!(sent.header("accept"), Some("text/event-stream"));
    let body: serde_json::Value = serde_json::from_slice(&sent.body).unwrap();
    assert_eq!(body["stream"], true);
}

#[tokio::test]
async fn noise_lines_do_not_change_output() {
    let clean = ScriptedTransport::new(vec![Scripted::sse(&[
        &delta("Rest "),
        &delta("well."),
        MESSAGE_STOP,
    ])]);
    let noisy = ScriptedTransport::new(vec![Scripted::sse(&[
        ": keep-alive",
        "",
        "event: content_block_delta",
        &delta("Rest "),
        "data: {not json",
        r#"data: {"type":"ping"}"#,
        "id: 42",
        &delta("well."),
        "   ",
        MESSAGE_STOP,
    ])]);

    let (a, _, _) =
        drain(client_with(clean, Some("k")).stream_conversation(&turns(), None, MODEL, 64)).await;
    let (b, errors, _) =
        drain(client_with(noisy, Some("k")).stream_conversation(&turns(), None, MODEL, 64)).await;
    assert_eq!(a, b);
    assert!(errors.is_empty());
}

#[tokio::test]
async fn done_sentinel_ends_the_stream() {
    let transport = ScriptedTransport::new(vec![Scripted::sse(&[
        &delta("first"),
        "data: [DONE]",
        &delta("never seen"),
    ])]);
    let client = client_with(transport, Some("k"));

    let (chunks, errors, phase) =
        drain(client.stream_conversation(&turns(), None, MODEL, 64)).await;
    assert_eq!(chunks, ["first"]);
    assert!(errors.is_empty());
    assert_eq!(phase, StreamPhase::Completed);
}

#[tokio::test]
async fn content_block_stop_ends_the_stream() {
    let transport = ScriptedTransport::new(vec![Scripted::sse(&[
        &delta("Two sets."),
        r#"data: {"type":"content_block_stop","index":0}"#,
        &delta("never seen"),
        MESSAGE_STOP,
    ])]);
    let client = client_with(transport, Some("k"));

    let (chunks, errors, phase) =
        drain(client.stream_conversation(&turns(), None, MODEL, 64)).await;
    assert_eq!(chunks, ["Two sets."]);
    assert!(errors.is_empty());
    assert_eq!(phase, StreamPhase::Completed);
}

#[tokio::test]
async fn end_of_body_without_stop_completes_cleanly() {
    let transport = ScriptedTransport::new(vec![Scripted::sse(&[&delta("partial")])]);
    let client = client_with(transport, Some("k"));

    let (chunks, errors, phase) =
        drain(client.stream_conversation(&turns(), None, MODEL, 64)).await;
    assert_eq!(chunks, ["partial"]);
    assert!(errors.is_empty());
    assert_eq!(phase, StreamPhase::Completed);
}

#[tokio::test]
async fn stream_is_lazy_until_polled() {
    let transport = ScriptedTransport::new(vec![Scripted::sse(&[MESSAGE_STOP])]);
    let client = client_with(transport.clone(), Some("k"));

    let mut stream = client.stream_conversation(&turns(), None, MODEL, 64);
    assert_eq!(stream.phase(), StreamPhase::Idle);
    assert_eq!(transport.calls(), 0);

    assert!(stream.next().await.is_none());
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn missing_credential_is_the_single_stream_error() {
    let transport = ScriptedTransport::new(vec![]);
    let client = client_with(transport.clone(), None);

    let (chunks, errors, phase) =
        drain(client.stream_conversation(&turns(), None, MODEL, 64)).await;
    assert!(chunks.is_empty());
    assert_eq!(errors, [Error::MissingCredential]);
    assert_eq!(phase, StreamPhase::Failed);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn unreadable_credential_store_is_the_single_stream_error() {
    let transport = ScriptedTransport::new(vec![]);
    let client = client_with_credentials(transport.clone(), LockedCredentialStore);

    let (chunks, errors, phase) =
        drain(client.stream_conversation(&turns(), None, MODEL, 64)).await;
    assert!(chunks.is_empty());
    assert_eq!(errors, [Error::MissingCredential]);
    assert_eq!(phase, StreamPhase::Failed);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn non_success_status_yields_one_error_and_no_retry() {
    let transport = ScriptedTransport::new(vec![Scripted::stream_status(
        500,
        &[r#"{"type":"error","error":{"type":"api_error","message":"Internal error"}}"#],
    )]);
    let client = client_with(transport.clone(), Some("k"));

    let (chunks, errors, _) =
        drain(client.stream_conversation(&turns(), None, MODEL, 64)).await;
    assert!(chunks.is_empty());
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        Error::Http { status, message } => {
            assert_eq!(*status, 500);
            assert_eq!(message.as_deref(), Some("Internal error"));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn unauthorized_stream_maps_to_invalid_credential() {
    let transport = ScriptedTransport::new(vec![Scripted::stream_status(401, &["nope"])]);
    let client = client_with(transport, Some("k"));

    let (_, errors, _) =
        drain(client.stream_conversation(&turns(), None, MODEL, 64)).await;
    assert_eq!(errors, [Error::InvalidCredential]);
}

#[tokio::test]
async fn rate_limited_stream_reads_retry_after_header() {
    let transport = ScriptedTransport::new(vec![Scripted::Stream {
        status: 429,
        headers: HashMap::from([("retry-after".to_string(), "7".to_string())]),
        lines: Box::pin(futures::stream::empty::<Result<String, TransportError>>()),
    }]);
    let client = client_with(transport, Some("k"));

    let (_, errors, _) =
        drain(client.stream_conversation(&turns(), None, MODEL, 64)).await;
    match errors.as_slice() {
        [Error::RateLimited { retry_after_secs }] => assert_eq!(*retry_after_secs, Some(7)),
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn connection_failure_surfaces_through_the_stream() {
    let transport = ScriptedTransport::new(vec![Scripted::Fail(TransportError::NoConnection)]);
    let client = client_with(transport, Some("k"));

    let (chunks, errors, phase) =
        drain(client.stream_conversation(&turns(), None, MODEL, 64)).await;
    assert!(chunks.is_empty());
    assert_eq!(errors, [Error::NoConnection]);
    assert_eq!(phase, StreamPhase::Failed);
}

#[tokio::test]
async fn mid_stream_failure_is_terminal() {
    let transport = ScriptedTransport::new(vec![Scripted::stream_items(vec![
        Ok(delta("Hel")),
        Ok(delta("lo")),
        Err(TransportError::Timeout),
        Ok(delta("ignored")),
    ])]);
    let client = client_with(transport, Some("k"));

    let outcome = collect_reply(client.stream_conversation(&turns(), None, MODEL, 64)).await;
    assert_eq!(outcome.turn.role, TurnRole::Assistant);
    assert_eq!(outcome.turn.content, "Hello");
    assert_eq!(outcome.error, Some(Error::Timeout));
}

#[tokio::test]
async fn nothing_follows_the_terminal_error() {
    let transport = ScriptedTransport::new(vec![Scripted::stream_items(vec![
        Ok(delta("a")),
        Err(TransportError::Other("reset".into())),
        Ok(delta("b")),
    ])]);
    let client = client_with(transport, Some("k"));

    let mut stream = client.stream_conversation(&turns(), None, MODEL, 64);
    assert_eq!(stream.next().await.unwrap().unwrap(), "a");
    assert!(stream.next().await.unwrap().is_err());
    assert!(stream.next().await.is_none());
    assert!(stream.next().await.is_none());
    assert_eq!(stream.phase(), StreamPhase::Failed);
}

#[tokio::test]
async fn in_band_error_event_fails_the_stream() {
    let transport = ScriptedTransport::new(vec![Scripted::sse(&[
        &delta("Start"),
        r#"data: {"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
        &delta("never"),
    ])]);
    let client = client_with(transport, Some("k"));

    let (chunks, errors, phase) =
        drain(client.stream_conversation(&turns(), None, MODEL, 64)).await;
    assert_eq!(chunks, ["Start"]);
    assert_eq!(errors, [Error::http(529, None)]);
    assert_eq!(phase, StreamPhase::Failed);
}

#[tokio::test]
async fn cancel_stops_delivery_and_releases_the_connection() {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    let lines = UnboundedReceiverStream::new(rx).map(Ok::<String, TransportError>);
    let transport = ScriptedTransport::new(vec![Scripted::stream_from(Box::pin(lines))]);
    let client = client_with(transport, Some("k"));

    let (mut stream, handle) =
        client.stream_conversation_with_cancel(&turns(), None, MODEL, 64);
    tx.send(delta("one")).unwrap();
    assert_eq!(stream.next().await.unwrap().unwrap(), "one");
    assert_eq!(stream.phase(), StreamPhase::Streaming);

    handle.cancel();
    let _ = tx.send(delta("two"));
    assert!(stream.next().await.is_none());
    assert_eq!(stream.phase(), StreamPhase::Cancelled);
    assert!(tx.is_closed());
}

#[tokio::test]
async fn cancel_while_waiting_for_data_ends_without_error() {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    let lines = UnboundedReceiverStream::new(rx).map(Ok::<String, TransportError>);
    let transport = ScriptedTransport::new(vec![Scripted::stream_from(Box::pin(lines))]);
    let client = client_with(transport, Some("k"));

    let (mut stream, handle) =
        client.stream_conversation_with_cancel(&turns(), None, MODEL, 64);
    tx.send(delta("one")).unwrap();
    assert_eq!(stream.next().await.unwrap().unwrap(), "one");

    let waiter = tokio::spawn(async move {
        let next = stream.next().await;
        (next.is_none(), stream.phase())
    });
    tokio::task::yield_now().await;
    handle.cancel();

    let (ended, phase) = waiter.await.unwrap();
    assert!(ended);
    assert_eq!(phase, StreamPhase::Cancelled);
    assert!(tx.is_closed());
}

#[tokio::test]
async fn dropping_the_stream_releases_the_connection() {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    let lines = UnboundedReceiverStream::new(rx).map(Ok::<String, TransportError>);
    let transport = ScriptedTransport::new(vec![Scripted::stream_from(Box::pin(lines))]);
    let client = client_with(transport, Some("k"));

    let mut stream = client.stream_conversation(&turns(), None, MODEL, 64);
    tx.send(delta("one")).unwrap();
    assert!(stream.next().await.is_some());
    drop(stream);
    assert!(tx.is_closed());
}

#[tokio::test]
async fn one_client_serves_concurrent_streams() {
    let transport = ScriptedTransport::new(vec![
        Scripted::sse(&[&delta("x"), MESSAGE_STOP]),
        Scripted::sse(&[&delta("x"), MESSAGE_STOP]),
    ]);
    let client = client_with(transport.clone(), Some("k"));

    let a = client.stream_conversation(&[ChatTurn::user("a")], None, MODEL, 64);
    let b = client.stream_conversation(&[ChatTurn::user("b")], None, MODEL, 64);
    let (ra, rb) = tokio::join!(collect_reply(a), collect_reply(b));
    assert!(ra.is_complete() && rb.is_complete());
    assert_eq!(ra.turn.content, "x");
    assert_eq!(rb.turn.content, "x");
    assert_eq!(transport.calls(), 2);
}
