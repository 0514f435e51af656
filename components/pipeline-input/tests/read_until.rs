use pipeline_input::{
    Input, InputConfig, InputError, Message, Transaction, new_input,
};
use std::{io::Write, path::Path, time::Duration};
use tempfile::NamedTempFile;

const WAIT: Duration = Duration::from_secs(5);

fn parse(conf: &str) -> InputConfig {
    toml::from_str(conf).unwrap()
}

fn read_until_file(path: &Path, restart: bool, condition: &str) -> InputConfig {
    parse(&format!(
        r#"
        type = "read_until"
        restart_input = {restart}
        input = {{ type = "file", path = "{}" }}
        condition = {condition}
        "#,
        path.display()
    ))
}

fn read_until_memory(messages: &[&str], condition: &str) -> InputConfig {
    let messages = messages
        .iter()
        .map(|m| format!("{m:?}"))
        .collect::<Vec<_>>()
        .join(", ");
    parse(&format!(
        r#"
        type = "read_until"
        input = {{ type = "memory", messages = [{messages}] }}
        condition = {condition}
        "#
    ))
}

fn temp_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

async fn next(input: &mut Box<dyn Input>) -> Option<Transaction> {
    tokio::time::timeout(WAIT, input.recv())
        .await
        .expect("timed out waiting for a transaction")
}

async fn expect_message(input: &mut Box<dyn Input>, want: &str) -> Transaction {
    let tran = next(input).await.expect("input closed early");
    assert_eq!(tran.payload, Message::from(want));
    tran
}

async fn expect_closed(input: &mut Box<dyn Input>) {
    assert!(next(input).await.is_none(), "expected the input to be closed");
    input.wait_for_close(WAIT).await.unwrap();
}

#[tokio::test]
async fn test_ends_after_accepted_final_message() {
    let file = temp_file("foo\nbar\nbaz\n");
    let mut input = new_input(&read_until_file(
        file.path(),
        false,
        r#"{ type = "content", operator = "equals", arg = "bar" }"#,
    ))
    .unwrap();

    expect_message(&mut input, "foo").await.ack().unwrap();
    expect_message(&mut input, "bar").await.ack().unwrap();
    expect_closed(&mut input).await;
}

#[tokio::test]
async fn test_rejected_messages_are_redelivered() {
    let file = temp_file("foo\nbar\n");
    let mut input = new_input(&read_until_file(
        file.path(),
        false,
        r#"{ type = "content", operator = "equals", arg = "bar" }"#,
    ))
    .unwrap();

    expect_message(&mut input, "foo").await.nack("failed").unwrap();
    expect_message(&mut input, "foo").await.ack().unwrap();

    expect_message(&mut input, "bar").await.nack("failed").unwrap();
    expect_message(&mut input, "bar").await.ack().unwrap();

    expect_closed(&mut input).await;
}

#[tokio::test]
async fn test_dropped_final_message_counts_as_rejected() {
    let mut input = new_input(&read_until_memory(
        &["foo", "bar"],
        r#"{ type = "content", operator = "equals", arg = "bar" }"#,
    ))
    .unwrap();

    expect_message(&mut input, "foo").await.ack().unwrap();
    drop(expect_message(&mut input, "bar").await);
    expect_message(&mut input, "bar").await.ack().unwrap();
    expect_closed(&mut input).await;
}

#[tokio::test]
async fn test_closes_with_exhausted_input() {
    let file = temp_file("foo\nbar\nbaz\n");
    let mut input = new_input(&read_until_file(
        file.path(),
        false,
        r#"{ type = "content", operator = "equals", arg = "qux" }"#,
    ))
    .unwrap();

    for want in ["foo", "bar", "baz"] {
        expect_message(&mut input, want).await.ack().unwrap();
    }
    expect_closed(&mut input).await;
}

#[tokio::test]
async fn test_restarts_exhausted_input() {
    let file = temp_file("foo\nbar\nbaz\n");
    let mut input = new_input(&read_until_file(
        file.path(),
        true,
        r#"{ type = "static", value = false }"#,
    ))
    .unwrap();

    for _ in 0..3 {
        for want in ["foo", "bar", "baz"] {
            expect_message(&mut input, want).await.ack().unwrap();
        }
    }

    input.close_async();
    input.wait_for_close(WAIT).await.unwrap();
    expect_closed(&mut input).await;
}

#[tokio::test]
async fn test_restart_failure_closes_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.log");
    std::fs::write(&path, "foo\nbar\n").unwrap();

    let mut input = new_input(&read_until_file(
        &path,
        true,
        r#"{ type = "static", value = false }"#,
    ))
    .unwrap();
    std::fs::remove_file(&path).unwrap();

    expect_message(&mut input, "foo").await.ack().unwrap();
    expect_message(&mut input, "bar").await.ack().unwrap();
    expect_closed(&mut input).await;
}

#[tokio::test]
async fn test_close_after_ack_delivers_nothing_more() {
    let mut input = new_input(&read_until_memory(
        &["foo", "bar", "baz"],
        r#"{ type = "static", value = false }"#,
    ))
    .unwrap();

    expect_message(&mut input, "foo").await.ack().unwrap();
    // Let the worker forward "bar" before close is requested
    tokio::time::sleep(Duration::from_millis(50)).await;

    input.close_async();
    input.wait_for_close(WAIT).await.unwrap();
    assert!(next(&mut input).await.is_none());
}

#[tokio::test]
async fn test_close_with_unread_final_message() {
    let mut input = new_input(&read_until_memory(
        &["foo", "bar"],
        r#"{ type = "content", operator = "equals", arg = "bar" }"#,
    ))
    .unwrap();

    expect_message(&mut input, "foo").await.ack().unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    input.close_async();
    input.wait_for_close(WAIT).await.unwrap();
    assert!(next(&mut input).await.is_none());
}

#[tokio::test]
async fn test_close_before_condition_met() {
    let mut input = new_input(&read_until_memory(
        &["foo", "bar"],
        r#"{ type = "content", operator = "equals", arg = "bar" }"#,
    ))
    .unwrap();

    let _held = expect_message(&mut input, "foo").await;
    input.close_async();
    input.wait_for_close(WAIT).await.unwrap();
    assert!(next(&mut input).await.is_none());
}

#[tokio::test]
async fn test_close_while_final_message_pending() {
    let mut input = new_input(&read_until_memory(&["bar"], r#"{ type = "static", value = true }"#))
        .unwrap();

    let _held = expect_message(&mut input, "bar").await;
    input.close_async();
    input.wait_for_close(WAIT).await.unwrap();
}

#[tokio::test]
async fn test_close_is_idempotent_with_concurrent_waiters() {
    let mut input = new_input(&read_until_memory(
        &["foo"],
        r#"{ type = "static", value = false }"#,
    ))
    .unwrap();
    let _held = expect_message(&mut input, "foo").await;

    input.close_async();
    input.close_async();
    let (a, b, c) = tokio::join!(
        input.wait_for_close(WAIT),
        input.wait_for_close(WAIT),
        input.wait_for_close(WAIT),
    );
    assert!(a.is_ok() && b.is_ok() && c.is_ok());

    input.close_async();
    input.wait_for_close(WAIT).await.unwrap();
}

#[tokio::test]
async fn test_wait_for_close_times_out_while_running() {
    let mut input = new_input(&read_until_memory(
        &["foo"],
        r#"{ type = "static", value = false }"#,
    ))
    .unwrap();
    let _held = expect_message(&mut input, "foo").await;

    let err = input
        .wait_for_close(Duration::from_millis(20))
        .await
        .unwrap_err();
    assert_eq!(err.timeout, Duration::from_millis(20));

    input.close_async();
    input.wait_for_close(WAIT).await.unwrap();
}

#[tokio::test]
async fn test_emits_messages_in_order_up_to_condition() {
    let messages = ["1", "2", "3", "4", "5"];
    let mut input =
        new_input(&read_until_memory(&messages, r#"{ type = "count", arg = 3 }"#)).unwrap();

    for want in &messages[..3] {
        expect_message(&mut input, want).await.ack().unwrap();
    }
    expect_closed(&mut input).await;
}

#[tokio::test]
async fn test_nested_read_until() {
    let conf = parse(
        r#"
        type = "read_until"
        condition = { type = "content", operator = "equals", arg = "b" }

        [input]
        type = "read_until"
        input = { type = "memory", messages = ["a", "b", "c", "d"] }
        condition = { type = "content", operator = "equals", arg = "c" }
        "#,
    );
    let mut input = new_input(&conf).unwrap();

    expect_message(&mut input, "a").await.ack().unwrap();
    expect_message(&mut input, "b").await.ack().unwrap();
    expect_closed(&mut input).await;
}

#[tokio::test]
async fn test_missing_child_fails() {
    let conf = parse(
        r#"
        type = "read_until"
        condition = { type = "static", value = true }
        "#,
    );
    let err = new_input(&conf).unwrap_err();
    assert!(matches!(err, InputError::MissingChild));
    assert_eq!(err.to_string(), "cannot create read_until input without a child");
}

#[tokio::test]
async fn test_bad_condition_fails() {
    let err = new_input(&read_until_memory(
        &["foo"],
        r#"{ type = "content", operator = "nope", arg = "bar" }"#,
    ))
    .unwrap_err();
    assert!(matches!(err, InputError::Condition { kind: "content", .. }));
}

#[tokio::test]
async fn test_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = new_input(&read_until_file(
        &dir.path().join("missing.log"),
        false,
        r#"{ type = "static", value = true }"#,
    ))
    .unwrap_err();

    match err {
        InputError::Child { kind, source } => {
            assert_eq!(kind, "file");
            assert!(matches!(*source, InputError::Open { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
