use redlink::{Client, Config};

async fn client() -> Client {
    Client::new(Config::new().address("127.0.0.1:6379").database(8))
        .await
        .expect("Failed to connect")
}

#[tokio::test]
#[ignore]
async fn test_transaction_result_length() {
    let client = client().await;
    client.flushdb().await;

    let mut tx = client.transaction().await.unwrap();
    tx.set("trankey", "tranval");
    tx.get("trankey");
    let outcome = tx.exec().await;

    let elems = outcome.elems().unwrap();
    assert_eq!(elems.len(), 2);
    assert_eq!(elems[1].str().unwrap(), "tranval");
}

#[tokio::test]
#[ignore]
async fn test_transaction_length_counts_failed_commands() {
    let client = client().await;
    client.flushdb().await;
    client.set("stringkey", "notanumber").await;

    let mut tx = client.transaction().await.unwrap();
    tx.set("k", "v");
    tx.queue(redlink::cmd::incr("stringkey"));
    let outcome = tx.exec().await;

    // One element per queued command, the failing INCR included.
    let elems = outcome.elems().unwrap();
    assert_eq!(elems.len(), 2);
    assert!(elems[1].is_error());
}

#[tokio::test]
#[ignore]
async fn test_watch_then_decide_increment() {
    let client = client().await;
    client.flushdb().await;

    for _ in 0..3 {
        let mut mc = client.multi_command().await.unwrap();
        mc.watch(&["ctrankey"]);
        mc.get("ctrankey");
        let pre = mc.flush().await;

        let current: i64 = match pre.at(1) {
            Some(reply) if !reply.is_nil() => reply.str().unwrap().parse().unwrap(),
            _ => 0,
        };

        mc.multi();
        mc.set("ctrankey", (current + 1).to_string());
        let outcome = mc.exec().await;
        assert!(!outcome.is_nil(), "no concurrent writer, must commit");
        mc.close().await;
    }

    assert_eq!(client.get("ctrankey").await.str().unwrap(), "3");
}

#[tokio::test]
#[ignore]
async fn test_watched_key_modification_aborts_exec() {
    let client = client().await;
    client.flushdb().await;
    client.set("watched", "1").await;

    let mut mc = client.multi_command().await.unwrap();
    mc.watch(&["watched"]);
    let watched = mc.flush().await;
    assert!(!watched.is_error());

    // The pool dials a second connection for this write, because the
    // multi-command still holds the first one.
    client.set("watched", "2").await;

    mc.multi();
    mc.set("watched", "3");
    let outcome = mc.exec().await;
    assert!(outcome.is_nil(), "expected the aborted-transaction outcome");
    assert!(!outcome.is_error());
    mc.close().await;

    assert_eq!(client.get("watched").await.str().unwrap(), "2");
}
