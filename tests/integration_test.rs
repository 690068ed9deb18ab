use minidis::persistence;
use minidis::store::{SharedStore, new_shared_store};
use redis::Commands;
use std::collections::HashMap;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

struct TestServer {
    port: u16,
    store: SharedStore,
    shutdown: CancellationToken,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn start_server() -> TestServer {
    start_server_with(new_shared_store()).await
}

async fn start_server_with(store: SharedStore) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let shutdown = CancellationToken::new();
    tokio::spawn(minidis::server::serve(listener, store.clone(), shutdown.clone()));
    TestServer {
        port,
        store,
        shutdown,
    }
}

fn get_client(port: u16) -> redis::Connection {
    let client = redis::Client::open(format!("redis://127.0.0.1:{port}/")).unwrap();
    for i in 0..50 {
        match client.get_connection() {
            Ok(conn) => return conn,
            Err(_) if i < 49 => {
                std::thread::sleep(Duration::from_millis(100));
            }
            Err(e) => panic!("Failed to connect: {e}"),
        }
    }
    unreachable!()
}

/// Run a blocking redis-client session against the server.
async fn with_client<F>(port: u16, f: F)
where
    F: FnOnce(&mut redis::Connection) + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut conn = get_client(port);
        f(&mut conn);
    })
    .await
    .unwrap();
}

fn resp(parts: &[&str]) -> Vec<u8> {
    let mut out = format!("*{}\r\n", parts.len()).into_bytes();
    for part in parts {
        out.extend_from_slice(format!("${}\r\n{}\r\n", part.len(), part).as_bytes());
    }
    out
}

async fn expect_reply(stream: &mut TcpStream, request: &[u8], expected: &[u8]) {
    stream.write_all(request).await.unwrap();
    let mut reply = vec![0u8; expected.len()];
    stream.read_exact(&mut reply).await.unwrap();
    assert_eq!(
        String::from_utf8_lossy(&reply),
        String::from_utf8_lossy(expected),
        "reply to {:?}",
        String::from_utf8_lossy(request)
    );
}

// --- redis client ---

#[tokio::test]
async fn test_ping_echo() {
    let server = start_server().await;
    with_client(server.port, |conn| {
        let pong: String = redis::cmd("PING").query(conn).unwrap();
        assert_eq!(pong, "PONG");
        let echoed: String = redis::cmd("ECHO").arg("hello world").query(conn).unwrap();
        assert_eq!(echoed, "hello world");
    })
    .await;
}

#[tokio::test]
async fn test_set_get_del_type() {
    let server = start_server().await;
    with_client(server.port, |conn| {
        let kind: String = conn.key_type("mykey").unwrap();
        assert_eq!(kind, "none");

        let _: () = conn.set("mykey", "myvalue").unwrap();
        let val: String = conn.get("mykey").unwrap();
        assert_eq!(val, "myvalue");
        let kind: String = conn.key_type("mykey").unwrap();
        assert_eq!(kind, "string");

        let deleted: i64 = conn.del("mykey").unwrap();
        assert_eq!(deleted, 1);
        let deleted: i64 = conn.del("mykey").unwrap();
        assert_eq!(deleted, 0);
        let val: Option<String> = conn.get("mykey").unwrap();
        assert_eq!(val, None);
    })
    .await;
}

#[tokio::test]
async fn test_list_commands() {
    let server = start_server().await;
    with_client(server.port, |conn| {
        let len: i64 = conn.lpush("mylist", "a").unwrap();
        assert_eq!(len, 1);
        let len: i64 = conn.lpush("mylist", "b").unwrap();
        assert_eq!(len, 2);
        let len: i64 = conn.rpush("mylist", &["c", "b"]).unwrap();
        assert_eq!(len, 4);

        let head: String = conn.lindex("mylist", 0).unwrap();
        assert_eq!(head, "b");
        let tail: String = conn.lindex("mylist", -1).unwrap();
        assert_eq!(tail, "b");
        let missing: Option<String> = conn.lindex("mylist", 10).unwrap();
        assert_eq!(missing, None);

        let _: () = conn.lset("mylist", 1, "x").unwrap();
        let second: String = conn.lindex("mylist", 1).unwrap();
        assert_eq!(second, "x");

        let removed: i64 = conn.lrem("mylist", 0, "b").unwrap();
        assert_eq!(removed, 2);

        let popped: String = conn.rpop("mylist", None).unwrap();
        assert_eq!(popped, "c");
        let popped: String = conn.lpop("mylist", None).unwrap();
        assert_eq!(popped, "x");
        let popped: Option<String> = conn.lpop("mylist", None).unwrap();
        assert_eq!(popped, None);

        let len: i64 = conn.llen("mylist").unwrap();
        assert_eq!(len, 0);
        let kind: String = conn.key_type("mylist").unwrap();
        assert_eq!(kind, "list");
    })
    .await;
}

#[tokio::test]
async fn test_hash_commands() {
    let server = start_server().await;
    with_client(server.port, |conn| {
        let created: i64 = conn.hset("user", "name", "ada").unwrap();
        assert_eq!(created, 1);
        let _: () = conn
            .hset_multiple("user", &[("lang", "rust"), ("name", "grace")])
            .unwrap();

        let name: String = conn.hget("user", "name").unwrap();
        assert_eq!(name, "grace");
        let exists: bool = conn.hexists("user", "lang").unwrap();
        assert!(exists);
        let len: i64 = conn.hlen("user").unwrap();
        assert_eq!(len, 2);

        let all: HashMap<String, String> = conn.hgetall("user").unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["lang"], "rust");

        let mut fields: Vec<String> = conn.hkeys("user").unwrap();
        fields.sort();
        assert_eq!(fields, ["lang", "name"]);
        let mut values: Vec<String> = conn.hvals("user").unwrap();
        values.sort();
        assert_eq!(values, ["grace", "rust"]);

        let removed: i64 = conn.hdel("user", "name").unwrap();
        assert_eq!(removed, 1);
        let name: Option<String> = conn.hget("user", "name").unwrap();
        assert_eq!(name, None);

        let kind: String = conn.key_type("user").unwrap();
        assert_eq!(kind, "hash");
    })
    .await;
}

#[tokio::test]
async fn test_keys_and_rename() {
    let server = start_server().await;
    with_client(server.port, |conn| {
        let _: () = conn.set("user:1", "a").unwrap();
        let _: () = conn.rpush("user:2", "b").unwrap();
        let _: () = conn.hset("order:1", "f", "v").unwrap();

        let mut users: Vec<String> = conn.keys("user:*").unwrap();
        users.sort();
        assert_eq!(users, ["user:1", "user:2"]);
        let all: Vec<String> = conn.keys("*").unwrap();
        assert_eq!(all.len(), 3);

        let _: () = conn.rename("order:1", "order:2").unwrap();
        let kind: String = conn.key_type("order:1").unwrap();
        assert_eq!(kind, "none");
        let value: String = conn.hget("order:2", "f").unwrap();
        assert_eq!(value, "v");

        let result: redis::RedisResult<()> = conn.rename("nope", "order:2");
        assert!(result.is_err());
        let value: String = conn.hget("order:2", "f").unwrap();
        assert_eq!(value, "v");
    })
    .await;
}

#[tokio::test]
async fn test_wrong_type_via_client() {
    let server = start_server().await;
    with_client(server.port, |conn| {
        let _: () = conn.set("s", "v").unwrap();
        let result: redis::RedisResult<i64> = conn.lpush("s", "a");
        assert!(result.is_err());
        let val: String = conn.get("s").unwrap();
        assert_eq!(val, "v");
    })
    .await;
}

// --- raw sockets ---

#[tokio::test]
async fn test_byte_exact_replies() {
    let server = start_server().await;
    let mut stream = TcpStream::connect(("127.0.0.1", server.port)).await.unwrap();

    expect_reply(&mut stream, &resp(&["SET", "foo", "bar"]), b"+OK\r\n").await;
    expect_reply(&mut stream, &resp(&["GET", "foo"]), b"$3\r\nbar\r\n").await;
    expect_reply(&mut stream, &resp(&["LPUSH", "mylist", "a"]), b":1\r\n").await;
    expect_reply(&mut stream, &resp(&["RPUSH", "mylist", "b"]), b":2\r\n").await;
    expect_reply(&mut stream, &resp(&["LINDEX", "mylist", "-1"]), b"$1\r\nb\r\n").await;
    expect_reply(&mut stream, &resp(&["GET", "missing"]), b"$-1\r\n").await;
    expect_reply(&mut stream, &resp(&["TYPE", "mylist"]), b"+list\r\n").await;
    expect_reply(&mut stream, &resp(&["NOPE"]), b"-ERR unknown command\r\n").await;
    expect_reply(
        &mut stream,
        &resp(&["GET"]),
        b"-ERR wrong number of arguments for 'get' command\r\n",
    )
    .await;
    expect_reply(
        &mut stream,
        &resp(&["LPUSH", "foo", "x"]),
        b"-WRONGTYPE Operation against a key holding the wrong kind of value\r\n",
    )
    .await;
    expect_reply(
        &mut stream,
        &resp(&["LSET", "mylist", "7", "x"]),
        b"-ERR index out of range\r\n",
    )
    .await;
}

#[tokio::test]
async fn test_inline_commands() {
    let server = start_server().await;
    let mut stream = TcpStream::connect(("127.0.0.1", server.port)).await.unwrap();
    expect_reply(&mut stream, b"PING\r\n", b"+PONG\r\n").await;
    expect_reply(&mut stream, b"set k v\n", b"+OK\r\n").await;
    expect_reply(&mut stream, b"GET k\r\n", b"$1\r\nv\r\n").await;
}

#[tokio::test]
async fn test_pipelined_requests_answered_in_order() {
    let server = start_server().await;
    let mut stream = TcpStream::connect(("127.0.0.1", server.port)).await.unwrap();

    let mut batch = Vec::new();
    batch.extend(resp(&["RPUSH", "l", "a"]));
    batch.extend(resp(&["RPUSH", "l", "b"]));
    batch.extend(resp(&["LLEN", "l"]));
    batch.extend(resp(&["LPOP", "l"]));
    expect_reply(&mut stream, &batch, b":1\r\n:2\r\n:2\r\n$1\r\na\r\n").await;
}

#[tokio::test]
async fn test_request_split_across_writes() {
    let server = start_server().await;
    let mut stream = TcpStream::connect(("127.0.0.1", server.port)).await.unwrap();

    let request = resp(&["SET", "split", "value"]);
    let (first, second) = request.split_at(7);
    stream.write_all(first).await.unwrap();
    stream.flush().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    expect_reply(&mut stream, second, b"+OK\r\n").await;
}

#[tokio::test]
async fn test_protocol_error_closes_connection() {
    let server = start_server().await;
    let mut stream = TcpStream::connect(("127.0.0.1", server.port)).await.unwrap();
    stream.write_all(b"*abc\r\n").await.unwrap();

    let mut reply = Vec::new();
    stream.read_to_end(&mut reply).await.unwrap();
    assert!(reply.starts_with(b"-ERR Protocol error"));
    assert!(reply.ends_with(b"\r\n"));
}

#[tokio::test]
async fn test_nested_request_is_refused_and_server_survives() {
    let server = start_server().await;
    let mut stream = TcpStream::connect(("127.0.0.1", server.port)).await.unwrap();
    stream.write_all(&b"*1\r\n".repeat(100)).await.unwrap();

    let mut reply = Vec::new();
    stream.read_to_end(&mut reply).await.unwrap();
    assert_eq!(reply, b"-ERR Protocol error: invalid data: too deeply nested\r\n");

    let mut stream = TcpStream::connect(("127.0.0.1", server.port)).await.unwrap();
    expect_reply(&mut stream, &resp(&["PING"]), b"+PONG\r\n").await;
}

#[tokio::test]
async fn test_expired_key_is_absent() {
    let server = start_server().await;
    let mut stream = TcpStream::connect(("127.0.0.1", server.port)).await.unwrap();

    expect_reply(&mut stream, &resp(&["HSET", "h", "f", "v"]), b":1\r\n").await;
    expect_reply(&mut stream, &resp(&["EXPIRE", "h", "1"]), b"+OK\r\n").await;
    expect_reply(&mut stream, &resp(&["TYPE", "h"]), b"+hash\r\n").await;

    tokio::time::sleep(Duration::from_millis(1100)).await;

    expect_reply(&mut stream, &resp(&["TYPE", "h"]), b"+none\r\n").await;
    expect_reply(&mut stream, &resp(&["HGET", "h", "f"]), b"$-1\r\n").await;
    expect_reply(&mut stream, &resp(&["KEYS"]), b"*0\r\n").await;
    expect_reply(&mut stream, &resp(&["EXPIRE", "h", "5"]), b"-ERR no such key\r\n").await;
}

#[tokio::test]
async fn test_many_clients_share_one_keyspace() {
    let server = start_server().await;
    let mut clients = Vec::new();
    for i in 0..8 {
        let port = server.port;
        clients.push(tokio::spawn(async move {
            let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
            let value = format!("v{i}");
            let request = resp(&["LPUSH", "shared", value.as_str()]);
            stream.write_all(&request).await.unwrap();
            let mut reply = [0u8; 1];
            stream.read_exact(&mut reply).await.unwrap();
            assert_eq!(&reply, b":");
        }));
    }
    for client in clients {
        client.await.unwrap();
    }

    assert_eq!(server.store.lock().await.llen("shared").unwrap(), 8);
}

// --- persistence ---

#[tokio::test]
async fn test_snapshot_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dump.mdb");

    let first = start_server().await;
    let mut stream = TcpStream::connect(("127.0.0.1", first.port)).await.unwrap();
    expect_reply(&mut stream, &resp(&["SET", "greeting", "hello"]), b"+OK\r\n").await;
    expect_reply(&mut stream, &resp(&["RPUSH", "queue", "a", "b"]), b":2\r\n").await;
    expect_reply(&mut stream, &resp(&["HSET", "cfg", "mode", "fast"]), b":1\r\n").await;
    expect_reply(&mut stream, &resp(&["EXPIRE", "cfg", "600"]), b"+OK\r\n").await;

    let saved = persistence::snapshot(&first.store, &path).await.unwrap();
    assert_eq!(saved, 3);
    drop(stream);
    drop(first);

    let store = new_shared_store();
    assert_eq!(persistence::restore(&store, &path).await.unwrap(), 3);
    assert!(store.lock().await.get_expiry("cfg").is_some());

    let second = start_server_with(store).await;
    let mut stream = TcpStream::connect(("127.0.0.1", second.port)).await.unwrap();
    expect_reply(&mut stream, &resp(&["GET", "greeting"]), b"$5\r\nhello\r\n").await;
    expect_reply(&mut stream, &resp(&["LINDEX", "queue", "1"]), b"$1\r\nb\r\n").await;
    expect_reply(&mut stream, &resp(&["HGET", "cfg", "mode"]), b"$4\r\nfast\r\n").await;
}
