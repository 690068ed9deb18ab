use bytes::BytesMut;
use std::io::{self, BufRead, Write};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use minidis::resp::{RespParser, RespValue};

#[tokio::main]
async fn main() -> io::Result<()> {
    let mut host = "127.0.0.1".to_string();
    let mut port = 6379u16;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut i = 0;
    while i < args.len() {
        match (args[i].as_str(), args.get(i + 1)) {
            ("--host" | "-h", Some(v)) => {
                host = v.clone();
                i += 1;
            }
            ("--port" | "-p", Some(v)) => {
                if let Ok(p) = v.parse() {
                    port = p;
                }
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }

    let addr = format!("{host}:{port}");
    let mut stream = TcpStream::connect(&addr).await?;
    eprintln!("Connected to {addr}");

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut buf = BytesMut::with_capacity(4096);

    loop {
        print!("{addr}> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }

        let tokens = split_line(&line);
        let Some(first) = tokens.first() else {
            continue;
        };
        if first.eq_ignore_ascii_case("quit") || first.eq_ignore_ascii_case("exit") {
            break;
        }

        let request = RespValue::bulk_array(tokens.iter().map(String::as_bytes));
        stream.write_all(&request.serialize()).await?;

        let reply = loop {
            match RespParser::parse(&mut buf) {
                Ok(Some(reply)) => break reply,
                Ok(None) => {}
                Err(e) => {
                    eprintln!("Protocol error: {e}");
                    return Ok(());
                }
            }
            if stream.read_buf(&mut buf).await? == 0 {
                eprintln!("Connection closed by server");
                return Ok(());
            }
        };
        print!("{}", format_reply(&reply, 0));
    }

    Ok(())
}

/// Split a command line on whitespace, keeping double-quoted runs together.
fn split_line(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        tokens.push(current);
    }
    tokens
}

/// Render a reply the way redis-cli does: `(integer) 1`, `(nil)`, quoted
/// bulk strings and numbered array items.
fn format_reply(value: &RespValue, indent: usize) -> String {
    match value {
        RespValue::SimpleString(s) => format!("{s}\n"),
        RespValue::Error(s) => format!("(error) {s}\n"),
        RespValue::Integer(n) => format!("(integer) {n}\n"),
        RespValue::BulkString(None) | RespValue::Array(None) => "(nil)\n".to_string(),
        RespValue::BulkString(Some(data)) => {
            format!("\"{}\"\n", String::from_utf8_lossy(data))
        }
        RespValue::Array(Some(items)) if items.is_empty() => "(empty array)\n".to_string(),
        RespValue::Array(Some(items)) => {
            let pad = " ".repeat(indent);
            let mut out = String::new();
            for (i, item) in items.iter().enumerate() {
                let label = format!("{}) ", i + 1);
                if i > 0 {
                    out.push_str(&pad);
                }
                out.push_str(&label);
                out.push_str(&format_reply(item, indent + label.len()));
            }
            out
        }
    }
}
