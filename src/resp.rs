use bytes::{Buf, BytesMut};

/// Largest bulk string accepted from a client. A partial frame may sit in the
/// connection buffer, so this bounds what one client can make the server hold.
const MAX_BULK_LEN: i64 = 64 * 1024 * 1024;
/// Largest array length accepted from a client.
const MAX_ARRAY_LEN: i64 = 1024 * 1024;
/// Deepest array nesting accepted. Requests are flat and replies nest at most
/// once, so anything deeper is hostile.
const MAX_DEPTH: usize = 8;
/// Inline requests longer than this without a newline are rejected.
const MAX_INLINE_LEN: usize = 64 * 1024;

/// A RESP2 value.
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    /// +OK\r\n
    SimpleString(String),
    /// -ERR message\r\n
    Error(String),
    /// :1000\r\n
    Integer(i64),
    /// $6\r\nfoobar\r\n  or  $-1\r\n (null)
    BulkString(Option<Vec<u8>>),
    /// *2\r\n...  or  *-1\r\n (null)
    Array(Option<Vec<RespValue>>),
}

impl RespValue {
    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    pub fn simple_string(s: impl Into<String>) -> Self {
        RespValue::SimpleString(s.into())
    }

    pub fn error(s: impl Into<String>) -> Self {
        RespValue::Error(s.into())
    }

    pub fn integer(n: i64) -> Self {
        RespValue::Integer(n)
    }

    pub fn bulk_string(data: impl Into<Vec<u8>>) -> Self {
        RespValue::BulkString(Some(data.into()))
    }

    pub fn null_bulk_string() -> Self {
        RespValue::BulkString(None)
    }

    pub fn array(items: Vec<RespValue>) -> Self {
        RespValue::Array(Some(items))
    }

    /// Array of bulk strings, the shape of KEYS / HKEYS / HVALS replies.
    pub fn bulk_array<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Vec<u8>>,
    {
        RespValue::Array(Some(
            items.into_iter().map(RespValue::bulk_string).collect(),
        ))
    }

    /// Serialize this value to RESP bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write_to(&mut buf);
        buf
    }

    /// Write RESP bytes into the given buffer.
    pub fn write_to(&self, buf: &mut Vec<u8>) {
        match self {
            RespValue::SimpleString(s) => write_line(buf, b'+', s.as_bytes()),
            RespValue::Error(s) => write_line(buf, b'-', s.as_bytes()),
            RespValue::Integer(n) => write_line(buf, b':', n.to_string().as_bytes()),
            RespValue::BulkString(None) => buf.extend_from_slice(b"$-1\r\n"),
            RespValue::BulkString(Some(data)) => {
                write_line(buf, b'$', data.len().to_string().as_bytes());
                buf.extend_from_slice(data);
                buf.extend_from_slice(b"\r\n");
            }
            RespValue::Array(None) => buf.extend_from_slice(b"*-1\r\n"),
            RespValue::Array(Some(items)) => {
                write_line(buf, b'*', items.len().to_string().as_bytes());
                for item in items {
                    item.write_to(buf);
                }
            }
        }
    }
}

fn write_line(buf: &mut Vec<u8>, marker: u8, body: &[u8]) {
    buf.push(marker);
    buf.extend_from_slice(body);
    buf.extend_from_slice(b"\r\n");
}

/// Decode one request buffer into its argument tokens.
///
/// A buffer starting with `*` must hold a complete array of bulk strings;
/// anything else is split on ASCII whitespace. Malformed or truncated framing
/// decodes to an empty token list.
pub fn decode(buf: &[u8]) -> Vec<Vec<u8>> {
    if buf.first() != Some(&b'*') {
        return buf
            .split(|b| b.is_ascii_whitespace())
            .filter(|token| !token.is_empty())
            .map(<[u8]>::to_vec)
            .collect();
    }

    match parse_frame(buf, 0, 0) {
        Ok(Some((RespValue::Array(Some(items)), _))) => items
            .into_iter()
            .map(|item| match item {
                RespValue::BulkString(Some(data)) => Some(data),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Streaming RESP parser.
///
/// Both entry points leave the buffer untouched and return `Ok(None)` until a
/// complete frame is available.
pub struct RespParser;

impl RespParser {
    /// Parse and consume one complete RESP value (used for server replies).
    pub fn parse(buf: &mut BytesMut) -> Result<Option<RespValue>, RespError> {
        match parse_frame(buf, 0, 0)? {
            Some((value, consumed)) => {
                buf.advance(consumed);
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Split one complete request off the front of `buf`.
    ///
    /// A request is either a RESP frame or an inline line terminated by `\n`.
    pub fn next_request(buf: &mut BytesMut) -> Result<Option<BytesMut>, RespError> {
        let Some(&first) = buf.first() else {
            return Ok(None);
        };

        let len = if is_type_byte(first) {
            match parse_frame(buf, 0, 0)? {
                Some((_, consumed)) => consumed,
                None => return Ok(None),
            }
        } else {
            match buf.iter().position(|&b| b == b'\n') {
                Some(pos) => pos + 1,
                None if buf.len() > MAX_INLINE_LEN => return Err(RespError::InlineTooLong),
                None => return Ok(None),
            }
        };

        Ok(Some(buf.split_to(len)))
    }
}

fn is_type_byte(b: u8) -> bool {
    matches!(b, b'+' | b'-' | b':' | b'$' | b'*')
}

/// Parse the value starting at `pos`, returning it with the offset just past it.
/// `depth` counts the arrays enclosing this value.
fn parse_frame(
    buf: &[u8],
    pos: usize,
    depth: usize,
) -> Result<Option<(RespValue, usize)>, RespError> {
    let Some(&marker) = buf.get(pos) else {
        return Ok(None);
    };
    if !is_type_byte(marker) {
        return Err(RespError::InvalidByte(marker));
    }
    let Some(eol) = find_crlf(buf, pos + 1) else {
        return Ok(None);
    };
    let line = &buf[pos + 1..eol];
    let next = eol + 2;

    match marker {
        b'+' => Ok(Some((RespValue::SimpleString(lossy(line)), next))),
        b'-' => Ok(Some((RespValue::Error(lossy(line)), next))),
        b':' => Ok(Some((RespValue::Integer(parse_int(line)?), next))),
        b'$' => {
            let len = parse_int(line)?;
            if len == -1 {
                return Ok(Some((RespValue::BulkString(None), next)));
            }
            if !(0..=MAX_BULK_LEN).contains(&len) {
                return Err(RespError::InvalidData("invalid bulk length".into()));
            }
            let end = next + len as usize;
            if buf.len() < end + 2 {
                return Ok(None);
            }
            if &buf[end..end + 2] != b"\r\n" {
                return Err(RespError::InvalidData(
                    "missing trailing CRLF after bulk string".into(),
                ));
            }
            Ok(Some((RespValue::BulkString(Some(buf[next..end].to_vec())), end + 2)))
        }
        _ => {
            let len = parse_int(line)?;
            if len == -1 {
                return Ok(Some((RespValue::Array(None), next)));
            }
            if !(0..=MAX_ARRAY_LEN).contains(&len) {
                return Err(RespError::InvalidData("invalid multibulk length".into()));
            }
            if depth >= MAX_DEPTH {
                return Err(RespError::InvalidData("too deeply nested".into()));
            }
            let mut items = Vec::with_capacity(len.min(1024) as usize);
            let mut cursor = next;
            for _ in 0..len {
                match parse_frame(buf, cursor, depth + 1)? {
                    Some((item, after)) => {
                        items.push(item);
                        cursor = after;
                    }
                    None => return Ok(None),
                }
            }
            Ok(Some((RespValue::Array(Some(items)), cursor)))
        }
    }
}

fn find_crlf(buf: &[u8], start: usize) -> Option<usize> {
    buf.get(start..)?
        .windows(2)
        .position(|w| w == b"\r\n")
        .map(|offset| start + offset)
}

fn parse_int(line: &[u8]) -> Result<i64, RespError> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| RespError::InvalidData(format!("invalid integer: {}", lossy(line))))
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[derive(Debug, thiserror::Error)]
pub enum RespError {
    #[error("unexpected type byte '{}'", *.0 as char)]
    InvalidByte(u8),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("inline request too long")]
    InlineTooLong,
}
