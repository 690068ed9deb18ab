//! Binary snapshot codec.
//!
//! Layout:
//!
//! ```text
//! "MINIDIS" <version:u8>
//! { [0xFC <expires_at_ms:u64 LE>] <type:u8> <key> <value> }*
//! 0xFF <crc32 of everything before it:u32 LE>
//! ```
//!
//! Strings are length-prefixed. A list value is a length followed by that
//! many strings; a hash value is a length followed by field/value string
//! pairs.

use crate::error::{MinidisError, MinidisResult};
use crate::store::Keyspace;
use crate::store::entry::{Entry, now_millis};
use crate::types::RedisValue;
use crate::types::hash::RedisHash;
use crate::types::list::RedisList;
use bytes::{Buf, BufMut};

const MAGIC: &[u8] = b"MINIDIS";
const VERSION: u8 = 1;

const OPCODE_EXPIRETIME_MS: u8 = 0xFC;
const OPCODE_EOF: u8 = 0xFF;

const TYPE_STRING: u8 = 0;
const TYPE_LIST: u8 = 1;
const TYPE_HASH: u8 = 2;

fn corrupt(msg: impl Into<String>) -> MinidisError {
    MinidisError::Corrupt(msg.into())
}

/// Encode every live key. Keys and hash fields are written in sorted order so
/// equal keyspaces produce identical files. Returns the bytes and the number
/// of keys written.
pub fn encode(ks: &Keyspace) -> (Vec<u8>, usize) {
    let now = now_millis();
    let mut entries: Vec<(&String, &Entry)> = ks
        .iter()
        .filter(|(_, entry)| !entry.is_expired_at(now))
        .collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let mut buf: Vec<u8> = Vec::with_capacity(4096);
    buf.put_slice(MAGIC);
    buf.put_u8(VERSION);

    for (key, entry) in &entries {
        if let Some(expires_at) = entry.expires_at {
            buf.put_u8(OPCODE_EXPIRETIME_MS);
            buf.put_u64_le(expires_at);
        }
        match &entry.value {
            RedisValue::String(s) => {
                buf.put_u8(TYPE_STRING);
                put_string(&mut buf, key.as_bytes());
                put_string(&mut buf, s);
            }
            RedisValue::List(list) => {
                buf.put_u8(TYPE_LIST);
                put_string(&mut buf, key.as_bytes());
                put_length(&mut buf, list.len() as u64);
                for item in list.iter() {
                    put_string(&mut buf, item);
                }
            }
            RedisValue::Hash(hash) => {
                buf.put_u8(TYPE_HASH);
                put_string(&mut buf, key.as_bytes());
                let mut fields: Vec<_> = hash.iter().collect();
                fields.sort_unstable_by(|a, b| a.0.cmp(b.0));
                put_length(&mut buf, fields.len() as u64);
                for (field, value) in fields {
                    put_string(&mut buf, field.as_bytes());
                    put_string(&mut buf, value);
                }
            }
        }
    }

    buf.put_u8(OPCODE_EOF);
    let checksum = crc32fast::hash(&buf);
    buf.put_u32_le(checksum);
    (buf, entries.len())
}

/// Decode a snapshot into a fresh keyspace. Records whose deadline has
/// already passed are dropped.
pub fn decode(data: &[u8]) -> MinidisResult<Keyspace> {
    if data.len() < MAGIC.len() + 1 + 1 + 4 {
        return Err(corrupt("file too short"));
    }
    let (body, mut trailer) = data.split_at(data.len() - 4);
    let stored = trailer.get_u32_le();
    let actual = crc32fast::hash(body);
    if stored != actual {
        return Err(corrupt(format!(
            "checksum mismatch (stored {stored:08x}, computed {actual:08x})"
        )));
    }

    let mut r = body;
    if !r.starts_with(MAGIC) {
        return Err(corrupt("bad magic"));
    }
    r.advance(MAGIC.len());
    let version = r.get_u8();
    if version != VERSION {
        return Err(corrupt(format!("unsupported version {version}")));
    }

    let now = now_millis();
    let mut ks = Keyspace::new();
    let mut next_expiry: Option<u64> = None;

    loop {
        need(&r, 1)?;
        match r.get_u8() {
            OPCODE_EOF => break,
            OPCODE_EXPIRETIME_MS => {
                need(&r, 8)?;
                next_expiry = Some(r.get_u64_le());
            }
            type_byte => {
                let key = read_text(&mut r)?;
                let value = read_value(&mut r, type_byte)?;
                let entry = Entry {
                    value,
                    expires_at: next_expiry.take(),
                };
                if !entry.is_expired_at(now) {
                    ks.insert(key, entry);
                }
            }
        }
    }

    if r.has_remaining() {
        return Err(corrupt("trailing bytes after EOF marker"));
    }
    Ok(ks)
}

// --- Encoding helpers ---

/// Variable-width length: 6 bits inline, 14 bits over two bytes, then 32 or
/// 64 bit big-endian with a marker byte.
fn put_length(buf: &mut Vec<u8>, len: u64) {
    if len < 64 {
        buf.put_u8(len as u8);
    } else if len < 16384 {
        buf.put_u8(0x40 | (len >> 8) as u8);
        buf.put_u8(len as u8);
    } else if len < (1 << 32) {
        buf.put_u8(0x80);
        buf.put_u32(len as u32);
    } else {
        buf.put_u8(0x81);
        buf.put_u64(len);
    }
}

fn put_string(buf: &mut Vec<u8>, data: &[u8]) {
    put_length(buf, data.len() as u64);
    buf.put_slice(data);
}

// --- Decoding helpers ---

fn need(r: &[u8], n: usize) -> MinidisResult<()> {
    if r.remaining() < n {
        return Err(corrupt("unexpected end of data"));
    }
    Ok(())
}

fn read_length(r: &mut &[u8]) -> MinidisResult<u64> {
    need(r, 1)?;
    let first = r.get_u8();
    match (first >> 6, first) {
        (0, _) => Ok((first & 0x3F) as u64),
        (1, _) => {
            need(r, 1)?;
            Ok((((first & 0x3F) as u64) << 8) | r.get_u8() as u64)
        }
        (_, 0x80) => {
            need(r, 4)?;
            Ok(r.get_u32() as u64)
        }
        (_, 0x81) => {
            need(r, 8)?;
            Ok(r.get_u64())
        }
        _ => Err(corrupt(format!("invalid length prefix 0x{first:02x}"))),
    }
}

fn read_bytes(r: &mut &[u8]) -> MinidisResult<Vec<u8>> {
    let len = read_length(r)?;
    let len = usize::try_from(len).map_err(|_| corrupt("string length overflow"))?;
    need(r, len)?;
    let data = r[..len].to_vec();
    r.advance(len);
    Ok(data)
}

fn read_text(r: &mut &[u8]) -> MinidisResult<String> {
    let data = read_bytes(r)?;
    String::from_utf8(data).map_err(|_| corrupt("key or field is not valid UTF-8"))
}

fn read_value(r: &mut &[u8], type_byte: u8) -> MinidisResult<RedisValue> {
    match type_byte {
        TYPE_STRING => Ok(RedisValue::String(read_bytes(r)?)),
        TYPE_LIST => {
            let count = read_length(r)?;
            let mut list = RedisList::new();
            for _ in 0..count {
                list.rpush(read_bytes(r)?);
            }
            Ok(RedisValue::List(list))
        }
        TYPE_HASH => {
            let count = read_length(r)?;
            let mut hash = RedisHash::new();
            for _ in 0..count {
                let field = read_text(r)?;
                let value = read_bytes(r)?;
                hash.set(field, value);
            }
            Ok(RedisValue::Hash(hash))
        }
        other => Err(corrupt(format!("unknown record type {other}"))),
    }
}
