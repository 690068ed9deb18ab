pub mod hash;
pub mod key;
pub mod list;
pub mod server_cmd;
pub mod string;

use crate::error::{MinidisError, MinidisResult};
use crate::resp::{RespValue, decode};
use crate::store::{Keyspace, SharedStore};

/// A command handler. Receives the arguments after the command name and the
/// locked keyspace.
pub type Handler = fn(&[Vec<u8>], &mut Keyspace) -> MinidisResult<RespValue>;

pub struct CommandSpec {
    pub name: &'static str,
    /// Minimum number of tokens, including the command name.
    pub arity: usize,
    pub handler: Handler,
}

static COMMANDS: &[CommandSpec] = &[
    // Connection and server
    CommandSpec { name: "PING", arity: 1, handler: server_cmd::cmd_ping },
    CommandSpec { name: "ECHO", arity: 2, handler: server_cmd::cmd_echo },
    CommandSpec { name: "FLUSHALL", arity: 1, handler: server_cmd::cmd_flushall },
    // Strings
    CommandSpec { name: "SET", arity: 3, handler: string::cmd_set },
    CommandSpec { name: "GET", arity: 2, handler: string::cmd_get },
    // Keys
    CommandSpec { name: "KEYS", arity: 1, handler: key::cmd_keys },
    CommandSpec { name: "TYPE", arity: 2, handler: key::cmd_type },
    CommandSpec { name: "DEL", arity: 2, handler: key::cmd_del },
    CommandSpec { name: "UNLINK", arity: 2, handler: key::cmd_del },
    CommandSpec { name: "EXPIRE", arity: 3, handler: key::cmd_expire },
    CommandSpec { name: "RENAME", arity: 3, handler: key::cmd_rename },
    // Lists
    CommandSpec { name: "LLEN", arity: 2, handler: list::cmd_llen },
    CommandSpec { name: "LPUSH", arity: 3, handler: list::cmd_lpush },
    CommandSpec { name: "RPUSH", arity: 3, handler: list::cmd_rpush },
    CommandSpec { name: "LPOP", arity: 2, handler: list::cmd_lpop },
    CommandSpec { name: "RPOP", arity: 2, handler: list::cmd_rpop },
    CommandSpec { name: "LREM", arity: 4, handler: list::cmd_lrem },
    CommandSpec { name: "LINDEX", arity: 3, handler: list::cmd_lindex },
    CommandSpec { name: "LSET", arity: 4, handler: list::cmd_lset },
    // Hashes
    CommandSpec { name: "HSET", arity: 4, handler: hash::cmd_hset },
    CommandSpec { name: "HGET", arity: 3, handler: hash::cmd_hget },
    CommandSpec { name: "HEXISTS", arity: 3, handler: hash::cmd_hexists },
    CommandSpec { name: "HDEL", arity: 3, handler: hash::cmd_hdel },
    CommandSpec { name: "HGETALL", arity: 2, handler: hash::cmd_hgetall },
    CommandSpec { name: "HKEYS", arity: 2, handler: hash::cmd_hkeys },
    CommandSpec { name: "HVALS", arity: 2, handler: hash::cmd_hvals },
    CommandSpec { name: "HLEN", arity: 2, handler: hash::cmd_hlen },
    CommandSpec { name: "HMSET", arity: 4, handler: hash::cmd_hmset },
];

/// Find a command by name, ignoring ASCII case.
pub fn lookup(name: &[u8]) -> Option<&'static CommandSpec> {
    COMMANDS
        .iter()
        .find(|spec| spec.name.as_bytes().eq_ignore_ascii_case(name))
}

/// Decode one raw request, run it against the store and return the encoded
/// reply. Never fails: every error becomes an error reply.
pub async fn execute(request: &[u8], store: &SharedStore) -> Vec<u8> {
    let tokens = decode(request);
    dispatch(&tokens, store).await.serialize()
}

/// Run an already tokenized command. The store lock is held for exactly the
/// duration of the handler.
pub async fn dispatch(tokens: &[Vec<u8>], store: &SharedStore) -> RespValue {
    let spec = match resolve(tokens) {
        Ok(spec) => spec,
        Err(e) => return RespValue::error(e.to_string()),
    };

    let mut keyspace = store.lock().await;
    match (spec.handler)(&tokens[1..], &mut keyspace) {
        Ok(reply) => reply,
        Err(e) => RespValue::error(e.to_string()),
    }
}

fn resolve(tokens: &[Vec<u8>]) -> MinidisResult<&'static CommandSpec> {
    let name = tokens.first().ok_or(MinidisError::EmptyCommand)?;
    let spec = lookup(name).ok_or(MinidisError::UnknownCommand)?;
    if tokens.len() < spec.arity {
        return Err(MinidisError::wrong_args(spec.name));
    }
    Ok(spec)
}

/// Keys and hash fields are text. Invalid UTF-8 is refused rather than
/// replaced, so distinct byte strings never collapse onto one key.
pub fn arg_to_string(arg: &[u8]) -> MinidisResult<String> {
    String::from_utf8(arg.to_vec()).map_err(|_| MinidisError::InvalidUtf8)
}

pub fn arg_to_i64(arg: &[u8]) -> MinidisResult<i64> {
    std::str::from_utf8(arg)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(MinidisError::NotInteger)
}

/// Split `field value field value ...` arguments into pairs. An odd count is
/// an arity error for `cmd`.
pub fn field_value_pairs(args: &[Vec<u8>], cmd: &str) -> MinidisResult<Vec<(String, Vec<u8>)>> {
    if args.is_empty() || args.len() % 2 != 0 {
        return Err(MinidisError::wrong_args(cmd));
    }
    args.chunks_exact(2)
        .map(|pair| Ok((arg_to_string(&pair[0])?, pair[1].clone())))
        .collect()
}
