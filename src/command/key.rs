use crate::command::{arg_to_i64, arg_to_string};
use crate::error::{MinidisError, MinidisResult};
use crate::resp::RespValue;
use crate::store::Keyspace;

/// DEL / UNLINK key [key ...]
pub fn cmd_del(args: &[Vec<u8>], ks: &mut Keyspace) -> MinidisResult<RespValue> {
    let keys = args
        .iter()
        .map(|key| arg_to_string(key))
        .collect::<MinidisResult<Vec<_>>>()?;
    let removed = keys.iter().filter(|key| ks.del(key)).count();
    Ok(RespValue::integer(removed as i64))
}

/// KEYS [pattern]
pub fn cmd_keys(args: &[Vec<u8>], ks: &mut Keyspace) -> MinidisResult<RespValue> {
    let pattern = args.first().map(|p| arg_to_string(p)).transpose()?;
    let keys = ks.keys(pattern.as_deref());
    Ok(RespValue::bulk_array(keys))
}

pub fn cmd_type(args: &[Vec<u8>], ks: &mut Keyspace) -> MinidisResult<RespValue> {
    let key = arg_to_string(&args[0])?;
    Ok(RespValue::simple_string(ks.key_type(&key)))
}

/// EXPIRE key seconds. A non-positive TTL deletes the key.
pub fn cmd_expire(args: &[Vec<u8>], ks: &mut Keyspace) -> MinidisResult<RespValue> {
    let key = arg_to_string(&args[0])?;
    let seconds = arg_to_i64(&args[1])?;
    if ks.expire(&key, seconds) {
        Ok(RespValue::ok())
    } else {
        Err(MinidisError::NoSuchKey)
    }
}

pub fn cmd_rename(args: &[Vec<u8>], ks: &mut Keyspace) -> MinidisResult<RespValue> {
    let old = arg_to_string(&args[0])?;
    let new = arg_to_string(&args[1])?;
    ks.rename(&old, &new)?;
    Ok(RespValue::ok())
}
