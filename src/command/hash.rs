use crate::command::{arg_to_string, field_value_pairs};
use crate::error::MinidisResult;
use crate::resp::RespValue;
use crate::store::Keyspace;

/// HSET key field value [field value ...]. Replies with the number of fields
/// that did not exist before.
pub fn cmd_hset(args: &[Vec<u8>], ks: &mut Keyspace) -> MinidisResult<RespValue> {
    let key = arg_to_string(&args[0])?;
    let pairs = field_value_pairs(&args[1..], "hset")?;
    let created = ks.hset(&key, pairs)?;
    Ok(RespValue::integer(created as i64))
}

/// HMSET key field value [field value ...]
pub fn cmd_hmset(args: &[Vec<u8>], ks: &mut Keyspace) -> MinidisResult<RespValue> {
    let key = arg_to_string(&args[0])?;
    let pairs = field_value_pairs(&args[1..], "hmset")?;
    ks.hset(&key, pairs)?;
    Ok(RespValue::ok())
}

pub fn cmd_hget(args: &[Vec<u8>], ks: &mut Keyspace) -> MinidisResult<RespValue> {
    let key = arg_to_string(&args[0])?;
    let field = arg_to_string(&args[1])?;
    Ok(ks
        .hget(&key, &field)?
        .map_or_else(RespValue::null_bulk_string, RespValue::bulk_string))
}

pub fn cmd_hexists(args: &[Vec<u8>], ks: &mut Keyspace) -> MinidisResult<RespValue> {
    let key = arg_to_string(&args[0])?;
    let field = arg_to_string(&args[1])?;
    Ok(RespValue::integer(ks.hexists(&key, &field)? as i64))
}

/// HDEL key field [field ...]
pub fn cmd_hdel(args: &[Vec<u8>], ks: &mut Keyspace) -> MinidisResult<RespValue> {
    let key = arg_to_string(&args[0])?;
    let fields = args[1..]
        .iter()
        .map(|f| arg_to_string(f))
        .collect::<MinidisResult<Vec<_>>>()?;
    Ok(RespValue::integer(ks.hdel(&key, &fields)? as i64))
}

/// HGETALL key: a flat array of field, value, field, value ...
pub fn cmd_hgetall(args: &[Vec<u8>], ks: &mut Keyspace) -> MinidisResult<RespValue> {
    let key = arg_to_string(&args[0])?;
    let flat = ks
        .hgetall(&key)?
        .into_iter()
        .flat_map(|(field, value)| [field.into_bytes(), value]);
    Ok(RespValue::bulk_array(flat))
}

pub fn cmd_hkeys(args: &[Vec<u8>], ks: &mut Keyspace) -> MinidisResult<RespValue> {
    let key = arg_to_string(&args[0])?;
    Ok(RespValue::bulk_array(ks.hkeys(&key)?))
}

pub fn cmd_hvals(args: &[Vec<u8>], ks: &mut Keyspace) -> MinidisResult<RespValue> {
    let key = arg_to_string(&args[0])?;
    Ok(RespValue::bulk_array(ks.hvals(&key)?))
}

pub fn cmd_hlen(args: &[Vec<u8>], ks: &mut Keyspace) -> MinidisResult<RespValue> {
    let key = arg_to_string(&args[0])?;
    Ok(RespValue::integer(ks.hlen(&key)? as i64))
}
