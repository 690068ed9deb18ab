use crate::command::{arg_to_i64, arg_to_string};
use crate::error::MinidisResult;
use crate::resp::RespValue;
use crate::store::Keyspace;

fn bulk_or_null(value: Option<Vec<u8>>) -> RespValue {
    value.map_or_else(RespValue::null_bulk_string, RespValue::bulk_string)
}

pub fn cmd_llen(args: &[Vec<u8>], ks: &mut Keyspace) -> MinidisResult<RespValue> {
    let key = arg_to_string(&args[0])?;
    Ok(RespValue::integer(ks.llen(&key)? as i64))
}

/// LPUSH key value [value ...]. Each value is prepended in turn, so the last
/// one given ends up at the head.
pub fn cmd_lpush(args: &[Vec<u8>], ks: &mut Keyspace) -> MinidisResult<RespValue> {
    let key = arg_to_string(&args[0])?;
    let len = ks.lpush(&key, args[1..].to_vec())?;
    Ok(RespValue::integer(len as i64))
}

pub fn cmd_rpush(args: &[Vec<u8>], ks: &mut Keyspace) -> MinidisResult<RespValue> {
    let key = arg_to_string(&args[0])?;
    let len = ks.rpush(&key, args[1..].to_vec())?;
    Ok(RespValue::integer(len as i64))
}

pub fn cmd_lpop(args: &[Vec<u8>], ks: &mut Keyspace) -> MinidisResult<RespValue> {
    let key = arg_to_string(&args[0])?;
    Ok(bulk_or_null(ks.lpop(&key)?))
}

pub fn cmd_rpop(args: &[Vec<u8>], ks: &mut Keyspace) -> MinidisResult<RespValue> {
    let key = arg_to_string(&args[0])?;
    Ok(bulk_or_null(ks.rpop(&key)?))
}

/// LREM key count value
pub fn cmd_lrem(args: &[Vec<u8>], ks: &mut Keyspace) -> MinidisResult<RespValue> {
    let key = arg_to_string(&args[0])?;
    let count = arg_to_i64(&args[1])?;
    let removed = ks.lrem(&key, count, &args[2])?;
    Ok(RespValue::integer(removed as i64))
}

pub fn cmd_lindex(args: &[Vec<u8>], ks: &mut Keyspace) -> MinidisResult<RespValue> {
    let key = arg_to_string(&args[0])?;
    let index = arg_to_i64(&args[1])?;
    Ok(bulk_or_null(ks.lindex(&key, index)?))
}

/// LSET key index value
pub fn cmd_lset(args: &[Vec<u8>], ks: &mut Keyspace) -> MinidisResult<RespValue> {
    let key = arg_to_string(&args[0])?;
    let index = arg_to_i64(&args[1])?;
    ks.lset(&key, index, args[2].clone())?;
    Ok(RespValue::ok())
}
