use crate::command::arg_to_string;
use crate::error::MinidisResult;
use crate::resp::RespValue;
use crate::store::Keyspace;

/// SET key value. Overwrites any type and clears the deadline.
pub fn cmd_set(args: &[Vec<u8>], ks: &mut Keyspace) -> MinidisResult<RespValue> {
    let key = arg_to_string(&args[0])?;
    ks.set_string(&key, args[1].clone());
    Ok(RespValue::ok())
}

/// GET key. A key of another type reads as absent.
pub fn cmd_get(args: &[Vec<u8>], ks: &mut Keyspace) -> MinidisResult<RespValue> {
    let key = arg_to_string(&args[0])?;
    Ok(match ks.get_string(&key) {
        Ok(Some(value)) => RespValue::bulk_string(value.clone()),
        Ok(None) | Err(_) => RespValue::null_bulk_string(),
    })
}
