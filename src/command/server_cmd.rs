use crate::error::MinidisResult;
use crate::resp::RespValue;
use crate::store::Keyspace;

/// PING [message]
pub fn cmd_ping(args: &[Vec<u8>], _ks: &mut Keyspace) -> MinidisResult<RespValue> {
    Ok(match args.first() {
        Some(msg) => RespValue::bulk_string(msg.clone()),
        None => RespValue::simple_string("PONG"),
    })
}

pub fn cmd_echo(args: &[Vec<u8>], _ks: &mut Keyspace) -> MinidisResult<RespValue> {
    Ok(RespValue::bulk_string(args[0].clone()))
}

pub fn cmd_flushall(_args: &[Vec<u8>], ks: &mut Keyspace) -> MinidisResult<RespValue> {
    ks.flush();
    Ok(RespValue::ok())
}
