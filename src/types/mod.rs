pub mod hash;
pub mod list;

/// The value held by a key. A key holds exactly one of these at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum RedisValue {
    String(Vec<u8>),
    List(list::RedisList),
    Hash(hash::RedisHash),
}

impl RedisValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            RedisValue::String(_) => "string",
            RedisValue::List(_) => "list",
            RedisValue::Hash(_) => "hash",
        }
    }

    pub fn as_string(&self) -> Option<&Vec<u8>> {
        match self {
            RedisValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&list::RedisList> {
        match self {
            RedisValue::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut list::RedisList> {
        match self {
            RedisValue::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_hash(&self) -> Option<&hash::RedisHash> {
        match self {
            RedisValue::Hash(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_hash_mut(&mut self) -> Option<&mut hash::RedisHash> {
        match self {
            RedisValue::Hash(h) => Some(h),
            _ => None,
        }
    }
}
