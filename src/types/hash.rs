use std::collections::HashMap;

/// Hash value: unique field names mapped to byte values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RedisHash {
    data: HashMap<String, Vec<u8>>,
}

impl RedisHash {
    pub fn new() -> Self {
        RedisHash {
            data: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&Vec<u8>> {
        self.data.get(field)
    }

    /// Set a field. Returns true if the field was created rather than updated.
    pub fn set(&mut self, field: String, value: Vec<u8>) -> bool {
        self.data.insert(field, value).is_none()
    }

    pub fn del(&mut self, field: &str) -> bool {
        self.data.remove(field).is_some()
    }

    pub fn exists(&self, field: &str) -> bool {
        self.data.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<u8>)> {
        self.data.iter()
    }
}

impl FromIterator<(String, Vec<u8>)> for RedisHash {
    fn from_iter<I: IntoIterator<Item = (String, Vec<u8>)>>(iter: I) -> Self {
        RedisHash {
            data: iter.into_iter().collect(),
        }
    }
}
