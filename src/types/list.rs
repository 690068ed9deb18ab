use std::collections::VecDeque;

/// List value, backed by a VecDeque for cheap pushes and pops at both ends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RedisList {
    data: VecDeque<Vec<u8>>,
}

impl RedisList {
    pub fn new() -> Self {
        RedisList {
            data: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn lpush(&mut self, value: Vec<u8>) {
        self.data.push_front(value);
    }

    pub fn rpush(&mut self, value: Vec<u8>) {
        self.data.push_back(value);
    }

    pub fn lpop(&mut self) -> Option<Vec<u8>> {
        self.data.pop_front()
    }

    pub fn rpop(&mut self) -> Option<Vec<u8>> {
        self.data.pop_back()
    }

    pub fn lindex(&self, index: i64) -> Option<&Vec<u8>> {
        self.data.get(self.resolve_index(index)?)
    }

    /// Replace the element at `index`. Returns false when out of range.
    pub fn lset(&mut self, index: i64, value: Vec<u8>) -> bool {
        match self.resolve_index(index) {
            Some(idx) => {
                self.data[idx] = value;
                true
            }
            None => false,
        }
    }

    /// Remove occurrences of `value`: all when `count` is 0, the first `count`
    /// from the head when positive, the last `-count` from the tail when
    /// negative. Returns how many were removed.
    pub fn lrem(&mut self, count: i64, value: &[u8]) -> usize {
        let limit = match count.unsigned_abs() {
            0 => usize::MAX,
            n => usize::try_from(n).unwrap_or(usize::MAX),
        };

        let mut positions: Vec<usize> = if count < 0 {
            (0..self.data.len())
                .rev()
                .filter(|&i| self.data[i] == value)
                .take(limit)
                .collect()
        } else {
            (0..self.data.len())
                .filter(|&i| self.data[i] == value)
                .take(limit)
                .collect()
        };

        // Highest index first so earlier removals don't shift later ones.
        positions.sort_unstable_by(|a, b| b.cmp(a));
        for &i in &positions {
            self.data.remove(i);
        }
        positions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vec<u8>> {
        self.data.iter()
    }

    /// Map a possibly negative index onto `[0, len)`.
    fn resolve_index(&self, index: i64) -> Option<usize> {
        let len = self.data.len() as i64;
        let idx = if index < 0 { len + index } else { index };
        (0..len).contains(&idx).then_some(idx as usize)
    }
}

impl FromIterator<Vec<u8>> for RedisList {
    fn from_iter<I: IntoIterator<Item = Vec<u8>>>(iter: I) -> Self {
        RedisList {
            data: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> RedisList {
        items.iter().map(|s| s.as_bytes().to_vec()).collect()
    }

    fn contents(l: &RedisList) -> Vec<String> {
        l.iter().map(|v| String::from_utf8_lossy(v).into_owned()).collect()
    }

    #[test]
    fn test_push_pop_ends() {
        let mut l = RedisList::new();
        l.lpush(b"a".to_vec());
        l.lpush(b"b".to_vec());
        l.rpush(b"c".to_vec());
        assert_eq!(contents(&l), ["b", "a", "c"]);
        assert_eq!(l.rpop(), Some(b"c".to_vec()));
        assert_eq!(l.lpop(), Some(b"b".to_vec()));
        assert_eq!(l.len(), 1);
    }

    #[test]
    fn test_lindex_negative_and_out_of_range() {
        let l = list(&["a", "b", "c"]);
        assert_eq!(l.lindex(0), Some(&b"a".to_vec()));
        assert_eq!(l.lindex(-1), Some(&b"c".to_vec()));
        assert_eq!(l.lindex(-3), Some(&b"a".to_vec()));
        assert_eq!(l.lindex(3), None);
        assert_eq!(l.lindex(-4), None);
    }

    #[test]
    fn test_lset_mutates_only_in_range() {
        let mut l = list(&["a", "b"]);
        assert!(l.lset(0, b"x".to_vec()));
        assert!(l.lset(-1, b"y".to_vec()));
        assert!(!l.lset(2, b"z".to_vec()));
        assert!(!l.lset(-3, b"z".to_vec()));
        assert_eq!(contents(&l), ["x", "y"]);
    }

    #[test]
    fn test_lrem_all() {
        let mut l = list(&["v", "a", "v", "b", "v"]);
        assert_eq!(l.lrem(0, b"v"), 3);
        assert_eq!(contents(&l), ["a", "b"]);
    }

    #[test]
    fn test_lrem_from_head() {
        let mut l = list(&["v", "a", "v", "b", "v"]);
        assert_eq!(l.lrem(2, b"v"), 2);
        assert_eq!(contents(&l), ["a", "b", "v"]);
    }

    #[test]
    fn test_lrem_from_tail() {
        let mut l = list(&["v", "a", "v", "b", "v"]);
        assert_eq!(l.lrem(-2, b"v"), 2);
        assert_eq!(contents(&l), ["v", "a", "b"]);
    }

    #[test]
    fn test_lrem_missing_value() {
        let mut l = list(&["a"]);
        assert_eq!(l.lrem(1, b"zz"), 0);
        assert_eq!(l.len(), 1);
    }
}
