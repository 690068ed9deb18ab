/// Redis-style glob matching for KEYS patterns.
/// Supports `*`, `?`, `[abc]`, `[^a-z]` and `\` escapes.
pub fn glob_match(pattern: &str, subject: &str) -> bool {
    matches(pattern.as_bytes(), subject.as_bytes())
}

fn matches(mut p: &[u8], mut s: &[u8]) -> bool {
    // Resume point of the most recent `*`: (pattern after it, subject position).
    let mut backtrack: Option<(&[u8], &[u8])> = None;

    loop {
        let step = match p.first() {
            Some(b'*') => {
                while p.first() == Some(&b'*') {
                    p = &p[1..];
                }
                if p.is_empty() {
                    return true;
                }
                backtrack = Some((p, s));
                continue;
            }
            Some(_) if s.is_empty() => None,
            Some(b'?') => Some(1),
            Some(b'[') => match_class(&p[1..], s[0]).map(|used| used + 1),
            Some(b'\\') if p.len() > 1 => (p[1] == s[0]).then_some(2),
            Some(&c) => (c == s[0]).then_some(1),
            None if s.is_empty() => return true,
            None => None,
        };

        match step {
            Some(used) => {
                p = &p[used..];
                s = &s[1..];
            }
            None => match backtrack {
                Some((bp, bs)) if !bs.is_empty() => {
                    backtrack = Some((bp, &bs[1..]));
                    p = bp;
                    s = &bs[1..];
                }
                _ => return false,
            },
        }
    }
}

/// Match `c` against a bracket class whose body starts at `class` (just past
/// the `[`). Returns the number of pattern bytes consumed, including the
/// closing `]`, when `c` matches.
fn match_class(class: &[u8], c: u8) -> Option<usize> {
    let (negate, start) = match class.first() {
        Some(b'^') => (true, 1),
        _ => (false, 0),
    };

    let mut i = start;
    let mut hit = false;
    while i < class.len() && class[i] != b']' {
        if class[i] == b'\\' && i + 1 < class.len() {
            hit |= class[i + 1] == c;
            i += 2;
        } else if i + 2 < class.len() && class[i + 1] == b'-' && class[i + 2] != b']' {
            let (lo, hi) = (class[i].min(class[i + 2]), class[i].max(class[i + 2]));
            hit |= (lo..=hi).contains(&c);
            i += 3;
        } else {
            hit |= class[i] == c;
            i += 1;
        }
    }

    // Unterminated class never matches.
    if i >= class.len() {
        return None;
    }
    (hit != negate).then_some(i + 1)
}
