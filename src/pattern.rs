//! Route patterns and path matching.
//!
//! A pattern is an ordered list of segments, literal or `:name` parameter.
//! Matching is a straight segment walk: counts must agree, literals compare
//! exactly (case-sensitive), a parameter binds any non-empty segment. The
//! router scans routes in registration order and takes the first match, so
//! there is no precedence logic here at all.

use std::collections::HashMap;

/// A parsed route pattern, e.g. `/user/:userId/orders/:orderId`.
#[derive(Debug)]
pub(crate) struct Pattern {
    raw: String,
    segments: Vec<Segment>,
}

#[derive(Debug)]
enum Segment {
    Literal(String),
    Param(String),
}

impl Pattern {
    pub(crate) fn parse(path: &str) -> Self {
        let segments = split(path)
            .map(|s| match s.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_owned()),
                None => Segment::Literal(s.to_owned()),
            })
            .collect();
        Self { raw: path.to_owned(), segments }
    }

    /// The pattern as registered, prefix included.
    pub(crate) fn raw(&self) -> &str {
        &self.raw
    }

    /// Matches `path` against this pattern, binding every `:name` segment to
    /// the literal segment in the corresponding position.
    pub(crate) fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let mut params = HashMap::new();
        let mut actual = split(path);

        for expected in &self.segments {
            let segment = actual.next()?;
            match expected {
                Segment::Literal(lit) if lit == segment => {}
                Segment::Literal(_) => return None,
                Segment::Param(_) if segment.is_empty() => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), segment.to_owned());
                }
            }
        }

        // Path longer than the pattern is a miss too.
        if actual.next().is_some() {
            return None;
        }
        Some(params)
    }
}

/// Splits on `/` only — whitespace inside a segment stays part of it.
fn split(path: &str) -> impl Iterator<Item = &str> {
    path.trim_start_matches('/').split('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bind(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
        Pattern::parse(pattern).matches(path)
    }

    #[test]
    fn literal_match_is_exact() {
        assert!(bind("/hello", "/hello").is_some());
        assert!(bind("/hello", "/Hello").is_none());
        assert!(bind("/hello", "/hello/world").is_none());
        assert!(bind("/hello/world", "/hello").is_none());
    }

    #[test]
    fn root_matches_root_only() {
        assert!(bind("/", "/").is_some());
        assert!(bind("/", "/hello").is_none());
    }

    #[test]
    fn params_bind_in_position() {
        let params = bind("/user/:userId/orders/:orderId", "/user/1/orders/12345").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params["userId"], "1");
        assert_eq!(params["orderId"], "12345");
    }

    #[test]
    fn param_requires_nonempty_segment() {
        assert!(bind("/user/:id", "/user/").is_none());
        assert!(bind("/user/:id", "/user").is_none());
    }

    #[test]
    fn whitespace_is_not_a_delimiter() {
        let params = bind("/user/:userId/orders/:orderId", "/user/roni purwanto/orders/12345").unwrap();
        assert_eq!(params["userId"], "roni purwanto");
        assert_eq!(params["orderId"], "12345");
    }

    #[test]
    fn mixed_literals_and_params() {
        let params = bind("/api/:version/users", "/api/v2/users").unwrap();
        assert_eq!(params["version"], "v2");
        assert!(bind("/api/:version/users", "/api/v2/orders").is_none());
    }
}
