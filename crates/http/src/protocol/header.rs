//! Ordered header storage.
//!
//! `http::HeaderMap` groups values by name, which loses the order headers
//! arrived in. [`Headers`] keeps every `(name, value)` pair exactly as it was
//! received, duplicates included, while still comparing names
//! case-insensitively.

use http::{HeaderMap, HeaderName, HeaderValue};

/// An ordered list of header fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(HeaderName, HeaderValue)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: Vec::with_capacity(capacity) }
    }

    /// Number of stored fields; duplicates are counted separately.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends a field after all existing ones.
    pub fn append(&mut self, name: HeaderName, value: HeaderValue) {
        self.entries.push((name, value));
    }

    /// Replaces every field named `name` with a single one, keeping the
    /// position of the first occurrence.
    pub fn insert(&mut self, name: HeaderName, value: HeaderValue) {
        match self.entries.iter().position(|(n, _)| *n == name) {
            Some(index) => {
                self.entries[index].1 = value;
                let mut seen = 0;
                self.entries.retain(|(n, _)| {
                    if *n != name {
                        return true;
                    }
                    seen += 1;
                    seen == 1
                });
            }
            None => self.entries.push((name, value)),
        }
    }

    /// Removes every field named `name`, returning how many were removed.
    pub fn remove<K: AsRef<[u8]>>(&mut self, name: K) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(n, _)| !name_matches(n, name.as_ref()));
        before - self.entries.len()
    }

    /// First value for `name`.
    pub fn get<K: AsRef<[u8]>>(&self, name: K) -> Option<&HeaderValue> {
        self.get_all(name).next()
    }

    /// Every value for `name`, in arrival order.
    pub fn get_all<K: AsRef<[u8]>>(&self, name: K) -> impl Iterator<Item = &HeaderValue> {
        self.entries.iter().filter(move |(n, _)| name_matches(n, name.as_ref())).map(|(_, v)| v)
    }

    /// First value for `name` if it is visible ASCII.
    pub fn get_str<K: AsRef<[u8]>>(&self, name: K) -> Option<&str> {
        self.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn contains<K: AsRef<[u8]>>(&self, name: K) -> bool {
        self.get(name).is_some()
    }

    /// Returns true if any comma separated token of any `name` field equals
    /// `token`, ignoring ASCII case.
    pub fn has_token<K: AsRef<[u8]>>(&self, name: K, token: &str) -> bool {
        self.get_all(name)
            .flat_map(|v| v.as_bytes().split(|b| *b == b','))
            .any(|t| t.trim_ascii().eq_ignore_ascii_case(token.as_bytes()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.entries.iter().map(|(n, v)| (n, v))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[inline]
fn name_matches(name: &HeaderName, other: &[u8]) -> bool {
    // HeaderName is always stored lowercase
    name.as_str().as_bytes().eq_ignore_ascii_case(other)
}

impl<'a> IntoIterator for &'a Headers {
    type Item = &'a (HeaderName, HeaderValue);
    type IntoIter = std::slice::Iter<'a, (HeaderName, HeaderValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<(HeaderName, HeaderValue)> for Headers {
    fn from_iter<T: IntoIterator<Item = (HeaderName, HeaderValue)>>(iter: T) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

/// Converts into `http::HeaderMap`; values of the same name stay in order.
impl From<Headers> for HeaderMap {
    fn from(headers: Headers) -> Self {
        let mut map = HeaderMap::with_capacity(headers.len());
        for (name, value) in headers.entries {
            map.append(name, value);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header;

    fn headers() -> Headers {
        [
            (header::HOST, HeaderValue::from_static("example.com")),
            (header::ACCEPT, HeaderValue::from_static("text/html")),
            (header::COOKIE, HeaderValue::from_static("a=1")),
            (header::ACCEPT, HeaderValue::from_static("*/*")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn keeps_duplicates_in_arrival_order() {
        let headers = headers();
        assert_eq!(headers.len(), 4);

        let accepts: Vec<_> = headers.get_all("Accept").collect();
        assert_eq!(accepts, vec!["text/html", "*/*"]);

        let names: Vec<_> = headers.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["host", "accept", "cookie", "accept"]);
    }

    #[test]
    fn lookup_ignores_case() {
        let headers = headers();
        assert_eq!(headers.get_str("HOST"), Some("example.com"));
        assert_eq!(headers.get_str("hOsT"), Some("example.com"));
        assert!(headers.contains(header::COOKIE));
        assert!(!headers.contains("content-length"));
    }

    #[test]
    fn insert_replaces_all_occurrences() {
        let mut headers = headers();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        assert_eq!(headers.len(), 3);
        let names: Vec<_> = headers.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["host", "accept", "cookie"]);
        assert_eq!(headers.get_str("accept"), Some("application/json"));
    }

    #[test]
    fn remove_and_tokens() {
        let mut headers = headers();
        headers.append(header::CONNECTION, HeaderValue::from_static("Upgrade, Keep-Alive"));

        assert!(headers.has_token("connection", "keep-alive"));
        assert!(headers.has_token("connection", "upgrade"));
        assert!(!headers.has_token("connection", "close"));

        assert_eq!(headers.remove("ACCEPT"), 2);
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn into_header_map() {
        let map: HeaderMap = headers().into();
        assert_eq!(map.len(), 4);
        let accepts: Vec<_> = map.get_all(header::ACCEPT).iter().collect();
        assert_eq!(accepts, vec!["text/html", "*/*"]);
    }
}
