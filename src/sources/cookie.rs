// src/sources/cookie.rs
use http::header::{HeaderMap, COOKIE};

/// Cookies found so far in one request, plus a way back to the raw headers.
///
/// A name is looked up in `resolved` first; a miss rescans the `Cookie`
/// headers and remembers the hit. Misses are not remembered.
pub(crate) struct CookieJar<'a> {
    headers: &'a HeaderMap,
    resolved: Vec<(String, String)>,
    scans: usize,
}

impl<'a> CookieJar<'a> {
    pub(crate) fn new(headers: &'a HeaderMap) -> Self {
        Self { headers, resolved: Vec::new(), scans: 0 }
    }

    pub(crate) fn get(&mut self, name: &str) -> Option<&str> {
        if let Some(pos) = self.resolved.iter().position(|(n, _)| n == name) {
            return Some(&self.resolved[pos].1);
        }
        let value = self.scan(name)?;
        self.resolved.push((name.to_owned(), value));
        self.resolved.last().map(|(_, v)| v.as_str())
    }

    /// Times the raw headers have been scanned.
    #[cfg(test)]
    pub(crate) fn scans(&self) -> usize {
        self.scans
    }

    fn scan(&mut self, name: &str) -> Option<String> {
        self.scans += 1;
        tracing::trace!(cookie = name, scans = self.scans, "scanning cookie headers");
        self.headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|line| line.to_str().ok())
            .flat_map(|line| line.trim().split(';'))
            .filter_map(parse_pair)
            .find(|(n, _)| *n == name)
            .map(|(_, value)| value.to_owned())
    }
}

/// Split one `name=value` pair, dropping it if either half is malformed.
fn parse_pair(part: &str) -> Option<(&str, &str)> {
    let part = part.trim();
    if part.is_empty() {
        return None;
    }
    let (name, value) = part.split_once('=').unwrap_or((part, ""));
    let name = name.trim();
    if !is_token(name) {
        return None;
    }
    Some((name, parse_value(value)?))
}

fn parse_value(raw: &str) -> Option<&str> {
    let raw = match raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
        Some(inner) => inner,
        None => raw,
    };
    raw.bytes().all(is_cookie_value_byte).then_some(raw)
}

fn is_token(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}

// Spaces and commas are tolerated inside values.
fn is_cookie_value_byte(b: u8) -> bool {
    (0x20..0x7f).contains(&b) && b != b'"' && b != b';' && b != b'\\'
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use pretty_assertions::assert_eq;

    fn headers(lines: &[&'static str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for line in lines {
            map.append(COOKIE, HeaderValue::from_static(*line));
        }
        map
    }

    #[test]
    fn pairs_are_trimmed_and_validated() {
        assert_eq!(parse_pair(" sid=abc "), Some(("sid", "abc")));
        assert_eq!(parse_pair("quoted=\"v 1\""), Some(("quoted", "v 1")));
        assert_eq!(parse_pair("flag"), Some(("flag", "")));
        assert_eq!(parse_pair("bad name=x"), None);
        assert_eq!(parse_pair("back=sl\\ash"), None);
        assert_eq!(parse_pair(""), None);
    }

    #[test]
    fn finds_cookie_across_header_lines() {
        let map = headers(&["a=1; b=2", "c=3"]);
        let mut jar = CookieJar::new(&map);
        assert_eq!(jar.get("c"), Some("3"));
        assert_eq!(jar.get("a"), Some("1"));
        assert_eq!(jar.get("missing"), None);
    }

    #[test]
    fn first_occurrence_wins() {
        let map = headers(&["dup=first; dup=second"]);
        let mut jar = CookieJar::new(&map);
        assert_eq!(jar.get("dup"), Some("first"));
    }

    #[test]
    fn repeated_lookups_hit_the_cache() {
        let map = headers(&["session=xyz; theme=dark"]);
        let mut jar = CookieJar::new(&map);

        assert_eq!(jar.get("session"), Some("xyz"));
        assert_eq!(jar.scans(), 1);
        assert_eq!(jar.get("session"), Some("xyz"));
        assert_eq!(jar.scans(), 1);

        assert_eq!(jar.get("theme"), Some("dark"));
        assert_eq!(jar.scans(), 2);
    }

    #[test]
    fn misses_rescan_every_time() {
        let map = headers(&["a=1"]);
        let mut jar = CookieJar::new(&map);
        assert_eq!(jar.get("nope"), None);
        assert_eq!(jar.get("nope"), None);
        assert_eq!(jar.scans(), 2);
    }
}
