use http::{Extensions, HeaderMap, Method, Request, Uri};
use std::borrow::Cow;
use std::collections::HashMap;

use crate::shape::Source;

mod cookie;

use cookie::CookieJar;

/// The parts of a request that sources and path lookups may read.
#[derive(Clone, Copy, Debug)]
pub struct RequestHead<'a> {
    pub method: &'a Method,
    pub uri: &'a Uri,
    pub headers: &'a HeaderMap,
    pub extensions: &'a Extensions,
}

impl<'a> RequestHead<'a> {
    pub fn of<B>(request: &'a Request<B>) -> Self {
        Self {
            method: request.method(),
            uri: request.uri(),
            headers: request.headers(),
            extensions: request.extensions(),
        }
    }
}

/// Trait for pluggable path-variable lookup, supplied by whatever routes the request.
pub trait PathLookup: Send + Sync {
    fn lookup(&self, request: &RequestHead<'_>, name: &str) -> Option<String>;
}

impl<F> PathLookup for F
where
    F: Fn(&RequestHead<'_>, &str) -> Option<String> + Send + Sync,
{
    fn lookup(&self, request: &RequestHead<'_>, name: &str) -> Option<String> {
        self(request, name)
    }
}

/// Path variables captured by a router, stored in the request extensions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathParams {
    params: Vec<(String, String)>,
}

impl PathParams {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = PathParams::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

pub mod builtins {
    use super::*;

    /// Never finds a path variable. The default when no router is wired in.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct NoPathParams;
    impl PathLookup for NoPathParams {
        fn lookup(&self, _request: &RequestHead<'_>, _name: &str) -> Option<String> { None }
    }

    /// Reads [`PathParams`] from the request extensions.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct ExtensionPathParams;
    impl PathLookup for ExtensionPathParams {
        fn lookup(&self, request: &RequestHead<'_>, name: &str) -> Option<String> {
            request.extensions.get::<PathParams>()?.get(name).map(str::to_owned)
        }
    }
}

/// Per-call value lookup across the four request facets.
///
/// The query table is parsed on first use; cookies are cached as found.
pub(crate) struct Sources<'a> {
    head: RequestHead<'a>,
    path_lookup: &'a dyn PathLookup,
    query: Option<HashMap<String, Vec<String>>>,
    cookies: CookieJar<'a>,
}

impl<'a> Sources<'a> {
    pub(crate) fn new(head: RequestHead<'a>, path_lookup: &'a dyn PathLookup) -> Self {
        Self { head, path_lookup, query: None, cookies: CookieJar::new(head.headers) }
    }

    /// Raw value for `name`, or `None` when the facet does not carry it.
    ///
    /// Headers are always present: a missing header reads as the empty string.
    pub(crate) fn resolve(&mut self, source: Source, name: &str) -> Option<Cow<'_, str>> {
        match source {
            Source::Query => self.query_value(name).map(Cow::Borrowed),
            Source::Path => self.path_lookup.lookup(&self.head, name).map(Cow::Owned),
            Source::Header => Some(self.header_value(name)),
            Source::Cookie => self.cookies.get(name).map(Cow::Borrowed),
        }
    }

    fn query_value(&mut self, name: &str) -> Option<&str> {
        let uri = self.head.uri;
        let table = self.query.get_or_insert_with(|| parse_query(uri.query().unwrap_or_default()));
        table.get(name)?.first().map(String::as_str)
    }

    fn header_value(&self, name: &str) -> Cow<'a, str> {
        match self.head.headers.get(name) {
            Some(value) => match value.to_str() {
                Ok(text) => Cow::Borrowed(text),
                Err(_) => String::from_utf8_lossy(value.as_bytes()),
            },
            None => Cow::Borrowed(""),
        }
    }

    #[cfg(test)]
    pub(crate) fn cookie_scans(&self) -> usize {
        self.cookies.scans()
    }
}

/// Split a raw query string into a multi-valued table. Keys are kept literal,
/// so `name.first` is a single key.
fn parse_query(raw: &str) -> HashMap<String, Vec<String>> {
    let mut table: HashMap<String, Vec<String>> = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        table.entry(key.into_owned()).or_default().push(value.into_owned());
    }
    tracing::trace!(keys = table.len(), "parsed query string");
    table
}
