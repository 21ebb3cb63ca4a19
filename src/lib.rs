//! Decode HTTP requests into typed records.
//!
//! A record declares, per field, which facet of the request supplies the
//! value: the query string, a path variable, a header, or a cookie. Fields
//! without such an annotation are filled by a whole-body JSON decode when the
//! request's `Content-Type` is exactly `application/json`.
//!
//! ```
//! use http::Request;
//! use http_request_extraction::{request_shape, Decoder};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Default, Deserialize)]
//! #[serde(default)]
//! struct FullName {
//!     first: String,
//!     last: String,
//! }
//!
//! #[derive(Debug, Default, Deserialize)]
//! #[serde(default)]
//! struct Input {
//!     name: FullName,
//!     age: i32,
//! }
//!
//! request_shape! { FullName { first => query("first"), last => query("last") } }
//! request_shape! { Input { name => query("name"), age => query("age") } }
//!
//! let request = Request::get("/?name.first=John&name.last=Doe&age=30").body(()).unwrap();
//! let mut input = Input::default();
//! Decoder::default().decode_sources(&request, &mut input).unwrap();
//! assert_eq!(input.name.first, "John");
//! assert_eq!(input.age, 30);
//! ```

pub mod errors;
pub mod context;
pub mod engine;
pub mod name_path;
pub mod shape;
pub mod sources;
mod coerce;

use http::Request;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, OnceLock};

use context::DecodeContext;
use errors::Result;
use name_path::NamePathPool;
use sources::builtins::NoPathParams;
use sources::{RequestHead, Sources};

pub use engine::{is_json_request, JSON_MEDIA_TYPE};
pub use errors::{DecodeError, ErrorKind, NumberError};
pub use shape::{Field, FieldShape, PointerSlot, Record, RecordShape, ScalarSlot, Slot, Source, Tags, Walk};
pub use sources::builtins::ExtensionPathParams;
pub use sources::{PathLookup, PathParams};

/// Decodes requests into records. Immutable once built; share it freely.
pub struct Decoder {
    path_lookup: Arc<dyn PathLookup>,
    pool: NamePathPool,
}

impl Decoder {
    pub fn builder() -> DecoderBuilder {
        DecoderBuilder::default()
    }

    /// Decode the JSON body (when the content type says so), then every
    /// source-annotated field of `dest`.
    ///
    /// A body that fails to decode aborts before any annotated field is read.
    pub fn unmarshal<B, T>(&self, request: &Request<B>, dest: &mut T) -> Result<()>
    where
        B: AsRef<[u8]>,
        T: Field + Serialize + DeserializeOwned,
    {
        let json = is_json_request(request);
        tracing::debug!(
            destination = std::any::type_name::<T>(),
            json,
            "unmarshalling request"
        );
        if json {
            engine::decode_body(request.body().as_ref(), dest).inspect_err(|err| {
                tracing::debug!(error = %err, "request body is not valid JSON");
            })?;
        }
        self.decode_sources(request, dest)
    }

    /// Decode only the source-annotated fields of `dest`; the body is not read.
    pub fn decode_sources<B, T>(&self, request: &Request<B>, dest: &mut T) -> Result<()>
    where
        T: Field,
    {
        let sources = Sources::new(RequestHead::of(request), self.path_lookup.as_ref());
        let mut cx = DecodeContext::new(sources, self.pool.acquire());
        cx.walk_destination(dest.slot()).inspect_err(|err| {
            tracing::debug!(error = %err, "request decode failed");
        })
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder").field("pool", &self.pool).finish_non_exhaustive()
    }
}

/// Configuration for a [`Decoder`].
pub struct DecoderBuilder {
    path_lookup: Arc<dyn PathLookup>,
    name_path_capacity: usize,
    max_pooled_buffers: usize,
}

impl Default for DecoderBuilder {
    fn default() -> Self {
        Self {
            path_lookup: Arc::new(NoPathParams),
            name_path_capacity: 64,
            max_pooled_buffers: 128,
        }
    }
}

impl DecoderBuilder {
    /// How path-annotated fields find their values. Defaults to never finding one.
    pub fn path_lookup(mut self, lookup: impl PathLookup + 'static) -> Self {
        self.path_lookup = Arc::new(lookup);
        self
    }

    /// Initial capacity of each freshly allocated name-path buffer.
    pub fn name_path_capacity(mut self, capacity: usize) -> Self {
        self.name_path_capacity = capacity;
        self
    }

    /// Buffers kept for reuse between calls; extras are freed on return.
    pub fn max_pooled_buffers(mut self, max: usize) -> Self {
        self.max_pooled_buffers = max;
        self
    }

    pub fn build(self) -> Decoder {
        Decoder {
            path_lookup: self.path_lookup,
            pool: NamePathPool::new(self.name_path_capacity, self.max_pooled_buffers),
        }
    }
}

static GLOBAL: OnceLock<Decoder> = OnceLock::new();

/// Returned by [`install`] when a process-wide decoder is already in place.
#[derive(Debug, thiserror::Error)]
#[error("a process-wide decoder is already installed")]
pub struct AlreadyInstalled(pub Decoder);

/// Set the decoder used by [`unmarshal`]. Succeeds at most once per process,
/// and fails if [`unmarshal`] already ran with the default.
pub fn install(decoder: Decoder) -> std::result::Result<(), AlreadyInstalled> {
    GLOBAL.set(decoder).map_err(AlreadyInstalled)
}

/// The installed decoder, or a default one if none was installed.
pub fn global() -> &'static Decoder {
    GLOBAL.get_or_init(Decoder::default)
}

/// Convenience: [`Decoder::unmarshal`] with the process-wide decoder.
pub fn unmarshal<B, T>(request: &Request<B>, dest: &mut T) -> Result<()>
where
    B: AsRef<[u8]>,
    T: Field + Serialize + DeserializeOwned,
{
    global().unmarshal(request, dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Counter {
        hits: u32,
        misses: u32,
    }

    crate::request_shape! {
        Counter {
            hits => query("hits"),
            misses => header("X-Misses"),
        }
    }

    #[test]
    fn name_path_returns_to_pool_after_failure() {
        let decoder = Decoder::default();
        assert_eq!(decoder.pool.idle(), 0);

        let req = Request::get("/?hits=3").header("X-Misses", "many").body(()).unwrap();
        let mut counter = Counter::default();
        let err = decoder.decode_sources(&req, &mut counter).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidNumber);
        assert_eq!(counter.hits, 3);
        assert_eq!(decoder.pool.idle(), 1);

        let req = Request::get("/?hits=4").header("X-Misses", "2").body(()).unwrap();
        decoder.decode_sources(&req, &mut counter).unwrap();
        assert_eq!((counter.hits, counter.misses), (4, 2));
        assert_eq!(decoder.pool.idle(), 1);
    }
}
