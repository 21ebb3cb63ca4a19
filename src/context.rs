use crate::name_path::PooledNamePath;
use crate::sources::Sources;

/// Per-call decoding state: the request's sources with their caches, and the
/// name path of the field being visited.
///
/// Created by [`Decoder`](crate::Decoder) for one call and dropped at its end,
/// which hands the name-path buffer back to the pool.
pub struct DecodeContext<'a> {
    pub(crate) sources: Sources<'a>,
    pub(crate) path: PooledNamePath<'a>,
}

impl<'a> DecodeContext<'a> {
    pub(crate) fn new(sources: Sources<'a>, path: PooledNamePath<'a>) -> Self {
        Self { sources, path }
    }

    /// Dotted prefix of the record currently being walked, e.g. `name.`.
    pub fn current_path(&self) -> &str {
        self.path.as_str()
    }
}
