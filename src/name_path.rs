//! Dotted field names built up while walking nested records.
//!
//! A `NamePath` is a single growable buffer. Entering a nested record appends
//! `segment.`; resolving a leaf appends the bare segment. Both return a
//! [`Mark`] that restores the buffer to its previous length, so the path in
//! the buffer always mirrors the live recursion stack.

use parking_lot::Mutex;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Separator between nested segments, e.g. `name.first`.
pub const DELIMITER: char = '.';

/// Length of the path before a push; hand it back to [`NamePath::restore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a pushed segment must be restored"]
pub struct Mark(usize);

#[derive(Debug, Default)]
pub struct NamePath {
    buf: String,
}

impl NamePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: String::with_capacity(capacity) }
    }

    /// Push `segment` followed by the delimiter, as a prefix for nested fields.
    pub fn enter_record(&mut self, segment: &str) -> Mark {
        let mark = Mark(self.buf.len());
        self.buf.push_str(segment);
        self.buf.push(DELIMITER);
        mark
    }

    /// Push `segment` as the final component of a lookup key.
    pub fn push_leaf(&mut self, segment: &str) -> Mark {
        let mark = Mark(self.buf.len());
        self.buf.push_str(segment);
        mark
    }

    pub fn restore(&mut self, mark: Mark) {
        debug_assert!(mark.0 <= self.buf.len(), "mark past end of name path");
        self.buf.truncate(mark.0);
    }

    /// The current key, e.g. `name.first` after `enter_record("name")` and `push_leaf("first")`.
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// The key `segment` would have as a leaf under the current prefix, without mutating.
    pub fn joined(&self, segment: &str) -> String {
        let mut out = String::with_capacity(self.buf.len() + segment.len());
        out.push_str(&self.buf);
        out.push_str(segment);
        out
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    fn into_buffer(self) -> String {
        self.buf
    }
}

impl fmt::Display for NamePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.buf)
    }
}

/// Free list of name-path buffers shared by concurrent decodes.
///
/// Each acquired buffer belongs to exactly one caller until its guard drops.
#[derive(Debug)]
pub struct NamePathPool {
    free: Mutex<Vec<String>>,
    capacity: usize,
    max_retained: usize,
}

impl NamePathPool {
    pub fn new(capacity: usize, max_retained: usize) -> Self {
        Self { free: Mutex::new(Vec::new()), capacity, max_retained }
    }

    /// Borrow an empty buffer. It goes back to the pool when the guard drops,
    /// whichever way the borrowing call exits.
    pub fn acquire(&self) -> PooledNamePath<'_> {
        let reused = self.free.lock().pop();
        let path = match reused {
            Some(buf) => NamePath { buf },
            None => NamePath::with_capacity(self.capacity),
        };
        PooledNamePath { path: Some(path), pool: self }
    }

    /// Number of buffers currently waiting to be reused.
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }

    fn release(&self, path: NamePath) {
        let mut buf = path.into_buffer();
        buf.clear();
        let mut free = self.free.lock();
        if free.len() < self.max_retained {
            free.push(buf);
        }
    }
}

impl Default for NamePathPool {
    fn default() -> Self {
        Self::new(64, 128)
    }
}

/// A [`NamePath`] on loan from a [`NamePathPool`].
pub struct PooledNamePath<'p> {
    path: Option<NamePath>,
    pool: &'p NamePathPool,
}

impl Deref for PooledNamePath<'_> {
    type Target = NamePath;

    fn deref(&self) -> &NamePath {
        // Only `drop` takes the path out.
        self.path.as_ref().unwrap_or_else(|| unreachable!("pooled name path used after release"))
    }
}

impl DerefMut for PooledNamePath<'_> {
    fn deref_mut(&mut self) -> &mut NamePath {
        self.path.as_mut().unwrap_or_else(|| unreachable!("pooled name path used after release"))
    }
}

impl Drop for PooledNamePath<'_> {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            self.pool.release(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn nested_push_and_restore() {
        let mut path = NamePath::new();
        let outer = path.enter_record("name");
        let leaf = path.push_leaf("first");
        assert_eq!(path.as_str(), "name.first");
        path.restore(leaf);
        assert_eq!(path.as_str(), "name.");

        let leaf = path.push_leaf("last");
        assert_eq!(path.as_str(), "name.last");
        path.restore(leaf);
        path.restore(outer);
        assert!(path.is_empty());

        let leaf = path.push_leaf("age");
        assert_eq!(path.to_string(), "age");
        path.restore(leaf);
    }

    #[test]
    fn joined_does_not_mutate() {
        let mut path = NamePath::new();
        let mark = path.enter_record("a");
        let mark2 = path.enter_record("b");
        assert_eq!(path.joined("c"), "a.b.c");
        assert_eq!(path.as_str(), "a.b.");
        path.restore(mark2);
        path.restore(mark);
    }

    #[test]
    fn pool_reuses_released_buffers() {
        let pool = NamePathPool::new(16, 2);
        {
            let mut path = pool.acquire();
            let _ = path.push_leaf("something-long-enough-to-grow-the-buffer");
        }
        assert_eq!(pool.idle(), 1);

        let path = pool.acquire();
        assert!(path.is_empty());
        assert!(path.capacity() >= 40);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn pool_bounds_retained_buffers() {
        let pool = NamePathPool::new(8, 1);
        let a = pool.acquire();
        let b = pool.acquire();
        drop(a);
        drop(b);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn buffer_returns_on_unwind() {
        let pool = NamePathPool::default();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut path = pool.acquire();
            let _ = path.push_leaf("boom");
            panic!("walk failed");
        }));
        assert!(result.is_err());
        assert_eq!(pool.idle(), 1);
    }
}
