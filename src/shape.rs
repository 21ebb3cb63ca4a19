//! Static shape descriptors for request records.
//!
//! A record lists its source-annotated fields once, in declaration order,
//! through [`request_shape!`](crate::request_shape). Fields that are not listed
//! are left to the JSON body decode and never visited by the walker.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::context::DecodeContext;
use crate::errors::Result;

/// The request facet a field is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Query,
    Path,
    Header,
    Cookie,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Query => "query",
            Source::Path => "path",
            Source::Header => "header",
            Source::Cookie => "cookie",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Source annotations declared on one field.
///
/// More than one may be set; [`Tags::resolve`] picks the winner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tags {
    pub query: Option<&'static str>,
    pub path: Option<&'static str>,
    pub header: Option<&'static str>,
    pub cookie: Option<&'static str>,
}

impl Tags {
    pub const fn new() -> Self {
        Self { query: None, path: None, header: None, cookie: None }
    }

    pub const fn query(mut self, name: &'static str) -> Self {
        self.query = Some(name);
        self
    }

    pub const fn path(mut self, name: &'static str) -> Self {
        self.path = Some(name);
        self
    }

    pub const fn header(mut self, name: &'static str) -> Self {
        self.header = Some(name);
        self
    }

    pub const fn cookie(mut self, name: &'static str) -> Self {
        self.cookie = Some(name);
        self
    }

    /// The effective annotation: query, then path, then header, then cookie.
    /// Empty names count as absent.
    pub fn resolve(&self) -> Option<(Source, &'static str)> {
        let candidates = [
            (Source::Query, self.query),
            (Source::Path, self.path),
            (Source::Header, self.header),
            (Source::Cookie, self.cookie),
        ];
        candidates
            .into_iter()
            .find_map(|(source, name)| name.filter(|n| !n.is_empty()).map(|n| (source, n)))
    }
}

/// A mutable view of one field, as the walker and coercion see it.
pub enum Slot<'a> {
    /// A nested record; the walker recurses into it.
    Record(&'a mut dyn Walk),
    Scalar(ScalarSlot<'a>),
    /// An optional value; allocated on first write.
    Pointer(&'a mut dyn PointerSlot),
    /// Anything the coercion step cannot write, named for error messages.
    Unsupported(&'static str),
}

impl Slot<'_> {
    /// Short description used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Slot::Record(_) => "record",
            Slot::Scalar(scalar) => scalar.type_name(),
            Slot::Pointer(_) => "option",
            Slot::Unsupported(name) => *name,
        }
    }
}

/// Primitive targets of coercion.
pub enum ScalarSlot<'a> {
    Str(&'a mut String),
    I8(&'a mut i8),
    I16(&'a mut i16),
    I32(&'a mut i32),
    I64(&'a mut i64),
    I128(&'a mut i128),
    Isize(&'a mut isize),
    U8(&'a mut u8),
    U16(&'a mut u16),
    U32(&'a mut u32),
    U64(&'a mut u64),
    U128(&'a mut u128),
    Usize(&'a mut usize),
    F32(&'a mut f32),
    F64(&'a mut f64),
    Bool(&'a mut bool),
}

impl ScalarSlot<'_> {
    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarSlot::Str(_) => "String",
            ScalarSlot::I8(_) => "i8",
            ScalarSlot::I16(_) => "i16",
            ScalarSlot::I32(_) => "i32",
            ScalarSlot::I64(_) => "i64",
            ScalarSlot::I128(_) => "i128",
            ScalarSlot::Isize(_) => "isize",
            ScalarSlot::U8(_) => "u8",
            ScalarSlot::U16(_) => "u16",
            ScalarSlot::U32(_) => "u32",
            ScalarSlot::U64(_) => "u64",
            ScalarSlot::U128(_) => "u128",
            ScalarSlot::Usize(_) => "usize",
            ScalarSlot::F32(_) => "f32",
            ScalarSlot::F64(_) => "f64",
            ScalarSlot::Bool(_) => "bool",
        }
    }
}

/// Types that can appear as source-annotated fields.
pub trait Field {
    fn slot(&mut self) -> Slot<'_>;
}

/// Object-safe access to an `Option<T>` field.
pub trait PointerSlot {
    fn is_none(&self) -> bool;
    /// Whether the pointee, through any further options, is a record.
    fn holds_record(&self) -> bool;
    /// Fill with `T::default()` if empty, then expose the pointee.
    fn get_or_insert(&mut self) -> Slot<'_>;
}

impl<T: Field + Default> PointerSlot for Option<T> {
    fn is_none(&self) -> bool {
        Option::is_none(self)
    }

    fn holds_record(&self) -> bool {
        match T::default().slot() {
            Slot::Record(_) => true,
            Slot::Pointer(inner) => inner.holds_record(),
            _ => false,
        }
    }

    fn get_or_insert(&mut self) -> Slot<'_> {
        self.get_or_insert_with(T::default).slot()
    }
}

impl<T: Field + Default> Field for Option<T> {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Pointer(self)
    }
}

macro_rules! scalar_fields {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Field for $ty {
                fn slot(&mut self) -> Slot<'_> {
                    Slot::Scalar(ScalarSlot::$variant(self))
                }
            }
        )*
    };
}

scalar_fields! {
    String => Str,
    i8 => I8, i16 => I16, i32 => I32, i64 => I64, i128 => I128, isize => Isize,
    u8 => U8, u16 => U16, u32 => U32, u64 => U64, u128 => U128, usize => Usize,
    f32 => F32, f64 => F64,
    bool => Bool,
}

impl Field for char {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Unsupported("char")
    }
}

impl<T> Field for Vec<T> {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Unsupported("Vec")
    }
}

impl<K, V, S> Field for HashMap<K, V, S> {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Unsupported("HashMap")
    }
}

impl<K, V> Field for BTreeMap<K, V> {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Unsupported("BTreeMap")
    }
}

/// A record whose annotated fields are described by a static [`RecordShape`].
///
/// Implemented by [`request_shape!`](crate::request_shape); the macro also
/// implements [`Field`] so the record can be nested in other records.
pub trait Record: 'static {
    fn shape() -> &'static RecordShape<Self>
    where
        Self: Sized;
}

pub struct RecordShape<T: 'static> {
    pub type_name: &'static str,
    pub fields: &'static [FieldShape<T>],
}

impl<T: 'static> RecordShape<T> {
    /// Annotated fields in declaration order, with their effective source.
    pub fn resolved_fields(&self) -> impl Iterator<Item = (&'static str, Source, &'static str)> + '_ {
        self.fields
            .iter()
            .filter_map(|field| field.tags.resolve().map(|(source, name)| (field.ident, source, name)))
    }
}

/// One annotated field: its Rust identifier, its tags, and how to reach it.
pub struct FieldShape<T> {
    pub ident: &'static str,
    pub tags: Tags,
    pub access: fn(&mut T) -> Slot<'_>,
}

/// Object-safe entry into a record for the walker.
pub trait Walk {
    fn type_name(&self) -> &'static str;
    fn walk(&mut self, cx: &mut DecodeContext<'_>) -> Result<()>;
}

impl<T: Record> Walk for T {
    fn type_name(&self) -> &'static str {
        T::shape().type_name
    }

    fn walk(&mut self, cx: &mut DecodeContext<'_>) -> Result<()> {
        cx.walk_record(self)
    }
}

/// Declare which request facet feeds each field of a record.
///
/// ```
/// use http_request_extraction::request_shape;
///
/// #[derive(Debug, Default)]
/// struct FullName {
///     first: String,
///     last: String,
///     middle: Option<String>,
/// }
///
/// #[derive(Debug, Default)]
/// struct Search {
///     name: FullName,
///     page: u32,
///     token: String,
/// }
///
/// request_shape! {
///     FullName {
///         first => query("first"),
///         last => query("last"),
///         middle => query("middle"),
///     }
/// }
///
/// request_shape! {
///     Search {
///         name => query("name"),
///         page => query("page"),
///         token => header("Authorization") cookie("token"),
///     }
/// }
/// ```
///
/// A field may carry several tags; the first of query, path, header, cookie wins.
#[macro_export]
macro_rules! request_shape {
    ($record:ty { $( $field:ident => $( $source:ident ( $name:literal ) )+ ),* $(,)? }) => {
        impl $crate::Record for $record {
            fn shape() -> &'static $crate::RecordShape<Self> {
                static SHAPE: $crate::RecordShape<$record> = $crate::RecordShape {
                    type_name: stringify!($record),
                    fields: &[
                        $(
                            $crate::FieldShape {
                                ident: stringify!($field),
                                tags: $crate::Tags::new() $( .$source($name) )+,
                                access: {
                                    fn access(record: &mut $record) -> $crate::Slot<'_> {
                                        $crate::Field::slot(&mut record.$field)
                                    }
                                    access
                                },
                            },
                        )*
                    ],
                };
                &SHAPE
            }
        }

        impl $crate::Field for $record {
            fn slot(&mut self) -> $crate::Slot<'_> {
                $crate::Slot::Record(self)
            }
        }
    };
}
