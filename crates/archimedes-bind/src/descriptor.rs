//! Target type metadata.
//!
//! A bind target is either a record with named fields, described by a static
//! list of [`FieldDescriptor`]s, or an opaque value (scalar, sequence, map)
//! for which field-level semantics do not apply. `#[derive(Bind)]` generates
//! the descriptor list at compile time, so no per-request introspection is
//! needed.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Intermediate key/value representation produced by the collectors.
///
/// Keys keep insertion order.
pub type ValueMap = serde_json::Map<String, Value>;

/// Declared type of a record field, as far as coercion and error messages
/// are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Signed integer.
    Int,
    /// Unsigned integer.
    Uint,
    /// Floating point number.
    Float,
    /// Boolean.
    Bool,
    /// Text.
    String,
    /// Sequence with the given element kind.
    Array(&'static FieldKind),
    /// String-keyed map with the given value kind.
    Object(&'static FieldKind),
    /// Any other type, identified by its name. Records deriving [`Bind`]
    /// link their own descriptors through [`Nested`].
    Named(&'static str, Nested),
}

impl FieldKind {
    /// Short label used in `"<label> type expected"` messages.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Named(name, _) => *name,
        }
    }

    /// Descriptors of the record this kind names, if it is one.
    #[must_use]
    pub fn nested_fields(&self) -> Option<&'static [FieldDescriptor]> {
        match self {
            Self::Named(_, nested) => nested.fields(),
            _ => None,
        }
    }
}

/// Link from a field to the shape of its declared type.
///
/// `#[derive(Bind)]` fills it in for every field whose type is concrete, so
/// weak typing and unknown-key checks reach nested records. Types that do
/// not implement [`Bind`] resolve to [`TargetShape::Opaque`].
#[derive(Clone, Copy)]
pub struct Nested(Option<fn() -> TargetShape>);

impl Nested {
    /// No link; the value is treated as opaque.
    pub const NONE: Self = Self(None);

    /// Links to `shape`.
    #[must_use]
    pub const fn new(shape: fn() -> TargetShape) -> Self {
        Self(Some(shape))
    }

    /// Resolves the linked shape.
    #[must_use]
    pub fn shape(&self) -> TargetShape {
        self.0.map_or(TargetShape::Opaque, |shape| shape())
    }

    /// Resolves the linked record's descriptors.
    #[must_use]
    pub fn fields(&self) -> Option<&'static [FieldDescriptor]> {
        match self.shape() {
            TargetShape::Record(fields) => Some(fields),
            TargetShape::Opaque => None,
        }
    }
}

// Compared one level deep so recursive records terminate.
impl PartialEq for Nested {
    fn eq(&self, other: &Self) -> bool {
        match (self.fields(), other.fields()) {
            (Some(a), Some(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(x, y)| x.name == y.name && x.key == y.key)
            }
            (None, None) => true,
            _ => false,
        }
    }
}

impl Eq for Nested {}

impl fmt::Debug for Nested {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fields() {
            Some(fields) => f
                .debug_list()
                .entries(fields.iter().map(|field| field.name))
                .finish(),
            None => f.write_str("Opaque"),
        }
    }
}

/// One bindable field of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name as the deserializer expects it.
    pub name: &'static str,
    /// External key matched against input keys; `None` never binds.
    pub key: Option<&'static str>,
    /// Declared type.
    pub kind: FieldKind,
}

impl FieldDescriptor {
    /// Creates a descriptor. A key of exactly `-` marks the field as never bound.
    #[must_use]
    pub const fn new(name: &'static str, key: &'static str, kind: FieldKind) -> Self {
        let key = if key.len() == 1 && key.as_bytes()[0] == b'-' {
            None
        } else {
            Some(key)
        };
        Self { name, key, kind }
    }

    /// Creates a descriptor for a field that never binds.
    #[must_use]
    pub const fn skipped(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            key: None,
            kind,
        }
    }
}

/// Finds the field whose external key matches `key`.
///
/// An exact match wins over a case-insensitive one.
#[must_use]
pub fn find_field<'a>(fields: &'a [FieldDescriptor], key: &str) -> Option<&'a FieldDescriptor> {
    fields
        .iter()
        .find(|f| f.key == Some(key))
        .or_else(|| {
            fields
                .iter()
                .find(|f| f.key.is_some_and(|k| eq_ignore_case(k, key)))
        })
}

pub(crate) fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// What a bind target looks like to the binder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetShape {
    /// A record with the given fields, in declaration order.
    Record(&'static [FieldDescriptor]),
    /// Anything without named fields.
    Opaque,
}

/// A type that request data can be bound into.
///
/// Derive it on records with `#[derive(Bind)]`; the crate implements it for
/// scalars, strings, sequences, string-keyed maps and [`serde_json::Value`].
///
/// ```rust
/// use archimedes_bind::{Bind, FieldKind, TargetShape};
/// use serde::Deserialize;
///
/// #[derive(Deserialize, Bind)]
/// struct Filter {
///     #[bind(key = "q")]
///     query: String,
///     limit: Option<u32>,
///     #[serde(skip)]
///     cursor: Option<String>,
/// }
///
/// let TargetShape::Record(fields) = Filter::shape() else { unreachable!() };
/// assert_eq!(fields[0].key, Some("q"));
/// assert_eq!(fields[1].kind, FieldKind::Uint);
/// assert_eq!(fields[2].key, None);
/// ```
pub trait Bind: DeserializeOwned {
    /// Describes the target.
    fn shape() -> TargetShape;
}

macro_rules! impl_opaque_bind {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Bind for $ty {
                fn shape() -> TargetShape {
                    TargetShape::Opaque
                }
            }
        )*
    };
}

impl_opaque_bind!(
    bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, char,
    String, (), Value, ValueMap,
);

impl<T: DeserializeOwned> Bind for Vec<T> {
    fn shape() -> TargetShape {
        TargetShape::Opaque
    }
}

impl<T: DeserializeOwned> Bind for Option<T> {
    fn shape() -> TargetShape {
        TargetShape::Opaque
    }
}

impl<V: DeserializeOwned, S: BuildHasher + Default> Bind for HashMap<String, V, S> {
    fn shape() -> TargetShape {
        TargetShape::Opaque
    }
}

impl<V: DeserializeOwned> Bind for BTreeMap<String, V> {
    fn shape() -> TargetShape {
        TargetShape::Opaque
    }
}

impl<V: DeserializeOwned, S: BuildHasher + Default> Bind for IndexMap<String, V, S> {
    fn shape() -> TargetShape {
        TargetShape::Opaque
    }
}
