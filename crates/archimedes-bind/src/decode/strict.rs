//! Streaming JSON decoding that stops at the first problem.
//!
//! Records are decoded through a deserializer wrapper that checks every key
//! against the field descriptors before serde sees it, so unknown keys fail
//! even on targets that do not opt into `#[serde(deny_unknown_fields)]`. The
//! check follows linked records into fields, sequence elements and map
//! values. Matching follows the same rules as the map decoder: exact key
//! first, then ignoring case, and a second key naming an already bound field
//! is unknown.

use std::fmt;

use serde::de::value::StrDeserializer;
use serde::de::{
    self, DeserializeOwned, DeserializeSeed, Deserializer, EnumAccess, IntoDeserializer, MapAccess,
    SeqAccess, Visitor,
};
use serde_json::error::Category;

use super::DecodeError;
use crate::descriptor::find_field;
use crate::{BindError, BindSource, FieldDescriptor, FieldKind};

/// Decodes a JSON body straight into `T`.
///
/// With `fields` set, record keys must match a descriptor key at every level
/// the descriptors describe; without, the body decodes exactly as serde would.
///
/// # Errors
///
/// - [`BindError::MalformedJson`] for syntax errors, truncated input and
///   trailing characters.
/// - [`BindError::Decode`] when the target rejects a key or value.
pub fn decode_strict<T: DeserializeOwned>(
    body: &[u8],
    fields: Option<&'static [FieldDescriptor]>,
) -> Result<T, BindError> {
    let mut de = serde_json::Deserializer::from_slice(body);
    let value = match fields {
        Some(fields) => serde_path_to_error::deserialize(StrictDeserializer::new(
            &mut de,
            Check::Record(fields),
        )),
        None => serde_path_to_error::deserialize(&mut de),
    }
    .map_err(classify)?;
    de.end().map_err(BindError::MalformedJson)?;
    Ok(value)
}

fn classify(err: serde_path_to_error::Error<serde_json::Error>) -> BindError {
    match err.inner().classify() {
        Category::Syntax | Category::Eof => BindError::MalformedJson(err.into_inner()),
        Category::Io => BindError::read(BindSource::Json, err.into_inner().to_string()),
        Category::Data => BindError::Decode(DecodeError::Value(err)),
    }
}

/// What a wrapped deserializer enforces on the value it produces.
#[derive(Clone, Copy)]
enum Check {
    /// Keys must match these descriptors.
    Record(&'static [FieldDescriptor]),
    /// Every element is checked as this kind.
    Seq(&'static FieldKind),
    /// Every value is checked as this kind.
    Map(&'static FieldKind),
}

impl Check {
    /// The check a value of `kind` needs, if any record hides in it.
    fn of(kind: &'static FieldKind) -> Option<Self> {
        match kind {
            FieldKind::Named(_, nested) => nested.fields().map(Self::Record),
            FieldKind::Array(element) => Self::of(*element).map(|_| Self::Seq(*element)),
            FieldKind::Object(value) => Self::of(*value).map(|_| Self::Map(*value)),
            _ => None,
        }
    }
}

struct StrictDeserializer<D> {
    inner: D,
    check: Check,
}

impl<D> StrictDeserializer<D> {
    fn new(inner: D, check: Check) -> Self {
        Self { inner, check }
    }

    fn visitor<V>(&self, inner: V, expected: &'static [&'static str]) -> StrictVisitor<V> {
        StrictVisitor {
            inner,
            check: self.check,
            expected,
        }
    }
}

macro_rules! forward_deserialize {
    ($($method:ident($($arg:ident: $ty:ty),*);)*) => {
        $(
            fn $method<V: Visitor<'de>>(
                self,
                $($arg: $ty,)*
                visitor: V,
            ) -> Result<V::Value, Self::Error> {
                self.inner.$method($($arg,)* visitor)
            }
        )*
    };
}

impl<'de, D: Deserializer<'de>> Deserializer<'de> for StrictDeserializer<D> {
    type Error = D::Error;

    forward_deserialize! {
        deserialize_any();
        deserialize_bool();
        deserialize_i8();
        deserialize_i16();
        deserialize_i32();
        deserialize_i64();
        deserialize_i128();
        deserialize_u8();
        deserialize_u16();
        deserialize_u32();
        deserialize_u64();
        deserialize_u128();
        deserialize_f32();
        deserialize_f64();
        deserialize_char();
        deserialize_str();
        deserialize_string();
        deserialize_bytes();
        deserialize_byte_buf();
        deserialize_unit();
        deserialize_unit_struct(name: &'static str);
        deserialize_tuple_struct(name: &'static str, len: usize);
        deserialize_enum(name: &'static str, variants: &'static [&'static str]);
        deserialize_identifier();
        deserialize_ignored_any();
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let visitor = self.visitor(visitor, &[]);
        self.inner.deserialize_option(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let visitor = self.visitor(visitor, &[]);
        self.inner.deserialize_newtype_struct(name, visitor)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let visitor = self.visitor(visitor, &[]);
        self.inner.deserialize_seq(visitor)
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let visitor = self.visitor(visitor, &[]);
        self.inner.deserialize_tuple(len, visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let visitor = self.visitor(visitor, &[]);
        self.inner.deserialize_map(visitor)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        expected: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let visitor = self.visitor(visitor, expected);
        self.inner.deserialize_struct(name, expected, visitor)
    }

    fn is_human_readable(&self) -> bool {
        self.inner.is_human_readable()
    }
}

struct StrictVisitor<V> {
    inner: V,
    check: Check,
    expected: &'static [&'static str],
}

macro_rules! forward_visit {
    ($($method:ident($ty:ty);)*) => {
        $(
            fn $method<E: de::Error>(self, v: $ty) -> Result<Self::Value, E> {
                self.inner.$method(v)
            }
        )*
    };
}

impl<'de, V: Visitor<'de>> Visitor<'de> for StrictVisitor<V> {
    type Value = V::Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.expecting(f)
    }

    forward_visit! {
        visit_bool(bool);
        visit_i64(i64);
        visit_i128(i128);
        visit_u64(u64);
        visit_u128(u128);
        visit_f64(f64);
        visit_str(&str);
        visit_borrowed_str(&'de str);
        visit_string(String);
        visit_bytes(&[u8]);
        visit_borrowed_bytes(&'de [u8]);
        visit_byte_buf(Vec<u8>);
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        self.inner.visit_none()
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        self.inner.visit_unit()
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        self.inner
            .visit_some(StrictDeserializer::new(deserializer, self.check))
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> Result<Self::Value, D::Error> {
        self.inner
            .visit_newtype_struct(StrictDeserializer::new(deserializer, self.check))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
        match self.check {
            Check::Record(fields) => self.inner.visit_map(StrictMapAccess {
                inner: map,
                fields,
                expected: self.expected,
                seen: Vec::new(),
                pending: None,
            }),
            Check::Map(value) => match Check::of(value) {
                Some(check) => self.inner.visit_map(CheckedValues { inner: map, check }),
                None => self.inner.visit_map(map),
            },
            Check::Seq(_) => self.inner.visit_map(map),
        }
    }

    fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<Self::Value, A::Error> {
        match self.check {
            Check::Seq(element) => match Check::of(element) {
                Some(check) => self.inner.visit_seq(CheckedSeq { inner: seq, check }),
                None => self.inner.visit_seq(seq),
            },
            Check::Record(_) | Check::Map(_) => self.inner.visit_seq(seq),
        }
    }

    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<Self::Value, A::Error> {
        self.inner.visit_enum(data)
    }
}

/// Renames known keys to serde names and refuses the rest.
struct StrictMapAccess<A> {
    inner: A,
    fields: &'static [FieldDescriptor],
    expected: &'static [&'static str],
    seen: Vec<&'static str>,
    pending: Option<Check>,
}

impl<'de, A: MapAccess<'de>> MapAccess<'de> for StrictMapAccess<A> {
    type Error = A::Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, Self::Error> {
        let Some(key) = self.inner.next_key::<String>()? else {
            return Ok(None);
        };
        let field = find_field(self.fields, &key).filter(|field| !self.seen.contains(&field.name));
        let Some(field) = field else {
            return Err(de::Error::unknown_field(&key, self.expected));
        };

        self.seen.push(field.name);
        self.pending = Check::of(&field.kind);
        let name: StrDeserializer<'_, Self::Error> = field.name.into_deserializer();
        seed.deserialize(name).map(Some)
    }

    fn next_value_seed<S: DeserializeSeed<'de>>(&mut self, seed: S) -> Result<S::Value, Self::Error> {
        match self.pending.take() {
            Some(check) => self.inner.next_value_seed(CheckedSeed { inner: seed, check }),
            None => self.inner.next_value_seed(seed),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        self.inner.size_hint()
    }
}

struct CheckedValues<A> {
    inner: A,
    check: Check,
}

impl<'de, A: MapAccess<'de>> MapAccess<'de> for CheckedValues<A> {
    type Error = A::Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, Self::Error> {
        self.inner.next_key_seed(seed)
    }

    fn next_value_seed<S: DeserializeSeed<'de>>(&mut self, seed: S) -> Result<S::Value, Self::Error> {
        self.inner.next_value_seed(CheckedSeed {
            inner: seed,
            check: self.check,
        })
    }

    fn size_hint(&self) -> Option<usize> {
        self.inner.size_hint()
    }
}

struct CheckedSeq<A> {
    inner: A,
    check: Check,
}

impl<'de, A: SeqAccess<'de>> SeqAccess<'de> for CheckedSeq<A> {
    type Error = A::Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, Self::Error> {
        self.inner.next_element_seed(CheckedSeed {
            inner: seed,
            check: self.check,
        })
    }

    fn size_hint(&self) -> Option<usize> {
        self.inner.size_hint()
    }
}

struct CheckedSeed<S> {
    inner: S,
    check: Check,
}

impl<'de, S: DeserializeSeed<'de>> DeserializeSeed<'de> for CheckedSeed<S> {
    type Value = S::Value;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        self.inner
            .deserialize(StrictDeserializer::new(deserializer, self.check))
    }
}
