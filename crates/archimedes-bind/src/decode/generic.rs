//! Field-by-field decoding of a value map.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Number, Value};

use super::{json_type, ConstructionError, DecodeError, DecodeFailure};
use crate::descriptor::{eq_ignore_case, find_field};
use crate::{BindOptions, FieldDescriptor, FieldKind, ValueMap};

/// Decodes a [`ValueMap`] into a record described by field descriptors.
///
/// Input keys are matched against field keys exactly first, then ignoring
/// case. Every value is checked against its field's declared kind, with weak
/// coercion applied first when enabled. The check descends into sequence
/// elements, map values and linked records, whose keys follow the same
/// matching rules and are reported as `home.zip` or `ids[0]`. All problems
/// found in a pass are
/// reported together as [`DecodeError::Failures`], type mismatches first and
/// unknown keys last. A clean map is then handed to serde with its keys
/// renamed to the field names serde expects.
#[derive(Debug, Clone)]
pub struct MapDecoder {
    fields: &'static [FieldDescriptor],
    options: BindOptions,
}

struct Chosen {
    field: &'static FieldDescriptor,
    exact: bool,
    key: String,
    value: Value,
}

impl MapDecoder {
    /// Creates a decoder for the given fields.
    ///
    /// # Errors
    ///
    /// Fails when two fields declare the same external key.
    pub fn new(
        fields: &'static [FieldDescriptor],
        options: BindOptions,
    ) -> Result<Self, ConstructionError> {
        for (i, first) in fields.iter().enumerate() {
            let Some(key) = first.key else { continue };
            if let Some(second) = fields[i + 1..].iter().find(|f| f.key == Some(key)) {
                return Err(ConstructionError::DuplicateKey {
                    key: key.to_string(),
                    first: first.name.to_string(),
                    second: second.name.to_string(),
                });
            }
        }
        Ok(Self { fields, options })
    }

    /// Options this decoder was built with.
    #[must_use]
    pub fn options(&self) -> BindOptions {
        self.options
    }

    /// Decodes `map` into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Failures`] listing every mismatch and unknown
    /// key, or [`DecodeError::Value`] when serde rejects a value the kind
    /// check let through.
    pub fn decode<T: DeserializeOwned>(&self, map: ValueMap) -> Result<T, DecodeError> {
        let mut pass = Pass {
            weak: self.options.weakly_typed_input,
            failures: Vec::new(),
            unused: Vec::new(),
        };
        let normalized = pass.record(self.fields, map, "");
        let Pass {
            mut failures,
            mut unused,
            ..
        } = pass;

        if self.options.reject_unknown_keys && !unused.is_empty() {
            unused.sort();
            failures.push(DecodeFailure::UnexpectedKeys(unused));
        } else if !unused.is_empty() {
            tracing::trace!(keys = ?unused, "ignoring unknown keys");
        }

        if !failures.is_empty() {
            return Err(DecodeError::Failures(failures));
        }

        serde_path_to_error::deserialize(Value::Object(normalized)).map_err(DecodeError::Value)
    }
}

/// One walk over a map and everything nested in it.
///
/// Paths are built from external keys: `home.zip`, `ids[0]`.
struct Pass {
    weak: bool,
    failures: Vec<DecodeFailure>,
    unused: Vec<String>,
}

impl Pass {
    /// Matches `map` against `fields` and renames the keys to serde names.
    fn record(
        &mut self,
        fields: &'static [FieldDescriptor],
        map: ValueMap,
        prefix: &str,
    ) -> ValueMap {
        let mut chosen: IndexMap<&'static str, Chosen> = IndexMap::new();

        for (key, value) in map {
            let Some(field) = find_field(fields, &key) else {
                self.unused.push(join(prefix, &key));
                continue;
            };
            let exact = field.key == Some(key.as_str());
            match chosen.get_mut(field.name) {
                Some(prev) if exact && !prev.exact => {
                    let prev = std::mem::replace(
                        prev,
                        Chosen {
                            field,
                            exact,
                            key,
                            value,
                        },
                    );
                    self.unused.push(join(prefix, &prev.key));
                }
                Some(_) => self.unused.push(join(prefix, &key)),
                None => {
                    chosen.insert(
                        field.name,
                        Chosen {
                            field,
                            exact,
                            key,
                            value,
                        },
                    );
                }
            }
        }

        let mut normalized = ValueMap::new();
        for (name, entry) in chosen {
            let path = join(prefix, entry.field.key.unwrap_or(name));
            let value = self.value(entry.field.kind, entry.value, &path);
            normalized.insert(name.to_string(), value);
        }
        normalized
    }

    /// Checks one value against `kind`, descending into sequences, maps and
    /// linked records. Mismatches are recorded and the value kept as is.
    fn value(&mut self, kind: FieldKind, value: Value, path: &str) -> Value {
        match (kind, value) {
            (_, Value::Null) => Value::Null,
            (FieldKind::Named(_, nested), Value::Object(map)) => match nested.fields() {
                Some(fields) => Value::Object(self.record(fields, map, path)),
                None => Value::Object(map),
            },
            (FieldKind::Array(element), Value::Array(items)) => Value::Array(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| self.value(*element, item, &format!("{path}[{i}]")))
                    .collect(),
            ),
            (FieldKind::Array(element), value) if self.weak => {
                Value::Array(vec![self.value(*element, value, &format!("{path}[0]"))])
            }
            (FieldKind::Object(inner), Value::Object(map)) => Value::Object(
                map.into_iter()
                    .map(|(key, item)| {
                        let item = self.value(*inner, item, &join(path, &key));
                        (key, item)
                    })
                    .collect(),
            ),
            (kind, value) => coerce(kind, value, self.weak).unwrap_or_else(|value| {
                self.failures.push(DecodeFailure::Mismatch {
                    key: path.to_string(),
                    expected: kind,
                    found: json_type(&value),
                    value: render_value(&value),
                });
                value
            }),
        }
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Applies the kind check to a single value, returning it on mismatch.
fn coerce(kind: FieldKind, value: Value, weak: bool) -> Result<Value, Value> {
    match (kind, value) {
        (FieldKind::Named(..), value) => Ok(value),

        (FieldKind::Int, Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(Value::Number(n)),
        (FieldKind::Uint, Value::Number(n)) if n.is_u64() => Ok(Value::Number(n)),
        (FieldKind::Float, Value::Number(n)) => Ok(Value::Number(n)),
        (FieldKind::Bool, Value::Bool(b)) => Ok(Value::Bool(b)),
        (FieldKind::String, Value::String(s)) => Ok(Value::String(s)),
        (FieldKind::Array(_), Value::Array(items)) => Ok(Value::Array(items)),
        (FieldKind::Object(_), Value::Object(map)) => Ok(Value::Object(map)),

        (_, value) if !weak => Err(value),

        (FieldKind::Int, value) => weak_int(value),
        (FieldKind::Uint, value) => weak_uint(value),
        (FieldKind::Float, value) => weak_float(value),
        (FieldKind::Bool, value) => weak_bool(value),
        (FieldKind::String, value) => weak_string(value),
        (FieldKind::Array(_) | FieldKind::Object(_), value) => Err(value),
    }
}

fn weak_int(value: Value) -> Result<Value, Value> {
    match &value {
        Value::Bool(b) => Ok(Value::from(i64::from(*b))),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                Ok(Value::from(f as i64))
            }
            _ => Err(value),
        },
        Value::String(s) if s.is_empty() => Ok(Value::from(0)),
        Value::String(s) => s.trim().parse::<i64>().map(Value::from).map_err(|_| value),
        _ => Err(value),
    }
}

fn weak_uint(value: Value) -> Result<Value, Value> {
    match &value {
        Value::Bool(b) => Ok(Value::from(u64::from(*b))),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f >= 0.0 && f < u64::MAX as f64 => {
                Ok(Value::from(f as u64))
            }
            _ => Err(value),
        },
        Value::String(s) if s.is_empty() => Ok(Value::from(0u64)),
        Value::String(s) => s.trim().parse::<u64>().map(Value::from).map_err(|_| value),
        _ => Err(value),
    }
}

fn weak_float(value: Value) -> Result<Value, Value> {
    let parsed = match &value {
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) if s.is_empty() => Some(0.0),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or(value)
}

fn weak_bool(value: Value) -> Result<Value, Value> {
    match &value {
        Value::Number(n) => Ok(Value::Bool(n.as_f64().is_some_and(|f| f != 0.0))),
        Value::String(s) if s.is_empty() => Ok(Value::Bool(false)),
        Value::String(s) => parse_bool(s).map(Value::Bool).ok_or(value),
        _ => Err(value),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    const TRUE: &[&str] = &["1", "t", "true", "y", "yes", "on"];
    const FALSE: &[&str] = &["0", "f", "false", "n", "no", "off"];

    let s = s.trim();
    if TRUE.iter().any(|t| eq_ignore_case(t, s)) {
        Some(true)
    } else if FALSE.iter().any(|f| eq_ignore_case(f, s)) {
        Some(false)
    } else {
        None
    }
}

fn weak_string(value: Value) -> Result<Value, Value> {
    match &value {
        Value::Bool(b) => Ok(Value::String(if *b { "1" } else { "0" }.to_string())),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        _ => Err(value),
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.escape_debug().to_string(),
        other => other.to_string(),
    }
}
