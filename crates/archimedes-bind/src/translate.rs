//! Decoder error translation.
//!
//! Failures recorded by the [`MapDecoder`](crate::decode::MapDecoder) are read
//! structurally: a mismatch gives `"<label> type expected"` under its key path
//! and every unknown key gives `"unexpected"`.
//!
//! Serde failures only carry text, so their lines are matched against a fixed
//! set of shapes, in order:
//!
//! 1. `unknown field `x`, expected ...`, optionally behind a path, gives
//!    `"unexpected"` for `x` (or `path.x`).
//! 2. `age: invalid type: ...` gives `"<label> type expected"` when the path
//!    resolves to a described field, and `"invalid type"` otherwise.
//!
//! Serde paths use field names; they are reported with external keys
//! wherever the descriptors reach.
//!
//! Anything else, including every non-decode failure, passes through as is.

use std::sync::OnceLock;

use regex::Regex;

use crate::decode::{DecodeError, DecodeFailure};
use crate::descriptor::find_field;
use crate::{BindError, FieldDescriptor, FieldErrors, FieldKind};

/// Message recorded for keys that match no field.
pub const UNEXPECTED: &str = "unexpected";

/// Message recorded for mismatches on fields that cannot be located.
pub const INVALID_TYPE: &str = "invalid type";

fn unknown_field_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:(?P<path>.+?): )?unknown field `(?P<key>.*)`, (?:expected|there are no fields)")
            .expect("valid regex")
    })
}

fn invalid_type_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<path>.+?): invalid (?:type|value): ").expect("valid regex")
    })
}

/// Rewrites a decode failure into field errors where its shape is recognized.
///
/// `fields` describes the target; pass an empty slice for opaque targets.
/// Only [`BindError::Decode`] is inspected.
#[must_use]
pub fn translate(err: BindError, fields: &[FieldDescriptor]) -> BindError {
    let BindError::Decode(decode) = &err else {
        return err;
    };

    let mut errors = FieldErrors::new();
    match decode {
        DecodeError::Failures(failures) => {
            for failure in failures {
                match failure {
                    DecodeFailure::Mismatch { key, expected, .. } => {
                        errors.insert(key.as_str(), expected_message(*expected));
                    }
                    DecodeFailure::UnexpectedKeys(keys) => {
                        for key in keys {
                            errors.insert(key.as_str(), UNEXPECTED);
                        }
                    }
                }
            }
        }
        other => {
            for line in other.to_string().lines() {
                translate_line(line.trim(), fields, &mut errors);
            }
        }
    }

    if errors.is_empty() {
        tracing::trace!(error = %decode, "decode error has no recognized shape");
        err
    } else {
        tracing::debug!(fields = errors.len(), "translated decode error into field errors");
        BindError::Fields(errors)
    }
}

fn translate_line(line: &str, fields: &[FieldDescriptor], errors: &mut FieldErrors) {
    if let Some(caps) = unknown_field_re().captures(line) {
        let key = &caps["key"];
        let parent = caps.name("path").map_or("", |path| parent_path(path.as_str(), key));
        if parent.is_empty() {
            errors.insert(key, UNEXPECTED);
        } else {
            let parent = locate(fields, parent)
                .map_or_else(|| parent.to_string(), |(located, _)| located);
            errors.insert(format!("{parent}.{key}"), UNEXPECTED);
        }
        return;
    }

    if let Some(caps) = invalid_type_re().captures(line) {
        let path = &caps["path"];
        match locate(fields, path) {
            Some((located, kind)) => errors.insert(located, expected_message(kind)),
            None => errors.insert(path, INVALID_TYPE),
        }
    }
}

/// Path of the record holding a rejected key.
///
/// The error path ends in `?` when the key was refused before serde saw it,
/// and in the key itself when serde refused it.
fn parent_path<'a>(path: &'a str, key: &str) -> &'a str {
    let parent = path
        .strip_suffix('?')
        .or_else(|| {
            path.strip_suffix(key)
                .filter(|rest| rest.is_empty() || rest.ends_with('.'))
        })
        .unwrap_or(path);
    parent.strip_suffix('.').unwrap_or(parent)
}

/// Resolves a serde path against the descriptors.
///
/// Returns the path spelled with external keys and the kind declared at its
/// end, or `None` once the path leaves described territory.
fn locate(fields: &[FieldDescriptor], path: &str) -> Option<(String, FieldKind)> {
    let mut located = String::new();
    let mut parent: Option<FieldKind> = None;

    for segment in path.split('.') {
        let (name, indices) = segment
            .find('[')
            .map_or((segment, ""), |at| segment.split_at(at));

        let kind = match parent {
            None => {
                let field = fields
                    .iter()
                    .find(|f| f.name == name)
                    .or_else(|| find_field(fields, name))?;
                located.push_str(field.key.unwrap_or(field.name));
                field.kind
            }
            Some(FieldKind::Object(value)) => {
                located.push('.');
                located.push_str(name);
                *value
            }
            Some(kind) => {
                let field = kind.nested_fields()?.iter().find(|f| f.name == name)?;
                located.push('.');
                located.push_str(field.key.unwrap_or(field.name));
                field.kind
            }
        };

        located.push_str(indices);
        let kind = indices.matches('[').try_fold(kind, |kind, _| match kind {
            FieldKind::Array(element) => Some(*element),
            _ => None,
        })?;
        parent = Some(kind);
    }

    parent.map(|kind| (located, kind))
}

fn expected_message(kind: FieldKind) -> String {
    format!("{} type expected", kind.label())
}
