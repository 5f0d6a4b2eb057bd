//! Text-field collection from `multipart/form-data` bodies.
//!
//! The body is already fully buffered, so `multer` is fed a single chunk and
//! every future it returns completes on its first poll. File parts (parts
//! with a file name) are skipped; upload handling is not part of binding.

use std::convert::Infallible;
use std::future::Future;

use bytes::Bytes;
use futures_util::FutureExt;
use serde_json::Value;

use crate::{BindError, BindSource, ValueMap};

/// Collects the text parts of a multipart body. The first part of each name
/// wins.
pub(crate) fn collect_text_fields(
    content_type: &str,
    body: Bytes,
    max_fields: usize,
) -> Result<ValueMap, BindError> {
    let boundary = multer::parse_boundary(content_type)
        .map_err(|e| BindError::read(BindSource::Form, format!("invalid multipart boundary: {e}")))?;

    let stream = futures_util::stream::iter([Ok::<_, Infallible>(body)]);
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut values = ValueMap::new();
    let mut count = 0usize;
    while let Some(field) = resolve(multipart.next_field())? {
        count += 1;
        if count > max_fields {
            return Err(BindError::read(
                BindSource::Form,
                format!("too many multipart fields (max {max_fields})"),
            ));
        }

        if field.file_name().is_some() {
            tracing::trace!(name = ?field.name(), "skipping file part");
            continue;
        }
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let text = resolve(field.text())?;
        values.entry(name).or_insert(Value::String(text));
    }

    Ok(values)
}

/// Drives a multer future over the buffered body.
fn resolve<T>(future: impl Future<Output = multer::Result<T>>) -> Result<T, BindError> {
    match future.now_or_never() {
        Some(result) => result.map_err(|e| {
            BindError::read(BindSource::Form, format!("malformed multipart body: {e}"))
        }),
        None => Err(BindError::read(
            BindSource::Form,
            "multipart body ended before the closing boundary",
        )),
    }
}
