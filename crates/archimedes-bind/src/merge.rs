//! Merging every request source into one value map, and the [`Bound`]
//! extractor.

use std::ops::Deref;

use crate::body::take_body;
use crate::form::parse_form;
use crate::json::parse_json;
use crate::{
    collect_path, collect_query, Bind, BindContext, BindError, BindSource, BodyLimits,
    FromRequest, ValueMap,
};

/// Merges query, body and path values by precedence.
///
/// Precedence, lowest to highest: query, form body, JSON body, path. Each
/// layer overwrites keys set by the layers below it; values are replaced
/// whole, never merged. The body is read only when the media type is
/// form-like or JSON-like, and an empty body contributes nothing.
///
/// # Errors
///
/// Fails with the first collector error.
///
/// # Example
///
/// ```rust
/// use archimedes_bind::{merge_sources, BindContextBuilder, BodyLimits};
/// use http::Uri;
/// use serde_json::json;
///
/// let mut ctx = BindContextBuilder::new()
///     .uri(Uri::from_static("/users/7?id=1&name=query&page=2"))
///     .content_type("application/json")
///     .body(r#"{"name": "body"}"#)
///     .path_param("id", "7")
///     .build();
///
/// let merged = merge_sources(&mut ctx, BodyLimits::default()).unwrap();
/// assert_eq!(merged["id"], json!("7"));
/// assert_eq!(merged["name"], json!("body"));
/// assert_eq!(merged["page"], json!("2"));
/// ```
pub fn merge_sources(ctx: &mut BindContext, limits: BodyLimits) -> Result<ValueMap, BindError> {
    let mut merged = collect_query(ctx)?;

    let media = ctx.media_kind();
    if media.is_form() {
        let content_type = ctx.content_type().unwrap_or_default().to_owned();
        let body = take_body(ctx, BindSource::Form, limits.max_body_size)?;
        if !body.is_empty() {
            overlay(&mut merged, parse_form(media, &content_type, body, limits)?);
        }
    } else if media.is_json() {
        let body = take_body(ctx, BindSource::Json, limits.max_body_size)?;
        if !body.is_empty() {
            overlay(&mut merged, parse_json(&body)?);
        }
    }

    overlay(&mut merged, collect_path(ctx));

    tracing::debug!(source = "merged", keys = merged.len(), ?media, "collected values");
    Ok(merged)
}

fn overlay(base: &mut ValueMap, layer: ValueMap) {
    for (key, value) in layer {
        base.insert(key, value);
    }
}

/// Extractor binding all request sources, merged by precedence, into `T`.
///
/// See [`merge_sources`] for the precedence rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound<T>(pub T);

impl<T> Bound<T> {
    /// Consumes the Bound and returns the inner value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Bound<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: Bind> FromRequest for Bound<T> {
    fn from_request(ctx: &mut BindContext) -> Result<Self, BindError> {
        crate::bind(ctx, None).map(Bound)
    }
}
