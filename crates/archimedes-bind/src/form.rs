//! Form body collection and the [`Form`] extractor.

use std::ops::Deref;

use bytes::Bytes;

use crate::body::take_body;
use crate::query::parse_urlencoded;
use crate::{
    multipart, Bind, BindContext, BindError, BindSource, BodyLimits, FromRequest, MediaKind,
    ValueMap,
};

/// Collects the fields of a url-encoded or multipart form body.
///
/// Takes the body out of `ctx`. Only text values are collected; multipart
/// file parts are skipped. On repeated keys the first value wins. A body of
/// any other media type yields no values.
///
/// # Errors
///
/// - [`BindError::BodyConsumed`] if the body was already taken.
/// - [`BindError::PayloadTooLarge`] if the body exceeds the limit.
/// - [`BindError::Read`] if the body is not a well-formed form.
pub fn collect_form(ctx: &mut BindContext, limits: BodyLimits) -> Result<ValueMap, BindError> {
    let media = ctx.media_kind();
    let content_type = ctx.content_type().unwrap_or_default().to_owned();
    let body = take_body(ctx, BindSource::Form, limits.max_body_size)?;
    let values = parse_form(media, &content_type, body, limits)?;
    tracing::debug!(source = "form", keys = values.len(), "collected values");
    Ok(values)
}

/// Parses an already-taken form body according to its media kind.
pub(crate) fn parse_form(
    media: MediaKind,
    content_type: &str,
    body: Bytes,
    limits: BodyLimits,
) -> Result<ValueMap, BindError> {
    match media {
        MediaKind::UrlEncoded => {
            let text = std::str::from_utf8(&body)
                .map_err(|e| BindError::read(BindSource::Form, format!("invalid UTF-8: {e}")))?;
            parse_urlencoded(text, BindSource::Form)
        }
        MediaKind::Multipart => {
            multipart::collect_text_fields(content_type, body, limits.max_multipart_fields)
        }
        MediaKind::Json | MediaKind::Other => {
            tracing::debug!(content_type, "body is not a form");
            Ok(ValueMap::new())
        }
    }
}

/// Extractor binding a url-encoded or multipart form body into `T`.
///
/// # Example
///
/// ```rust
/// use archimedes_bind::{Bind, BindContextBuilder, Form, FromRequest};
/// use serde::Deserialize;
///
/// #[derive(Deserialize, Bind)]
/// struct LoginForm {
///     username: String,
///     password: String,
/// }
///
/// let mut ctx = BindContextBuilder::new()
///     .content_type("application/x-www-form-urlencoded")
///     .body("username=alice&password=secret123")
///     .build();
///
/// let Form(form) = Form::<LoginForm>::from_request(&mut ctx).unwrap();
/// assert_eq!(form.username, "alice");
/// assert_eq!(form.password, "secret123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form<T>(pub T);

impl<T> Form<T> {
    /// Consumes the Form and returns the inner value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Form<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: Bind> FromRequest for Form<T> {
    fn from_request(ctx: &mut BindContext) -> Result<Self, BindError> {
        crate::bind_form(ctx, None).map(Form)
    }
}
