//! JSON body collection and the [`Json`] extractor.

use std::ops::Deref;

use serde_json::error::Category;
use serde_json::Value;

use crate::body::take_body;
use crate::decode::{json_type, DecodeError};
use crate::{Bind, BindContext, BindError, BindSource, BodyLimits, FromRequest, ValueMap};

/// Decodes the whole JSON body into a value map.
///
/// Takes the body out of `ctx`.
///
/// # Errors
///
/// - [`BindError::BodyConsumed`] if the body was already taken.
/// - [`BindError::PayloadTooLarge`] if the body exceeds the limit.
/// - [`BindError::MalformedJson`] if the body is not valid JSON.
/// - [`BindError::Decode`] if the body is valid JSON but not an object.
pub fn collect_json(ctx: &mut BindContext, limits: BodyLimits) -> Result<ValueMap, BindError> {
    let body = take_body(ctx, BindSource::Json, limits.max_body_size)?;
    let values = parse_json(&body)?;
    tracing::debug!(source = "json", keys = values.len(), "collected values");
    Ok(values)
}

/// Parses an already-taken JSON body into a value map.
pub(crate) fn parse_json(body: &[u8]) -> Result<ValueMap, BindError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| match e.classify() {
        Category::Io => BindError::read(BindSource::Json, e.to_string()),
        Category::Syntax | Category::Eof | Category::Data => BindError::MalformedJson(e),
    })?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(DecodeError::NotAnObject(json_type(&other)).into()),
    }
}

/// Extractor binding the JSON body into `T`.
///
/// Uses the streaming decoder, so only the first problem is reported.
///
/// # Example
///
/// ```rust
/// use archimedes_bind::{Bind, BindContextBuilder, BindError, FromRequest, Json};
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, Bind)]
/// struct CreateUser {
///     name: String,
///     email: String,
/// }
///
/// let mut ctx = BindContextBuilder::new()
///     .content_type("application/json")
///     .body(r#"{"name": "Alice", "email": "alice@example.com"}"#)
///     .build();
///
/// let Json(user) = Json::<CreateUser>::from_request(&mut ctx).unwrap();
/// assert_eq!(user.name, "Alice");
///
/// let mut ctx = BindContextBuilder::new()
///     .body(r#"{"name": "Alice", "email": "a@example.com", "admin": true}"#)
///     .build();
///
/// let err = Json::<CreateUser>::from_request(&mut ctx).unwrap_err();
/// assert_eq!(err.field_errors().unwrap().get("admin"), Some("unexpected"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Consumes the Json and returns the inner value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: Bind> FromRequest for Json<T> {
    fn from_request(ctx: &mut BindContext) -> Result<Self, BindError> {
        crate::bind_json(ctx, None).map(Json)
    }
}
