//! Query string collection and the [`Query`] extractor.

use std::ops::Deref;

use serde_json::Value;

use crate::{Bind, BindContext, BindError, BindSource, FromRequest, ValueMap};

/// Collects the URL query string as string values.
///
/// When a key repeats, the first occurrence wins and later ones are ignored.
///
/// # Errors
///
/// Returns [`BindError::Read`] if the query string cannot be decoded.
pub fn collect_query(ctx: &BindContext) -> Result<ValueMap, BindError> {
    let values = parse_urlencoded(ctx.query_string().unwrap_or(""), BindSource::Query)?;
    tracing::debug!(source = "query", keys = values.len(), "collected values");
    Ok(values)
}

/// Parses `application/x-www-form-urlencoded` text, keeping the first value
/// of each key.
pub(crate) fn parse_urlencoded(input: &str, source: BindSource) -> Result<ValueMap, BindError> {
    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_str(input).map_err(|e| BindError::read(source, e.to_string()))?;

    let mut values = ValueMap::new();
    for (key, value) in pairs {
        values.entry(key).or_insert(Value::String(value));
    }
    Ok(values)
}

/// Extractor binding URL query parameters into `T`.
///
/// # Example
///
/// ```rust
/// use archimedes_bind::{Bind, BindContextBuilder, FromRequest, Query};
/// use http::Uri;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, Bind)]
/// struct Search {
///     q: String,
///     #[serde(default)]
///     sort: Option<String>,
/// }
///
/// let mut ctx = BindContextBuilder::new()
///     .uri(Uri::from_static("/search?q=rust+lang&q=ignored"))
///     .build();
///
/// let Query(search) = Query::<Search>::from_request(&mut ctx).unwrap();
/// assert_eq!(search.q, "rust lang");
/// assert_eq!(search.sort, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query<T>(pub T);

impl<T> Query<T> {
    /// Consumes the Query and returns the inner value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Query<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: Bind> FromRequest for Query<T> {
    fn from_request(ctx: &mut BindContext) -> Result<Self, BindError> {
        crate::bind_query(ctx, None).map(Query)
    }
}
