//! Per-request binding context.
//!
//! [`BindContext`] gives collectors access to the parts of an HTTP request
//! they read from. The body is a single-read resource: the first body-based
//! collector takes it, and later ones fail with [`BindError::BodyConsumed`]
//! until [`BindContext::reset_body`] puts a body back.

use bytes::Bytes;
use http::{header, HeaderMap, Method, Uri};

use crate::{BindError, MediaKind, Params};

/// Request data available to the binding collectors.
///
/// # Example
///
/// ```rust
/// use archimedes_bind::{BindContext, Params};
/// use bytes::Bytes;
/// use http::{HeaderMap, Method, Uri};
///
/// let mut params = Params::new();
/// params.push("id", "123");
///
/// let mut ctx = BindContext::new(
///     Method::POST,
///     Uri::from_static("/users/123"),
///     HeaderMap::new(),
///     Bytes::from_static(b"{}"),
///     params,
/// );
///
/// assert_eq!(ctx.path_params().get("id"), Some("123"));
/// assert!(ctx.take_body().is_ok());
/// assert!(ctx.take_body().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct BindContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Option<Bytes>,
    path_params: Params,
}

impl BindContext {
    /// Creates a context for one request.
    #[must_use]
    pub fn new(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
        path_params: Params,
    ) -> Self {
        Self {
            method,
            uri,
            headers,
            body: Some(body),
            path_params,
        }
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the raw query string if present.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the matched path parameters.
    #[must_use]
    pub fn path_params(&self) -> &Params {
        &self.path_params
    }

    /// Returns the `Content-Type` header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Classifies the body by its `Content-Type`.
    #[must_use]
    pub fn media_kind(&self) -> MediaKind {
        MediaKind::from_content_type(self.content_type())
    }

    /// Returns true while the body has not been taken.
    #[must_use]
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Takes the body out of the context.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::BodyConsumed`] if a collector already took it.
    pub fn take_body(&mut self) -> Result<Bytes, BindError> {
        self.body.take().ok_or_else(|| {
            tracing::debug!(
                method = %self.method,
                path = self.uri.path(),
                "request body read twice"
            );
            BindError::BodyConsumed
        })
    }

    /// Puts a body back so another body-based collector can run.
    pub fn reset_body(&mut self, body: impl Into<Bytes>) {
        self.body = Some(body.into());
    }
}

/// Builder for a [`BindContext`].
#[derive(Debug, Default)]
pub struct BindContextBuilder {
    method: Option<Method>,
    uri: Option<Uri>,
    headers: HeaderMap,
    body: Bytes,
    path_params: Params,
}

impl BindContextBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method. Defaults to `GET`.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the URI. Defaults to `/`.
    #[must_use]
    pub fn uri(mut self, uri: Uri) -> Self {
        self.uri = Some(uri);
        self
    }

    /// Adds a single header. Invalid values are skipped.
    #[must_use]
    pub fn header(mut self, name: header::HeaderName, value: &str) -> Self {
        if let Ok(value) = value.parse() {
            self.headers.insert(name, value);
        }
        self
    }

    /// Sets the `Content-Type` header.
    #[must_use]
    pub fn content_type(self, value: &str) -> Self {
        self.header(header::CONTENT_TYPE, value)
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Adds a single path parameter.
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.push(name, value);
        self
    }

    /// Builds the context.
    #[must_use]
    pub fn build(self) -> BindContext {
        BindContext::new(
            self.method.unwrap_or(Method::GET),
            self.uri.unwrap_or_else(|| Uri::from_static("/")),
            self.headers,
            self.body,
            self.path_params,
        )
    }
}
